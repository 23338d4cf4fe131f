use std::fmt;

/// Error type for device and precision selection failures.
#[derive(Debug, Clone)]
pub struct PickError {
    message: String,
}

impl PickError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl fmt::Display for PickError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device selection error: {}", self.message)
    }
}

impl std::error::Error for PickError {}

impl From<candle_core::Error> for PickError {
    fn from(err: candle_core::Error) -> Self {
        PickError::new(format!("candle error: {}", err))
    }
}

impl From<std::num::ParseIntError> for PickError {
    fn from(err: std::num::ParseIntError) -> Self {
        PickError::new(format!("failed to parse device index: {}", err))
    }
}
