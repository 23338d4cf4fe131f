pub const DEVICE_AUTO: &str = "auto";
pub const PRECISION_AUTO: &str = "auto";
pub const PRECISION_AUTOCAST: &str = "autocast";

// Runtime configuration for device and precision selection.
//
// Loaded once at application startup and passed by reference into the selection
// routines, nothing here is mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    // "auto" or an explicit device string such as "cpu", "cuda:1" or "mps".
    pub device: String,
    // "auto", "autocast", "float32", "float16" or "bfloat16".
    pub precision: String,
}

impl Options {
    pub fn new() -> Self {
        Self {
            device: DEVICE_AUTO.to_string(),
            precision: PRECISION_AUTO.to_string(),
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_auto() {
        let options = Options::new();
        assert_eq!(options.device, DEVICE_AUTO);
        assert_eq!(options.precision, PRECISION_AUTO);
        assert_eq!(options, Options::default());
    }
}
