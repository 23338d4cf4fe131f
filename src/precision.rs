use crate::{
    config::{Options, PRECISION_AUTO, PRECISION_AUTOCAST},
    device::{DeviceSpec, Probe, choose_device, device_name},
    error::PickError,
};

use candle_core::{DType, Tensor};
use std::fmt;

pub const PRECISION_NAME_FLOAT32: &str = "float32";
pub const PRECISION_NAME_FLOAT16: &str = "float16";
pub const PRECISION_NAME_BFLOAT16: &str = "bfloat16";

// Cards with limited float16 support, always pinned to float32.
pub const FLOAT16_LIMITED_CARDS: &[&str] = &["GeForce GTX 1660", "GeForce GTX 1650"];

/// Numeric precision used for model computation.
///
/// The configuration aliases "auto" and "autocast" are input only and never show up
/// here, [`choose_precision`] resolves them before returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Float32,
    Float16,
    BFloat16,
}

impl Precision {
    // The concrete storage dtype for this precision.
    pub fn dtype(&self) -> DType {
        match self {
            Precision::Float16 => DType::F16,
            Precision::BFloat16 => DType::BF16,
            Precision::Float32 => DType::F32,
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precision::Float32 => write!(f, "{}", PRECISION_NAME_FLOAT32),
            Precision::Float16 => write!(f, "{}", PRECISION_NAME_FLOAT16),
            Precision::BFloat16 => write!(f, "{}", PRECISION_NAME_BFLOAT16),
        }
    }
}

// Resolve an explicit user preference. Anything unrecognized collapses onto float32,
// the safe default; precision selection never fails.
fn explicit_precision(preference: &str) -> Precision {
    match preference {
        PRECISION_NAME_FLOAT16 => Precision::Float16,
        PRECISION_NAME_BFLOAT16 => Precision::BFloat16,
        _ => Precision::Float32,
    }
}

fn wants_auto(options: &Options) -> bool {
    options.precision == PRECISION_AUTO || options.precision == PRECISION_AUTOCAST
}

// Decide the precision to run the model at on the given device.
//
// A handful of cuda cards have limited float16 support and are forced to float32 no
// matter what was configured. Auto preferences default to float16 on accelerators,
// and everything terminates at float32 on the cpu.
pub fn choose_precision(device: &DeviceSpec, options: &Options, probe: &impl Probe) -> Precision {
    match device {
        DeviceSpec::Cuda(_) => {
            let name = device_name(device, probe);
            if FLOAT16_LIMITED_CARDS.iter().any(|card| name.contains(card)) {
                return Precision::Float32;
            }

            if wants_auto(options) {
                return Precision::Float16;
            }

            explicit_precision(&options.precision)
        }

        DeviceSpec::Metal(_) => {
            if wants_auto(options) {
                return Precision::Float16;
            }

            explicit_precision(&options.precision)
        }

        DeviceSpec::Cpu => Precision::Float32,
    }
}

// Storage dtype for the given device, defaulting the device to whatever
// choose_device picks for the configuration.
pub fn resolve_dtype(
    device: Option<&DeviceSpec>,
    options: &Options,
    probe: &impl Probe,
) -> Result<DType, PickError> {
    let device = match device {
        Some(device) => device.clone(),
        None => choose_device(options, probe)?,
    };

    Ok(choose_precision(&device, options, probe).dtype())
}

/// Casting behaviour for mixed precision execution.
///
/// float16 execution needs inputs cast to the target dtype up front, otherwise mixed
/// precision arithmetic fails on dtype mismatches. `Autocast` converts tensors
/// entering the scope, `Null` leaves them untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastPolicy {
    Autocast,
    Null,
}

impl CastPolicy {
    pub fn cast(&self, tensor: &Tensor, dtype: DType) -> Result<Tensor, PickError> {
        match self {
            CastPolicy::Autocast => Ok(tensor.to_dtype(dtype)?),
            CastPolicy::Null => Ok(tensor.clone()),
        }
    }
}

// Pick the casting policy for the configured precision preference.
pub fn choose_autocast(preference: &str) -> CastPolicy {
    if preference == PRECISION_AUTOCAST || preference == PRECISION_NAME_FLOAT16 {
        return CastPolicy::Autocast;
    }

    CastPolicy::Null
}
