use crate::{
    config::{DEVICE_AUTO, Options},
    error::PickError,
};

use candle_core::Device;
use log::{debug, info};
use std::fmt;
use std::str::FromStr;

pub const DEVICE_NAME_CPU: &str = "cpu";
pub const DEVICE_NAME_CUDA: &str = "cuda";
pub const DEVICE_NAME_METAL: &str = "metal";

// Alias used by torch-style configurations for the Metal backend.
const DEVICE_NAME_MPS: &str = "mps";

/// The recognized backend families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Cpu,
    Cuda,
    Metal,
}

/// A device identifier: a backend tag plus an optional ordinal for multi-GPU setups.
///
/// A cuda spec should carry a resolved index before being used for allocation, see
/// [`normalize_device`]. The other backends have no index concept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSpec {
    Cpu,
    Cuda(Option<usize>),
    Metal(Option<usize>),
}

impl DeviceSpec {
    pub fn backend(&self) -> Backend {
        match self {
            DeviceSpec::Cpu => Backend::Cpu,
            DeviceSpec::Cuda(_) => Backend::Cuda,
            DeviceSpec::Metal(_) => Backend::Metal,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            DeviceSpec::Cpu => None,
            DeviceSpec::Cuda(index) => *index,
            DeviceSpec::Metal(index) => *index,
        }
    }

    // Allocate the concrete candle device. This is the point of use where an explicit
    // request for an unavailable backend actually fails; selection never probes it.
    pub fn open(&self) -> Result<Device, PickError> {
        match self {
            DeviceSpec::Cpu => Ok(Device::Cpu),
            DeviceSpec::Cuda(index) => Device::new_cuda(index.unwrap_or(0))
                .map_err(|e| PickError::new(format!("unable to open cuda device: {}", e))),
            DeviceSpec::Metal(index) => Device::new_metal(index.unwrap_or(0))
                .map_err(|e| PickError::new(format!("unable to open metal device: {}", e))),
        }
    }
}

impl fmt::Display for DeviceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceSpec::Cpu => write!(f, "{}", DEVICE_NAME_CPU),
            DeviceSpec::Cuda(None) => write!(f, "{}", DEVICE_NAME_CUDA),
            DeviceSpec::Cuda(Some(index)) => write!(f, "{}:{}", DEVICE_NAME_CUDA, index),
            DeviceSpec::Metal(None) => write!(f, "{}", DEVICE_NAME_METAL),
            DeviceSpec::Metal(Some(index)) => write!(f, "{}:{}", DEVICE_NAME_METAL, index),
        }
    }
}

impl FromStr for DeviceSpec {
    type Err = PickError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let (tag, index) = match lowered.split_once(':') {
            Some((tag, index)) => (tag, Some(index.parse::<usize>()?)),
            None => (lowered.as_str(), None),
        };

        match tag {
            DEVICE_NAME_CPU => Ok(DeviceSpec::Cpu),
            DEVICE_NAME_CUDA => Ok(DeviceSpec::Cuda(index)),
            DEVICE_NAME_METAL | DEVICE_NAME_MPS => Ok(DeviceSpec::Metal(index)),
            _ => Err(PickError::new(format!("invalid device: {}", s))),
        }
    }
}

// Capability queries against the numerical runtime.
//
// Selection only ever asks these three questions, so the answers can come from
// candle in production and from a fake in tests.
pub trait Probe {
    fn is_available(&self, backend: Backend) -> bool;

    // Hardware product name of the cuda device at the given index.
    fn cuda_device_name(&self, index: usize) -> String;

    // The runtime's notion of the currently active cuda device index.
    fn current_cuda_device(&self) -> usize;
}

/// Capability probe backed by candle.
#[derive(Debug, Clone, Copy, Default)]
pub struct CandleProbe;

impl Probe for CandleProbe {
    fn is_available(&self, backend: Backend) -> bool {
        match backend {
            Backend::Cpu => true,
            Backend::Cuda => candle_core::utils::cuda_is_available(),
            Backend::Metal => candle_core::utils::metal_is_available(),
        }
    }

    fn cuda_device_name(&self, _index: usize) -> String {
        #[cfg(feature = "cuda")]
        if let Ok(device) = cudarc::driver::CudaDevice::new(_index) {
            if let Ok(name) = device.name() {
                return name;
            }
        }

        DEVICE_NAME_CUDA.to_uppercase()
    }

    fn current_cuda_device(&self) -> usize {
        // candle keeps a single implicit cuda context, there is no current-device call.
        0
    }
}

// Pick the device to run the model on.
//
// "auto" probes the backends in priority order and settles on the first available
// one, terminating at the cpu which is always present. An explicit request is parsed
// and returned without probing, so an unavailable device only fails at open().
pub fn choose_device(options: &Options, probe: &impl Probe) -> Result<DeviceSpec, PickError> {
    if options.device != DEVICE_AUTO {
        return options.device.parse();
    }

    if probe.is_available(Backend::Cuda) {
        info!("auto-selected cuda device");
        return Ok(DeviceSpec::Cuda(None));
    }

    if probe.is_available(Backend::Metal) {
        info!("auto-selected metal device");
        return Ok(DeviceSpec::Metal(None));
    }

    debug!("no accelerator available, falling back to cpu");
    Ok(DeviceSpec::Cpu)
}

// Human readable name of the given device: the hardware product name for cuda, the
// uppercased backend tag for everything else. The cuda lookup can be a non-trivial
// call into the driver.
pub fn device_name(device: &DeviceSpec, probe: &impl Probe) -> String {
    match device {
        DeviceSpec::Cuda(index) => {
            probe.cuda_device_name(index.unwrap_or_else(|| probe.current_cuda_device()))
        }
        DeviceSpec::Cpu => DEVICE_NAME_CPU.to_uppercase(),
        DeviceSpec::Metal(_) => DEVICE_NAME_METAL.to_uppercase(),
    }
}

// Ensure the device carries an explicit index where the backend uses one.
//
// cuda is the only backend with a notion of a currently active device, so cpu and
// metal specs pass through unchanged.
pub fn normalize_device(device: &DeviceSpec, probe: &impl Probe) -> DeviceSpec {
    match device {
        DeviceSpec::Cuda(None) => DeviceSpec::Cuda(Some(probe.current_cuda_device())),
        other => other.clone(),
    }
}
