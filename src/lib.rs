//! Device and precision selection helpers for candle based inference.
//!
//! Picks a compute device (cpu, cuda or metal) and a numeric precision for
//! running a model, based on a user configuration and what the runtime
//! reports as available. Also normalizes device identifiers so cuda devices
//! always carry an explicit index before allocation.

pub mod config;
pub mod device;
pub mod error;
pub mod precision;

pub use config::Options;
pub use device::{Backend, CandleProbe, DeviceSpec, Probe, choose_device, device_name, normalize_device};
pub use error::PickError;
pub use precision::{CastPolicy, Precision, choose_autocast, choose_precision, resolve_dtype};
