//! Schema module - Devices, colors and configuration types.

mod color;
mod config;
mod device;

pub use color::*;
pub use config::*;
pub use device::*;
