pub mod adapters;
pub mod bootstrap;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use config::BridgeConfig;
pub use core::{device::RgbwDevice, manager::DeviceManager};
pub use utils::error::{BridgeError, Result};
