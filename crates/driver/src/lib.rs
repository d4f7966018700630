//! Threaded driver for the scene engine: a render thread owning the engine and
//! a raster surface, fed through a command queue.

mod command;
pub mod config;
mod error;
mod handle;
mod worker;

pub use config::{DriverConfig, parse_color, parse_viewport};
pub use error::DriverError;
pub use handle::RendererHandle;

use env_logger::{Builder, Env};
use log::SetLoggerError;

/// Installs the env-filtered logger, defaulting to `warn`.
///
/// # Errors
/// Returns an error if a logger is already installed.
pub fn init_logging() -> Result<(), SetLoggerError> {
    Builder::from_env(Env::default().filter_or("RUST_LOG", "warn")).try_init()
}
