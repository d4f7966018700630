use renderer::{AssetError, SurfaceError};
use scene_script::DecodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error("invalid driver configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("failed to spawn render thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("render thread has stopped")]
    Disconnected,
    #[error("render thread panicked")]
    ThreadPanicked,
    #[error("frame slot lock poisoned")]
    Poisoned,
}
