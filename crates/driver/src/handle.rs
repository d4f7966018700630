use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Sender};
use log::{debug, warn};
use raster_backend::{RasterFrame, RasterSurface};
use renderer::{Asset, AssetKind, FontAsset, ImageAsset, ROOT_ID, SceneEngine, TextureFormat};
use scene_script::{Color, decode};

use crate::command::Command;
use crate::config::DriverConfig;
use crate::error::DriverError;
use crate::worker::{Shared, Worker};

/// Thread-safe front of a render thread.
///
/// Scripts and assets are decoded on the calling thread, so malformed input
/// is reported here and never reaches the queue. Everything else is applied
/// asynchronously in call order.
pub struct RendererHandle {
    commands: Sender<Command>,
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl RendererHandle {
    /// Starts a render thread drawing into a raster surface of the configured
    /// viewport.
    ///
    /// # Errors
    /// Returns an error if the surface cannot be allocated or the thread
    /// cannot be spawned.
    pub fn spawn(config: &DriverConfig) -> Result<Self, DriverError> {
        let surface = RasterSurface::new(config.viewport_width, config.viewport_height)?;
        let (sender, receiver) = channel::unbounded();
        let shared = Arc::new(Shared::default());
        let worker = Worker {
            engine: SceneEngine::new(config.engine_config()),
            surface,
            commands: receiver,
            shared: Arc::clone(&shared),
            interval: config.frame_interval(),
        };
        let thread = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || worker.run())?;
        debug!(
            target: "scene_driver",
            "render thread `{}` spawned for {}x{}",
            config.thread_name,
            config.viewport_width,
            config.viewport_height
        );
        Ok(Self {
            commands: sender,
            shared,
            thread: Some(thread),
        })
    }

    fn send(&self, command: Command) -> Result<(), DriverError> {
        self.commands
            .send(command)
            .map_err(|_| DriverError::Disconnected)
    }

    /// # Errors
    /// Returns the decode error, or [`DriverError::Disconnected`].
    pub fn submit(&self, id: &str, bytes: &[u8]) -> Result<(), DriverError> {
        let ops = decode(bytes)?;
        self.send(Command::Submit {
            id: id.to_owned(),
            ops,
        })
    }

    /// # Errors
    /// See [`Self::submit`].
    pub fn submit_root(&self, bytes: &[u8]) -> Result<(), DriverError> {
        self.submit(ROOT_ID, bytes)
    }

    /// Decodes every entry first; one bad entry rejects the whole batch.
    ///
    /// # Errors
    /// Returns the first decode error, or [`DriverError::Disconnected`].
    pub fn submit_batch<K, B>(&self, entries: &[(K, B)]) -> Result<(), DriverError>
    where
        K: AsRef<str>,
        B: AsRef<[u8]>,
    {
        let decoded = renderer::decode_batch(entries)?;
        self.send(Command::SubmitBatch(decoded))
    }

    /// # Errors
    /// Returns [`DriverError::Disconnected`] if the render thread has stopped.
    pub fn delete(&self, id: &str) -> Result<(), DriverError> {
        self.send(Command::Delete(id.to_owned()))
    }

    /// # Errors
    /// Returns [`DriverError::Disconnected`] if the render thread has stopped.
    pub fn reset(&self) -> Result<(), DriverError> {
        self.send(Command::Reset)
    }

    /// # Errors
    /// Returns [`DriverError::Disconnected`] if the render thread has stopped.
    pub fn set_clear_color(&self, color: Color) -> Result<(), DriverError> {
        self.send(Command::SetClearColor(color))
    }

    /// # Errors
    /// Returns the image decode error, or [`DriverError::Disconnected`].
    pub fn on_image_put(&self, id: &str, bytes: &[u8]) -> Result<(), DriverError> {
        let image = ImageAsset::from_encoded(bytes)?;
        self.send(Command::AssetReady {
            id: id.to_owned(),
            asset: Asset::Image(image),
        })
    }

    /// # Errors
    /// Returns the texture error, or [`DriverError::Disconnected`].
    pub fn on_stream_put(
        &self,
        id: &str,
        format: TextureFormat,
        width: u32,
        height: u32,
        bytes: &[u8],
    ) -> Result<(), DriverError> {
        let image = ImageAsset::from_texture(format, width, height, bytes)?;
        self.send(Command::AssetReady {
            id: id.to_owned(),
            asset: Asset::Stream(image),
        })
    }

    /// # Errors
    /// Returns the font error, or [`DriverError::Disconnected`].
    pub fn on_font_put(&self, id: &str, bytes: Vec<u8>) -> Result<(), DriverError> {
        let font = FontAsset::new(bytes)?;
        self.send(Command::AssetReady {
            id: id.to_owned(),
            asset: Asset::Font(font),
        })
    }

    /// # Errors
    /// Returns [`DriverError::Disconnected`] if the render thread has stopped.
    pub fn on_asset_delete(&self, kind: AssetKind, id: &str) -> Result<(), DriverError> {
        self.send(Command::AssetDelete {
            kind,
            id: id.to_owned(),
        })
    }

    /// # Errors
    /// Returns [`DriverError::Disconnected`] if the render thread has stopped.
    pub fn resize(&self, width: u32, height: u32) -> Result<(), DriverError> {
        self.send(Command::Resize { width, height })
    }

    /// # Errors
    /// Returns [`DriverError::Disconnected`] if the render thread has stopped.
    pub fn request_redraw(&self) -> Result<(), DriverError> {
        self.send(Command::RequestRedraw)
    }

    /// Blocks until every earlier command is applied and any pending redraw
    /// has run.
    ///
    /// # Errors
    /// Returns [`DriverError::Disconnected`] if the render thread has stopped.
    pub fn flush(&self) -> Result<(), DriverError> {
        let (reply, done) = channel::bounded(1);
        self.send(Command::Flush(reply))?;
        done.recv().map_err(|_| DriverError::Disconnected)
    }

    /// Scripts cached as of the last applied command.
    pub fn script_count(&self) -> usize {
        self.shared.scripts.load(Ordering::Acquire)
    }

    /// Frames published so far.
    pub fn frames_rendered(&self) -> u64 {
        self.shared.frames.load(Ordering::Acquire)
    }

    /// The most recent published frame.
    ///
    /// # Errors
    /// Returns [`DriverError::Poisoned`] if the render thread panicked while
    /// publishing.
    pub fn latest_frame(&self) -> Result<Option<RasterFrame>, DriverError> {
        let slot = self.shared.frame.lock().map_err(|_| DriverError::Poisoned)?;
        Ok(slot.clone())
    }

    /// Stops the render thread and waits for it.
    ///
    /// # Errors
    /// Returns [`DriverError::ThreadPanicked`] if the thread did not exit
    /// cleanly.
    pub fn stop(mut self) -> Result<(), DriverError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), DriverError> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        if self.send(Command::Shutdown).is_err() {
            debug!(target: "scene_driver", "render thread already gone");
        }
        thread.join().map_err(|_| DriverError::ThreadPanicked)
    }
}

impl Drop for RendererHandle {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            warn!(target: "scene_driver", "render thread shutdown failed: {err}");
        }
    }
}
