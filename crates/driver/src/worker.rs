//! The render thread: owns the engine and the surface, applies commands and
//! redraws at most once per tick.

use core::time::Duration;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crossbeam::channel::{Receiver, RecvTimeoutError};
use log::{debug, error, info, trace};
use raster_backend::{RasterFrame, RasterShader, RasterSurface};
use renderer::SceneEngine;
use tracing::info_span;

use crate::command::Command;

/// State the render thread shares with handles.
#[derive(Default)]
pub struct Shared {
    pub frame: Mutex<Option<RasterFrame>>,
    pub frames: AtomicU64,
    pub scripts: AtomicUsize,
}

pub struct Worker {
    pub engine: SceneEngine<RasterShader>,
    pub surface: RasterSurface,
    pub commands: Receiver<Command>,
    pub shared: Arc<Shared>,
    pub interval: Duration,
}

impl Worker {
    pub fn run(mut self) {
        info!(target: "scene_driver", "render thread started");
        let mut next_tick = Instant::now() + self.interval;
        loop {
            let timeout = next_tick.saturating_duration_since(Instant::now());
            match self.commands.recv_timeout(timeout) {
                Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Ok(Command::Flush(reply)) => {
                    self.tick();
                    next_tick = Instant::now() + self.interval;
                    if reply.send(()).is_err() {
                        trace!(target: "scene_driver", "flush caller went away");
                    }
                }
                Ok(command) => self.apply(command),
                Err(RecvTimeoutError::Timeout) => {}
            }
            if Instant::now() >= next_tick {
                self.tick();
                next_tick = Instant::now() + self.interval;
            }
        }
        info!(target: "scene_driver", "render thread stopped");
    }

    fn apply(&mut self, command: Command) {
        let _span = info_span!("scene_driver.command", kind = command.name()).entered();
        match command {
            Command::Submit { id, ops } => self.engine.submit_decoded(&id, ops),
            Command::SubmitBatch(entries) => self.engine.submit_decoded_batch(entries),
            Command::Delete(id) => {
                if !self.engine.delete(&id) {
                    debug!(target: "scene_driver", "delete of unknown script `{id}`");
                }
            }
            Command::Reset => self.engine.reset(),
            Command::SetClearColor(color) => self.engine.set_clear_color(color),
            Command::AssetReady { id, asset } => self.engine.on_asset_ready(&id, asset),
            Command::AssetDelete { kind, id } => {
                if !self.engine.on_asset_delete(kind, &id) {
                    debug!(target: "scene_driver", "delete of unknown {kind} `{id}`");
                }
            }
            Command::Resize { width, height } => match self.surface.resize(width, height) {
                Ok(()) => self.engine.request_redraw(),
                Err(err) => error!(target: "scene_driver", "resize rejected: {err}"),
            },
            Command::RequestRedraw => self.engine.request_redraw(),
            Command::Flush(_) | Command::Shutdown => {}
        }
        self.shared
            .scripts
            .store(self.engine.script_count(), Ordering::Release);
    }

    fn tick(&mut self) {
        match self.engine.redraw_if_dirty(&mut self.surface) {
            Ok(Some(report)) => {
                trace!(
                    target: "scene_driver",
                    "frame drawn: {} scripts, {} draw calls, {} warnings",
                    report.scripts_visited,
                    report.draw_calls,
                    report.warnings.len()
                );
                self.publish();
            }
            Ok(None) => {}
            // Already logged and re-marked dirty by the engine.
            Err(err) => debug!(target: "scene_driver", "frame deferred: {err}"),
        }
    }

    fn publish(&self) {
        let frame = self.surface.frame();
        match self.shared.frame.lock() {
            Ok(mut slot) => *slot = Some(frame),
            Err(poisoned) => {
                error!(target: "scene_driver", "frame slot poisoned, replacing");
                *poisoned.into_inner() = Some(frame);
            }
        }
        self.shared.frames.fetch_add(1, Ordering::AcqRel);
    }
}
