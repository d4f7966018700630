//! Single-threaded scene state and its boundary operations.
//!
//! `SceneEngine` owns the script cache, the asset registry, the shader cache
//! and the redraw coordinator. Every mutation that can change the next frame
//! marks the coordinator dirty; every asset change also reaches the shader
//! cache before the next replay.

use log::{debug, error, info};
use scene_script::{Color, DecodeError, Op};

use crate::assets::{Asset, AssetChange, AssetError, AssetKind, AssetRegistry, TextureFormat};
use crate::cache::{ROOT_ID, ScriptCache, decode_batch};
use crate::paint::{DEFAULT_IDLE_FRAMES, PaintResolver, ShaderCacheStats};
use crate::redraw::{DirtyReason, RedrawCoordinator, RedrawHandle};
use crate::replay::{ReplayError, ReplayLimits, ReplayReport, replay};
use crate::surface::{DrawSurface, SurfaceError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub clear_color: Color,
    pub limits: ReplayLimits,
    pub shader_idle_frames: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            clear_color: Color::BLACK,
            limits: ReplayLimits::default(),
            shader_idle_frames: DEFAULT_IDLE_FRAMES,
        }
    }
}

pub struct SceneEngine<S> {
    cache: ScriptCache,
    assets: AssetRegistry,
    shaders: PaintResolver<S>,
    redraw: RedrawCoordinator,
    clear_color: Color,
    limits: ReplayLimits,
}

impl<S> Default for SceneEngine<S> {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl<S> SceneEngine<S> {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            cache: ScriptCache::new(),
            assets: AssetRegistry::new(),
            shaders: PaintResolver::new(config.shader_idle_frames),
            redraw: RedrawCoordinator::new(),
            clear_color: config.clear_color,
            limits: config.limits,
        }
    }

    /// Decodes `bytes` and replaces the script stored under `id`.
    ///
    /// # Errors
    /// Returns the [`DecodeError`]; the cache and the dirty flag are untouched.
    pub fn submit(&mut self, id: &str, bytes: &[u8]) -> Result<(), DecodeError> {
        self.cache.put_encoded(id, bytes)?;
        self.redraw.mark_dirty(DirtyReason::ScriptChanged);
        Ok(())
    }

    /// [`SceneEngine::submit`] under the well-known root id.
    ///
    /// # Errors
    /// Returns the [`DecodeError`].
    pub fn submit_root(&mut self, bytes: &[u8]) -> Result<(), DecodeError> {
        self.submit(ROOT_ID, bytes)
    }

    /// Stores an already decoded script.
    pub fn submit_decoded(&mut self, id: &str, ops: Vec<Op>) {
        self.cache.put(id, ops);
        self.redraw.mark_dirty(DirtyReason::ScriptChanged);
    }

    /// Decodes every entry, then applies them all as one set.
    ///
    /// # Errors
    /// Returns the first [`DecodeError`]; nothing from the batch is applied.
    pub fn submit_batch<K, B>(&mut self, entries: &[(K, B)]) -> Result<(), DecodeError>
    where
        K: AsRef<str>,
        B: AsRef<[u8]>,
    {
        let staged = decode_batch(entries)?;
        self.submit_decoded_batch(staged);
        Ok(())
    }

    pub fn submit_decoded_batch(&mut self, entries: Vec<(String, Vec<Op>)>) {
        if entries.is_empty() {
            return;
        }
        debug!(target: "renderer", "applying batch of {} scripts", entries.len());
        self.cache.put_batch(entries);
        self.redraw.mark_dirty(DirtyReason::ScriptChanged);
    }

    /// Removes `id`. Returns whether a script was stored under it.
    pub fn delete(&mut self, id: &str) -> bool {
        let removed = self.cache.delete(id);
        if removed {
            self.redraw.mark_dirty(DirtyReason::ScriptDeleted);
        }
        removed
    }

    /// Drops every script. Assets stay registered.
    pub fn reset(&mut self) {
        info!(target: "renderer", "scene reset, dropping {} scripts", self.cache.len());
        self.cache.clear();
        self.redraw.mark_dirty(DirtyReason::SceneReset);
    }

    pub fn set_clear_color(&mut self, color: Color) {
        if self.clear_color != color {
            self.clear_color = color;
            self.redraw.mark_dirty(DirtyReason::ClearColor);
        }
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn script_count(&self) -> usize {
        self.cache.len()
    }

    pub fn cache(&self) -> &ScriptCache {
        &self.cache
    }

    pub fn assets(&self) -> &AssetRegistry {
        &self.assets
    }

    pub fn shader_stats(&self) -> ShaderCacheStats {
        self.shaders.stats()
    }

    fn asset_changed(&mut self, change: &AssetChange) {
        self.shaders.invalidate_asset(change.kind, &change.id);
        self.redraw.mark_dirty(DirtyReason::AssetChanged);
    }

    /// Registers or replaces a static image from an encoded file.
    ///
    /// # Errors
    /// Returns the decode error; the previous image under `id` stays in use.
    pub fn on_image_put(&mut self, id: &str, bytes: &[u8]) -> Result<(), AssetError> {
        let change = self.assets.put_image(id, bytes)?;
        self.asset_changed(&change);
        Ok(())
    }

    /// Registers or replaces a streamed texture frame.
    ///
    /// # Errors
    /// Returns an error for a size mismatch or undecodable `File` data.
    pub fn on_stream_put(
        &mut self,
        id: &str,
        format: TextureFormat,
        width: u32,
        height: u32,
        bytes: &[u8],
    ) -> Result<(), AssetError> {
        let change = self.assets.put_stream(id, format, width, height, bytes)?;
        self.asset_changed(&change);
        Ok(())
    }

    /// # Errors
    /// Returns [`AssetError::EmptyFont`] for an empty buffer.
    pub fn on_font_put(&mut self, id: &str, bytes: Vec<u8>) -> Result<(), AssetError> {
        let change = self.assets.put_font(id, bytes)?;
        self.asset_changed(&change);
        Ok(())
    }

    /// Stores an asset decoded elsewhere, for example on a loader thread.
    pub fn on_asset_ready(&mut self, id: &str, asset: Asset) {
        let change = self.assets.insert(id, asset);
        self.asset_changed(&change);
    }

    /// Removes an asset. Returns whether anything was stored under `id`.
    pub fn on_asset_delete(&mut self, kind: AssetKind, id: &str) -> bool {
        let Some(change) = self.assets.delete(kind, id) else {
            return false;
        };
        self.asset_changed(&change);
        true
    }

    pub fn request_redraw(&self) {
        self.redraw.mark_dirty(DirtyReason::Requested);
    }

    /// Notifier usable from other threads.
    pub fn redraw_handle(&self) -> RedrawHandle {
        self.redraw.handle()
    }

    pub fn is_dirty(&self) -> bool {
        self.redraw.is_dirty()
    }
}

impl<S: Clone> SceneEngine<S> {
    /// Replays the root onto `surface`, regardless of the dirty flag.
    ///
    /// # Errors
    /// [`ReplayError::MissingRoot`] if no root is cached,
    /// [`ReplayError::Surface`] if the surface fails the frame.
    pub fn replay_frame<D>(&mut self, surface: &mut D) -> Result<ReplayReport, ReplayError>
    where
        D: DrawSurface<Shader = S>,
    {
        replay(
            surface,
            &self.cache,
            &self.assets,
            &mut self.shaders,
            self.clear_color,
            self.limits,
        )
    }

    /// Replays once if anything changed since the last call.
    ///
    /// A missing root is a no-op. A surface failure keeps the scene dirty so
    /// the next call retries.
    ///
    /// # Errors
    /// Returns the [`SurfaceError`] of a failed frame.
    pub fn redraw_if_dirty<D>(&mut self, surface: &mut D) -> Result<Option<ReplayReport>, SurfaceError>
    where
        D: DrawSurface<Shader = S>,
    {
        let Some(events) = self.redraw.take_dirty() else {
            return Ok(None);
        };
        debug!(target: "renderer", "redrawing after {events} coalesced events");
        match self.replay_frame(surface) {
            Ok(report) => Ok(Some(report)),
            Err(ReplayError::MissingRoot) => {
                debug!(target: "renderer", "no root script, skipping frame");
                Ok(None)
            }
            Err(ReplayError::Surface(err)) => {
                error!(target: "renderer", "frame failed: {err}");
                self.redraw.mark_dirty(DirtyReason::RetryFailedFrame);
                Err(err)
            }
        }
    }
}
