//! Paint resolution and the shader cache.
//!
//! Solid colours go straight through. Gradients are pure functions of their
//! descriptor and are cached by its bit pattern. Image and stream entries
//! remember which registry payload they were built from; the shader is rebuilt
//! after the registry reports a change for that id, or once it holds another
//! payload.

use core::ptr;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use log::{debug, trace};
use scene_script::{Color, LinearGradient, Paint, RadialGradient};
use thiserror::Error;

use crate::assets::{AssetKind, AssetRegistry, ImageAsset};

/// Default number of frames an unused shader survives.
pub const DEFAULT_IDLE_FRAMES: u64 = 600;

/// Descriptor handed to the backend when a shader has to be built.
#[derive(Debug, Clone, Copy)]
pub enum ShaderSource<'src> {
    Linear(&'src LinearGradient),
    Radial(&'src RadialGradient),
    /// The registry's payload; backends may keep the `Arc` instead of copying.
    Image(&'src Arc<ImageAsset>),
}

/// Backend seam for building shader handles.
pub trait ShaderFactory {
    /// Backend-ready shader; cloned out of the cache for every draw.
    type Shader: Clone;

    /// Builds a shader, or `None` if the backend cannot represent `source`
    /// (for example a gradient with coincident endpoints).
    fn create_shader(&mut self, source: ShaderSource<'_>) -> Option<Self::Shader>;
}

/// Paint ready for a draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedPaint<S> {
    Solid(Color),
    Shader(S),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("{kind} asset `{id}` is not loaded")]
    MissingAsset { kind: AssetKind, id: String },
    #[error("backend cannot build a shader for this paint")]
    Unsupported,
}

/// Gradient identity. Floats compare by bit pattern, so equal descriptors
/// always share an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum GradientKey {
    Linear([u32; 6]),
    Radial([u32; 6]),
}

const fn pack(color: Color) -> u32 {
    u32::from_be_bytes(color.to_array())
}

impl GradientKey {
    fn linear(gradient: &LinearGradient) -> Self {
        Self::Linear([
            gradient.start.x.to_bits(),
            gradient.start.y.to_bits(),
            gradient.end.x.to_bits(),
            gradient.end.y.to_bits(),
            pack(gradient.start_color),
            pack(gradient.end_color),
        ])
    }

    fn radial(gradient: &RadialGradient) -> Self {
        Self::Radial([
            gradient.center.x.to_bits(),
            gradient.center.y.to_bits(),
            gradient.inner_radius.to_bits(),
            gradient.outer_radius.to_bits(),
            pack(gradient.inner_color),
            pack(gradient.outer_color),
        ])
    }
}

#[derive(Debug)]
struct GradientEntry<S> {
    shader: S,
    last_used: u64,
}

#[derive(Debug)]
struct AssetEntry<S> {
    shader: S,
    source: Weak<ImageAsset>,
    last_used: u64,
}

/// Counters for the shader cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShaderCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub invalidations: u64,
    pub entries: usize,
}

pub struct PaintResolver<S> {
    gradients: HashMap<GradientKey, GradientEntry<S>>,
    images: HashMap<String, AssetEntry<S>>,
    streams: HashMap<String, AssetEntry<S>>,
    frame: u64,
    idle_frames: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
    invalidations: u64,
}

impl<S> Default for PaintResolver<S> {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_FRAMES)
    }
}

impl<S> PaintResolver<S> {
    /// Entries unused for more than `idle_frames` frames are evicted by
    /// [`PaintResolver::end_frame`].
    pub fn new(idle_frames: u64) -> Self {
        Self {
            gradients: HashMap::new(),
            images: HashMap::new(),
            streams: HashMap::new(),
            frame: 0,
            idle_frames,
            hits: 0,
            misses: 0,
            evictions: 0,
            invalidations: 0,
        }
    }

    fn asset_entries(&mut self, kind: AssetKind) -> Option<&mut HashMap<String, AssetEntry<S>>> {
        match kind {
            AssetKind::Image => Some(&mut self.images),
            AssetKind::Stream => Some(&mut self.streams),
            AssetKind::Font => None,
        }
    }

    /// Drops the shader built from asset `id`. Called when the registry
    /// reports a change; the next resolve rebuilds from the new payload.
    pub fn invalidate_asset(&mut self, kind: AssetKind, id: &str) -> bool {
        let removed = self
            .asset_entries(kind)
            .is_some_and(|entries| entries.remove(id).is_some());
        if removed {
            self.invalidations += 1;
            trace!(target: "renderer", "shader for {kind} `{id}` invalidated");
        }
        removed
    }

    /// Advances the frame counter and evicts idle entries. Returns how many
    /// entries were dropped.
    pub fn end_frame(&mut self) -> usize {
        let frame = self.frame;
        let idle = self.idle_frames;
        let live = |last_used: u64| frame.saturating_sub(last_used) <= idle;
        let before = self.len();
        self.gradients.retain(|_, entry| live(entry.last_used));
        self.images.retain(|_, entry| live(entry.last_used));
        self.streams.retain(|_, entry| live(entry.last_used));
        let evicted = before - self.len();
        if evicted > 0 {
            self.evictions += evicted as u64;
            debug!(target: "renderer", "evicted {evicted} idle shaders");
        }
        self.frame += 1;
        evicted
    }

    pub fn clear(&mut self) {
        self.gradients.clear();
        self.images.clear();
        self.streams.clear();
    }

    pub fn len(&self) -> usize {
        self.gradients.len() + self.images.len() + self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> ShaderCacheStats {
        ShaderCacheStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            invalidations: self.invalidations,
            entries: self.len(),
        }
    }
}

impl<S: Clone> PaintResolver<S> {
    /// Resolves `paint` to something the backend can draw with.
    ///
    /// # Errors
    /// [`ResolveError::MissingAsset`] if an image or stream paint names an
    /// asset that is not loaded, [`ResolveError::Unsupported`] if the factory
    /// declines the descriptor. Neither outcome is cached.
    pub fn resolve<F>(
        &mut self,
        factory: &mut F,
        assets: &AssetRegistry,
        paint: &Paint,
    ) -> Result<ResolvedPaint<S>, ResolveError>
    where
        F: ShaderFactory<Shader = S> + ?Sized,
    {
        match paint {
            Paint::Color(color) => Ok(ResolvedPaint::Solid(*color)),
            Paint::Linear(gradient) => self.gradient(
                factory,
                GradientKey::linear(gradient),
                ShaderSource::Linear(gradient),
            ),
            Paint::Radial(gradient) => self.gradient(
                factory,
                GradientKey::radial(gradient),
                ShaderSource::Radial(gradient),
            ),
            Paint::Image(id) => self.asset(factory, assets, AssetKind::Image, id),
            Paint::Stream(id) => self.asset(factory, assets, AssetKind::Stream, id),
        }
    }

    fn gradient<F>(
        &mut self,
        factory: &mut F,
        key: GradientKey,
        source: ShaderSource<'_>,
    ) -> Result<ResolvedPaint<S>, ResolveError>
    where
        F: ShaderFactory<Shader = S> + ?Sized,
    {
        if let Some(entry) = self.gradients.get_mut(&key) {
            entry.last_used = self.frame;
            self.hits += 1;
            return Ok(ResolvedPaint::Shader(entry.shader.clone()));
        }
        self.misses += 1;
        let shader = factory
            .create_shader(source)
            .ok_or(ResolveError::Unsupported)?;
        self.gradients.insert(
            key,
            GradientEntry {
                shader: shader.clone(),
                last_used: self.frame,
            },
        );
        Ok(ResolvedPaint::Shader(shader))
    }

    fn asset<F>(
        &mut self,
        factory: &mut F,
        assets: &AssetRegistry,
        kind: AssetKind,
        id: &str,
    ) -> Result<ResolvedPaint<S>, ResolveError>
    where
        F: ShaderFactory<Shader = S> + ?Sized,
    {
        let frame = self.frame;
        let (entries, current) = match kind {
            AssetKind::Stream => (&mut self.streams, assets.stream(id)),
            AssetKind::Image | AssetKind::Font => (&mut self.images, assets.image(id)),
        };

        if let Some(entry) = entries.get_mut(id) {
            if current.is_some_and(|image| ptr::eq(entry.source.as_ptr(), Arc::as_ptr(image))) {
                entry.last_used = frame;
                self.hits += 1;
                return Ok(ResolvedPaint::Shader(entry.shader.clone()));
            }
            // Payload was replaced or dropped without a notification reaching us.
            entries.remove(id);
        }

        self.misses += 1;
        let image = current.ok_or_else(|| ResolveError::MissingAsset {
            kind,
            id: id.to_owned(),
        })?;
        let shader = factory
            .create_shader(ShaderSource::Image(image))
            .ok_or(ResolveError::Unsupported)?;
        entries.insert(
            id.to_owned(),
            AssetEntry {
                shader: shader.clone(),
                source: Arc::downgrade(image),
                last_used: frame,
            },
        );
        Ok(ResolvedPaint::Shader(shader))
    }
}
