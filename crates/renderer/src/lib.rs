//! Backend-agnostic scene engine: script cache, draw-state replay, paint
//! resolution and redraw coordination.

pub mod assets;
pub mod cache;
pub mod engine;
pub mod geometry;
pub mod paint;
pub mod redraw;
pub mod replay;
pub mod state;
pub mod surface;

pub use assets::{
    Asset, AssetChange, AssetError, AssetKind, AssetRegistry, FontAsset, ImageAsset, TextureFormat,
};
pub use cache::{ROOT_ID, Script, ScriptCache, decode_batch};
pub use engine::{EngineConfig, SceneEngine};
pub use geometry::{ScenePath, shape_path};
pub use paint::{
    DEFAULT_IDLE_FRAMES, PaintResolver, ResolveError, ResolvedPaint, ShaderCacheStats,
    ShaderFactory, ShaderSource,
};
pub use redraw::{DirtyReason, RedrawCoordinator, RedrawHandle};
pub use replay::{
    MAX_SCRIPT_DEPTH, ReplayError, ReplayLimits, ReplayReport, ReplayWarning, Replayer, replay,
};
pub use state::{ClipNode, DrawState, StateStack, StrokeStyle, TextStyle};
pub use surface::{DrawContext, DrawSurface, Path, SurfaceError, TextRun, Transform};
