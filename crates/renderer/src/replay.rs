//! Replays cached scripts onto a [`DrawSurface`].
//!
//! One pass walks the root script in order, applying state ops to an explicit
//! [`StateStack`] and issuing draws with the top-of-stack state as it is at
//! that moment. `DrawScript` recurses through the cache by id only; an active
//! chain of ids gives cycle detection and a depth ceiling bounds long chains.
//! Anything wrong with a single sub-draw becomes a [`ReplayWarning`]; only a
//! missing root or a surface failure ends the frame.

use core::{fmt, mem};
use std::rc::Rc;

use log::{trace, warn};
use scene_script::{ClipMode, Color, DrawFlags, Op, Shape, Sprite};
use thiserror::Error;
use tiny_skia_path::{Path, Transform};
use tracing::info_span;

use crate::assets::{AssetKind, AssetRegistry};
use crate::cache::{Script, ScriptCache};
use crate::geometry::{ScenePath, shape_path};
use crate::paint::{PaintResolver, ResolveError, ResolvedPaint};
use crate::state::{ClipNode, StateStack};
use crate::surface::{DrawContext, DrawSurface, SurfaceError, TextRun};

/// Default ceiling on nested `DrawScript` references, root included.
pub const MAX_SCRIPT_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayLimits {
    pub max_script_depth: usize,
}

impl Default for ReplayLimits {
    fn default() -> Self {
        Self {
            max_script_depth: MAX_SCRIPT_DEPTH,
        }
    }
}

impl ReplayLimits {
    /// A depth below one would reject the root itself; it is raised to one.
    #[must_use]
    pub fn new(max_script_depth: usize) -> Self {
        Self {
            max_script_depth: max_script_depth.max(1),
        }
    }
}

/// A degradation absorbed during replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayWarning {
    /// `from` references `target`, which is not cached.
    DanglingReference { from: String, target: String },
    /// Active chain of ids, ending with the id that was already active.
    CycleDetected { chain: Vec<String> },
    DepthExceeded { target: String, depth: usize },
    MissingAsset { kind: AssetKind, id: String },
    UnsupportedPaint,
    /// `pop_state` with nothing pushed in `script`.
    UnbalancedPop { script: String },
    /// `fill_path`, `stroke_path` or `clip_path` with no path geometry.
    EmptyPath { script: String },
}

impl fmt::Display for ReplayWarning {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingReference { from, target } => {
                write!(formatter, "script `{from}` references missing script `{target}`")
            }
            Self::CycleDetected { chain } => {
                write!(formatter, "reference cycle skipped: {}", chain.join(" -> "))
            }
            Self::DepthExceeded { target, depth } => {
                write!(formatter, "script `{target}` skipped at depth {depth}")
            }
            Self::MissingAsset { kind, id } => write!(formatter, "{kind} asset `{id}` is not loaded"),
            Self::UnsupportedPaint => formatter.write_str("paint cannot be represented by the surface"),
            Self::UnbalancedPop { script } => {
                write!(formatter, "unbalanced pop_state in script `{script}`")
            }
            Self::EmptyPath { script } => write!(formatter, "empty path used in script `{script}`"),
        }
    }
}

/// Outcome of a completed replay pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub warnings: Vec<ReplayWarning>,
    /// Script walks, counting the root and every repeated reference.
    pub scripts_visited: usize,
    pub draw_calls: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    #[error("no root script is cached")]
    MissingRoot,
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

#[derive(Debug, Clone, Copy)]
enum PaintSlot {
    Fill,
    Stroke,
}

/// State for one replay pass.
pub struct Replayer<'frame, D: DrawSurface> {
    surface: &'frame mut D,
    cache: &'frame ScriptCache,
    assets: &'frame AssetRegistry,
    shaders: &'frame mut PaintResolver<D::Shader>,
    limits: ReplayLimits,
    stack: StateStack,
    active: Vec<&'frame str>,
    path: ScenePath,
    next_clip_id: u64,
    report: ReplayReport,
}

/// Replays the cache's root script.
///
/// # Errors
/// [`ReplayError::MissingRoot`] if no root is cached; the surface is not
/// touched. [`ReplayError::Surface`] if the surface fails to begin or end the
/// frame.
pub fn replay<D: DrawSurface>(
    surface: &mut D,
    cache: &ScriptCache,
    assets: &AssetRegistry,
    shaders: &mut PaintResolver<D::Shader>,
    clear: Color,
    limits: ReplayLimits,
) -> Result<ReplayReport, ReplayError> {
    let root = cache.root_id().ok_or(ReplayError::MissingRoot)?;
    Replayer::new(surface, cache, assets, shaders, limits).run(root, clear)
}

impl<'frame, D: DrawSurface> Replayer<'frame, D> {
    pub fn new(
        surface: &'frame mut D,
        cache: &'frame ScriptCache,
        assets: &'frame AssetRegistry,
        shaders: &'frame mut PaintResolver<D::Shader>,
        limits: ReplayLimits,
    ) -> Self {
        Self {
            surface,
            cache,
            assets,
            shaders,
            limits,
            stack: StateStack::default(),
            active: Vec::new(),
            path: ScenePath::new(),
            next_clip_id: 0,
            report: ReplayReport::default(),
        }
    }

    /// Replays `root_id` as one frame cleared to `clear`.
    ///
    /// # Errors
    /// See [`replay`].
    pub fn run(mut self, root_id: &str, clear: Color) -> Result<ReplayReport, ReplayError> {
        let cache = self.cache;
        let root = cache.get(root_id).ok_or(ReplayError::MissingRoot)?;
        let _span = info_span!("renderer.replay", root = root_id).entered();

        self.surface.begin_frame(clear)?;
        self.walk(root);
        self.surface.end_frame()?;
        self.shaders.end_frame();

        trace!(
            target: "renderer",
            "replayed `{root_id}`: {} scripts, {} draws, {} warnings",
            self.report.scripts_visited,
            self.report.draw_calls,
            self.report.warnings.len()
        );
        Ok(self.report)
    }

    fn warn(&mut self, warning: ReplayWarning) {
        warn!(target: "renderer", "{warning}");
        self.report.warnings.push(warning);
    }

    fn walk(&mut self, script: &'frame Script) {
        self.active.push(script.id());
        self.report.scripts_visited += 1;
        for op in script.ops() {
            self.apply(script.id(), op);
        }
        self.active.pop();
    }

    fn apply(&mut self, script: &'frame str, op: &'frame Op) {
        match op {
            Op::PushState => self.stack.push(),
            Op::PopState => {
                if !self.stack.pop() {
                    self.warn(ReplayWarning::UnbalancedPop {
                        script: script.to_owned(),
                    });
                }
            }
            Op::PopPushState => {
                if !self.stack.pop_push() {
                    self.warn(ReplayWarning::UnbalancedPop {
                        script: script.to_owned(),
                    });
                }
            }

            Op::Translate { x, y } => self.concat(Transform::from_translate(*x, *y)),
            Op::Scale { x, y } => self.concat(Transform::from_scale(*x, *y)),
            Op::Rotate { radians } => self.concat(Transform::from_rotate(radians.to_degrees())),
            Op::Transform(matrix) => self.concat(Transform::from_row(
                matrix.sx, matrix.ky, matrix.kx, matrix.sy, matrix.tx, matrix.ty,
            )),

            Op::FillPaint(paint) => self.stack.top_mut().fill = paint.clone(),
            Op::StrokePaint(paint) => self.stack.top_mut().stroke = paint.clone(),
            Op::StrokeWidth(width) => self.stack.top_mut().stroke_style.width = *width,
            Op::LineCap(cap) => self.stack.top_mut().stroke_style.cap = *cap,
            Op::LineJoin(join) => self.stack.top_mut().stroke_style.join = *join,
            Op::MiterLimit(limit) => self.stack.top_mut().stroke_style.miter_limit = *limit,

            Op::Font(font) => self.stack.top_mut().text.font.clone_from(font),
            Op::FontSize(size) => self.stack.top_mut().text.size = *size,
            Op::TextAlign(align) => self.stack.top_mut().text.align = *align,
            Op::TextBaseline(baseline) => self.stack.top_mut().text.baseline = *baseline,

            Op::Draw { shape, flags } => self.draw_shape(shape, *flags),
            Op::DrawText(text) => self.draw_text(text),
            Op::DrawSprites { image, sprites } => self.draw_sprites(image, sprites),
            Op::DrawScript(target) => self.draw_script(script, target),

            Op::BeginPath => self.path = ScenePath::new(),
            Op::ClosePath => self.path.close(),
            Op::FillPath => match self.path.snapshot() {
                Some(path) => self.fill(&path),
                None => self.warn(ReplayWarning::EmptyPath {
                    script: script.to_owned(),
                }),
            },
            Op::StrokePath => match self.path.snapshot() {
                Some(path) => self.stroke(&path),
                None => self.warn(ReplayWarning::EmptyPath {
                    script: script.to_owned(),
                }),
            },
            Op::MoveTo(point) => self.path.move_to(point.x, point.y),
            Op::LineTo(point) => self.path.line_to(point.x, point.y),
            Op::ArcTo {
                tangent,
                end,
                radius,
            } => self.path.arc_to(*tangent, *end, *radius),
            Op::BezierTo {
                control1,
                control2,
                end,
            } => self.path.cubic_to(*control1, *control2, *end),
            Op::QuadraticTo { control, end } => self.path.quad_to(*control, *end),
            Op::AddShape(shape) => self.path.add_shape(shape),
            Op::PathArc {
                center,
                radius,
                start,
                end,
                direction,
            } => self.path.arc(*center, *radius, *start, *end, *direction),

            Op::Scissor { width, height } => {
                let rect = shape_path(&Shape::Rect {
                    width: *width,
                    height: *height,
                });
                self.push_clip(rect, ClipMode::Intersect);
            }
            Op::ClipPath(mode) => {
                let path = self.path.snapshot();
                if path.is_none() {
                    self.warn(ReplayWarning::EmptyPath {
                        script: script.to_owned(),
                    });
                }
                self.push_clip(path, *mode);
            }
        }
    }

    fn concat(&mut self, local: Transform) {
        let state = self.stack.top_mut();
        state.transform = state.transform.pre_concat(local);
    }

    fn push_clip(&mut self, path: Option<Path>, mode: ClipMode) {
        self.next_clip_id += 1;
        let id = self.next_clip_id;
        let state = self.stack.top_mut();
        let parent = state.clip.take();
        state.clip = Some(Rc::new(ClipNode::new(id, path, state.transform, mode, parent)));
    }

    fn resolve(&mut self, slot: PaintSlot) -> Option<ResolvedPaint<D::Shader>> {
        let state = self.stack.top();
        let paint = match slot {
            PaintSlot::Fill => &state.fill,
            PaintSlot::Stroke => &state.stroke,
        };
        match self.shaders.resolve(&mut *self.surface, self.assets, paint) {
            Ok(resolved) => Some(resolved),
            Err(ResolveError::MissingAsset { kind, id }) => {
                self.warn(ReplayWarning::MissingAsset { kind, id });
                None
            }
            Err(ResolveError::Unsupported) => {
                self.warn(ReplayWarning::UnsupportedPaint);
                None
            }
        }
    }

    fn fill(&mut self, path: &Path) {
        let Some(paint) = self.resolve(PaintSlot::Fill) else {
            return;
        };
        let state = self.stack.top();
        let ctx = DrawContext {
            transform: state.transform,
            clip: state.clip.as_deref(),
        };
        self.surface.fill_path(path, &paint, &ctx);
        self.report.draw_calls += 1;
    }

    fn stroke(&mut self, path: &Path) {
        let Some(paint) = self.resolve(PaintSlot::Stroke) else {
            return;
        };
        let state = self.stack.top();
        let ctx = DrawContext {
            transform: state.transform,
            clip: state.clip.as_deref(),
        };
        self.surface
            .stroke_path(path, &paint, &state.stroke_style, &ctx);
        self.report.draw_calls += 1;
    }

    fn draw_shape(&mut self, shape: &Shape, flags: DrawFlags) {
        let Some(path) = shape_path(shape) else {
            return;
        };
        // A line has no interior.
        if flags.fills() && !matches!(shape, Shape::Line { .. }) {
            self.fill(&path);
        }
        if flags.strokes() {
            self.stroke(&path);
        }
    }

    fn draw_text(&mut self, text: &str) {
        let Some(paint) = self.resolve(PaintSlot::Fill) else {
            return;
        };
        let state = self.stack.top();
        let run = TextRun {
            text,
            style: &state.text,
            font: self.assets.font(&state.text.font).map(AsRef::as_ref),
        };
        let ctx = DrawContext {
            transform: state.transform,
            clip: state.clip.as_deref(),
        };
        self.surface.draw_text(&run, &paint, &ctx);
        self.report.draw_calls += 1;
    }

    fn draw_sprites(&mut self, image_id: &str, sprites: &[Sprite]) {
        let Some(image) = self.assets.texture(image_id) else {
            self.warn(ReplayWarning::MissingAsset {
                kind: AssetKind::Image,
                id: image_id.to_owned(),
            });
            return;
        };
        let state = self.stack.top();
        let ctx = DrawContext {
            transform: state.transform,
            clip: state.clip.as_deref(),
        };
        for sprite in sprites {
            self.surface.draw_image_rect(image, sprite, &ctx);
        }
        self.report.draw_calls += sprites.len();
    }

    fn draw_script(&mut self, from: &'frame str, target: &'frame str) {
        if self.active.contains(&target) {
            let mut chain: Vec<String> = self.active.iter().map(|id| (*id).to_owned()).collect();
            chain.push(target.to_owned());
            self.warn(ReplayWarning::CycleDetected { chain });
            return;
        }
        if self.active.len() >= self.limits.max_script_depth {
            self.warn(ReplayWarning::DepthExceeded {
                target: target.to_owned(),
                depth: self.active.len(),
            });
            return;
        }
        let cache = self.cache;
        let Some(script) = cache.get(target) else {
            self.warn(ReplayWarning::DanglingReference {
                from: from.to_owned(),
                target: target.to_owned(),
            });
            return;
        };

        let scope = self.stack.enter_scope();
        let caller_path = mem::take(&mut self.path);
        self.walk(script);
        self.path = caller_path;
        self.stack.exit_scope(scope);
    }
}
