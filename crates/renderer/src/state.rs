//! Draw state carried through replay and the stack that scopes it.

use std::rc::Rc;

use scene_script::{ClipMode, LineCap, LineJoin, Paint, TextAlign, TextBaseline};
use tiny_skia_path::{Path, Transform};

/// Default font id when a script never selects one.
pub const DEFAULT_FONT: &str = "roboto";
pub const DEFAULT_FONT_SIZE: f32 = 20.0;
pub const DEFAULT_MITER_LIMIT: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: DEFAULT_MITER_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font: String,
    pub size: f32,
    pub align: TextAlign,
    pub baseline: TextBaseline,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font: DEFAULT_FONT.to_owned(),
            size: DEFAULT_FONT_SIZE,
            align: TextAlign::Left,
            baseline: TextBaseline::Alphabetic,
        }
    }
}

/// One clip region in a persistent chain.
///
/// Nodes are shared between a pushed state and its parent, so pushing state
/// never copies clip geometry. The effective clip is the fold of the chain
/// from the outermost node inward.
#[derive(Debug)]
pub struct ClipNode {
    id: u64,
    /// `None` is the empty region (a clip path with no geometry).
    path: Option<Path>,
    transform: Transform,
    mode: ClipMode,
    parent: Option<Rc<ClipNode>>,
}

impl ClipNode {
    pub fn new(
        id: u64,
        path: Option<Path>,
        transform: Transform,
        mode: ClipMode,
        parent: Option<Rc<Self>>,
    ) -> Self {
        Self {
            id,
            path,
            transform,
            mode,
            parent,
        }
    }

    /// Unique within one replay pass; surfaces may cache rasterised masks by it.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_ref()
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn mode(&self) -> ClipMode {
        self.mode
    }

    pub fn parent(&self) -> Option<&Self> {
        self.parent.as_deref()
    }

    /// Nodes from the outermost clip to this one.
    pub fn chain(&self) -> Vec<&Self> {
        let mut nodes = Vec::new();
        let mut next = Some(self);
        while let Some(node) = next {
            nodes.push(node);
            next = node.parent();
        }
        nodes.reverse();
        nodes
    }
}

/// Everything a draw op reads at the moment it is issued.
#[derive(Debug, Clone)]
pub struct DrawState {
    pub transform: Transform,
    pub fill: Paint,
    pub stroke: Paint,
    pub stroke_style: StrokeStyle,
    pub clip: Option<Rc<ClipNode>>,
    pub text: TextStyle,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Transform::identity(),
            fill: Paint::default(),
            stroke: Paint::default(),
            stroke_style: StrokeStyle::default(),
            clip: None,
            text: TextStyle::default(),
        }
    }
}

/// Saved position returned by [`StateStack::enter_scope`].
#[derive(Debug, Clone, Copy)]
#[must_use]
pub struct Scope {
    base: usize,
    previous_floor: usize,
}

/// Explicit state stack.
///
/// The top entry is the live state. A scope pins a floor: pops inside it never
/// remove the entry the scope started from, so a sub-script cannot unwind
/// state that belongs to its caller.
#[derive(Debug)]
pub struct StateStack {
    entries: Vec<DrawState>,
    floor: usize,
}

impl Default for StateStack {
    fn default() -> Self {
        Self::new(DrawState::default())
    }
}

impl StateStack {
    pub fn new(base: DrawState) -> Self {
        Self {
            entries: vec![base],
            floor: 0,
        }
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn top(&self) -> &DrawState {
        // The stack is never empty: pops stop at the floor entry.
        &self.entries[self.entries.len() - 1]
    }

    pub fn top_mut(&mut self) -> &mut DrawState {
        let last = self.entries.len() - 1;
        &mut self.entries[last]
    }

    /// Pushes a copy of the current state.
    pub fn push(&mut self) {
        let copy = self.top().clone();
        self.entries.push(copy);
    }

    /// Restores the state captured by the matching push. Returns `false`, and
    /// changes nothing, when only the scope's base entry is left.
    pub fn pop(&mut self) -> bool {
        if self.entries.len() <= self.floor + 1 {
            return false;
        }
        self.entries.pop();
        true
    }

    /// Pop then push: resets to the saved state without growing the stack.
    pub fn pop_push(&mut self) -> bool {
        if !self.pop() {
            return false;
        }
        self.push();
        true
    }

    pub fn enter_scope(&mut self) -> Scope {
        let scope = Scope {
            base: self.entries.len(),
            previous_floor: self.floor,
        };
        self.push();
        self.floor = scope.base;
        scope
    }

    /// Drops everything pushed since `scope` was entered, balanced or not.
    pub fn exit_scope(&mut self, scope: Scope) {
        self.entries.truncate(scope.base);
        self.floor = scope.previous_floor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene_script::Color;

    #[test]
    fn pop_restores_captured_transform() {
        let mut stack = StateStack::default();
        stack.push();
        stack.top_mut().transform = Transform::from_translate(5.0, 6.0);
        assert!(stack.pop());
        assert_eq!(stack.top().transform, Transform::identity());
    }

    #[test]
    fn pop_on_base_entry_is_ignored() {
        let mut stack = StateStack::default();
        stack.top_mut().fill = Paint::Color(Color::BLACK);
        assert!(!stack.pop());
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.top().fill, Paint::Color(Color::BLACK));
    }

    #[test]
    fn pop_push_resets_without_growing() {
        let mut stack = StateStack::default();
        stack.push();
        stack.top_mut().stroke_style.width = 9.0;
        assert!(stack.pop_push());
        assert_eq!(stack.depth(), 2);
        assert!((stack.top().stroke_style.width - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn scope_confines_unbalanced_ops() {
        let mut stack = StateStack::default();
        stack.top_mut().text.size = 11.0;
        let scope = stack.enter_scope();
        stack.top_mut().text.size = 30.0;
        stack.push();
        stack.push();
        // Only the two inner pushes can be popped.
        assert!(stack.pop());
        assert!(stack.pop());
        assert!(!stack.pop());
        stack.push();
        stack.exit_scope(scope);
        assert_eq!(stack.depth(), 1);
        assert!((stack.top().text.size - 11.0).abs() < f32::EPSILON);
        assert!(!stack.pop());
    }

    #[test]
    fn clip_chain_runs_outermost_first() {
        let outer = Rc::new(ClipNode::new(
            1,
            None,
            Transform::identity(),
            ClipMode::Intersect,
            None,
        ));
        let inner = ClipNode::new(
            2,
            None,
            Transform::identity(),
            ClipMode::Difference,
            Some(outer),
        );
        let ids: Vec<u64> = inner.chain().iter().map(|node| node.id()).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
