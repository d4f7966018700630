//! Rasterised clip chains.

use std::collections::HashMap;

use renderer::ClipNode;
use scene_script::ClipMode;
use tiny_skia::{FillRule, Mask};

/// Coverage masks for the clip nodes seen this frame, keyed by node id.
///
/// A node's mask already folds in every ancestor, so a draw needs only the
/// innermost node.
#[derive(Debug, Default)]
pub struct ClipMasks {
    masks: HashMap<u64, Mask>,
}

impl ClipMasks {
    pub fn clear(&mut self) {
        self.masks.clear();
    }

    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&Mask> {
        self.masks.get(&id)
    }

    /// Builds the mask for `clip` and every uncached ancestor. Returns the id
    /// to look the mask up by, or `None` if a mask could not be allocated.
    pub fn prepare(&mut self, clip: &ClipNode, width: u32, height: u32) -> Option<u64> {
        if self.masks.contains_key(&clip.id()) {
            return Some(clip.id());
        }
        let chain = clip.chain();
        let cached = chain
            .iter()
            .rposition(|node| self.masks.contains_key(&node.id()));

        let mut mask = match cached {
            Some(index) => self.masks.get(&chain[index].id())?.clone(),
            None => full_mask(width, height)?,
        };
        let start = cached.map_or(0, |index| index + 1);
        for node in &chain[start..] {
            apply_node(&mut mask, node, width, height)?;
            self.masks.insert(node.id(), mask.clone());
        }
        Some(clip.id())
    }
}

fn full_mask(width: u32, height: u32) -> Option<Mask> {
    let mut mask = Mask::new(width, height)?;
    mask.data_mut().fill(255);
    Some(mask)
}

fn apply_node(mask: &mut Mask, node: &ClipNode, width: u32, height: u32) -> Option<()> {
    let Some(path) = node.path() else {
        // Empty region: intersecting removes everything, excluding removes nothing.
        if node.mode() == ClipMode::Intersect {
            mask.data_mut().fill(0);
        }
        return Some(());
    };

    let mut coverage = Mask::new(width, height)?;
    coverage.fill_path(path, FillRule::Winding, true, node.transform());
    let mode = node.mode();
    for (dst, &cov) in mask.data_mut().iter_mut().zip(coverage.data()) {
        let keep = match mode {
            ClipMode::Intersect => u16::from(cov),
            ClipMode::Difference => 255 - u16::from(cov),
        };
        *dst = ((u16::from(*dst) * keep + 127) / 255) as u8;
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use tiny_skia::{PathBuilder, Rect, Transform};

    fn rect_node(id: u64, rect: [f32; 4], mode: ClipMode, parent: Option<Rc<ClipNode>>) -> ClipNode {
        let path = Rect::from_xywh(rect[0], rect[1], rect[2], rect[3]).map(PathBuilder::from_rect);
        ClipNode::new(id, path, Transform::identity(), mode, parent)
    }

    fn coverage_at(masks: &ClipMasks, id: u64, x: usize, y: usize) -> u8 {
        let mask = masks.get(id).unwrap();
        mask.data()[y * mask.width() as usize + x]
    }

    #[test]
    fn intersect_then_difference() {
        let outer = Rc::new(rect_node(1, [0.0, 0.0, 8.0, 8.0], ClipMode::Intersect, None));
        let inner = rect_node(2, [2.0, 2.0, 2.0, 2.0], ClipMode::Difference, Some(outer));
        let mut masks = ClipMasks::default();
        let id = masks.prepare(&inner, 10, 10).unwrap();
        assert_eq!(id, 2);
        assert_eq!(masks.len(), 2);
        assert_eq!(coverage_at(&masks, 2, 1, 1), 255);
        assert_eq!(coverage_at(&masks, 2, 3, 3), 0);
        assert_eq!(coverage_at(&masks, 2, 9, 9), 0);
        assert_eq!(coverage_at(&masks, 1, 3, 3), 255);
    }

    #[test]
    fn empty_intersect_hides_everything() {
        let node = ClipNode::new(7, None, Transform::identity(), ClipMode::Intersect, None);
        let mut masks = ClipMasks::default();
        masks.prepare(&node, 4, 4).unwrap();
        assert!(masks.get(7).unwrap().data().iter().all(|&cov| cov == 0));
    }

    #[test]
    fn cached_parent_is_reused() {
        let outer = Rc::new(rect_node(1, [0.0, 0.0, 4.0, 4.0], ClipMode::Intersect, None));
        let mut masks = ClipMasks::default();
        masks.prepare(&outer, 8, 8).unwrap();
        let inner = rect_node(2, [0.0, 0.0, 2.0, 8.0], ClipMode::Intersect, Some(outer));
        masks.prepare(&inner, 8, 8).unwrap();
        assert_eq!(coverage_at(&masks, 2, 1, 1), 255);
        assert_eq!(coverage_at(&masks, 2, 1, 6), 0);
        assert_eq!(coverage_at(&masks, 2, 3, 1), 0);
    }
}
