//! Path construction for shapes and path ops.
//!
//! Everything is built from lines and cubics on a `tiny_skia_path::PathBuilder`
//! so the output is backend-neutral. Arcs follow the y-down convention: a
//! positive sweep turns clockwise on screen.

use core::f32::consts::{FRAC_PI_2, TAU};

use scene_script::{ArcDirection, CornerRadii, Point, Shape};
use tiny_skia_path::{Path, PathBuilder};

/// Cubic handle length for a quarter circle of unit radius.
const KAPPA90: f32 = 0.552_284_8;

/// Tangent-arc distances above this degrade to a straight line.
const ARC_TO_LINE_THRESHOLD: f32 = 10_000.0;

/// Path under construction between `begin_path` and `fill_path`/`stroke_path`.
///
/// Filling or stroking does not consume the path, matching canvas semantics:
/// a script may fill and then stroke the same outline.
#[derive(Debug, Clone, Default)]
pub struct ScenePath {
    builder: PathBuilder,
    current: Option<(f32, f32)>,
    subpath_start: Option<(f32, f32)>,
}

impl ScenePath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.builder.is_empty()
    }

    /// Finished copy of the path so far, or `None` if nothing drawable was added.
    pub fn snapshot(&self) -> Option<Path> {
        self.builder.clone().finish()
    }

    /// Consumes the builder.
    pub fn finish(self) -> Option<Path> {
        self.builder.finish()
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        self.builder.move_to(x, y);
        self.current = Some((x, y));
        self.subpath_start = Some((x, y));
    }

    /// Starts a subpath when there is no current point.
    pub fn line_to(&mut self, x: f32, y: f32) {
        if self.current.is_none() {
            self.move_to(x, y);
            return;
        }
        self.builder.line_to(x, y);
        self.current = Some((x, y));
    }

    pub fn quad_to(&mut self, control: Point, end: Point) {
        if self.current.is_none() {
            self.move_to(control.x, control.y);
        }
        self.builder.quad_to(control.x, control.y, end.x, end.y);
        self.current = Some((end.x, end.y));
    }

    pub fn cubic_to(&mut self, control1: Point, control2: Point, end: Point) {
        if self.current.is_none() {
            self.move_to(control1.x, control1.y);
        }
        self.builder
            .cubic_to(control1.x, control1.y, control2.x, control2.y, end.x, end.y);
        self.current = Some((end.x, end.y));
    }

    pub fn close(&mut self) {
        if self.current.is_some() {
            self.builder.close();
            self.current = self.subpath_start;
        }
    }

    /// Circular arc on `center` from angle `start` to `end`, normalised into a
    /// single turn in `direction`. Connects to the current point with a line.
    pub fn arc(&mut self, center: Point, radius: f32, start: f32, end: f32, direction: ArcDirection) {
        let mut sweep = end - start;
        match direction {
            ArcDirection::Clockwise => {
                if sweep.abs() >= TAU {
                    sweep = TAU;
                } else {
                    while sweep < 0.0 {
                        sweep += TAU;
                    }
                }
            }
            ArcDirection::CounterClockwise => {
                if sweep.abs() >= TAU {
                    sweep = -TAU;
                } else {
                    while sweep > 0.0 {
                        sweep -= TAU;
                    }
                }
            }
        }
        self.arc_sweep(center, radius, start, sweep, true);
    }

    /// Canvas-style `arcTo`: a circular arc tangent to the line from the current
    /// point to `tangent` and the line from `tangent` to `end`.
    pub fn arc_to(&mut self, tangent: Point, end: Point, radius: f32) {
        let Some((x0, y0)) = self.current else {
            self.move_to(tangent.x, tangent.y);
            return;
        };
        let (x1, y1) = (tangent.x, tangent.y);

        let Some((dx0, dy0)) = normalize(x0 - x1, y0 - y1) else {
            self.line_to(x1, y1);
            return;
        };
        let Some((dx1, dy1)) = normalize(end.x - x1, end.y - y1) else {
            self.line_to(x1, y1);
            return;
        };
        if radius <= f32::EPSILON {
            self.line_to(x1, y1);
            return;
        }

        let angle = (dx0 * dx1 + dy0 * dy1).clamp(-1.0, 1.0).acos();
        let dist = radius / (angle / 2.0).tan();
        if !dist.is_finite() || dist > ARC_TO_LINE_THRESHOLD {
            self.line_to(x1, y1);
            return;
        }

        let cross = dx1 * dy0 - dx0 * dy1;
        let (center, start, stop, direction) = if cross > 0.0 {
            (
                Point::new(x1 + dx0 * dist + dy0 * radius, y1 + dy0 * dist - dx0 * radius),
                dx0.atan2(-dy0),
                (-dx1).atan2(dy1),
                ArcDirection::Clockwise,
            )
        } else {
            (
                Point::new(x1 + dx0 * dist - dy0 * radius, y1 + dy0 * dist + dx0 * radius),
                (-dx0).atan2(dy0),
                dx1.atan2(-dy1),
                ArcDirection::CounterClockwise,
            )
        };
        self.arc(center, radius, start, stop, direction);
    }

    /// Appends `shape` as one or more new subpaths.
    pub fn add_shape(&mut self, shape: &Shape) {
        match *shape {
            Shape::Line { from, to } => {
                self.move_to(from.x, from.y);
                self.line_to(to.x, to.y);
            }
            Shape::Triangle(points) => self.polygon(&points),
            Shape::Quad(points) => self.polygon(&points),
            Shape::Rect { width, height } => {
                self.polygon(&[
                    Point::new(0.0, 0.0),
                    Point::new(width, 0.0),
                    Point::new(width, height),
                    Point::new(0.0, height),
                ]);
            }
            Shape::RoundedRect {
                width,
                height,
                radius,
            } => self.rounded_rect(width, height, CornerRadii::uniform(radius)),
            Shape::VarRoundedRect {
                width,
                height,
                radii,
            } => self.rounded_rect(width, height, radii),
            Shape::Arc { radius, radians } => {
                self.arc_sweep(Point::new(0.0, 0.0), radius, 0.0, radians, false);
            }
            Shape::Sector { radius, radians } => {
                self.move_to(0.0, 0.0);
                self.arc_sweep(Point::new(0.0, 0.0), radius, 0.0, radians, true);
                self.close();
            }
            Shape::Circle { radius } => self.ellipse(radius, radius),
            Shape::Ellipse { radius_x, radius_y } => self.ellipse(radius_x, radius_y),
        }
    }

    fn polygon(&mut self, points: &[Point]) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.move_to(first.x, first.y);
        for point in rest {
            self.line_to(point.x, point.y);
        }
        self.close();
    }

    /// Sweeps `sweep` radians from `start`, split into quarter-turn cubics.
    fn arc_sweep(&mut self, center: Point, radius: f32, start: f32, sweep: f32, connect: bool) {
        let radius = radius.abs();
        let point_at = |angle: f32| (center.x + angle.cos() * radius, center.y + angle.sin() * radius);

        let (x0, y0) = point_at(start);
        if connect && self.current.is_some() {
            self.line_to(x0, y0);
        } else {
            self.move_to(x0, y0);
        }
        if sweep == 0.0 || radius == 0.0 || !sweep.is_finite() {
            return;
        }

        let sweep = sweep.clamp(-TAU, TAU);
        let segments = (sweep.abs() / FRAC_PI_2).ceil().clamp(1.0, 4.0);
        let step = sweep / segments;
        // Signed, so a negative sweep flips the handles.
        let handle = 4.0 / 3.0 * (step / 4.0).tan() * radius;

        let mut angle = start;
        let (mut px, mut py) = (x0, y0);
        for _ in 0..segments as usize {
            let next = angle + step;
            let (nx, ny) = point_at(next);
            let control1 = Point::new(px - angle.sin() * handle, py + angle.cos() * handle);
            let control2 = Point::new(nx + next.sin() * handle, ny - next.cos() * handle);
            self.cubic_to(control1, control2, Point::new(nx, ny));
            angle = next;
            (px, py) = (nx, ny);
        }
    }

    /// Axis-aligned ellipse centred on the origin.
    fn ellipse(&mut self, radius_x: f32, radius_y: f32) {
        let (rx, ry) = (radius_x.abs(), radius_y.abs());
        let (kx, ky) = (rx * KAPPA90, ry * KAPPA90);
        self.move_to(rx, 0.0);
        self.cubic_to(Point::new(rx, ky), Point::new(kx, ry), Point::new(0.0, ry));
        self.cubic_to(Point::new(-kx, ry), Point::new(-rx, ky), Point::new(-rx, 0.0));
        self.cubic_to(Point::new(-rx, -ky), Point::new(-kx, -ry), Point::new(0.0, -ry));
        self.cubic_to(Point::new(kx, -ry), Point::new(rx, -ky), Point::new(rx, 0.0));
        self.close();
    }

    /// Rect at the origin with per-corner radii clamped to half the shorter side.
    fn rounded_rect(&mut self, width: f32, height: f32, radii: CornerRadii) {
        let (x, y) = (width.min(0.0), height.min(0.0));
        let (w, h) = (width.abs(), height.abs());
        // NaN sides collapse to zero; `max`/`min` never panic on NaN.
        let max = (w.min(h) / 2.0).max(0.0);
        let clamp = |radius: f32| radius.max(0.0).min(max);
        let (ul, ur, lr, ll) = (
            clamp(radii.upper_left),
            clamp(radii.upper_right),
            clamp(radii.lower_right),
            clamp(radii.lower_left),
        );
        let inv = 1.0 - KAPPA90;

        self.move_to(x, y + ul);
        self.line_to(x, y + h - ll);
        self.cubic_to(
            Point::new(x, y + h - ll * inv),
            Point::new(x + ll * inv, y + h),
            Point::new(x + ll, y + h),
        );
        self.line_to(x + w - lr, y + h);
        self.cubic_to(
            Point::new(x + w - lr * inv, y + h),
            Point::new(x + w, y + h - lr * inv),
            Point::new(x + w, y + h - lr),
        );
        self.line_to(x + w, y + ur);
        self.cubic_to(
            Point::new(x + w, y + ur * inv),
            Point::new(x + w - ur * inv, y),
            Point::new(x + w - ur, y),
        );
        self.line_to(x + ul, y);
        self.cubic_to(
            Point::new(x + ul * inv, y),
            Point::new(x, y + ul * inv),
            Point::new(x, y + ul),
        );
        self.close();
    }
}

fn normalize(dx: f32, dy: f32) -> Option<(f32, f32)> {
    let len = dx.hypot(dy);
    (len > f32::EPSILON).then(|| (dx / len, dy / len))
}

/// Standalone path for a shape draw. `None` for degenerate geometry.
pub fn shape_path(shape: &Shape) -> Option<Path> {
    let mut path = ScenePath::new();
    path.add_shape(shape);
    path.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(shape: &Shape) -> (f32, f32, f32, f32) {
        let rect = shape_path(shape).unwrap().bounds();
        (rect.left(), rect.top(), rect.right(), rect.bottom())
    }

    fn close_to(actual: (f32, f32, f32, f32), expected: (f32, f32, f32, f32)) -> bool {
        let near = |lhs: f32, rhs: f32| (lhs - rhs).abs() < 0.01;
        near(actual.0, expected.0)
            && near(actual.1, expected.1)
            && near(actual.2, expected.2)
            && near(actual.3, expected.3)
    }

    #[test]
    fn rect_is_anchored_at_origin() {
        let got = bounds(&Shape::Rect {
            width: 10.0,
            height: 12.0,
        });
        assert!(close_to(got, (0.0, 0.0, 10.0, 12.0)), "{got:?}");
    }

    #[test]
    fn circle_is_centred_on_origin() {
        let got = bounds(&Shape::Circle { radius: 5.0 });
        assert!(close_to(got, (-5.0, -5.0, 5.0, 5.0)), "{got:?}");
    }

    #[test]
    fn rounded_rect_radius_is_clamped() {
        let got = bounds(&Shape::RoundedRect {
            width: 10.0,
            height: 4.0,
            radius: 50.0,
        });
        assert!(close_to(got, (0.0, 0.0, 10.0, 4.0)), "{got:?}");
    }

    #[test]
    fn quarter_arc_ends_on_positive_y_axis() {
        let mut path = ScenePath::new();
        path.add_shape(&Shape::Arc {
            radius: 10.0,
            radians: FRAC_PI_2,
        });
        let got = path.finish().unwrap().bounds();
        assert!((got.left() - 0.0).abs() < 0.01);
        assert!((got.right() - 10.0).abs() < 0.01);
        assert!((got.bottom() - 10.0).abs() < 0.01);
    }

    #[test]
    fn full_counter_clockwise_arc_covers_circle() {
        let mut path = ScenePath::new();
        path.arc(Point::new(20.0, 20.0), 8.0, 0.0, TAU, ArcDirection::CounterClockwise);
        let got = path.finish().unwrap().bounds();
        assert!((got.left() - 12.0).abs() < 0.01);
        assert!((got.top() - 12.0).abs() < 0.01);
        assert!((got.right() - 28.0).abs() < 0.01);
        assert!((got.bottom() - 28.0).abs() < 0.01);
    }

    #[test]
    fn arc_to_without_current_point_moves() {
        let mut path = ScenePath::new();
        path.arc_to(Point::new(5.0, 5.0), Point::new(10.0, 5.0), 2.0);
        assert!(!path.is_empty());
    }

    #[test]
    fn arc_to_rounds_a_corner() {
        let mut path = ScenePath::new();
        path.move_to(0.0, 0.0);
        path.arc_to(Point::new(10.0, 0.0), Point::new(10.0, 10.0), 4.0);
        path.line_to(10.0, 10.0);
        let got = path.finish().unwrap().bounds();
        assert!((got.right() - 10.0).abs() < 0.01, "{got:?}");
        assert!((got.bottom() - 10.0).abs() < 0.01, "{got:?}");
    }

    #[test]
    fn snapshot_keeps_builder_usable() {
        let mut path = ScenePath::new();
        path.add_shape(&Shape::Rect {
            width: 2.0,
            height: 2.0,
        });
        assert!(path.snapshot().is_some());
        path.add_shape(&Shape::Circle { radius: 1.0 });
        assert!(path.snapshot().is_some());
    }

    #[test]
    fn non_finite_dimensions_never_panic() {
        let origin = Point::new(0.0, 0.0);
        for value in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let corner = Point::new(value, value);
            let shapes = [
                Shape::Line { from: origin, to: corner },
                Shape::Triangle([origin, corner, corner]),
                Shape::Quad([origin, corner, corner, origin]),
                Shape::Rect { width: value, height: value },
                Shape::RoundedRect { width: value, height: value, radius: 2.0 },
                Shape::RoundedRect { width: 4.0, height: 4.0, radius: value },
                Shape::VarRoundedRect {
                    width: value,
                    height: value,
                    radii: CornerRadii::uniform(value),
                },
                Shape::Arc { radius: value, radians: 1.0 },
                Shape::Arc { radius: 4.0, radians: value },
                Shape::Sector { radius: value, radians: value },
                Shape::Circle { radius: value },
                Shape::Ellipse { radius_x: value, radius_y: 2.0 },
            ];
            for shape in &shapes {
                if let Some(path) = shape_path(shape) {
                    let rect = path.bounds();
                    assert!(rect.left().is_finite() && rect.bottom().is_finite(), "{shape:?}");
                }
            }
        }
    }

    #[test]
    fn arc_longer_than_a_turn_stays_on_the_circle() {
        let got = bounds(&Shape::Arc {
            radius: 10.0,
            radians: 3.0 * TAU,
        });
        assert!(close_to(got, (-10.0, -10.0, 10.0, 10.0)), "{got:?}");
    }

    #[test]
    fn empty_path_has_no_snapshot() {
        assert!(ScenePath::new().snapshot().is_none());
    }
}
