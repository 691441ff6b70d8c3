//! Time-based zoom animation toward a target scale around a fixed anchor.

use crate::transform::{DegenerateTransform, ViewTransform};
use kurbo::Point;

/// Zoom animation duration in milliseconds.
pub const ZOOM_ANIMATION_MS: f64 = 150.0;

/// One evaluated animation step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationFrame {
    /// Transform to apply for this frame.
    pub transform: ViewTransform,
    /// Whether the animation reached its target; a done frame carries
    /// exactly the target scale and no further frame should be scheduled.
    pub done: bool,
}

/// State of an in-flight zoom animation.
///
/// Held as `Option<ZoomAnimation>` by the owning tool: `None` is idle,
/// `Some` is animating, and completion or interruption is a terminal
/// transition back to `None`. Timestamps are the host's monotonic per-frame
/// callback times in milliseconds.
#[derive(Debug, Clone)]
pub struct ZoomAnimation {
    start: Option<f64>,
    original: ViewTransform,
    dst_scale: f64,
    dst_center: Point,
}

impl ZoomAnimation {
    /// Start a zoom toward `dst_scale` around a canvas-space anchor point.
    ///
    /// The anchor is mapped into content coordinates through the inverse of
    /// the starting transform, so it stays visually pinned under the canvas
    /// no matter how the scale progresses.
    pub fn begin(
        original: ViewTransform,
        dst_scale: f64,
        anchor: Point,
    ) -> Result<Self, DegenerateTransform> {
        let dst_center = original.invert()?.map_point(anchor);
        Ok(Self {
            start: None,
            original,
            dst_scale,
            dst_center,
        })
    }

    /// Evaluate the animation at the given timestamp.
    ///
    /// The first tick latches the start time. The scale follows
    /// `dst_scale^progress`, clamped so it approaches the target
    /// monotonically and never overshoots in either zoom direction.
    pub fn tick(&mut self, now_ms: f64) -> AnimationFrame {
        let start = *self.start.get_or_insert(now_ms);
        let elapsed = now_ms - start;
        let progress = elapsed / ZOOM_ANIMATION_MS;
        let mut next_scale = self.dst_scale.powf(progress);
        next_scale = if self.dst_scale > 1.0 {
            next_scale.min(self.dst_scale)
        } else {
            next_scale.max(self.dst_scale)
        };
        AnimationFrame {
            transform: self.original.scale_about(next_scale, self.dst_center),
            done: elapsed >= ZOOM_ANIMATION_MS,
        }
    }

    /// The transform this animation is heading for.
    ///
    /// Used to force-complete when a conflicting request interrupts the
    /// animation mid-flight: interruption always snaps forward to the
    /// pending target, never back to the start.
    pub fn completed(&self) -> ViewTransform {
        self.original.scale_about(self.dst_scale, self.dst_center)
    }

    pub fn target_scale(&self) -> f64 {
        self.dst_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANCHOR: Point = Point::new(400.0, 300.0);

    #[test]
    fn test_zoom_in_never_overshoots() {
        let mut anim = ZoomAnimation::begin(ViewTransform::IDENTITY, 2.0, ANCHOR).unwrap();
        let mut last_scale = 0.0;
        for t in [0.0, 50.0, 100.0, 150.0, 200.0] {
            let frame = anim.tick(t);
            let scale = frame.transform.a;
            assert!(scale >= last_scale, "scale must grow monotonically");
            assert!(scale <= 2.0 + 1e-12, "scale must not overshoot the target");
            last_scale = scale;
        }
        assert!((last_scale - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_zoom_out_clamps_from_below() {
        let mut anim = ZoomAnimation::begin(ViewTransform::IDENTITY, 0.5, ANCHOR).unwrap();
        anim.tick(0.0);
        let frame = anim.tick(400.0);
        assert!(frame.done);
        assert!((frame.transform.a - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_done_exactly_at_duration() {
        let mut anim = ZoomAnimation::begin(ViewTransform::IDENTITY, 2.0, ANCHOR).unwrap();
        assert!(!anim.tick(1000.0).done);
        assert!(!anim.tick(1000.0 + ZOOM_ANIMATION_MS / 2.0).done);
        let last = anim.tick(1000.0 + ZOOM_ANIMATION_MS);
        assert!(last.done);
        assert!((last.transform.a - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_anchor_stays_fixed_throughout() {
        let original = ViewTransform::IDENTITY
            .translate(kurbo::Vec2::new(30.0, -10.0))
            .scale(1.5);
        let mut anim = ZoomAnimation::begin(original, 2.0, ANCHOR).unwrap();
        let before = original.invert().unwrap().map_point(ANCHOR);
        for t in [0.0, 40.0, 80.0, 150.0] {
            let frame = anim.tick(t);
            let after = frame.transform.invert().unwrap().map_point(ANCHOR);
            assert!((after.x - before.x).abs() < 1e-9);
            assert!((after.y - before.y).abs() < 1e-9);
        }
    }

    #[test]
    fn test_completed_matches_final_tick() {
        let mut anim = ZoomAnimation::begin(ViewTransform::IDENTITY, 2.0, ANCHOR).unwrap();
        let completed = anim.completed();
        anim.tick(0.0);
        let last = anim.tick(ZOOM_ANIMATION_MS);
        assert_eq!(last.transform, completed);
    }

    #[test]
    fn test_begin_fails_on_degenerate_start() {
        let degenerate = ViewTransform::IDENTITY.scale(0.0);
        assert!(ZoomAnimation::begin(degenerate, 2.0, ANCHOR).is_err());
    }
}
