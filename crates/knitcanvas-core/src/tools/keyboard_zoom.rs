//! Keyboard-driven zoom tool: Cmd/Ctrl `+`, `-` and `0`.

use crate::animation::ZoomAnimation;
use crate::input::KeyInput;
use crate::project::Knitpaint;
use crate::tools::{Tool, ToolCtx};
use crate::transform::ViewTransform;
use kurbo::{Point, Size};
use log::warn;

pub const ZOOM_IN_FACTOR: f64 = 2.0;
pub const ZOOM_OUT_FACTOR: f64 = 0.5;

/// Zooms the view around the canvas center with a short animation.
///
/// `Cmd/Ctrl +` zooms in, `Cmd/Ctrl -` zooms out, `Cmd/Ctrl 0` resets the
/// view to fit the content, immediately and without animation. At most one
/// zoom animation is in flight at a time; a conflicting request
/// force-completes the previous one before starting.
#[derive(Debug, Default)]
pub struct KeyboardZoomTool {
    transform: ViewTransform,
    content_size: Option<Size>,
    animation: Option<ZoomAnimation>,
}

impl KeyboardZoomTool {
    pub fn new() -> Self {
        Self::default()
    }

    fn scale_around_center(&mut self, factor: f64, ctx: &mut ToolCtx<'_>) {
        let Some(canvas) = ctx.canvas_size() else {
            warn!("zoom ignored: canvas size unknown");
            return;
        };

        // Snap any in-flight animation to its own target first, so
        // overlapping zooms compose from a consistent state instead of a
        // mid-animation one.
        let mut base = self.transform;
        if let Some(previous) = self.animation.take() {
            base = previous.completed();
            if ctx.set_transform(base).is_err() {
                return;
            }
        }

        let anchor = Point::new(canvas.width / 2.0, canvas.height / 2.0);
        match ZoomAnimation::begin(base, factor, anchor) {
            Ok(animation) => {
                self.animation = Some(animation);
                ctx.request_frame();
            }
            Err(err) => warn!("zoom ignored: {err}"),
        }
    }

    fn reset(&mut self, ctx: &mut ToolCtx<'_>) {
        self.animation = None;
        let Some(canvas) = ctx.canvas_size() else {
            warn!("reset ignored: canvas size unknown");
            return;
        };
        let Some(content) = self.content_size else {
            warn!("reset ignored: content size unknown");
            return;
        };
        match ViewTransform::fit(canvas, content) {
            Ok(t) => {
                if ctx.set_transform(t).is_err() {
                    warn!("reset produced a degenerate transform");
                }
            }
            Err(err) => warn!("reset ignored: {err}"),
        }
    }
}

impl Tool for KeyboardZoomTool {
    fn name(&self) -> &'static str {
        "Keyboard Zoom Tool"
    }

    fn load(&mut self, ctx: &mut ToolCtx<'_>) {
        self.transform = ctx.transform();
    }

    fn unload(&mut self) {
        // Terminal: the host also drops the pending frame request, so no
        // late frame callback reaches this tool again.
        self.animation = None;
    }

    fn transform_available(&mut self, transform: ViewTransform) {
        self.transform = transform;
    }

    fn content_available(&mut self, knitpaint: &Knitpaint) {
        self.content_size = Some(Size::new(
            knitpaint.width() as f64,
            knitpaint.height() as f64,
        ));
    }

    fn key_input(&mut self, event: &KeyInput, ctx: &mut ToolCtx<'_>) {
        if !event.modifiers.command() {
            return;
        }
        match event.key.as_str() {
            "+" | "=" => self.scale_around_center(ZOOM_IN_FACTOR, ctx),
            "-" => self.scale_around_center(ZOOM_OUT_FACTOR, ctx),
            "0" => self.reset(ctx),
            _ => {}
        }
    }

    fn frame(&mut self, now_ms: f64, ctx: &mut ToolCtx<'_>) {
        let Some(animation) = self.animation.as_mut() else {
            return;
        };
        let frame = animation.tick(now_ms);
        if ctx.set_transform(frame.transform).is_err() {
            self.animation = None;
            return;
        }
        if frame.done {
            self.animation = None;
        } else {
            ctx.request_frame();
        }
    }
}
