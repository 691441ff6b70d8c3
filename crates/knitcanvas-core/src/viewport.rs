//! Viewport state: the current view transform for one canvas surface.

use crate::transform::{DegenerateTransform, EmptyExtent, ViewTransform};
use kurbo::Size;
use log::warn;

/// Owner of the canvas's current view transform.
///
/// Holds the transform plus the last known canvas and content sizes. Size
/// updates never change the transform on their own; a reset is an explicit
/// user action computed via [`Viewport::reset_transform`].
#[derive(Debug, Clone, Default)]
pub struct Viewport {
    transform: ViewTransform,
    canvas_size: Option<Size>,
    content_size: Option<Size>,
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    /// Replace the current transform.
    ///
    /// Degenerate transforms are rejected and the prior transform is kept.
    /// The caller is responsible for the follow-up render request and tool
    /// notification; this only updates the stored value.
    pub fn set_transform(&mut self, t: ViewTransform) -> Result<(), DegenerateTransform> {
        if !t.is_invertible() {
            warn!("rejecting degenerate view transform: {t:?}");
            return Err(DegenerateTransform);
        }
        self.transform = t;
        Ok(())
    }

    pub fn canvas_resized(&mut self, size: Size) {
        self.canvas_size = Some(size);
    }

    pub fn content_size_changed(&mut self, size: Size) {
        self.content_size = Some(size);
    }

    pub fn canvas_size(&self) -> Option<Size> {
        self.canvas_size
    }

    pub fn content_size(&self) -> Option<Size> {
        self.content_size
    }

    /// Compute the transform that fits the content into the canvas, from the
    /// last known sizes. Errors if either size is still unknown.
    pub fn reset_transform(&self) -> Result<ViewTransform, EmptyExtent> {
        let canvas = self.canvas_size.ok_or(EmptyExtent)?;
        let content = self.content_size.ok_or(EmptyExtent)?;
        ViewTransform::fit(canvas, content)
    }
}
