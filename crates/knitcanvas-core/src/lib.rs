//! Knitcanvas Core Library
//!
//! Platform-agnostic document model and viewport-transform machinery for the
//! knitcanvas knitting-pattern editor: the immutable project/pattern value
//! types, the affine view transform, the zoom animation state machine, and
//! the tool lifecycle host that wires them together. Rendering of pattern
//! pixels, UI chrome, and persistence backends live outside this crate.

pub mod animation;
pub mod input;
pub mod project;
pub mod tools;
pub mod transform;
pub mod viewport;

pub use animation::{AnimationFrame, ZOOM_ANIMATION_MS, ZoomAnimation};
pub use input::{KeyInput, Modifiers};
pub use project::{InvalidDocument, Knitpaint, Project, ProjectStage};
pub use tools::keyboard_zoom::KeyboardZoomTool;
pub use tools::{CanvasHost, FrameScheduler, Tool, ToolCtx};
pub use transform::{DegenerateTransform, EmptyExtent, ViewTransform};
pub use viewport::Viewport;
