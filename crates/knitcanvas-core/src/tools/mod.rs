//! Tool lifecycle: the plugin contract and the host that drives it.

pub mod keyboard_zoom;

use crate::input::KeyInput;
use crate::project::Knitpaint;
use crate::transform::{DegenerateTransform, EmptyExtent, ViewTransform};
use crate::viewport::Viewport;
use kurbo::Size;
use log::debug;

/// The tool plugin contract.
///
/// A tool's lifecycle is strictly `load` → (notifications) → `unload`, with
/// exactly one call to each per activation. The host owns the viewport and
/// all event routing; a tool only reaches back through the [`ToolCtx`]
/// passed into its callbacks.
pub trait Tool {
    fn name(&self) -> &'static str;

    /// Called once when the tool becomes active.
    fn load(&mut self, ctx: &mut ToolCtx<'_>);

    /// Called once on deactivation or replacement. Must leave the tool with
    /// no pending side effects; any in-flight animation state is dropped.
    fn unload(&mut self) {}

    /// Pushed whenever the viewport transform changes, including changes
    /// this tool caused itself.
    fn transform_available(&mut self, _transform: ViewTransform) {}

    /// Pushed when the active pattern is replaced. Any interest the tool
    /// held in the previous pattern is superseded by this call.
    fn content_available(&mut self, _knitpaint: &Knitpaint) {}

    /// Key events, delivered only while loaded.
    fn key_input(&mut self, _event: &KeyInput, _ctx: &mut ToolCtx<'_>) {}

    /// Animation frame requested via [`ToolCtx::request_frame`], with the
    /// host's monotonic timestamp in milliseconds.
    fn frame(&mut self, _now_ms: f64, _ctx: &mut ToolCtx<'_>) {}
}

/// Host capability for scheduling per-frame callbacks.
///
/// The host calls [`request_frame`](FrameScheduler::request_frame) at most
/// once per outstanding frame; the embedder answers each request with one
/// [`CanvasHost::on_frame`] call carrying a monotonic timestamp. Injected so
/// tests can drive deterministic ticks instead of real time.
pub trait FrameScheduler {
    fn request_frame(&mut self);
}

/// Side effects queued by a tool during one callback.
#[derive(Default)]
struct Effects {
    renders: u32,
    frame: bool,
    transforms: Vec<ViewTransform>,
}

/// Capability handle a tool receives in its callbacks.
///
/// Wraps the viewport plus an effect queue: `set_transform` updates the
/// viewport synchronously, while the render request, frame request, and
/// `transform_available` notifications are drained by the host after the
/// tool callback returns. A render request therefore always observes the
/// just-set transform, and a tool can never re-enter itself.
pub struct ToolCtx<'a> {
    viewport: &'a mut Viewport,
    effects: &'a mut Effects,
}

impl ToolCtx<'_> {
    pub fn canvas_size(&self) -> Option<Size> {
        self.viewport.canvas_size()
    }

    pub fn content_size(&self) -> Option<Size> {
        self.viewport.content_size()
    }

    pub fn transform(&self) -> ViewTransform {
        self.viewport.transform()
    }

    /// Push a new transform to the viewport.
    ///
    /// On success, schedules exactly one render request and one
    /// `transform_available` notification. Degenerate transforms are
    /// rejected and the viewport keeps its prior value.
    pub fn set_transform(&mut self, t: ViewTransform) -> Result<(), DegenerateTransform> {
        self.viewport.set_transform(t)?;
        self.effects.renders += 1;
        self.effects.transforms.push(t);
        Ok(())
    }

    /// Ask the host for a re-render without changing the transform.
    pub fn request_render(&mut self) {
        self.effects.renders += 1;
    }

    /// Ask the host for one animation-frame callback.
    pub fn request_frame(&mut self) {
        self.effects.frame = true;
    }
}

/// Tool lifecycle manager for one canvas surface.
///
/// Owns the [`Viewport`], the single active tool slot, the render-request
/// callback, and the injected [`FrameScheduler`]. All state mutation is
/// single-threaded and callback-driven; "concurrency" here is ordering and
/// cancellation of those callbacks, which the host serializes.
pub struct CanvasHost {
    viewport: Viewport,
    tool: Option<Box<dyn Tool>>,
    content: Option<Knitpaint>,
    render_request: Box<dyn FnMut()>,
    frames: Box<dyn FrameScheduler>,
    frame_pending: bool,
}

impl CanvasHost {
    pub fn new(
        render_request: impl FnMut() + 'static,
        frames: impl FrameScheduler + 'static,
    ) -> Self {
        Self {
            viewport: Viewport::new(),
            tool: None,
            content: None,
            render_request: Box::new(render_request),
            frames: Box::new(frames),
            frame_pending: false,
        }
    }

    pub fn transform(&self) -> ViewTransform {
        self.viewport.transform()
    }

    pub fn content(&self) -> Option<&Knitpaint> {
        self.content.as_ref()
    }

    pub fn is_tool_loaded(&self) -> bool {
        self.tool.is_some()
    }

    /// Activate a tool, replacing any currently loaded one.
    ///
    /// The outgoing tool is unloaded first; the incoming tool is then loaded
    /// and immediately receives the current transform and, if known, the
    /// current content.
    pub fn load_tool(&mut self, mut tool: Box<dyn Tool>) {
        self.unload_tool();

        let mut effects = Effects::default();
        {
            let mut ctx = ToolCtx {
                viewport: &mut self.viewport,
                effects: &mut effects,
            };
            tool.load(&mut ctx);
        }
        for t in effects.transforms.drain(..) {
            tool.transform_available(t);
        }
        tool.transform_available(self.viewport.transform());
        if let Some(knitpaint) = &self.content {
            tool.content_available(knitpaint);
        }
        debug!("tool loaded: {}", tool.name());
        self.tool = Some(tool);
        self.finish_effects(effects);
    }

    /// Deactivate the current tool, if any.
    ///
    /// Clears the pending frame request so no late-arriving frame callback
    /// can mutate state on behalf of the unloaded tool.
    pub fn unload_tool(&mut self) {
        if let Some(mut tool) = self.tool.take() {
            tool.unload();
            debug!("tool unloaded: {}", tool.name());
        }
        self.frame_pending = false;
    }

    /// Replace the active pattern.
    ///
    /// Always a whole-object replacement: the viewport's cached content size
    /// is updated and the loaded tool is notified so it can drop any
    /// interest in the previous pattern.
    pub fn set_content(&mut self, knitpaint: Knitpaint) {
        self.viewport.content_size_changed(Size::new(
            knitpaint.width() as f64,
            knitpaint.height() as f64,
        ));
        if let Some(tool) = &mut self.tool {
            tool.content_available(&knitpaint);
        }
        self.content = Some(knitpaint);
    }

    pub fn canvas_resized(&mut self, size: Size) {
        self.viewport.canvas_resized(size);
    }

    /// Explicit user "reset view" action: fit the content to the canvas and
    /// apply immediately, without animation. The only transform mutation
    /// path besides the loaded tool.
    pub fn reset_view(&mut self) -> Result<(), EmptyExtent> {
        let t = self.viewport.reset_transform()?;
        self.apply_transform(t);
        Ok(())
    }

    /// Route a key event to the loaded tool. Dropped when no tool is
    /// loaded; delivery is bound to the Loaded state.
    pub fn key_input(&mut self, event: &KeyInput) {
        self.with_tool(|tool, ctx| tool.key_input(event, ctx));
    }

    /// Deliver one animation-frame callback.
    ///
    /// A callback arriving with no outstanding request (for example after
    /// the requesting tool was unloaded) is a silent no-op.
    pub fn on_frame(&mut self, now_ms: f64) {
        if !self.frame_pending {
            debug!("dropping stale frame callback at {now_ms}ms");
            return;
        }
        self.frame_pending = false;
        self.with_tool(|tool, ctx| tool.frame(now_ms, ctx));
    }

    /// Run one tool callback and drain its queued effects.
    fn with_tool(&mut self, call: impl FnOnce(&mut dyn Tool, &mut ToolCtx<'_>)) {
        let Some(mut tool) = self.tool.take() else {
            return;
        };
        let mut effects = Effects::default();
        {
            let mut ctx = ToolCtx {
                viewport: &mut self.viewport,
                effects: &mut effects,
            };
            call(tool.as_mut(), &mut ctx);
        }
        for t in effects.transforms.drain(..) {
            tool.transform_available(t);
        }
        self.tool = Some(tool);
        self.finish_effects(effects);
    }

    fn finish_effects(&mut self, effects: Effects) {
        for _ in 0..effects.renders {
            (self.render_request)();
        }
        if effects.frame && !self.frame_pending {
            self.frame_pending = true;
            self.frames.request_frame();
        }
    }

    /// Apply a host-initiated transform known to be well-formed.
    fn apply_transform(&mut self, t: ViewTransform) {
        if self.viewport.set_transform(t).is_err() {
            return;
        }
        (self.render_request)();
        if let Some(tool) = &mut self.tool {
            tool.transform_available(t);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct CountingFrames(Rc<Cell<usize>>);

    impl FrameScheduler for CountingFrames {
        fn request_frame(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Loaded,
        Unloaded,
        Transform,
        Content(usize, usize),
    }

    /// Records lifecycle calls, and can queue a transform on load.
    struct ProbeTool {
        events: Rc<RefCell<Vec<Event>>>,
        set_on_load: Option<ViewTransform>,
    }

    impl Tool for ProbeTool {
        fn name(&self) -> &'static str {
            "probe"
        }

        fn load(&mut self, ctx: &mut ToolCtx<'_>) {
            self.events.borrow_mut().push(Event::Loaded);
            if let Some(t) = self.set_on_load.take() {
                ctx.set_transform(t).unwrap();
            }
        }

        fn unload(&mut self) {
            self.events.borrow_mut().push(Event::Unloaded);
        }

        fn transform_available(&mut self, _transform: ViewTransform) {
            self.events.borrow_mut().push(Event::Transform);
        }

        fn content_available(&mut self, knitpaint: &Knitpaint) {
            self.events
                .borrow_mut()
                .push(Event::Content(knitpaint.width(), knitpaint.height()));
        }
    }

    fn host_with_events() -> (CanvasHost, Rc<Cell<usize>>, Rc<RefCell<Vec<Event>>>) {
        let renders = Rc::new(Cell::new(0));
        let renders_cb = Rc::clone(&renders);
        let host = CanvasHost::new(
            move || renders_cb.set(renders_cb.get() + 1),
            CountingFrames::default(),
        );
        (host, renders, Rc::new(RefCell::new(Vec::new())))
    }

    #[test]
    fn test_load_pushes_current_transform_and_content() {
        let (mut host, _renders, events) = host_with_events();
        host.set_content(Knitpaint::zeroed(20, 10));
        host.load_tool(Box::new(ProbeTool {
            events: Rc::clone(&events),
            set_on_load: None,
        }));

        assert_eq!(
            *events.borrow(),
            vec![Event::Loaded, Event::Transform, Event::Content(20, 10)]
        );
    }

    #[test]
    fn test_replacing_tool_unloads_previous_first() {
        let (mut host, _renders, events) = host_with_events();
        host.load_tool(Box::new(ProbeTool {
            events: Rc::clone(&events),
            set_on_load: None,
        }));
        host.load_tool(Box::new(ProbeTool {
            events: Rc::clone(&events),
            set_on_load: None,
        }));

        assert_eq!(
            *events.borrow(),
            vec![
                Event::Loaded,
                Event::Transform,
                Event::Unloaded,
                Event::Loaded,
                Event::Transform,
            ]
        );
    }

    #[test]
    fn test_one_render_request_per_set_transform() {
        let (mut host, renders, events) = host_with_events();
        host.load_tool(Box::new(ProbeTool {
            events,
            set_on_load: Some(ViewTransform::IDENTITY.scale(2.0)),
        }));

        assert_eq!(renders.get(), 1);
        assert_eq!(host.transform(), ViewTransform::IDENTITY.scale(2.0));
    }

    #[test]
    fn test_content_replacement_notifies_tool() {
        let (mut host, _renders, events) = host_with_events();
        host.load_tool(Box::new(ProbeTool {
            events: Rc::clone(&events),
            set_on_load: None,
        }));
        host.set_content(Knitpaint::zeroed(5, 5));
        host.set_content(Knitpaint::zeroed(9, 3));

        let recorded = events.borrow();
        assert_eq!(recorded[recorded.len() - 2], Event::Content(5, 5));
        assert_eq!(recorded[recorded.len() - 1], Event::Content(9, 3));
    }

    #[test]
    fn test_stale_frame_callback_is_a_no_op() {
        let (mut host, renders, _events) = host_with_events();
        let before = host.transform();
        host.on_frame(16.0);
        assert_eq!(host.transform(), before);
        assert_eq!(renders.get(), 0);
    }

    #[test]
    fn test_reset_view_fits_and_renders() {
        let (mut host, renders, _events) = host_with_events();
        assert!(host.reset_view().is_err());

        host.canvas_resized(Size::new(800.0, 600.0));
        host.set_content(Knitpaint::zeroed(100, 100));
        host.reset_view().unwrap();

        assert_eq!(renders.get(), 1);
        let t = host.transform();
        let center = t.map_point(kurbo::Point::new(50.0, 50.0));
        assert!((center.x - 400.0).abs() < 1e-9);
        assert!((center.y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_key_events_dropped_without_tool() {
        let (mut host, renders, _events) = host_with_events();
        host.key_input(&KeyInput::new("+", crate::input::Modifiers::default()));
        assert_eq!(renders.get(), 0);
    }
}
