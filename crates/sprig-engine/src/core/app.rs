use winit::event::WindowEvent;

use crate::device::{Extent2D, Gpu};

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by [`crate::window::Runtime`].
///
/// Every GPU object the app creates must be released in `on_shutdown`, while
/// the device is still alive.
pub trait App {
    /// Called once after the window and GPU context exist.
    fn on_init(&mut self, gpu: &mut Gpu<'static>) -> anyhow::Result<()>;

    /// Called for every window event before the runtime handles it.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called after the surface was reconfigured to `extent`.
    ///
    /// Pipelines baked for the old extent should be invalidated and rebuilt here.
    fn on_resized(&mut self, gpu: &mut Gpu<'static>, extent: Extent2D) -> AppControl {
        let _ = (gpu, extent);
        AppControl::Continue
    }

    /// Called once per redraw.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl;

    /// Called once before the GPU context is dropped.
    fn on_shutdown(&mut self, gpu: &mut Gpu<'static>);
}
