use winit::window::Window;

use crate::device::{Extent2D, Gpu};
use crate::time::FrameTime;
use crate::RenderError;

use super::app::AppControl;

/// Window handle and metadata for the current frame.
pub struct WindowCtx<'a> {
    pub window: &'a Window,
}

impl WindowCtx<'_> {
    /// Returns the logical window size as `(width, height)`.
    pub fn logical_size(&self) -> (f32, f32) {
        let phys = self.window.inner_size();
        let logi: winit::dpi::LogicalSize<f64> = phys.to_logical(self.window.scale_factor());
        (logi.width as f32, logi.height as f32)
    }

    pub fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }
}

/// Per-frame context passed to [`super::App::on_frame`].
pub struct FrameCtx<'a> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'static>,
    pub time: FrameTime,
}

impl FrameCtx<'_> {
    /// Current framebuffer extent in physical pixels.
    pub fn extent(&self) -> Extent2D {
        self.gpu.size()
    }

    /// Runs `draw` against the GPU and maps its outcome to a loop directive.
    ///
    /// Frame-local failures (lost or outdated surface, timeouts) skip the
    /// frame; anything else ends the loop.
    pub fn render<F>(&mut self, draw: F) -> AppControl
    where
        F: FnOnce(&mut Gpu<'static>) -> Result<(), RenderError>,
    {
        self.window.window.pre_present_notify();

        match draw(&mut *self.gpu) {
            Ok(()) => AppControl::Continue,
            Err(e) if e.is_transient() => {
                log::debug!("frame {} skipped: {e}", self.time.frame_index);
                AppControl::Continue
            }
            Err(e) => {
                log::error!("rendering failed: {e}");
                AppControl::Exit
            }
        }
    }
}
