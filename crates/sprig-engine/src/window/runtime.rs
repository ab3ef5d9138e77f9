use std::sync::Arc;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, FrameCtx, WindowCtx};
use crate::device::{Extent2D, Gpu, GpuInit};
use crate::time::FrameClock;

/// Window configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub resizable: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "sprig".to_string(),
            initial_size: LogicalSize::new(800.0, 600.0),
            resizable: true,
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window and drives `app` until it exits or the window closes.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + App,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        if state.failed {
            anyhow::bail!("runtime stopped after a fatal error");
        }
        Ok(())
    }
}

struct WindowEntry {
    clock: FrameClock,
    gpu: Gpu<'static>,
    window: Arc<Window>,
}

struct AppState<A>
where
    A: App + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    entry: Option<WindowEntry>,
    exit_requested: bool,
    failed: bool,
}

fn extent_of(size: PhysicalSize<u32>) -> Extent2D {
    Extent2D::new(size.width, size.height)
}

impl<A> AppState<A>
where
    A: App + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            entry: None,
            exit_requested: false,
            failed: false,
        }
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size)
            .with_resizable(self.config.resizable);

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let size = extent_of(window.inner_size());
        let gpu = pollster::block_on(Gpu::new(window.clone(), size, self.gpu_init.clone()))
            .context("GPU initialization failed")?;

        let mut entry = WindowEntry {
            clock: FrameClock::default(),
            gpu,
            window,
        };

        let init = self.app.on_init(&mut entry.gpu);
        self.entry = Some(entry);
        init.context("application initialization failed")
    }

    /// Releases application GPU state and drops the window.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut entry) = self.entry.take() {
            log::info!("shutting down");
            self.app.on_shutdown(&mut entry.gpu);
        }
        self.exit_requested = true;
        event_loop.exit();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.failed = true;
        self.shutdown(event_loop);
    }

    fn handle_resize(&mut self, size: PhysicalSize<u32>) -> AppControl {
        let Some(entry) = self.entry.as_mut() else {
            return AppControl::Continue;
        };

        let extent = extent_of(size);
        entry.gpu.resize(extent);
        entry.window.request_redraw();

        if extent.width == 0 || extent.height == 0 {
            return AppControl::Continue;
        }

        log::debug!("surface resized to {}x{}", extent.width, extent.height);
        self.app.on_resized(&mut entry.gpu, extent)
    }

    fn redraw(&mut self) -> AppControl {
        let Some(entry) = self.entry.as_mut() else {
            return AppControl::Continue;
        };

        // Minimized: nothing to present to.
        let size = entry.gpu.size();
        if size.width == 0 || size.height == 0 {
            entry.clock.reset();
            return AppControl::Continue;
        }

        let mut ctx = FrameCtx {
            window: WindowCtx {
                window: &entry.window,
            },
            gpu: &mut entry.gpu,
            time: entry.clock.tick(),
        };

        self.app.on_frame(&mut ctx)
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.exit_requested {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            self.fail(event_loop, e);
            return;
        }

        if let Some(entry) = &self.entry {
            entry.window.request_redraw();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw.
        if let Some(entry) = &self.entry {
            entry.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        if self.app.on_window_event(&event) == AppControl::Exit {
            self.shutdown(event_loop);
            return;
        }

        let control = match event {
            WindowEvent::CloseRequested => AppControl::Exit,

            WindowEvent::Resized(new_size) => self.handle_resize(new_size),

            WindowEvent::ScaleFactorChanged { .. } => {
                match self.entry.as_ref().map(|e| e.window.inner_size()) {
                    Some(new_size) => self.handle_resize(new_size),
                    None => AppControl::Continue,
                }
            }

            WindowEvent::RedrawRequested => self.redraw(),

            _ => AppControl::Continue,
        };

        if control == AppControl::Exit {
            self.shutdown(event_loop);
        }
    }

    fn exiting(&mut self, event_loop: &ActiveEventLoop) {
        // Event loop torn down by the platform without a close request.
        if self.entry.is_some() {
            self.shutdown(event_loop);
        }
    }
}
