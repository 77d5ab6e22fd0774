use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use fieldview_engine::canvas::{
    Canvas, CanvasConfig, OffscreenCanvas, SurfaceCanvas, SurfaceErrorAction,
};
use fieldview_engine::device::{Gpu, GpuInit};
use fieldview_engine::render::{FrameOrchestrator, ShaderProgram};

use crate::demo::Demo;

/// Which render path the viewer drives each frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Mode {
    FieldData,
    Direct,
}

impl Mode {
    fn toggled(self) -> Self {
        match self {
            Mode::FieldData => Mode::Direct,
            Mode::Direct => Mode::FieldData,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub title: String,
    pub mode: Mode,
    pub gpu_init: GpuInit,
    pub canvas: CanvasConfig,
    /// Directory capture PNGs are written to.
    pub capture_dir: PathBuf,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "fieldview".to_string(),
            mode: Mode::FieldData,
            gpu_init: GpuInit::default(),
            canvas: CanvasConfig::default(),
            capture_dir: PathBuf::from("."),
        }
    }
}

/// GPU state bound to one window.
struct Viewer<'w> {
    orchestrator: FrameOrchestrator<SurfaceCanvas<'w>>,
    // Same sources rendered off screen for captures.
    offscreen: FrameOrchestrator<OffscreenCanvas>,
    // Holds the adapter and instance the surface was created from.
    _gpu: Gpu,
}

impl<'w> Viewer<'w> {
    fn new(window: &'w Window, config: &ViewerConfig, demo: &Demo) -> Result<Self> {
        let (gpu, canvas) = pollster::block_on(SurfaceCanvas::for_window(
            window,
            config.gpu_init.clone(),
            config.canvas.clone(),
        ))?;
        let shader = ShaderProgram::builtin(gpu.device());
        let orchestrator = FrameOrchestrator::new(&gpu, canvas, &shader, demo.sources()?)?;

        let target = OffscreenCanvas::new(&gpu, config.canvas.size)?;
        let offscreen = FrameOrchestrator::new(&gpu, target, &shader, demo.sources()?)?;

        Ok(Self {
            orchestrator,
            offscreen,
            _gpu: gpu,
        })
    }

    fn render(&mut self, mode: Mode) -> Result<()> {
        render_mode(&mut self.orchestrator, mode)
    }

    /// Renders the current contents off screen and writes them to `path`.
    fn capture(&mut self, mode: Mode, path: &Path) -> Result<()> {
        render_mode(&mut self.offscreen, mode)?;
        self.offscreen.canvas().read_pixels()?.save_png(path)
    }
}

fn render_mode<C: Canvas>(orchestrator: &mut FrameOrchestrator<C>, mode: Mode) -> Result<()> {
    match mode {
        Mode::FieldData => orchestrator.render_field_data(),
        Mode::Direct => orchestrator.render_direct(),
    }
}

#[self_referencing]
struct ViewerWindow {
    window: Window,

    #[borrows(window)]
    #[covariant]
    viewer: Viewer<'this>,
}

pub fn run(config: ViewerConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    let demo = Demo::new(config.canvas.size);
    let mut state = ViewerState {
        mode: config.mode,
        config,
        demo,
        window: None,
        paused: false,
        captures: 0,
        error: None,
    };

    event_loop
        .run_app(&mut state)
        .context("winit event loop terminated with error")?;

    match state.error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct ViewerState {
    config: ViewerConfig,
    demo: Demo,
    window: Option<ViewerWindow>,
    mode: Mode,
    paused: bool,
    captures: u32,
    error: Option<anyhow::Error>,
}

impl ViewerState {
    fn create_window(&self, event_loop: &ActiveEventLoop) -> Result<ViewerWindow> {
        let size = self.config.canvas.size;
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(size.width, size.height))
            .with_resizable(false);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        ViewerWindowTryBuilder {
            window,
            viewer_builder: |w| Viewer::new(w, &self.config, &self.demo),
        }
        .try_build()
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error = Some(err);
        event_loop.exit();
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        match event.physical_key {
            PhysicalKey::Code(KeyCode::KeyD) => {
                self.mode = self.mode.toggled();
                log::info!("render mode: {:?}", self.mode);
            }
            PhysicalKey::Code(KeyCode::Space) => {
                self.paused = !self.paused;
                log::info!("animation {}", if self.paused { "paused" } else { "resumed" });
            }
            PhysicalKey::Code(KeyCode::KeyC) => self.capture(),
            PhysicalKey::Code(KeyCode::Escape) => event_loop.exit(),
            _ => {}
        }
    }

    fn capture(&mut self) {
        let Some(window) = self.window.as_mut() else {
            return;
        };

        let path = self
            .config
            .capture_dir
            .join(format!("fieldview-capture-{:03}.png", self.captures));
        self.captures += 1;

        let mode = self.mode;
        match window.with_viewer_mut(|viewer| viewer.capture(mode, &path)) {
            Ok(()) => log::info!("captured {:?} frame to {}", mode, path.display()),
            Err(err) => log::error!("capture failed: {err:#}"),
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = self.window.as_mut() else {
            return;
        };

        if !self.paused {
            self.demo.advance();
        }

        let mode = self.mode;
        let Err(err) = window.with_viewer_mut(|viewer| viewer.render(mode)) else {
            return;
        };

        let action = err
            .downcast_ref::<wgpu::SurfaceError>()
            .map(SurfaceErrorAction::for_error);
        match action {
            Some(SurfaceErrorAction::Fatal) | None => self.fail(event_loop, err),
            Some(action) => log::debug!("frame skipped ({action:?}): {err:#}"),
        }
    }
}

impl ApplicationHandler for ViewerState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        match self.create_window(event_loop) {
            Ok(window) => {
                log::info!(
                    "viewer ready: {} field lines, {:?} mode",
                    self.demo.line_count(),
                    self.mode
                );
                window.with_window(|w| w.request_redraw());
                self.window = Some(window);
            }
            Err(err) => self.fail(event_loop, err.context("failed to create viewer window")),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw; the surface's FIFO present mode paces frames.
        if let Some(window) = &self.window {
            window.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.window = None;
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => self.on_key(event_loop, &event),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_toggles_back_and_forth() {
        assert_eq!(Mode::FieldData.toggled(), Mode::Direct);
        assert_eq!(Mode::Direct.toggled(), Mode::FieldData);
    }
}
