use anyhow::{Context, Result};
use winit::window::Window;

use crate::device::{Gpu, GpuInit};

use super::{Canvas, CanvasFrame, CanvasSize, extra_view_formats, linear_view_format};

/// Surface configuration for a [`SurfaceCanvas`].
#[derive(Debug, Clone)]
pub struct CanvasConfig {
    /// Fixed canvas resolution. Not resizable after construction.
    pub size: CanvasSize,

    /// Present mode (swap behavior).
    ///
    /// FIFO is broadly supported and paces the viewer to the display.
    pub present_mode: wgpu::PresentMode,

    /// Optional alpha mode preference for the surface.
    ///
    /// If provided but unsupported on the current surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Desired maximum frame latency for the surface.
    ///
    /// This value is a hint; support depends on platform/backend.
    pub desired_maximum_frame_latency: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            size: CanvasSize::default(),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            desired_maximum_frame_latency: 2,
        }
    }
}

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}

impl SurfaceErrorAction {
    pub fn for_error(err: &wgpu::SurfaceError) -> Self {
        match err {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => Self::Reconfigured,
            wgpu::SurfaceError::OutOfMemory => Self::Fatal,
            wgpu::SurfaceError::Timeout => Self::SkipFrame,
            wgpu::SurfaceError::Other => Self::SkipFrame,
        }
    }
}

/// A window surface configured once at a fixed size.
///
/// The surface takes the platform's preferred format. Frames are always
/// rendered through a linear view of it, so shader output is stored as is.
///
/// Surface lifetime is tied to the window; the window must outlive the canvas.
pub struct SurfaceCanvas<'w> {
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    config: wgpu::SurfaceConfiguration,
    view_format: wgpu::TextureFormat,
    size: CanvasSize,
}

impl<'w> SurfaceCanvas<'w> {
    /// Creates a surface for `window` on `instance`.
    pub fn create_surface(instance: &wgpu::Instance, window: &'w Window) -> Result<wgpu::Surface<'w>> {
        instance
            .create_surface(window)
            .context("failed to create wgpu surface")
    }

    /// Acquires a device compatible with `window` and a canvas bound to it.
    pub async fn for_window(
        window: &'w Window,
        gpu_init: GpuInit,
        config: CanvasConfig,
    ) -> Result<(Gpu, Self)> {
        let instance = Gpu::create_instance();
        let surface = Self::create_surface(&instance, window)?;
        let gpu = Gpu::new(instance, gpu_init, Some(&surface)).await?;
        let canvas = Self::new(&gpu, surface, config)?;
        Ok((gpu, canvas))
    }

    /// Configures `surface` at `config.size` for `gpu`'s device.
    pub fn new(gpu: &Gpu, surface: wgpu::Surface<'w>, config: CanvasConfig) -> Result<Self> {
        let CanvasConfig {
            size,
            present_mode,
            alpha_mode,
            desired_maximum_frame_latency,
        } = config;
        anyhow::ensure!(size.is_valid(), "canvas has zero size: {}x{}", size.width, size.height);

        let caps = surface.get_capabilities(gpu.adapter());
        let format = choose_surface_format(&caps).context("no supported surface formats")?;
        let view_format = linear_view_format(format);
        let alpha_mode = choose_alpha_mode(&caps, alpha_mode);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode,
            view_formats: extra_view_formats(format, view_format),
            desired_maximum_frame_latency,
        };
        surface.configure(gpu.device(), &config);
        log::debug!(
            "surface canvas {}x{} as {format:?} (rendered as {view_format:?})",
            size.width,
            size.height
        );

        Ok(Self {
            surface,
            device: gpu.device().clone(),
            config,
            view_format,
            size,
        })
    }

    /// Maps a surface error to an action, reconfiguring when the surface was
    /// lost or went out of date.
    pub fn handle_surface_error(&self, err: &wgpu::SurfaceError) -> SurfaceErrorAction {
        let action = SurfaceErrorAction::for_error(err);
        if action == SurfaceErrorAction::Reconfigured {
            log::warn!("surface {err}; reconfiguring");
            self.surface.configure(&self.device, &self.config);
        }
        action
    }
}

impl Canvas for SurfaceCanvas<'_> {
    fn size(&self) -> CanvasSize {
        self.size
    }

    fn format(&self) -> wgpu::TextureFormat {
        self.view_format
    }

    fn acquire(&self) -> Result<CanvasFrame> {
        match self.surface.get_current_texture() {
            Ok(texture) => Ok(CanvasFrame::surface(texture, self.view_format)),
            Err(err) => {
                let action = self.handle_surface_error(&err);
                Err(anyhow::Error::new(err)
                    .context(format!("failed to acquire surface image ({action:?})")))
            }
        }
    }
}

/// The platform's preferred format (first listed), swapped for its linear
/// twin when the surface supports that directly.
fn choose_surface_format(caps: &wgpu::SurfaceCapabilities) -> Option<wgpu::TextureFormat> {
    let preferred = *caps.formats.first()?;
    let linear = preferred.remove_srgb_suffix();
    if caps.formats.contains(&linear) {
        Some(linear)
    } else {
        Some(preferred)
    }
}

fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}
