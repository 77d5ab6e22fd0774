//! Render targets.
//!
//! A canvas has a fixed pixel size chosen at construction and hands out one
//! color view per frame. Two implementations:
//! - [`SurfaceCanvas`]: a window surface, presented after submission
//! - [`OffscreenCanvas`]: a texture with blocking pixel readback (tests, capture)

mod offscreen;
mod surface;

use anyhow::Result;

pub use offscreen::OffscreenCanvas;
pub use surface::{CanvasConfig, SurfaceCanvas, SurfaceErrorAction};

/// Canvas resolution in physical pixels.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    #[inline]
    pub fn pixel_count(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    pub(crate) fn extent(self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::new(640, 512)
    }
}

/// One acquired canvas image.
///
/// Short-lived: acquire, record, submit, [`CanvasFrame::present`].
pub struct CanvasFrame {
    pub view: wgpu::TextureView,
    surface_texture: Option<wgpu::SurfaceTexture>,
}

impl CanvasFrame {
    pub(crate) fn offscreen(view: wgpu::TextureView) -> Self {
        Self {
            view,
            surface_texture: None,
        }
    }

    pub(crate) fn surface(
        surface_texture: wgpu::SurfaceTexture,
        view_format: wgpu::TextureFormat,
    ) -> Self {
        let view = surface_texture.texture.create_view(&wgpu::TextureViewDescriptor {
            format: Some(view_format),
            ..Default::default()
        });
        Self {
            view,
            surface_texture: Some(surface_texture),
        }
    }

    /// Presents the image. Must follow the submission that rendered into it.
    pub fn present(self) {
        let Self {
            view,
            surface_texture,
        } = self;
        drop(view);
        if let Some(texture) = surface_texture {
            texture.present();
        }
    }
}

/// Format frames are rendered through: the storage format without sRGB
/// encoding, so fragment output lands in the target unchanged.
pub(crate) fn linear_view_format(format: wgpu::TextureFormat) -> wgpu::TextureFormat {
    format.remove_srgb_suffix()
}

/// View formats a target must declare to be rendered as `view_format`.
pub(crate) fn extra_view_formats(
    format: wgpu::TextureFormat,
    view_format: wgpu::TextureFormat,
) -> Vec<wgpu::TextureFormat> {
    if format == view_format {
        Vec::new()
    } else {
        vec![view_format]
    }
}

/// A fixed-size render target.
pub trait Canvas {
    fn size(&self) -> CanvasSize;

    /// Color format pipelines rendering into this canvas must target.
    ///
    /// Never an sRGB format; pixel values are stored exactly as shaded.
    fn format(&self) -> wgpu::TextureFormat;

    /// Returns the image the next frame renders into.
    fn acquire(&self) -> Result<CanvasFrame>;
}
