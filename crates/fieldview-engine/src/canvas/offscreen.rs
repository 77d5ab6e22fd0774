use anyhow::Result;

use crate::device::{Gpu, read_buffer_blocking};
use crate::snapshot::Snapshot;

use super::{Canvas, CanvasFrame, CanvasSize, extra_view_formats, linear_view_format};

const BYTES_PER_PIXEL: u32 = 4;

/// A texture-backed canvas whose pixels can be read back.
///
/// Stored as RGBA8, so snapshots are byte-comparable across platforms. An
/// sRGB texture is rendered through its linear view like a window surface.
pub struct OffscreenCanvas {
    texture: wgpu::Texture,
    view_format: wgpu::TextureFormat,
    device: wgpu::Device,
    queue: wgpu::Queue,
    size: CanvasSize,
}

impl OffscreenCanvas {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    pub fn new(gpu: &Gpu, size: CanvasSize) -> Result<Self> {
        Self::with_format(gpu, size, Self::FORMAT)
    }

    /// Creates a canvas stored as `format`: `Rgba8Unorm` or `Rgba8UnormSrgb`.
    pub fn with_format(gpu: &Gpu, size: CanvasSize, format: wgpu::TextureFormat) -> Result<Self> {
        anyhow::ensure!(size.is_valid(), "canvas has zero size: {}x{}", size.width, size.height);

        let view_format = linear_view_format(format);
        anyhow::ensure!(
            view_format == Self::FORMAT,
            "offscreen canvas must be RGBA8, got {format:?}"
        );

        let view_formats = extra_view_formats(format, view_format);
        let texture = gpu.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("fieldview offscreen canvas"),
            size: size.extent(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &view_formats,
        });

        Ok(Self {
            texture,
            view_format,
            device: gpu.device().clone(),
            queue: gpu.queue().clone(),
            size,
        })
    }

    /// Format the backing texture is stored in.
    pub fn storage_format(&self) -> wgpu::TextureFormat {
        self.texture.format()
    }

    /// Copies the current canvas contents to the host.
    ///
    /// Runs after all previously submitted work and blocks until it is done.
    pub fn read_pixels(&self) -> Result<Snapshot> {
        let CanvasSize { width, height } = self.size;
        let unpadded = width * BYTES_PER_PIXEL;
        let padded = padded_bytes_per_row(unpadded);

        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fieldview offscreen readback"),
            size: u64::from(padded) * u64::from(height),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("fieldview offscreen readback encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            self.size.extent(),
        );
        let submission = self.queue.submit(std::iter::once(encoder.finish()));

        let bytes = read_buffer_blocking(&self.device, &readback, submission)?;

        let mut rgba = Vec::with_capacity((unpadded * height) as usize);
        for row in bytes.chunks_exact(padded as usize) {
            rgba.extend_from_slice(&row[..unpadded as usize]);
        }
        Snapshot::new(self.size, rgba)
    }
}

impl Canvas for OffscreenCanvas {
    fn size(&self) -> CanvasSize {
        self.size
    }

    fn format(&self) -> wgpu::TextureFormat {
        self.view_format
    }

    fn acquire(&self) -> Result<CanvasFrame> {
        let view = self.texture.create_view(&wgpu::TextureViewDescriptor {
            format: Some(self.view_format),
            ..Default::default()
        });
        Ok(CanvasFrame::offscreen(view))
    }
}

fn padded_bytes_per_row(unpadded: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_to_copy_alignment() {
        assert_eq!(padded_bytes_per_row(640 * 4), 2560);
        assert_eq!(padded_bytes_per_row(100 * 4), 512);
        assert_eq!(padded_bytes_per_row(4), 256);
    }
}
