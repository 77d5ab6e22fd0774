use anyhow::Result;

use crate::canvas::CanvasSize;

use super::contract::{DIRECT_BIND_GROUP, DIRECT_SOURCE_BINDING, validate_direct_len};
use super::region::BufferRegion;
use super::shader::ShaderProgram;
use super::storage::StorageBuffer;
use super::{begin_clear_pass, fullscreen_pipeline, storage_entry};

/// Renders one-byte-per-pixel data at canvas resolution, with no derivation.
///
/// The pixel buffer lives in bind group 1; group 0 is bound to an empty set so
/// the layout lines up with the field-data path's slot numbering.
pub struct DirectPath {
    source: BufferRegion,
    pixel_storage: StorageBuffer,
    pipeline: wgpu::RenderPipeline,
    empty_bind_group: wgpu::BindGroup,
    bind_group: wgpu::BindGroup,
}

impl DirectPath {
    /// Validates `source` against `size` and builds the path.
    ///
    /// The length must equal `width * height` exactly; a mismatch is reported
    /// before anything is allocated.
    pub fn new(
        device: &wgpu::Device,
        shader: &ShaderProgram,
        format: wgpu::TextureFormat,
        size: CanvasSize,
        source: BufferRegion,
    ) -> Result<Self> {
        validate_direct_len(source.len(), size)?;

        let pixel_storage =
            StorageBuffer::new(device, "fieldview direct pixels", size.pixel_count(), true)?;

        let empty_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("fieldview direct empty bgl"),
            entries: &[],
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("fieldview direct bgl"),
            entries: &[storage_entry(
                DIRECT_SOURCE_BINDING,
                wgpu::ShaderStages::FRAGMENT,
                true,
                None,
            )],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("fieldview direct pipeline layout"),
            bind_group_layouts: &[&empty_layout, &bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = fullscreen_pipeline(
            device,
            "fieldview direct pipeline",
            &pipeline_layout,
            shader,
            &shader.entry_points().direct_fragment,
            format,
            size,
        );

        let empty_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("fieldview direct empty bind group"),
            layout: &empty_layout,
            entries: &[],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("fieldview direct bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: DIRECT_SOURCE_BINDING,
                resource: pixel_storage.as_entire_binding(),
            }],
        });
        log::debug!("direct path ready: {}x{}", size.width, size.height);

        Ok(Self {
            source,
            pixel_storage,
            pipeline,
            empty_bind_group,
            bind_group,
        })
    }

    /// Copies the region's current bytes into device storage.
    pub fn upload(&self, queue: &wgpu::Queue) -> Result<()> {
        self.source
            .with_bytes(|bytes| self.pixel_storage.write(queue, bytes))?
    }

    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let mut rpass = begin_clear_pass(encoder, view, "fieldview direct pass");
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.empty_bind_group, &[]);
        rpass.set_bind_group(DIRECT_BIND_GROUP, &self.bind_group, &[]);
        rpass.draw(0..3, 0..1);
    }
}
