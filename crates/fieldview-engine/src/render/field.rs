use anyhow::Result;

use crate::canvas::CanvasSize;
use crate::device::read_buffer_blocking;

use super::contract::{
    FIELD_BIND_GROUP, FIELD_METRICS_BINDING, FIELD_SOURCE_BINDING, FRAME_METRICS_BYTES,
    FrameMetrics, validate_field_len,
};
use super::derive::MetricsStage;
use super::region::BufferRegion;
use super::shader::ShaderProgram;
use super::storage::StorageBuffer;
use super::{begin_clear_pass, fullscreen_pipeline, storage_entry};

/// The field-data render stage: a full-screen draw reading raw field data and
/// the frame metrics.
///
/// Both bindings are declared read-only in the layout, so the stage cannot
/// write either buffer.
pub struct FieldRenderStage {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
}

impl FieldRenderStage {
    pub fn new(
        device: &wgpu::Device,
        shader: &ShaderProgram,
        field_storage: &StorageBuffer,
        metrics_storage: &StorageBuffer,
        format: wgpu::TextureFormat,
        size: CanvasSize,
    ) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("fieldview field render bgl"),
            entries: &[
                storage_entry(FIELD_SOURCE_BINDING, wgpu::ShaderStages::FRAGMENT, true, None),
                storage_entry(
                    FIELD_METRICS_BINDING,
                    wgpu::ShaderStages::FRAGMENT,
                    true,
                    wgpu::BufferSize::new(FRAME_METRICS_BYTES),
                ),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("fieldview field render pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = fullscreen_pipeline(
            device,
            "fieldview field render pipeline",
            &pipeline_layout,
            shader,
            &shader.entry_points().field_fragment,
            format,
            size,
        );

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("fieldview field render bind group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: FIELD_SOURCE_BINDING,
                    resource: field_storage.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: FIELD_METRICS_BINDING,
                    resource: metrics_storage.as_entire_binding(),
                },
            ],
        });

        Self {
            pipeline,
            bind_group,
        }
    }

    /// Records the render pass: clear to transparent, then one full-screen
    /// triangle.
    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let mut rpass = begin_clear_pass(encoder, view, "fieldview field render pass");
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(FIELD_BIND_GROUP, &self.bind_group, &[]);
        rpass.draw(0..3, 0..1);
    }
}

/// Everything the field-data path owns: the caller's region, its device mirror,
/// the metrics record and both stages.
pub struct FieldDataPath {
    source: BufferRegion,
    field_storage: StorageBuffer,
    metrics_storage: StorageBuffer,
    derive: MetricsStage,
    render: FieldRenderStage,
}

impl FieldDataPath {
    /// Validates `source` and builds the path.
    ///
    /// Layout violations are reported before anything is allocated.
    pub fn new(
        device: &wgpu::Device,
        shader: &ShaderProgram,
        format: wgpu::TextureFormat,
        size: CanvasSize,
        source: BufferRegion,
    ) -> Result<Self> {
        let lines = validate_field_len(source.len())?;

        let field_storage =
            StorageBuffer::new(device, "fieldview field storage", source.len() as u64, true)?;
        let metrics_storage =
            StorageBuffer::new(device, "fieldview frame metrics", FRAME_METRICS_BYTES, false)?;

        let derive = MetricsStage::new(device, shader, &field_storage, &metrics_storage, size);
        let render = FieldRenderStage::new(
            device,
            shader,
            &field_storage,
            &metrics_storage,
            format,
            size,
        );
        log::debug!("field-data path ready: {lines} lines");

        Ok(Self {
            source,
            field_storage,
            metrics_storage,
            derive,
            render,
        })
    }

    /// Copies the region's current bytes into device storage.
    pub fn upload(&self, queue: &wgpu::Queue) -> Result<()> {
        self.source
            .with_bytes(|bytes| self.field_storage.write(queue, bytes))?
    }

    /// Records derivation then render into `encoder`.
    ///
    /// The order is the happens-before edge between the two stages.
    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        self.derive.encode(encoder);
        self.render.encode(encoder, view);
    }

    pub fn line_count(&self) -> usize {
        self.source.len() / super::FIELD_LINE_BYTES
    }

    /// Reads the metrics record after all submitted work completes.
    ///
    /// Diagnostic only: blocks, and never feeds the render stage.
    pub fn read_metrics(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<FrameMetrics> {
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fieldview frame metrics readback"),
            size: FRAME_METRICS_BYTES,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("fieldview frame metrics readback encoder"),
        });
        encoder.copy_buffer_to_buffer(
            self.metrics_storage.buffer(),
            0,
            &readback,
            0,
            FRAME_METRICS_BYTES,
        );
        let submission = queue.submit(std::iter::once(encoder.finish()));

        let bytes = read_buffer_blocking(device, &readback, submission)?;
        Ok(bytemuck::pod_read_unaligned(&bytes))
    }
}
