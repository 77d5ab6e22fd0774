use crate::canvas::CanvasSize;

use super::contract::{
    FIELD_BIND_GROUP, FIELD_METRICS_BINDING, FIELD_SOURCE_BINDING, FRAME_METRICS_BYTES,
    pipeline_constants,
};
use super::shader::ShaderProgram;
use super::storage::StorageBuffer;
use super::storage_entry;

/// The derivation stage: one compute dispatch reducing field data to
/// [`FrameMetrics`](super::FrameMetrics).
///
/// Exactly one workgroup is dispatched; the shader walks every line in a
/// single invocation, so there is a single writer to the metrics record.
pub struct MetricsStage {
    pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
}

impl MetricsStage {
    pub fn new(
        device: &wgpu::Device,
        shader: &ShaderProgram,
        field_storage: &StorageBuffer,
        metrics_storage: &StorageBuffer,
        size: CanvasSize,
    ) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("fieldview metrics bgl"),
            entries: &[
                storage_entry(FIELD_SOURCE_BINDING, wgpu::ShaderStages::COMPUTE, true, None),
                storage_entry(
                    FIELD_METRICS_BINDING,
                    wgpu::ShaderStages::COMPUTE,
                    false,
                    wgpu::BufferSize::new(FRAME_METRICS_BYTES),
                ),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("fieldview metrics pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let constants = pipeline_constants(size);
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("fieldview metrics pipeline"),
            layout: Some(&pipeline_layout),
            module: shader.module(),
            entry_point: Some(&*shader.entry_points().metrics),
            compilation_options: wgpu::PipelineCompilationOptions {
                constants: &constants,
                ..Default::default()
            },
            cache: None,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("fieldview metrics bind group"),
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

    /// Records the dispatch. Must precede the render pass that reads the
    /// metrics, in the same encoder.
    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder) {
        let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("fieldview metrics pass"),
            timestamp_writes: None,
        });
        cpass.set_pipeline(&self.pipeline);
        cpass.set_bind_group(FIELD_BIND_GROUP, &self.bind_group, &[]);
        cpass.dispatch_workgroups(1, 1, 1);
    }
}
