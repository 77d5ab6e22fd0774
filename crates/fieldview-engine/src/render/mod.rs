//! The field-data pipeline.
//!
//! Per frame, the field-data path records a compute pass (derivation stage)
//! followed by a render pass into one encoder and submits once; the direct path
//! records a single render pass. Pipelines and storage are built once by
//! [`FrameOrchestrator::new`] and never change afterwards.
//!
//! Convention:
//! - storage is bound as `array<u32>`; the shader addresses bytes little-endian
//! - both render pipelines draw one full-screen triangle with no vertex buffer
//! - render passes clear to transparent before drawing

pub mod contract;
mod derive;
mod direct;
mod error;
mod field;
mod orchestrator;
mod region;
mod shader;
mod storage;

use crate::canvas::CanvasSize;

pub use contract::{FIELD_LINE_BYTES, FrameMetrics};
pub use derive::MetricsStage;
pub use direct::DirectPath;
pub use error::{ContractError, RenderPath};
pub use field::{FieldDataPath, FieldRenderStage};
pub use orchestrator::{FrameOrchestrator, FrameSources, RendererState};
pub use region::{BufferRegion, SharedBytes, shared_bytes};
pub use shader::{EntryPoints, ShaderProgram, builtin_line};
pub use storage::StorageBuffer;

fn storage_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    read_only: bool,
    min_binding_size: Option<wgpu::BufferSize>,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size,
        },
        count: None,
    }
}

/// Builds a full-screen render pipeline from the shared vertex entry and
/// `fragment_entry`.
fn fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &ShaderProgram,
    fragment_entry: &str,
    format: wgpu::TextureFormat,
    size: CanvasSize,
) -> wgpu::RenderPipeline {
    let constants = contract::pipeline_constants(size);

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),

        vertex: wgpu::VertexState {
            module: shader.module(),
            entry_point: Some(&*shader.entry_points().vertex),
            compilation_options: wgpu::PipelineCompilationOptions {
                constants: &constants,
                ..Default::default()
            },
            buffers: &[],
        },

        fragment: Some(wgpu::FragmentState {
            module: shader.module(),
            entry_point: Some(fragment_entry),
            compilation_options: wgpu::PipelineCompilationOptions {
                constants: &constants,
                ..Default::default()
            },
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

/// Begins a render pass into `view` that clears to fully transparent.
fn begin_clear_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    view: &wgpu::TextureView,
    label: &str,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    })
}
