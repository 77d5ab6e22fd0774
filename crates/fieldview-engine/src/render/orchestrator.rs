use anyhow::Result;

use crate::canvas::Canvas;
use crate::device::Gpu;

use super::contract::{FrameMetrics, validate_direct_len, validate_field_len};
use super::direct::DirectPath;
use super::error::{ContractError, RenderPath};
use super::field::FieldDataPath;
use super::region::BufferRegion;
use super::shader::ShaderProgram;
use super::storage::check_storage_len;

/// Source regions, one per enabled path.
#[derive(Debug, Clone, Default)]
pub struct FrameSources {
    pub field_data: Option<BufferRegion>,
    pub direct: Option<BufferRegion>,
}

impl FrameSources {
    pub fn field_data(region: BufferRegion) -> Self {
        Self {
            field_data: Some(region),
            direct: None,
        }
    }

    pub fn direct(region: BufferRegion) -> Self {
        Self {
            field_data: None,
            direct: Some(region),
        }
    }

    pub fn both(field_data: BufferRegion, direct: BufferRegion) -> Self {
        Self {
            field_data: Some(field_data),
            direct: Some(direct),
        }
    }
}

/// Lifecycle of an orchestrator.
///
/// Before construction there is nothing to observe; a constructed orchestrator
/// is `Configured` until its first successful render.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RendererState {
    Configured,
    Renderable,
}

/// Owns the device storage and pipelines of both render paths and turns each
/// render call into exactly one queue submission.
pub struct FrameOrchestrator<C: Canvas> {
    device: wgpu::Device,
    queue: wgpu::Queue,
    canvas: C,
    field: Option<FieldDataPath>,
    direct: Option<DirectPath>,
    state: RendererState,
}

impl<C: Canvas> FrameOrchestrator<C> {
    /// Builds storage and pipelines for every path that has a source.
    ///
    /// All sources are validated before the first allocation, so a contract
    /// violation leaves no device objects behind.
    pub fn new(gpu: &Gpu, canvas: C, shader: &ShaderProgram, sources: FrameSources) -> Result<Self> {
        let FrameSources { field_data, direct } = sources;
        anyhow::ensure!(
            field_data.is_some() || direct.is_some(),
            "at least one source region is required"
        );

        let size = canvas.size();
        if let Some(region) = &field_data {
            validate_field_len(region.len())?;
        }
        if let Some(region) = &direct {
            validate_direct_len(region.len(), size)?;
            check_storage_len(size.pixel_count())?;
        }

        let device = gpu.device();
        let format = canvas.format();
        let field = field_data
            .map(|region| FieldDataPath::new(device, shader, format, size, region))
            .transpose()?;
        let direct = direct
            .map(|region| DirectPath::new(device, shader, format, size, region))
            .transpose()?;

        log::debug!(
            "orchestrator configured: {}x{} {format:?}, field-data {}, direct {}",
            size.width,
            size.height,
            field.is_some(),
            direct.is_some()
        );

        Ok(Self {
            device: device.clone(),
            queue: gpu.queue().clone(),
            canvas,
            field,
            direct,
            state: RendererState::Configured,
        })
    }

    /// Renders the field-data region's current contents.
    ///
    /// Upload, derivation dispatch and render pass go out in one submission;
    /// returns without waiting for the GPU.
    pub fn render_field_data(&mut self) -> Result<()> {
        let path = self
            .field
            .as_ref()
            .ok_or(ContractError::PathNotConfigured(RenderPath::FieldData))?;

        path.upload(&self.queue)?;
        submit_frame(&self.device, &self.queue, &self.canvas, |encoder, view| {
            path.encode(encoder, view)
        })?;

        self.state = RendererState::Renderable;
        log::trace!("field-data frame submitted");
        Ok(())
    }

    /// Renders the direct region's current contents. No derivation dispatch.
    pub fn render_direct(&mut self) -> Result<()> {
        let path = self
            .direct
            .as_ref()
            .ok_or(ContractError::PathNotConfigured(RenderPath::Direct))?;

        path.upload(&self.queue)?;
        submit_frame(&self.device, &self.queue, &self.canvas, |encoder, view| {
            path.encode(encoder, view)
        })?;

        self.state = RendererState::Renderable;
        log::trace!("direct frame submitted");
        Ok(())
    }

    /// Reads back the metrics the latest field-data frame derived.
    ///
    /// Blocks until submitted work completes.
    pub fn read_frame_metrics(&self) -> Result<FrameMetrics> {
        let path = self
            .field
            .as_ref()
            .ok_or(ContractError::PathNotConfigured(RenderPath::FieldData))?;
        path.read_metrics(&self.device, &self.queue)
    }

    pub fn has_path(&self, path: RenderPath) -> bool {
        match path {
            RenderPath::FieldData => self.field.is_some(),
            RenderPath::Direct => self.direct.is_some(),
        }
    }

    /// Number of lines in the field-data region, if that path is configured.
    pub fn field_line_count(&self) -> Option<usize> {
        self.field.as_ref().map(FieldDataPath::line_count)
    }

    pub fn state(&self) -> RendererState {
        self.state
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }
}

/// Acquires the canvas image, records `record` into one encoder, submits once
/// and presents.
fn submit_frame<C: Canvas>(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    canvas: &C,
    record: impl FnOnce(&mut wgpu::CommandEncoder, &wgpu::TextureView),
) -> Result<()> {
    let frame = canvas.acquire()?;

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("fieldview frame encoder"),
    });
    record(&mut encoder, &frame.view);

    queue.submit(std::iter::once(encoder.finish()));
    frame.present();
    Ok(())
}
