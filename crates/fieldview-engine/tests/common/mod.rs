#![allow(dead_code)]

use anyhow::Result;
use fieldview_engine::canvas::{CanvasSize, OffscreenCanvas};
use fieldview_engine::device::{Gpu, GpuInit};
use fieldview_engine::logging::{LoggingConfig, init_logging};
use fieldview_engine::render::{
    BufferRegion, FIELD_LINE_BYTES, FrameOrchestrator, FrameSources, ShaderProgram, SharedBytes,
    builtin_line, shared_bytes,
};

pub use builtin_line::{DISPLAYED, HAS_BYTES};

pub const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];
pub const BLACK: [u8; 4] = [0, 0, 0, 255];
pub const WHITE: [u8; 4] = [255, 255, 255, 255];

/// Returns a device, or `None` when the machine has no adapter able to run
/// the pipeline. Callers return early on `None`.
pub fn gpu() -> Option<Gpu> {
    init_logging(LoggingConfig::for_tests());
    match pollster::block_on(Gpu::headless(GpuInit::default())) {
        Ok(gpu) => Some(gpu),
        Err(err) => {
            eprintln!("skipping: no usable GPU adapter: {err:#}");
            None
        }
    }
}

/// One field line in the layout the bundled shader reads.
pub fn line(flags: u8, total_chars: u8, back_porch: u8, fill: u8) -> Vec<u8> {
    let mut bytes = vec![0u8; FIELD_LINE_BYTES];
    bytes[builtin_line::FLAGS] = flags;
    bytes[builtin_line::TOTAL_CHARS] = total_chars;
    bytes[builtin_line::BACK_PORCH] = back_porch;
    bytes[builtin_line::CHAR_DATA..].fill(fill);
    bytes
}

pub fn field(lines: &[Vec<u8>]) -> Vec<u8> {
    lines.concat()
}

pub fn offscreen_orchestrator(
    gpu: &Gpu,
    size: CanvasSize,
    sources: FrameSources,
) -> Result<FrameOrchestrator<OffscreenCanvas>> {
    let canvas = OffscreenCanvas::new(gpu, size)?;
    let shader = ShaderProgram::builtin(gpu.device());
    FrameOrchestrator::new(gpu, canvas, &shader, sources)
}

/// A field-data-only orchestrator over a fresh backing store holding `bytes`.
pub fn field_orchestrator(
    gpu: &Gpu,
    bytes: Vec<u8>,
) -> Result<(FrameOrchestrator<OffscreenCanvas>, SharedBytes)> {
    let backing = shared_bytes(bytes);
    let region = BufferRegion::whole(backing.clone())?;
    let orchestrator =
        offscreen_orchestrator(gpu, CanvasSize::default(), FrameSources::field_data(region))?;
    Ok((orchestrator, backing))
}

/// Replaces the backing store's contents in place; the length must not change.
pub fn overwrite(backing: &SharedBytes, bytes: &[u8]) {
    backing.write().unwrap().copy_from_slice(bytes);
}
