use anyhow::{Context, Result};

/// Maps `buffer` for reading once `submission` has completed and copies its
/// contents out.
///
/// Blocks the calling thread. Only diagnostics and snapshot capture use this;
/// the per-frame render path never waits on the device.
pub(crate) fn read_buffer_blocking(
    device: &wgpu::Device,
    buffer: &wgpu::Buffer,
    submission: wgpu::SubmissionIndex,
) -> Result<Vec<u8>> {
    let slice = buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });

    device
        .poll(wgpu::PollType::Wait {
            submission_index: Some(submission),
            timeout: None,
        })
        .context("device poll failed while waiting for readback")?;

    rx.recv()
        .context("readback map callback was dropped")?
        .context("failed to map readback buffer")?;

    let bytes = slice.get_mapped_range().to_vec();
    buffer.unmap();
    Ok(bytes)
}
