use anyhow::Result;

use super::contract::STORAGE_ALIGNMENT;
use super::error::ContractError;

/// A fixed-size device storage buffer.
///
/// Sized once at creation; never resized. Replacing it means building a new
/// orchestrator.
pub struct StorageBuffer {
    buffer: wgpu::Buffer,
    len: u64,
    host_writable: bool,
}

impl StorageBuffer {
    /// Allocates `len` bytes of storage.
    ///
    /// `len` must be a positive multiple of 4; the check runs before the
    /// allocation call. Host-writable buffers accept [`StorageBuffer::write`].
    pub fn new(device: &wgpu::Device, label: &str, len: u64, host_writable: bool) -> Result<Self> {
        check_storage_len(len)?;

        let mut usage = wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC;
        if host_writable {
            usage |= wgpu::BufferUsages::COPY_DST;
        }

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: len,
            usage,
            mapped_at_creation: false,
        });
        log::debug!("allocated {label}: {len} bytes (host writable: {host_writable})");

        Ok(Self {
            buffer,
            len,
            host_writable,
        })
    }

    /// Queues a copy of `bytes` into the buffer at offset 0.
    ///
    /// The copy lands before the next submission on `queue`.
    pub fn write(&self, queue: &wgpu::Queue, bytes: &[u8]) -> Result<()> {
        anyhow::ensure!(self.host_writable, "storage buffer is not host writable");
        if bytes.len() as u64 != self.len {
            return Err(ContractError::LengthMismatch {
                len: bytes.len(),
                expected: self.len,
            }
            .into());
        }
        queue.write_buffer(&self.buffer, 0, bytes);
        Ok(())
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn as_entire_binding(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }
}

pub(crate) fn check_storage_len(len: u64) -> Result<(), ContractError> {
    if len == 0 || len % STORAGE_ALIGNMENT != 0 {
        return Err(ContractError::MisalignedStorage { len });
    }
    Ok(())
}
