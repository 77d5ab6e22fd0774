//! GPU device management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - rejecting adapters without compute shaders or fragment storage buffers
//! - blocking readback helpers shared by diagnostics and snapshots

mod gpu;
mod init;
mod readback;

pub use gpu::Gpu;
pub use init::GpuInit;

pub(crate) use readback::read_buffer_blocking;
