//! fieldview engine crate.
//!
//! Renders packed field data with a two-stage wgpu pipeline: a compute pass
//! derives per-frame metrics from the raw lines, then a full-screen render pass
//! draws the canvas from the raw lines plus those metrics. A direct path draws
//! pre-rasterized one-byte-per-pixel data instead.
//!
//! Typical use:
//! 1. acquire a [`device::Gpu`] (and a [`canvas::SurfaceCanvas`] for a window)
//! 2. build a [`render::FrameOrchestrator`] over caller-owned
//!    [`render::BufferRegion`]s
//! 3. call `render_field_data` / `render_direct` whenever the data changes

pub mod canvas;
pub mod device;
pub mod logging;
pub mod render;
pub mod snapshot;
