/// Initialization parameters for the GPU layer.
///
/// Keep this structure stable and minimal. Add configuration flags only when a
/// concrete platform or backend requirement exists.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Adapter selection hint.
    pub power_preference: wgpu::PowerPreference,

    /// Forces a software adapter when the platform provides one.
    ///
    /// Useful for deterministic snapshot runs on machines with mixed GPUs.
    pub force_fallback_adapter: bool,

    /// Required wgpu features.
    ///
    /// The pipeline only needs compute shaders and read-only storage buffers in
    /// the fragment stage, neither of which is a feature flag.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    ///
    /// `None` requests the downlevel defaults at the adapter's own texture
    /// resolution, which every adapter able to run the pipeline satisfies.
    pub required_limits: Option<wgpu::Limits>,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            required_features: wgpu::Features::empty(),
            required_limits: None,
        }
    }
}
