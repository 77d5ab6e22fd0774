use anyhow::{Context, Result};

use super::GpuInit;

/// Storage buffers the field render stage binds in the fragment stage.
const FRAGMENT_STORAGE_BUFFERS: u32 = 2;

/// Owns wgpu core objects.
///
/// This type is the low-level device context:
/// - creates and stores Instance/Adapter/Device/Queue
/// - refuses adapters that cannot run the derivation stage
///
/// Surfaces are not owned here; see [`crate::canvas`].
pub struct Gpu {
    /// wgpu instance used to create the adapter and any surfaces.
    instance: wgpu::Instance,

    /// Selected adapter.
    adapter: wgpu::Adapter,

    /// Logical device.
    device: wgpu::Device,

    /// Command queue.
    queue: wgpu::Queue,
}

impl Gpu {
    /// Creates a wgpu instance over all backends.
    ///
    /// Window hosts create their surface from this instance before calling
    /// [`Gpu::new`], so the adapter can be matched against it.
    pub fn create_instance() -> wgpu::Instance {
        wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        })
    }

    /// Acquires an adapter and device without a surface.
    pub async fn headless(init: GpuInit) -> Result<Self> {
        Self::new(Self::create_instance(), init, None).await
    }

    /// Acquires an adapter (compatible with `compatible_surface` when given) and a
    /// logical device.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(
        instance: wgpu::Instance,
        init: GpuInit,
        compatible_surface: Option<&wgpu::Surface<'_>>,
    ) -> Result<Self> {
        let GpuInit {
            power_preference,
            force_fallback_adapter,
            required_features,
            required_limits,
        } = init;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface,
                force_fallback_adapter,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let info = adapter.get_info();
        log::info!("using adapter {:?} ({:?})", info.name, info.backend);

        let downlevel = adapter.get_downlevel_capabilities();
        anyhow::ensure!(
            downlevel.flags.contains(wgpu::DownlevelFlags::COMPUTE_SHADERS),
            "adapter {:?} does not support compute shaders",
            info.name
        );

        let adapter_limits = adapter.limits();
        anyhow::ensure!(
            adapter_limits.max_storage_buffers_per_shader_stage >= FRAGMENT_STORAGE_BUFFERS,
            "adapter {:?} allows {} storage buffers per shader stage, {} required",
            info.name,
            adapter_limits.max_storage_buffers_per_shader_stage,
            FRAGMENT_STORAGE_BUFFERS
        );

        let required_limits = required_limits.unwrap_or_else(|| {
            wgpu::Limits::downlevel_defaults().using_resolution(adapter_limits.clone())
        });

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("fieldview device"),
                required_features,
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }

    /// Returns the instance the adapter was selected from.
    pub fn instance(&self) -> &wgpu::Instance {
        &self.instance
    }

    /// Returns the selected adapter.
    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}
