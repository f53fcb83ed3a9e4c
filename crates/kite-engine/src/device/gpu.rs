use anyhow::{Context, Result};

use super::GpuInit;

/// Owns the wgpu adapter, device and queue.
///
/// There is no surface: the engine renders into textures, and the "screen" is
/// an off-screen target of [`GpuInit::screen_size`].
pub struct GpuContext {
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,

    force_power_of_two: bool,
    screen_size: (u32, u32),
}

impl GpuContext {
    /// Acquires an adapter and device.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(init: GpuInit) -> Result<Self> {
        let GpuInit {
            power_preference,
            force_fallback_adapter,
            required_features,
            required_limits,
            force_power_of_two,
            screen_size,
        } = init;
        anyhow::ensure!(screen_size.0 > 0 && screen_size.1 > 0, "screen size must be non-zero");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let info = adapter.get_info();
        log::info!("using adapter {} ({:?})", info.name, info.backend);

        let offered = adapter.features();
        let missing = required_features - offered;
        if !missing.is_empty() {
            log::warn!("adapter lacks requested features {missing:?}");
        }
        // Float32 filtering widens the set of usable canvas formats; take it when offered.
        let features = (required_features & offered) | (offered & wgpu::Features::FLOAT32_FILTERABLE);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("kite-engine device"),
                required_features: features,
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        Ok(Self {
            adapter,
            device,
            queue,
            force_power_of_two,
            screen_size,
        })
    }

    /// Blocking variant of [`new`](Self::new) for callers without an executor.
    pub fn new_blocking(init: GpuInit) -> Result<Self> {
        pollster::block_on(Self::new(init))
    }

    /// Returns a reference to the adapter.
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

    pub fn screen_size(&self) -> (u32, u32) {
        self.screen_size
    }

    /// Whether textures may have non-power-of-two dimensions.
    pub fn supports_npot(&self) -> bool {
        !self.force_power_of_two
            && self
                .adapter
                .get_downlevel_capabilities()
                .flags
                .contains(wgpu::DownlevelFlags::NON_POWER_OF_TWO_MIPMAPPED_TEXTURES)
    }

    pub fn max_texture_size(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    /// Capabilities of `format` on this device.
    pub fn format_features(&self, format: wgpu::TextureFormat) -> wgpu::TextureFormatFeatures {
        let features = self.device.features();
        if features.contains(wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES) {
            self.adapter.get_texture_format_features(format)
        } else {
            format.guaranteed_format_features(features)
        }
    }
}
