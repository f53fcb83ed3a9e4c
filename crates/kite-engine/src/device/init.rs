/// Initialization parameters for the GPU layer.
///
/// Keep this structure stable and minimal. Add configuration flags only when a
/// concrete platform or backend requirement exists.
#[derive(Debug, Clone)]
pub struct GpuInit {
    pub power_preference: wgpu::PowerPreference,

    /// Pick a software adapter even when hardware is available.
    pub force_fallback_adapter: bool,

    /// Required wgpu features.
    ///
    /// Requested only when the adapter offers them; favor an empty set.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Treat the device as limited to power-of-two textures even if it is not.
    pub force_power_of_two: bool,

    /// Size of the off-screen render target standing in for a window.
    pub screen_size: (u32, u32),
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults(),
            force_power_of_two: false,
            screen_size: (800, 600),
        }
    }
}
