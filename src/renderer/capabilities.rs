//! Snapshot of what the active GPU context can do, taken once per rendering target.

/// Coarse feature tier of the context.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProfileLevel {
    /// WebGL2 / GLES class hardware.
    Downlevel,
    /// Fully WebGPU compliant.
    Core,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Capabilities {
    pub profile: ProfileLevel,
    pub instancing: bool,
    /// Indirect draws may use a non-zero first instance.
    pub base_instance: bool,
    pub indirect_draw: bool,
    /// Storage buffers are readable from vertex shaders.
    pub buffer_storage: bool,
}

impl Capabilities {
    /// Everything supported, for tests and headless use.
    pub const ALL: Self = Self {
        profile: ProfileLevel::Core,
        instancing: true,
        base_instance: true,
        indirect_draw: true,
        buffer_storage: true,
    };

    /// Nothing beyond plain vertex arrays.
    pub const MINIMAL: Self = Self {
        profile: ProfileLevel::Downlevel,
        instancing: false,
        base_instance: false,
        indirect_draw: false,
        buffer_storage: false,
    };

    pub fn from_adapter(adapter: &wgpu::Adapter) -> Self {
        let features = adapter.features();
        let downlevel = adapter.get_downlevel_capabilities();

        let profile = if downlevel.is_webgpu_compliant() {
            ProfileLevel::Core
        } else {
            ProfileLevel::Downlevel
        };

        let capabilities = Self {
            profile,
            // Instance-rate vertex buffers exist on every wgpu backend.
            instancing: true,
            base_instance: features.contains(wgpu::Features::INDIRECT_FIRST_INSTANCE),
            indirect_draw: downlevel
                .flags
                .contains(wgpu::DownlevelFlags::INDIRECT_EXECUTION),
            buffer_storage: downlevel
                .flags
                .contains(wgpu::DownlevelFlags::VERTEX_STORAGE),
        };
        log::info!("GPU capabilities: {capabilities:?}");
        capabilities
    }

    /// Device features that must be requested for the detected capabilities to hold.
    pub fn required_features(&self) -> wgpu::Features {
        if self.base_instance {
            wgpu::Features::INDIRECT_FIRST_INSTANCE
        } else {
            wgpu::Features::empty()
        }
    }
}
