// Instance - connection to the Vulkan runtime
//
// Responsibilities:
// - Extension/layer negotiation against what the runtime reports
// - VkInstance creation with a fixed application identity
// - Bulk adapter discovery, fully queried before initialize() returns
// - Teardown ordering: refuses to die while a derived device is alive

use std::ffi::CStr;
use std::os::raw::c_char;

use ash::extensions::khr;
use ash::vk;

use super::adapter::{self, Adapter};
use super::error::GfxError;
use super::lifetime::{ChildGuard, ChildTracker};
use super::loader;

/// Capability tables and identity for one bring-up sequence.
///
/// Passed by value into [`Instance::initialize`]; independent sequences get
/// independent configs and never share mutable state.
#[derive(Debug, Clone)]
pub struct InstanceConfig {
    pub app_name: &'static CStr,
    pub engine_name: &'static CStr,
    /// Enable the Khronos validation layer if the runtime has it.
    pub enable_debug_layer: bool,
    pub wanted_instance_extensions: Vec<&'static CStr>,
    pub wanted_device_extensions: Vec<&'static CStr>,
    pub validation_layer: &'static CStr,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            app_name: c"vk-bringup",
            engine_name: c"no engine",
            enable_debug_layer: false,
            wanted_instance_extensions: default_instance_extensions(),
            wanted_device_extensions: default_device_extensions(),
            validation_layer: c"VK_LAYER_KHRONOS_validation",
        }
    }
}

/// Surface extensions for the compile target plus the extended-properties
/// query extension. Entries the runtime does not support are dropped during
/// negotiation.
pub fn default_instance_extensions() -> Vec<&'static CStr> {
    let mut wanted = vec![khr::Surface::name()];
    #[cfg(target_os = "windows")]
    wanted.push(khr::Win32Surface::name());
    #[cfg(any(
        target_os = "linux",
        target_os = "freebsd",
        target_os = "dragonfly",
        target_os = "netbsd",
        target_os = "openbsd"
    ))]
    {
        wanted.push(khr::XlibSurface::name());
        wanted.push(khr::XcbSurface::name());
        wanted.push(khr::WaylandSurface::name());
    }
    wanted.push(vk::KhrGetPhysicalDeviceProperties2Fn::name());
    wanted
}

/// Swapchain plus the portability-subset extension, which only exists (and
/// must then be enabled) on translation layers such as MoltenVK.
pub fn default_device_extensions() -> Vec<&'static CStr> {
    vec![vk::KhrPortabilitySubsetFn::name(), khr::Swapchain::name()]
}

/// Top-level handle to the Vulkan runtime.
///
/// Owns the adapter list; must outlive every device and window derived from
/// it. Destruction order is enforced, see [`Instance::destroy`].
pub struct Instance {
    raw: ash::Instance,
    surface_fn: khr::Surface,
    enabled_extensions: Vec<&'static CStr>,
    enabled_layers: Vec<&'static CStr>,
    adapters: Vec<Adapter>,
    children: ChildTracker,
    alive: bool,
}

impl Instance {
    /// Bring up the runtime connection and discover every adapter.
    pub fn initialize(config: &InstanceConfig) -> Result<Self, GfxError> {
        let entry = loader::ensure_loaded()?;

        let supported = entry
            .enumerate_instance_extension_properties(None)
            .map_err(GfxError::CapabilityQuery)?;
        let enabled_extensions =
            adapter::select_supported_extensions(&config.wanted_instance_extensions, &supported);
        log::debug!("enabling instance extensions {:?}", enabled_extensions);

        let mut enabled_layers = Vec::new();
        if config.enable_debug_layer {
            let layers = entry
                .enumerate_instance_layer_properties()
                .map_err(GfxError::CapabilityQuery)?;
            match adapter::select_validation_layer(config.validation_layer, &layers) {
                Some(layer) => enabled_layers.push(layer),
                // Optional capability; absence is tolerated.
                None => log::warn!(
                    "validation layer {:?} not present, continuing without it",
                    config.validation_layer
                ),
            }
        }

        let app_info = vk::ApplicationInfo::builder()
            .application_name(config.app_name)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(config.engine_name)
            .engine_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(vk::API_VERSION_1_1);

        let extension_ptrs: Vec<*const c_char> =
            enabled_extensions.iter().map(|e| e.as_ptr()).collect();
        let layer_ptrs: Vec<*const c_char> = enabled_layers.iter().map(|l| l.as_ptr()).collect();
        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extension_ptrs)
            .enabled_layer_names(&layer_ptrs);

        let raw = unsafe { entry.create_instance(&create_info, None) }
            .map_err(GfxError::InstanceCreation)?;

        let adapters = match fetch_all_adapters(&raw, &config.wanted_device_extensions) {
            Ok(adapters) => adapters,
            Err(err) => {
                unsafe { raw.destroy_instance(None) };
                return Err(err);
            }
        };
        log::info!("instance initialized, {} adapter(s) enumerated", adapters.len());

        let surface_fn = khr::Surface::new(entry, &raw);
        Ok(Self {
            raw,
            surface_fn,
            enabled_extensions,
            enabled_layers,
            adapters,
            children: ChildTracker::new(),
            alive: true,
        })
    }

    pub fn adapter_count(&self) -> usize {
        self.adapters.len()
    }

    /// Fetch one adapter descriptor; out-of-range indices are an error, not
    /// undefined behavior.
    pub fn adapter(&self, index: usize) -> Result<&Adapter, GfxError> {
        self.adapters.get(index).ok_or(GfxError::AdapterIndexOutOfBounds {
            index,
            count: self.adapters.len(),
        })
    }

    pub fn adapters(&self) -> &[Adapter] {
        &self.adapters
    }

    /// Instance extensions actually enabled, in wanted-list order.
    pub fn enabled_extensions(&self) -> &[&'static CStr] {
        &self.enabled_extensions
    }

    pub fn enabled_layers(&self) -> &[&'static CStr] {
        &self.enabled_layers
    }

    /// Release the runtime connection.
    ///
    /// Rejected while any [`Device`](super::device::Device) created from this
    /// instance is still alive; destruction must run in reverse creation
    /// order.
    pub fn destroy(&mut self) -> Result<(), GfxError> {
        if !self.alive {
            return Ok(());
        }
        let live = self.children.live();
        if live > 0 {
            return Err(GfxError::TeardownOrderViolation {
                parent: "Instance",
                live_children: live,
            });
        }
        // Adapter handles die with the instance.
        self.adapters.clear();
        unsafe { self.raw.destroy_instance(None) };
        self.alive = false;
        log::info!("instance destroyed");
        Ok(())
    }

    pub(crate) fn handle(&self) -> &ash::Instance {
        &self.raw
    }

    pub(crate) fn surface_fn(&self) -> &khr::Surface {
        &self.surface_fn
    }

    pub(crate) fn register_child(&self) -> ChildGuard {
        self.children.register()
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        if !self.alive {
            return;
        }
        let live = self.children.live();
        if live > 0 {
            // Freeing the VkInstance under a live device is undefined
            // behavior in the driver; leak the handle instead and make the
            // misuse loud.
            log::error!(
                "instance dropped while {} dependent object(s) are still alive; leaking VkInstance",
                live
            );
            return;
        }
        let _ = self.destroy();
    }
}

fn fetch_all_adapters(
    instance: &ash::Instance,
    wanted_device_extensions: &[&'static CStr],
) -> Result<Vec<Adapter>, GfxError> {
    let physical_devices =
        unsafe { instance.enumerate_physical_devices() }.map_err(GfxError::CapabilityQuery)?;
    physical_devices
        .into_iter()
        .map(|pd| Adapter::query(instance, pd, wanted_device_extensions))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tables_cover_surface_and_properties_query() {
        let config = InstanceConfig::default();
        assert!(config
            .wanted_instance_extensions
            .contains(&khr::Surface::name()));
        assert!(config
            .wanted_instance_extensions
            .contains(&vk::KhrGetPhysicalDeviceProperties2Fn::name()));
        assert!(config.wanted_device_extensions.contains(&khr::Swapchain::name()));
        assert!(!config.enable_debug_layer);
    }

    #[test]
    fn configs_are_independent_values() {
        let mut a = InstanceConfig::default();
        let b = InstanceConfig::default();
        a.wanted_instance_extensions.clear();
        assert!(!b.wanted_instance_extensions.is_empty());
    }
}
