// Adapter - one physical GPU as the driver reports it
//
// Populated entirely during instance bring-up and read-only afterwards:
// cached properties, the device extensions we can enable, and the queue
// family that will carry graphics submissions.

use std::ffi::CStr;

use ash::vk;

use super::error::GfxError;

/// Read-only descriptor of one physical device.
///
/// Owned by the [`Instance`](super::instance::Instance) that enumerated it;
/// handles stay valid only while that instance lives.
pub struct Adapter {
    physical_device: vk::PhysicalDevice,
    name: String,
    properties: vk::PhysicalDeviceProperties,
    device_extensions: Vec<&'static CStr>,
    device_layers: Vec<&'static CStr>,
    graphics_queue_family: Option<u32>,
    queue_family_count: u32,
}

impl Adapter {
    /// Run the full per-adapter discovery: properties, extension filtering,
    /// queue family selection.
    pub(crate) fn query(
        instance: &ash::Instance,
        physical_device: vk::PhysicalDevice,
        wanted_extensions: &[&'static CStr],
    ) -> Result<Self, GfxError> {
        // Extended-properties query; the instance was created with API 1.1 so
        // the 2-suffixed entry point is always available.
        let mut props2 = vk::PhysicalDeviceProperties2::default();
        unsafe { instance.get_physical_device_properties2(physical_device, &mut props2) };
        let properties = props2.properties;
        let name = unsafe { CStr::from_ptr(properties.device_name.as_ptr()) }
            .to_string_lossy()
            .into_owned();

        let supported = unsafe { instance.enumerate_device_extension_properties(physical_device) }
            .map_err(GfxError::CapabilityQuery)?;
        let device_extensions = select_supported_extensions(wanted_extensions, &supported);

        let families =
            unsafe { instance.get_physical_device_queue_family_properties(physical_device) };
        let graphics_queue_family = select_graphics_queue_family(&families);

        log::info!(
            "adapter {:?}: {} wanted device extension(s) available, graphics queue family {:?}",
            name,
            device_extensions.len(),
            graphics_queue_family
        );

        Ok(Self {
            physical_device,
            name,
            properties,
            device_extensions,
            device_layers: Vec::new(),
            graphics_queue_family,
            queue_family_count: families.len() as u32,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn device_type(&self) -> vk::PhysicalDeviceType {
        self.properties.device_type
    }

    pub fn limits(&self) -> &vk::PhysicalDeviceLimits {
        &self.properties.limits
    }

    pub fn api_version(&self) -> u32 {
        self.properties.api_version
    }

    /// Device extensions that were both wanted and reported as supported,
    /// in wanted-list order.
    pub fn device_extensions(&self) -> &[&'static CStr] {
        &self.device_extensions
    }

    /// Device layers to enable (empty; kept for the creation call shape).
    pub fn device_layers(&self) -> &[&'static CStr] {
        &self.device_layers
    }

    /// Queue family selected for graphics submission, `None` when no family
    /// on this adapter reports graphics support.
    pub fn graphics_queue_family(&self) -> Option<u32> {
        self.graphics_queue_family
    }

    pub fn queue_family_count(&self) -> u32 {
        self.queue_family_count
    }

    pub(crate) fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }
}

/// Intersect a wanted extension list with what the runtime reports.
///
/// The result preserves wanted-list order. A wanted extension the runtime
/// does not support is dropped silently; capability negotiation here is
/// best-effort, never an error.
pub fn select_supported_extensions(
    wanted: &[&'static CStr],
    supported: &[vk::ExtensionProperties],
) -> Vec<&'static CStr> {
    wanted
        .iter()
        .copied()
        .filter(|wanted_ext| {
            supported
                .iter()
                .any(|s| unsafe { CStr::from_ptr(s.extension_name.as_ptr()) } == *wanted_ext)
        })
        .collect()
}

/// Return the layer name if it appears in the supported set.
pub fn select_validation_layer(
    wanted: &'static CStr,
    supported: &[vk::LayerProperties],
) -> Option<&'static CStr> {
    supported
        .iter()
        .any(|l| unsafe { CStr::from_ptr(l.layer_name.as_ptr()) } == wanted)
        .then_some(wanted)
}

/// Pick the queue family for graphics submission.
///
/// Linear scan without early exit: when several families qualify, the last
/// enumerated one wins.
pub fn select_graphics_queue_family(families: &[vk::QueueFamilyProperties]) -> Option<u32> {
    let mut selected = None;
    for (index, family) in families.iter().enumerate() {
        if family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
            selected = Some(index as u32);
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::raw::c_char;

    fn ext(name: &CStr) -> vk::ExtensionProperties {
        let mut props = vk::ExtensionProperties::default();
        for (dst, src) in props.extension_name.iter_mut().zip(name.to_bytes_with_nul()) {
            *dst = *src as c_char;
        }
        props
    }

    fn layer(name: &CStr) -> vk::LayerProperties {
        let mut props = vk::LayerProperties::default();
        for (dst, src) in props.layer_name.iter_mut().zip(name.to_bytes_with_nul()) {
            *dst = *src as c_char;
        }
        props
    }

    fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        }
    }

    #[test]
    fn selection_is_an_intersection() {
        let wanted: [&'static CStr; 3] = [c"VK_KHR_surface", c"VK_KHR_swapchain", c"VK_EXT_absent"];
        let supported = [ext(c"VK_KHR_swapchain"), ext(c"VK_KHR_surface"), ext(c"VK_EXT_other")];

        let enabled = select_supported_extensions(&wanted, &supported);

        // Subset of both sides, in wanted-list order.
        assert_eq!(enabled, [c"VK_KHR_surface", c"VK_KHR_swapchain"]);
        for name in &enabled {
            assert!(wanted.contains(name));
            assert!(supported
                .iter()
                .any(|s| unsafe { CStr::from_ptr(s.extension_name.as_ptr()) } == *name));
        }
    }

    #[test]
    fn unsupported_wanted_extension_is_dropped_silently() {
        let wanted: [&'static CStr; 1] = [c"VK_EXT_absent"];
        let enabled = select_supported_extensions(&wanted, &[ext(c"VK_KHR_surface")]);
        assert!(enabled.is_empty());
    }

    #[test]
    fn validation_layer_enabled_only_when_present() {
        let name: &'static CStr = c"VK_LAYER_KHRONOS_validation";
        assert_eq!(select_validation_layer(name, &[layer(name)]), Some(name));
        assert_eq!(select_validation_layer(name, &[layer(c"VK_LAYER_other")]), None);
        assert_eq!(select_validation_layer(name, &[]), None);
    }

    #[test]
    fn last_graphics_family_wins() {
        let families = [
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::TRANSFER),
        ];
        assert_eq!(select_graphics_queue_family(&families), Some(2));
    }

    #[test]
    fn no_graphics_family_is_explicit() {
        let families = [family(vk::QueueFlags::COMPUTE), family(vk::QueueFlags::TRANSFER)];
        assert_eq!(select_graphics_queue_family(&families), None);
        assert_eq!(select_graphics_queue_family(&[]), None);
    }
}
