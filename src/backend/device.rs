// Device - logical handle onto one adapter
//
// Responsibilities:
// - Single graphics queue creation with uniform priority
// - Enabling the extension/layer lists the adapter already filtered
// - Per-device dispatch: ash::Device plus the swapchain loader are bound to
//   this specific VkDevice, so multiple devices keep separate tables

use ash::extensions::khr;
use ash::vk;

use super::error::GfxError;
use super::instance::Instance;
use super::lifetime::{ChildGuard, ChildTracker};

/// Hard ceiling on queues requested from one family at once; the length of
/// the uniform priority table handed to the driver.
pub const MAX_QUEUES_PER_FAMILY: u32 = 64;

// Queue scheduling priority. Uniform 1.0 for every slot; the parameter is
// effectively ignored.
const QUEUE_PRIORITIES: [f32; MAX_QUEUES_PER_FAMILY as usize] =
    [1.0; MAX_QUEUES_PER_FAMILY as usize];

/// Queue request for device creation.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Queues to open on the graphics family. Must stay within
    /// `1..=MAX_QUEUES_PER_FAMILY`.
    pub queue_count: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self { queue_count: 1 }
    }
}

impl DeviceConfig {
    fn validate(&self) -> Result<(), GfxError> {
        if self.queue_count == 0 || self.queue_count > MAX_QUEUES_PER_FAMILY {
            return Err(GfxError::QueueCountExceeded {
                requested: self.queue_count,
                max: MAX_QUEUES_PER_FAMILY,
            });
        }
        Ok(())
    }
}

/// Opaque handle to a logical queue. Passive descriptor for now.
pub struct Queue {
    raw: vk::Queue,
}

impl Queue {
    pub fn raw(&self) -> vk::Queue {
        self.raw
    }
}

/// Logical device created from one adapter.
///
/// Must be destroyed before the instance it came from; windows derived from
/// it must be destroyed first in turn.
pub struct Device {
    raw: ash::Device,
    swapchain_fn: khr::Swapchain,
    surface_fn: khr::Surface,
    instance_handle: ash::Instance,
    physical_device: vk::PhysicalDevice,
    graphics_queue_family: u32,
    queue: Queue,
    children: ChildTracker,
    parent_guard: Option<ChildGuard>,
    alive: bool,
}

impl Device {
    /// Open a logical device on the adapter at `adapter_index`.
    ///
    /// The extension and layer lists are taken from the adapter as filtered
    /// during instance bring-up and are not re-validated here.
    pub fn initialize(
        instance: &Instance,
        adapter_index: usize,
        config: &DeviceConfig,
    ) -> Result<Self, GfxError> {
        config.validate()?;
        let adapter = instance.adapter(adapter_index)?;
        let graphics_queue_family =
            adapter
                .graphics_queue_family()
                .ok_or_else(|| GfxError::NoGraphicsQueue {
                    adapter: adapter.name().to_owned(),
                })?;

        let queue_priorities = &QUEUE_PRIORITIES[..config.queue_count as usize];
        let queue_info = vk::DeviceQueueCreateInfo::builder()
            .queue_family_index(graphics_queue_family)
            .queue_priorities(queue_priorities)
            .build();

        let features = vk::PhysicalDeviceFeatures::default();
        let extension_ptrs: Vec<_> = adapter.device_extensions().iter().map(|e| e.as_ptr()).collect();
        let layer_ptrs: Vec<_> = adapter.device_layers().iter().map(|l| l.as_ptr()).collect();
        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(std::slice::from_ref(&queue_info))
            .enabled_extension_names(&extension_ptrs)
            .enabled_layer_names(&layer_ptrs)
            .enabled_features(&features);

        let raw = unsafe {
            instance
                .handle()
                .create_device(adapter.physical_device(), &create_info, None)
        }
        .map_err(GfxError::DeviceCreation)?;

        let queue = Queue {
            raw: unsafe { raw.get_device_queue(graphics_queue_family, 0) },
        };
        // Device-scoped dispatch for the swapchain extension, bound to this
        // VkDevice.
        let swapchain_fn = khr::Swapchain::new(instance.handle(), &raw);

        log::info!(
            "device initialized on adapter {:?} (queue family {})",
            adapter.name(),
            graphics_queue_family
        );

        Ok(Self {
            raw,
            swapchain_fn,
            surface_fn: instance.surface_fn().clone(),
            instance_handle: instance.handle().clone(),
            physical_device: adapter.physical_device(),
            graphics_queue_family,
            queue,
            children: ChildTracker::new(),
            parent_guard: Some(instance.register_child()),
            alive: true,
        })
    }

    pub fn graphics_queue(&self) -> &Queue {
        &self.queue
    }

    pub fn graphics_queue_family(&self) -> u32 {
        self.graphics_queue_family
    }

    /// Release the logical device.
    ///
    /// Rejected while a [`RenderWindow`](super::window::RenderWindow) created
    /// from this device is still alive.
    pub fn destroy(&mut self) -> Result<(), GfxError> {
        if !self.alive {
            return Ok(());
        }
        let live = self.children.live();
        if live > 0 {
            return Err(GfxError::TeardownOrderViolation {
                parent: "Device",
                live_children: live,
            });
        }
        unsafe { self.raw.destroy_device(None) };
        self.alive = false;
        self.parent_guard.take();
        log::info!("device destroyed");
        Ok(())
    }

    pub(crate) fn handle(&self) -> &ash::Device {
        &self.raw
    }

    pub(crate) fn instance_handle(&self) -> &ash::Instance {
        &self.instance_handle
    }

    pub(crate) fn surface_fn(&self) -> &khr::Surface {
        &self.surface_fn
    }

    pub(crate) fn swapchain_fn(&self) -> &khr::Swapchain {
        &self.swapchain_fn
    }

    pub(crate) fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    pub(crate) fn register_child(&self) -> ChildGuard {
        self.children.register()
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        if !self.alive {
            return;
        }
        let live = self.children.live();
        if live > 0 {
            // Leak the VkDevice rather than free it under a live window, and
            // keep the instance's child count pinned so it refuses teardown
            // too.
            log::error!(
                "device dropped while {} dependent object(s) are still alive; leaking VkDevice",
                live
            );
            if let Some(guard) = self.parent_guard.take() {
                guard.leak();
            }
            return;
        }
        let _ = self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_requests_one_queue() {
        let config = DeviceConfig::default();
        assert_eq!(config.queue_count, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn queue_count_ceiling_is_enforced() {
        let config = DeviceConfig {
            queue_count: MAX_QUEUES_PER_FAMILY + 1,
        };
        assert!(matches!(
            config.validate(),
            Err(GfxError::QueueCountExceeded { requested, max })
                if requested == MAX_QUEUES_PER_FAMILY + 1 && max == MAX_QUEUES_PER_FAMILY
        ));
    }

    #[test]
    fn zero_queues_is_rejected() {
        let config = DeviceConfig { queue_count: 0 };
        assert!(matches!(
            config.validate(),
            Err(GfxError::QueueCountExceeded { .. })
        ));
    }

    #[test]
    fn ceiling_itself_is_allowed() {
        let config = DeviceConfig {
            queue_count: MAX_QUEUES_PER_FAMILY,
        };
        assert!(config.validate().is_ok());
    }
}
