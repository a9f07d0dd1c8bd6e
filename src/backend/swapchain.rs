// Swapchain - presentable image chain bound to a surface and device
//
// Policy is fixed: triple buffering + FIFO under vsync, double buffering +
// IMMEDIATE without; B8G8R8A8_UNORM in the sRGB-nonlinear color space is
// assumed universally supported and not queried. Every creation builds from
// scratch; there is no accelerated recreation path.

use ash::vk;

use super::device::Device;
use super::error::GfxError;

/// Clamp a requested extent into the surface's reported range.
pub fn clamp_extent(
    width: u32,
    height: u32,
    caps: &vk::SurfaceCapabilitiesKHR,
) -> vk::Extent2D {
    vk::Extent2D {
        width: width.clamp(caps.min_image_extent.width, caps.max_image_extent.width),
        height: height.clamp(caps.min_image_extent.height, caps.max_image_extent.height),
    }
}

/// Buffering depth: triple buffered with vsync, double buffered without.
pub fn min_image_count(enable_vsync: bool) -> u32 {
    if enable_vsync {
        3
    } else {
        2
    }
}

/// FIFO is strict vsync; IMMEDIATE presents unthrottled.
pub fn present_mode(enable_vsync: bool) -> vk::PresentModeKHR {
    if enable_vsync {
        vk::PresentModeKHR::FIFO
    } else {
        vk::PresentModeKHR::IMMEDIATE
    }
}

/// A created swapchain and the parameters it was built with.
///
/// Carries its own copy of the device-scoped swapchain dispatch so teardown
/// does not need the `Device` back.
pub struct Swapchain {
    raw: vk::SwapchainKHR,
    fns: ash::extensions::khr::Swapchain,
    format: vk::Format,
    color_space: vk::ColorSpaceKHR,
    extent: vk::Extent2D,
    min_image_count: u32,
    present_mode: vk::PresentModeKHR,
}

impl Swapchain {
    /// Build a swapchain for `surface`, clamping the requested size into the
    /// surface's capability range.
    pub(crate) fn create(
        device: &Device,
        surface: vk::SurfaceKHR,
        width: u32,
        height: u32,
        enable_vsync: bool,
    ) -> Result<Self, GfxError> {
        let caps = unsafe {
            device
                .surface_fn()
                .get_physical_device_surface_capabilities(device.physical_device(), surface)
        }
        .map_err(GfxError::CapabilityQuery)?;

        let extent = clamp_extent(width, height, &caps);
        let min_image_count = min_image_count(enable_vsync);
        let present_mode = present_mode(enable_vsync);
        let format = vk::Format::B8G8R8A8_UNORM;
        let color_space = vk::ColorSpaceKHR::SRGB_NONLINEAR;

        // The single graphics family both submits and presents; exclusive
        // sharing means no cross-family synchronization exists or is needed.
        let queue_family_indices = [device.graphics_queue_family()];
        let create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface)
            .min_image_count(min_image_count)
            .image_format(format)
            .image_color_space(color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .queue_family_indices(&queue_family_indices)
            .pre_transform(caps.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true);

        let raw = unsafe { device.swapchain_fn().create_swapchain(&create_info, None) }
            .map_err(GfxError::SwapchainCreation)?;

        log::info!(
            "swapchain created: {}x{}, {} image(s), {:?}",
            extent.width,
            extent.height,
            min_image_count,
            present_mode
        );

        Ok(Self {
            raw,
            fns: device.swapchain_fn().clone(),
            format,
            color_space,
            extent,
            min_image_count,
            present_mode,
        })
    }

    pub(crate) fn destroy(&mut self) {
        if self.raw != vk::SwapchainKHR::null() {
            unsafe { self.fns.destroy_swapchain(self.raw, None) };
            self.raw = vk::SwapchainKHR::null();
        }
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    pub fn format(&self) -> vk::Format {
        self.format
    }

    pub fn color_space(&self) -> vk::ColorSpaceKHR {
        self.color_space
    }

    pub fn min_image_count(&self) -> u32 {
        self.min_image_count
    }

    pub fn present_mode(&self) -> vk::PresentModeKHR {
        self.present_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(min: u32, max: u32) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            min_image_extent: vk::Extent2D {
                width: min,
                height: min,
            },
            max_image_extent: vk::Extent2D {
                width: max,
                height: max,
            },
            ..Default::default()
        }
    }

    #[test]
    fn extent_below_minimum_is_raised() {
        let extent = clamp_extent(50, 50, &caps(128, 4096));
        assert_eq!(extent.width, 128);
        assert_eq!(extent.height, 128);
    }

    #[test]
    fn extent_above_maximum_is_lowered() {
        let extent = clamp_extent(9000, 9000, &caps(128, 4096));
        assert_eq!(extent.width, 4096);
        assert_eq!(extent.height, 4096);
    }

    #[test]
    fn extent_in_range_is_unchanged() {
        let extent = clamp_extent(800, 600, &caps(128, 4096));
        assert_eq!(extent.width, 800);
        assert_eq!(extent.height, 600);
    }

    #[test]
    fn vsync_selects_triple_buffered_fifo() {
        assert_eq!(min_image_count(true), 3);
        assert_eq!(present_mode(true), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn no_vsync_selects_double_buffered_immediate() {
        assert_eq!(min_image_count(false), 2);
        assert_eq!(present_mode(false), vk::PresentModeKHR::IMMEDIATE);
    }
}
