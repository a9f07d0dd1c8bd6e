// Window presentation target - surface + swapchain over a platform window
//
// The platform window itself comes from winit; this layer consumes only its
// raw handles and pixel size. Surface creation is platform-specific with no
// cross-platform fallback: an unmatched handle pair is a hard typed failure.

use std::sync::Arc;

use ash::extensions::khr;
use ash::vk;
use raw_window_handle::{
    HasDisplayHandle, HasWindowHandle, RawDisplayHandle, RawWindowHandle,
};
use winit::window::Window;

use super::device::Device;
use super::error::GfxError;
use super::lifetime::ChildGuard;
use super::loader;
use super::swapchain::Swapchain;

/// Per-window bring-up state machine. No resize/recreate transition exists;
/// callers tear down and rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Uninitialized,
    SurfaceCreated,
    SwapchainReady,
    Destroyed,
}

/// A presentable window: platform window handles, surface, swapchain.
///
/// Created after its device, destroyed before it.
pub struct RenderWindow {
    window: Arc<Window>,
    surface: vk::SurfaceKHR,
    swapchain: Swapchain,
    surface_fn: khr::Surface,
    state: WindowState,
    parent_guard: Option<ChildGuard>,
}

impl RenderWindow {
    /// Bind `window` to the device's instance as a surface, then build the
    /// swapchain for the window's current inner size.
    pub fn initialize(
        window: Arc<Window>,
        device: &Device,
        enable_vsync: bool,
    ) -> Result<Self, GfxError> {
        let size = window.inner_size();
        let surface = create_surface(device, window.as_ref())?;

        // SurfaceCreated -> SwapchainReady, unwinding the surface if the
        // second step fails: it must not outlive this call on the error path.
        let swapchain = match Swapchain::create(device, surface, size.width, size.height, enable_vsync)
        {
            Ok(swapchain) => swapchain,
            Err(err) => {
                unsafe { device.surface_fn().destroy_surface(surface, None) };
                return Err(err);
            }
        };

        Ok(Self {
            window,
            surface,
            swapchain,
            surface_fn: device.surface_fn().clone(),
            state: WindowState::SwapchainReady,
            parent_guard: Some(device.register_child()),
        })
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn swapchain(&self) -> &Swapchain {
        &self.swapchain
    }

    pub fn surface(&self) -> vk::SurfaceKHR {
        self.surface
    }

    /// The underlying platform window, still owned by the windowing layer.
    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    /// Destroy swapchain then surface. The platform window stays with its
    /// owner.
    pub fn destroy(&mut self) -> Result<(), GfxError> {
        if self.state == WindowState::Destroyed {
            return Ok(());
        }
        // Reverse creation order within the window as well.
        self.swapchain.destroy();
        unsafe { self.surface_fn.destroy_surface(self.surface, None) };
        self.surface = vk::SurfaceKHR::null();
        self.state = WindowState::Destroyed;
        self.parent_guard.take();
        log::info!("render window destroyed");
        Ok(())
    }
}

impl Drop for RenderWindow {
    fn drop(&mut self) {
        // While this guard is held the device refuses teardown, so the
        // VkDevice behind these handles has not been freed.
        let _ = self.destroy();
    }
}

/// Create a surface for the window's platform handle pair.
///
/// Only the handle kinds of the compile target are supported; anything else
/// is `UnsupportedPlatform`.
fn create_surface(device: &Device, window: &Window) -> Result<vk::SurfaceKHR, GfxError> {
    let entry = loader::ensure_loaded()?;
    let instance = device.instance_handle();

    let window_handle = window
        .window_handle()
        .map_err(|_| GfxError::UnsupportedPlatform)?
        .as_raw();
    let display_handle = window
        .display_handle()
        .map_err(|_| GfxError::UnsupportedPlatform)?
        .as_raw();

    match (display_handle, window_handle) {
        #[cfg(target_os = "windows")]
        (RawDisplayHandle::Windows(_), RawWindowHandle::Win32(handle)) => {
            let hinstance =
                handle.hinstance.map(|h| h.get()).unwrap_or(0) as *const std::ffi::c_void;
            let hwnd = handle.hwnd.get() as *const std::ffi::c_void;
            let create_info = vk::Win32SurfaceCreateInfoKHR::builder()
                .hinstance(hinstance)
                .hwnd(hwnd);
            let surface_fn = khr::Win32Surface::new(entry, instance);
            unsafe { surface_fn.create_win32_surface(&create_info, None) }
                .map_err(GfxError::SurfaceCreation)
        }

        #[cfg(any(
            target_os = "linux",
            target_os = "freebsd",
            target_os = "dragonfly",
            target_os = "netbsd",
            target_os = "openbsd"
        ))]
        (RawDisplayHandle::Xlib(display), RawWindowHandle::Xlib(handle)) => {
            let dpy = display
                .display
                .map(|d| d.as_ptr())
                .unwrap_or(std::ptr::null_mut());
            let create_info = vk::XlibSurfaceCreateInfoKHR::builder()
                .dpy(dpy as *mut _)
                .window(handle.window);
            let surface_fn = khr::XlibSurface::new(entry, instance);
            unsafe { surface_fn.create_xlib_surface(&create_info, None) }
                .map_err(GfxError::SurfaceCreation)
        }

        #[cfg(any(
            target_os = "linux",
            target_os = "freebsd",
            target_os = "dragonfly",
            target_os = "netbsd",
            target_os = "openbsd"
        ))]
        (RawDisplayHandle::Xcb(display), RawWindowHandle::Xcb(handle)) => {
            let connection = display
                .connection
                .map(|c| c.as_ptr())
                .unwrap_or(std::ptr::null_mut());
            let create_info = vk::XcbSurfaceCreateInfoKHR::builder()
                .connection(connection as *mut _)
                .window(handle.window.get());
            let surface_fn = khr::XcbSurface::new(entry, instance);
            unsafe { surface_fn.create_xcb_surface(&create_info, None) }
                .map_err(GfxError::SurfaceCreation)
        }

        #[cfg(any(
            target_os = "linux",
            target_os = "freebsd",
            target_os = "dragonfly",
            target_os = "netbsd",
            target_os = "openbsd"
        ))]
        (RawDisplayHandle::Wayland(display), RawWindowHandle::Wayland(handle)) => {
            let create_info = vk::WaylandSurfaceCreateInfoKHR::builder()
                .display(display.display.as_ptr() as *mut _)
                .surface(handle.surface.as_ptr() as *mut _);
            let surface_fn = khr::WaylandSurface::new(entry, instance);
            unsafe { surface_fn.create_wayland_surface(&create_info, None) }
                .map_err(GfxError::SurfaceCreation)
        }

        _ => Err(GfxError::UnsupportedPlatform),
    }
}
