// Backend module - Vulkan bring-up layer
//
// Design: Thin wrapper around ash covering the bootstrap sequence only:
// loader -> instance -> adapter -> device -> surface/swapchain.
// Everything past bring-up (rendering, allocation) lives elsewhere.

pub mod adapter;
pub mod device;
pub mod error;
pub mod instance;
pub(crate) mod lifetime;
pub mod loader;
pub mod swapchain;
pub mod window;

pub use adapter::Adapter;
pub use device::{Device, DeviceConfig, Queue, MAX_QUEUES_PER_FAMILY};
pub use error::GfxError;
pub use instance::{Instance, InstanceConfig};
pub use swapchain::Swapchain;
pub use window::{RenderWindow, WindowState};
