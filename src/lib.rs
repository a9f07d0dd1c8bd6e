//! Vulkan bring-up layer.
//!
//! Sequences the four-object bootstrap needed before any rendering can
//! happen: instance, adapter, logical device, and a presentable window
//! surface with its swapchain. Capability negotiation is best-effort
//! (unsupported wanted extensions are dropped, a missing validation layer is
//! tolerated); driver failures surface as typed [`GfxError`] values instead
//! of aborting; teardown order is tracked and enforced as the strict reverse
//! of creation order.
//!
//! ```no_run
//! use std::sync::Arc;
//! use vk_bringup::{Device, DeviceConfig, Instance, InstanceConfig, RenderWindow};
//!
//! # fn bring_up(window: Arc<winit::window::Window>) -> Result<(), vk_bringup::GfxError> {
//! let mut instance = Instance::initialize(&InstanceConfig::default())?;
//! let mut device = Device::initialize(&instance, 0, &DeviceConfig::default())?;
//! let mut target = RenderWindow::initialize(window, &device, true)?;
//!
//! // ... render ...
//!
//! target.destroy()?;
//! device.destroy()?;
//! instance.destroy()?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;

pub use backend::{
    Adapter, Device, DeviceConfig, GfxError, Instance, InstanceConfig, Queue, RenderWindow,
    Swapchain, WindowState, MAX_QUEUES_PER_FAMILY,
};
