// Bring-up error type
//
// Two failure tiers: driver calls that fail return the VkResult they failed
// with; misuse of the layer itself (bad index, too many queues, out-of-order
// teardown) gets its own variant. Nothing in this module aborts the process.

use ash::vk;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GfxError {
    /// The Vulkan runtime library could not be loaded.
    #[error("failed to load the Vulkan runtime: {0}")]
    Loader(String),

    /// An enumeration/capability query against the driver failed.
    #[error("capability query failed: {0}")]
    CapabilityQuery(#[source] vk::Result),

    #[error("instance creation failed: {0}")]
    InstanceCreation(#[source] vk::Result),

    #[error("logical device creation failed: {0}")]
    DeviceCreation(#[source] vk::Result),

    #[error("surface creation failed: {0}")]
    SurfaceCreation(#[source] vk::Result),

    #[error("swapchain creation failed: {0}")]
    SwapchainCreation(#[source] vk::Result),

    /// No surface backend exists for the compile target / window handle pair.
    #[error("no surface backend for this platform")]
    UnsupportedPlatform,

    /// The chosen adapter exposes no queue family with graphics support.
    #[error("adapter {adapter:?} has no graphics-capable queue family")]
    NoGraphicsQueue { adapter: String },

    #[error("adapter index {index} out of bounds ({count} adapters enumerated)")]
    AdapterIndexOutOfBounds { index: usize, count: usize },

    /// The fixed queue-priority table bounds how many queues one family may
    /// request at once.
    #[error("requested {requested} queues from one family, supported range is 1..={max}")]
    QueueCountExceeded { requested: u32, max: u32 },

    /// A parent object was asked to tear down while dependents still exist.
    #[error("{parent} destroyed while {live_children} dependent object(s) are still alive")]
    TeardownOrderViolation {
        parent: &'static str,
        live_children: usize,
    },
}
