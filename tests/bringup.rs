// End-to-end bring-up against a real driver.
//
// These tests need a working Vulkan runtime and at least one usable GPU, so
// they are ignored by default:
//
//     cargo test -- --ignored

use vk_bringup::backend::loader;
use vk_bringup::{Device, DeviceConfig, GfxError, Instance, InstanceConfig};

#[test]
#[ignore = "requires a Vulkan runtime"]
fn loader_is_idempotent() {
    let first = loader::ensure_loaded().expect("Vulkan runtime should load");
    assert!(loader::is_loaded());
    let second = loader::ensure_loaded().expect("second call must not re-load");
    assert!(std::ptr::eq(first, second));
}

#[test]
#[ignore = "requires a Vulkan runtime and a usable GPU"]
fn instance_enumerates_fully_queried_adapters() {
    let mut instance =
        Instance::initialize(&InstanceConfig::default()).expect("instance bring-up");

    assert!(instance.adapter_count() >= 1);
    for adapter in instance.adapters() {
        // Fully queryable by the time initialize() returns.
        assert!(!adapter.name().is_empty());
        if let Some(family) = adapter.graphics_queue_family() {
            assert!(family < adapter.queue_family_count());
        }
    }

    // Out-of-range access is an explicit error.
    let oob = instance.adapter(instance.adapter_count());
    assert!(matches!(oob, Err(GfxError::AdapterIndexOutOfBounds { .. })));

    instance.destroy().expect("orderly teardown");
}

#[test]
#[ignore = "requires a Vulkan runtime and a usable GPU"]
fn teardown_order_is_enforced() {
    let mut instance =
        Instance::initialize(&InstanceConfig::default()).expect("instance bring-up");

    let adapter_index = instance
        .adapters()
        .iter()
        .position(|a| a.graphics_queue_family().is_some())
        .expect("an adapter with a graphics queue");

    let mut device = Device::initialize(&instance, adapter_index, &DeviceConfig::default())
        .expect("device bring-up");

    // Destroying the instance while the device lives must be rejected.
    let premature = instance.destroy();
    assert!(matches!(
        premature,
        Err(GfxError::TeardownOrderViolation {
            parent: "Instance",
            live_children: 1,
        })
    ));

    // Reverse creation order succeeds.
    device.destroy().expect("device teardown");
    instance.destroy().expect("instance teardown");
}
