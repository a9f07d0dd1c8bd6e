// =============================================================================
// BRING-UP DEMO - instance -> adapter -> device -> surface/swapchain
// =============================================================================
//
// Drives the full bootstrap sequence against a real driver and a winit
// window, logs what was negotiated, and tears everything down in strict
// reverse creation order on exit. No rendering happens here.

use anyhow::{Context, Result};
use ash::vk;
use std::sync::Arc;
use vk_bringup::config::Config;
use vk_bringup::{Device, DeviceConfig, Instance, InstanceConfig, RenderWindow};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowAttributes},
};

fn main() -> Result<()> {
    init_logging();

    let config = Config::load();
    log::info!("Starting Vulkan bring-up demo");
    log::info!(
        "Window: {}x{}, vsync {}",
        config.window.width,
        config.window.height,
        if config.graphics.vsync { "on" } else { "off" }
    );

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;
    Ok(())
}

fn init_logging() {
    use env_logger::Builder;
    use log::LevelFilter;

    let mut builder = Builder::from_default_env();
    builder.filter_level(LevelFilter::Info);
    builder.init();
}

/// All bring-up objects, declared in reverse creation order so the fallback
/// drop path also tears down window -> device -> instance.
struct Gfx {
    target: RenderWindow,
    device: Device,
    instance: Instance,
}

struct App {
    config: Config,
    window: Option<Arc<Window>>,
    gfx: Option<Gfx>,
}

impl App {
    fn new(config: Config) -> Self {
        Self {
            config,
            window: None,
            gfx: None,
        }
    }

    fn init_gfx(&mut self, window: Arc<Window>) -> Result<()> {
        // Validation only in debug builds, and only when configured.
        let enable_debug = cfg!(debug_assertions) && self.config.debug.validation_layers;
        let instance_config = InstanceConfig {
            enable_debug_layer: enable_debug,
            ..InstanceConfig::default()
        };
        let instance = Instance::initialize(&instance_config)?;

        for adapter in instance.adapters() {
            log::info!(
                "adapter: {:?} ({:?}), API {}.{}.{}, graphics family {:?}",
                adapter.name(),
                adapter.device_type(),
                vk::api_version_major(adapter.api_version()),
                vk::api_version_minor(adapter.api_version()),
                vk::api_version_patch(adapter.api_version()),
                adapter.graphics_queue_family(),
            );
        }

        let adapter_index =
            pick_adapter(&instance).context("no graphics-capable adapter found")?;
        log::info!(
            "selected adapter {}: {:?}",
            adapter_index,
            instance.adapter(adapter_index)?.name()
        );

        let device = Device::initialize(&instance, adapter_index, &DeviceConfig::default())?;
        let target = RenderWindow::initialize(window, &device, self.config.graphics.vsync)?;

        let extent = target.swapchain().extent();
        log::info!(
            "bring-up complete: {}x{} swapchain, {} image(s), {:?}",
            extent.width,
            extent.height,
            target.swapchain().min_image_count(),
            target.swapchain().present_mode(),
        );

        self.gfx = Some(Gfx {
            target,
            device,
            instance,
        });
        Ok(())
    }

    fn shutdown(&mut self) {
        let Some(mut gfx) = self.gfx.take() else {
            return;
        };
        // Strict reverse creation order: window, device, instance.
        if let Err(e) = gfx.target.destroy() {
            log::error!("window teardown failed: {e}");
        }
        if let Err(e) = gfx.device.destroy() {
            log::error!("device teardown failed: {e}");
        }
        if let Err(e) = gfx.instance.destroy() {
            log::error!("instance teardown failed: {e}");
        }
    }
}

/// Selection policy lives with the caller: prefer discrete over integrated
/// GPUs among adapters that can actually submit graphics work.
fn pick_adapter(instance: &Instance) -> Option<usize> {
    let mut best = None;
    let mut best_score = 0;
    for (index, adapter) in instance.adapters().iter().enumerate() {
        if adapter.graphics_queue_family().is_none() {
            continue;
        }
        let score = match adapter.device_type() {
            vk::PhysicalDeviceType::DISCRETE_GPU => 1000,
            vk::PhysicalDeviceType::INTEGRATED_GPU => 100,
            _ => 1,
        };
        if score > best_score {
            best_score = score;
            best = Some(index);
        }
    }
    best
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = WindowAttributes::default()
            .with_title(&self.config.window.title)
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {:?}", e);
                event_loop.exit();
                return;
            }
        };

        if let Err(e) = self.init_gfx(window.clone()) {
            log::error!("Bring-up failed: {:?}", e);
            event_loop.exit();
            return;
        }

        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, shutting down...");
                self.shutdown();
                event_loop.exit();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                use winit::keyboard::{KeyCode, PhysicalKey};

                if event.state.is_pressed()
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape)
                {
                    log::info!("ESC pressed, exiting...");
                    self.shutdown();
                    event_loop.exit();
                }
            }

            _ => {}
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.shutdown();
    }
}
