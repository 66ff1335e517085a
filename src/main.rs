use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use sdl_video::config;
use sdl_video::logging;
use sdl_video::render::RendererFlags;
use sdl_video::video::{WINDOWPOS_CENTERED, WINDOWPOS_UNDEFINED};
use sdl_video::{Cli, Color, DriverRegistry, EventQueue, InitFlags, Rect, VideoDevice, WindowFlags};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_level());

    let registry = DriverRegistry::default();
    if cli.list_drivers {
        for index in 0..registry.num_drivers() {
            if let Some(name) = registry.driver_name(index) {
                println!("{}", name);
            }
        }
        return Ok(());
    }

    let config = config::load_config(cli.config.as_deref())?;
    let config = cli.merge_into_config(config)?;

    let mut flags = InitFlags::empty();
    if config.event_thread {
        flags |= InitFlags::EVENT_THREAD;
    }
    let events = EventQueue::new();
    let mut device = VideoDevice::init(
        &registry,
        config.driver.as_deref(),
        flags,
        Box::new(events.clone()),
    )
    .context("Failed to initialize video")?;
    config.apply(&mut device)?;

    report_displays(&mut device);
    draw_frame(&mut device, &cli, &config)?;

    device.pump_events();
    for event in events.drain() {
        info!("Event: {:?}", event);
    }
    device.quit();
    Ok(())
}

fn report_displays(device: &mut VideoDevice) {
    println!("Video driver: {}", device.current_driver());
    for index in 0..device.num_displays() {
        let Ok(index) = i32::try_from(index) else {
            break;
        };
        if let Err(err) = device.select_display(index) {
            warn!("Skipping display {}: {}", index, err);
            continue;
        }
        if let Ok(desktop) = device.desktop_display_mode() {
            println!("Display {}: desktop {}", index, desktop);
        }
        for mode in 0..device.num_display_modes() {
            if let Ok(mode) = device.display_mode(mode) {
                println!("  {}", mode);
            }
        }
        for driver in 0..device.num_render_drivers() {
            if let Ok(info) = device.render_driver_info(driver) {
                println!("  renderer '{}' {:?}", info.name, info.flags);
            }
        }
    }
}

fn draw_frame(device: &mut VideoDevice, cli: &Cli, config: &sdl_video::VideoConfig) -> Result<()> {
    if let Some(display) = config.display {
        let index = i32::try_from(display).context("Display index too large")?;
        device.select_display(index)?;
    }

    let (w, h) = match &config.fullscreen_mode {
        Some(mode) => {
            let mode = config::parse_mode(mode)?;
            (mode.w, mode.h)
        }
        None => (640, 480),
    };
    let mut flags = WindowFlags::SHOWN;
    let (x, y) = if cli.fullscreen {
        flags |= WindowFlags::FULLSCREEN;
        (WINDOWPOS_UNDEFINED, WINDOWPOS_UNDEFINED)
    } else {
        (WINDOWPOS_CENTERED, WINDOWPOS_CENTERED)
    };

    let window = device
        .create_window(Some("sdlvideo"), x, y, w, h, flags)
        .context("Failed to create window")?;
    device
        .create_renderer(window, None, RendererFlags::empty())
        .context("Failed to create renderer")?;
    let info = device.renderer_info(window)?;
    info!("Rendering with '{}'", info.name);

    device.render_fill(None, Color::new(0x20, 0x20, 0x40, 0xFF))?;
    device.render_fill(Some(&Rect::new(w / 4, h / 4, w / 2, h / 2)), Color::new(0xE0, 0x80, 0x20, 0xFF))?;
    device.render_present()?;
    println!("Presented one {}x{} frame in window {}", w, h, window);

    device.destroy_window(window)?;
    Ok(())
}
