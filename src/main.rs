mod asset;
mod config;
#[cfg(unix)]
mod control;
mod display;
mod geometry;
mod input;
mod session;
mod sprite;
mod util;

use config::{print_usage, Cli, Config};
use display::{Display, PixelBuffer, RenderTarget};
use session::{Session, COLORKEY};
use sprite::SpriteSheet;
use std::ops::ControlFlow;
use std::thread;
use std::time::{Duration, Instant};
use util::FpsCounter;

const STATS_INTERVAL: Duration = Duration::from_secs(5);

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match Config::from_args(&args)? {
        Cli::Run(config) => config,
        Cli::Help => {
            print_usage();
            return Ok(());
        },
    };

    run(&config).map_err(|e| {
        log::error!("{}", e);
        e
    })
}

fn load_base_sheet(config: &Config, format: display::PixelFormat) -> Result<PixelBuffer, String> {
    if config.builtin_sheet {
        let size = asset::BUILTIN_FRAME_SIZE;
        log::info!("Using generated sheet ({}x{} cells of {}px)", config.cols, config.rows, size);
        asset::generate_sheet(config.cols, config.rows, size, size, format)
    } else {
        asset::load_sheet(&config.sheet, format)
    }
}

fn run(config: &Config) -> Result<(), String> {
    let (mut display, texture_creator) = Display::with_options(
        "Tag Bounce",
        config.width,
        config.height,
        config.vsync,
        config.fullscreen,
    )?;
    let (width, height) = (display.width(), display.height());

    let native = display.native_format();
    let format = config.pixel_format.resolve(native);
    log::info!(
        "Display {}x{}  native {}  framebuffer {}",
        width,
        height,
        native.map_or("unknown", |f| f.name()),
        format.name()
    );

    let mut target = RenderTarget::with_size(&texture_creator, width, height, format)?;
    let mut screen = PixelBuffer::try_with_size(width, height, format)?;

    let base = load_base_sheet(config, format)?;
    let sheet = SpriteSheet::build(base, config.cols, config.rows, COLORKEY)?;
    let mut session = Session::new(sheet, &screen, config);
    session.log_state();

    #[cfg(unix)]
    let controller = if config.remote {
        Some(control::Controller::new()?)
    } else {
        None
    };

    println!("=== tag_bounce ===");
    println!("Use --help for command line options.");
    input::print_controls();

    let mut fps_counter = FpsCounter::new(60);
    let mut last_stats = Instant::now();
    let sleep = Duration::from_millis(config.sleep_ms);
    // Millisecond tick clock; the first tick sees (almost) zero elapsed time
    let start = Instant::now();
    let mut last_ms = 0u64;
    let mut dropped = 0u32;

    'main: loop {
        #[allow(unused_mut)]
        let mut commands: Vec<_> = display
            .poll_events()
            .iter()
            .filter_map(input::command_for_event)
            .collect();
        #[cfg(unix)]
        if let Some(controller) = &controller {
            commands.extend(controller.poll());
        }
        for command in commands {
            if session.handle_command(command) == ControlFlow::Break(()) {
                break 'main;
            }
        }

        let now_ms = start.elapsed().as_millis() as u64;
        let elapsed_ms = now_ms.saturating_sub(last_ms).min(u64::from(u32::MAX)) as u32;
        last_ms = now_ms;
        let avg_fps = fps_counter.tick();
        let report = session.tick(elapsed_ms, &mut screen);
        if !report.drawn {
            dropped += 1;
        } else if report.bounce.any() {
            log::trace!(
                "Bounce {:?} frame {} src {:?} at {:?} via {:?}",
                report.bounce,
                report.frame,
                report.src,
                report.dst,
                report.path
            );
        }

        if let Err(e) = display.present(&mut target, &screen) {
            log::warn!("Present failed: {}", e);
        }

        if last_stats.elapsed() >= STATS_INTERVAL {
            let (min_fps, max_fps) = fps_counter.min_max_fps();
            log::debug!(
                "FPS {:.1} avg  {:.1} min  {:.1} max  {:.1}ms  dropped {}",
                avg_fps,
                min_fps,
                max_fps,
                fps_counter.avg_frame_time_ms(),
                dropped
            );
            last_stats = Instant::now();
            dropped = 0;
        }

        thread::sleep(sleep);
    }

    log::info!("Exiting");
    Ok(())
}
