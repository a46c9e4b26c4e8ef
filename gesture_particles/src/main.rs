//! gesture_particles: interactive entry point.

use std::time::Duration;

use clap::Parser;
use gesture_particles::app::{run, run_headless, AppConfig};
use particle_shapes::{ColorTheme, ShapeType};

#[derive(Parser, Debug)]
#[command(name = "gesture_particles", version, about = "Hand-gesture controlled morphing particles")]
struct Cli {
    /// Initial shape: tree, sphere, heart or galaxy
    #[arg(long, default_value = "tree")]
    shape: ShapeType,

    /// Color theme: emerald, sunset, ocean or aurora
    #[arg(long, default_value = "emerald")]
    theme: ColorTheme,

    /// Number of particles
    #[arg(long, default_value_t = 3000)]
    particles: usize,

    /// Turn the camera on at startup
    #[arg(long)]
    camera: bool,

    /// Simulate a refused camera permission
    #[arg(long)]
    deny_camera: bool,

    /// Run FRAMES frames against a scripted hand without opening a window
    #[arg(long, value_name = "FRAMES")]
    headless: Option<u64>,

    /// Target frame rate
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Simulated model load time in milliseconds
    #[arg(long, default_value_t = 400)]
    warmup_ms: u64,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let cfg = AppConfig {
        shape:           cli.shape,
        theme:           cli.theme,
        particle_count:  cli.particles.max(1),
        fps:             cli.fps.clamp(1, 240),
        camera_on_start: cli.camera,
        deny_camera:     cli.deny_camera,
        model_warmup:    Duration::from_millis(cli.warmup_ms),
        ..AppConfig::default()
    };

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Gesture Particles — Hand-Controlled Morphing          ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    println!("  Shape: {}  Theme: {}  Particles: {}", cfg.shape, cfg.theme, cfg.particle_count);

    let result = match cli.headless {
        Some(frames) => {
            println!("  Mode: headless, {frames} frames");
            println!();
            run_headless(cfg, frames).map(|report| {
                println!("  Frames with a hand: {}/{}", report.with_hand, report.frames);
            })
        }
        None => {
            println!("  Mode: preview window (C = camera, hold F/O/P to gesture)");
            println!();
            run(cfg)
        }
    };

    if let Err(e) = result {
        log::error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
