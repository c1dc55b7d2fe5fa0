//! Chroma FX CLI - Inspect and play `.chroma` animation files.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::thread;
use std::time::{Duration, Instant};

use chroma_fx::{
    animation::{AnyAnimation, ColorFrame, read_animation},
    backend::LogBackend,
    engine::ChromaEngine,
    schema::EngineConfig,
};

const CONFIG_ENV: &str = "CHROMA_FX_CONFIG";

fn print_usage(program: &str) {
    eprintln!("Usage: {} <command> [args]", program);
    eprintln!();
    eprintln!("Inspect and play Chroma animation files.");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  inspect <file>                    Print device, frames and durations");
    eprintln!("  play <file> [seconds] [--loop]    Play through the logging backend (default: 5s)");
    eprintln!("  --example                         Print the default engine configuration");
    eprintln!();
    eprintln!("Set {} to a JSON file to override the engine configuration.", CONFIG_ENV);
    eprintln!("Set RUST_LOG=info to see the effects pushed to each device.");
}

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("--example") => print_example_config(),
        Some("inspect") if args.len() >= 3 => inspect(&args[2]),
        Some("play") if args.len() >= 3 => {
            let looping = args.iter().skip(3).any(|a| a == "--loop");
            let seconds: f32 = args
                .iter()
                .skip(3)
                .find(|a| !a.starts_with("--"))
                .and_then(|s| s.parse().ok())
                .filter(|s: &f32| s.is_finite() && *s >= 0.0)
                .unwrap_or(5.0);
            play(&args[2], seconds, looping);
        }
        _ => {
            print_usage(&args[0]);
            std::process::exit(1);
        }
    }
}

fn print_example_config() {
    let config = EngineConfig::default();
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing config: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_config() -> EngineConfig {
    let Ok(path) = std::env::var(CONFIG_ENV) else {
        return EngineConfig::default();
    };
    let json = fs::read_to_string(&path).unwrap_or_else(|e| {
        eprintln!("Error reading config file {}: {}", path, e);
        std::process::exit(1);
    });
    EngineConfig::from_json(&json).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    })
}

fn frame_durations(animation: &AnyAnimation) -> Vec<f32> {
    match animation {
        AnyAnimation::OneD(a) => a.frames().iter().map(ColorFrame::duration).collect(),
        AnyAnimation::TwoD(a) => a.frames().iter().map(ColorFrame::duration).collect(),
    }
}

fn inspect(path: &str) {
    let animation = read_animation(path).unwrap_or_else(|e| {
        eprintln!("Error reading animation: {}", e);
        std::process::exit(1);
    });
    let anim = animation.as_dyn();
    let durations = frame_durations(&animation);

    println!("Chroma Animation");
    println!("================");
    println!("File: {}", anim.name());
    println!("Device: {} ({:?})", anim.device(), anim.device_type());
    println!("LEDs: {}", anim.device().led_count());
    println!("Frames: {}", anim.frame_count());
    for (i, duration) in durations.iter().enumerate() {
        println!("  Frame {:>3}: {:.3}s", i, duration);
    }
    println!("Total: {:.3}s", durations.iter().sum::<f32>());
}

fn play(path: &str, seconds: f32, looping: bool) {
    let config = load_config();
    let engine = ChromaEngine::new(config, Box::new(LogBackend::new())).unwrap_or_else(|e| {
        eprintln!("Invalid engine configuration: {}", e);
        std::process::exit(1);
    });

    let Some(id) = engine.open(path) else {
        eprintln!("Error: could not open animation {}", path);
        std::process::exit(1);
    };
    let frames = engine.frame_count(id).unwrap_or(0);
    println!(
        "Playing {} ({} frames{}) for up to {:.1}s",
        path,
        frames,
        if looping { ", looping" } else { "" },
        seconds
    );

    if !engine.play(id, looping) {
        eprintln!("Error: animation did not start");
        std::process::exit(1);
    }

    let start = Instant::now();
    let limit = Duration::from_secs_f32(seconds);
    while engine.is_playing(id) && start.elapsed() < limit {
        thread::sleep(engine.config().tick_interval());
    }

    let finished = !engine.is_playing(id);
    engine.shutdown();
    println!(
        "{} after {:.2}s",
        if finished { "Finished" } else { "Stopped" },
        start.elapsed().as_secs_f32()
    );
}
