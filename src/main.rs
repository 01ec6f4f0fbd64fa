use anyhow::{bail, Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{debug, error, info, trace, warn};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use stereoplay::audio::{MonotonicTimeSource, SimulatedAudioSink, TimeSource};
use stereoplay::bus::{Command, LayoutState, ModeState, Notification};
use stereoplay::decoder::{SyntheticMedia, SyntheticSource};
use stereoplay::media::{StereoLayout, StereoMode};
use stereoplay::player::{Driver, MasterRegistry, PlaybackEngineBuilder, PlayerInitData};
use stereoplay::renderer::HeadlessVideoSink;
use stereoplay::utils::config::{Config, PlaybackConfig};
use stereoplay::utils::format_media_time;

/// stereoplay - stereoscopic playback engine, headless runner
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Media names to report; the built-in synthetic source is played
    #[arg(value_name = "URL")]
    urls: Vec<String>,

    /// Input stereo layout, e.g. left-right or separate-left-right
    #[arg(long, value_name = "LAYOUT")]
    input: Option<String>,

    /// Output stereo mode, e.g. red-cyan-dubois or mono-left
    #[arg(long, value_name = "MODE")]
    output: Option<String>,

    /// Swap left and right view
    #[arg(long)]
    swap_eyes: bool,

    /// Video stream number (1-based)
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    video: Option<u32>,

    /// Audio stream number (1-based)
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    audio: Option<u32>,

    /// Subtitle stream number (1-based)
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    subtitle: Option<u32>,

    /// Display frames as fast as possible, without audio
    #[arg(short, long)]
    benchmark: bool,

    /// Start in fullscreen mode
    #[arg(short, long)]
    fullscreen: bool,

    /// Center the output
    #[arg(short, long)]
    center: bool,

    /// Parallax adjustment, -1 to +1
    #[arg(long, allow_hyphen_values = true)]
    parallax: Option<f32>,

    /// Crosstalk levels r,g,b, each 0 to 1
    #[arg(long, value_name = "R,G,B", value_parser = parse_crosstalk)]
    crosstalk: Option<[f32; 3]>,

    /// Amount of crosstalk ghostbusting, 0 to 1
    #[arg(long)]
    ghostbust: Option<f32>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Configuration file to use instead of the system and user files
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Length of the synthetic media in seconds
    #[arg(long, default_value = "10")]
    duration: f64,

    /// Frame rate of the synthetic media
    #[arg(long, default_value = "25", value_parser = clap::value_parser!(u32).range(1..))]
    fps: u32,

    /// Number of audio streams of the synthetic media
    #[arg(long, default_value = "1")]
    audio_streams: usize,

    /// Number of subtitle streams of the synthetic media
    #[arg(long, default_value = "1")]
    subtitle_streams: usize,

    /// Do not read key commands from standard input
    #[arg(long)]
    no_input: bool,
}

fn parse_crosstalk(s: &str) -> std::result::Result<[f32; 3], String> {
    let levels: Vec<f32> = s
        .split(',')
        .map(|v| v.trim().parse::<f32>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| format!("invalid crosstalk level: {}", e))?;
    levels
        .try_into()
        .map_err(|_| "expected three comma separated levels".to_string())
}

/// Map a key name read from standard input to a command
fn key_command(key: &str, steps: &PlaybackConfig) -> Option<Command> {
    let seek = |seconds: u32, sign: f32| Command::Seek(sign * seconds as f32);
    let command = match key {
        "q" | "escape" => Command::TogglePlay,
        "p" | "space" => Command::TogglePause,
        "v" => Command::CycleVideoStream,
        "a" => Command::CycleAudioStream,
        "s" => Command::CycleSubtitleStream,
        "e" => Command::ToggleStereoModeSwap,
        "f" => Command::ToggleFullscreen,
        "c" => Command::Center,
        "1" => Command::AdjustContrast(-0.05),
        "2" => Command::AdjustContrast(0.05),
        "3" => Command::AdjustBrightness(-0.05),
        "4" => Command::AdjustBrightness(0.05),
        "5" => Command::AdjustHue(-0.05),
        "6" => Command::AdjustHue(0.05),
        "7" => Command::AdjustSaturation(-0.05),
        "8" => Command::AdjustSaturation(0.05),
        "(" => Command::AdjustParallax(-0.01),
        ")" => Command::AdjustParallax(0.01),
        "<" => Command::AdjustGhostbust(-0.01),
        ">" => Command::AdjustGhostbust(0.01),
        "left" => seek(steps.seek_small, -1.0),
        "right" => seek(steps.seek_small, 1.0),
        "down" => seek(steps.seek_medium, -1.0),
        "up" => seek(steps.seek_medium, 1.0),
        "pagedown" => seek(steps.seek_large, -1.0),
        "pageup" => seek(steps.seek_large, 1.0),
        _ => return None,
    };
    Some(command)
}

/// Forward key commands from standard input to the master player
fn spawn_key_reader(steps: PlaybackConfig) -> Result<()> {
    thread::Builder::new()
        .name("stereoplay-keys".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                let key = line.trim().to_lowercase();
                match key_command(&key, &steps) {
                    Some(command) => {
                        if let Err(e) = MasterRegistry::global().send_command(command) {
                            debug!("Key '{}' not delivered: {}", key, e);
                            break;
                        }
                    }
                    None if key.is_empty() => {}
                    None => warn!("Unknown key '{}'", key),
                }
            }
        })
        .context("Failed to start key reader")?;
    Ok(())
}

fn log_notification(notification: &Notification) {
    match notification {
        Notification::Pos(change) => trace!("Position {:.3}", change.current),
        Notification::Play(change) if !change.current => info!("Playback stopped"),
        Notification::Pause(change) => {
            info!("{}", if change.current { "Paused" } else { "Resumed" })
        }
        other => info!("{}: {:?}", other.kind(), other),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?,
        None => Config::load().context("Failed to load configuration")?,
    };

    let log_level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.general.log_level.clone());
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level.as_str()))
        .format_timestamp_millis()
        .init();

    info!("Starting stereoplay v{}", env!("CARGO_PKG_VERSION"));

    if !args.duration.is_finite() || args.duration <= 0.0 {
        bail!("Duration must be a positive number of seconds");
    }

    let input = args
        .input
        .as_deref()
        .map(StereoLayout::from_name)
        .transpose()?
        .map(|(layout, swap)| LayoutState { layout, swap });
    let output = args
        .output
        .as_deref()
        .map(StereoMode::from_name)
        .transpose()?
        .map(|(mode, swap)| ModeState {
            mode,
            swap: swap ^ args.swap_eyes,
        });

    let mut params = config.parameters.clone();
    if let Some(parallax) = args.parallax {
        params.set_parallax(parallax);
    }
    if let Some(crosstalk) = args.crosstalk {
        params.set_crosstalk(crosstalk);
    }
    if let Some(ghostbust) = args.ghostbust {
        params.set_ghostbust(ghostbust);
    }

    let urls = if args.urls.is_empty() {
        vec!["synthetic:".to_string()]
    } else {
        args.urls.clone()
    };
    let init = PlayerInitData {
        log_level,
        urls,
        video_stream: args.video.map_or(0, |n| n as usize - 1),
        audio_stream: args.audio.map_or(0, |n| n as usize - 1),
        subtitle_stream: args.subtitle.map(|n| n as usize - 1),
        benchmark: args.benchmark || config.playback.benchmark,
        fullscreen: args.fullscreen,
        center: args.center,
        stereo_layout_override: input,
        stereo_mode_override: output,
        params,
    };

    let mut media = SyntheticMedia::new((args.duration * 1e6) as i64, args.fps)
        .with_audio_streams(args.audio_streams)
        .with_subtitle_streams(args.subtitle_streams);
    if let Some(layout) = input {
        media = media.with_stereo_layout(layout.layout, layout.swap);
        if layout.layout.is_separate() {
            media = media.with_video_streams(2);
        }
    }

    let time: Arc<dyn TimeSource> = Arc::new(MonotonicTimeSource::new());
    let mut engine = PlaybackEngineBuilder::new(SyntheticSource::new(media))
        .with_audio_sink(SimulatedAudioSink::new(Arc::clone(&time)))
        .with_video_sink(HeadlessVideoSink::new())
        .with_time_source(time)
        .build();
    let _subscription = engine.subscribe(log_notification);

    engine.make_master(MasterRegistry::global().claim()?);
    engine.open(&init).context("Failed to open media")?;
    if args.swap_eyes && output.is_none() {
        engine.receive_command(Command::ToggleStereoModeSwap)?;
    }

    let handle = Driver::spawn(engine)?;
    if !args.no_input {
        spawn_key_reader(config.playback.clone())?;
    }

    let started = std::time::Instant::now();
    if let Err(e) = handle.join() {
        error!("Playback failed: {}", e);
        return Err(e.into());
    }
    info!(
        "Finished after {}",
        format_media_time(started.elapsed().as_micros() as i64)
    );
    Ok(())
}
