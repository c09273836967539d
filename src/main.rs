/* Square-wave queue feeder.
Opens the default output device and tops its queue up once per frame while the
terminal loop handles input. `bounce` renders the same loop offline to a WAV file.
*/

use std::io::{self, Write};
#[cfg(feature = "bounce")]
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType},
};

use tonequeue::config::{
    ToneConfig, DEFAULT_AMPLITUDE, DEFAULT_CHANNELS, DEFAULT_FPS, DEFAULT_LATENCY_DIVISOR,
    DEFAULT_SAMPLE_RATE, DEFAULT_TONE_HZ,
};
use tonequeue::error::AudioError;
use tonequeue::feeder::FeedState;
use tonequeue::frame_loop::{FrameClock, FrameLoop, FrameReport};
use tonequeue::input::action_for_key;
use tonequeue::platform::{AudioDevice, CpalQueueDevice};
use tonequeue::utils::init_logger;

#[derive(Parser)]
#[command(name = "tonequeue", about = "Feed a square wave into the audio queue once per frame")]
struct Cli {
    #[command(flatten)]
    tone: ToneArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args)]
struct ToneArgs {
    /// Output sample rate in Hz
    #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
    sample_rate: u32,

    /// Square wave frequency in Hz
    #[arg(long, default_value_t = DEFAULT_TONE_HZ)]
    tone_hz: u32,

    /// Peak sample value (0..=32767)
    #[arg(long, default_value_t = DEFAULT_AMPLITUDE, value_parser = clap::value_parser!(i16).range(0..))]
    amplitude: i16,

    /// Queue target is 1/N seconds of audio
    #[arg(long, default_value_t = DEFAULT_LATENCY_DIVISOR)]
    latency_divisor: u32,

    #[arg(long, default_value_t = DEFAULT_CHANNELS)]
    channels: u16,

    /// Frame rate of the main loop
    #[arg(long, default_value_t = DEFAULT_FPS)]
    fps: u32,
}

impl ToneArgs {
    fn into_config(self) -> ToneConfig {
        ToneConfig {
            sample_rate: self.sample_rate,
            tone_hz: self.tone_hz,
            amplitude: self.amplitude,
            latency_divisor: self.latency_divisor,
            channels: self.channels,
            fps: self.fps,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Play through the default output device
    Play,

    /// Render the fed stream to a WAV file
    #[cfg(feature = "bounce")]
    Bounce {
        path: PathBuf,

        #[arg(long, default_value_t = 5.0, value_parser = parse_seconds)]
        seconds: f32,
    },
}

#[cfg(feature = "bounce")]
fn parse_seconds(arg: &str) -> Result<f32, String> {
    let seconds: f32 = arg.parse().map_err(|e| format!("{}", e))?;
    tonequeue::bounce::check_seconds(seconds).map_err(|e| e.to_string())?;
    Ok(seconds)
}

fn main() -> anyhow::Result<()> {
    init_logger();

    let cli = Cli::parse();
    let config = cli.tone.into_config();
    config.validate().context("Invalid configuration")?;

    match cli.command.unwrap_or(Command::Play) {
        Command::Play => play(&config),
        #[cfg(feature = "bounce")]
        Command::Bounce { path, seconds } => {
            let report = tonequeue::bounce::render_wav(&config, seconds, &path)?;
            println!(
                "Wrote {} frames to {} ({} underrun frames)",
                report.frames_written,
                path.display(),
                report.underrun_frames
            );
            Ok(())
        }
    }
}

fn play(config: &ToneConfig) -> anyhow::Result<()> {
    let feeder = config.build_feeder()?;
    let device = CpalQueueDevice::open(config.device_spec()).context("Failed to open audio output")?;
    let mut frame_loop = FrameLoop::new(device, feeder);
    let mut clock = FrameClock::new(config.fps);

    println!("Up/Down: tone, Left/Right: volume, Space: pause, q: quit");

    execute!(io::stdout(), cursor::Hide)?;
    enable_raw_mode()?;

    let result = run(&mut frame_loop, &mut clock);

    // Restore terminal before any error reaches the operator
    if let Err(err) = execute!(io::stdout(), cursor::Show) {
        log::warn!("Could not show cursor: {}", err);
    }
    if let Err(err) = disable_raw_mode() {
        log::warn!("Could not leave raw mode: {}", err);
    }
    println!("\nQuitting...");

    let shutdown = frame_loop.shutdown().map(|device| {
        log::info!("{} samples of underrun over the session", device.underrun_samples());
    });
    finish(result, shutdown)
}

/// The run error wins; a shutdown failure is only returned after a clean run.
fn finish(result: anyhow::Result<()>, shutdown: Result<(), AudioError>) -> anyhow::Result<()> {
    match (result, shutdown) {
        (Err(err), Err(close_err)) => {
            log::error!("Failed to close audio output: {}", close_err);
            Err(err)
        }
        (Err(err), Ok(())) => Err(err),
        (Ok(()), Err(close_err)) => {
            Err(anyhow::Error::new(close_err).context("Failed to close audio output"))
        }
        (Ok(()), Ok(())) => Ok(()),
    }
}

fn run(frame_loop: &mut FrameLoop<CpalQueueDevice>, clock: &mut FrameClock) -> anyhow::Result<()> {
    while frame_loop.is_running() {
        clock.tick();

        // Input for the rest of this frame's budget
        while frame_loop.is_running() && event::poll(clock.remaining())? {
            if let Event::Key(key) = event::read()? {
                if let Some(action) = action_for_key(&key) {
                    frame_loop.apply(action)?;
                }
            }
        }
        if !frame_loop.is_running() {
            break;
        }

        let report = frame_loop.frame()?;
        render_status(frame_loop, &report)?;
    }
    Ok(())
}

fn render_status(frame_loop: &FrameLoop<CpalQueueDevice>, report: &FrameReport) -> io::Result<()> {
    let wave = frame_loop.feeder().wave();
    let state = match (frame_loop.is_paused(), report.feed) {
        (true, _) => "paused ".to_string(),
        (false, FeedState::Idle) => "idle   ".to_string(),
        (false, FeedState::Feeding { frames }) => format!("+{:<6}", frames),
    };

    let mut stdout = io::stdout();
    execute!(stdout, Clear(ClearType::CurrentLine))?;
    write!(
        stdout,
        "\r{:>5} Hz  amp {:>5}  queued {:>6}/{} B  {}  sample {}",
        wave.tone_hz(),
        wave.amplitude(),
        report.queued_bytes,
        frame_loop.feeder().target_queue_bytes(),
        state,
        report.running_sample_index
    )?;
    stdout.flush()
}
