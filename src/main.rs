use autopilot::capture::{DirectoryFrameSource, FrameSource};
use autopilot::clock::SystemClock;
use autopilot::config::{CaptureBackend, PipelineVariant, Settings};
use autopilot::input::{InputMonitor, KeyEventSource};
use autopilot::pipeline::pipeline_factory::PipelineFactory;
use autopilot::pipeline::services::{KeyPresser, LoggingPresser};
use autopilot::pipeline::ActionActuator;
use autopilot::{AppError, Coordinator, CoordinatorBuilder};
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Level};

/// Plays the potato fight from screen captures.
#[derive(Parser, Debug)]
#[command(name = "autopilot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file path (defaults to ./autopilot.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Perception pipeline, overrides the configured variant
    #[arg(short, long, value_enum)]
    pipeline: Option<PipelineVariant>,

    /// Log decisions without pressing the action key
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(variant) = cli.pipeline {
        settings.pipeline.variant = variant;
    }

    let cancel_token = CancellationToken::new();
    let loop_token = cancel_token.clone();
    let dry_run = cli.dry_run;
    let mut control_loop = tokio::task::spawn_blocking(move || {
        let coordinator = build_coordinator(settings, dry_run, loop_token)?;
        coordinator.run()
    });

    let result = tokio::select! {
        joined = &mut control_loop => joined,
        _ = tokio::signal::ctrl_c() => {
            info!("Program interrupted.");
            cancel_token.cancel();
            control_loop.await
        }
    };

    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            error!("{}", e);
            Err(e)
        }
        Err(e) => Err(AppError::Task(e.to_string())),
    }
}

fn build_coordinator(
    settings: Settings,
    dry_run: bool,
    cancel_token: CancellationToken,
) -> Result<Coordinator<SystemClock>, AppError> {
    let pipeline = PipelineFactory::create(&settings)?;
    let keys = InputMonitor::start(key_source(&settings), settings.timing.listener_startup())?;
    let frames = frame_source(&settings)?;
    let actuator = ActionActuator::new(key_presser(&settings, dry_run)?, settings.timing.action_hold());

    print_banner(&settings, pipeline.variant());
    CoordinatorBuilder::new(settings, SystemClock::new())
        .keys(Box::new(keys))
        .frames(frames)
        .pipeline(pipeline)
        .actuator(actuator)
        .cancel_token(cancel_token)
        .build()
}

#[cfg(feature = "desktop")]
fn key_source(_settings: &Settings) -> Box<dyn KeyEventSource> {
    Box::new(autopilot::input::RdevKeySource)
}

#[cfg(not(feature = "desktop"))]
fn key_source(settings: &Settings) -> Box<dyn KeyEventSource> {
    info!("No keyboard hook in this build; reading control keys from stdin, one chord per line");
    let hold = settings.timing.idle_poll() * 2;
    Box::new(autopilot::input::LineKeySource::stdin(hold))
}

fn frame_source(settings: &Settings) -> Result<Box<dyn FrameSource>, AppError> {
    let region = settings.capture.region;
    match settings.capture.backend {
        CaptureBackend::Directory => Ok(Box::new(
            DirectoryFrameSource::open(&settings.capture.directory)?.with_region(region),
        )),
        #[cfg(feature = "desktop")]
        CaptureBackend::Screen => Ok(Box::new(autopilot::capture::ScreenFrameSource::open(region)?)),
        #[cfg(not(feature = "desktop"))]
        CaptureBackend::Screen => Err(AppError::InvalidConfig(
            "screen capture needs a build with `--features desktop`; set capture.backend = \"directory\" to replay frames"
                .to_string(),
        )),
    }
}

fn key_presser(settings: &Settings, dry_run: bool) -> Result<Box<dyn KeyPresser>, AppError> {
    if dry_run {
        return Ok(Box::new(LoggingPresser));
    }
    #[cfg(feature = "desktop")]
    {
        let key = autopilot::input::KeyId::new(&settings.controls.action);
        Ok(Box::new(autopilot::pipeline::services::RdevKeyPresser::new(&key)?))
    }
    #[cfg(not(feature = "desktop"))]
    {
        tracing::warn!(
            "No key injection in this build; '{}' presses are only logged",
            settings.controls.action
        );
        Ok(Box::new(LoggingPresser))
    }
}

fn print_banner(settings: &Settings, variant: PipelineVariant) {
    let controls = &settings.controls;
    info!("Models loaded ({} pipeline).", variant.as_str());
    info!("Controls:");
    info!("  [{}] -> Toggle Pause/Resume", controls.toggle.to_uppercase());
    info!("  [{}] -> Quit", controls.quit.to_uppercase());
    info!("  [{}] -> Log LOST & Pause", controls.mark_lost);
    info!("  [{}] -> Log WON & Pause", controls.mark_won);
    info!("Status: PAUSED (Press '{}' to start)", controls.toggle);
}
