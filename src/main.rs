use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tintype_core::filter::Filter;
use tintype_core::pipeline::stage::RenderParams;
use tintype_core::pipeline::Pipeline;
use tintype_core::raster::RasterBuffer;
use tintype_core::strip::PHOTO_COUNT;
use tintype_io::{
    date_stamp, load_strip_frames, save_png, timestamp_file_name, FileFrameSource,
};
use tintype_session::{
    run_session, CaptureSession, SessionConfig, SessionEvent, SessionOutcome,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tintype", about = "Photo-strip renderer and capture booth")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a finished strip from existing image files.
    Render(RenderArgs),
    /// Run a timed capture session against the input frames, then render.
    Booth(BoothArgs),
}

#[derive(Args)]
struct SharedArgs {
    /// Input image files (jpg, jpeg, or png).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Filter to apply: color, bw, vintage, retro, polaroid, fadedfilm.
    #[arg(long, default_value = "vintage")]
    filter: String,

    /// Filter strength, 0.0 through 1.0.
    #[arg(long, default_value_t = 1.0)]
    intensity: f64,

    /// Film grain strength, 0.0 through 1.0.
    #[arg(long, default_value_t = 0.5)]
    grain: f64,

    /// Output path for the PNG strip. Defaults to a timestamped name.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Seed for the texture and layout randomness, for reproducible output.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args)]
struct RenderArgs {
    #[command(flatten)]
    shared: SharedArgs,
}

#[derive(Args)]
struct BoothArgs {
    #[command(flatten)]
    shared: SharedArgs,

    /// Countdown seconds before each capture.
    #[arg(long, default_value_t = 3)]
    countdown: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Render(args) => render(args.shared),
        Command::Booth(args) => booth(args).await,
    }
}

fn parse_shared(shared: &SharedArgs) -> Result<(RenderParams, StdRng)> {
    let filter = Filter::from_name(&shared.filter)
        .with_context(|| format!("unknown filter {:?}", shared.filter))?;
    let params = RenderParams {
        filter,
        intensity: shared.intensity.clamp(0.0, 1.0),
        grain: shared.grain.clamp(0.0, 1.0),
        ..RenderParams::default()
    };
    let rng = match shared.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    Ok((params, rng))
}

fn write_strip(frames: Vec<RasterBuffer>, shared: &SharedArgs) -> Result<()> {
    let (params, mut rng) = parse_shared(shared)?;
    let strip = Pipeline::new().render_strip(frames, &params, &mut rng, &date_stamp())?;
    let path = shared
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(timestamp_file_name("strip")));
    save_png(&strip, &path)?;
    println!(
        "Wrote {}x{} strip to {}",
        strip.width,
        strip.height,
        path.display()
    );
    Ok(())
}

fn render(shared: SharedArgs) -> Result<()> {
    let frames = load_strip_frames(&shared.inputs, PHOTO_COUNT)?;
    write_strip(frames, &shared)
}

async fn booth(args: BoothArgs) -> Result<()> {
    let mut source = FileFrameSource::from_paths(&args.shared.inputs)?;
    let mut session = CaptureSession::new(SessionConfig {
        countdown_seconds: args.countdown,
        ..SessionConfig::default()
    });

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                SessionEvent::CountdownTick { photo, remaining } => {
                    println!("Photo {photo}: {remaining}...");
                }
                SessionEvent::Flash { photo } => println!("*flash* (photo {photo})"),
                SessionEvent::Completed => println!("All photos captured!"),
                SessionEvent::Cancelled => println!("Session cancelled."),
            }
        }
    });

    let outcome = run_session(&mut session, &mut source, &tx).await?;
    drop(tx);
    printer.await.context("event printer task failed")?;

    match outcome {
        SessionOutcome::Completed(frames) => write_strip(frames, &args.shared),
        SessionOutcome::Cancelled => anyhow::bail!("capture session was cancelled"),
    }
}
