use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{ArgAction, Parser};
use particle_video::{PipelineOpts, RenderConfig, RenderStats};

/// Render 2D particle simulation logs into MP4 videos (requires `ffmpeg` on PATH).
#[derive(Parser, Debug)]
#[command(name = "particle-video", version)]
struct Cli {
    /// Simulation log files. Each one is converted into its own video.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Side length of the square board, in simulation units.
    #[arg(short = 'S', long, value_parser = positive_f64)]
    board_size: f64,

    /// Height of the slot opening in the right wall, in simulation units.
    #[arg(short = 'L', long, visible_alias = "idk-size", value_parser = positive_f64)]
    slot_size: f64,

    /// Output width in pixels.
    #[arg(long, default_value_t = 500, value_parser = clap::value_parser!(u32).range(1..))]
    video_width: u32,

    /// Output height in pixels.
    #[arg(long, default_value_t = 500, value_parser = clap::value_parser!(u32).range(1..))]
    video_height: u32,

    /// Output frames per second.
    #[arg(long, default_value_t = 24, value_parser = clap::value_parser!(u32).range(1..))]
    video_fps: u32,

    /// Draw each particle's index inside its circle.
    #[arg(long)]
    particle_ids: bool,

    /// Directory for the derived output files.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// TTF/OTF font for text overlays (default: a system sans-serif face).
    #[arg(long)]
    font: Option<PathBuf>,

    /// Stop after this many rendered frames.
    #[arg(long)]
    max_frames: Option<u64>,

    /// Keep one of every N timesteps (downsampling), starting with the first.
    #[arg(long, value_name = "N", default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    stride: u64,

    /// Write only the N-th rendered frame (0-based) as a PNG instead of encoding a video.
    #[arg(long, value_name = "N")]
    snapshot: Option<u64>,

    /// Fail instead of replacing existing output files.
    #[arg(long)]
    no_overwrite: bool,

    /// Print per-input render statistics as JSON on stdout.
    #[arg(long)]
    stats_json: bool,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long)]
    quiet: bool,
}

fn positive_f64(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|e| format!("'{s}' is not a number: {e}"))?;
    if !v.is_finite() || v <= 0.0 {
        return Err(format!("'{s}' must be a positive number"));
    }
    Ok(v)
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => tracing::Level::WARN,
        (false, 0) => tracing::Level::INFO,
        (false, 1) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let cfg = RenderConfig {
        board_size: cli.board_size,
        slot_size: cli.slot_size,
        width: cli.video_width,
        height: cli.video_height,
        fps: cli.video_fps,
        particle_ids: cli.particle_ids,
        font: cli.font.clone(),
    };
    cfg.validate()?;

    let opts = PipelineOpts {
        max_frames: cli.max_frames,
        stride: cli.stride,
        ..PipelineOpts::default()
    };

    let mut failed = 0usize;
    for input in &cli.inputs {
        match convert(&cli, &cfg, &opts, input) {
            Ok(()) => {}
            Err(e) => {
                tracing::error!(input = %input.display(), "{e:#}");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} input(s) failed", cli.inputs.len());
    }
    Ok(())
}

fn convert(cli: &Cli, cfg: &RenderConfig, opts: &PipelineOpts, input: &Path) -> anyhow::Result<()> {
    if let Some(index) = cli.snapshot {
        let out = particle_video::derive_output_path(input, &cli.out_dir, "png")?;
        write_snapshot(cli, cfg, opts, input, &out, index)?;
        eprintln!("wrote {}", out.display());
        return Ok(());
    }

    let out = particle_video::derive_output_path(input, &cli.out_dir, "mp4")?;
    let stats = particle_video::render_to_mp4(input, &out, cfg, opts, !cli.no_overwrite)
        .with_context(|| format!("convert '{}'", input.display()))?;
    if cli.stats_json {
        print_stats(input, &out, &stats)?;
    }
    eprintln!("wrote {}", out.display());
    Ok(())
}

fn write_snapshot(
    cli: &Cli,
    cfg: &RenderConfig,
    opts: &PipelineOpts,
    input: &Path,
    out: &Path,
    index: u64,
) -> anyhow::Result<()> {
    if cli.no_overwrite && out.exists() {
        anyhow::bail!("output exists: '{}'", out.display());
    }
    let frame = particle_video::render_snapshot(input, cfg, opts, index)
        .with_context(|| format!("snapshot '{}'", input.display()))?;
    particle_video::ensure_parent_dir(out)?;
    image::save_buffer_with_format(
        out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", out.display()))?;
    Ok(())
}

fn print_stats(input: &Path, out: &Path, stats: &RenderStats) -> anyhow::Result<()> {
    let line = serde_json::json!({
        "input": input.display().to_string(),
        "output": out.display().to_string(),
        "stats": stats,
    });
    println!("{}", serde_json::to_string(&line).context("serialize stats")?);
    Ok(())
}
