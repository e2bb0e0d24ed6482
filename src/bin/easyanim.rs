use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "easyanim", version)]
struct Cli {
    #[command(flatten)]
    log: LogArgs,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug)]
struct LogArgs {
    /// Log level filter (overridden by `RUST_LOG`).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export the whole animation as a video (requires `ffmpeg` unless `--raw`).
    Export(ExportArgs),
    /// Render the scene at one timeline position as a PNG.
    Frame(FrameArgs),
    /// Print the sampled transform of one asset at a timeline position.
    Sample(SampleArgs),
    /// Play the timeline from a position to the end and print the final transforms.
    Play(PlayArgs),
    /// Summarize a project: canvas, assets, keyframes, export end time.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output file or directory. Defaults to `animation-<millis>.<ext>` in the current directory.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Frames per second (defaults to `EASYANIM_EXPORT_FPS` or 30).
    #[arg(long)]
    fps: Option<u32>,

    /// Timeline percent between frames.
    #[arg(long)]
    time_step: Option<f64>,

    /// Preload worker threads.
    #[arg(long)]
    threads: Option<usize>,

    /// `ffmpeg` binary (defaults to `EASYANIM_FFMPEG` or `ffmpeg`).
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// Write raw RGBA frames back to back instead of encoding.
    #[arg(long)]
    raw: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Timeline position in `[0, 100]`.
    #[arg(long)]
    time: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct SampleArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Asset id.
    #[arg(long)]
    asset: String,

    /// Timeline position in `[0, 100]`.
    #[arg(long)]
    time: f64,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Start position.
    #[arg(long, default_value_t = 0.0)]
    from: f64,

    /// Pace ticks in wall-clock time instead of running them back to back.
    #[arg(long)]
    realtime: bool,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log);
    match cli.cmd {
        Command::Export(args) => cmd_export(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Sample(args) => cmd_sample(args),
        Command::Play(args) => cmd_play(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn init_logging(args: &LogArgs) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    if args.log_json {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
}

fn load_context(path: &Path) -> anyhow::Result<easyanim::EditorContext> {
    let project = easyanim::Project::from_path(path)
        .with_context(|| format!("load project '{}'", path.display()))?;
    Ok(project.into_context()?)
}

fn assets_root(in_path: &Path) -> &Path {
    in_path.parent().unwrap_or_else(|| Path::new("."))
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let mut ctx = load_context(&args.in_path)?;

    let mut opts = easyanim::ExportOpts::from_env();
    opts.canvas = ctx.scene().canvas;
    if let Some(fps) = args.fps {
        opts.fps = easyanim::Fps::new(fps, 1)?;
    }
    if let Some(step) = args.time_step {
        opts.time_step = step;
    }
    opts.threads = args.threads;

    let mut sink: Box<dyn easyanim::FrameSink> = if args.raw {
        Box::new(easyanim::InMemorySink::new())
    } else {
        let mut sink_opts = easyanim::FfmpegSinkOpts::from_env();
        if let Some(ffmpeg) = args.ffmpeg {
            sink_opts.ffmpeg = ffmpeg;
        }
        sink_opts.bg_rgba = ctx.scene().background.to_array();
        Box::new(easyanim::FfmpegSink::new(sink_opts))
    };

    let driver = easyanim::ExportDriver::new(opts);
    let artifact = driver.run(&mut ctx, assets_root(&args.in_path), sink.as_mut())?;

    for failure in &artifact.load_failures {
        eprintln!("warning: asset '{}' rendered empty: {}", failure.asset, failure.reason);
    }

    let out = match args.out {
        Some(p) if p.is_dir() => p.join(artifact.suggested_file_name()),
        Some(p) => p,
        None => PathBuf::from(artifact.suggested_file_name()),
    };
    if let Some(parent) = out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    artifact.save(&out)?;

    eprintln!(
        "wrote {} ({} frames, end {:.1}%, {})",
        out.display(),
        artifact.frames,
        artifact.end_time,
        artifact.format.mime_type()
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let ctx = load_context(&args.in_path)?;
    let root = assets_root(&args.in_path);

    let mut assets = ctx.assets().to_vec();
    easyanim::sample_assets(
        easyanim::clamp_time(args.time),
        &mut assets,
        ctx.keyframes(),
        easyanim::SkipPolicy::IgnoreEditing,
    );

    let fonts = easyanim::FontBook::load(root);
    let prepared = easyanim::PreparedAssetStore::prepare(root, &assets, &fonts);
    for failure in prepared.failures() {
        eprintln!("warning: asset '{}' rendered empty: {}", failure.asset, failure.reason);
    }

    let mut surface = easyanim::CpuSurface::new(ctx.scene().canvas)?;
    easyanim::DrawSurface::clear(&mut surface, ctx.scene().background)?;
    easyanim::render_assets(&assets, &prepared, &mut surface)?;
    let frame = surface.finish()?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.to_straight_rgba(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_sample(args: SampleArgs) -> anyhow::Result<()> {
    let ctx = load_context(&args.in_path)?;
    let id = easyanim::AssetId::new(args.asset);
    let asset = ctx
        .asset(&id)
        .with_context(|| format!("unknown asset '{id}'"))?;

    let transform = easyanim::sample(args.time, ctx.keyframes().get(&id)).unwrap_or(asset.transform);
    println!("{}", serde_json::to_string_pretty(&transform)?);
    Ok(())
}

fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    let mut ctx = load_context(&args.in_path)?;
    let clock = easyanim::PlaybackClock::default();

    ctx.seek(args.from)?;
    clock.play(&mut ctx)?;

    let ticks = if args.realtime {
        clock.run(&mut ctx, |ctx, out| {
            tracing::trace!(position = out.position, updated = out.updated, "tick");
            if out.state == easyanim::PlaybackState::Stopped {
                eprintln!("{}", easyanim::format_time(ctx.position()));
            }
        })
    } else {
        let mut n = 0u64;
        while ctx.is_playing() {
            clock.tick(&mut ctx);
            n += 1;
        }
        n
    };

    eprintln!("{ticks} ticks, stopped at {}", easyanim::format_time(ctx.position()));
    let snapshot: Vec<(&easyanim::AssetId, &easyanim::Transform)> =
        ctx.assets().iter().map(|a| (&a.id, &a.transform)).collect();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let ctx = load_context(&args.in_path)?;
    let canvas = ctx.scene().canvas;

    println!("canvas: {}x{}", canvas.width, canvas.height);
    println!("assets: {}", ctx.assets().len());
    for asset in ctx.assets() {
        let kind = match &asset.kind {
            easyanim::AssetKind::Image { source } => format!("image {source}"),
            easyanim::AssetKind::Text { text, .. } => format!("text {text:?}"),
        };
        let times: Vec<String> = ctx
            .keyframes()
            .get(&asset.id)
            .iter()
            .map(|k| format!("{:.1}", k.time))
            .collect();
        println!("  {}: {kind}; keyframes [{}]", asset.id, times.join(", "));
    }
    println!("keyframes: {}", ctx.keyframes().total_keyframes());
    if ctx.keyframes().is_empty() {
        println!("export: nothing to export");
    } else {
        println!(
            "export end: {:.1}%",
            easyanim::export_end_time(ctx.keyframes())
        );
    }
    Ok(())
}
