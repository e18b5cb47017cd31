use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use glyphwave::{
    AnimationMode, AnimatorConfig, ExportFormat, ExportJob, ExportOptions, ExportOutcome,
    FrameOpts, RenderSession,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "glyphwave", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Export an animation as GIF or MP4 (MP4 requires `ffmpeg` on PATH).
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Source image. Without one a random pattern is generated.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Seed of the generated pattern.
    #[arg(long, default_value_t = 1)]
    pattern_seed: u64,

    /// JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// TrueType/OpenType font. Defaults to the built-in bitmap font.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Animation mode (waves, morph, audio, audio_alt, contourswim).
    #[arg(long)]
    mode: Option<AnimationMode>,

    /// Target image for morph mode.
    #[arg(long)]
    morph: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Animation time in seconds.
    #[arg(long, default_value_t = 0.0)]
    t: f64,

    /// Render with the preview path (grid shrinking, fast post-fx).
    #[arg(long)]
    preview: bool,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Output file.
    #[arg(long)]
    out: PathBuf,

    /// Container; guessed from the output extension when omitted.
    #[arg(long)]
    format: Option<ExportFormat>,

    #[arg(long)]
    frames: Option<u32>,

    #[arg(long)]
    fps: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Export(args) => cmd_export(args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AnimatorConfig> {
    match path {
        Some(p) => AnimatorConfig::load(p).with_context(|| format!("load config '{}'", p.display())),
        None => Ok(AnimatorConfig::default()),
    }
}

fn open_session(src: &SourceArgs, cfg: AnimatorConfig) -> anyhow::Result<RenderSession> {
    let mut session = RenderSession::new(cfg);
    if let Some(font) = &src.font {
        let px = session.config().font.px;
        session
            .set_font(Some(font), px)
            .with_context(|| format!("load font '{}'", font.display()))?;
    }
    match &src.image {
        Some(path) => session
            .load_image(path)
            .with_context(|| format!("load image '{}'", path.display()))?,
        None => session
            .generate_pattern(640, 480, 12, 0.5, src.pattern_seed)
            .context("generate pattern")?,
    }
    if let Some(path) = &src.morph {
        session
            .load_morph_target(path)
            .with_context(|| format!("load morph target '{}'", path.display()))?;
    }
    if let Some(mode) = src.mode {
        session.set_mode(mode);
    }
    Ok(session)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.source.config.as_deref())?;
    let mut session = open_session(&args.source, cfg)?;

    let opts = if args.preview {
        FrameOpts::preview()
    } else {
        FrameOpts::full()
    };
    let frame = session.render_frame(args.t, opts)?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    frame
        .save_with_format(&args.out, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    tracing::info!(path = %args.out.display(), width = frame.width(), height = frame.height(), "frame written");
    Ok(())
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(args.source.config.as_deref())?;
    cfg.export.format = args
        .format
        .unwrap_or_else(|| ExportFormat::from_path(&args.out));
    if let Some(frames) = args.frames {
        cfg.export.frames = frames;
    }
    if let Some(fps) = args.fps {
        cfg.export.fps = fps;
    }
    let cfg = cfg.sanitized();

    let mut session = open_session(&args.source, cfg)?;
    let opts = ExportOptions::from_config(&session.config().export)?;
    let renderer = session.export_renderer(opts)?;
    let sink = opts.format.sink(&args.out, opts.crf);

    let job = ExportJob::spawn(renderer, sink).context("start export worker")?;
    let mut last_pct = 0;
    for p in job.progress().iter() {
        let pct = (p.fraction() * 100.0) as u32;
        if pct >= last_pct + 10 || p.done == p.total {
            tracing::info!(done = p.done, total = p.total, "exporting");
            last_pct = pct;
        }
    }

    match job.join()? {
        ExportOutcome::Completed { frames } => {
            tracing::info!(path = %args.out.display(), frames, "export finished");
        }
        ExportOutcome::Cancelled { frames } => {
            tracing::warn!(frames, "export cancelled");
        }
    }
    Ok(())
}
