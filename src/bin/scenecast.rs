use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use scenecast::FrameExtractor as _;

#[derive(Parser, Debug)]
#[command(name = "scenecast", version)]
struct Cli {
    /// Log debug output to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the audio track from per-frame asset records and merge it with a visual track
    /// (requires `ffmpeg`/`ffprobe` on PATH).
    ExportAudio(ExportAudioArgs),
    /// Print asset placements reconstructed from per-frame asset records.
    Timeline(TimelineArgs),
    /// Print the decoder chosen for a source.
    SelectDecoder(SelectDecoderArgs),
    /// Print stream metadata of a media source (requires `ffprobe`).
    Probe(ProbeArgs),
    /// Extract a single video frame as a PNG (requires `ffmpeg`).
    Frame(FrameArgs),
}

#[derive(Parser, Debug)]
struct ExportAudioArgs {
    /// Export settings JSON.
    #[arg(long)]
    settings: PathBuf,

    /// Per-frame asset records JSON (array of arrays).
    #[arg(long)]
    frames: PathBuf,

    /// Rendered visual track; copied into the temp dir before merging.
    #[arg(long)]
    visuals: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct TimelineArgs {
    /// Per-frame asset records JSON (array of arrays).
    #[arg(long)]
    frames: PathBuf,

    /// Scene frame rate.
    #[arg(long, default_value_t = 30)]
    fps: u32,
}

#[derive(Parser, Debug)]
struct SelectDecoderArgs {
    /// Media source (path or URL).
    #[arg(long)]
    src: String,

    /// Playback mode.
    #[arg(long, value_enum, default_value_t = ModeArg::Rendering)]
    mode: ModeArg,

    /// Forced decoder.
    #[arg(long = "override", value_enum)]
    decoder_override: Option<scenecast::DecoderOverride>,

    /// Skip the HTTP content-type probe for remote sources.
    #[arg(long)]
    offline: bool,
}

#[derive(Parser, Debug)]
struct ProbeArgs {
    /// Media source (path or URL).
    src: PathBuf,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Video source (path or URL).
    #[arg(long)]
    src: String,

    /// Media time in seconds.
    #[arg(long, default_value_t = 0.0)]
    at: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Paused,
    Playing,
    Presenting,
    Rendering,
}

impl From<ModeArg> for scenecast::PlaybackMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Paused => Self::Paused,
            ModeArg::Playing => Self::Playing,
            ModeArg::Presenting => Self::Presenting,
            ModeArg::Rendering => Self::Rendering,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    match cli.cmd {
        Command::ExportAudio(args) => cmd_export_audio(args),
        Command::Timeline(args) => cmd_timeline(args),
        Command::SelectDecoder(args) => cmd_select_decoder(args),
        Command::Probe(args) => cmd_probe(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn read_frames_json(path: &Path) -> anyhow::Result<Vec<Vec<scenecast::AssetFrameRecord>>> {
    let f = std::fs::File::open(path)
        .with_context(|| format!("open frame records '{}'", path.display()))?;
    let frames = serde_json::from_reader(std::io::BufReader::new(f))
        .with_context(|| "parse frame records JSON")?;
    Ok(frames)
}

fn cmd_export_audio(args: ExportAudioArgs) -> anyhow::Result<()> {
    let settings = scenecast::ExportSettings::from_path(&args.settings)?;
    let frames = read_frames_json(&args.frames)?;
    let mut session = scenecast::ExportSession::new(settings)?;

    if let Some(visuals) = &args.visuals {
        let dest = session.visual_sink().path().to_path_buf();
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create temp dir '{}'", parent.display()))?;
        }
        std::fs::copy(visuals, &dest)
            .with_context(|| format!("copy visual track '{}'", visuals.display()))?;
    }

    for records in &frames {
        session.push_frame(records);
    }
    let out = session.finish()?;
    eprintln!("wrote {}", out.display());
    Ok(())
}

fn cmd_timeline(args: TimelineArgs) -> anyhow::Result<()> {
    let frames = read_frames_json(&args.frames)?;
    let fps = scenecast::Fps::whole(args.fps)?;
    let assets = scenecast::extract_media_assets(&frames, fps);
    println!("{}", serde_json::to_string_pretty(&assets)?);
    Ok(())
}

fn cmd_select_decoder(args: SelectDecoderArgs) -> anyhow::Result<()> {
    let probe: Box<dyn scenecast::ContentTypeProbe> = if args.offline {
        Box::new(scenecast::NoProbe)
    } else {
        Box::new(scenecast::HttpProbe::default())
    };
    let mut format = None;
    let kind = scenecast::select_decoder(args.mode.into(), args.decoder_override, || {
        *format.get_or_insert_with(|| scenecast::detect_format(&args.src, probe.as_ref()))
    });

    println!("decoder: {kind:?}");
    if let Some(format) = format {
        println!("format:  {format:?} ({:?} family)", format.family());
    }
    Ok(())
}

fn cmd_probe(args: ProbeArgs) -> anyhow::Result<()> {
    let probe = scenecast::probe_media(&args.src)?;
    println!("has_video:   {}", probe.has_video);
    println!("has_audio:   {}", probe.has_audio);
    if let (Some(w), Some(h)) = (probe.width, probe.height) {
        println!("size:        {w}x{h}");
    }
    if let Some(rate) = probe.sample_rate {
        println!("sample_rate: {rate}");
    }
    if let Some(d) = probe.duration_secs {
        println!("duration:    {d:.3}s");
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut extractor = scenecast::FfmpegFrameExtractor::new(args.src.as_str())?;
    let frame = extractor.frame_at(args.at)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
