use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "layerboard", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a scene document as a PNG.
    Render(RenderArgs),
    /// Print the grid geometry for a surface size as JSON.
    Geometry(GeometryArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input scene JSON.
    #[arg(long)]
    scene: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Directory image sources resolve against. Defaults to the scene's directory.
    #[arg(long)]
    root: Option<PathBuf>,

    #[arg(long, default_value_t = 1280.0)]
    width: f64,

    #[arg(long, default_value_t = 720.0)]
    height: f64,

    /// Host device pixel ratio; clamped by the render options.
    #[arg(long, default_value_t = 1.0)]
    dpr: f64,

    /// Draw the layout grid.
    #[arg(long)]
    grid: bool,

    /// Font file (TTF/OTF) to register for text assets.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Board options JSON; missing fields keep their defaults.
    #[arg(long)]
    opts: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct GeometryArgs {
    width: f64,
    height: f64,

    /// Column count; defaults to the responsive choice for the width.
    #[arg(long)]
    cols: Option<u32>,

    #[arg(long, default_value_t = 3)]
    rows: u32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Geometry(args) => cmd_geometry(args),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let f = File::open(path).with_context(|| format!("open {what} '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(f)).with_context(|| format!("parse {what} JSON"))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let doc: layerboard::SceneSnapshot = read_json(&args.scene, "scene")?;
    let mut opts = match &args.opts {
        Some(path) => read_json::<layerboard::BoardOpts>(path, "options")?.with_env_overrides(),
        None => layerboard::BoardOpts::from_env(),
    };
    opts.render.grid_enabled |= args.grid;

    let root = match args.root {
        Some(root) => root,
        None => args
            .scene
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    let fetcher = Arc::new(layerboard::FsFetcher::new(root));
    let media = Arc::new(layerboard::SequenceMediaOpener::new());
    let mut composer = layerboard::Composer::new(opts, fetcher, media);

    if let Some(font) = &args.font {
        let bytes =
            std::fs::read(font).with_context(|| format!("read font '{}'", font.display()))?;
        let family = composer.text_engine_mut().register_font(bytes)?;
        tracing::info!(%family, "registered font");
    }

    composer.init_surface(Box::new(
        layerboard::OffscreenSurface::new(args.width, args.height).with_dpr(args.dpr),
    ))?;
    composer.load_scene(&doc);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("start runtime")?;
    rt.block_on(composer.rehydrate_images());
    composer.tick(Duration::ZERO)?;

    let missing = composer.scene().unloaded_image_sources();
    if !missing.is_empty() {
        tracing::warn!(?missing, "images failed to load and were skipped");
    }

    let mut frame = composer.render_frame()?;
    frame.unpremultiply();

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
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

fn cmd_geometry(args: GeometryArgs) -> anyhow::Result<()> {
    let geometry = match args.cols {
        Some(cols) => layerboard::compute_geometry(args.width, args.height, cols, args.rows),
        None => layerboard::responsive_grid(args.width, args.height),
    };
    println!("{}", serde_json::to_string_pretty(&geometry)?);
    Ok(())
}
