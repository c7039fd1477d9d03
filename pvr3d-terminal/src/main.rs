/// PVR3D Terminal Demo - Rotating Model
///
/// Renders an OBJ model (or a built-in cube) through the pvr3d pipeline
/// into the terminal, and converts RGB888 images to 16-bit texture files.
/// Controls:
///   - Arrow Keys / WASD: Rotate the model
///   - Z / X: Zoom in / out
///   - [ / ]: Roll
///   - L: Toggle lighting
///   - Q / ESC: Quit
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use crossterm::terminal;
use log::{info, warn};
use pvr3d_core::{pixel, Config, Mesh, PixelFormat, Renderer};
use pvr3d_terminal::TerminalApp;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Immediate-mode 3D renderer in the terminal
#[derive(Parser)]
#[command(name = "pvr3d-terminal", version)]
#[command(about = "Immediate-mode 3D renderer in the terminal")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Write log output to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,

    /// Arguments for `run` when no subcommand is given
    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a model interactively (default)
    Run(RunArgs),

    /// Convert raw RGB888 pixel data into a 16-bit texture file
    Convert(ConvertArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// OBJ model to display; a textured cube is used when omitted
    #[arg(long)]
    model: Option<PathBuf>,

    /// Raw RGB565 texture for the model
    #[arg(long)]
    texture: Option<PathBuf>,

    /// Texture width in texels
    #[arg(long, default_value_t = 128)]
    width: usize,

    /// Texture height in texels
    #[arg(long, default_value_t = 128)]
    height: usize,

    /// Raw ARGB1555 font texture (16x16 glyph grid, 256x256 texels)
    #[arg(long)]
    font: Option<PathBuf>,

    /// TOML renderer configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured resolution (240 or 480)
    #[arg(long)]
    resolution: Option<u32>,
}

#[derive(Debug, Args)]
struct ConvertArgs {
    /// Output pixel format (rgb565 or argb1555)
    #[arg(long, default_value = "rgb565")]
    format: PixelFormat,

    /// Raw RGB888 input file
    #[arg(short, long)]
    input: PathBuf,

    /// Output texture file
    #[arg(short, long)]
    output: PathBuf,
}

const FONT_SIZE: usize = 256;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    match cli.command {
        Some(Commands::Convert(args)) => convert(args),
        Some(Commands::Run(args)) => run(args),
        None => run(cli.run),
    }
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let mut builder = env_logger::Builder::new();

    if let Ok(filter) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filter);
    } else if log_file.is_some() {
        builder.filter_level(log::LevelFilter::Info);
    } else {
        builder.filter_level(log::LevelFilter::Warn);
    }

    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file: {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
        builder.write_style(env_logger::WriteStyle::Never);
    }

    builder.try_init().context("Failed to initialize logging")?;
    Ok(())
}

fn load_config(args: &RunArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(resolution) = args.resolution {
        config.resolution = resolution;
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn run(args: RunArgs) -> Result<()> {
    let config = load_config(&args)?;
    let mut renderer = Renderer::new(config).context("Failed to create renderer")?;
    renderer.initialize();

    let texture = match &args.texture {
        Some(path) => Some(
            renderer
                .textures
                .load(path, args.width, args.height)
                .with_context(|| format!("Failed to load texture: {}", path.display()))?,
        ),
        None => None,
    };

    let font = match &args.font {
        Some(path) => Some(
            renderer
                .textures
                .load_with_format(path, FONT_SIZE, FONT_SIZE, PixelFormat::Argb1555)
                .with_context(|| format!("Failed to load font: {}", path.display()))?,
        ),
        None => None,
    };

    let model = match &args.model {
        Some(path) => renderer
            .models
            .load_obj(path, texture, texture.is_some())
            .with_context(|| format!("Failed to load model: {}", path.display()))?,
        None => renderer
            .models
            .insert(Mesh::cube(2.0), texture, texture.is_some())
            .context("Failed to create cube")?,
    };

    let (width, height) = terminal::size().context("Failed to query terminal size")?;
    let mut app = TerminalApp::new(renderer, model, font, width as usize, height as usize);
    app.run().context("Terminal renderer failed")?;

    info!("Exited cleanly.");
    Ok(())
}

fn convert(args: ConvertArgs) -> Result<()> {
    let data = fs::read(&args.input)
        .with_context(|| format!("Failed to read image: {}", args.input.display()))?;
    if data.len() % 3 != 0 {
        warn!(
            "{} is not a whole number of RGB888 pixels; dropping {} trailing bytes",
            args.input.display(),
            data.len() % 3
        );
    }

    let texels = pixel::encode_rgb888(&data, args.format);
    fs::write(&args.output, &texels)
        .with_context(|| format!("Failed to write texture: {}", args.output.display()))?;

    println!(
        "Wrote {} {} texels to {}",
        texels.len() / pixel::BYTES_PER_TEXEL,
        args.format,
        args.output.display()
    );
    Ok(())
}
