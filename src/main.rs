use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use image::RgbaImage;
use log::{Level, LevelFilter, Metadata, Record};

use relief_map::geography::GeographyCatalog;
use relief_map::overlay::{build_markers, MetricSummary};
use relief_map::{PngFileSink, RenderConfig, Renderer};

#[derive(Parser, Debug)]
#[command(name = "relief_map")]
#[command(about = "Render a procedural shaded-relief map of the British Isles")]
struct Args {
    /// Width of the map in logical pixels
    #[arg(short = 'W', long, default_value = "600")]
    width: u32,

    /// Height of the map in logical pixels
    #[arg(short = 'H', long, default_value = "720")]
    height: u32,

    /// Master seed for both noise layers (random if not specified)
    #[arg(short, long)]
    seed: Option<u32>,

    /// Physical pixels per logical pixel (overrides the config file)
    #[arg(short = 'd', long)]
    device_scale: Option<u32>,

    /// Render configuration JSON (defaults used if not specified)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Geography catalog JSON (British Isles if not specified)
    #[arg(long)]
    geography: Option<PathBuf>,

    /// Per-city metric summary JSON; enables city markers
    #[arg(long)]
    metrics: Option<PathBuf>,

    /// Output PNG path
    #[arg(short, long, default_value = "relief.png")]
    output: PathBuf,

    /// Print the map as a data URL instead of writing a file
    #[arg(long)]
    data_url: bool,

    /// Log pipeline stages to stderr
    #[arg(short, long)]
    verbose: bool,
}

/// Plain stderr logger for `--verbose`.
struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Debug
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn main() {
    let args = Args::parse();

    if args.verbose {
        if let Err(e) = log::set_logger(&LOGGER) {
            eprintln!("Failed to install logger: {}", e);
        }
        log::set_max_level(LevelFilter::Debug);
    }

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => RenderConfig::load(path)?,
        None => RenderConfig::default(),
    };
    // An explicit seed wins; otherwise keep the config's seeds if one was given
    if let Some(seed) = args.seed {
        config = config.with_master_seed(seed);
    } else if args.config.is_none() {
        config = config.with_master_seed(rand::random());
    }
    if let Some(scale) = args.device_scale {
        config = config.with_device_scale(scale);
    }

    let geography = match &args.geography {
        Some(path) => GeographyCatalog::load(path)?,
        None => GeographyCatalog::british_isles(),
    };

    let markers = match &args.metrics {
        Some(path) => {
            let summary = MetricSummary::load(path)?;
            let markers = build_markers(&geography.cities, Some(&summary));
            if !args.data_url {
                println!("Loaded metrics for {} cities", summary.cities.len());
            }
            markers
        }
        None => Vec::new(),
    };

    if args.data_url {
        let mut renderer = Renderer::create(RgbaImage::new(0, 0), args.width, args.height, geography, config)?;
        renderer.set_markers(markers);
        renderer.render()?;
        let url = renderer.to_data_url()?;
        renderer.destroy()?;
        println!("{}", url);
        return Ok(());
    }

    println!("Rendering with seed: {}", config.seeds.master);
    println!(
        "Map size: {}x{} (device scale {})",
        args.width, args.height, config.device_scale
    );

    let sink = PngFileSink::new(&args.output);
    let mut renderer = Renderer::create(sink, args.width, args.height, geography, config)?;
    renderer.set_markers(markers);
    renderer.render()?;
    let sink = renderer.destroy()?;

    let (pw, ph) = sink.frame().dimensions();
    println!("Exported relief map to: {}", sink.path().display());
    println!("  Image size: {}x{} pixels", pw, ph);
    Ok(())
}
