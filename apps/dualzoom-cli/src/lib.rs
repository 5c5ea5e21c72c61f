//! `dualzoom`: side-by-side Deep Zoom viewing from the command line.
//!
//! The subcommands cover the whole path an image takes: cut it into a
//! pyramid (`tile`), push the pyramid to the bucket (`publish`), check the
//! bucket is live (`probe`), emit the browser viewer options (`page`),
//! render a single overlay (`overlay`) and run both viewer panels headlessly
//! against storage (`view`).

pub mod error;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{ArgGroup, Parser, Subcommand, ValueEnum};

use dualzoom_core::{Polygon, Rgba, Style};
use dualzoom_io::{
    check_connectivity, publish_dir, spawn_connectivity_check, DeepZoomCreator, Health,
    HttpFetcher, HttpObjectSink, StorageConfig, StorageCredentials, TileFormat,
};
use dualzoom_renderer::{OverlayRegion, OverlayRenderer, SurfaceSize};
use dualzoom_viewer::{default_overlays, AppConfig, Bootstrapper, HeadlessEngine, PanelState};

pub use error::CliError;

#[derive(Parser)]
#[command(name = "dualzoom")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    /// JSON config file with storage, panels and overlay surface size.
    #[arg(long, global = true, env = "DUALZOOM_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    storage: StorageArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Storage settings that override the config file.
#[derive(clap::Args, Debug, Default)]
struct StorageArgs {
    /// Object storage endpoint, e.g. http://localhost:9000.
    #[arg(long, global = true, env = "DUALZOOM_ENDPOINT")]
    endpoint: Option<String>,

    /// Bucket holding the images.
    #[arg(long, global = true, env = "DUALZOOM_BUCKET")]
    bucket: Option<String>,

    /// Signing region for uploads.
    #[arg(long, global = true, env = "DUALZOOM_REGION")]
    region: Option<String>,

    /// Access key for signed uploads.
    #[arg(long, global = true, env = "DUALZOOM_ACCESS_KEY", requires = "secret_key")]
    access_key: Option<String>,

    /// Secret key for signed uploads.
    #[arg(
        long,
        global = true,
        env = "DUALZOOM_SECRET_KEY",
        hide_env_values = true,
        requires = "access_key"
    )]
    secret_key: Option<String>,
}

impl StorageArgs {
    fn apply(&self, mut storage: StorageConfig) -> StorageConfig {
        if let Some(endpoint) = &self.endpoint {
            storage.endpoint = endpoint.clone();
        }
        if let Some(bucket) = &self.bucket {
            storage.bucket = bucket.clone();
        }
        if let Some(region) = &self.region {
            storage.region = region.clone();
        }
        if let (Some(access_key), Some(secret_key)) = (&self.access_key, &self.secret_key) {
            storage.credentials = Some(StorageCredentials::new(access_key, secret_key));
        }
        storage
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the browser viewer options for every panel as JSON.
    Page(PageArgs),
    /// Render one overlay polygon to a PNG and print its placement.
    Overlay(OverlayArgs),
    /// Cut an image into a Deep Zoom pyramid.
    Tile(TileArgs),
    /// Upload a directory (typically a pyramid) into the bucket.
    Publish(PublishArgs),
    /// Check the storage liveness endpoint once.
    Probe,
    /// Open both panels headlessly and report their status.
    View(ViewArgs),
}

#[derive(clap::Args)]
struct PageArgs {
    /// Print the whole resolved config instead of viewer options only.
    #[arg(long)]
    full: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Shape {
    Diamond,
    Triangle,
}

impl Shape {
    fn name(&self) -> &'static str {
        match self {
            Shape::Diamond => "diamond",
            Shape::Triangle => "triangle",
        }
    }
}

#[derive(clap::Args)]
#[command(group(ArgGroup::new("polygon").required(true).args(["shape", "points"])))]
struct OverlayArgs {
    /// One of the built-in overlays.
    #[arg(long, value_enum)]
    shape: Option<Shape>,

    /// Custom polygon in normalized coordinates: "x,y;x,y;x,y".
    #[arg(long)]
    points: Option<String>,

    /// Fill color (#rrggbb, #rrggbbaa, rgb(), rgba()).
    #[arg(long)]
    fill: Option<Rgba>,

    /// Outline color.
    #[arg(long)]
    stroke: Option<Rgba>,

    /// Outline width in surface pixels; 0 disables the outline.
    #[arg(long)]
    stroke_width: Option<f32>,

    /// Square surface edge in pixels. Defaults to the configured surface.
    #[arg(long)]
    size: Option<u32>,

    /// PNG file to write.
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(clap::Args)]
struct TileArgs {
    /// Source image.
    source: PathBuf,

    /// Descriptor path to write, e.g. out/sample1.dzi.
    destination: PathBuf,

    #[arg(long, default_value_t = 254)]
    tile_size: u32,

    #[arg(long, default_value_t = 1)]
    overlap: u32,

    /// Tile encoding ('jpg' or 'png').
    #[arg(long, default_value = "jpg")]
    format: TileFormat,

    /// JPEG quality, 1-100.
    #[arg(long, default_value_t = 85)]
    quality: u8,
}

#[derive(clap::Args)]
struct PublishArgs {
    /// Directory whose files are uploaded, keyed by relative path.
    dir: PathBuf,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

#[derive(clap::Args)]
struct ViewArgs {
    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Canvas size of each headless viewer, "WIDTHxHEIGHT".
    #[arg(long, default_value = "800x600")]
    canvas: String,

    /// Print the panel report as JSON.
    #[arg(long)]
    json: bool,
}

/// Run the dualzoom CLI. Called from `main.rs`.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let config = resolve_config(cli.config.as_deref(), &cli.storage)?;

    match cli.command {
        Commands::Page(args) => run_page(&config, args),
        Commands::Overlay(args) => run_overlay(&config, args),
        Commands::Tile(args) => run_tile(args),
        Commands::Publish(args) => run_publish(&config, args),
        Commands::Probe => run_probe(&config),
        Commands::View(args) => run_view(config, args),
    }
}

/// Config file first, then storage flags on top.
///
/// Without a config file the default panels are built against the resolved
/// storage. With one, panel sources inside the file's bucket follow the
/// flags to the new location.
fn resolve_config(path: Option<&Path>, flags: &StorageArgs) -> Result<AppConfig, CliError> {
    let Some(path) = path else {
        return Ok(AppConfig::for_storage(flags.apply(StorageConfig::default())));
    };

    let mut config = AppConfig::load(path)?;
    let storage = flags.apply(config.storage.clone());
    config.retarget_storage(storage);
    Ok(config)
}

fn run_page(config: &AppConfig, args: PageArgs) -> Result<(), CliError> {
    let json = if args.full {
        config.to_json()?
    } else {
        serde_json::to_string_pretty(&config.viewer_options())?
    };
    println!("{}", json);
    Ok(())
}

fn parse_points(text: &str) -> Result<Vec<(f64, f64)>, CliError> {
    text.split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (x, y) = pair
                .split_once(',')
                .ok_or_else(|| CliError::InvalidArgument(format!("point '{}' is not 'x,y'", pair)))?;
            let parse = |v: &str| {
                v.trim()
                    .parse::<f64>()
                    .map_err(|_| CliError::InvalidArgument(format!("'{}' is not a number", v.trim())))
            };
            Ok((parse(x)?, parse(y)?))
        })
        .collect()
}

fn parse_canvas(text: &str) -> Result<(f64, f64), CliError> {
    let invalid = || CliError::InvalidArgument(format!("canvas '{}' is not WIDTHxHEIGHT", text));
    let (w, h) = text.split_once(['x', 'X']).ok_or_else(invalid)?;
    let w: u32 = w.trim().parse().map_err(|_| invalid())?;
    let h: u32 = h.trim().parse().map_err(|_| invalid())?;
    if w == 0 || h == 0 {
        return Err(invalid());
    }
    Ok((f64::from(w), f64::from(h)))
}

fn run_overlay(config: &AppConfig, args: OverlayArgs) -> Result<(), CliError> {
    let (polygon, mut style) = match (args.shape, args.points.as_deref()) {
        (Some(shape), _) => {
            let spec = default_overlays()
                .into_iter()
                .find(|o| o.name == shape.name())
                .ok_or_else(|| CliError::InvalidArgument(format!("no built-in '{}'", shape.name())))?;
            (spec.polygon, spec.style)
        }
        (None, Some(points)) => (Polygon::from_pairs(&parse_points(points)?)?, Style::default()),
        (None, None) => {
            return Err(CliError::InvalidArgument("either --shape or --points is required".into()))
        }
    };
    if let Some(fill) = args.fill {
        style.fill = fill;
    }
    if let Some(stroke) = args.stroke {
        style.stroke = stroke;
    }
    if let Some(width) = args.stroke_width {
        style.stroke_width = width;
    }

    let size = args.size.map(SurfaceSize::square).unwrap_or(config.surface);
    let mut rendered: Vec<OverlayRegion> = Vec::new();
    OverlayRenderer::new(size).render(&mut rendered, &polygon, &style)?;

    for overlay in &rendered {
        fs::write(&args.output, overlay.surface.encode_png()?)?;
        log::info!("Wrote {}x{} overlay to {}", size.width, size.height, args.output.display());
        println!("{}", serde_json::to_string_pretty(&overlay.placement())?);
    }
    Ok(())
}

fn run_tile(args: TileArgs) -> Result<(), CliError> {
    let creator = DeepZoomCreator {
        tile_size: args.tile_size,
        overlap: args.overlap,
        format: args.format,
        quality: args.quality,
    };
    let descriptor = creator.create(&args.source, &args.destination)?;
    println!(
        "{}: {}x{}, {} levels, {} tiles",
        args.destination.display(),
        descriptor.width,
        descriptor.height,
        descriptor.level_count(),
        descriptor.tile_count()
    );
    Ok(())
}

fn run_publish(config: &AppConfig, args: PublishArgs) -> Result<(), CliError> {
    let sink = HttpObjectSink::new(config.storage.clone(), Duration::from_secs(args.timeout));
    let report = publish_dir(&sink, &args.dir)?;
    println!(
        "Published {} object(s), {} bytes to {}",
        report.objects,
        report.bytes,
        config.storage.object_url("")
    );
    Ok(())
}

fn run_probe(config: &AppConfig) -> Result<(), CliError> {
    let url = config.storage.liveness_url();
    match check_connectivity(&config.storage) {
        Health::Healthy => {
            println!("{}: live", url);
            Ok(())
        }
        Health::Degraded { status } => Err(CliError::Unhealthy {
            url,
            detail: format!("HTTP {}", status),
        }),
        Health::Unreachable { message } => Err(CliError::Unhealthy { url, detail: message }),
    }
}

fn run_view(config: AppConfig, args: ViewArgs) -> Result<(), CliError> {
    let (width, height) = parse_canvas(&args.canvas)?;
    let probe = spawn_connectivity_check(config.storage.clone());

    let engine = HeadlessEngine::new(HttpFetcher::new(Duration::from_secs(args.timeout)))
        .with_canvas(width, height);
    let mut boot = Bootstrapper::new(engine, OverlayRenderer::new(config.surface));
    for spec in config.panels {
        boot.add_panel(spec);
    }
    boot.run();

    let report = boot.report();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for panel in &report {
            println!("{}", panel.status);
        }
    }

    // The probe only logs; wait for it so its line is not lost on exit.
    if probe.join().is_err() {
        log::warn!("Connectivity check thread panicked");
    }

    let failed = report.iter().filter(|p| p.state == PanelState::Failed).count();
    if failed > 0 {
        return Err(CliError::PanelsFailed {
            failed,
            total: report.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_points() {
        let points = parse_points("0.1,0.2; 0.3,0.4;0.5 , 0.6;").unwrap();
        assert_eq!(points, vec![(0.1, 0.2), (0.3, 0.4), (0.5, 0.6)]);
        assert!(matches!(parse_points("0.1;0.2"), Err(CliError::InvalidArgument(_))));
        assert!(matches!(parse_points("a,0.2"), Err(CliError::InvalidArgument(_))));
    }

    #[test]
    fn test_parse_canvas() {
        assert_eq!(parse_canvas("1024x768").unwrap(), (1024.0, 768.0));
        assert!(parse_canvas("0x10").is_err());
        assert!(parse_canvas("wide").is_err());
    }

    #[test]
    fn test_resolve_config_without_file() {
        let flags = StorageArgs {
            endpoint: Some("http://minio:9000".into()),
            ..Default::default()
        };
        let config = resolve_config(None, &flags).unwrap();
        assert_eq!(config.storage.bucket, "images");
        assert_eq!(
            config.panels[0].viewer.tile_sources.url(),
            "http://minio:9000/images/sample1.dzi"
        );
    }

    #[test]
    fn test_resolve_config_flags_override_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, AppConfig::default().to_json().unwrap()).unwrap();

        let flags = StorageArgs {
            bucket: Some("slides".into()),
            ..Default::default()
        };
        let config = resolve_config(Some(&path), &flags).unwrap();
        assert_eq!(config.storage.bucket, "slides");
        assert_eq!(config.storage.endpoint, "http://localhost:9000");
        // Panel sources follow the storage flags.
        assert_eq!(
            config.panels[0].viewer.tile_sources.url(),
            "http://localhost:9000/slides/sample1.dzi"
        );
        assert_eq!(
            config.panels[1].viewer.tile_sources.url(),
            "http://localhost:9000/slides/sample2.jpg"
        );
    }

    #[test]
    fn test_resolve_config_credentials_and_region() {
        let flags = StorageArgs {
            region: Some("eu-central-1".into()),
            access_key: Some("minioadmin".into()),
            secret_key: Some("minioadmin".into()),
            ..Default::default()
        };
        let config = resolve_config(None, &flags).unwrap();
        assert_eq!(config.storage.region, "eu-central-1");
        assert_eq!(
            config.storage.credentials,
            Some(StorageCredentials::new("minioadmin", "minioadmin"))
        );
        // Secrets never reach printed config.
        assert!(!config.to_json().unwrap().contains("credentials"));
    }

    #[test]
    fn test_secret_key_requires_access_key() {
        let result = Cli::try_parse_from(["dualzoom", "--secret-key", "s", "page"]);
        assert!(result.is_err());
        let cli = Cli::try_parse_from(["dualzoom", "page", "--access-key", "a", "--secret-key", "s"]).unwrap();
        assert_eq!(cli.storage.access_key.as_deref(), Some("a"));
    }
}
