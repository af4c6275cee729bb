use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use lane::detect::detector::{Detection, Detector, DetectorConfig};
use lane::detect::grayscale::grayscale;
use lane::detect::image::{Image, Pixel};
use lane::detect::laplace::laplace;
use lane::detect::resolve::resolve_line;
use lane::detect::segment::segment;
use lane::ppm;

/// Lane marking detection CLI: find straight lane lines in road images
#[derive(Parser)]
#[command(name = "lane-detect", version)]
struct Args {
    /// Input image files (PPM, PNG or JPEG)
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// TOML file with detector settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Gaussian kernel size (odd)
    #[arg(long)]
    blur_size: Option<u8>,

    /// Gaussian standard deviation
    #[arg(long)]
    blur_variance: Option<f64>,

    /// Zero Sobel magnitudes below this value
    #[arg(long)]
    sobel_cutoff: Option<u8>,

    /// Weak edge threshold
    #[arg(long)]
    low: Option<u8>,

    /// Strong edge threshold
    #[arg(long)]
    high: Option<u8>,

    /// Minimum Hough votes for a line
    #[arg(short, long)]
    threshold: Option<u32>,

    /// First theta to search, in degrees
    #[arg(long)]
    theta_min: Option<u16>,

    /// End of the theta range (exclusive), in degrees
    #[arg(long)]
    theta_max: Option<u16>,

    /// Number of lanes to cluster lines into
    #[arg(short = 'k', long)]
    clusters: Option<u8>,

    /// Maximum k-means iterations
    #[arg(long)]
    iterations: Option<u32>,

    /// Directory for the overlay, edge and accumulator images
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Format of the written images
    #[arg(long, value_enum, default_value_t = Format::Png)]
    format: Format,

    /// Also write a Laplacian edge image
    #[arg(long)]
    laplace: bool,

    /// Also write a luminance segmentation with this many clusters
    #[arg(long)]
    segment: Option<u8>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Png,
    Ppm,
}

impl Format {
    fn extension(self) -> &'static str {
        match self {
            Format::Png => "png",
            Format::Ppm => "ppm",
        }
    }
}

#[derive(Serialize)]
struct OutputResult {
    file: String,
    image_width: u16,
    image_height: u16,
    lines: Vec<OutputLine>,
    lanes: Vec<OutputLine>,
}

#[derive(Serialize)]
struct OutputLine {
    theta: u16,
    rho: u32,
    /// Segment endpoints in input image coordinates.
    endpoints: [[i32; 2]; 2],
}

fn init_logging(quiet: bool) {
    let default = if quiet { "error" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn build_config(args: &Args) -> Result<DetectorConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            DetectorConfig::from_toml_str(&text)
                .with_context(|| format!("invalid config: {}", path.display()))?
        }
        None => DetectorConfig::default(),
    };

    if let Some(v) = args.blur_size {
        config.gaussian.size = v;
    }
    if let Some(v) = args.blur_variance {
        config.gaussian.variance = v;
    }
    if let Some(v) = args.sobel_cutoff {
        config.edges.cutoff = v;
    }
    if let Some(v) = args.low {
        config.edges.low = v;
    }
    if let Some(v) = args.high {
        config.edges.high = v;
    }
    if let Some(v) = args.threshold {
        config.hough.threshold = v;
    }
    if let Some(v) = args.theta_min {
        config.hough.theta_min = v;
    }
    if let Some(v) = args.theta_max {
        config.hough.theta_max = v;
    }
    if let Some(v) = args.clusters {
        config.kmeans.clusters = v;
    }
    if let Some(v) = args.iterations {
        config.kmeans.iterations = v;
    }
    Ok(config)
}

fn is_ppm(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ppm"))
}

fn load_image(path: &Path) -> Result<Image> {
    if is_ppm(path) {
        return ppm::read_ppm_file(path)
            .with_context(|| format!("failed to read ppm: {}", path.display()));
    }

    let img = image::open(path)
        .with_context(|| format!("failed to open image: {}", path.display()))?
        .into_rgb8();
    let (Ok(width), Ok(height)) = (u16::try_from(img.width()), u16::try_from(img.height())) else {
        bail!(
            "image {} is too large ({}x{})",
            path.display(),
            img.width(),
            img.height()
        );
    };
    let data = img
        .into_raw()
        .chunks_exact(3)
        .map(|c| Pixel::new(c[0], c[1], c[2]))
        .collect();
    Ok(Image::from_pixels(width, height, data)?)
}

fn save_image(path: &Path, img: &Image) -> Result<()> {
    if is_ppm(path) {
        return ppm::write_ppm_file(path, img)
            .with_context(|| format!("failed to write ppm: {}", path.display()));
    }

    let raw: Vec<u8> = img.data.iter().flat_map(|p| [p.r, p.g, p.b]).collect();
    let buf = image::RgbImage::from_raw(img.width as u32, img.height as u32, raw)
        .context("pixel buffer does not match image size")?;
    buf.save(path)
        .with_context(|| format!("failed to write image: {}", path.display()))
}

fn write_outputs(
    dir: &Path,
    stem: &str,
    format: Format,
    src: &Image,
    det: &Detection,
    config: &DetectorConfig,
    args: &Args,
) -> Result<()> {
    let ext = format.extension();
    let out = |name: &str| dir.join(format!("{stem}_{name}.{ext}"));

    save_image(&out("overlay"), &det.overlay)?;
    save_image(&out("edges"), &det.edges)?;
    match &det.accumulator {
        Some(acc) => save_image(&out("hough"), acc)?,
        None => warn!("accumulator too large to write"),
    }

    if args.laplace {
        let mut gray = src.clone();
        grayscale(&mut gray);
        save_image(&out("laplace"), &laplace(&gray)?)?;
    }

    if let Some(k) = args.segment {
        let mut gray = src.clone();
        grayscale(&mut gray);
        match segment(&mut gray, config.kmeans.iterations, k) {
            Ok(centroids) => {
                info!(?centroids, "segmented");
                save_image(&out("segmented"), &gray)?;
            }
            Err(e) => warn!(%e, "skipping segmentation"),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.quiet);

    let config = build_config(&args)?;
    let detector = Detector::new(config);

    if let Some(dir) = &args.out_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    for image_path in &args.images {
        let img = load_image(image_path)?;
        info!(
            file = %image_path.display(),
            width = img.width,
            height = img.height,
            "detecting"
        );

        let det = detector
            .detect(&img)
            .with_context(|| format!("detection failed: {}", image_path.display()))?;

        let offset = det.crop as i32;
        let lines = det
            .lines
            .iter()
            .zip(&det.resolved)
            .map(|(line, seg)| {
                let seg = seg.translate(offset, offset);
                OutputLine {
                    theta: line.theta,
                    rho: line.rho,
                    endpoints: [[seg.x1, seg.y1], [seg.x2, seg.y2]],
                }
            })
            .collect();
        let lanes = det
            .lanes
            .iter()
            .map(|&medoid| {
                let seg = resolve_line(
                    medoid.into(),
                    det.edges.width,
                    det.edges.height,
                    det.space_height,
                )
                .translate(offset, offset);
                OutputLine {
                    theta: medoid.theta,
                    rho: medoid.rho,
                    endpoints: [[seg.x1, seg.y1], [seg.x2, seg.y2]],
                }
            })
            .collect();

        if let Some(dir) = &args.out_dir {
            let stem = image_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string());
            write_outputs(dir, &stem, args.format, &img, &det, &detector.config, &args)?;
        }

        let result = OutputResult {
            file: image_path.display().to_string(),
            image_width: img.width,
            image_height: img.height,
            lines,
            lanes,
        };

        let json = if args.pretty {
            serde_json::to_string_pretty(&result)?
        } else {
            serde_json::to_string(&result)?
        };
        println!("{json}");
    }

    Ok(())
}
