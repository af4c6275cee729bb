use tracing::{debug, info, warn};

#[cfg(feature = "serde")]
use crate::error::ConfigError;
use crate::error::LaneError;

use super::gaussian::gaussian;
use super::grayscale::grayscale;
use super::hough::{hough, HoughResult, NormalLine};
use super::hysteresis::hysteresis;
use super::image::{Image, Pixel};
use super::kmeans::{kmeans, Medoid};
use super::nms::non_max_suppression;
use super::plot::{plot_graph, plot_line};
use super::resolve::{resolve_line, ResolvedLine};
use super::sobel::sobel_with_cutoff;
use super::threshold::{double_threshold, merge};

/// Gaussian blur parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct GaussianParams {
    /// Odd kernel size.
    pub size: u8,
    /// Standard deviation of the kernel.
    pub variance: f64,
}

impl Default for GaussianParams {
    fn default() -> Self {
        Self {
            size: 5,
            variance: 6.0,
        }
    }
}

/// Hysteresis thresholds applied to the thinned gradient magnitude.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct EdgeParams {
    /// Sobel magnitudes below this are zeroed before suppression.
    pub cutoff: u8,
    pub low: u8,
    pub high: u8,
}

impl Default for EdgeParams {
    fn default() -> Self {
        Self {
            cutoff: 0,
            low: 40,
            high: 80,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct HoughParams {
    /// Inclusive lower bound of theta, in degrees.
    pub theta_min: u16,
    /// Exclusive upper bound of theta, in degrees.
    pub theta_max: u16,
    /// Minimum votes for a peak.
    pub threshold: u32,
}

impl Default for HoughParams {
    fn default() -> Self {
        Self {
            theta_min: 0,
            theta_max: 180,
            threshold: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct KMeansParams {
    pub clusters: u8,
    pub iterations: u32,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self {
            clusters: 2,
            iterations: 255,
        }
    }
}

/// Detector configuration.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct DetectorConfig {
    pub gaussian: GaussianParams,
    pub edges: EdgeParams,
    pub hough: HoughParams,
    pub kmeans: KMeansParams,
}

#[cfg(feature = "serde")]
impl DetectorConfig {
    /// Parse a TOML document. Missing tables and keys take their defaults.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Everything produced by one run of the detector.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Binary edge image the Hough transform ran on.
    pub edges: Image,
    /// Accumulator rendered as grayscale. `None` when it is taller or wider
    /// than an `Image` can be.
    pub accumulator: Option<Image>,
    /// Height of the Hough accumulator, needed to resolve `lines` and `lanes`.
    pub space_height: u32,
    /// Copy of the input with Hough lines in red and lanes in green.
    pub overlay: Image,
    /// Hough peaks, in edge-image coordinates.
    pub lines: Vec<NormalLine>,
    /// `lines` resolved to segments, in edge-image coordinates.
    pub resolved: Vec<ResolvedLine>,
    /// Lane medoids. Empty when clustering was skipped.
    pub lanes: Vec<Medoid>,
    /// Pixels cropped from each side of the input to get `edges`.
    pub crop: u16,
}

/// Runs the full lane detection pipeline on still images.
pub struct Detector {
    pub config: DetectorConfig,
}

impl Detector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Detect lane lines in an RGB image.
    pub fn detect(&self, img: &Image) -> Result<Detection, LaneError> {
        let cfg = &self.config;

        // Stage 1: Grayscale
        let mut gray = img.clone();
        grayscale(&mut gray);

        // Stage 2: Gaussian blur
        let blurred = gaussian(&gray, cfg.gaussian.size, cfg.gaussian.variance)?;
        debug!(width = blurred.width, height = blurred.height, "blurred");

        // Stage 3: Sobel gradient
        let grad = sobel_with_cutoff(&blurred, cfg.edges.cutoff)?;

        // Stage 4: Non-maximum suppression
        let thin = non_max_suppression(&grad)?;

        // Stage 5: Double threshold + hysteresis
        let (weak, strong) = double_threshold(&thin, cfg.edges.low, cfg.edges.high);
        let edges = hysteresis(&merge(&weak, &strong));
        debug!(width = edges.width, height = edges.height, "edges linked");

        // Stage 6: Hough transform
        let HoughResult { space, lines } = hough(
            &edges,
            cfg.hough.theta_min,
            cfg.hough.theta_max,
            cfg.hough.threshold,
        )?;
        let accumulator = match plot_graph(&space) {
            Ok(img) => Some(img),
            Err(e) => {
                warn!(%e, "skipping accumulator image");
                None
            }
        };

        // Stage 7: Resolve lines and draw them
        let crop = cfg.gaussian.size as u16 / 2 + 2;
        let offset = crop as i32;
        let mut overlay = img.clone();
        let resolved: Vec<ResolvedLine> = lines
            .iter()
            .map(|&line| resolve_line(line, edges.width, edges.height, space.height))
            .collect();
        for line in &resolved {
            if let Err(e) = plot_line(&mut overlay, &line.translate(offset, offset), Pixel::RED) {
                warn!(%e, "skipping hough line");
            }
        }

        // Stage 8: Cluster lines into lanes
        let lanes = match kmeans(&lines, cfg.kmeans.iterations, cfg.kmeans.clusters) {
            Ok(lanes) => lanes,
            Err(e) => {
                warn!(%e, "skipping lane clustering");
                Vec::new()
            }
        };
        for &lane in &lanes {
            let line = resolve_line(lane.into(), edges.width, edges.height, space.height);
            if let Err(e) = plot_line(&mut overlay, &line.translate(offset, offset), Pixel::GREEN) {
                warn!(%e, "skipping lane");
            }
        }

        info!(lines = lines.len(), lanes = lanes.len(), "detection done");

        Ok(Detection {
            edges,
            accumulator,
            space_height: space.height,
            overlay,
            lines,
            resolved,
            lanes,
            crop,
        })
    }
}
