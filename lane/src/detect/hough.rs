use tracing::{debug, error, trace};

use crate::error::LaneError;

use super::image::Image;

/// Red channel value a pixel must exceed to cast votes.
pub const WHITE_THRESHOLD: u8 = 128;

/// Chebyshev radius of the peak neighborhood.
const PEAK_RADIUS: i64 = 4;

const INITIAL_LINES_CAPACITY: usize = 50;

/// A line in normal form, `rho = x cos(theta) + y sin(theta)`.
///
/// `rho` is the accumulator row, i.e. the normal distance from the image
/// center shifted by half the accumulator height. `theta` is in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NormalLine {
    pub rho: u32,
    pub theta: u16,
}

/// Accumulator over `(rho, theta)`.
///
/// Row-major with `width` theta columns (column 0 is `theta_min`) and
/// `height` rho rows. Cells only ever increase while voting.
#[derive(Debug, Clone)]
pub struct HoughSpace {
    pub width: u32,
    pub height: u32,
    pub theta_min: u16,
    /// Added to the centered normal distance before rounding to a row.
    pub offset: f64,
    pub acc: Vec<u32>,
}

impl HoughSpace {
    /// Allocate an empty accumulator for a `src_width x src_height` image and
    /// the theta range `[min, max)`.
    pub fn new(src_width: u16, src_height: u16, min: u16, max: u16) -> Result<Self, LaneError> {
        if min >= max || max > 180 {
            return Err(LaneError::InvalidAngleRange { min, max });
        }

        let offset = std::f64::consts::SQRT_2 * src_width.max(src_height) as f64 / 2.0;
        let width = (max - min) as u32;
        let height = 2 * offset.round() as u32;
        let size = width as usize * height as usize;

        let mut acc = Vec::new();
        if acc.try_reserve_exact(size).is_err() {
            let bytes = size * std::mem::size_of::<u32>();
            error!(bytes, "allocating the accumulator failed");
            return Err(LaneError::AllocationFailed { bytes });
        }
        acc.resize(size, 0);

        Ok(Self {
            width,
            height,
            theta_min: min,
            offset,
            acc,
        })
    }

    /// Wrap existing votes, e.g. a synthetic accumulator.
    pub fn from_votes(
        width: u32,
        height: u32,
        theta_min: u16,
        acc: Vec<u32>,
    ) -> Result<Self, LaneError> {
        let expected = width as usize * height as usize;
        if acc.len() != expected {
            return Err(LaneError::DimensionMismatch {
                expected,
                actual: acc.len(),
            });
        }
        Ok(Self {
            width,
            height,
            theta_min,
            offset: (height / 2) as f64,
            acc,
        })
    }

    pub fn size(&self) -> usize {
        self.acc.len()
    }

    /// Votes at accumulator row `rho` and column `col`.
    #[inline]
    pub fn votes(&self, rho: u32, col: u32) -> u32 {
        self.acc[(rho * self.width + col) as usize]
    }

    /// Cast the votes of every white pixel in `src`.
    ///
    /// Votes accumulate on top of existing ones, so voting twice is the same
    /// as voting once with the union of both images' pixels.
    pub fn vote(&mut self, src: &Image) {
        let cx = (src.width / 2) as f64;
        let cy = (src.height / 2) as f64;

        let trig: Vec<(f64, f64)> = (0..self.width)
            .map(|col| {
                let rad = (self.theta_min as f64 + col as f64).to_radians();
                (rad.cos(), rad.sin())
            })
            .collect();

        for y in 0..src.height {
            for x in 0..src.width {
                if src.luma(x, y) <= WHITE_THRESHOLD {
                    continue;
                }
                let dx = x as f64 - cx;
                let dy = y as f64 - cy;
                for (col, &(cos, sin)) in trig.iter().enumerate() {
                    let rho = (dx * cos + dy * sin + self.offset).round();
                    if rho < 0.0 || rho >= self.height as f64 {
                        continue;
                    }
                    self.acc[rho as usize * self.width as usize + col] += 1;
                }
            }
        }
    }

    /// True if no cell within [`PEAK_RADIUS`] of `(rho, col)` has strictly
    /// more votes. Ties count as peaks.
    fn is_peak(&self, rho: u32, col: u32) -> bool {
        let v = self.votes(rho, col);
        for dy in -PEAK_RADIUS..=PEAK_RADIUS {
            let r = rho as i64 + dy;
            if r < 0 || r >= self.height as i64 {
                continue;
            }
            for dx in -PEAK_RADIUS..=PEAK_RADIUS {
                let c = col as i64 + dx;
                if c < 0 || c >= self.width as i64 {
                    continue;
                }
                if self.votes(r as u32, c as u32) > v {
                    return false;
                }
            }
        }
        true
    }

    /// Extract every local peak with at least `threshold` votes, in row-major
    /// scan order.
    pub fn classify(&self, threshold: u32) -> Vec<NormalLine> {
        let mut lines = Vec::with_capacity(INITIAL_LINES_CAPACITY);
        for rho in 0..self.height {
            for col in 0..self.width {
                if self.votes(rho, col) < threshold || !self.is_peak(rho, col) {
                    continue;
                }
                let line = NormalLine {
                    rho,
                    theta: self.theta_min + col as u16,
                };
                trace!(rho = line.rho, theta = line.theta, "detected peak");
                lines.push(line);
            }
        }
        lines
    }
}

/// Result of [`hough`]: the filled accumulator and its peaks.
#[derive(Debug, Clone)]
pub struct HoughResult {
    pub space: HoughSpace,
    pub lines: Vec<NormalLine>,
}

/// Detect straight lines in a thresholded edge image.
///
/// Every white edge pixel votes once per integer angle in `[min, max)` for
/// the cell matching its normal distance at that angle. Peaks are cells at
/// or above `threshold` that no cell in their 9x9 neighborhood strictly
/// exceeds.
///
/// An empty `lines` means nothing reached `threshold`; failures are reported
/// through `Err`.
pub fn hough(src: &Image, min: u16, max: u16, threshold: u32) -> Result<HoughResult, LaneError> {
    let mut space = HoughSpace::new(src.width, src.height, min, max)?;
    space.vote(src);
    let lines = space.classify(threshold);
    debug!(
        width = space.width,
        height = space.height,
        lines = lines.len(),
        "hough transform done"
    );
    Ok(HoughResult { space, lines })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::image::Pixel;

    fn horizontal_line(w: u16, h: u16, row: u16) -> Image {
        let mut img = Image::new(w, h);
        for x in 0..w {
            img.set(x, row, Pixel::WHITE);
        }
        img
    }

    #[test]
    fn space_dimensions() {
        let space = HoughSpace::new(100, 60, 0, 180).unwrap();
        assert_eq!(space.width, 180);
        // sqrt(2) * 100 / 2 = 70.71 -> 71
        assert_eq!(space.height, 142);
        assert_eq!(space.size(), 180 * 142);
        assert!(space.acc.iter().all(|&v| v == 0));

        let narrow = HoughSpace::new(60, 100, 30, 60).unwrap();
        assert_eq!(narrow.width, 30);
        assert_eq!(narrow.height, 142);
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        for (min, max) in [(10, 10), (20, 10), (0, 181)] {
            assert!(matches!(
                HoughSpace::new(10, 10, min, max),
                Err(LaneError::InvalidAngleRange { .. })
            ));
        }
    }

    #[test]
    fn black_image_casts_no_votes() {
        let img = Image::new(4, 4);
        let result = hough(&img, 0, 180, 1).unwrap();
        assert!(result.space.acc.iter().all(|&v| v == 0));
        assert!(result.lines.is_empty());
    }

    #[test]
    fn gray_at_threshold_does_not_vote() {
        let mut img = Image::new(4, 4);
        img.fill_solid(Pixel::gray(WHITE_THRESHOLD));
        let result = hough(&img, 0, 180, 1).unwrap();
        assert!(result.space.acc.iter().all(|&v| v == 0));
    }

    #[test]
    fn each_white_pixel_votes_once_per_angle() {
        let mut img = Image::new(10, 10);
        img.set(3, 7, Pixel::WHITE);
        img.set(6, 2, Pixel::WHITE);
        let mut space = HoughSpace::new(10, 10, 10, 100).unwrap();
        space.vote(&img);
        let total: u32 = space.acc.iter().sum();
        assert_eq!(total, 2 * 90);
    }

    #[test]
    fn horizontal_line_is_detected_at_90_degrees() {
        let img = horizontal_line(100, 100, 50);
        let result = hough(&img, 0, 180, 100).unwrap();
        assert_eq!(result.lines.len(), 1, "{:?}", result.lines);
        assert_eq!(result.lines[0].theta, 90);
        // centered distance 0, shifted by half of 142
        assert_eq!(result.lines[0].rho, 71);
    }

    #[test]
    fn vertical_line_is_detected_at_0_degrees() {
        let mut img = Image::new(80, 80);
        for y in 0..80 {
            img.set(20, y, Pixel::WHITE);
        }
        let result = hough(&img, 0, 180, 80).unwrap();
        assert_eq!(result.lines.len(), 1, "{:?}", result.lines);
        assert_eq!(result.lines[0].theta, 0);
        // x - cx = -20, offset = 56.57
        assert_eq!(result.lines[0].rho, 37);
    }

    #[test]
    fn offset_range_reports_absolute_theta() {
        let img = horizontal_line(100, 100, 50);
        let result = hough(&img, 80, 100, 100).unwrap();
        assert_eq!(result.space.width, 20);
        assert_eq!(result.lines.len(), 1);
        assert_eq!(result.lines[0].theta, 90);
    }

    #[test]
    fn voting_is_monotonic() {
        let a = horizontal_line(40, 40, 10);
        let mut union = a.clone();
        for y in 0..40 {
            union.set(30, y, Pixel::WHITE);
        }

        let mut only_a = HoughSpace::new(40, 40, 0, 180).unwrap();
        only_a.vote(&a);
        let mut both = HoughSpace::new(40, 40, 0, 180).unwrap();
        both.vote(&union);

        for (i, (&va, &vb)) in only_a.acc.iter().zip(&both.acc).enumerate() {
            assert!(vb >= va, "cell {i}: {vb} < {va}");
        }
    }

    fn plateau(value: u32) -> HoughSpace {
        // 11x11 accumulator, every cell at value - 1 except the center
        let mut acc = vec![value - 1; 121];
        acc[5 * 11 + 5] = value;
        HoughSpace::from_votes(11, 11, 0, acc).unwrap()
    }

    #[test]
    fn classify_threshold_boundary() {
        let space = plateau(20);
        let lines = space.classify(20);
        assert_eq!(lines, vec![NormalLine { rho: 5, theta: 5 }]);
        assert!(space.classify(21).is_empty());
    }

    #[test]
    fn classify_accepts_ties() {
        let mut acc = vec![0u32; 100];
        acc[2 * 10 + 2] = 9;
        acc[2 * 10 + 4] = 9;
        let space = HoughSpace::from_votes(10, 10, 0, acc).unwrap();
        assert_eq!(space.classify(5).len(), 2);
    }

    #[test]
    fn classify_suppresses_within_radius() {
        let mut acc = vec![0u32; 20 * 20];
        acc[10 * 20 + 10] = 9;
        acc[14 * 20 + 14] = 10; // Chebyshev distance 4
        acc[10 * 20 + 15] = 3; // out of reach of the 9, not of the 10
        let space = HoughSpace::from_votes(20, 20, 0, acc).unwrap();
        assert_eq!(space.classify(3), vec![NormalLine { rho: 14, theta: 14 }]);

        let mut acc = vec![0u32; 20 * 20];
        acc[10 * 20 + 10] = 9;
        acc[15 * 20 + 15] = 10; // distance 5
        let space = HoughSpace::from_votes(20, 20, 0, acc).unwrap();
        assert_eq!(space.classify(3).len(), 2);
    }

    #[test]
    fn from_votes_checks_length() {
        assert!(HoughSpace::from_votes(3, 3, 0, vec![0; 8]).is_err());
    }
}
