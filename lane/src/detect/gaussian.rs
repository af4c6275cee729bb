use crate::error::LaneError;

use super::image::{Image, Pixel};

#[cfg(feature = "parallel")]
use rayon::iter::{IntoParallelIterator, ParallelIterator};

/// Build a normalized `size x size` Gaussian kernel, stored row-major.
fn gaussian_kernel(size: usize, variance: f64) -> Vec<f64> {
    let r = (size / 2) as f64;
    let denom = 2.0 * variance * variance;
    let mut kernel = Vec::with_capacity(size * size);
    for y in 0..size {
        for x in 0..size {
            let dy = y as f64 - r;
            let dx = x as f64 - r;
            kernel.push((-(dy * dy + dx * dx) / denom).exp());
        }
    }
    let total: f64 = kernel.iter().sum();
    for v in &mut kernel {
        *v /= total;
    }
    kernel
}

/// Blur an image with a square Gaussian kernel of odd `size` and standard
/// deviation `variance`.
///
/// The kernel has no support within `r = (size - 1) / 2` pixels of the border,
/// so those pixels are dropped: the output is `(w - 2r) x (h - 2r)`. Channels
/// are convolved independently and truncated to integers.
pub fn gaussian(src: &Image, size: u8, variance: f64) -> Result<Image, LaneError> {
    if size % 2 == 0 || !(variance.is_finite() && variance > 0.0) {
        return Err(LaneError::InvalidKernel { size, variance });
    }

    let ksz = size as usize;
    let radius = (ksz / 2) as u16;
    if src.width <= 2 * radius || src.height <= 2 * radius {
        return Err(LaneError::ImageTooSmall {
            width: src.width,
            height: src.height,
            min: 2 * radius + 1,
        });
    }

    let kernel = gaussian_kernel(ksz, variance);
    let out_w = src.width - 2 * radius;
    let out_h = src.height - 2 * radius;

    let convolve_row = |oy: u16| -> Vec<Pixel> {
        (0..out_w)
            .map(|ox| {
                let (mut r, mut g, mut b) = (0.0f64, 0.0f64, 0.0f64);
                for ky in 0..ksz {
                    for kx in 0..ksz {
                        let k = kernel[ky * ksz + kx];
                        let p = src.get(ox + kx as u16, oy + ky as u16);
                        r += p.r as f64 * k;
                        g += p.g as f64 * k;
                        b += p.b as f64 * k;
                    }
                }
                Pixel::new(r as u8, g as u8, b as u8)
            })
            .collect()
    };

    #[cfg(feature = "parallel")]
    let rows: Vec<Vec<Pixel>> = (0..out_h).into_par_iter().map(convolve_row).collect();

    #[cfg(not(feature = "parallel"))]
    let rows: Vec<Vec<Pixel>> = (0..out_h).map(convolve_row).collect();

    Image::from_pixels(out_w, out_h, rows.concat())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(w: u16, h: u16) -> Image {
        let mut img = Image::new(w, h);
        for y in 0..h {
            for x in 0..w {
                let v = if (x + y) % 2 == 0 { 200 } else { 10 };
                img.set(x, y, Pixel::new(v, v / 2, 255 - v));
            }
        }
        img
    }

    #[test]
    fn kernel_sums_to_one() {
        let k = gaussian_kernel(5, 1.0);
        assert_eq!(k.len(), 25);
        let sum: f64 = k.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn kernel_is_symmetric_and_peaks_at_center() {
        let k = gaussian_kernel(5, 1.5);
        assert!((k[0] - k[24]).abs() < 1e-15);
        assert!((k[1] - k[5]).abs() < 1e-15);
        assert!(k.iter().all(|&v| v <= k[12]));
    }

    #[test]
    fn size_one_is_identity() {
        let img = checkerboard(7, 5);
        let out = gaussian(&img, 1, 3.0).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn output_is_cropped_by_radius() {
        let img = checkerboard(20, 12);
        let out = gaussian(&img, 5, 6.0).unwrap();
        assert_eq!((out.width, out.height), (16, 8));
    }

    #[test]
    fn uniform_image_stays_near_uniform() {
        let mut img = Image::new(9, 9);
        img.fill_solid(Pixel::gray(100));
        let out = gaussian(&img, 3, 1.0).unwrap();
        for p in &out.data {
            // truncation may lose one unit to float rounding
            assert!(p.r == 100 || p.r == 99, "{p:?}");
        }
    }

    #[test]
    fn blur_spreads_a_peak() {
        let mut img = Image::new(9, 9);
        img.set(4, 4, Pixel::WHITE);
        let out = gaussian(&img, 3, 1.0).unwrap();
        // (4,4) in the source is (3,3) in the cropped output
        assert!(out.get(3, 3).r < 255);
        assert!(out.get(2, 3).r > 0);
        assert!(out.get(3, 2).r > 0);
    }

    #[test]
    fn convolution_truncates() {
        let mut img = Image::new(3, 3);
        img.set(1, 1, Pixel::gray(200));
        let out = gaussian(&img, 3, 1.0).unwrap();
        // center weight is 1 / (1 + 4e^-0.5 + 4e^-1) = 0.20418, 200 * w = 40.84
        assert_eq!((out.width, out.height), (1, 1));
        assert_eq!(out.get(0, 0), Pixel::gray(40));
    }

    #[test]
    fn even_size_is_rejected() {
        let img = checkerboard(8, 8);
        assert!(matches!(
            gaussian(&img, 4, 1.0),
            Err(LaneError::InvalidKernel { size: 4, .. })
        ));
    }

    #[test]
    fn zero_variance_is_rejected() {
        let img = checkerboard(8, 8);
        assert!(matches!(
            gaussian(&img, 3, 0.0),
            Err(LaneError::InvalidKernel { .. })
        ));
    }

    #[test]
    fn kernel_larger_than_image_is_rejected() {
        let img = checkerboard(4, 10);
        assert!(matches!(
            gaussian(&img, 5, 1.0),
            Err(LaneError::ImageTooSmall { min: 5, .. })
        ));
    }
}
