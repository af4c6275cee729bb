use crate::error::LaneError;

use super::image::{Image, Pixel};

const KX: [[i32; 3]; 3] = [[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]];
const KY: [[i32; 3]; 3] = [[1, 2, 1], [0, 0, 0], [-1, -2, -1]];

/// Output of the Sobel operator.
#[derive(Debug, Clone)]
pub struct Gradient {
    /// Gradient magnitude, clamped to `[0, 255]`, cropped by 1px on each side.
    pub magnitude: Image,
    /// Gradient direction `atan2(mx, my)` in radians, one per magnitude pixel.
    pub directions: Vec<f64>,
}

impl Gradient {
    #[inline]
    pub fn direction(&self, x: u16, y: u16) -> f64 {
        self.directions[y as usize * self.magnitude.width as usize + x as usize]
    }
}

/// Apply the Sobel-Feldman operator to the red channel of a grayscale image.
pub fn sobel(src: &Image) -> Result<Gradient, LaneError> {
    sobel_with_cutoff(src, 0)
}

/// [`sobel`], zeroing magnitudes below `cutoff`. Directions are kept.
pub fn sobel_with_cutoff(src: &Image, cutoff: u8) -> Result<Gradient, LaneError> {
    if src.width < 3 || src.height < 3 {
        return Err(LaneError::ImageTooSmall {
            width: src.width,
            height: src.height,
            min: 3,
        });
    }

    let out_w = src.width - 2;
    let out_h = src.height - 2;
    let mut magnitude = Image::new(out_w, out_h);
    let mut directions = Vec::with_capacity(out_w as usize * out_h as usize);

    for oy in 0..out_h {
        for ox in 0..out_w {
            let mut mx = 0i32;
            let mut my = 0i32;
            for a in 0..3 {
                for b in 0..3 {
                    let v = src.luma(ox + b as u16, oy + a as u16) as i32;
                    mx += v * KX[a][b];
                    my += v * KY[a][b];
                }
            }

            let m = (((mx * mx + my * my) as f64).sqrt() as i32).clamp(0, 255) as u8;
            if m >= cutoff {
                magnitude.set(ox, oy, Pixel::gray(m));
            }
            directions.push((mx as f64).atan2(my as f64));
        }
    }

    Ok(Gradient {
        magnitude,
        directions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn vertical_step(w: u16, h: u16, at: u16) -> Image {
        let mut img = Image::new(w, h);
        for y in 0..h {
            for x in at..w {
                img.set(x, y, Pixel::gray(100));
            }
        }
        img
    }

    #[test]
    fn flat_image_has_no_gradient() {
        let mut img = Image::new(5, 5);
        img.fill_solid(Pixel::gray(90));
        let grad = sobel(&img).unwrap();
        assert_eq!((grad.magnitude.width, grad.magnitude.height), (3, 3));
        assert!(grad.magnitude.data.iter().all(|&p| p == Pixel::BLACK));
        assert_eq!(grad.directions.len(), 9);
    }

    #[test]
    fn vertical_edge_points_along_x() {
        let img = vertical_step(6, 5, 3);
        let grad = sobel(&img).unwrap();
        // output (1, 1) is centred on source (2, 2), left of the step
        // mx = 100 + 200 + 100 = 400, my = 0
        assert_eq!(grad.magnitude.get(1, 1), Pixel::gray(255));
        assert!((grad.direction(1, 1) - FRAC_PI_2).abs() < 1e-12);
        // far left column sees no step
        assert_eq!(grad.magnitude.get(0, 1), Pixel::BLACK);
    }

    #[test]
    fn magnitude_matches_kernel_response() {
        let mut img = Image::new(3, 3);
        img.set(2, 0, Pixel::gray(30));
        img.set(2, 1, Pixel::gray(30));
        img.set(2, 2, Pixel::gray(30));
        let grad = sobel(&img).unwrap();
        // mx = 30 + 60 + 30 = 120, my = 30 - 30 = 0
        assert_eq!(grad.magnitude.get(0, 0).r, 120);
    }

    #[test]
    fn horizontal_edge_points_along_y() {
        let mut img = Image::new(5, 5);
        for y in 0..2 {
            for x in 0..5 {
                img.set(x, y, Pixel::gray(50));
            }
        }
        let grad = sobel(&img).unwrap();
        // top rows bright: my > 0, mx = 0
        assert!(grad.magnitude.get(1, 0).r > 0);
        assert!(grad.direction(1, 0).abs() < 1e-12);
    }

    #[test]
    fn fractional_magnitude_is_truncated() {
        let mut img = Image::new(3, 3);
        img.set(2, 0, Pixel::gray(2));
        let grad = sobel(&img).unwrap();
        // mx = 2, my = 2, sqrt(8) = 2.83
        assert_eq!(grad.magnitude.get(0, 0).r, 2);
        assert!((grad.direction(0, 0) - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
    }

    #[test]
    fn cutoff_zeroes_weak_magnitudes() {
        let mut faint = Image::new(3, 3);
        faint.set(2, 0, Pixel::gray(2));

        let grad = sobel_with_cutoff(&faint, 3).unwrap();
        assert_eq!(grad.magnitude.get(0, 0).r, 0);
        assert!((grad.direction(0, 0) - std::f64::consts::FRAC_PI_4).abs() < 1e-12);

        let grad = sobel_with_cutoff(&faint, 2).unwrap();
        assert_eq!(grad.magnitude.get(0, 0).r, 2);

        // a step only produces 0 or a clamped 255
        let img = vertical_step(6, 5, 3);
        let strong = sobel_with_cutoff(&img, 200).unwrap();
        assert_eq!(strong.magnitude.data, sobel(&img).unwrap().magnitude.data);
    }

    #[test]
    fn tiny_image_is_rejected() {
        assert!(sobel(&Image::new(2, 5)).is_err());
        assert!(sobel_with_cutoff(&Image::new(5, 2), 10).is_err());
    }
}
