use crate::error::LaneError;

/// An RGB pixel. Grayscale images keep `r == g == b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Pixel {
    pub const BLACK: Pixel = Pixel::gray(0);
    pub const WHITE: Pixel = Pixel::gray(255);
    pub const RED: Pixel = Pixel::new(255, 0, 0);
    pub const GREEN: Pixel = Pixel::new(0, 255, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// A pixel with all three channels set to `v`.
    pub const fn gray(v: u8) -> Self {
        Self { r: v, g: v, b: v }
    }
}

/// RGB raster with row-major pixel data.
///
/// `data.len() == width * height` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub width: u16,
    pub height: u16,
    pub data: Vec<Pixel>,
}

impl Image {
    /// Create a new black image.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            data: vec![Pixel::BLACK; width as usize * height as usize],
        }
    }

    /// Create an image from existing pixel data.
    pub fn from_pixels(width: u16, height: u16, data: Vec<Pixel>) -> Result<Self, LaneError> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(LaneError::DimensionMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Get the pixel at (x, y).
    #[inline]
    pub fn get(&self, x: u16, y: u16) -> Pixel {
        self.data[self.index(x, y)]
    }

    /// Set the pixel at (x, y).
    #[inline]
    pub fn set(&mut self, x: u16, y: u16, pixel: Pixel) {
        let idx = self.index(x, y);
        self.data[idx] = pixel;
    }

    /// Luminance at (x, y), read from the red channel.
    #[inline]
    pub fn luma(&self, x: u16, y: u16) -> u8 {
        self.get(x, y).r
    }

    /// Fill every pixel with a solid color.
    pub fn fill_solid(&mut self, color: Pixel) {
        self.data.fill(color);
    }

    /// Draw a line with Bresenham's algorithm.
    ///
    /// Endpoints must lie within `[0, width] x [0, height]`, otherwise nothing
    /// is drawn. Points on the far edge (`x == width` or `y == height`) are
    /// accepted but not painted.
    pub fn draw_line(
        &mut self,
        color: Pixel,
        (x1, y1): (i32, i32),
        (x2, y2): (i32, i32),
    ) -> Result<(), LaneError> {
        let w = self.width as i32;
        let h = self.height as i32;
        let inside = |x: i32, y: i32| (0..=w).contains(&x) && (0..=h).contains(&y);
        if !inside(x1, y1) || !inside(x2, y2) {
            return Err(LaneError::LineOutOfBounds {
                x1,
                y1,
                x2,
                y2,
                width: self.width,
                height: self.height,
            });
        }

        let dx = (x2 - x1).abs();
        let dy = (y2 - y1).abs();
        let sx = if x1 < x2 { 1 } else { -1 };
        let sy = if y1 < y2 { 1 } else { -1 };
        let mut err = (if dx > dy { dx } else { -dy }) / 2;

        let (mut x, mut y) = (x1, y1);
        loop {
            if x < w && y < h {
                self.set(x as u16, y as u16, color);
            }
            if x == x2 && y == y2 {
                break;
            }
            let e2 = err;
            if e2 > -dx {
                err -= dy;
                x += sx;
            }
            if e2 < dy {
                err += dx;
                y += sy;
            }
        }
        Ok(())
    }
}
