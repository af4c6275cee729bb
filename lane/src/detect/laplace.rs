use crate::error::LaneError;

use super::image::{Image, Pixel};

const KERNEL: [[i32; 3]; 3] = [[0, -1, 0], [-1, 4, -1], [0, -1, 0]];

/// Convolve the 3x3 Laplacian kernel with the red channel of a grayscale
/// image. The response is clamped to `[0, 255]` and cropped by 1px.
pub fn laplace(src: &Image) -> Result<Image, LaneError> {
    if src.width < 3 || src.height < 3 {
        return Err(LaneError::ImageTooSmall {
            width: src.width,
            height: src.height,
            min: 3,
        });
    }

    let mut out = Image::new(src.width - 2, src.height - 2);
    for oy in 0..out.height {
        for ox in 0..out.width {
            let mut m = 0i32;
            for (i, row) in KERNEL.iter().enumerate() {
                for (j, k) in row.iter().enumerate() {
                    m += src.luma(ox + j as u16, oy + i as u16) as i32 * k;
                }
            }
            out.set(ox, oy, Pixel::gray(m.clamp(0, 255) as u8));
        }
    }
    Ok(out)
}
