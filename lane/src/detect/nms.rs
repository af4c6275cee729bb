use crate::error::LaneError;

use super::image::{Image, Pixel};
use super::sobel::Gradient;

/// Neighbor offsets along the gradient for each 45° direction bin.
///
/// Directions come from `atan2(mx, my)`, so 0° is a vertical gradient
/// (compare north/south) and 90° a horizontal one (compare east/west).
const NEIGHBORS: [[(i32, i32); 2]; 4] = [
    [(0, -1), (0, 1)],  // N / S
    [(1, -1), (-1, 1)], // NE / SW
    [(1, 0), (-1, 0)],  // E / W
    [(1, 1), (-1, -1)], // SE / NW
];

/// Quantize a direction in radians into one of four 45°-wide bins.
fn direction_bin(rad: f64) -> usize {
    let deg = rad.to_degrees().rem_euclid(180.0);
    (((deg + 22.5) / 45.0) as usize) % 4
}

/// Thin gradient magnitudes to one-pixel-wide ridges.
///
/// A pixel survives only if its magnitude is strictly greater than both
/// neighbors along its quantized gradient direction. The output is cropped
/// by 1px on each side relative to the magnitude image.
pub fn non_max_suppression(grad: &Gradient) -> Result<Image, LaneError> {
    let mag = &grad.magnitude;
    if mag.width < 3 || mag.height < 3 {
        return Err(LaneError::ImageTooSmall {
            width: mag.width,
            height: mag.height,
            min: 3,
        });
    }

    let mut out = Image::new(mag.width - 2, mag.height - 2);
    for y in 1..mag.height - 1 {
        for x in 1..mag.width - 1 {
            let m = mag.luma(x, y);
            let [(ax, ay), (bx, by)] = NEIGHBORS[direction_bin(grad.direction(x, y))];
            let n1 = mag.luma((x as i32 + ax) as u16, (y as i32 + ay) as u16);
            let n2 = mag.luma((x as i32 + bx) as u16, (y as i32 + by) as u16);
            if m > n1 && m > n2 {
                out.set(x - 1, y - 1, Pixel::gray(m));
            }
        }
    }
    Ok(out)
}
