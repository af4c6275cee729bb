use tracing::trace;

use super::hough::NormalLine;

/// A line segment in image coordinates.
///
/// Endpoints are signed: extreme lines may resolve outside the raster, and
/// drawing rejects those instead of clipping them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolvedLine {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl ResolvedLine {
    /// Shift both endpoints by `(dx, dy)`.
    pub fn translate(self, dx: i32, dy: i32) -> Self {
        Self {
            x1: self.x1 + dx,
            y1: self.y1 + dy,
            x2: self.x2 + dx,
            y2: self.y2 + dy,
        }
    }
}

/// Convert a normal line to a segment spanning a `width x height` image.
///
/// `space_height` is the height of the accumulator the line came from; half
/// of it is subtracted from `rho` to undo the voting offset. Lines with
/// `45 <= theta <= 135` are solved for `y` at `x = 0` and `x = width`, the
/// rest for `x` at `y = 0` and `y = height`.
pub fn resolve_line(line: NormalLine, width: u16, height: u16, space_height: u32) -> ResolvedLine {
    let rad = (line.theta as f64).to_radians();
    let (cos, sin) = (rad.cos(), rad.sin());
    let rho = line.rho as f64 - (space_height / 2) as f64;
    let (w, h) = (width as i32, height as i32);

    // coord2 = (rho - (coord1 - dim1 / 2) * trig1) / trig2 + dim2 / 2
    let solve = |coord: i32, dim1: i32, dim2: i32, trig1: f64, trig2: f64| -> i32 {
        let v = (rho - (coord - dim1 / 2) as f64 * trig1) / trig2 + (dim2 / 2) as f64;
        v.round() as i32
    };

    let resolved = if (45..=135).contains(&line.theta) {
        ResolvedLine {
            x1: 0,
            y1: solve(0, w, h, cos, sin),
            x2: w,
            y2: solve(w, w, h, cos, sin),
        }
    } else {
        ResolvedLine {
            x1: solve(0, h, w, sin, cos),
            y1: 0,
            x2: solve(h, h, w, sin, cos),
            y2: h,
        }
    };

    trace!(
        rho = line.rho,
        theta = line.theta,
        x1 = resolved.x1,
        y1 = resolved.y1,
        x2 = resolved.x2,
        y2 = resolved.y2,
        "resolved line"
    );
    resolved
}
