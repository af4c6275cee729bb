use crate::error::LaneError;

use super::hough::HoughSpace;
use super::image::{Image, Pixel};
use super::kmeans::Medoid;
use super::resolve::{resolve_line, ResolvedLine};

/// Draw a resolved line. Lines with an endpoint outside the image are
/// rejected rather than clipped.
pub fn plot_line(img: &mut Image, line: &ResolvedLine, color: Pixel) -> Result<(), LaneError> {
    img.draw_line(color, (line.x1, line.y1), (line.x2, line.y2))
}

/// Draw a lane medoid as a full line across the image.
pub fn plot_medoid(
    img: &mut Image,
    space: &HoughSpace,
    medoid: Medoid,
    color: Pixel,
) -> Result<ResolvedLine, LaneError> {
    let line = resolve_line(medoid.into(), img.width, img.height, space.height);
    plot_line(img, &line, color)?;
    Ok(line)
}

/// Render the accumulator as a grayscale image, clamping votes to 255.
pub fn plot_graph(space: &HoughSpace) -> Result<Image, LaneError> {
    let too_large = || LaneError::AccumulatorTooLarge {
        width: space.width,
        height: space.height,
    };
    let width = u16::try_from(space.width).map_err(|_| too_large())?;
    let height = u16::try_from(space.height).map_err(|_| too_large())?;
    let data = space
        .acc
        .iter()
        .map(|&v| Pixel::gray(v.min(255) as u8))
        .collect();
    Image::from_pixels(width, height, data)
}
