use super::image::{Image, Pixel};

/// Value given to weak edge pixels by [`double_threshold`].
pub const WEAK: u8 = 64;
/// Value given to strong edge pixels by [`double_threshold`].
pub const STRONG: u8 = 255;

/// Replace every pixel with a channel outside the inclusive `[lower, upper]`
/// range by `replacement`, in place.
pub fn threshold(img: &mut Image, lower: u8, upper: u8, replacement: u8) {
    let in_range = |v: u8| v >= lower && v <= upper;
    for px in &mut img.data {
        if in_range(px.r) && in_range(px.g) && in_range(px.b) {
            continue;
        }
        *px = Pixel::gray(replacement);
    }
}

/// Split an edge magnitude image into weak and strong edge images.
///
/// The weak image holds [`WEAK`] where `low <= v < high`, the strong image
/// holds [`STRONG`] where `v >= high`. Everything else is 0.
pub fn double_threshold(img: &Image, low: u8, high: u8) -> (Image, Image) {
    let mut weak = Image::new(img.width, img.height);
    let mut strong = Image::new(img.width, img.height);

    for (i, px) in img.data.iter().enumerate() {
        let v = px.r;
        if v >= high {
            strong.data[i] = Pixel::gray(STRONG);
        } else if v >= low {
            weak.data[i] = Pixel::gray(WEAK);
        }
    }
    (weak, strong)
}

/// Additively merge two images of equal size, saturating at 255.
pub fn merge(a: &Image, b: &Image) -> Image {
    assert_eq!((a.width, a.height), (b.width, b.height));
    let data = a
        .data
        .iter()
        .zip(&b.data)
        .map(|(p, q)| {
            Pixel::new(
                p.r.saturating_add(q.r),
                p.g.saturating_add(q.g),
                p.b.saturating_add(q.b),
            )
        })
        .collect();
    Image {
        width: a.width,
        height: a.height,
        data,
    }
}
