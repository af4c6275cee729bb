use std::collections::VecDeque;

use super::image::{Image, Pixel};
use super::threshold::{STRONG, WEAK};

/// Link weak edges to strong ones.
///
/// Takes a merged weak/strong image (see [`super::threshold::double_threshold`]
/// and [`super::threshold::merge`]). Strong pixels are kept, weak pixels are
/// kept only when they are 8-connected to a strong pixel, directly or through
/// other weak pixels. Kept pixels become 255, everything else 0.
pub fn hysteresis(merged: &Image) -> Image {
    let w = merged.width as usize;
    let h = merged.height as usize;
    let mut out = Image::new(merged.width, merged.height);
    let mut queue = VecDeque::new();

    for (i, px) in merged.data.iter().enumerate() {
        if px.r == STRONG {
            out.data[i] = Pixel::WHITE;
            queue.push_back(i);
        }
    }

    while let Some(i) = queue.pop_front() {
        let x = (i % w) as i64;
        let y = (i / w) as i64;
        for dy in -1..=1i64 {
            for dx in -1..=1i64 {
                let nx = x + dx;
                let ny = y + dy;
                if nx < 0 || nx >= w as i64 || ny < 0 || ny >= h as i64 {
                    continue;
                }
                let j = ny as usize * w + nx as usize;
                if merged.data[j].r == WEAK && out.data[j] != Pixel::WHITE {
                    out.data[j] = Pixel::WHITE;
                    queue.push_back(j);
                }
            }
        }
    }

    out
}
