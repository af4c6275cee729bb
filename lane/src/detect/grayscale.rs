use super::image::{Image, Pixel};

// Rec. ITU-R BT.601-7 luma weights, as used by MATLAB rgb2gray.
const R_WEIGHT: f64 = 0.2989;
const G_WEIGHT: f64 = 0.5870;
const B_WEIGHT: f64 = 0.1140;

/// Convert an RGB image to grayscale in place, writing the luminance to all
/// three channels.
pub fn grayscale(img: &mut Image) {
    for px in &mut img.data {
        let v = px.r as f64 * R_WEIGHT + px.g as f64 * G_WEIGHT + px.b as f64 * B_WEIGHT;
        *px = Pixel::gray(v as u8);
    }
}
