use crate::error::LaneError;

use super::image::{Image, Pixel};
use super::kmeans::{check_clusters, lloyd, nearest, Representative};

/// Mean luminance of a pixel cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Centroid {
    pub luminance: u8,
}

impl Representative for Centroid {
    type Point = u8;

    fn distance(&self, v: &u8) -> f64 {
        (self.luminance as f64 - *v as f64).abs()
    }

    fn mean(values: &[u8]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let sum: u64 = values.iter().map(|&v| v as u64).sum();
        Some(Self {
            luminance: (sum / values.len() as u64) as u8,
        })
    }
}

/// Picks the initial centroids for pixel segmentation.
pub trait LuminanceSeeding {
    fn seed(&self, img: &Image, clusters: u8) -> Result<Vec<Centroid>, LaneError>;
}

/// `{0, 255}` for two clusters (lane / background), otherwise the luminance
/// of `k` pixels spread evenly through the image.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampledLuminance;

impl LuminanceSeeding for SampledLuminance {
    fn seed(&self, img: &Image, clusters: u8) -> Result<Vec<Centroid>, LaneError> {
        let k = check_clusters(clusters, img.data.len())?;
        if k == 2 {
            return Ok(vec![Centroid { luminance: 0 }, Centroid { luminance: 255 }]);
        }
        let step = img.data.len() / k;
        Ok((0..k)
            .map(|i| Centroid {
                luminance: img.data[i * step].r,
            })
            .collect())
    }
}

/// Segment a grayscale image into `clusters` luminance levels, in place.
///
/// After the iterations every pixel is replaced by the luminance of its
/// nearest centroid.
pub fn segment(img: &mut Image, iterations: u32, clusters: u8) -> Result<Vec<Centroid>, LaneError> {
    segment_with(img, iterations, clusters, &SampledLuminance)
}

/// [`segment`] with an explicit seeding strategy.
pub fn segment_with<S: LuminanceSeeding + ?Sized>(
    img: &mut Image,
    iterations: u32,
    clusters: u8,
    seeding: &S,
) -> Result<Vec<Centroid>, LaneError> {
    if img.data.is_empty() {
        return Err(LaneError::InvalidClustering("image has no pixels".into()));
    }
    let mut centroids = seeding.seed(img, clusters)?;
    let values: Vec<u8> = img.data.iter().map(|p| p.r).collect();
    lloyd(&values, &mut centroids, iterations);

    for (px, v) in img.data.iter_mut().zip(&values) {
        *px = Pixel::gray(centroids[nearest(&centroids, v)].luminance);
    }
    Ok(centroids)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(values: &[u8]) -> Image {
        let data = values.iter().map(|&v| Pixel::gray(v)).collect();
        Image::from_pixels(values.len() as u16, 1, data).unwrap()
    }

    #[test]
    fn two_clusters_seed_black_and_white() {
        let img = image(&[5, 6, 7]);
        let seeds = SampledLuminance.seed(&img, 2).unwrap();
        assert_eq!(seeds, vec![Centroid { luminance: 0 }, Centroid { luminance: 255 }]);
    }

    #[test]
    fn other_counts_sample_the_image() {
        let img = image(&[10, 20, 30, 40, 50, 60]);
        let seeds = SampledLuminance.seed(&img, 3).unwrap();
        assert_eq!(
            seeds.iter().map(|c| c.luminance).collect::<Vec<_>>(),
            vec![10, 30, 50]
        );
    }

    #[test]
    fn binary_segmentation() {
        let mut img = image(&[10, 20, 30, 200, 220, 240]);
        let centroids = segment(&mut img, 10, 2).unwrap();
        assert_eq!(centroids, vec![Centroid { luminance: 20 }, Centroid { luminance: 220 }]);
        let out: Vec<u8> = img.data.iter().map(|p| p.r).collect();
        assert_eq!(out, vec![20, 20, 20, 220, 220, 220]);
        assert!(img.data.iter().all(|p| p.r == p.g && p.g == p.b));
    }

    #[test]
    fn zero_iterations_relabels_to_seeds() {
        let mut img = image(&[10, 100, 200]);
        let centroids = segment(&mut img, 0, 2).unwrap();
        assert_eq!(centroids, vec![Centroid { luminance: 0 }, Centroid { luminance: 255 }]);
        let out: Vec<u8> = img.data.iter().map(|p| p.r).collect();
        assert_eq!(out, vec![0, 0, 255]);
    }

    #[test]
    fn three_levels() {
        let mut img = image(&[0, 2, 4, 100, 102, 104, 250, 252, 254]);
        let centroids = segment(&mut img, 20, 3).unwrap();
        assert_eq!(
            centroids.iter().map(|c| c.luminance).collect::<Vec<_>>(),
            vec![2, 102, 252]
        );
    }

    #[test]
    fn invalid_arguments_are_rejected() {
        let mut img = image(&[1, 2, 3]);
        assert!(segment(&mut img, 10, 0).is_err());
        assert!(segment(&mut img, 10, 4).is_err());
        assert_eq!(img.data[0], Pixel::gray(1));
    }
}
