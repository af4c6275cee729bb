use crate::error::LaneError;

use super::hough::NormalLine;

/// A cluster representative that Lloyd's algorithm can move.
pub trait Representative: Copy {
    type Point: Copy;

    fn distance(&self, point: &Self::Point) -> f64;

    /// Mean of the assigned points, or `None` when the cluster is empty.
    fn mean(points: &[Self::Point]) -> Option<Self>;
}

/// Per-point scratch state during assignment.
#[derive(Debug, Clone, Copy)]
struct Mapped {
    cluster: u8,
    nearest: f64,
}

/// Index of the closest representative. The first one wins ties.
pub(crate) fn nearest<R: Representative>(reps: &[R], point: &R::Point) -> usize {
    let mut best = Mapped {
        cluster: 0,
        nearest: f64::INFINITY,
    };
    for (j, rep) in reps.iter().enumerate() {
        let d = rep.distance(point);
        if d < best.nearest {
            best = Mapped {
                cluster: j as u8,
                nearest: d,
            };
        }
    }
    best.cluster as usize
}

/// Lloyd's k-means, shared by line clustering and pixel segmentation.
///
/// Runs a fixed number of assign/update rounds. Empty clusters keep their
/// representative.
pub(crate) fn lloyd<R: Representative>(points: &[R::Point], reps: &mut [R], iterations: u32) {
    let mut members: Vec<Vec<R::Point>> = vec![Vec::new(); reps.len()];
    for _ in 0..iterations {
        for bucket in &mut members {
            bucket.clear();
        }
        for p in points {
            members[nearest(reps, p)].push(*p);
        }
        for (rep, bucket) in reps.iter_mut().zip(&members) {
            if let Some(mean) = R::mean(bucket) {
                *rep = mean;
            }
        }
    }
}

pub(crate) fn check_clusters(clusters: u8, available: usize) -> Result<usize, LaneError> {
    if clusters == 0 {
        return Err(LaneError::InvalidClustering(
            "at least one cluster is required".into(),
        ));
    }
    if clusters as usize > available {
        return Err(LaneError::InvalidClustering(format!(
            "{clusters} clusters requested but only {available} inputs to seed from"
        )));
    }
    Ok(clusters as usize)
}

/// Running mean of a group of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Medoid {
    pub theta: u16,
    pub rho: u32,
}

impl From<NormalLine> for Medoid {
    fn from(line: NormalLine) -> Self {
        Self {
            theta: line.theta,
            rho: line.rho,
        }
    }
}

impl From<Medoid> for NormalLine {
    fn from(m: Medoid) -> Self {
        Self {
            rho: m.rho,
            theta: m.theta,
        }
    }
}

impl Representative for Medoid {
    type Point = NormalLine;

    fn distance(&self, line: &NormalLine) -> f64 {
        let dt = self.theta as f64 - line.theta as f64;
        let dr = self.rho as f64 - line.rho as f64;
        (dt * dt + dr * dr).sqrt()
    }

    fn mean(lines: &[NormalLine]) -> Option<Self> {
        if lines.is_empty() {
            return None;
        }
        let n = lines.len() as u64;
        let theta: u64 = lines.iter().map(|l| l.theta as u64).sum();
        let rho: u64 = lines.iter().map(|l| l.rho as u64).sum();
        Some(Self {
            theta: (theta / n) as u16,
            rho: (rho / n) as u32,
        })
    }
}

/// Picks the initial medoids for line clustering.
pub trait LineSeeding {
    fn seed(&self, lines: &[NormalLine], clusters: u8) -> Result<Vec<Medoid>, LaneError>;
}

/// The first `k` lines after a stable sort by theta.
#[derive(Debug, Clone, Copy, Default)]
pub struct SortedByTheta;

impl LineSeeding for SortedByTheta {
    fn seed(&self, lines: &[NormalLine], clusters: u8) -> Result<Vec<Medoid>, LaneError> {
        let k = check_clusters(clusters, lines.len())?;
        let mut sorted = lines.to_vec();
        sorted.sort_by_key(|l| l.theta);
        Ok(sorted.into_iter().take(k).map(Medoid::from).collect())
    }
}

/// The first `k` lines in input order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstK;

impl LineSeeding for FirstK {
    fn seed(&self, lines: &[NormalLine], clusters: u8) -> Result<Vec<Medoid>, LaneError> {
        let k = check_clusters(clusters, lines.len())?;
        Ok(lines[..k].iter().copied().map(Medoid::from).collect())
    }
}

/// Group lines into `clusters` medoids, seeded with [`SortedByTheta`].
///
/// Distances are Euclidean in `(theta, rho)`. With `iterations == 0` the
/// seeds are returned unchanged.
pub fn kmeans(lines: &[NormalLine], iterations: u32, clusters: u8) -> Result<Vec<Medoid>, LaneError> {
    kmeans_with(lines, iterations, clusters, &SortedByTheta)
}

/// [`kmeans`] with an explicit seeding strategy.
pub fn kmeans_with<S: LineSeeding + ?Sized>(
    lines: &[NormalLine],
    iterations: u32,
    clusters: u8,
    seeding: &S,
) -> Result<Vec<Medoid>, LaneError> {
    if lines.is_empty() {
        return Err(LaneError::InvalidClustering("no lines to cluster".into()));
    }
    let mut medoids = seeding.seed(lines, clusters)?;
    lloyd(lines, &mut medoids, iterations);
    Ok(medoids)
}
