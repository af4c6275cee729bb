pub mod image;
pub mod grayscale;
pub mod threshold;
#[allow(clippy::needless_range_loop)]
pub mod gaussian;
#[allow(clippy::needless_range_loop)]
pub mod sobel;
#[allow(clippy::needless_range_loop)]
pub mod laplace;
pub mod nms;
pub mod hysteresis;
#[allow(clippy::needless_range_loop)]
pub mod hough;
pub mod resolve;
pub mod plot;
pub mod kmeans;
pub mod segment;
pub mod detector;
