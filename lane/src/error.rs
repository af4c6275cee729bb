use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaneError {
    #[error("invalid gaussian kernel: size {size} with variance {variance} (size must be odd, variance positive)")]
    InvalidKernel { size: u8, variance: f64 },

    #[error("image {width}x{height} is too small, both sides must be at least {min}")]
    ImageTooSmall { width: u16, height: u16, min: u16 },

    #[error("invalid theta range [{min}, {max}), expected min < max <= 180")]
    InvalidAngleRange { min: u16, max: u16 },

    #[error("invalid clustering arguments: {0}")]
    InvalidClustering(String),

    #[error("pixel buffer holds {actual} pixels, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("accumulator {width}x{height} does not fit in an image")]
    AccumulatorTooLarge { width: u32, height: u32 },

    #[error("failed to allocate {bytes} bytes")]
    AllocationFailed { bytes: usize },

    #[error("line from ({x1},{y1}) to ({x2},{y2}) is out of bounds ({width},{height})")]
    LineOutOfBounds {
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        width: u16,
        height: u16,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config error: {0}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum PpmError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("unsupported magic {0:?}, only binary P6 is supported")]
    BadMagic(String),

    #[error("malformed header: {0}")]
    MalformedHeader(String),

    #[error("image ({width} x {height}) is larger than allowed ({max} x {max})", max = crate::ppm::MAX_DIMENSION)]
    TooLarge { width: u32, height: u32 },

    #[error("unsupported maxval {0}, only 255 is supported")]
    UnsupportedMaxval(u32),

    #[error("expected {expected} bytes of pixel data, only {actual} bytes read")]
    Truncated { expected: usize, actual: usize },
}
