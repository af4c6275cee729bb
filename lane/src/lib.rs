pub mod error;
pub mod ppm;
pub mod detect;
