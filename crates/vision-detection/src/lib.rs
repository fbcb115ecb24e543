pub mod color;
pub mod sample;

pub use color::{classify, ColorName, HsvSample};
pub use sample::{mean_hsv, DetectionError, Region};
