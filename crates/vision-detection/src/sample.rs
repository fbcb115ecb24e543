use crate::color::{bgr_to_hsv, HsvSample};
use ndarray::{s, ArrayView2};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DetectionError {
    #[error("frame of {width}x{height} is smaller than the {size}x{size} sample region")]
    FrameTooSmall { width: u32, height: u32, size: u32 },

    #[error("sample region has no pixels")]
    EmptyRegion,
}

/// Square sampling window, `size` pixels wide, with its top-left corner at (`x`, `y`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

impl Region {
    /// Centres a `size`-pixel square on a `width` x `height` frame using integer division.
    pub fn centered(width: u32, height: u32, size: u32) -> Result<Self, DetectionError> {
        if size == 0 {
            return Err(DetectionError::EmptyRegion);
        }
        if width < size || height < size {
            return Err(DetectionError::FrameTooSmall {
                width,
                height,
                size,
            });
        }
        Ok(Self {
            x: width / 2 - size / 2,
            y: height / 2 - size / 2,
            size,
        })
    }

    /// Borrows the region's pixels out of a full frame (rows are y, columns are x).
    pub fn view<'a, T>(&self, frame: ArrayView2<'a, T>) -> ArrayView2<'a, T> {
        let (x, y, size) = (self.x as usize, self.y as usize, self.size as usize);
        frame.slice_move(s![y..y + size, x..x + size])
    }
}

/// Converts every BGR pixel to HSV and returns the per-channel mean, truncated.
pub fn mean_hsv(region: ArrayView2<[u8; 3]>) -> Result<HsvSample, DetectionError> {
    let count = region.len() as u64;
    if count == 0 {
        return Err(DetectionError::EmptyRegion);
    }

    let mut sums = [0u64; 3];
    for &[b, g, r] in region.iter() {
        let (h, s, v) = bgr_to_hsv(b, g, r);
        sums[0] += h as u64;
        sums[1] += s as u64;
        sums[2] += v as u64;
    }

    Ok(HsvSample::new(
        (sums[0] / count) as u8,
        (sums[1] / count) as u8,
        (sums[2] / count) as u8,
    ))
}
