use ndarray::{Array2, ArrayView2};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq)]
// An image frame in BGR order, indexed `[row, column]`.
pub struct Frame {
    pixels: Array2<[u8; 3]>,
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Buffer size doesn't match: expected {expected} bytes, got {actual}")]
    InvalidDimensions { expected: usize, actual: usize },

    #[error("Provided dimensions are zero")]
    ZeroDimensions,

    #[error("Could not decode image: {0}")]
    Decode(#[from] image::ImageError),
}

impl Frame {
    // Builds a frame from packed BGR bytes, validating the buffer against the dimensions.
    pub fn from_bgr(data: &[u8], width: u32, height: u32) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::ZeroDimensions);
        }

        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(FrameError::InvalidDimensions {
                expected,
                actual: data.len(),
            });
        }

        let pixels: Vec<[u8; 3]> = data
            .chunks_exact(3)
            .map(|p| [p[0], p[1], p[2]])
            .collect();
        let pixels = Array2::from_shape_vec((height as usize, width as usize), pixels).map_err(
            |_| FrameError::InvalidDimensions {
                expected,
                actual: data.len(),
            },
        )?;
        Ok(Self { pixels })
    }

    // Fills a frame with one BGR color.
    pub fn solid(width: u32, height: u32, bgr: [u8; 3]) -> Self {
        Self {
            pixels: Array2::from_elem((height as usize, width as usize), bgr),
        }
    }

    // Decodes an encoded still (JPEG or PNG) and reorders it to BGR.
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        let mut rgb = image::load_from_memory(bytes)?.to_rgb8();
        let (width, height) = rgb.dimensions();
        for pixel in rgb.pixels_mut() {
            pixel.0.swap(0, 2);
        }
        Self::from_bgr(rgb.as_raw(), width, height)
    }

    pub fn width(&self) -> u32 {
        self.pixels.ncols() as u32
    }

    pub fn height(&self) -> u32 {
        self.pixels.nrows() as u32
    }

    pub fn view(&self) -> ArrayView2<'_, [u8; 3]> {
        self.pixels.view()
    }

    // Returns the BGR pixel at (x, y) if inside bounds.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        self.pixels.get((y as usize, x as usize)).copied()
    }

    // Writes a pixel, ignoring coordinates outside the frame.
    pub fn put_pixel(&mut self, x: i64, y: i64, bgr: [u8; 3]) {
        if x < 0 || y < 0 {
            return;
        }
        if let Some(pixel) = self.pixels.get_mut((y as usize, x as usize)) {
            *pixel = bgr;
        }
    }

    // Converts to a 0RGB 32-bit buffer
    pub fn write_u32(&self, buf: &mut Vec<u32>) {
        buf.clear();
        buf.extend(
            self.pixels
                .iter()
                .map(|p| ((p[2] as u32) << 16) | ((p[1] as u32) << 8) | (p[0] as u32)),
        );
    }
}
