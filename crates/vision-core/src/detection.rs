use crate::font::draw_text_line;
use crate::frame::Frame;
use vision_detection::{classify, mean_hsv, ColorName, DetectionError, HsvSample, Region};

pub const OVERLAY_BGR: [u8; 3] = [0, 255, 0];
pub const OUTLINE_THICKNESS: u32 = 2;
pub const LABEL_ORIGIN: (u32, u32) = (10, 30);
pub const LABEL_SCALE: u32 = 2;

/// Result of sampling the centre of one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reading {
    pub sample: HsvSample,
    pub color: ColorName,
}

/// Locates the centre region for the frame's current dimensions.
pub fn center_region(frame: &Frame, rect_size: u32) -> Result<Region, DetectionError> {
    Region::centered(frame.width(), frame.height(), rect_size)
}

/// Averages the region in HSV and names its color.
pub fn read_region(frame: &Frame, region: Region) -> Result<Reading, DetectionError> {
    let sample = mean_hsv(region.view(frame.view()))?;
    Ok(Reading {
        sample,
        color: classify(sample),
    })
}

/// Outlines the centred `rect_size` square, straddling its edge like a
/// stroked rectangle. The square may hang off a frame smaller than the
/// region; only the part inside the frame is drawn.
pub fn draw_outline(frame: &mut Frame, rect_size: u32) {
    let x0 = (frame.width() / 2) as i64 - (rect_size / 2) as i64;
    let y0 = (frame.height() / 2) as i64 - (rect_size / 2) as i64;
    let x1 = x0 + rect_size as i64;
    let y1 = y0 + rect_size as i64;
    let (max_x, max_y) = (frame.width() as i64 - 1, frame.height() as i64 - 1);

    for t in 0..OUTLINE_THICKNESS as i64 {
        let off = t - OUTLINE_THICKNESS as i64 / 2;
        let (left, top, right, bottom) = (x0 + off, y0 + off, x1 - off, y1 - off);
        for x in left.max(0)..=right.min(max_x) {
            frame.put_pixel(x, top, OVERLAY_BGR);
            frame.put_pixel(x, bottom, OVERLAY_BGR);
        }
        for y in top.max(0)..=bottom.min(max_y) {
            frame.put_pixel(left, y, OVERLAY_BGR);
            frame.put_pixel(right, y, OVERLAY_BGR);
        }
    }
}

pub fn draw_label(frame: &mut Frame, color: ColorName) {
    let text = format!("Color: {color}");
    let (x, baseline) = LABEL_ORIGIN;
    draw_text_line(frame, x, baseline, &text, OVERLAY_BGR, LABEL_SCALE);
}
