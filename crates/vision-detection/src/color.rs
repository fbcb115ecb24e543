use std::fmt;

/// Human-readable names produced by [`classify`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorName {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Pink,
    Black,
    White,
    Gray,
    Unknown,
}

impl ColorName {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ColorName::Red => "Red",
            ColorName::Orange => "Orange",
            ColorName::Yellow => "Yellow",
            ColorName::Green => "Green",
            ColorName::Blue => "Blue",
            ColorName::Purple => "Purple",
            ColorName::Pink => "Pink",
            ColorName::Black => "Black",
            ColorName::White => "White",
            ColorName::Gray => "Gray",
            ColorName::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ColorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Averaged HSV triple of a region. Hue is in half-degrees, `0..=180`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HsvSample {
    pub hue: u8,
    pub saturation: u8,
    pub value: u8,
}

impl HsvSample {
    pub const fn new(hue: u8, saturation: u8, value: u8) -> Self {
        Self {
            hue,
            saturation,
            value,
        }
    }
}

/// A named HSV interval. `lower` and `upper` are inclusive `[h, s, v]` bounds.
///
/// Only the hue bounds take part in matching. The saturation and value bounds
/// are carried in the table but unused, since [`classify`] filters dark and
/// unsaturated samples before the table scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorRange {
    pub name: ColorName,
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl ColorRange {
    const fn new(name: ColorName, lower_hue: u8, upper_hue: u8) -> Self {
        Self {
            name,
            lower: [lower_hue, MIN_SATURATION, MIN_VALUE],
            upper: [upper_hue, 255, 255],
        }
    }

    pub fn contains_hue(&self, hue: u8) -> bool {
        hue >= self.lower[0] && hue <= self.upper[0]
    }
}

/// Below this value a sample is black regardless of hue.
pub const MIN_VALUE: u8 = 50;
/// Below this saturation a sample is white or gray.
pub const MIN_SATURATION: u8 = 50;
/// Unsaturated samples brighter than this are white.
pub const WHITE_MIN_VALUE: u8 = 200;

/// Scanned in order, first match wins.
pub const COLOR_RANGES: [ColorRange; 7] = [
    ColorRange::new(ColorName::Red, 0, 10),
    ColorRange::new(ColorName::Orange, 11, 20),
    ColorRange::new(ColorName::Yellow, 21, 35),
    ColorRange::new(ColorName::Green, 36, 85),
    ColorRange::new(ColorName::Blue, 86, 130),
    ColorRange::new(ColorName::Purple, 131, 155),
    ColorRange::new(ColorName::Pink, 156, 180),
];

/// Maps an averaged HSV sample to a color name.
pub fn classify(sample: HsvSample) -> ColorName {
    if sample.value < MIN_VALUE {
        return ColorName::Black;
    }
    if sample.saturation < MIN_SATURATION && sample.value > WHITE_MIN_VALUE {
        return ColorName::White;
    }
    if sample.saturation < MIN_SATURATION {
        return ColorName::Gray;
    }

    COLOR_RANGES
        .iter()
        .find(|range| range.contains_hue(sample.hue))
        .map_or(ColorName::Unknown, |range| range.name)
}

// Converts a BGR triple to HSV with hue halved to fit a byte (0..=180).
pub fn bgr_to_hsv(b: u8, g: u8, r: u8) -> (u8, u8, u8) {
    let r = r as f32;
    let g = g as f32;
    let b = b as f32;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };

    // Round the signed half hue first, so hues just below red wrap to 0 rather than 180.
    let h_half = (h / 2.0).round();
    let h_byte = (if h_half < 0.0 { h_half + 180.0 } else { h_half }) as u8;

    let s_byte = if max == 0.0 {
        0
    } else {
        (delta * 255.0 / max).round() as u8
    };
    let v_byte = max as u8;

    (h_byte, s_byte, v_byte)
}
