//! Pixel colors for logo analysis
//!
//! Plain 8-bit RGB, the eligibility rule for clustering input and the CSS
//! `rgb(r,g,b)` form used in gradients.

use image::RgbaImage;
use std::fmt;

/// RGB color representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Squared Euclidean distance in RGB space
    #[inline]
    pub fn distance_squared(&self, other: &Rgb) -> u32 {
        let dr = self.r as i32 - other.r as i32;
        let dg = self.g as i32 - other.g as i32;
        let db = self.b as i32 - other.b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }

    /// CSS functional notation, e.g. `rgb(12,34,56)`
    pub fn css(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.r, self.g, self.b)
    }
}

const WHITE: Rgb = Rgb::new(255, 255, 255);

/// Whether an RGBA pixel takes part in clustering.
///
/// Fully transparent pixels are dropped first, then pure white at any
/// alpha. The white check is an exact match, so near-white survives.
#[inline]
pub fn is_eligible(r: u8, g: u8, b: u8, a: u8) -> bool {
    a != 0 && Rgb::new(r, g, b) != WHITE
}

/// Collect eligible pixels in row-major order
pub fn eligible_pixels(img: &RgbaImage) -> Vec<Rgb> {
    img.pixels()
        .filter(|p| is_eligible(p[0], p[1], p[2], p[3]))
        .map(|p| Rgb::new(p[0], p[1], p[2]))
        .collect()
}
