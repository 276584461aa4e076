//! Color math primitives
//!
//! Pure, stateless color functions used by every other stage of the
//! extraction pipeline:
//! - Hex parsing/formatting (`Rgb::parse_hex`, `Rgb::to_hex`)
//! - WCAG 2.0 relative luminance and contrast ratio
//! - Luminance adjustment ("lighten/darken by amount")
//! - Visual distinctness test between two colors
//! - HSL conversion for hue rotation

use serde::{Deserialize, Serialize};

/// Euclidean RGB distance above which two colors read as visually distinct.
///
/// Empirically tuned; treat as a tunable parameter, not a derived value.
pub const DISTINCTNESS_THRESHOLD: f64 = 75.0;

/// Piecewise sRGB linearization threshold from the WCAG 2.0 definition.
const SRGB_LINEAR_CUTOFF: f64 = 0.03928;

pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
pub const WHITE: Rgb = Rgb {
    r: 255,
    g: 255,
    b: 255,
};

/// An opaque RGB color. Alpha is consumed during sampling to filter
/// transparent pixels and never retained downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Parse a 3- or 6-digit hex color with optional leading `#`.
    ///
    /// Returns `None` on malformed input; callers substitute a default
    /// rather than propagating an error.
    pub fn parse_hex(hex: &str) -> Option<Rgb> {
        let digits = hex.trim().strip_prefix('#').unwrap_or(hex.trim());
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return None,
        };
        if !expanded.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let r = u8::from_str_radix(&expanded[0..2], 16).ok()?;
        let g = u8::from_str_radix(&expanded[2..4], 16).ok()?;
        let b = u8::from_str_radix(&expanded[4..6], 16).ok()?;
        Some(Rgb { r, g, b })
    }

    /// Format as lowercase `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Channel-wise RGB inverse (`255 - c`).
    pub fn inverted(self) -> Rgb {
        Rgb {
            r: 255 - self.r,
            g: 255 - self.g,
            b: 255 - self.b,
        }
    }

    /// Convert to HSL with all three components in [0, 1].
    pub fn to_hsl(self) -> (f64, f64, f64) {
        let r = self.r as f64 / 255.0;
        let g = self.g as f64 / 255.0;
        let b = self.b as f64 / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;

        if max == min {
            return (0.0, 0.0, l); // achromatic
        }

        let d = max - min;
        let s = if l > 0.5 {
            d / (2.0 - max - min)
        } else {
            d / (max + min)
        };
        let h = if max == r {
            (g - b) / d + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        } / 6.0;

        (h, s, l)
    }

    /// Convert from HSL with all three components in [0, 1].
    pub fn from_hsl(h: f64, s: f64, l: f64) -> Rgb {
        fn hue_to_channel(p: f64, q: f64, mut t: f64) -> f64 {
            if t < 0.0 {
                t += 1.0;
            }
            if t > 1.0 {
                t -= 1.0;
            }
            if t < 1.0 / 6.0 {
                p + (q - p) * 6.0 * t
            } else if t < 1.0 / 2.0 {
                q
            } else if t < 2.0 / 3.0 {
                p + (q - p) * (2.0 / 3.0 - t) * 6.0
            } else {
                p
            }
        }

        if s == 0.0 {
            let v = (l * 255.0).round().clamp(0.0, 255.0) as u8;
            return Rgb { r: v, g: v, b: v };
        }

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        let to_byte = |v: f64| (v * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgb {
            r: to_byte(hue_to_channel(p, q, h + 1.0 / 3.0)),
            g: to_byte(hue_to_channel(p, q, h)),
            b: to_byte(hue_to_channel(p, q, h - 1.0 / 3.0)),
        }
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// WCAG 2.0 relative luminance in [0, 1].
///
/// Each channel is normalized to [0, 1], passed through the piecewise
/// sRGB-to-linear transform, and weighted 0.2126/0.7152/0.0722.
pub fn relative_luminance(color: Rgb) -> f64 {
    fn linearize(channel: u8) -> f64 {
        let c = channel as f64 / 255.0;
        if c <= SRGB_LINEAR_CUTOFF {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }
    0.2126 * linearize(color.r) + 0.7152 * linearize(color.g) + 0.0722 * linearize(color.b)
}

/// WCAG contrast ratio between two luminances, in [1, 21].
pub fn contrast_ratio(lum1: f64, lum2: f64) -> f64 {
    let (hi, lo) = if lum1 >= lum2 {
        (lum1, lum2)
    } else {
        (lum2, lum1)
    };
    (hi + 0.05) / (lo + 0.05)
}

/// Shift each channel toward white (`amount > 0`) or black (`amount < 0`)
/// by `amount * 255`, clamped to the valid channel range.
pub fn adjust_luminance(color: Rgb, amount: f64) -> Rgb {
    let delta = amount * 255.0;
    let shift = |channel: u8| (channel as f64 + delta).round().clamp(0.0, 255.0) as u8;
    Rgb {
        r: shift(color.r),
        g: shift(color.g),
        b: shift(color.b),
    }
}

/// Euclidean distance between two colors in RGB space.
pub fn distance(a: Rgb, b: Rgb) -> f64 {
    let dr = a.r as f64 - b.r as f64;
    let dg = a.g as f64 - b.g as f64;
    let db = a.b as f64 - b.b as f64;
    (dr * dr + dg * dg + db * db).sqrt()
}

/// Whether two colors are far enough apart in RGB space to read as
/// visually distinct.
pub fn colors_are_distinct(a: Rgb, b: Rgb) -> bool {
    distance(a, b) > DISTINCTNESS_THRESHOLD
}

/// Pure black or pure white, whichever contrasts more against `background`.
pub fn contrast_text_for(background: Rgb) -> Rgb {
    let bg = relative_luminance(background);
    let black = contrast_ratio(bg, relative_luminance(BLACK));
    let white = contrast_ratio(bg, relative_luminance(WHITE));
    if black >= white {
        BLACK
    } else {
        WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_six_digit() {
        assert_eq!(Rgb::parse_hex("#3f51b5"), Some(Rgb::new(0x3f, 0x51, 0xb5)));
        assert_eq!(Rgb::parse_hex("3f51b5"), Some(Rgb::new(0x3f, 0x51, 0xb5)));
    }

    #[test]
    fn test_parse_hex_three_digit_expands() {
        assert_eq!(Rgb::parse_hex("#abc"), Some(Rgb::new(0xaa, 0xbb, 0xcc)));
        assert_eq!(Rgb::parse_hex("fff"), Some(WHITE));
    }

    #[test]
    fn test_parse_hex_rejects_malformed() {
        assert_eq!(Rgb::parse_hex(""), None);
        assert_eq!(Rgb::parse_hex("#12"), None);
        assert_eq!(Rgb::parse_hex("#12345"), None);
        assert_eq!(Rgb::parse_hex("#gggggg"), None);
        assert_eq!(Rgb::parse_hex("not a color"), None);
    }

    #[test]
    fn test_hex_round_trip() {
        for hex in ["#000000", "#ffffff", "#3f51b5", "#f50057", "#0a0b0c"] {
            let rgb = Rgb::parse_hex(hex).unwrap();
            assert_eq!(rgb.to_hex(), hex);
        }
    }

    #[test]
    fn test_relative_luminance_extremes() {
        assert!(relative_luminance(BLACK) < 1e-9);
        assert!((relative_luminance(WHITE) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_contrast_ratio_bounds() {
        let max = contrast_ratio(1.0, 0.0);
        assert!((max - 21.0).abs() < 1e-9);
        assert!((contrast_ratio(0.5, 0.5) - 1.0).abs() < 1e-9);
        // Order of arguments must not matter
        assert_eq!(contrast_ratio(0.2, 0.8), contrast_ratio(0.8, 0.2));
    }

    #[test]
    fn test_adjust_luminance_clamps() {
        assert_eq!(adjust_luminance(WHITE, 0.5), WHITE);
        assert_eq!(adjust_luminance(BLACK, -0.5), BLACK);
        let lifted = adjust_luminance(Rgb::new(100, 100, 100), 0.2);
        assert_eq!(lifted, Rgb::new(151, 151, 151));
    }

    #[test]
    fn test_distinctness_threshold() {
        assert!(colors_are_distinct(BLACK, WHITE));
        assert!(!colors_are_distinct(
            Rgb::new(100, 100, 100),
            Rgb::new(110, 110, 110)
        ));
    }

    #[test]
    fn test_contrast_text_for_picks_readable_pole() {
        assert_eq!(contrast_text_for(WHITE), BLACK);
        assert_eq!(contrast_text_for(BLACK), WHITE);
        assert_eq!(contrast_text_for(Rgb::new(250, 250, 250)), BLACK);
        assert_eq!(contrast_text_for(Rgb::new(20, 20, 60)), WHITE);
    }

    #[test]
    fn test_hsl_round_trip_is_close() {
        for color in [
            Rgb::new(0x3f, 0x51, 0xb5),
            Rgb::new(255, 0, 0),
            Rgb::new(33, 100, 200),
            Rgb::new(128, 128, 128),
        ] {
            let (h, s, l) = color.to_hsl();
            let back = Rgb::from_hsl(h, s, l);
            assert!(distance(color, back) < 2.0, "{} -> {}", color, back);
        }
    }

    #[test]
    fn test_hue_shift_by_third_moves_red_to_green() {
        let (h, s, l) = Rgb::new(255, 0, 0).to_hsl();
        let shifted = Rgb::from_hsl((h + 1.0 / 3.0) % 1.0, s, l);
        assert_eq!(shifted, Rgb::new(0, 255, 0));
    }
}
