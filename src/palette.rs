//! Palette synthesis
//!
//! Turns sorted dominant-color clusters (or a user-supplied set of base
//! colors) into the canonical six-slot [`ThemePalette`], enforcing the
//! text/background contrast floor and hardening over-bright primaries for
//! interactive UI. Derived variants (light/dark/selection/hover/contrast
//! text) are computed on demand from the base six and never stored, so a
//! restored palette always re-derives them deterministically.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cluster::{self, ColorCluster};
use crate::color::{
    adjust_luminance, contrast_ratio, contrast_text_for, relative_luminance, Rgb,
};
use crate::normalize::NormalizedThemeInput;

// Fallback palette, published whenever extraction fails or yields no data.
pub const FALLBACK_PRIMARY: Rgb = Rgb::new(0x3f, 0x51, 0xb5);
pub const FALLBACK_SECONDARY: Rgb = Rgb::new(0xf5, 0x00, 0x57);
pub const FALLBACK_ACCENT: Rgb = Rgb::new(0x4c, 0xaf, 0x50);
pub const FALLBACK_BACKGROUND: Rgb = Rgb::new(0xff, 0xff, 0xff);
pub const FALLBACK_TEXT: Rgb = Rgb::new(0x21, 0x21, 0x21);
pub const FALLBACK_NEUTRAL: Rgb = Rgb::new(0x9e, 0x9e, 0x9e);

/// Minimum WCAG contrast ratio between text and background.
pub const MIN_TEXT_CONTRAST: f64 = 4.5;

// Contrast hardening for primaries bound to clickable UI. Thresholds are
// empirically tuned; keep as constants, do not re-derive.
const HARDEN_HIGH_LUMINANCE: f64 = 0.9;
const HARDEN_HIGH_AMOUNT: f64 = -0.2;
const HARDEN_MID_LUMINANCE: f64 = 0.7;
const HARDEN_MID_AMOUNT: f64 = -0.1;

// Derived-variant adjustment amounts, applied to the hardened primary.
const LIGHT_VARIANT_AMOUNT: f64 = 0.3;
const DARK_VARIANT_AMOUNT: f64 = -0.3;
const SELECTION_AMOUNT: f64 = 0.25;
const HOVER_LIGHT_AMOUNT: f64 = 0.1;
const HOVER_DARK_AMOUNT: f64 = -0.1;

// Background synthesis constants (fixed near-whites).
const LIGHT_BACKGROUND: Rgb = Rgb::new(249, 249, 252);
const TINT_CAP: f64 = 245.0;
const TINT_PRIMARY_WEIGHT: f64 = 0.15;
const TINT_BASE: f64 = 230.0;

// Text tones before the contrast floor is enforced.
const DARK_TEXT: Rgb = Rgb::new(33, 33, 33);
const LIGHT_TEXT: Rgb = Rgb::new(248, 248, 248);

/// Channel cap keeping the neutral usable as a border/divider tone.
const NEUTRAL_CHANNEL_CAP: u8 = 200;

/// The canonical palette: six base colors, immutable once published.
///
/// Everything else the UI consumes (`primary_light`, `selection`, hover
/// tones, contrast text) is an accessor over these six.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemePalette {
    pub primary: Rgb,
    pub secondary: Rgb,
    pub accent: Rgb,
    pub background: Rgb,
    pub text: Rgb,
    pub neutral: Rgb,
}

impl ThemePalette {
    /// The fixed palette used whenever extraction fails, times out, or
    /// yields zero clusters with no override. Returned, never thrown.
    pub fn fallback() -> Self {
        ThemePalette {
            primary: FALLBACK_PRIMARY,
            secondary: FALLBACK_SECONDARY,
            accent: FALLBACK_ACCENT,
            background: FALLBACK_BACKGROUND,
            text: FALLBACK_TEXT,
            neutral: FALLBACK_NEUTRAL,
        }
    }

    /// The primary as interactive UI should bind it: darkened when the raw
    /// extracted color is too bright to sit behind white text or read as
    /// clickable against a light background.
    pub fn adjusted_primary(&self) -> Rgb {
        harden_primary(self.primary)
    }

    pub fn primary_light(&self) -> Rgb {
        adjust_luminance(self.adjusted_primary(), LIGHT_VARIANT_AMOUNT)
    }

    pub fn primary_dark(&self) -> Rgb {
        adjust_luminance(self.adjusted_primary(), DARK_VARIANT_AMOUNT)
    }

    /// Background tone for selected rows and nav items.
    pub fn selection(&self) -> Rgb {
        adjust_luminance(self.adjusted_primary(), SELECTION_AMOUNT)
    }

    pub fn hover_light(&self) -> Rgb {
        adjust_luminance(self.adjusted_primary(), HOVER_LIGHT_AMOUNT)
    }

    pub fn hover_dark(&self) -> Rgb {
        adjust_luminance(self.adjusted_primary(), HOVER_DARK_AMOUNT)
    }

    /// Pure black or white, whichever is readable on the adjusted primary.
    pub fn contrast_text(&self) -> Rgb {
        contrast_text_for(self.adjusted_primary())
    }
}

/// Synthesize a palette from population-sorted clusters.
///
/// An empty cluster list means "no data": the fallback palette is returned.
pub fn synthesize_from_clusters(clusters: &[ColorCluster]) -> ThemePalette {
    let Some(first) = clusters.first() else {
        debug!("No clusters, using fallback palette");
        return ThemePalette::fallback();
    };

    let primary = first.centroid;
    let secondary = if cluster::top_two_are_distinct(clusters) {
        clusters[1].centroid
    } else {
        primary.inverted()
    };
    let accent = match clusters.get(2) {
        Some(third) => third.centroid,
        None => hue_shifted_accent(primary),
    };

    build(primary, secondary, accent)
}

/// Synthesize a palette around a directly supplied primary (user override
/// path): secondary and accent are derived, background/text follow the same
/// rules as the extraction path.
pub fn synthesize_from_primary(primary: Rgb) -> ThemePalette {
    build(primary, primary.inverted(), hue_shifted_accent(primary))
}

/// Build a palette from normalized user input, keeping the caller's explicit
/// background/text/neutral choices but still enforcing the contrast floor.
pub fn synthesize_from_input(input: &NormalizedThemeInput) -> ThemePalette {
    let primary = input.primary();
    let background = input.background();
    let text = enforce_text_contrast(background, input.text());
    ThemePalette {
        primary,
        secondary: primary.inverted(),
        accent: input.accent(),
        background,
        text,
        neutral: input.neutral(),
    }
}

fn build(primary: Rgb, secondary: Rgb, accent: Rgb) -> ThemePalette {
    let background = background_for(primary);
    let text = text_for(background);
    let neutral = neutral_for(primary, secondary);

    let palette = ThemePalette {
        primary,
        secondary,
        accent,
        background,
        text,
        neutral,
    };
    debug!(
        primary = %palette.primary,
        secondary = %palette.secondary,
        accent = %palette.accent,
        background = %palette.background,
        "Palette synthesized"
    );
    palette
}

/// Accent when no third cluster exists: primary rotated +120° in HSL,
/// same saturation and lightness.
fn hue_shifted_accent(primary: Rgb) -> Rgb {
    let (h, s, l) = primary.to_hsl();
    Rgb::from_hsl((h + 1.0 / 3.0) % 1.0, s, l)
}

/// A dark primary gets a fixed light near-white; a light primary gets a
/// background lightly tinted by it, deliberately avoiding stark white.
fn background_for(primary: Rgb) -> Rgb {
    if relative_luminance(primary) < 0.5 {
        LIGHT_BACKGROUND
    } else {
        let tint = |channel: u8| {
            (channel as f64 * TINT_PRIMARY_WEIGHT + TINT_BASE).min(TINT_CAP) as u8
        };
        Rgb {
            r: tint(primary.r),
            g: tint(primary.g),
            b: tint(primary.b),
        }
    }
}

fn text_for(background: Rgb) -> Rgb {
    let candidate = if relative_luminance(background) > 0.5 {
        DARK_TEXT
    } else {
        LIGHT_TEXT
    };
    enforce_text_contrast(background, candidate)
}

/// Force the text to pure black or white when the candidate fails the 4.5:1
/// floor against the background.
fn enforce_text_contrast(background: Rgb, text: Rgb) -> Rgb {
    let ratio = contrast_ratio(relative_luminance(text), relative_luminance(background));
    if ratio >= MIN_TEXT_CONTRAST {
        text
    } else {
        contrast_text_for(background)
    }
}

/// Channel-wise average of primary and secondary, capped so the neutral
/// stays usable as a border tone.
fn neutral_for(primary: Rgb, secondary: Rgb) -> Rgb {
    let mix = |a: u8, b: u8| {
        let avg = ((a as u16 + b as u16) / 2) as u8;
        avg.min(NEUTRAL_CHANNEL_CAP)
    };
    Rgb {
        r: mix(primary.r, secondary.r),
        g: mix(primary.g, secondary.g),
        b: mix(primary.b, secondary.b),
    }
}

/// Darken over-bright primaries before they back clickable UI.
fn harden_primary(primary: Rgb) -> Rgb {
    let lum = relative_luminance(primary);
    if lum > HARDEN_HIGH_LUMINANCE {
        adjust_luminance(primary, HARDEN_HIGH_AMOUNT)
    } else if lum > HARDEN_MID_LUMINANCE {
        adjust_luminance(primary, HARDEN_MID_AMOUNT)
    } else {
        primary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{colors_are_distinct, BLACK, WHITE};

    fn cluster(centroid: Rgb, population: f64) -> ColorCluster {
        ColorCluster {
            centroid,
            population,
        }
    }

    #[test]
    fn test_empty_clusters_yield_exact_fallback() {
        assert_eq!(synthesize_from_clusters(&[]), ThemePalette::fallback());
    }

    #[test]
    fn test_single_blue_cluster_scenario() {
        // 20 opaque blue pixels collapse to one cluster at (33,100,200).
        let clusters = vec![cluster(Rgb::new(33, 100, 200), 1.0)];
        let palette = synthesize_from_clusters(&clusters);

        assert_eq!(palette.primary, Rgb::new(33, 100, 200));
        // Dark primary -> fixed light near-white background
        assert_eq!(palette.background, Rgb::new(249, 249, 252));
        // Light background -> dark text, already past the contrast floor
        assert_eq!(palette.text, Rgb::new(33, 33, 33));
        let ratio = contrast_ratio(
            relative_luminance(palette.text),
            relative_luminance(palette.background),
        );
        assert!(ratio >= MIN_TEXT_CONTRAST);
        // No second cluster -> inverted primary
        assert_eq!(palette.secondary, Rgb::new(222, 155, 55));
    }

    #[test]
    fn test_secondary_uses_second_cluster_when_distinct() {
        let clusters = vec![
            cluster(Rgb::new(200, 30, 30), 0.6),
            cluster(Rgb::new(30, 30, 200), 0.4),
        ];
        let palette = synthesize_from_clusters(&clusters);
        assert_eq!(palette.secondary, Rgb::new(30, 30, 200));
    }

    #[test]
    fn test_secondary_inverts_when_top_two_close() {
        let clusters = vec![
            cluster(Rgb::new(200, 30, 30), 0.6),
            cluster(Rgb::new(210, 40, 40), 0.4),
        ];
        let palette = synthesize_from_clusters(&clusters);
        assert_eq!(palette.secondary, Rgb::new(200, 30, 30).inverted());
    }

    #[test]
    fn test_accent_prefers_third_cluster() {
        let clusters = vec![
            cluster(Rgb::new(200, 30, 30), 0.5),
            cluster(Rgb::new(30, 30, 200), 0.3),
            cluster(Rgb::new(30, 200, 30), 0.2),
        ];
        let palette = synthesize_from_clusters(&clusters);
        assert_eq!(palette.accent, Rgb::new(30, 200, 30));
    }

    #[test]
    fn test_accent_hue_shift_without_third_cluster() {
        let clusters = vec![cluster(Rgb::new(255, 0, 0), 1.0)];
        let palette = synthesize_from_clusters(&clusters);
        // Red rotated +120 degrees is green
        assert_eq!(palette.accent, Rgb::new(0, 255, 0));
    }

    #[test]
    fn test_light_primary_gets_tinted_background() {
        let clusters = vec![cluster(Rgb::new(240, 240, 200), 1.0)];
        let palette = synthesize_from_clusters(&clusters);
        assert_ne!(palette.background, WHITE);
        assert!(palette.background.r <= 245);
        // Still a near-white: every channel high
        assert!(palette.background.b >= 230);
    }

    #[test]
    fn test_white_primary_is_hardened() {
        let palette = synthesize_from_primary(WHITE);
        let adjusted = palette.adjusted_primary();
        assert_ne!(adjusted, WHITE);
        assert_eq!(adjusted, Rgb::new(204, 204, 204)); // 255 - 0.2*255, rounded
    }

    #[test]
    fn test_mid_bright_primary_gets_lighter_hardening() {
        // Luminance between 0.7 and 0.9
        let primary = Rgb::new(220, 220, 220);
        let palette = synthesize_from_primary(primary);
        assert_eq!(palette.adjusted_primary(), Rgb::new(194, 194, 194));
    }

    #[test]
    fn test_dark_primary_is_not_hardened() {
        let palette = synthesize_from_primary(Rgb::new(33, 100, 200));
        assert_eq!(palette.adjusted_primary(), palette.primary);
    }

    #[test]
    fn test_contrast_guarantee_over_primary_sweep() {
        for r in (0..=255).step_by(51) {
            for g in (0..=255).step_by(51) {
                for b in (0..=255).step_by(51) {
                    let palette = synthesize_from_primary(Rgb::new(r as u8, g as u8, b as u8));
                    let ratio = contrast_ratio(
                        relative_luminance(palette.text),
                        relative_luminance(palette.background),
                    );
                    assert!(
                        ratio >= MIN_TEXT_CONTRAST,
                        "primary {} -> ratio {}",
                        palette.primary,
                        ratio
                    );
                }
            }
        }
    }

    #[test]
    fn test_neutral_channels_capped() {
        let palette = synthesize_from_primary(WHITE);
        assert!(palette.neutral.r <= 200);
        assert!(palette.neutral.g <= 200);
        assert!(palette.neutral.b <= 200);
    }

    #[test]
    fn test_derived_variants_are_deterministic() {
        let palette = synthesize_from_primary(Rgb::new(63, 81, 181));
        assert_eq!(palette.primary_light(), palette.primary_light());
        assert!(colors_are_distinct(
            palette.primary_light(),
            palette.primary_dark()
        ));
        let contrast = palette.contrast_text();
        assert!(contrast == BLACK || contrast == WHITE);
    }

    #[test]
    fn test_input_path_enforces_contrast() {
        let mut input = NormalizedThemeInput::defaults();
        input.background_color = "#ffffff".to_string();
        input.text_color = "#fefefe".to_string(); // unreadable on white
        let palette = synthesize_from_input(&input);
        assert_eq!(palette.text, BLACK);
    }
}
