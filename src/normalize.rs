//! Theme input normalization
//!
//! Every external theme representation - extractor output, a single-field
//! color-picker edit, persisted data from an older session - passes through
//! here before any computation happens. The canonical shape is
//! [`NormalizedThemeInput`]; the heterogeneous admission shape is
//! [`ThemeInputPatch`], whose serde aliases absorb the camelCase spellings
//! used by callers outside this crate.
//!
//! Field resolution order per key: new value -> previous normalized value ->
//! hard-coded default. An unparseable color repairs to that field's default
//! rather than aborting the whole normalization.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::color::Rgb;
use crate::error::ThemeError;
use crate::palette::ThemePalette;

pub const DEFAULT_PRIMARY: &str = "#3f51b5";
pub const DEFAULT_ACCENT: &str = "#f50057";
pub const DEFAULT_BACKGROUND: &str = "#ffffff";
pub const DEFAULT_TEXT: &str = "#212121";
pub const DEFAULT_NEUTRAL: &str = "#9e9e9e";

/// A palette field addressable by a single user edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemeField {
    Primary,
    Accent,
    Background,
    Text,
    Neutral,
    Logo,
}

/// Canonical normalized theme input - the engine's single admission point
/// and the exact shape handed to the persistence store.
///
/// All color fields hold validated lowercase hex strings once produced by
/// [`normalize`], so re-normalizing a normalized value is an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedThemeInput {
    #[serde(alias = "primaryColor")]
    pub primary_color: String,
    #[serde(alias = "accentColor")]
    pub accent_color: String,
    #[serde(alias = "backgroundColor")]
    pub background_color: String,
    #[serde(alias = "textColor")]
    pub text_color: String,
    #[serde(alias = "neutralColor")]
    pub neutral_color: String,
    #[serde(default, alias = "logoUrl")]
    pub logo_url: Option<String>,
}

impl NormalizedThemeInput {
    /// All fields at their documented defaults.
    pub fn defaults() -> Self {
        NormalizedThemeInput {
            primary_color: DEFAULT_PRIMARY.to_string(),
            accent_color: DEFAULT_ACCENT.to_string(),
            background_color: DEFAULT_BACKGROUND.to_string(),
            text_color: DEFAULT_TEXT.to_string(),
            neutral_color: DEFAULT_NEUTRAL.to_string(),
            logo_url: None,
        }
    }

    /// Capture a synthesized palette as normalized input, for persistence.
    /// Derived values are deliberately absent: they are recomputed from the
    /// base colors on restore.
    pub fn from_palette(palette: &ThemePalette, logo_url: Option<String>) -> Self {
        NormalizedThemeInput {
            primary_color: palette.primary.to_hex(),
            accent_color: palette.accent.to_hex(),
            background_color: palette.background.to_hex(),
            text_color: palette.text.to_hex(),
            neutral_color: palette.neutral.to_hex(),
            logo_url,
        }
    }

    pub fn primary(&self) -> Rgb {
        parse_or_default(&self.primary_color, DEFAULT_PRIMARY)
    }

    pub fn accent(&self) -> Rgb {
        parse_or_default(&self.accent_color, DEFAULT_ACCENT)
    }

    pub fn background(&self) -> Rgb {
        parse_or_default(&self.background_color, DEFAULT_BACKGROUND)
    }

    pub fn text(&self) -> Rgb {
        parse_or_default(&self.text_color, DEFAULT_TEXT)
    }

    pub fn neutral(&self) -> Rgb {
        parse_or_default(&self.neutral_color, DEFAULT_NEUTRAL)
    }
}

impl Default for NormalizedThemeInput {
    fn default() -> Self {
        Self::defaults()
    }
}

fn parse_or_default(value: &str, default: &str) -> Rgb {
    Rgb::parse_hex(value).unwrap_or_else(|| {
        Rgb::parse_hex(default).unwrap_or(crate::color::BLACK)
    })
}

/// Heterogeneous, all-optional input shape: partial user edits, persisted
/// data, or any caller-supplied object. Serde aliases accept both
/// snake_case and camelCase spellings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeInputPatch {
    #[serde(default, alias = "primaryColor")]
    pub primary_color: Option<String>,
    #[serde(default, alias = "accentColor")]
    pub accent_color: Option<String>,
    #[serde(default, alias = "backgroundColor")]
    pub background_color: Option<String>,
    #[serde(default, alias = "textColor")]
    pub text_color: Option<String>,
    #[serde(default, alias = "neutralColor")]
    pub neutral_color: Option<String>,
    #[serde(default, alias = "logoUrl")]
    pub logo_url: Option<String>,
}

impl ThemeInputPatch {
    /// A patch touching exactly one field - the shape of a color-picker edit.
    pub fn single(field: ThemeField, value: impl Into<String>) -> Self {
        let mut patch = ThemeInputPatch::default();
        let value = value.into();
        match field {
            ThemeField::Primary => patch.primary_color = Some(value),
            ThemeField::Accent => patch.accent_color = Some(value),
            ThemeField::Background => patch.background_color = Some(value),
            ThemeField::Text => patch.text_color = Some(value),
            ThemeField::Neutral => patch.neutral_color = Some(value),
            ThemeField::Logo => patch.logo_url = Some(value),
        }
        patch
    }

    /// Overlay `newer` on top of this patch; later edits win field-by-field.
    pub fn merge(&mut self, newer: ThemeInputPatch) {
        fn overlay(slot: &mut Option<String>, newer: Option<String>) {
            if newer.is_some() {
                *slot = newer;
            }
        }
        overlay(&mut self.primary_color, newer.primary_color);
        overlay(&mut self.accent_color, newer.accent_color);
        overlay(&mut self.background_color, newer.background_color);
        overlay(&mut self.text_color, newer.text_color);
        overlay(&mut self.neutral_color, newer.neutral_color);
        overlay(&mut self.logo_url, newer.logo_url);
    }

    pub fn is_empty(&self) -> bool {
        *self == ThemeInputPatch::default()
    }
}

impl From<&NormalizedThemeInput> for ThemeInputPatch {
    fn from(input: &NormalizedThemeInput) -> Self {
        ThemeInputPatch {
            primary_color: Some(input.primary_color.clone()),
            accent_color: Some(input.accent_color.clone()),
            background_color: Some(input.background_color.clone()),
            text_color: Some(input.text_color.clone()),
            neutral_color: Some(input.neutral_color.clone()),
            logo_url: input.logo_url.clone(),
        }
    }
}

/// Map a patch onto the canonical shape.
///
/// Per color field: a parseable new value is canonicalized to lowercase hex;
/// an unparseable new value repairs to the field's default (logged, never
/// fatal); an absent value keeps the previous normalized value, or the
/// default when there is no previous. Idempotent by construction.
pub fn normalize(
    patch: &ThemeInputPatch,
    previous: Option<&NormalizedThemeInput>,
) -> NormalizedThemeInput {
    let resolve = |new: &Option<String>, prev: fn(&NormalizedThemeInput) -> &String, default: &str| {
        match new {
            Some(value) => match Rgb::parse_hex(value) {
                Some(rgb) => rgb.to_hex(),
                None => {
                    let err = ThemeError::MalformedColorInput(value.clone());
                    warn!(error = %err, default, "Repairing malformed color field");
                    default.to_string()
                }
            },
            None => previous
                .map(|p| prev(p).clone())
                .unwrap_or_else(|| default.to_string()),
        }
    };

    NormalizedThemeInput {
        primary_color: resolve(&patch.primary_color, |p| &p.primary_color, DEFAULT_PRIMARY),
        accent_color: resolve(&patch.accent_color, |p| &p.accent_color, DEFAULT_ACCENT),
        background_color: resolve(
            &patch.background_color,
            |p| &p.background_color,
            DEFAULT_BACKGROUND,
        ),
        text_color: resolve(&patch.text_color, |p| &p.text_color, DEFAULT_TEXT),
        neutral_color: resolve(&patch.neutral_color, |p| &p.neutral_color, DEFAULT_NEUTRAL),
        logo_url: patch
            .logo_url
            .clone()
            .or_else(|| previous.and_then(|p| p.logo_url.clone())),
    }
}
