//! Publication sinks
//!
//! A published palette is consumed in two independent forms:
//! - [`ThemeTokens`] - a structured token tree read by the component
//!   hierarchy
//! - a flat map of stable string keys written through a [`VariableSink`],
//!   for markup outside the component tree
//!
//! The synchronizer updates both inside a single publish step so observers
//! never see them disagree. The sink is injectable so the engine has no
//! hidden global coupling and stays unit-testable headlessly.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::color::adjust_luminance;
use crate::palette::ThemePalette;

// Supplementary derived tones for the token tree. Like every derived value
// they are recomputed from the base palette, never stored.
const PAPER_LIFT_AMOUNT: f64 = 0.02;
const TEXT_SECONDARY_FADE: f64 = 0.25;

/// Structured style tokens for the component tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThemeTokens {
    pub palette: PaletteTokens,
    pub surface: SurfaceTokens,
    pub text: TextTokens,
}

/// Brand color tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaletteTokens {
    pub primary: String,
    pub primary_light: String,
    pub primary_dark: String,
    pub secondary: String,
    pub accent: String,
    pub neutral: String,
}

/// Background and interaction-state tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurfaceTokens {
    pub background: String,
    pub background_paper: String,
    pub selection: String,
    pub hover_light: String,
    pub hover_dark: String,
}

/// Text tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextTokens {
    pub primary: String,
    pub secondary: String,
    /// Black or white, readable on the adjusted primary.
    pub contrast: String,
}

impl ThemeTokens {
    /// Compute the full token tree from a base palette.
    pub fn from_palette(palette: &ThemePalette) -> Self {
        // The hardened primary is what interactive UI binds to.
        let adjusted = palette.adjusted_primary();
        let text_fade = if crate::color::relative_luminance(palette.text) < 0.5 {
            TEXT_SECONDARY_FADE
        } else {
            -TEXT_SECONDARY_FADE
        };

        ThemeTokens {
            palette: PaletteTokens {
                primary: adjusted.to_hex(),
                primary_light: palette.primary_light().to_hex(),
                primary_dark: palette.primary_dark().to_hex(),
                secondary: palette.secondary.to_hex(),
                accent: palette.accent.to_hex(),
                neutral: palette.neutral.to_hex(),
            },
            surface: SurfaceTokens {
                background: palette.background.to_hex(),
                background_paper: adjust_luminance(palette.background, PAPER_LIFT_AMOUNT).to_hex(),
                selection: palette.selection().to_hex(),
                hover_light: palette.hover_light().to_hex(),
                hover_dark: palette.hover_dark().to_hex(),
            },
            text: TextTokens {
                primary: palette.text.to_hex(),
                secondary: adjust_luminance(palette.text, text_fade).to_hex(),
                contrast: palette.contrast_text().to_hex(),
            },
        }
    }

    /// The flat key -> hex map published alongside the tree.
    ///
    /// Keys are stable strings; renaming one is a breaking change that
    /// requires a migration note.
    pub fn flat_variables(&self) -> Vec<(String, String)> {
        let var = |key: &str, value: &String| (key.to_string(), value.clone());
        vec![
            var("primary", &self.palette.primary),
            var("primary-light", &self.palette.primary_light),
            var("primary-dark", &self.palette.primary_dark),
            var("secondary", &self.palette.secondary),
            var("accent", &self.palette.accent),
            var("neutral", &self.palette.neutral),
            var("background", &self.surface.background),
            var("background-paper", &self.surface.background_paper),
            var("selection", &self.surface.selection),
            var("hover-light", &self.surface.hover_light),
            var("hover-dark", &self.surface.hover_dark),
            var("text", &self.text.primary),
            var("text-secondary", &self.text.secondary),
            var("contrast-text", &self.text.contrast),
        ]
    }
}

/// Writer for the flat variable set (CSS custom properties on a shared root
/// in a browser host, a themed config file elsewhere).
pub trait VariableSink {
    /// Replace the named variables. Called exactly once per publish, with
    /// the complete variable set.
    fn set_many(&mut self, vars: &[(String, String)]);
}

/// In-memory sink for tests and the CLI. Clones share the same backing map.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    inner: Arc<Mutex<MemorySinkState>>,
}

#[derive(Debug, Default)]
struct MemorySinkState {
    vars: BTreeMap<String, String>,
    writes: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current variable map.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.inner.lock().vars.clone()
    }

    /// How many publishes have hit this sink.
    pub fn writes(&self) -> usize {
        self.inner.lock().writes
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.lock().vars.get(key).cloned()
    }
}

impl VariableSink for MemorySink {
    fn set_many(&mut self, vars: &[(String, String)]) {
        let mut state = self.inner.lock();
        state.writes += 1;
        for (key, value) in vars {
            state.vars.insert(key.clone(), value.clone());
        }
    }
}
