//! Theme synchronization
//!
//! Orchestrates the pipeline: normalize -> synthesize/contrast-harden ->
//! publish to both sinks -> persistence hook. One synchronizer instance
//! owns the two publication sinks; nothing else writes to them.
//!
//! # Module Structure
//!
//! - `sinks` - structured token tree + flat variable sink
//! - `store` - persistence contract and implementations
//!
//! # Timing model
//!
//! Single-threaded and poll-driven: interactive edits are debounced against
//! deadlines that the host's event loop checks via [`ThemeSynchronizer::tick`].
//! Two tiers - a fast preview pass that only publishes, and a slower pass
//! that also persists. Passes carry monotonically increasing request ids;
//! a pass that finishes after a newer one has started is discarded, so a
//! slow image decode can never clobber a fresher palette.

mod sinks;
mod store;

pub use sinks::{MemorySink, PaletteTokens, SurfaceTokens, TextTokens, ThemeTokens, VariableSink};
pub use store::{JsonFileStore, MemoryStore, ThemeStore};

use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{debug, info, warn};

use crate::cluster::{self, ColorCluster};
use crate::error::{ErrorSeverity, Result, ResultExt};
use crate::normalize::{self, NormalizedThemeInput, ThemeField, ThemeInputPatch};
use crate::palette::{self, ThemePalette};
use crate::sampler::{self, ImageSource, SampleOptions};

/// Quiet period before a live-preview synchronization pass runs.
pub const DEBOUNCE_PREVIEW: Duration = Duration::from_millis(250);

/// Quiet period before a pass that also persists runs.
pub const DEBOUNCE_PERSIST: Duration = Duration::from_millis(1000);

/// Synchronizer lifecycle states. Every pass walks Idle -> Normalizing ->
/// Synthesizing -> Publishing -> Idle; failures detour through Failed and
/// still end Idle with the fallback palette published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Normalizing,
    Synthesizing,
    Publishing,
    Failed,
}

/// Coalesced interactive edits waiting for their debounce deadline.
#[derive(Debug)]
struct PendingEdit {
    patch: ThemeInputPatch,
    last_edit_at: Instant,
    /// Whether the preview tier already ran for this batch.
    previewed: bool,
}

/// The synchronization engine: accepts theme-change requests, resolves them
/// to a palette, and publishes atomically to both sinks.
pub struct ThemeSynchronizer<S: VariableSink, P: ThemeStore> {
    sink: S,
    store: P,
    state: SyncState,
    normalized: NormalizedThemeInput,
    palette: ThemePalette,
    tokens: ThemeTokens,
    pending: Option<PendingEdit>,
    next_request_id: u64,
    latest_started: u64,
}

impl<S: VariableSink, P: ThemeStore> ThemeSynchronizer<S, P> {
    /// Create a synchronizer and publish the fallback palette so there is
    /// never a moment without a valid published value.
    pub fn new(sink: S, store: P) -> Self {
        let palette = ThemePalette::fallback();
        let mut sync = ThemeSynchronizer {
            sink,
            store,
            state: SyncState::Idle,
            normalized: NormalizedThemeInput::defaults(),
            palette,
            tokens: ThemeTokens::from_palette(&palette),
            pending: None,
            next_request_id: 0,
            latest_started: 0,
        };
        sync.publish(palette, false);
        sync
    }

    /// Last published palette. Always valid; starts as the fallback.
    pub fn palette(&self) -> &ThemePalette {
        &self.palette
    }

    /// Last published token tree.
    pub fn tokens(&self) -> &ThemeTokens {
        &self.tokens
    }

    /// Last normalized input - the value the persistence hook receives.
    pub fn normalized(&self) -> &NormalizedThemeInput {
        &self.normalized
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn has_pending_edit(&self) -> bool {
        self.pending.is_some()
    }

    /// Start a new synchronization pass and get its request id. Newer ids
    /// always win: a pass whose id is older than the latest started one is
    /// discarded at publish time.
    pub fn begin_request(&mut self) -> u64 {
        self.next_request_id += 1;
        self.latest_started = self.next_request_id;
        self.next_request_id
    }

    /// Apply a discrete theme change (settings form submit, extraction
    /// completion translated by the caller) and persist the result.
    pub fn apply(&mut self, patch: &ThemeInputPatch) {
        let id = self.begin_request();
        self.run_pass(id, patch, true);
    }

    /// Full extraction pipeline: load, sample, cluster, synthesize,
    /// publish. Every failure collapses to the fallback palette; this
    /// method never errors.
    pub fn apply_image<R: Rng + ?Sized>(
        &mut self,
        source: ImageSource,
        options: SampleOptions,
        rng: &mut R,
    ) {
        let id = self.begin_request();
        let logo_url = match &source {
            ImageSource::Path(path) => Some(path.to_string_lossy().into_owned()),
            ImageSource::DataUrl(url) => Some(url.clone()),
            ImageSource::Raster(_) => None,
        };
        let result = sampler::sample(source, &options)
            .map(|pixels| cluster::dominant_colors(&pixels, options.color_count, rng));
        self.finish_extraction(id, result, logo_url);
    }

    /// Complete an extraction pass begun with [`begin_request`], for hosts
    /// that decode images on their own event loop. A result arriving after
    /// a newer request has started is dropped.
    ///
    /// [`begin_request`]: ThemeSynchronizer::begin_request
    pub fn finish_extraction(
        &mut self,
        request_id: u64,
        result: Result<Vec<ColorCluster>>,
        logo_url: Option<String>,
    ) {
        if request_id < self.latest_started {
            debug!(
                request_id,
                latest = self.latest_started,
                "Discarding superseded extraction"
            );
            return;
        }

        let palette = match result {
            Ok(clusters) => {
                self.state = SyncState::Synthesizing;
                palette::synthesize_from_clusters(&clusters)
            }
            Err(e) => {
                self.state = SyncState::Failed;
                match e.severity() {
                    ErrorSeverity::Warning | ErrorSeverity::Info => {
                        warn!(error = %e, "Extraction failed, using fallback palette")
                    }
                    ErrorSeverity::Error => {
                        tracing::error!(error = %e, "Extraction failed, using fallback palette")
                    }
                }
                // The fallback is a display guarantee, not a chosen theme:
                // publish it in memory but leave the saved theme alone.
                self.publish(ThemePalette::fallback(), false);
                return;
            }
        };

        self.normalized = NormalizedThemeInput::from_palette(&palette, logo_url);
        self.publish(palette, true);
    }

    /// Restore the last saved theme, or the defaults when nothing is
    /// stored. Does not write back to the store.
    pub fn restore(&mut self) {
        let id = self.begin_request();
        let patch = match self.store.load() {
            Some(stored) => {
                info!("Restoring persisted theme");
                ThemeInputPatch::from(&stored)
            }
            None => {
                info!("No persisted theme, using defaults");
                ThemeInputPatch::default()
            }
        };
        self.run_pass(id, &patch, false);
    }

    /// Record a live interactive edit (color-picker drag). Edits coalesce:
    /// the debounce clock restarts on every call and the batch resolves to
    /// the last value per field when a deadline passes in [`tick`].
    ///
    /// [`tick`]: ThemeSynchronizer::tick
    pub fn edit(&mut self, field: ThemeField, value: impl Into<String>, now: Instant) {
        let patch = ThemeInputPatch::single(field, value);
        match &mut self.pending {
            Some(pending) => {
                pending.patch.merge(patch);
                pending.last_edit_at = now;
                pending.previewed = false;
            }
            None => {
                self.pending = Some(PendingEdit {
                    patch,
                    last_edit_at: now,
                    previewed: false,
                });
            }
        }
    }

    /// Drive the debounce timers. Host event loops call this periodically;
    /// tests call it with synthetic instants.
    pub fn tick(&mut self, now: Instant) {
        let Some(pending) = &self.pending else {
            return;
        };
        let quiet = now.saturating_duration_since(pending.last_edit_at);

        if quiet >= DEBOUNCE_PERSIST {
            if let Some(pending) = self.pending.take() {
                let id = self.begin_request();
                self.run_pass(id, &pending.patch, true);
            }
        } else if quiet >= DEBOUNCE_PREVIEW && !pending.previewed {
            let patch = pending.patch.clone();
            let id = self.begin_request();
            self.run_pass(id, &patch, false);
            if let Some(pending) = &mut self.pending {
                pending.previewed = true;
            }
        }
    }

    /// Run any pending edit immediately, with persistence. Call on
    /// teardown so a half-debounced edit is neither lost nor fired after
    /// disposal.
    pub fn flush(&mut self) {
        if let Some(pending) = self.pending.take() {
            let id = self.begin_request();
            self.run_pass(id, &pending.patch, true);
        }
    }

    fn run_pass(&mut self, request_id: u64, patch: &ThemeInputPatch, persist: bool) {
        if request_id < self.latest_started {
            debug!(request_id, latest = self.latest_started, "Discarding superseded pass");
            return;
        }

        self.state = SyncState::Normalizing;
        self.normalized = normalize::normalize(patch, Some(&self.normalized));

        self.state = SyncState::Synthesizing;
        let palette = palette::synthesize_from_input(&self.normalized);

        self.publish(palette, persist);
    }

    /// The single publication point: updates the token tree and the flat
    /// variable sink before returning, so no observer can see one sink
    /// ahead of the other, then invokes the persistence hook.
    fn publish(&mut self, palette: ThemePalette, persist: bool) {
        self.state = SyncState::Publishing;

        let tokens = ThemeTokens::from_palette(&palette);
        let vars = tokens.flat_variables();
        self.sink.set_many(&vars);
        self.palette = palette;
        self.tokens = tokens;

        if persist {
            // A failed save never blocks the in-memory palette.
            self.store.save(&self.normalized).warn_on_err();
        }

        info!(
            primary = %self.palette.primary,
            background = %self.palette.background,
            persisted = persist,
            "Theme published"
        );
        self.state = SyncState::Idle;
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
