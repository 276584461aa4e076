//! logotheme - logo-driven theme extraction and synchronization
//!
//! Given an uploaded logo image, this crate samples its pixels, clusters
//! them into a small dominant-color set, synthesizes an
//! accessibility-constrained palette, and keeps that palette available in
//! two consumption forms at once: a structured token tree for a component
//! hierarchy and a flat string-keyed variable map for everything outside
//! it. The two are always published together and can never disagree.
//!
//! Pipeline, leaves first:
//!
//! - [`color`] - pure color math (hex, HSL, WCAG luminance/contrast)
//! - [`sampler`] - raster loading and quality-strided pixel sampling
//! - [`cluster`] - bounded k-means over the sampled pixels
//! - [`palette`] - six-slot palette synthesis with contrast guarantees
//! - [`normalize`] - the single admission point for external theme shapes
//! - [`sync`] - the synchronizer: debounced passes, atomic dual
//!   publication, persistence hook

pub mod cluster;
pub mod color;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod palette;
pub mod sampler;
pub mod sync;

pub use cluster::{dominant_colors, ColorCluster};
pub use color::Rgb;
pub use error::{ErrorSeverity, ResultExt, ThemeError};
pub use normalize::{normalize, NormalizedThemeInput, ThemeField, ThemeInputPatch};
pub use palette::{synthesize_from_clusters, synthesize_from_primary, ThemePalette};
pub use sampler::{ImageSource, SampleOptions};
pub use sync::{
    JsonFileStore, MemorySink, MemoryStore, ThemeStore, ThemeSynchronizer, ThemeTokens,
    VariableSink,
};
