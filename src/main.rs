//! logotheme CLI - extract a theme palette from a logo image
//!
//! Runs the full pipeline (sample, cluster, synthesize, publish) against an
//! image file and prints the resulting tokens. Extraction failures still
//! produce the fallback palette on stdout, with diagnostics on stderr, so
//! scripted callers always get a valid theme.
//!
//! # Usage
//!
//! ```bash
//! logotheme logo.png
//! logotheme logo.png --colors 3 --quality 2 --json
//! logotheme logo.png --flat --save
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use logotheme::sync::{JsonFileStore, MemorySink, ThemeStore, ThemeSynchronizer};
use logotheme::{ImageSource, SampleOptions};

#[derive(Parser, Debug)]
#[command(name = "logotheme", about = "Extract a theme palette from a logo image")]
struct Args {
    /// Image file to extract from
    image: PathBuf,

    /// Number of dominant colors to cluster
    #[arg(long, default_value_t = 5)]
    colors: usize,

    /// Sampling quality (higher = sparser pixel stride)
    #[arg(long, default_value_t = 5)]
    quality: usize,

    /// Seed for the clustering RNG (reproducible output)
    #[arg(long)]
    seed: Option<u64>,

    /// Print JSON instead of a readable listing
    #[arg(long)]
    json: bool,

    /// Print the flat variable map instead of the token tree
    #[arg(long)]
    flat: bool,

    /// Persist the extracted theme to the default store location
    #[arg(long)]
    save: bool,
}

fn main() -> Result<()> {
    let _guard = logotheme::logging::init();
    let args = Args::parse();

    let options = SampleOptions {
        color_count: args.colors,
        quality: args.quality,
    };
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    info!(image = %args.image.display(), colors = args.colors, quality = args.quality, "Extracting theme");

    let sink = MemorySink::new();
    if args.save {
        let store = JsonFileStore::default_location();
        info!(path = %store.path().display(), "Persisting extracted theme");
        let mut sync = ThemeSynchronizer::new(sink.clone(), store);
        sync.apply_image(ImageSource::Path(args.image.clone()), options, &mut rng);
        print_output(&args, sync.tokens(), &sink)?;
    } else {
        let mut sync = ThemeSynchronizer::new(sink.clone(), NoopStore);
        sync.apply_image(ImageSource::Path(args.image.clone()), options, &mut rng);
        print_output(&args, sync.tokens(), &sink)?;
    }

    Ok(())
}

fn print_output(args: &Args, tokens: &logotheme::ThemeTokens, sink: &MemorySink) -> Result<()> {
    if args.flat {
        let vars = sink.snapshot();
        if args.json {
            println!("{}", serde_json::to_string_pretty(&vars)?);
        } else {
            for (key, value) in vars {
                println!("{:<18} {}", key, value);
            }
        }
    } else if args.json {
        println!("{}", serde_json::to_string_pretty(tokens)?);
    } else {
        println!("palette");
        println!("  primary        {}", tokens.palette.primary);
        println!("  primary-light  {}", tokens.palette.primary_light);
        println!("  primary-dark   {}", tokens.palette.primary_dark);
        println!("  secondary      {}", tokens.palette.secondary);
        println!("  accent         {}", tokens.palette.accent);
        println!("  neutral        {}", tokens.palette.neutral);
        println!("surface");
        println!("  background     {}", tokens.surface.background);
        println!("  paper          {}", tokens.surface.background_paper);
        println!("  selection      {}", tokens.surface.selection);
        println!("text");
        println!("  primary        {}", tokens.text.primary);
        println!("  secondary      {}", tokens.text.secondary);
        println!("  contrast       {}", tokens.text.contrast);
    }
    Ok(())
}

/// Store for one-shot runs that should not touch the disk.
struct NoopStore;

impl ThemeStore for NoopStore {
    fn save(&mut self, _input: &logotheme::NormalizedThemeInput) -> logotheme::error::Result<()> {
        Ok(())
    }

    fn load(&self) -> Option<logotheme::NormalizedThemeInput> {
        None
    }
}
