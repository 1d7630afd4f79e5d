//! Command-line configuration for kra-raster.
//!
//! This module provides the CLI surface:
//! - Subcommands via clap derive
//! - Environment variables with `KRA_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use kra_raster::config::{Cli, Command};
//!
//! let cli = Cli::parse();
//! match cli.command {
//!     Command::Extract(config) => println!("Extracting {}", config.layer),
//!     _ => {}
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `KRA_VERBOSE` - Enable debug logging (default: false)
//! - `KRA_PROJECT` - Project directory inside the archive (default: inferred)
//! - `KRA_FORMAT` - Output format for `extract` (default: from extension, else bmp)
//! - `KRA_JPEG_QUALITY` - JPEG quality for `extract` (default: 80)
//! - `KRA_THREADS` - Decoder threads for `extract` (default: all cores)
//! - `KRA_MAX_CANVAS_MB` - Largest canvas `extract` will allocate (default: 1024)

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::export::{is_valid_quality, OutputFormat, DEFAULT_JPEG_QUALITY};
use crate::raster::{CorruptTilePolicy, DecodeOptions, PlacementPolicy, DEFAULT_MAX_CANVAS_BYTES};

// =============================================================================
// Default Values
// =============================================================================

/// Default canvas limit in MiB.
pub const DEFAULT_MAX_CANVAS_MB: usize = DEFAULT_MAX_CANVAS_BYTES / (1024 * 1024);

// =============================================================================
// CLI Arguments
// =============================================================================

/// kra-raster - Extract paint layers from Krita documents.
///
/// Reads the tiled, compressed pixel data of a layer straight out of a .kra
/// archive and writes it as a standalone image.
#[derive(Parser, Debug, Clone)]
#[command(name = "kra-raster")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true, default_value_t = false, env = "KRA_VERBOSE")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List the layer tile streams in an archive.
    List(ListConfig),

    /// Show the header and tile statistics of one layer.
    Inspect(InspectConfig),

    /// Decode one layer and write it as an image.
    Extract(ExtractConfig),
}

// =============================================================================
// List
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct ListConfig {
    /// Path to the .kra file.
    pub file: PathBuf,
}

// =============================================================================
// Inspect
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct InspectConfig {
    /// Path to the .kra file.
    pub file: PathBuf,

    #[command(flatten)]
    pub layer: LayerSelection,

    /// Print JSON instead of text.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

impl InspectConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        self.layer.validate()
    }
}

// =============================================================================
// Extract
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct ExtractConfig {
    /// Path to the .kra file.
    pub file: PathBuf,

    #[command(flatten)]
    pub layer: LayerSelection,

    /// Output file. Image bytes go to stdout when omitted.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format.
    ///
    /// Defaults to the output file's extension, or bmp.
    #[arg(short, long, value_enum, env = "KRA_FORMAT")]
    pub format: Option<OutputFormat>,

    /// JPEG quality (1-100).
    #[arg(short, long, default_value_t = DEFAULT_JPEG_QUALITY, env = "KRA_JPEG_QUALITY")]
    pub quality: u8,

    /// Fail on the first tile that does not fit the canvas.
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// Replace tiles that fail to decompress with transparent tiles.
    #[arg(long, default_value_t = false)]
    pub blank_corrupt_tiles: bool,

    /// Number of decoder threads (1 decodes sequentially).
    #[arg(long, env = "KRA_THREADS")]
    pub threads: Option<usize>,

    /// Refuse canvases larger than this many MiB.
    #[arg(long, default_value_t = DEFAULT_MAX_CANVAS_MB, env = "KRA_MAX_CANVAS_MB")]
    pub max_canvas_mb: usize,
}

impl ExtractConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        self.layer.validate()?;

        if !is_valid_quality(self.quality) {
            return Err("quality must be between 1 and 100".to_string());
        }

        if self.threads == Some(0) {
            return Err("threads must be greater than 0".to_string());
        }

        if self.max_canvas_mb == 0 {
            return Err("max_canvas_mb must be greater than 0".to_string());
        }

        if self.format.is_none() {
            if let Some(ext) = self.output_extension() {
                if OutputFormat::from_extension(&ext).is_none() {
                    return Err(format!(
                        "Cannot infer output format from extension '.{}'. Pass --format",
                        ext
                    ));
                }
            }
        }

        Ok(())
    }

    /// The output format: explicit, else inferred from the output path, else BMP.
    pub fn resolved_format(&self) -> OutputFormat {
        self.format
            .or_else(|| {
                self.output_extension()
                    .and_then(|ext| OutputFormat::from_extension(&ext))
            })
            .unwrap_or_default()
    }

    /// Decode options derived from the flags.
    pub fn decode_options(&self) -> DecodeOptions {
        let placement = if self.strict {
            PlacementPolicy::FailFast
        } else {
            PlacementPolicy::BestEffort
        };
        let corrupt_tiles = if self.blank_corrupt_tiles {
            CorruptTilePolicy::Blank
        } else {
            CorruptTilePolicy::Abort
        };

        DecodeOptions::default()
            .with_placement(placement)
            .with_corrupt_tiles(corrupt_tiles)
            .with_parallel(self.threads != Some(1))
            .with_max_canvas_bytes(self.max_canvas_mb.saturating_mul(1024 * 1024))
    }

    fn output_extension(&self) -> Option<String> {
        self.output
            .as_ref()?
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_string)
    }
}

// =============================================================================
// Layer Selection
// =============================================================================

/// Which layer to read.
#[derive(Args, Debug, Clone)]
pub struct LayerSelection {
    /// Layer filename inside the project's layers/ directory (e.g. layer2).
    #[arg(short, long)]
    pub layer: String,

    /// Project directory inside the archive.
    ///
    /// Inferred when the archive holds a single project.
    #[arg(short, long, env = "KRA_PROJECT")]
    pub project: Option<String>,
}

impl LayerSelection {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.layer.is_empty() {
            return Err("Layer filename is required. Set --layer".to_string());
        }
        if self.layer.contains('/') {
            return Err(format!(
                "Layer '{}' must be a bare filename, not a path",
                self.layer
            ));
        }
        if matches!(self.project.as_deref(), Some(p) if p.is_empty() || p.contains('/')) {
            return Err("Project must be a single non-empty directory name".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
