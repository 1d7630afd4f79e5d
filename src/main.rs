//! kra-raster - Extract paint layers from Krita documents.
//!
//! This binary wires the archive, decoder and exporters to the command line.

use std::fs;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kra_raster::{
    config::{Cli, Command, ExtractConfig, InspectConfig, LayerSelection, ListConfig},
    container::{KraArchive, LayerRef},
    export::ImageExporter,
    layer::LayerService,
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::List(config) => run_list(config),
        Command::Inspect(config) => run_inspect(config),
        Command::Extract(config) => run_extract(config),
    }
}

/// Initialize the tracing/logging subsystem.
///
/// Logs go to stderr so that `extract` can write image bytes to stdout.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "kra_raster=debug"
    } else {
        "kra_raster=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_archive(path: &std::path::Path) -> Option<KraArchive<fs::File>> {
    match KraArchive::open(path) {
        Ok(archive) => Some(archive),
        Err(e) => {
            error!("{}", e);
            None
        }
    }
}

fn resolve_layer(archive: &KraArchive<fs::File>, selection: &LayerSelection) -> Option<LayerRef> {
    match archive.resolve_project(selection.project.as_deref()) {
        Ok(project) => Some(LayerRef::from_path(project, selection.layer.as_str())),
        Err(e) => {
            error!("{}", e);
            None
        }
    }
}

// =============================================================================
// List Command
// =============================================================================

fn run_list(config: ListConfig) -> ExitCode {
    let Some(archive) = open_archive(&config.file) else {
        return ExitCode::FAILURE;
    };

    match archive.is_mimetype_valid() {
        Ok(true) => println!("✓ mimetype: application/x-krita"),
        Ok(false) => println!("✗ mimetype: missing or not a Krita document"),
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    }

    let layers = archive.layer_entries();
    println!();
    println!("Layers ({}):", layers.len());
    for layer in &layers {
        println!("  {}", layer);
    }

    ExitCode::SUCCESS
}

// =============================================================================
// Inspect Command
// =============================================================================

fn run_inspect(config: InspectConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let Some(archive) = open_archive(&config.file) else {
        return ExitCode::FAILURE;
    };
    let Some(layer) = resolve_layer(&archive, &config.layer) else {
        return ExitCode::FAILURE;
    };

    let service = LayerService::new(archive);
    let summary = match service.inspect(&layer) {
        Ok(summary) => summary,
        Err(e) => {
            error!("{}: {}", layer, e);
            return ExitCode::FAILURE;
        }
    };

    if config.json {
        let json = serde_json::json!({
            "layer": layer,
            "path": layer.raster_path(),
            "summary": summary,
        });
        match serde_json::to_string_pretty(&json) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                error!("Failed to serialize summary: {}", e);
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    let header = &summary.header;
    let bounds = &summary.bounds;
    println!("Layer:      {}", layer);
    println!(
        "Tiles:      {} of {}x{}, {} bytes per pixel",
        header.tile_count, header.tile_width, header.tile_height, header.bytes_per_pixel
    );
    println!(
        "Bounds:     {}x{} at ({}, {})",
        bounds.width, bounds.height, bounds.min_x, bounds.min_y
    );
    println!(
        "Payload:    {} bytes ({} compressed, {} raw tiles)",
        summary.payload_bytes, summary.compressed_tiles, summary.raw_tiles
    );
    for (method, count) in &summary.methods {
        println!("Method:     {} x{}", method, count);
    }

    ExitCode::SUCCESS
}

// =============================================================================
// Extract Command
// =============================================================================

fn run_extract(config: ExtractConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let Some(archive) = open_archive(&config.file) else {
        return ExitCode::FAILURE;
    };
    let Some(layer) = resolve_layer(&archive, &config.layer) else {
        return ExitCode::FAILURE;
    };

    let format = config.resolved_format();
    let options = config.decode_options();
    debug!(?options, %format, "Extract settings");

    let service = LayerService::new(archive).with_options(options);
    let exporter = ImageExporter::with_quality(config.quality);

    let run = || -> Result<Vec<u8>, String> {
        let response = service.get_layer(&layer).map_err(|e| e.to_string())?;
        let decoded = &response.layer;
        if !decoded.warnings.is_empty() {
            warn!("{} tile(s) were skipped or blanked", decoded.warnings.len());
        }
        info!(
            "Decoded {}x{} canvas at ({}, {})",
            decoded.canvas.width, decoded.canvas.height, decoded.canvas.origin_x, decoded.canvas.origin_y
        );
        exporter
            .encode(&decoded.canvas, format)
            .map_err(|e| e.to_string())
    };

    let result = match config.threads {
        Some(threads) if threads > 1 => rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| format!("Failed to start thread pool: {}", e))
            .and_then(|pool| pool.install(run)),
        _ => run(),
    };

    let encoded = match result {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("{}: {}", layer, e);
            return ExitCode::FAILURE;
        }
    };

    let written = match &config.output {
        Some(path) => fs::write(path, &encoded).map(|_| path.display().to_string()),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(&encoded)
                .and_then(|_| stdout.flush())
                .map(|_| "stdout".to_string())
        }
    };

    match written {
        Ok(target) => {
            info!("Wrote {} {} bytes to {}", format, encoded.len(), target);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to write output: {}", e);
            ExitCode::FAILURE
        }
    }
}
