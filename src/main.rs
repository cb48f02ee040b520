//! slide-ome - OME-XML metadata and thumbnails for Whole Slide Image conversion.
//!
//! Each subcommand handles one slide; a failure is logged and reported through
//! the exit code without affecting other invocations.

use std::io::Write;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use slide_ome::{
    config::{Cli, Command, InspectConfig, LevelConfig, OmeXmlConfig, ThumbnailConfig},
    ome::{OmeMetadataBuilder, OmeXmlDocument, PixelsGeometry, ResolutionLevel},
    slide::SlideProperties,
    thumbnail::{open_image, save_thumbnail},
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let start = Instant::now();

    let code = match cli.command {
        Command::OmeXml(config) => run_ome_xml(config),
        Command::Level(config) => run_level(config),
        Command::Thumbnail(config) => run_thumbnail(config),
        Command::Inspect(config) => run_inspect(config),
    };

    info!("Running time: {:.2}s", start.elapsed().as_secs_f64());
    code
}

/// Initialize the tracing/logging subsystem.
///
/// Logs go to stderr; stdout is reserved for command output.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "slide_ome=debug"
    } else {
        "slide_ome=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

// =============================================================================
// ome-xml Command
// =============================================================================

fn run_ome_xml(config: OmeXmlConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let properties = match SlideProperties::load(&config.properties) {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to read {}: {}", config.properties.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let image = match properties.image_metadata() {
        Ok(image) => image,
        Err(e) => {
            error!("Invalid slide properties: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!(
        "Slide {}: {}x{} {}",
        config.properties.display(),
        image.width,
        image.height,
        image.vendor
    );

    let document = match OmeMetadataBuilder::new().build(&image, config.pyramid_spec()) {
        Ok(doc) => doc,
        Err(e) => {
            error!("Failed to build OME-XML: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let written = match &config.output {
        Some(path) => std::fs::write(path, document.as_bytes()),
        None => std::io::stdout().lock().write_all(document.as_bytes()),
    };

    if let Err(e) = written {
        error!("Failed to write OME-XML: {}", e);
        return ExitCode::FAILURE;
    }

    if let Some(path) = &config.output {
        info!("Wrote {} bytes to {}", document.as_bytes().len(), path.display());
    }

    ExitCode::SUCCESS
}

// =============================================================================
// level Command
// =============================================================================

fn run_level(config: LevelConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let selected = SlideProperties::load(&config.properties)
        .and_then(|properties| properties.levels())
        .map_err(|e| e.to_string())
        .and_then(|levels| {
            let index = levels.choose(config.size).map_err(|e| e.to_string())?;
            Ok((index, levels.width_of(index).unwrap_or_default()))
        });

    match selected {
        Ok((index, width)) => {
            info!("Level {} ({}px) for target width {}", index, width, config.size);
            println!("{}", index);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Level selection failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// thumbnail Command
// =============================================================================

fn run_thumbnail(config: ThumbnailConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let output = config.output_path();
    let result = config.request().and_then(|request| {
        let source = open_image(&config.image)?;
        let thumbnail = request.render(&source)?;
        save_thumbnail(&thumbnail, &output, request.jpeg_quality())?;
        Ok((thumbnail.width(), thumbnail.height()))
    });

    match result {
        Ok((width, height)) => {
            info!("Wrote {}x{} thumbnail to {}", width, height, output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Thumbnail failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// inspect Command
// =============================================================================

#[derive(Debug, Serialize)]
struct InspectReport {
    pixels: PixelsGeometry,
    original_metadata: Vec<(String, String)>,
    resolutions: Vec<ResolutionLevel>,
}

fn inspect(config: &InspectConfig) -> Result<InspectReport, String> {
    let bytes = std::fs::read(&config.document).map_err(|e| e.to_string())?;
    let document = OmeXmlDocument::parse(bytes).map_err(|e| e.to_string())?;

    Ok(InspectReport {
        pixels: document.pixels().map_err(|e| e.to_string())?,
        original_metadata: document.original_metadata(),
        resolutions: document.resolutions().map_err(|e| e.to_string())?,
    })
}

fn run_inspect(config: InspectConfig) -> ExitCode {
    init_logging(config.verbose);

    let report = match inspect(&config) {
        Ok(report) => report,
        Err(e) => {
            error!("Failed to inspect {}: {}", config.document.display(), e);
            return ExitCode::FAILURE;
        }
    };

    if config.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize report: {}", e);
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    let pixels = &report.pixels;
    println!("Size: {} x {}", pixels.size_x, pixels.size_y);
    if let (Some(x), Some(y)) = (pixels.physical_size_x, pixels.physical_size_y) {
        let unit = pixels.physical_size_unit.as_deref().unwrap_or("");
        println!("Pixel size: {} x {} {}", x, y, unit);
    }

    println!();
    println!("Original metadata ({}):", report.original_metadata.len());
    for (key, value) in &report.original_metadata {
        println!("  {} = {}", key, value);
    }

    if !report.resolutions.is_empty() {
        println!();
        println!("Resolutions:");
        for level in &report.resolutions {
            println!("  {}: {} x {}", level.layer, level.width, level.height);
        }
    }

    ExitCode::SUCCESS
}
