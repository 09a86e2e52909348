use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gpig::acquisition::{LocalArchive, load_data};
use gpig::config::Config;
use gpig::driver::ConsoleProgress;
use gpig::inversion::CommandInversion;
use gpig::output::{Pigment, write_tiff};
use gpig::pipeline::{PigmentPipeline, RegionSource, RunOptions};
use gpig::readers::{NcFieldReader, NcSwathReader};
use gpig::region::Console;

/// Pixel-wise phytoplankton pigment estimation from PACE OCI L2 reflectance.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Run configuration (JSON)
    #[arg(long, default_value = "./data/config/pigments.json")]
    config: PathBuf,

    /// Multi-page TIFF to write, overrides the configured output
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut config = Config::from_file(&args.config)?;
    if let Some(output) = args.output {
        config.set_output(output);
    }
    info!(config = %args.config.display(), "starting pigment estimation");

    let archive = LocalArchive::new(config.archive_directory());
    let paths = load_data(
        &archive,
        config.time_span(),
        config.bbox(),
        config.download_directory(),
    )?;

    let inversion = CommandInversion::spawn(config.inversion_command())?;

    let pipeline = PigmentPipeline::new(
        NcSwathReader::new(&paths.l2),
        NcFieldReader::salinity(&paths.salinity),
        NcFieldReader::temperature(&paths.temperature),
        RunOptions {
            policy: config.on_inversion_failure(),
            parallel: config.parallel(),
        },
    );

    let mut fixed;
    let mut console;
    let region: &mut dyn RegionSource = match config.region() {
        Some(bbox) => {
            fixed = *bbox;
            &mut fixed
        }
        None => {
            console = Console::stdio();
            &mut console
        }
    };

    let progress = ConsoleProgress::new();
    let output = pipeline.process(region, &inversion, &progress)?;

    info!(
        computed = output.stats.computed,
        skipped = output.stats.skipped,
        failed = output.stats.failed,
        total = output.stats.total(),
        "cells processed"
    );
    for pigment in Pigment::ALL {
        info!("{pigment}: {}", output.product.stats(pigment));
    }

    if let Some(path) = config.output() {
        write_tiff(&output.product, path)?;
    }

    Ok(())
}
