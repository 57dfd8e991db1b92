mod camera;
mod core;
mod decoder;
mod processing;
mod shared;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::camera::{remap_intrinsics, Intrinsics};
use crate::core::{ExportArgs, ExportConfig, ExportPipeline, ExportSettings, FrameSeeker};
use crate::decoder::{FrameSource, SourceInfo, VideoDecoder};
use crate::processing::resize::downscaled_dimensions;
use crate::processing::{BoxResizer, ImageSequenceSink, OpenCvUndistorter};
use crate::shared::constants;
use crate::utils::{console, logger};

#[derive(Parser)]
#[command(author, version, about = "Export a video as a numbered image sequence", long_about = None)]
#[command(after_help = constants::OUTPUT_NOTES)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write selected frames of a video as numbered images
    Export(ExportArgs),
    /// Print video properties and the uncalibrated intrinsics as JSON
    Probe {
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Serialize)]
struct ProbeReport {
    source: SourceInfo,
    default_intrinsics: Intrinsics,
}

fn main() -> Result<()> {
    logger::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Export(args) => run_export(args),
        Commands::Probe { input } => {
            let decoder = VideoDecoder::open(input)?;
            let source = decoder.info();
            let report = ProbeReport {
                source,
                default_intrinsics: Intrinsics::uncalibrated(source.width, source.height),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

/// Loads the calibration and builds the seeker. `None` when the range
/// selects no frame of this source; a bad calibration file fails either way.
fn prepare_export<S: FrameSource>(
    config: &ExportConfig,
    source: S,
) -> Result<Option<(FrameSeeker<S>, Intrinsics)>> {
    let info = source.info();
    let intrinsics = match &config.intrinsic_in {
        Some(path) => Intrinsics::load(path).map_err(|e| {
            logger::error(&format!("Calibration: {:#}", e));
            e
        })?,
        None => Intrinsics::uncalibrated(info.width, info.height),
    };

    let seeker = FrameSeeker::new(source, config.range);
    if !seeker.has_next() {
        return Ok(None);
    }
    Ok(Some((seeker, intrinsics)))
}

fn run_export(args: &ExportArgs) -> Result<()> {
    let config = ExportConfig::try_from(args).map_err(|e| {
        logger::error(&format!("Configuration: {}", e));
        e
    })?;
    logger::info(&format!("Configuration: {:?}", config));

    let decoder = VideoDecoder::open(&config.input)?;
    let info = decoder.info();

    let (seeker, intrinsics) = match prepare_export(&config, decoder)? {
        Some(prepared) => prepared,
        None => {
            let msg = "the selected frame range is empty, no frame will be written.";
            logger::warn(msg);
            if config.verbose >= constants::VERBOSE_BANNER {
                println!("Warning: {}", msg);
            }
            return Ok(());
        }
    };

    if config.undistort && !intrinsics.has_distortion() {
        logger::warn("--undistort with all distortion terms zero leaves frames unchanged");
    }
    let remapped = remap_intrinsics(
        &intrinsics,
        config.orientation,
        info.width,
        info.height,
        config.downscale as f64,
    );
    if let Some(path) = &config.intrinsic_out {
        remapped.save_projection(path)?;
        logger::info(&format!("Wrote intrinsics {:?}: {}", path, remapped.to_projection_line()));
    }

    if config.verbose >= constants::VERBOSE_BANNER {
        let scaled = downscaled_dimensions(info.width, info.height, config.downscale);
        let output_size = config.orientation.output_dimensions(scaled.0, scaled.1);
        console::banner();
        console::video_info(&info, output_size);
        if config.intrinsic_in.is_some() {
            console::calibration("Calibration data", &intrinsics, true);
        }
        if config.intrinsic_out.is_some() {
            console::calibration("After downscale", &remapped, false);
        }
    }

    // Ctrl-C finishes the current frame, then stops pulling new ones
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let settings = ExportSettings {
        intrinsics,
        undistort: config.undistort,
        downscale: config.downscale,
        orientation: config.orientation,
        numbering: config.numbering,
        verbose: config.verbose,
    };
    let mut pipeline = ExportPipeline::new(
        settings,
        Box::new(OpenCvUndistorter::new()),
        Box::new(BoxResizer::new()),
    )
    .with_stop_flag(running);

    let mut seeker = seeker;
    let mut sink = ImageSequenceSink::new(config.template.clone());
    let summary = pipeline.run(&mut seeker, &mut sink)?;
    // releases the decoder before the summary is printed
    drop(seeker);

    logger::info(&format!(
        "{} files written, last source frame {:?} as #{:?}",
        sink.written(),
        summary.last_source_index,
        summary.last_sequence
    ));

    if config.verbose >= constants::VERBOSE_BANNER {
        if summary.stopped_early {
            println!("Interrupted after {} frames.", summary.frames_emitted);
        } else {
            println!("Exported {} frames.", summary.frames_emitted);
        }
    }
    Ok(())
}
