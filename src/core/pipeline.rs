use anyhow::{Context, Result};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::camera::{apply_to_image, Intrinsics, Orientation};
use crate::core::error::ExtractError;
use crate::core::seeker::FrameSeeker;
use crate::decoder::{FrameData, FrameSource};
use crate::processing::resize::downscaled_dimensions;
use crate::processing::{FrameSink, Resize, Undistort};
use crate::shared::constants;
use crate::utils::logger;

/// Sequence numbers `start, start + step, start + 2 * step, ...`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputNumbering {
    pub start: u64,
    pub step: u64,
}

impl OutputNumbering {
    pub fn new(start: u64, step: u64) -> Result<Self, ExtractError> {
        if step == 0 {
            return Err(ExtractError::config("output-step cannot be smaller than 1."));
        }
        Ok(Self { start, step })
    }

    /// Number given to the `emitted`-th frame (0-based). Fails once the
    /// sequence no longer fits in a `u64`.
    pub fn nth(&self, emitted: u64) -> Result<u64, ExtractError> {
        emitted
            .checked_mul(self.step)
            .and_then(|offset| offset.checked_add(self.start))
            .ok_or_else(|| {
                ExtractError::config(format!(
                    "output number of frame #{} overflows (start {}, step {})",
                    emitted, self.start, self.step
                ))
            })
    }
}

/// What happens to every frame between the seeker and the sink.
#[derive(Clone, Debug)]
pub struct ExportSettings {
    pub intrinsics: Intrinsics,
    pub undistort: bool,
    pub downscale: u32,
    pub orientation: Orientation,
    pub numbering: OutputNumbering,
    pub verbose: u8,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub frames_emitted: u64,
    pub last_source_index: Option<u64>,
    pub last_sequence: Option<u64>,
    pub stopped_early: bool,
}

/// Drives a seeker to the end: undistort, then downscale, then orient, then
/// hand the frame to the sink.
///
/// The order matters for anyone writing calibration next to the frames:
/// [`Intrinsics::remap`] assumes exactly this order, with the same
/// downscale and orientation.
pub struct ExportPipeline {
    settings: ExportSettings,
    undistorter: Box<dyn Undistort>,
    resizer: Box<dyn Resize>,
    running: Option<Arc<AtomicBool>>,
}

impl ExportPipeline {
    pub fn new(
        settings: ExportSettings,
        undistorter: Box<dyn Undistort>,
        resizer: Box<dyn Resize>,
    ) -> Self {
        Self {
            settings,
            undistorter,
            resizer,
            running: None,
        }
    }

    /// Frames are only pulled while `running` holds `true`.
    pub fn with_stop_flag(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = Some(running);
        self
    }

    fn should_continue(&self) -> bool {
        self.running
            .as_ref()
            .map_or(true, |flag| flag.load(Ordering::SeqCst))
    }

    pub fn process_frame(&mut self, frame: FrameData) -> Result<FrameData> {
        let frame = if self.settings.undistort {
            self.undistorter
                .undistort(&frame, &self.settings.intrinsics)
                .context("undistort")?
        } else {
            frame
        };

        let frame = if self.settings.downscale > 1 {
            let (w, h) = downscaled_dimensions(frame.width, frame.height, self.settings.downscale);
            self.resizer.resize(&frame, w, h).context("downscale")?
        } else {
            frame
        };

        if self.settings.orientation == Orientation::None {
            Ok(frame)
        } else {
            apply_to_image(&frame, self.settings.orientation).context("orientation")
        }
    }

    pub fn run<S, K>(&mut self, seeker: &mut FrameSeeker<S>, sink: &mut K) -> Result<ExportSummary>
    where
        S: FrameSource,
        K: FrameSink + ?Sized,
    {
        let mut summary = ExportSummary::default();
        let show_progress = self.settings.verbose >= constants::VERBOSE_PROGRESS;

        logger::info(&format!(
            "Export: {} frames planned, undistort={} downscale={} rotate={}",
            seeker.frames_remaining(),
            self.settings.undistort,
            self.settings.downscale,
            self.settings.orientation
        ));

        while seeker.has_next() {
            if !self.should_continue() {
                summary.stopped_early = true;
                logger::info("Export stopped before the range was exhausted");
                break;
            }

            let (index, frame) = seeker.produce_next().map_err(|e| {
                logger::error(&format!("Frame production failed: {:#}", e));
                e
            })?;
            let frame = self
                .process_frame(frame)
                .with_context(|| format!("processing frame {}", index))?;

            let sequence = self.settings.numbering.nth(summary.frames_emitted)?;
            sink.deliver(sequence, frame)
                .with_context(|| format!("delivering frame {} as #{}", index, sequence))?;

            summary.frames_emitted += 1;
            summary.last_source_index = Some(index);
            summary.last_sequence = Some(sequence);
            logger::debug(&format!("frame {} -> #{}", index, sequence));

            if show_progress {
                print!("\rCurrent frame: {}", index);
                let _ = std::io::stdout().flush();
            }
        }

        if show_progress && summary.frames_emitted > 0 {
            println!();
        }
        logger::info(&format!("Export finished: {} frames", summary.frames_emitted));
        Ok(summary)
    }
}
