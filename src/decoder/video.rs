use anyhow::{anyhow, Context, Result};
use opencv::{
    core,
    prelude::*,
    videoio,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::frame_data::FrameData;
use super::mat::mat_to_bytes;
use super::source::{FrameSource, SourceInfo};
use crate::core::error::ExtractError;
use crate::utils::logger;

/// OpenCV-backed video reader. Owns the capture handle and releases it on drop.
pub struct VideoDecoder {
    capture: videoio::VideoCapture,
    path: PathBuf,
    info: SourceInfo,
    // index of the frame the next read returns
    position: u64,
}

impl VideoDecoder {
    pub fn open(path: &Path) -> Result<Self> {
        logger::info(&format!("Opening video {:?}", path));

        let path_str = path
            .to_str()
            .ok_or_else(|| anyhow!("video path is not valid UTF-8: {:?}", path))?;

        // CAP_ANY lets OpenCV pick the platform backend
        let capture = videoio::VideoCapture::from_file(path_str, videoio::CAP_ANY)
            .map_err(|e| {
                logger::error(&format!("VideoCapture::from_file failed: {}", e));
                ExtractError::SourceOpen { path: path.to_path_buf() }
            })?;

        if !capture.is_opened()? {
            logger::error(&format!("Failed to open video file: {:?}", path));
            return Err(ExtractError::SourceOpen { path: path.to_path_buf() }.into());
        }

        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;
        let frame_count = capture.get(videoio::CAP_PROP_FRAME_COUNT)?.max(0.0) as u64;
        let fps = capture.get(videoio::CAP_PROP_FPS)?;

        let info = SourceInfo { width, height, frame_count, fps };
        logger::info(&format!(
            "Video opened: {}x{}, {} frames, {:.3} fps",
            width, height, frame_count, fps
        ));

        Ok(Self {
            capture,
            path: path.to_path_buf(),
            info,
            position: 0,
        })
    }

    fn timestamp_of(&self, index: u64) -> Duration {
        if self.info.fps > 0.0 {
            Duration::from_secs_f64(index as f64 / self.info.fps)
        } else {
            Duration::ZERO
        }
    }

    fn mat_to_frame(&self, mat: &core::Mat, index: u64) -> Result<FrameData> {
        let bytes = mat_to_bytes(mat).with_context(|| format!("frame {}", index))?;
        FrameData::new(bytes, mat.cols() as u32, mat.rows() as u32, self.timestamp_of(index))
    }
}

impl FrameSource for VideoDecoder {
    fn info(&self) -> SourceInfo {
        self.info
    }

    fn read_next(&mut self) -> Result<Option<FrameData>> {
        let index = self.position;
        let mut mat = core::Mat::default();
        if !self.capture.read(&mut mat)? || mat.empty() {
            logger::debug(&format!("No data at frame {}", index));
            return Ok(None);
        }
        self.position += 1;
        self.mat_to_frame(&mat, index).map(Some)
    }

    fn skip_next(&mut self) -> Result<bool> {
        // grab() demuxes and decodes without the retrieve/convert step
        if !self.capture.grab()? {
            return Ok(false);
        }
        self.position += 1;
        Ok(true)
    }

    fn seek(&mut self, index: u64) -> Result<()> {
        let accepted = self
            .capture
            .set(videoio::CAP_PROP_POS_FRAMES, index as f64)
            .with_context(|| format!("seek to frame {} failed", index))?;
        if !accepted {
            logger::warn(&format!("Backend ignored seek to frame {}", index));
        }
        self.position = index;
        Ok(())
    }
}

impl Drop for VideoDecoder {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            logger::error(&format!("Releasing {:?} failed: {}", self.path, e));
        } else {
            logger::debug(&format!("Released {:?}", self.path));
        }
    }
}
