use anyhow::{Context, Result};
use opencv::{
    calib3d,
    core::{Mat, Vector},
    prelude::*,
};

use crate::camera::Intrinsics;
use crate::decoder::mat::{frame_to_mat, mat_to_bytes};
use crate::decoder::FrameData;

/// Lens-distortion correction. The output has the input's dimensions.
pub trait Undistort {
    fn undistort(&mut self, frame: &FrameData, intrinsics: &Intrinsics) -> Result<FrameData>;
}

/// `calib3d::undistort` with the full 8-term rational model.
#[derive(Default)]
pub struct OpenCvUndistorter;

impl OpenCvUndistorter {
    pub fn new() -> Self {
        Self
    }
}

impl Undistort for OpenCvUndistorter {
    fn undistort(&mut self, frame: &FrameData, intrinsics: &Intrinsics) -> Result<FrameData> {
        let src = frame_to_mat(frame)?;
        let k = intrinsics.camera_matrix();
        let camera_matrix = Mat::from_slice_2d(k.as_slice())?;
        let dist_coeffs = Vector::<f64>::from_slice(&intrinsics.distortion());

        let mut dst = Mat::default();
        // empty new camera matrix: keep K for the corrected image
        let new_camera_matrix = Mat::default();
        calib3d::undistort(&src, &mut dst, &camera_matrix, &dist_coeffs, &new_camera_matrix)
            .context("calib3d::undistort failed")?;

        frame.with_buffer(mat_to_bytes(&dst)?, dst.cols() as u32, dst.rows() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_undistort_keeps_dimensions() {
        let buffer: Vec<u8> = (0..32 * 24 * 3).map(|i| (i % 251) as u8).collect();
        let frame = FrameData::new(buffer, 32, 24, Duration::from_millis(80)).unwrap();
        let intrinsics = Intrinsics {
            k1: -0.1,
            ..Intrinsics::uncalibrated(32, 24)
        };

        let out = OpenCvUndistorter::new().undistort(&frame, &intrinsics).unwrap();
        assert_eq!((out.width, out.height), (32, 24));
        assert_eq!(out.buffer.len(), frame.buffer.len());
        assert_eq!(out.timestamp, frame.timestamp);
    }
}
