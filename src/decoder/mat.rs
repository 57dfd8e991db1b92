use anyhow::{anyhow, Result};
use opencv::{
    core::{self, Mat, Scalar},
    prelude::*,
};

use super::frame_data::{FrameData, CHANNELS};

/// Copies a packed frame into a new 8UC3 matrix.
pub fn frame_to_mat(frame: &FrameData) -> Result<Mat> {
    let mut mat = Mat::new_rows_cols_with_default(
        frame.height as i32,
        frame.width as i32,
        core::CV_8UC3,
        Scalar::all(0.0),
    )?;
    mat.data_bytes_mut()?.copy_from_slice(&frame.buffer);
    Ok(mat)
}

/// Copies the pixels of an 8UC3 matrix out of OpenCV-owned memory.
pub fn mat_to_bytes(mat: &Mat) -> Result<Vec<u8>> {
    if mat.channels() as usize != CHANNELS || mat.depth() != core::CV_8U {
        return Err(anyhow!(
            "unsupported matrix layout: {} channels, depth {}",
            mat.channels(),
            mat.depth()
        ));
    }
    // a non-continuous view (ROI) is compacted first
    if mat.is_continuous() {
        Ok(mat.data_bytes()?.to_vec())
    } else {
        Ok(mat.try_clone()?.data_bytes()?.to_vec())
    }
}
