use anyhow::Result;
use rayon::prelude::*;
use std::fmt;
use std::str::FromStr;

use super::intrinsics::Intrinsics;
use crate::core::error::ExtractError;
use crate::decoder::frame_data::{FrameData, CHANNELS};
use crate::shared::constants;

/// The eight symmetries of a rectangle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    #[default]
    None,
    /// 90° clockwise
    Cw,
    /// 90° counter-clockwise
    Ccw,
    /// Mirror left/right
    FlipX,
    /// Mirror top/bottom
    FlipY,
    /// 180°
    FlipXY,
    /// Reflect across the top-left to bottom-right diagonal
    TransposeMain,
    /// Reflect across the top-right to bottom-left diagonal
    TransposeAnti,
}

impl Orientation {
    pub const ALL: [Orientation; 8] = [
        Orientation::None,
        Orientation::Cw,
        Orientation::Ccw,
        Orientation::FlipX,
        Orientation::FlipY,
        Orientation::FlipXY,
        Orientation::TransposeMain,
        Orientation::TransposeAnti,
    ];

    /// (transpose, flip x, flip y), applied in that order.
    fn steps(self) -> (bool, bool, bool) {
        match self {
            Orientation::None => (false, false, false),
            Orientation::Cw => (true, true, false),
            Orientation::Ccw => (true, false, true),
            Orientation::FlipX => (false, true, false),
            Orientation::FlipY => (false, false, true),
            Orientation::FlipXY => (false, true, true),
            Orientation::TransposeMain => (true, false, false),
            Orientation::TransposeAnti => (true, true, true),
        }
    }

    pub fn swaps_axes(self) -> bool {
        self.steps().0
    }

    /// Everything except the two quarter turns undoes itself.
    #[cfg(test)]
    pub fn is_involution(self) -> bool {
        !matches!(self, Orientation::Cw | Orientation::Ccw)
    }

    pub fn output_dimensions(self, width: u32, height: u32) -> (u32, u32) {
        if self.swaps_axes() {
            (height, width)
        } else {
            (width, height)
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::None => "none",
            Orientation::Cw => "cw",
            Orientation::Ccw => "ccw",
            Orientation::FlipX => "x",
            Orientation::FlipY => "y",
            Orientation::FlipXY => "xy",
            Orientation::TransposeMain => "diag",
            Orientation::TransposeAnti => "anti",
        }
    }
}

impl FromStr for Orientation {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "none" => Ok(Orientation::None),
            "cw" => Ok(Orientation::Cw),
            "ccw" => Ok(Orientation::Ccw),
            "x" => Ok(Orientation::FlipX),
            "y" => Ok(Orientation::FlipY),
            "xy" => Ok(Orientation::FlipXY),
            "diag" => Ok(Orientation::TransposeMain),
            "anti" => Ok(Orientation::TransposeAnti),
            other => Err(ExtractError::config(format!(
                "unknown rotate \"{}\", expected {}",
                other,
                constants::ROTATE_CHOICES
            ))),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns a new frame with `orientation` applied; the input is left as is.
pub fn apply_to_image(frame: &FrameData, orientation: Orientation) -> Result<FrameData> {
    if orientation == Orientation::None {
        return Ok(frame.clone());
    }

    let (transpose, flip_x, flip_y) = orientation.steps();
    let (out_w, out_h) = orientation.output_dimensions(frame.width, frame.height);
    let (out_w, out_h) = (out_w as usize, out_h as usize);
    let src_stride = frame.row_stride();
    let src = &frame.buffer;

    let mut out = vec![0u8; out_w * out_h * CHANNELS];
    if out.is_empty() {
        return frame.with_buffer(out, out_w as u32, out_h as u32);
    }

    out.par_chunks_mut(out_w * CHANNELS)
        .enumerate()
        .for_each(|(oy, row)| {
            let y1 = if flip_y { out_h - 1 - oy } else { oy };
            for ox in 0..out_w {
                let x1 = if flip_x { out_w - 1 - ox } else { ox };
                let (sx, sy) = if transpose { (y1, x1) } else { (x1, y1) };
                let s = sy * src_stride + sx * CHANNELS;
                let d = ox * CHANNELS;
                row[d..d + CHANNELS].copy_from_slice(&src[s..s + CHANNELS]);
            }
        });

    frame.with_buffer(out, out_w as u32, out_h as u32)
}

/// Calibration matching frames that were downscaled by `scale` and then
/// oriented. See [`Intrinsics::remap`].
pub fn remap_intrinsics(
    intrinsics: &Intrinsics,
    orientation: Orientation,
    width: u32,
    height: u32,
    scale: f64,
) -> Intrinsics {
    intrinsics.remap(orientation, width, height, scale)
}
