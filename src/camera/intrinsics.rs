use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use super::orientation::Orientation;
use crate::core::error::ExtractError;
use crate::shared::constants;
use crate::utils::file_utils;

/// Pinhole calibration: focal lengths and principal point in pixels, plus the
/// rational/tangential distortion terms in OpenCV order.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Intrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
    pub k1: f64,
    pub k2: f64,
    pub p1: f64,
    pub p2: f64,
    pub k3: f64,
    pub k4: f64,
    pub k5: f64,
    pub k6: f64,
}

impl Intrinsics {
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self {
            fx,
            fy,
            cx,
            cy,
            k1: 0.0,
            k2: 0.0,
            p1: 0.0,
            p2: 0.0,
            k3: 0.0,
            k4: 0.0,
            k5: 0.0,
            k6: 0.0,
        }
    }

    /// Guess for an uncalibrated camera: focal length equal to the frame
    /// height, principal point at the image centre, no distortion.
    pub fn uncalibrated(width: u32, height: u32) -> Self {
        let h = height as f64;
        Self::new(h, h, width as f64 * 0.5, h * 0.5)
    }

    /// Distortion vector as `calib3d::undistort` expects it.
    pub fn distortion(&self) -> [f64; 8] {
        [self.k1, self.k2, self.p1, self.p2, self.k3, self.k4, self.k5, self.k6]
    }

    pub fn has_distortion(&self) -> bool {
        self.distortion().iter().any(|&k| k != 0.0)
    }

    /// Row-major 3x3 camera matrix.
    pub fn camera_matrix(&self) -> [[f64; 3]; 3] {
        [
            [self.fx, 0.0, self.cx],
            [0.0, self.fy, self.cy],
            [0.0, 0.0, 1.0],
        ]
    }

    /// Parses `fx fy cx cy [k1 k2 p1 p2 k3 k4 k5 k6]`; missing distortion terms are zero.
    pub fn parse(text: &str) -> Result<Self, ExtractError> {
        let values = text
            .split_whitespace()
            .map(|token| {
                token
                    .parse::<f64>()
                    .map_err(|_| ExtractError::Calibration(format!("not a number: \"{}\"", token)))
            })
            .collect::<Result<Vec<f64>, _>>()?;

        if values.len() < constants::INTRINSIC_FIELDS_REQUIRED {
            return Err(ExtractError::Calibration(format!(
                "expected at least {} values (fx fy cx cy), found {}",
                constants::INTRINSIC_FIELDS_REQUIRED,
                values.len()
            )));
        }
        if values.len() > constants::INTRINSIC_FIELDS_MAX {
            return Err(ExtractError::Calibration(format!(
                "expected at most {} values, found {}",
                constants::INTRINSIC_FIELDS_MAX,
                values.len()
            )));
        }

        let mut fields = [0.0f64; constants::INTRINSIC_FIELDS_MAX];
        fields[..values.len()].copy_from_slice(&values);
        let [fx, fy, cx, cy, k1, k2, p1, p2, k3, k4, k5, k6] = fields;

        if !(fx > 0.0 && fy > 0.0) {
            return Err(ExtractError::Calibration(format!(
                "focal lengths must be positive, got fx={} fy={}",
                fx, fy
            )));
        }

        Ok(Self { fx, fy, cx, cy, k1, k2, p1, p2, k3, k4, k5, k6 })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = file_utils::read_text(path)?;
        Ok(Self::parse(&text)?)
    }

    /// Output form: the four projection terms only, `%f`-style.
    pub fn to_projection_line(&self) -> String {
        format!("{:.6} {:.6} {:.6} {:.6}", self.fx, self.fy, self.cx, self.cy)
    }

    pub fn save_projection(&self, path: &Path) -> Result<()> {
        file_utils::write_text(path, &self.to_projection_line())
    }

    /// Calibration of the frames written after downscaling by `scale` and
    /// then applying `orientation`. `width`/`height` are the source frame
    /// size before scaling. Distortion terms are carried over unchanged.
    pub fn remap(&self, orientation: Orientation, width: u32, height: u32, scale: f64) -> Self {
        let w = width as f64;
        let h = height as f64;
        let (fx, fy, cx, cy) = (self.fx, self.fy, self.cx, self.cy);

        let (fx, fy, cx, cy) = match orientation {
            Orientation::None => (fx, fy, cx, cy),
            Orientation::Cw => (fy, fx, h - cy, cx),
            Orientation::Ccw => (fy, fx, cy, w - cx),
            Orientation::FlipX => (fx, fy, w - cx, cy),
            Orientation::FlipY => (fx, fy, cx, h - cy),
            Orientation::FlipXY => (fx, fy, w - cx, h - cy),
            Orientation::TransposeMain => (fy, fx, cy, cx),
            Orientation::TransposeAnti => (fy, fx, h - cy, w - cx),
        };

        Self {
            fx: fx / scale,
            fy: fy / scale,
            cx: cx / scale,
            cy: cy / scale,
            ..*self
        }
    }
}
