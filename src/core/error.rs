use std::path::PathBuf;

/// Failures the export can report before or while frames are produced.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error("{0}")]
    Configuration(String),
    #[error("cannot open \"{}\"", path.display())]
    SourceOpen { path: PathBuf },
    #[error("calibration: {0}")]
    Calibration(String),
    #[error("frame range exhausted")]
    Exhausted,
    #[error("decoder returned no data for frame {index}")]
    DecodeFailure { index: u64 },
}

impl ExtractError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
