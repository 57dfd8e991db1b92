pub mod config;
pub mod error;
pub mod pipeline;
pub mod seeker;

pub use config::{ExportArgs, ExportConfig};
pub use error::ExtractError;
pub use pipeline::{ExportPipeline, ExportSettings, ExportSummary, OutputNumbering};
pub use seeker::{FrameRange, FrameSeeker, TraversalMode};
