pub mod resize;
pub mod sink;
pub mod undistort;

pub use resize::{BoxResizer, Resize};
pub use sink::{FrameSink, ImageSequenceSink, PathTemplate};
pub use undistort::{OpenCvUndistorter, Undistort};
