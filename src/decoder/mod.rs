pub mod frame_data;
pub mod mat;
pub mod source;
pub mod video;

pub use frame_data::FrameData;
pub use source::{FrameSource, SourceInfo};
pub use video::VideoDecoder;
