use anyhow::Result;
use serde::Serialize;

use super::frame_data::FrameData;

/// Stream properties a source reports once it is open
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SourceInfo {
    pub width: u32,
    pub height: u32,
    pub frame_count: u64,
    pub fps: f64,
}

/// A decoder with a single mutable cursor over a video's frames.
///
/// `read_next` and `skip_next` move the cursor forward by exactly one frame.
/// `seek` repositions it; implementations may land near rather than on the
/// requested index, which is why the seeker only seeks in jump mode.
pub trait FrameSource {
    fn info(&self) -> SourceInfo;

    /// Decodes the frame under the cursor. `None` means the stream had no more data.
    fn read_next(&mut self) -> Result<Option<FrameData>>;

    /// Advances past one frame without handing its pixels out.
    /// Returns `false` when the stream had no more data.
    fn skip_next(&mut self) -> Result<bool> {
        Ok(self.read_next()?.is_some())
    }

    fn seek(&mut self, index: u64) -> Result<()>;
}
