use anyhow::{ensure, Result};
use fast_image_resize as fr;
use fr::images::Image;

use crate::decoder::FrameData;

pub trait Resize {
    fn resize(&mut self, frame: &FrameData, width: u32, height: u32) -> Result<FrameData>;
}

/// SIMD resizer with a box filter, which averages source pixels the way
/// area interpolation does when shrinking.
pub struct BoxResizer {
    resizer: fr::Resizer,
    options: fr::ResizeOptions,
}

impl BoxResizer {
    pub fn new() -> Self {
        Self {
            resizer: fr::Resizer::new(),
            options: fr::ResizeOptions::new()
                .resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::Box)),
        }
    }
}

impl Default for BoxResizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Resize for BoxResizer {
    fn resize(&mut self, frame: &FrameData, width: u32, height: u32) -> Result<FrameData> {
        ensure!(width > 0 && height > 0, "cannot resize to {}x{}", width, height);
        if (width, height) == (frame.width, frame.height) {
            return Ok(frame.clone());
        }

        // channel order does not matter to the filter, so BGR goes through as U8x3
        let src_image = Image::from_vec_u8(
            frame.width,
            frame.height,
            frame.buffer.clone(),
            fr::PixelType::U8x3,
        )?;
        let mut dst_image = Image::new(width, height, fr::PixelType::U8x3);

        self.resizer.resize(&src_image, &mut dst_image, &self.options)?;

        frame.with_buffer(dst_image.buffer().to_vec(), width, height)
    }
}

/// Integer downscale, never collapsing an axis to zero.
pub fn downscaled_dimensions(width: u32, height: u32, scale: u32) -> (u32, u32) {
    let scale = scale.max(1);
    ((width / scale).max(1), (height / scale).max(1))
}
