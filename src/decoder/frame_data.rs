use anyhow::{ensure, Result};
use std::time::Duration;

/// Bytes per pixel of every frame moving through the exporter (packed BGR24).
pub const CHANNELS: usize = 3;

/// Owned, tightly packed BGR24 frame
#[derive(Clone, Debug, PartialEq)]
pub struct FrameData {
    pub buffer: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp: Duration,
}

impl FrameData {
    pub fn new(buffer: Vec<u8>, width: u32, height: u32, timestamp: Duration) -> Result<Self> {
        ensure!(
            buffer.len() == width as usize * height as usize * CHANNELS,
            "frame buffer holds {} bytes, expected {}x{}x{}",
            buffer.len(),
            width,
            height,
            CHANNELS
        );
        Ok(Self { buffer, width, height, timestamp })
    }

    /// Same timestamp, new pixels. Used by the processing stages.
    pub fn with_buffer(&self, buffer: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        Self::new(buffer, width, height, self.timestamp)
    }

    pub fn row_stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let offset = y as usize * self.row_stride() + x as usize * CHANNELS;
        &self.buffer[offset..offset + CHANNELS]
    }
}
