use anyhow::{anyhow, bail, Context, Result};
use opencv::{core::Vector, imgcodecs};
use std::path::PathBuf;

use crate::core::error::ExtractError;
use crate::decoder::mat::frame_to_mat;
use crate::decoder::FrameData;
use crate::utils::{file_utils, logger};

/// Receives every exported frame with its sequence number.
pub trait FrameSink {
    fn deliver(&mut self, sequence: u64, frame: FrameData) -> Result<()>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Piece {
    Text(String),
    Number { width: usize, zero_pad: bool },
}

/// printf-style output pattern with exactly one decimal field, e.g.
/// `shots/img_%05d.jpg`. `%%` is a literal percent sign.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathTemplate {
    pattern: String,
    pieces: Vec<Piece>,
}

impl PathTemplate {
    pub fn parse(pattern: &str) -> Result<Self, ExtractError> {
        let bad = |why: &str| {
            ExtractError::config(format!("output pattern \"{}\": {}", pattern, why))
        };

        let mut pieces = Vec::new();
        let mut text = String::new();
        let mut fields = 0;
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                text.push(c);
                continue;
            }
            if chars.peek() == Some(&'%') {
                chars.next();
                text.push('%');
                continue;
            }

            let zero_pad = chars.peek() == Some(&'0');
            if zero_pad {
                chars.next();
            }
            let mut digits = String::new();
            while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                digits.push(d);
                chars.next();
            }
            match chars.next() {
                Some('d') | Some('i') | Some('u') => {}
                Some(other) => return Err(bad(&format!("unsupported conversion '%{}'", other))),
                None => return Err(bad("dangling '%' at the end")),
            }
            let width = if digits.is_empty() {
                0
            } else {
                digits.parse().map_err(|_| bad("field width too large"))?
            };

            if !text.is_empty() {
                pieces.push(Piece::Text(std::mem::take(&mut text)));
            }
            pieces.push(Piece::Number { width, zero_pad });
            fields += 1;
        }
        if !text.is_empty() {
            pieces.push(Piece::Text(text));
        }

        match fields {
            1 => Ok(Self { pattern: pattern.to_string(), pieces }),
            0 => Err(bad("needs one decimal field such as %d or %05d")),
            _ => Err(bad("only ONE decimal field is allowed")),
        }
    }

    pub fn render(&self, sequence: u64) -> PathBuf {
        let mut out = String::with_capacity(self.pattern.len() + 8);
        for piece in &self.pieces {
            match piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Number { width, zero_pad: true } => {
                    out.push_str(&format!("{:0width$}", sequence, width = *width))
                }
                Piece::Number { width, zero_pad: false } => {
                    out.push_str(&format!("{:>width$}", sequence, width = *width))
                }
            }
        }
        PathBuf::from(out)
    }
}

/// Writes each frame to the file the template names for its sequence
/// number. The file extension selects the image codec.
pub struct ImageSequenceSink {
    template: PathTemplate,
    params: Vector<i32>,
    written: u64,
}

impl ImageSequenceSink {
    pub fn new(template: PathTemplate) -> Self {
        Self {
            template,
            params: Vector::new(),
            written: 0,
        }
    }

    pub fn written(&self) -> u64 {
        self.written
    }
}

impl FrameSink for ImageSequenceSink {
    fn deliver(&mut self, sequence: u64, frame: FrameData) -> Result<()> {
        let path = self.template.render(sequence);
        file_utils::ensure_parent_dir(&path)?;

        let path_str = path
            .to_str()
            .ok_or_else(|| anyhow!("output path is not valid UTF-8: {:?}", path))?;
        let mat = frame_to_mat(&frame)?;

        let ok = imgcodecs::imwrite(path_str, &mat, &self.params)
            .with_context(|| format!("Failed to write image {:?}", path))?;
        if !ok {
            logger::error(&format!("imwrite refused {:?}", path));
            bail!("no image encoder accepted {:?}; check the file extension", path);
        }

        self.written += 1;
        logger::debug(&format!("Wrote #{} -> {:?}", sequence, path));
        Ok(())
    }
}
