pub const APP_NAME: &str = "video2seq";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const ERROR_LOG_FILE: &str = "video2seq-error.log";
pub const DEBUG_LOG_FILE: &str = "video2seq-debug.log";

/// Calibration text files carry at most fx fy cx cy followed by eight distortion terms.
pub const INTRINSIC_FIELDS_MAX: usize = 12;
pub const INTRINSIC_FIELDS_REQUIRED: usize = 4;

pub const ROTATE_CHOICES: &str = "none|cw|ccw|x|y|xy|diag|anti";
pub const MODE_CHOICES: &str = "skip|jump";

pub const VERBOSE_BANNER: u8 = 1;
pub const VERBOSE_PROGRESS: u8 = 2;

pub const OUTPUT_NOTES: &str = "Notes:
  --output: a printf-style pattern with exactly ONE decimal field (%d, %5d or %05d) that receives the sequence number, e.g. frames/%05d.png. Use %% for a literal percent sign.
  --mode: skip reads every frame and drops the unwanted ones (good for a small --input-step); jump seeks to each wanted frame (good for a large --input-step, may be imprecise on some codecs).
  --verbose: 0 for silent output, 1 for the banner and video info, 2 (and larger) for live progress.";
