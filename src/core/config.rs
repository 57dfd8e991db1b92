use clap::Args;
use std::path::PathBuf;

use crate::camera::Orientation;
use crate::core::error::ExtractError;
use crate::core::pipeline::OutputNumbering;
use crate::core::seeker::{FrameRange, TraversalMode};
use crate::processing::PathTemplate;

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Path to input video
    #[arg(short, long)]
    pub input: PathBuf,
    /// Pattern of result path/name, see notes
    #[arg(short, long)]
    pub output: String,
    /// Input frame start
    #[arg(short = 's', long, default_value_t = 0)]
    pub input_start: u64,
    /// Input frame step
    #[arg(short = 'S', long, default_value_t = 1)]
    pub input_step: u64,
    /// Input frame end (inclusive), -1 for the end of video
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    pub input_end: i64,
    /// Result numbering start
    #[arg(long, default_value_t = 0)]
    pub output_start: u64,
    /// Result numbering step
    #[arg(long, default_value_t = 1)]
    pub output_step: u64,
    /// Rate of downscale
    #[arg(short, long, default_value_t = 1)]
    pub downscale: u32,
    /// Rotate (or flip) image, accepts none|cw|ccw|x|y|xy|diag|anti
    #[arg(short, long, default_value = "")]
    pub rotate: String,
    /// Input intrinsic, used for calibration/downscale
    #[arg(short = 'k', long)]
    pub intrinsic_in: Option<PathBuf>,
    /// Output intrinsic, used for downscale, requires --intrinsic-in
    #[arg(short = 'K', long)]
    pub intrinsic_out: Option<PathBuf>,
    /// Correct lens distortion, k1 k2 p1 p2 [k3 [k4 k5 k6]], requires --intrinsic-in
    #[arg(short, long, default_value_t = false)]
    pub undistort: bool,
    /// Frame searching mode for exporting, skip|jump, see notes
    #[arg(long, default_value = "skip")]
    pub mode: String,
    /// Amount of information printed on screen, see notes
    #[arg(short, long, default_value_t = 2)]
    pub verbose: u8,
}

/// Everything the export needs, checked before any video is opened.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub input: PathBuf,
    pub template: PathTemplate,
    pub range: FrameRange,
    pub numbering: OutputNumbering,
    pub downscale: u32,
    pub orientation: Orientation,
    pub intrinsic_in: Option<PathBuf>,
    pub intrinsic_out: Option<PathBuf>,
    pub undistort: bool,
    pub verbose: u8,
}

impl TryFrom<&ExportArgs> for ExportConfig {
    type Error = ExtractError;

    fn try_from(args: &ExportArgs) -> Result<Self, Self::Error> {
        let mode: TraversalMode = args.mode.parse()?;
        let last_index = u64::try_from(args.input_end).ok();
        let range = FrameRange::new(args.input_start, last_index, args.input_step, mode)?;
        let numbering = OutputNumbering::new(args.output_start, args.output_step)?;

        if args.downscale == 0 {
            return Err(ExtractError::config("downscale ratio cannot be smaller than 1."));
        }

        let orientation: Orientation = args.rotate.parse()?;

        if args.intrinsic_in.is_none() {
            if args.intrinsic_out.is_some() {
                return Err(ExtractError::config("--intrinsic-out requires --intrinsic-in"));
            }
            if args.undistort {
                return Err(ExtractError::config("--undistort requires --intrinsic-in"));
            }
        }

        let template = PathTemplate::parse(&args.output)?;

        Ok(Self {
            input: args.input.clone(),
            template,
            range,
            numbering,
            downscale: args.downscale,
            orientation,
            intrinsic_in: args.intrinsic_in.clone(),
            intrinsic_out: args.intrinsic_out.clone(),
            undistort: args.undistort,
            verbose: args.verbose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        export: ExportArgs,
    }

    fn parse(extra: &[&str]) -> ExportArgs {
        let mut argv = vec!["video2seq", "-i", "in.mp4", "-o", "out/%05d.png"];
        argv.extend_from_slice(extra);
        TestCli::try_parse_from(argv).unwrap().export
    }

    fn config_error(extra: &[&str]) -> String {
        match ExportConfig::try_from(&parse(extra)) {
            Err(ExtractError::Configuration(msg)) => msg,
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_defaults() {
        let config = ExportConfig::try_from(&parse(&[])).unwrap();
        assert_eq!(config.range, FrameRange::new(0, None, 1, TraversalMode::SequentialSkip).unwrap());
        assert_eq!(config.numbering, OutputNumbering { start: 0, step: 1 });
        assert_eq!(config.downscale, 1);
        assert_eq!(config.orientation, Orientation::None);
        assert!(!config.undistort);
        assert_eq!(config.verbose, 2);
        assert_eq!(config.template.render(3), PathBuf::from("out/00003.png"));
    }

    #[test]
    fn test_full_option_set() {
        let args = parse(&[
            "-s", "10", "-S", "5", "--input-end", "90", "--output-start", "1", "--output-step", "2",
            "-d", "2", "-r", "cw", "-k", "k.txt", "-K", "k_out.txt", "-u", "--mode", "jump", "-v", "0",
        ]);
        let config = ExportConfig::try_from(&args).unwrap();
        assert_eq!(config.range, FrameRange::new(10, Some(90), 5, TraversalMode::RandomJump).unwrap());
        assert_eq!(config.numbering, OutputNumbering { start: 1, step: 2 });
        assert_eq!(config.downscale, 2);
        assert_eq!(config.orientation, Orientation::Cw);
        assert_eq!(config.intrinsic_in, Some(PathBuf::from("k.txt")));
        assert_eq!(config.intrinsic_out, Some(PathBuf::from("k_out.txt")));
        assert!(config.undistort);
        assert_eq!(config.verbose, 0);
    }

    #[test]
    fn test_negative_end_means_whole_video() {
        let config = ExportConfig::try_from(&parse(&["--input-end", "-1"])).unwrap();
        assert_eq!(config.range.last_index, None);
    }

    #[test]
    fn test_configuration_errors() {
        assert!(config_error(&["-S", "0"]).contains("input-step"));
        assert!(config_error(&["--output-step", "0"]).contains("output-step"));
        assert!(config_error(&["-d", "0"]).contains("downscale"));
        assert!(config_error(&["--mode", "fast"]).contains("unknown mode"));
        assert!(config_error(&["-r", "upside"]).contains("unknown rotate"));
        assert!(config_error(&["-K", "k_out.txt"]).contains("--intrinsic-out requires"));
        assert!(config_error(&["-u"]).contains("--undistort requires"));
    }

    #[test]
    fn test_bad_output_pattern() {
        let mut args = parse(&[]);
        args.output = "out/frame.png".to_string();
        assert!(matches!(ExportConfig::try_from(&args), Err(ExtractError::Configuration(_))));
    }
}
