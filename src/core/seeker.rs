use anyhow::Result;
use std::fmt;
use std::iter::FusedIterator;
use std::str::FromStr;

use crate::core::error::ExtractError;
use crate::decoder::{FrameData, FrameSource};
use crate::shared::constants;
use crate::utils::logger;

/// How the seeker moves the decoder between wanted frames
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TraversalMode {
    /// Decode every frame and drop the unwanted ones. Never seeks.
    #[default]
    SequentialSkip,
    /// Seek straight to each wanted frame, then decode it.
    RandomJump,
}

impl FromStr for TraversalMode {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skip" => Ok(TraversalMode::SequentialSkip),
            "jump" => Ok(TraversalMode::RandomJump),
            other => Err(ExtractError::config(format!(
                "unknown mode \"{}\", expected {}",
                other,
                constants::MODE_CHOICES
            ))),
        }
    }
}

impl fmt::Display for TraversalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TraversalMode::SequentialSkip => "skip",
            TraversalMode::RandomJump => "jump",
        })
    }
}

/// Requested frame selection, before it is clamped to a source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameRange {
    pub first_index: u64,
    /// Inclusive. `None` runs to the end of the video.
    pub last_index: Option<u64>,
    pub step: u64,
    pub mode: TraversalMode,
}

impl FrameRange {
    pub fn new(
        first_index: u64,
        last_index: Option<u64>,
        step: u64,
        mode: TraversalMode,
    ) -> Result<Self, ExtractError> {
        if step == 0 {
            return Err(ExtractError::config("input-step cannot be smaller than 1."));
        }
        Ok(Self { first_index, last_index, step, mode })
    }

    /// Last index actually reachable in a source of `frame_count` frames.
    pub fn clamped_last(&self, frame_count: u64) -> Option<u64> {
        let last_available = frame_count.checked_sub(1)?;
        Some(match self.last_index {
            Some(end) => end.min(last_available),
            None => last_available,
        })
    }
}

/// Number of indices `first, first + step, ...` that do not pass `last`.
pub fn frames_in_range(first: u64, last: Option<u64>, step: u64) -> u64 {
    match last {
        Some(last) if first <= last => (last - first) / step + 1,
        _ => 0,
    }
}

/// Pull-based walk over the frames of one source.
///
/// The seeker owns the source for its whole lifetime; dropping the seeker
/// drops (and so releases) the decoder.
pub struct FrameSeeker<S: FrameSource> {
    source: S,
    mode: TraversalMode,
    step: u64,
    last_index: Option<u64>,
    // index of the frame the source's next decode returns
    position: u64,
    // None once stepping past the last target would overflow
    next_target: Option<u64>,
}

impl<S: FrameSource> FrameSeeker<S> {
    pub fn new(source: S, range: FrameRange) -> Self {
        let frame_count = source.info().frame_count;
        let last_index = range.clamped_last(frame_count);

        logger::debug(&format!(
            "Seeker: first={} last={:?} (requested {:?}, source has {}) step={} mode={}",
            range.first_index, last_index, range.last_index, frame_count, range.step, range.mode
        ));

        Self {
            source,
            mode: range.mode,
            step: range.step,
            last_index,
            position: 0,
            next_target: Some(range.first_index),
        }
    }

    pub fn has_next(&self) -> bool {
        matches!((self.next_target, self.last_index), (Some(next), Some(last)) if next <= last)
    }

    pub fn frames_remaining(&self) -> u64 {
        match self.next_target {
            Some(next) => frames_in_range(next, self.last_index, self.step),
            None => 0,
        }
    }

    pub fn last_index(&self) -> Option<u64> {
        self.last_index
    }

    #[cfg(test)]
    pub fn into_source(self) -> S {
        self.source
    }

    /// Decodes the next wanted frame and hands it over together with its
    /// source index.
    ///
    /// The target is consumed whether or not decoding succeeds: after a
    /// `DecodeFailure` the next call moves on to the following target, so a
    /// caller may skip the failed frame or stop.
    pub fn produce_next(&mut self) -> Result<(u64, FrameData)> {
        let target = match self.next_target {
            Some(target) if self.has_next() => target,
            _ => return Err(ExtractError::Exhausted.into()),
        };
        self.next_target = target.checked_add(self.step);

        let frame = match self.mode {
            TraversalMode::SequentialSkip => self.decode_forward_to(target)?,
            TraversalMode::RandomJump => self.jump_to(target)?,
        };
        Ok((target, frame))
    }

    fn decode_forward_to(&mut self, target: u64) -> Result<FrameData> {
        while self.position < target {
            let index = self.position;
            if !self.source.skip_next()? {
                return Err(ExtractError::DecodeFailure { index }.into());
            }
            self.position += 1;
        }
        self.decode_one(target)
    }

    fn jump_to(&mut self, target: u64) -> Result<FrameData> {
        self.source.seek(target)?;
        self.position = target;
        self.decode_one(target)
    }

    fn decode_one(&mut self, index: u64) -> Result<FrameData> {
        let frame = self.source.read_next()?;
        self.position += 1;
        frame.ok_or_else(|| ExtractError::DecodeFailure { index }.into())
    }
}

impl<S: FrameSource> Iterator for FrameSeeker<S> {
    type Item = Result<(u64, FrameData)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_next() {
            Some(self.produce_next())
        } else {
            None
        }
    }
}

impl<S: FrameSource> FusedIterator for FrameSeeker<S> {}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::decoder::SourceInfo;
    use std::time::Duration;

    /// In-memory source with exact seeking. Each frame is 1x1 and its
    /// blue/green bytes spell the frame index.
    pub(crate) struct SyntheticSource {
        pub frame_count: u64,
        pub cursor: u64,
        pub decodes: u64,
        pub skips: u64,
        pub seeks: Vec<u64>,
        /// Frames at or after this index come back empty.
        pub fail_from: Option<u64>,
    }

    impl SyntheticSource {
        pub(crate) fn new(frame_count: u64) -> Self {
            Self { frame_count, cursor: 0, decodes: 0, skips: 0, seeks: Vec::new(), fail_from: None }
        }

        pub(crate) fn index_of(frame: &FrameData) -> u64 {
            u16::from_le_bytes([frame.buffer[0], frame.buffer[1]]) as u64
        }

        fn available(&self) -> bool {
            self.cursor < self.frame_count && self.fail_from.map_or(true, |f| self.cursor < f)
        }
    }

    impl FrameSource for SyntheticSource {
        fn info(&self) -> SourceInfo {
            SourceInfo { width: 1, height: 1, frame_count: self.frame_count, fps: 25.0 }
        }

        fn read_next(&mut self) -> Result<Option<FrameData>> {
            self.decodes += 1;
            if !self.available() {
                return Ok(None);
            }
            let [lo, hi] = (self.cursor as u16).to_le_bytes();
            let frame = FrameData::new(
                vec![lo, hi, 0],
                1,
                1,
                Duration::from_millis(self.cursor * 40),
            )?;
            self.cursor += 1;
            Ok(Some(frame))
        }

        fn skip_next(&mut self) -> Result<bool> {
            self.skips += 1;
            if !self.available() {
                return Ok(false);
            }
            self.cursor += 1;
            Ok(true)
        }

        fn seek(&mut self, index: u64) -> Result<()> {
            self.seeks.push(index);
            self.cursor = index;
            Ok(())
        }
    }

    fn collect(seeker: FrameSeeker<SyntheticSource>) -> Vec<u64> {
        seeker
            .map(|item| {
                let (index, frame) = item.unwrap();
                assert_eq!(SyntheticSource::index_of(&frame), index);
                index
            })
            .collect()
    }

    fn range(first: u64, last: Option<u64>, step: u64, mode: TraversalMode) -> FrameRange {
        FrameRange::new(first, last, step, mode).unwrap()
    }

    #[test]
    fn test_stepped_range_both_modes() {
        for mode in [TraversalMode::SequentialSkip, TraversalMode::RandomJump] {
            let seeker = FrameSeeker::new(SyntheticSource::new(100), range(0, Some(9), 3, mode));
            assert_eq!(seeker.frames_remaining(), 4);
            assert_eq!(collect(seeker), vec![0, 3, 6, 9]);
        }
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let mut seeker = FrameSeeker::new(
            SyntheticSource::new(100),
            range(5, Some(2), 1, TraversalMode::SequentialSkip),
        );
        assert!(!seeker.has_next());
        assert_eq!(seeker.frames_remaining(), 0);
        let err = seeker.produce_next().unwrap_err();
        assert!(matches!(err.downcast_ref::<ExtractError>(), Some(ExtractError::Exhausted)));
    }

    #[test]
    fn test_empty_source_is_empty_range() {
        let seeker = FrameSeeker::new(SyntheticSource::new(0), range(0, None, 1, TraversalMode::RandomJump));
        assert_eq!(seeker.last_index(), None);
        assert!(!seeker.has_next());
    }

    #[test]
    fn test_end_is_clamped_to_source() {
        let seeker = FrameSeeker::new(
            SyntheticSource::new(10),
            range(4, Some(1000), 2, TraversalMode::SequentialSkip),
        );
        assert_eq!(seeker.last_index(), Some(9));
        assert_eq!(collect(seeker), vec![4, 6, 8]);

        let open_ended = FrameSeeker::new(SyntheticSource::new(10), range(7, None, 1, TraversalMode::RandomJump));
        assert_eq!(collect(open_ended), vec![7, 8, 9]);
    }

    #[test]
    fn test_frame_count_formula_and_mode_agreement() {
        for count in [1u64, 2, 9, 17] {
            for first in 0..count + 2 {
                for last in [None, Some(0), Some(first), Some(first + 5), Some(count + 3)] {
                    for step in 1..5 {
                        let skip = FrameSeeker::new(
                            SyntheticSource::new(count),
                            range(first, last, step, TraversalMode::SequentialSkip),
                        );
                        let jump = FrameSeeker::new(
                            SyntheticSource::new(count),
                            range(first, last, step, TraversalMode::RandomJump),
                        );
                        let expected = frames_in_range(first, skip.last_index(), step);
                        let skip_indices = collect(skip);
                        let jump_indices = collect(jump);
                        assert_eq!(skip_indices.len() as u64, expected);
                        assert_eq!(skip_indices, jump_indices);
                    }
                }
            }
        }
    }

    #[test]
    fn test_skip_mode_never_seeks_and_decodes_each_frame_once() {
        let mut seeker = FrameSeeker::new(
            SyntheticSource::new(50),
            range(0, Some(20), 5, TraversalMode::SequentialSkip),
        );
        while seeker.has_next() {
            seeker.produce_next().unwrap();
        }
        let source = seeker.into_source();
        assert!(source.seeks.is_empty());
        assert_eq!(source.decodes + source.skips, 21);
        assert_eq!(source.decodes, 5);
    }

    #[test]
    fn test_jump_mode_seeks_once_per_frame() {
        let mut seeker = FrameSeeker::new(
            SyntheticSource::new(1000),
            range(100, Some(900), 400, TraversalMode::RandomJump),
        );
        while seeker.has_next() {
            seeker.produce_next().unwrap();
        }
        let source = seeker.into_source();
        assert_eq!(source.seeks, vec![100, 500, 900]);
        assert_eq!(source.decodes, 3);
        assert_eq!(source.skips, 0);
    }

    #[test]
    fn test_missing_data_is_decode_failure() {
        for mode in [TraversalMode::SequentialSkip, TraversalMode::RandomJump] {
            let mut source = SyntheticSource::new(30);
            source.fail_from = Some(12);
            let mut seeker = FrameSeeker::new(source, range(0, None, 5, mode));

            assert_eq!(seeker.produce_next().unwrap().0, 0);
            assert_eq!(seeker.produce_next().unwrap().0, 5);
            assert_eq!(seeker.produce_next().unwrap().0, 10);
            let err = seeker.produce_next().unwrap_err();
            match err.downcast_ref::<ExtractError>() {
                Some(ExtractError::DecodeFailure { index }) => assert!(*index >= 12 && *index <= 15),
                other => panic!("unexpected error {:?}", other),
            }
        }
    }

    #[test]
    fn test_pulling_after_decode_failure_moves_on() {
        let mut source = SyntheticSource::new(30);
        source.fail_from = Some(12);
        let mut seeker = FrameSeeker::new(source, range(0, None, 5, TraversalMode::RandomJump));

        let mut decoded = Vec::new();
        let mut failed = Vec::new();
        for item in seeker.by_ref().take(50) {
            match item {
                Ok((index, _)) => decoded.push(index),
                Err(e) => match e.downcast_ref::<ExtractError>() {
                    Some(ExtractError::DecodeFailure { index }) => failed.push(*index),
                    other => panic!("unexpected error {:?}", other),
                },
            }
        }
        assert_eq!(decoded, vec![0, 5, 10]);
        assert_eq!(failed, vec![15, 20, 25]);
        assert!(!seeker.has_next());
        assert!(seeker.next().is_none());
    }

    #[test]
    fn test_skip_mode_ends_after_stream_runs_dry() {
        let mut source = SyntheticSource::new(30);
        source.fail_from = Some(12);
        let seeker = FrameSeeker::new(source, range(0, None, 5, TraversalMode::SequentialSkip));
        let ok: Vec<u64> = seeker.filter_map(|item| item.ok()).map(|(index, _)| index).collect();
        assert_eq!(ok, vec![0, 5, 10]);
    }

    #[test]
    fn test_huge_step_stops_instead_of_wrapping() {
        for mode in [TraversalMode::SequentialSkip, TraversalMode::RandomJump] {
            let mut seeker = FrameSeeker::new(SyntheticSource::new(10), range(1, None, u64::MAX, mode));
            assert_eq!(seeker.frames_remaining(), 1);
            assert_eq!(seeker.produce_next().unwrap().0, 1);
            assert!(!seeker.has_next());
            assert_eq!(seeker.frames_remaining(), 0);
            let err = seeker.produce_next().unwrap_err();
            assert!(matches!(err.downcast_ref::<ExtractError>(), Some(ExtractError::Exhausted)));
        }
    }

    #[test]
    fn test_zero_step_rejected_and_modes_parse() {
        assert!(matches!(
            FrameRange::new(0, None, 0, TraversalMode::SequentialSkip),
            Err(ExtractError::Configuration(_))
        ));
        assert_eq!("skip".parse::<TraversalMode>().unwrap(), TraversalMode::SequentialSkip);
        assert_eq!("jump".parse::<TraversalMode>().unwrap(), TraversalMode::RandomJump);
        assert!("leap".parse::<TraversalMode>().is_err());
    }
}
