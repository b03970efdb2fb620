use thiserror::Error;
use types::{Duration, SpeechRecognitionResult};

use crate::timestamp::{Clock, Timestamp, TimestampError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubtitleError {
    #[error("Recognition result for block {index} has no alternatives")]
    MalformedResult { index: usize },
    #[error("Block {index} has no word timing to format")]
    MissingTiming { index: usize },
    #[error("Block {index} has an unformattable timestamp: {source}")]
    Timestamp {
        index: usize,
        #[source]
        source: TimestampError,
    },
}

impl SubtitleError {
    /// Whether the error stems from the shape of a recognition result
    /// rather than from the values in it.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::MalformedResult { .. } | Self::MissingTiming { .. }
        )
    }
}

/// One numbered subtitle cue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrtBlock {
    pub index: usize,
    pub start: Option<Duration>,
    pub end: Option<Duration>,
    pub text: String,
}

impl SrtBlock {
    /// Serializes the block, blank line included.
    ///
    /// # Errors
    /// `MissingTiming` if the block was rendered from a result without
    /// words, `Timestamp` if an offset cannot be formatted.
    pub fn to_srt(&self, clock: Clock) -> Result<String, SubtitleError> {
        let (Some(start), Some(end)) = (&self.start, &self.end) else {
            return Err(SubtitleError::MissingTiming { index: self.index });
        };

        let format = |duration: &Duration| {
            Timestamp::from_duration(duration, clock)
                .map(|timestamp| timestamp.to_srt())
                .map_err(|source| SubtitleError::Timestamp {
                    index: self.index,
                    source,
                })
        };

        Ok(format!(
            "{}\n{} --> {}\n{}\n\n",
            self.index,
            format(start)?,
            format(end)?,
            self.text
        ))
    }
}

/// Builds the block for one recognition result from its most likely
/// alternative. The cue spans from the first word's start to the last
/// word's end.
///
/// # Errors
/// `MalformedResult` if the result carries no alternatives.
pub fn render(
    result: &SpeechRecognitionResult,
    index: usize,
) -> Result<SrtBlock, SubtitleError> {
    let most_likely = result
        .alternatives
        .first()
        .ok_or(SubtitleError::MalformedResult { index })?;

    Ok(SrtBlock {
        index,
        start: most_likely.words.first().map(|word| word.start_time),
        end: most_likely.words.last().map(|word| word.end_time),
        text: most_likely.transcript.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{SpeechRecognitionAlternative, WordInfo};

    fn word(text: &str, start_ms: i64, end_ms: i64) -> WordInfo {
        WordInfo {
            start_time: Duration::from_millis(start_ms),
            end_time: Duration::from_millis(end_ms),
            word: text.to_string(),
            confidence: None,
            speaker_tag: None,
        }
    }

    fn recognized(
        alternatives: Vec<SpeechRecognitionAlternative>,
    ) -> SpeechRecognitionResult {
        SpeechRecognitionResult {
            alternatives,
            ..Default::default()
        }
    }

    #[test]
    fn test_render_spans_first_to_last_word() {
        let result = recognized(vec![SpeechRecognitionAlternative {
            transcript: "  in the beginning ".to_string(),
            confidence: 0.9,
            words: vec![
                word("in", 1200, 1300),
                word("the", 1300, 1450),
                word("beginning", 1450, 2100),
            ],
        }]);

        let block = render(&result, 3).unwrap();

        assert_eq!(block.index, 3);
        assert_eq!(block.start, Some(Duration::new(1, 200_000_000)));
        assert_eq!(block.end, Some(Duration::new(2, 100_000_000)));
        assert_eq!(block.text, "in the beginning");
    }

    #[test]
    fn test_render_uses_most_likely_alternative() {
        let result = recognized(vec![
            SpeechRecognitionAlternative {
                transcript: "word".to_string(),
                confidence: 0.8,
                words: vec![word("word", 0, 400)],
            },
            SpeechRecognitionAlternative {
                transcript: "world".to_string(),
                confidence: 0.1,
                words: vec![word("world", 100, 900)],
            },
        ]);

        let block = render(&result, 1).unwrap();

        assert_eq!(block.text, "word");
        assert_eq!(block.end, Some(Duration::from_millis(400)));
    }

    #[test]
    fn test_render_without_alternatives_is_malformed() {
        assert_eq!(
            render(&recognized(vec![]), 2),
            Err(SubtitleError::MalformedResult { index: 2 })
        );
    }

    #[test]
    fn test_block_without_words_cannot_be_serialized() {
        let result = recognized(vec![SpeechRecognitionAlternative {
            transcript: "silence".to_string(),
            ..Default::default()
        }]);

        let block = render(&result, 1).unwrap();

        assert_eq!(block.start, None);
        assert_eq!(block.end, None);
        assert_eq!(
            block.to_srt(Clock::Elapsed),
            Err(SubtitleError::MissingTiming { index: 1 })
        );
    }

    #[test]
    fn test_block_serialization() {
        let block = SrtBlock {
            index: 7,
            start: Some(Duration::from_millis(61_000)),
            end: Some(Duration::from_millis(63_250)),
            text: "Amen".to_string(),
        };

        assert_eq!(
            block.to_srt(Clock::Elapsed).unwrap(),
            "7\n00:01:01,000 --> 00:01:03,250\nAmen\n\n"
        );
    }

    #[test]
    fn test_block_with_out_of_range_offset() {
        let block = SrtBlock {
            index: 4,
            start: Some(Duration::new(0, 0)),
            end: Some(Duration::new(253_402_300_800, 0)),
            text: "late".to_string(),
        };

        assert_eq!(
            block.to_srt(Clock::TimeOfDay),
            Err(SubtitleError::Timestamp {
                index: 4,
                source: TimestampError::TooLarge(253_402_300_800),
            })
        );
    }
}
