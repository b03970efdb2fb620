//! Turns word-timed recognition results into a SubRip (`.srt`) document.
//!
//! Each [`types::SpeechRecognitionResult`] becomes one numbered block whose
//! start is the first word's start offset and whose end is the last word's
//! end offset:
//!
//! ```text
//! 1
//! 00:00:00,000 --> 00:00:00,500
//! hello
//!
//! ```

mod assemble;
mod render;
mod timestamp;

pub use assemble::{assemble, AssembleOptions, MalformedPolicy};
pub use render::{render, SrtBlock, SubtitleError};
pub use timestamp::{
    format_timestamp, Clock, Timestamp, TimestampError, MAX_EPOCH_SECONDS,
    MIN_EPOCH_SECONDS,
};
