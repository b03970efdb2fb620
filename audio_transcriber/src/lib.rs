//! Transcribes an audio object in cloud storage with a long-running speech
//! recognition job and writes the word-timed results as a SubRip file.

mod config;
mod transcriber;

pub use config::{Config, RecognitionSettings};
pub use transcriber::{Transcriber, TranscriberError};
