//! Serde models for the Cloud Speech-to-Text v1 and Cloud Storage JSON
//! APIs, as far as this workspace uses them.
//!
//! ```rust
//! let word: types::WordInfo = serde_json::from_str(
//!     r#"{"startTime": "1s", "endTime": "1.400s", "word": "world"}"#,
//! ).unwrap();
//! assert_eq!(word.end_time.nanos, 400_000_000);
//! ```

mod duration;
mod types;

pub use duration::{Duration, DurationParseError, MAX_SECONDS};
pub use types::*;
