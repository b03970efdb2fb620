use types::SpeechRecognitionResult;

use crate::render::{render, SubtitleError};
use crate::timestamp::Clock;

/// What to do with a result that cannot become a block (no alternatives,
/// or no word timing).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MalformedPolicy {
    /// Fail the whole document on the first bad result.
    #[default]
    Abort,
    /// Leave the result out, log it, and keep numbering densely.
    Skip,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssembleOptions {
    pub clock: Clock,
    pub on_malformed: MalformedPolicy,
}

/// Concatenates one block per result, numbered from 1 in arrival order.
///
/// An empty slice yields an empty string.
///
/// # Errors
/// Any [`SubtitleError`] from rendering or formatting a block. Under
/// `MalformedPolicy::Skip`, malformed results are dropped instead and
/// only timestamp range errors are returned.
pub fn assemble(
    results: &[SpeechRecognitionResult],
    options: &AssembleOptions,
) -> Result<String, SubtitleError> {
    let mut output = String::new();
    let mut index = 1;

    for (position, result) in results.iter().enumerate() {
        match render(result, index).and_then(|block| block.to_srt(options.clock))
        {
            Ok(block) => {
                output.push_str(&block);
                index += 1;
            }
            Err(err)
                if err.is_malformed()
                    && options.on_malformed == MalformedPolicy::Skip =>
            {
                tracing::warn!(
                    "Skipping recognition result #{}: {}",
                    position + 1,
                    err
                );
            }
            Err(err) => return Err(err),
        }
    }

    tracing::debug!("Assembled {} subtitle blocks", index - 1);

    Ok(output)
}
