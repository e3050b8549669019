//! When to stop the agents and hand over to the human.

use crate::transcript::Transcript;

/// Phrase the reviewing agent replies with once the work is ready.
pub const READY_SENTINEL: &str = "READY FOR USER APPROVAL";

/// Decides, after each appended message, whether the conversation is over.
pub trait TerminationPolicy: Send + Sync {
    fn should_terminate(&self, transcript: &Transcript) -> bool;
}

/// Stops when the latest message is exactly the sentinel phrase.
///
/// Comparison trims surrounding whitespace and ignores case. Anything else
/// in the message, punctuation included, means "keep going".
#[derive(Debug, Clone)]
pub struct SentinelPolicy {
    phrase: String,
}

impl SentinelPolicy {
    pub fn new(phrase: &str) -> Self {
        Self {
            phrase: phrase.trim().to_uppercase(),
        }
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }
}

impl Default for SentinelPolicy {
    fn default() -> Self {
        Self::new(READY_SENTINEL)
    }
}

impl TerminationPolicy for SentinelPolicy {
    fn should_terminate(&self, transcript: &Transcript) -> bool {
        transcript
            .last()
            .is_some_and(|m| m.content().trim().to_uppercase() == self.phrase)
    }
}
