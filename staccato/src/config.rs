//! Configuration of the batch-construction pipeline.

use crate::common::NUM_FEATS;
use crate::errors::{Result, StaccatoError};

/// Configuration of the batch-construction pipeline.
#[derive(Debug, Clone)]
pub struct BatcherConfig {
    /// Number of examples per produced batch.
    /// The final batch of a stream may be smaller.
    pub batch_size: usize,

    /// Maximum and padded length of context sequences.
    pub context_len: usize,

    /// Maximum and padded length of question sequences.
    pub question_len: usize,

    /// Maximum number of character ids kept per token.
    pub word_len: usize,

    /// Width of the per-token numeric feature vector.
    pub num_feats: usize,

    /// Drops over-length examples instead of truncating them.
    pub discard_long: bool,
}

impl BatcherConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// [`StaccatoError`] is returned when a length is zero or
    /// `num_feats` differs from the number of derived features.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(StaccatoError::invalid_argument(
                "batch_size",
                "must be positive",
            ));
        }
        if self.context_len == 0 {
            return Err(StaccatoError::invalid_argument(
                "context_len",
                "must be positive",
            ));
        }
        if self.question_len == 0 {
            return Err(StaccatoError::invalid_argument(
                "question_len",
                "must be positive",
            ));
        }
        if self.word_len == 0 {
            return Err(StaccatoError::invalid_argument(
                "word_len",
                "must be positive",
            ));
        }
        if self.num_feats != NUM_FEATS {
            return Err(StaccatoError::invalid_argument(
                "num_feats",
                format!("exactly {NUM_FEATS} features are derived per token"),
            ));
        }
        Ok(())
    }
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            context_len: 600,
            question_len: 30,
            word_len: 16,
            num_feats: NUM_FEATS,
            discard_long: false,
        }
    }
}
