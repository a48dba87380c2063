//! Per-token feature derivation.
//!
//! All functions here are pure: re-deriving a feature from the same
//! token sequence always yields the same values.

use hashbrown::HashMap;

use crate::common::TF_SMOOTHING;
use crate::vocab::CharTable;

/// Maps each token to its character-id sequence.
///
/// Tokens are lower-cased before the per-character lookup; characters
/// missing from the table map to [`UNK_ID`](crate::common::UNK_ID).
/// Sequences are truncated at `word_len` and left unpadded; padding
/// happens at batch materialization.
pub fn char_ids(tokens: &[String], table: &CharTable, word_len: usize) -> Vec<Vec<u32>> {
    tokens
        .iter()
        .map(|tok| {
            tok.to_lowercase()
                .chars()
                .take(word_len)
                .map(|c| table.char_id(c))
                .collect()
        })
        .collect()
}

/// Flags each context token that occurs in the question token sequence
/// with count exactly 1.
///
/// A token repeated two or more times in the question does not match.
pub fn exact_match(context_tokens: &[String], question_tokens: &[String]) -> Vec<bool> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for q in question_tokens {
        *counts.entry(q.as_str()).or_insert(0) += 1;
    }
    context_tokens
        .iter()
        .map(|t| counts.get(t.as_str()).copied() == Some(1))
        .collect()
}

/// Computes the normalized term frequency of each token.
///
/// A token's score is `a + (1 - a) * freq / max_freq` with
/// `a =` [`TF_SMOOTHING`], so every score lies in `[a, 1.0]`.
/// Returns an empty sequence for empty input.
pub fn term_frequency(tokens: &[String]) -> Vec<f32> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for t in tokens {
        *counts.entry(t.as_str()).or_insert(0) += 1;
    }
    let max_count = counts.values().copied().max().unwrap_or(0) as f32;
    tokens
        .iter()
        .map(|t| TF_SMOOTHING + (1.0 - TF_SMOOTHING) * counts[t.as_str()] as f32 / max_count)
        .collect()
}
