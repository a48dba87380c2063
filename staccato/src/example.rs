//! Aligned example records and their assembly.

use crate::common::NUM_FEATS;
use crate::config::BatcherConfig;
use crate::errors::{Result, StaccatoError};
use crate::features;
use crate::vocab::{CharTable, SharedIndex, Vocabulary};

/// One (context, question, answer) example with aligned per-token
/// fields.
///
/// Every context-aligned field (ids, features, character ids, shared
/// mask and rows) has the same unpadded length as the context token
/// sequence, and similarly for the question-aligned fields. The
/// invariant is verified at assembly time, and an example is never
/// mutated afterwards.
pub struct Example {
    pub(crate) context_tokens: Vec<String>,
    pub(crate) context_ids: Vec<u32>,
    pub(crate) question_tokens: Vec<String>,
    pub(crate) question_ids: Vec<u32>,
    pub(crate) answer_span: (u32, u32),
    pub(crate) answer_tokens: Vec<String>,
    pub(crate) features: Vec<[f32; NUM_FEATS]>,
    pub(crate) context_char_ids: Vec<Vec<u32>>,
    pub(crate) question_char_ids: Vec<Vec<u32>>,
    pub(crate) shared_context_mask: Vec<bool>,
    pub(crate) shared_context_rows: Vec<u32>,
    pub(crate) shared_question_mask: Vec<bool>,
    pub(crate) shared_question_rows: Vec<u32>,
}

impl Example {
    /// Assembles one example from a (context, question, answer) line
    /// triple.
    ///
    /// Returns `Ok(None)` when the example is skipped: the answer span
    /// has `end < start`, or a side exceeds its configured length while
    /// `discard_long` is set. With `discard_long` unset, an over-length
    /// side is truncated together with every field aligned to it.
    ///
    /// The answer tokens are sliced from the context token sequence
    /// before any truncation, clamped to its bounds.
    ///
    /// # Errors
    ///
    /// [`StaccatoError`] is returned when the context line has no
    /// tokens or the answer line is not exactly two integers.
    pub fn assemble(
        context_line: &str,
        question_line: &str,
        answer_line: &str,
        vocab: &Vocabulary,
        chars: &CharTable,
        shared: &SharedIndex,
        config: &BatcherConfig,
    ) -> Result<Option<Self>> {
        let (context_tokens, context_ids) = vocab.tokenize(context_line);
        if context_tokens.is_empty() {
            return Err(StaccatoError::invalid_format(
                "context",
                "a context line must contain at least one token",
            ));
        }
        let (question_tokens, question_ids) = vocab.tokenize(question_line);

        let (start, end) = parse_answer_span(answer_line)?;
        if end < start {
            log::warn!("skipping ill-formed gold span: start={start} end={end}");
            return Ok(None);
        }
        let answer_tokens = context_tokens
            .get(start as usize..context_tokens.len().min((end as usize).saturating_add(1)))
            .unwrap_or(&[])
            .to_vec();

        let term_freq = features::term_frequency(&context_tokens);
        let match_flags = features::exact_match(&context_tokens, &question_tokens);
        let features = term_freq
            .into_iter()
            .zip(match_flags)
            .map(|(tf, m)| [tf, if m { 1.0 } else { 0.0 }])
            .collect();
        let context_char_ids = features::char_ids(&context_tokens, chars, config.word_len);
        let question_char_ids = features::char_ids(&question_tokens, chars, config.word_len);
        let (shared_context_mask, shared_context_rows) = shared.mask_and_rows(&context_ids);
        let (shared_question_mask, shared_question_rows) = shared.mask_and_rows(&question_ids);

        let mut example = Self {
            context_tokens,
            context_ids,
            question_tokens,
            question_ids,
            answer_span: (start, end),
            answer_tokens,
            features,
            context_char_ids,
            question_char_ids,
            shared_context_mask,
            shared_context_rows,
            shared_question_mask,
            shared_question_rows,
        };

        if example.question_tokens.len() > config.question_len {
            if config.discard_long {
                return Ok(None);
            }
            example.truncate_question(config.question_len);
        }
        if example.context_tokens.len() > config.context_len {
            if config.discard_long {
                return Ok(None);
            }
            example.truncate_context(config.context_len);
        }

        example.check_alignment()?;
        Ok(Some(example))
    }

    /// Truncates every question-aligned field to `len`.
    fn truncate_question(&mut self, len: usize) {
        self.question_tokens.truncate(len);
        self.question_ids.truncate(len);
        self.question_char_ids.truncate(len);
        self.shared_question_mask.truncate(len);
        self.shared_question_rows.truncate(len);
    }

    /// Truncates every context-aligned field to `len`.
    fn truncate_context(&mut self, len: usize) {
        self.context_tokens.truncate(len);
        self.context_ids.truncate(len);
        self.features.truncate(len);
        self.context_char_ids.truncate(len);
        self.shared_context_mask.truncate(len);
        self.shared_context_rows.truncate(len);
    }

    /// Verifies that every aligned field matches its token sequence in
    /// length.
    fn check_alignment(&self) -> Result<()> {
        let n = self.context_tokens.len();
        let context_aligned = [
            self.context_ids.len(),
            self.features.len(),
            self.context_char_ids.len(),
            self.shared_context_mask.len(),
            self.shared_context_rows.len(),
        ];
        if context_aligned.iter().any(|&len| len != n) {
            return Err(StaccatoError::invalid_state(
                "misaligned example",
                format!("context-aligned lengths {context_aligned:?} != {n}"),
            ));
        }
        let m = self.question_tokens.len();
        let question_aligned = [
            self.question_ids.len(),
            self.question_char_ids.len(),
            self.shared_question_mask.len(),
            self.shared_question_rows.len(),
        ];
        if question_aligned.iter().any(|&len| len != m) {
            return Err(StaccatoError::invalid_state(
                "misaligned example",
                format!("question-aligned lengths {question_aligned:?} != {m}"),
            ));
        }
        Ok(())
    }

    /// Gets the unpadded context tokens.
    #[inline(always)]
    pub fn context_tokens(&self) -> &[String] {
        &self.context_tokens
    }

    /// Gets the unpadded context word ids.
    #[inline(always)]
    pub fn context_ids(&self) -> &[u32] {
        &self.context_ids
    }

    /// Gets the unpadded question tokens.
    #[inline(always)]
    pub fn question_tokens(&self) -> &[String] {
        &self.question_tokens
    }

    /// Gets the unpadded question word ids.
    #[inline(always)]
    pub fn question_ids(&self) -> &[u32] {
        &self.question_ids
    }

    /// Gets the inclusive (start, end) answer span.
    #[inline(always)]
    pub fn answer_span(&self) -> (u32, u32) {
        self.answer_span
    }

    /// Gets the answer tokens.
    #[inline(always)]
    pub fn answer_tokens(&self) -> &[String] {
        &self.answer_tokens
    }

    /// Gets the per-context-token feature rows
    /// (normalized term frequency, exact-match flag).
    #[inline(always)]
    pub fn features(&self) -> &[[f32; NUM_FEATS]] {
        &self.features
    }

    /// Gets the per-context-token character ids, capped at the
    /// configured word length.
    #[inline(always)]
    pub fn context_char_ids(&self) -> &[Vec<u32>] {
        &self.context_char_ids
    }

    /// Gets the per-question-token character ids, capped at the
    /// configured word length.
    #[inline(always)]
    pub fn question_char_ids(&self) -> &[Vec<u32>] {
        &self.question_char_ids
    }

    /// Gets the shared-vocabulary membership mask of the context.
    #[inline(always)]
    pub fn shared_context_mask(&self) -> &[bool] {
        &self.shared_context_mask
    }

    /// Gets the shared-embedding rows of the context.
    #[inline(always)]
    pub fn shared_context_rows(&self) -> &[u32] {
        &self.shared_context_rows
    }

    /// Gets the shared-vocabulary membership mask of the question.
    #[inline(always)]
    pub fn shared_question_mask(&self) -> &[bool] {
        &self.shared_question_mask
    }

    /// Gets the shared-embedding rows of the question.
    #[inline(always)]
    pub fn shared_question_rows(&self) -> &[u32] {
        &self.shared_question_rows
    }
}

/// Parses an answer line of exactly two whitespace-separated integers.
fn parse_answer_span(line: &str) -> Result<(u32, u32)> {
    let mut it = line.split_whitespace();
    let (Some(start), Some(end), None) = (it.next(), it.next(), it.next()) else {
        return Err(StaccatoError::invalid_format(
            "answer",
            format!("expected two integers, got {line:?}"),
        ));
    };
    Ok((start.parse()?, end.parse()?))
}
