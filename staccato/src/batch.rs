//! Padded, materialized training batches.

use crate::common::{NUM_FEATS, PAD_ID};
use crate::config::BatcherConfig;
use crate::errors::{Result, StaccatoError};
use crate::example::Example;

/// An immutable batch of examples with every variable-length field
/// padded to a fixed width.
///
/// Word-id fields are padded to `context_len` or `question_len` and
/// accompanied by 0/1 masks marking real positions. Character-id fields
/// are padded twice, per token to `word_len` and per sequence to the
/// side's length. Token lists are kept unpadded.
pub struct Batch {
    context_ids: Vec<Vec<u32>>,
    context_mask: Vec<Vec<u32>>,
    context_tokens: Vec<Vec<String>>,
    question_ids: Vec<Vec<u32>>,
    question_mask: Vec<Vec<u32>>,
    question_tokens: Vec<Vec<String>>,
    answer_span: Vec<[u32; 2]>,
    answer_tokens: Vec<Vec<String>>,
    features: Vec<Vec<[f32; NUM_FEATS]>>,
    context_char_ids: Vec<Vec<Vec<u32>>>,
    context_char_mask: Vec<Vec<Vec<u32>>>,
    question_char_ids: Vec<Vec<Vec<u32>>>,
    question_char_mask: Vec<Vec<Vec<u32>>>,
    shared_context_mask: Vec<Vec<bool>>,
    shared_context_rows: Vec<Vec<u32>>,
    shared_question_mask: Vec<Vec<bool>>,
    shared_question_rows: Vec<Vec<u32>>,
    uuids: Option<Vec<String>>,
}

impl Batch {
    /// Materializes a batch from a chunk of examples.
    pub(crate) fn from_examples(examples: Vec<Example>, config: &BatcherConfig) -> Self {
        let n = examples.len();
        let mut batch = Self {
            context_ids: Vec::with_capacity(n),
            context_mask: Vec::with_capacity(n),
            context_tokens: Vec::with_capacity(n),
            question_ids: Vec::with_capacity(n),
            question_mask: Vec::with_capacity(n),
            question_tokens: Vec::with_capacity(n),
            answer_span: Vec::with_capacity(n),
            answer_tokens: Vec::with_capacity(n),
            features: Vec::with_capacity(n),
            context_char_ids: Vec::with_capacity(n),
            context_char_mask: Vec::with_capacity(n),
            question_char_ids: Vec::with_capacity(n),
            question_char_mask: Vec::with_capacity(n),
            shared_context_mask: Vec::with_capacity(n),
            shared_context_rows: Vec::with_capacity(n),
            shared_question_mask: Vec::with_capacity(n),
            shared_question_rows: Vec::with_capacity(n),
            uuids: None,
        };

        for example in examples {
            let context_ids = pad_ids(example.context_ids, config.context_len);
            batch.context_mask.push(id_mask(&context_ids));
            batch.context_ids.push(context_ids);
            batch.context_tokens.push(example.context_tokens);

            let question_ids = pad_ids(example.question_ids, config.question_len);
            batch.question_mask.push(id_mask(&question_ids));
            batch.question_ids.push(question_ids);
            batch.question_tokens.push(example.question_tokens);

            let (start, end) = example.answer_span;
            batch.answer_span.push([start, end]);
            batch.answer_tokens.push(example.answer_tokens);

            batch
                .features
                .push(pad_features(example.features, config.context_len));

            let char_ids = pad_char_ids(
                example.context_char_ids,
                config.context_len,
                config.word_len,
            );
            batch.context_char_mask.push(char_id_mask(&char_ids));
            batch.context_char_ids.push(char_ids);

            let char_ids = pad_char_ids(
                example.question_char_ids,
                config.question_len,
                config.word_len,
            );
            batch.question_char_mask.push(char_id_mask(&char_ids));
            batch.question_char_ids.push(char_ids);

            batch
                .shared_context_mask
                .push(pad_bools(example.shared_context_mask, config.context_len));
            batch
                .shared_context_rows
                .push(pad_ids(example.shared_context_rows, config.context_len));
            batch
                .shared_question_mask
                .push(pad_bools(example.shared_question_mask, config.question_len));
            batch
                .shared_question_rows
                .push(pad_ids(example.shared_question_rows, config.question_len));
        }

        batch
    }

    /// Attaches per-example identifiers, used outside training to map
    /// predictions back to their source records.
    ///
    /// # Errors
    ///
    /// [`StaccatoError`] is returned when the number of identifiers
    /// differs from the batch size.
    pub fn with_uuids(mut self, uuids: Vec<String>) -> Result<Self> {
        if uuids.len() != self.batch_size() {
            return Err(StaccatoError::invalid_argument(
                "uuids",
                format!(
                    "got {} identifiers for {} examples",
                    uuids.len(),
                    self.batch_size()
                ),
            ));
        }
        self.uuids = Some(uuids);
        Ok(self)
    }

    /// Gets the number of examples in the batch.
    #[inline(always)]
    pub fn batch_size(&self) -> usize {
        self.context_tokens.len()
    }

    /// Gets the padded context word ids, `batch_size` x `context_len`.
    #[inline(always)]
    pub fn context_ids(&self) -> &[Vec<u32>] {
        &self.context_ids
    }

    /// Gets the context mask, 1 at real positions and 0 at padding.
    #[inline(always)]
    pub fn context_mask(&self) -> &[Vec<u32>] {
        &self.context_mask
    }

    /// Gets the unpadded context token lists.
    #[inline(always)]
    pub fn context_tokens(&self) -> &[Vec<String>] {
        &self.context_tokens
    }

    /// Gets the padded question word ids, `batch_size` x `question_len`.
    #[inline(always)]
    pub fn question_ids(&self) -> &[Vec<u32>] {
        &self.question_ids
    }

    /// Gets the question mask, 1 at real positions and 0 at padding.
    #[inline(always)]
    pub fn question_mask(&self) -> &[Vec<u32>] {
        &self.question_mask
    }

    /// Gets the unpadded question token lists.
    #[inline(always)]
    pub fn question_tokens(&self) -> &[Vec<String>] {
        &self.question_tokens
    }

    /// Gets the inclusive [start, end] answer spans, `batch_size` x 2.
    #[inline(always)]
    pub fn answer_span(&self) -> &[[u32; 2]] {
        &self.answer_span
    }

    /// Gets the answer token lists.
    #[inline(always)]
    pub fn answer_tokens(&self) -> &[Vec<String>] {
        &self.answer_tokens
    }

    /// Gets the numeric feature rows,
    /// `batch_size` x `context_len` x `num_feats`.
    #[inline(always)]
    pub fn features(&self) -> &[Vec<[f32; NUM_FEATS]>] {
        &self.features
    }

    /// Gets the padded context character ids,
    /// `batch_size` x `context_len` x `word_len`.
    #[inline(always)]
    pub fn context_char_ids(&self) -> &[Vec<Vec<u32>>] {
        &self.context_char_ids
    }

    /// Gets the context character mask, shaped like the character ids.
    #[inline(always)]
    pub fn context_char_mask(&self) -> &[Vec<Vec<u32>>] {
        &self.context_char_mask
    }

    /// Gets the padded question character ids,
    /// `batch_size` x `question_len` x `word_len`.
    #[inline(always)]
    pub fn question_char_ids(&self) -> &[Vec<Vec<u32>>] {
        &self.question_char_ids
    }

    /// Gets the question character mask, shaped like the character ids.
    #[inline(always)]
    pub fn question_char_mask(&self) -> &[Vec<Vec<u32>>] {
        &self.question_char_mask
    }

    /// Gets the shared-vocabulary membership mask of the contexts,
    /// padded with `false`.
    #[inline(always)]
    pub fn shared_context_mask(&self) -> &[Vec<bool>] {
        &self.shared_context_mask
    }

    /// Gets the shared-embedding rows of the contexts.
    #[inline(always)]
    pub fn shared_context_rows(&self) -> &[Vec<u32>] {
        &self.shared_context_rows
    }

    /// Gets the shared-vocabulary membership mask of the questions,
    /// padded with `false`.
    #[inline(always)]
    pub fn shared_question_mask(&self) -> &[Vec<bool>] {
        &self.shared_question_mask
    }

    /// Gets the shared-embedding rows of the questions.
    #[inline(always)]
    pub fn shared_question_rows(&self) -> &[Vec<u32>] {
        &self.shared_question_rows
    }

    /// Gets the per-example identifiers, if attached.
    #[inline(always)]
    pub fn uuids(&self) -> Option<&[String]> {
        self.uuids.as_deref()
    }
}

/// Right-pads an id sequence with [`PAD_ID`] up to `len`.
fn pad_ids(mut ids: Vec<u32>, len: usize) -> Vec<u32> {
    ids.resize(len, PAD_ID);
    ids
}

/// Right-pads a boolean sequence with `false` up to `len`.
fn pad_bools(mut flags: Vec<bool>, len: usize) -> Vec<bool> {
    flags.resize(len, false);
    flags
}

/// Right-pads feature rows with all-zero rows up to `len`.
fn pad_features(mut rows: Vec<[f32; NUM_FEATS]>, len: usize) -> Vec<[f32; NUM_FEATS]> {
    rows.resize(len, [PAD_ID as f32; NUM_FEATS]);
    rows
}

/// Pads character ids on both levels: each token's sequence to
/// `word_len`, then the token list itself to `seq_len` with all-PAD
/// rows.
fn pad_char_ids(seqs: Vec<Vec<u32>>, seq_len: usize, word_len: usize) -> Vec<Vec<u32>> {
    let mut rows: Vec<Vec<u32>> = seqs.into_iter().map(|s| pad_ids(s, word_len)).collect();
    rows.resize_with(seq_len, || vec![PAD_ID; word_len]);
    rows
}

/// Derives the 0/1 mask of a padded id sequence.
fn id_mask(ids: &[u32]) -> Vec<u32> {
    ids.iter().map(|&id| u32::from(id != PAD_ID)).collect()
}

/// Derives the 0/1 mask of padded two-level character ids.
fn char_id_mask(rows: &[Vec<u32>]) -> Vec<Vec<u32>> {
    rows.iter().map(|row| id_mask(row)).collect()
}
