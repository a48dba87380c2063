//! Common settings in Staccato.

/// The reserved id used to pad id sequences up to their target length.
///
/// PAD never appears in an unpadded field, so a numeric mask can be
/// derived as `id != PAD_ID` after padding.
pub const PAD_ID: u32 = 0;

/// The reserved id substituted for words and characters missing from
/// their tables.
pub const UNK_ID: u32 = 1;

/// The first id assigned to a real table entry.
///
/// Ids 0 and 1 are reserved for [`PAD_ID`] and [`UNK_ID`] in both the
/// word-id and character-id spaces.
pub const FIRST_REAL_ID: u32 = 2;

/// Smoothing constant of the normalized term-frequency feature.
///
/// A token's score is `TF_SMOOTHING + (1 - TF_SMOOTHING) * freq / max_freq`,
/// which maps every token into `[TF_SMOOTHING, 1.0]`.
pub const TF_SMOOTHING: f32 = 0.4;

/// Number of batches' worth of examples buffered per refill.
///
/// A refill reads at most `batch_size * REFILL_POOL_FACTOR` examples
/// before sorting, chunking, and shuffling the pool; remaining input is
/// left for the next refill.
pub const REFILL_POOL_FACTOR: usize = 160;

/// Width of the per-token numeric feature vector
/// (normalized term frequency, exact-match flag).
pub const NUM_FEATS: usize = 2;
