//! Lookup tables for id mapping.
pub(crate) mod chars;
pub(crate) mod shared;

use std::io::BufRead;

use hashbrown::HashMap;

use crate::common::{FIRST_REAL_ID, UNK_ID};
use crate::errors::Result;

pub use crate::vocab::chars::CharTable;
pub use crate::vocab::shared::SharedIndex;

/// Mapping from word strings to word ids.
///
/// Ids 0 and 1 are reserved for padding and unknown words; real entries
/// are assigned consecutive ids starting at 2. Every id produced by
/// [`Vocabulary::tokenize`] is either a vocabulary id or [`UNK_ID`];
/// [`PAD_ID`](crate::common::PAD_ID) is introduced only by padding.
#[derive(Clone)]
pub struct Vocabulary {
    word2id: HashMap<String, u32>,
}

impl Vocabulary {
    /// Creates a new vocabulary from an ordered sequence of words.
    ///
    /// Ids are assigned in iteration order starting at 2.
    /// A word occurring more than once keeps its first id.
    pub fn new<I, W>(words: I) -> Self
    where
        I: IntoIterator<Item = W>,
        W: AsRef<str>,
    {
        let mut word2id = HashMap::new();
        for w in words {
            let next_id = FIRST_REAL_ID + word2id.len() as u32;
            word2id.entry_ref(w.as_ref()).or_insert(next_id);
        }
        Self { word2id }
    }

    /// Creates a new vocabulary from a reader with one word per line.
    ///
    /// Leading and trailing whitespace on each line is trimmed;
    /// blank lines are skipped.
    ///
    /// # Errors
    ///
    /// [`StaccatoError`](crate::errors::StaccatoError) is returned when
    /// the reader fails.
    pub fn from_reader<R>(rdr: R) -> Result<Self>
    where
        R: BufRead,
    {
        let mut words = vec![];
        for line in rdr.lines() {
            let line = line?;
            let word = line.trim();
            if !word.is_empty() {
                words.push(word.to_string());
            }
        }
        Ok(Self::new(words))
    }

    /// Gets the number of entries, excluding the two reserved ids.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.word2id.len()
    }

    /// Checks if the vocabulary has no entries.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.word2id.is_empty()
    }

    /// Gets the id of `word`, or [`UNK_ID`] if the word is missing.
    #[inline(always)]
    pub fn word_id(&self, word: &str) -> u32 {
        self.word2id.get(word).copied().unwrap_or(UNK_ID)
    }

    /// Splits a pre-tokenized line on whitespace and maps each token to
    /// its word id.
    ///
    /// Runs of whitespace are collapsed and the ends trimmed. The token
    /// and id sequences are aligned 1:1.
    pub fn tokenize(&self, line: &str) -> (Vec<String>, Vec<u32>) {
        let tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        let ids = tokens.iter().map(|t| self.word_id(t)).collect();
        (tokens, ids)
    }
}
