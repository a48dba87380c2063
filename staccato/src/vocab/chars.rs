//! Character table for character-id mapping.

use hashbrown::HashMap;

use crate::common::{FIRST_REAL_ID, UNK_ID};

/// Mapping from characters to character ids.
///
/// The table is fixed after construction. Characters missing from the
/// table map to [`UNK_ID`]; case folding is the caller's concern.
#[derive(Clone)]
pub struct CharTable {
    char2id: HashMap<char, u32>,
}

impl CharTable {
    /// Creates a new table from an ordered sequence of characters.
    ///
    /// Ids are assigned in iteration order starting at 2.
    /// A character occurring more than once keeps its first id.
    pub fn new<I>(chars: I) -> Self
    where
        I: IntoIterator<Item = char>,
    {
        let mut char2id = HashMap::new();
        for c in chars {
            let next_id = FIRST_REAL_ID + char2id.len() as u32;
            char2id.entry(c).or_insert(next_id);
        }
        Self { char2id }
    }

    /// Gets the id of `c`, or [`UNK_ID`] if the character is missing.
    #[inline(always)]
    pub fn char_id(&self, c: char) -> u32 {
        self.char2id.get(&c).copied().unwrap_or(UNK_ID)
    }

    /// Gets the number of entries, excluding the two reserved ids.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.char2id.len()
    }

    /// Checks if the table has no entries.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.char2id.is_empty()
    }
}

impl Default for CharTable {
    /// Creates the standard table of lowercase letters, digits, and the
    /// punctuation characters `.`, `,`, `"`, `?`, and `'`.
    fn default() -> Self {
        Self::new(
            ('a'..='z')
                .chain('0'..='9')
                .chain(['.', ',', '"', '?', '\'']),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_ids() {
        let table = CharTable::default();
        assert_eq!(table.len(), 41);
        assert_eq!(table.char_id('a'), 2);
        assert_eq!(table.char_id('z'), 27);
        assert_eq!(table.char_id('0'), 28);
        assert_eq!(table.char_id('9'), 37);
        assert_eq!(table.char_id('.'), 38);
        assert_eq!(table.char_id(','), 39);
        assert_eq!(table.char_id('"'), 40);
        assert_eq!(table.char_id('?'), 41);
        assert_eq!(table.char_id('\''), 42);
    }

    #[test]
    fn test_unknown_char() {
        let table = CharTable::default();
        assert_eq!(table.char_id('!'), UNK_ID);
        // The table is not case folded.
        assert_eq!(table.char_id('A'), UNK_ID);
    }
}
