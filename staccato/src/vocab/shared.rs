//! Lookup from word ids into a shared embedding table.

use hashbrown::HashMap;

/// Lookup from word ids into the rows of an auxiliary shared embedding
/// table.
///
/// A word id absent from the index is "not shared": its mask entry is
/// `false` and its row index defaults to 0, a dummy slot that is never
/// read because the mask is false.
#[derive(Clone)]
pub struct SharedIndex {
    id2row: HashMap<u32, u32>,
}

impl SharedIndex {
    /// Creates a new index from `(word id, embedding row)` pairs.
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        Self {
            id2row: entries.into_iter().collect(),
        }
    }

    /// Checks if `word_id` has a row in the shared table.
    #[inline(always)]
    pub fn contains(&self, word_id: u32) -> bool {
        self.id2row.contains_key(&word_id)
    }

    /// Gets the embedding row of `word_id`, or 0 if the id is not
    /// shared.
    #[inline(always)]
    pub fn row(&self, word_id: u32) -> u32 {
        self.id2row.get(&word_id).copied().unwrap_or(0)
    }

    /// Computes the membership mask and row indices for a whole id
    /// sequence, aligned 1:1 with the input.
    pub fn mask_and_rows(&self, ids: &[u32]) -> (Vec<bool>, Vec<u32>) {
        let mask = ids.iter().map(|&id| self.contains(id)).collect();
        let rows = ids.iter().map(|&id| self.row(id)).collect();
        (mask, rows)
    }

    /// Gets the number of shared word ids.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.id2row.len()
    }

    /// Checks if the index has no entries.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.id2row.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let shared = SharedIndex::new([(5, 0), (9, 1)]);
        assert!(shared.contains(5));
        assert!(!shared.contains(6));
        assert_eq!(shared.row(9), 1);
        assert_eq!(shared.row(6), 0);
    }

    #[test]
    fn test_mask_and_rows_aligned() {
        let shared = SharedIndex::new([(5, 3), (9, 1)]);
        let (mask, rows) = shared.mask_and_rows(&[5, 6, 9, 5]);
        assert_eq!(mask, [true, false, true, true]);
        assert_eq!(rows, [3, 0, 1, 3]);
    }
}
