//! Misc utility functions

/// The binary search assists found in the table directory and in
/// cmap format 4 subtables.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchRange {
    pub search_range: u16,
    pub entry_selector: u16,
    pub range_shift: u16,
}

impl SearchRange {
    /// Compute the search assists for `n_items` records of `item_size` bytes.
    ///
    /// See <https://learn.microsoft.com/en-us/typography/opentype/spec/otff#table-directory>
    pub fn compute(n_items: usize, item_size: usize) -> Self {
        if n_items == 0 {
            return Self::default();
        }
        let entry_selector = n_items.ilog2();
        let search_range = (1usize << entry_selector) * item_size;
        let range_shift = n_items * item_size - search_range;
        SearchRange {
            search_range: search_range as u16,
            entry_selector: entry_selector as u16,
            range_shift: range_shift as u16,
        }
    }
}

/// <https://github.com/google/woff2/blob/a0d0ed7da27b708c0a4e96ad7a998bddc933c06e/src/round.h#L19>
pub(crate) fn round4(sz: usize) -> usize {
    (sz + 3) & !3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_directory_assists() {
        // Roboto has 0x16 tables
        let computed = SearchRange::compute(0x16, 16);
        assert_eq!(
            (256, 4, 96),
            (
                computed.search_range,
                computed.entry_selector,
                computed.range_shift
            )
        );
    }

    #[test]
    fn segment_assists() {
        let computed = SearchRange::compute(5, 2);
        assert_eq!(computed.entry_selector, 2);
        assert_eq!(computed.search_range, 8);
        assert_eq!(computed.range_shift, 2);

        let one = SearchRange::compute(1, 2);
        assert_eq!((one.search_range, one.entry_selector, one.range_shift), (2, 0, 0));
        assert_eq!(SearchRange::compute(0, 16), SearchRange::default());
    }

    #[test]
    fn pad4() {
        for i in 0..10 {
            let padded = round4(i);
            assert!(padded - i < 4);
            assert_eq!(padded % 4, 0, "{i} rounds to {padded}");
        }
    }
}
