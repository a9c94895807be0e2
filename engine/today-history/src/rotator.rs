//! Circular cursor over the cached filtered list

use crate::models::HistoryRecord;

/// Rotation state for the scroll view
#[derive(Debug, Clone, Default)]
pub struct Rotator {
    filtered_data: Vec<HistoryRecord>,
    cursor: usize,
}

impl Rotator {
    pub fn new(filtered_data: Vec<HistoryRecord>) -> Self {
        Self { filtered_data, cursor: 0 }
    }

    /// Replace the list and rewind to the first entry
    pub fn reset(&mut self, filtered_data: Vec<HistoryRecord>) {
        self.filtered_data = filtered_data;
        self.cursor = 0;
    }

    /// Return the entry under the cursor and advance, wrapping at the end.
    /// An empty list yields the placeholder and leaves the cursor alone.
    pub fn advance(&mut self) -> HistoryRecord {
        if self.filtered_data.is_empty() {
            return HistoryRecord::placeholder();
        }

        let item = self.filtered_data[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.filtered_data.len();
        item
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.filtered_data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filtered_data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(title: &str) -> HistoryRecord {
        HistoryRecord { title: title.to_string(), ..Default::default() }
    }

    #[test]
    fn test_wraps_around() {
        let mut rotator = Rotator::new(vec![record("X"), record("Y"), record("Z")]);

        assert_eq!(rotator.advance().title, "X");
        assert_eq!(rotator.cursor(), 1);
        assert_eq!(rotator.advance().title, "Y");
        assert_eq!(rotator.cursor(), 2);
        assert_eq!(rotator.advance().title, "Z");
        assert_eq!(rotator.cursor(), 0);
        assert_eq!(rotator.advance().title, "X");
    }

    #[test]
    fn test_empty_returns_placeholder() {
        let mut rotator = Rotator::default();
        for _ in 0..5 {
            assert_eq!(rotator.advance(), HistoryRecord::placeholder());
            assert_eq!(rotator.cursor(), 0);
        }
        assert!(rotator.is_empty());
    }

    #[test]
    fn test_single_entry_repeats() {
        let mut rotator = Rotator::new(vec![record("only")]);
        for _ in 0..3 {
            assert_eq!(rotator.advance().title, "only");
            assert_eq!(rotator.cursor(), 0);
        }
    }

    #[test]
    fn test_reset_rewinds_cursor() {
        let mut rotator = Rotator::new(vec![record("X"), record("Y"), record("Z")]);
        rotator.advance();
        rotator.advance();
        assert_eq!(rotator.cursor(), 2);

        rotator.reset(vec![record("P"), record("Q")]);
        assert_eq!(rotator.cursor(), 0);
        assert_eq!(rotator.len(), 2);
        assert_eq!(rotator.advance().title, "P");
    }

    #[test]
    fn test_reset_to_empty() {
        let mut rotator = Rotator::new(vec![record("X"), record("Y")]);
        rotator.advance();
        rotator.reset(Vec::new());
        assert_eq!(rotator.cursor(), 0);
        assert_eq!(rotator.advance(), HistoryRecord::placeholder());
    }

    proptest! {
        #[test]
        fn prop_full_cycle_visits_each_once_in_order(len in 1usize..40, laps in 1usize..4) {
            let records: Vec<_> = (0..len).map(|i| record(&i.to_string())).collect();
            let mut rotator = Rotator::new(records.clone());

            for _ in 0..laps {
                let lap: Vec<_> = (0..len).map(|_| rotator.advance()).collect();
                prop_assert_eq!(&lap, &records);
                prop_assert_eq!(rotator.cursor(), 0);
            }
            prop_assert_eq!(rotator.advance(), records[0].clone());
        }

        #[test]
        fn prop_cursor_stays_in_bounds(len in 1usize..40, steps in 0usize..200) {
            let records: Vec<_> = (0..len).map(|i| record(&i.to_string())).collect();
            let mut rotator = Rotator::new(records);

            for _ in 0..steps {
                rotator.advance();
                prop_assert!(rotator.cursor() < len);
            }
            prop_assert_eq!(rotator.cursor(), steps % len);
        }
    }
}
