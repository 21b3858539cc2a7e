//! # HMM Model — Emission and Transition Tables
//!
//! The model is what the estimator produces and the decoder consumes:
//!
//! - **Tag order**: the real tags in the order they were first seen, plus the
//!   synthetic sentence-start context [`START_TAG`].
//! - **Emission**: a score for `(word, tag)` that approximates $P(word | tag)$.
//! - **Transition**: $P(tag_i | tag_{i-1})$, with the start context as an
//!   extra "previous tag".
//!
//! ## Layout
//!
//! Tags and words are interned ([`Vocabulary`]) and both tables are dense,
//! row-major `Vec<f64>` arrays:
//!
//! ```text
//! emission    rows = words            cols = real tags
//! transition  rows = START + real tags cols = real tags   (row 0 is START)
//! ```
//!
//! A model is never mutated after estimation, so it can be shared between
//! threads by reference.

use crate::vocab::Vocabulary;

/// Label of the synthetic sentence-start context.
pub const START_TAG: &str = "<start>";

/// Additive smoothing floor applied to every count.
pub const EPSILON: f64 = 1e-10;

/// Dense row-major matrix of `f64`.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    n_rows: usize,
    n_cols: usize,
    values: Vec<f64>,
}

impl Table {
    pub fn filled(n_rows: usize, n_cols: usize, value: f64) -> Self {
        Self {
            n_rows,
            n_cols,
            values: vec![value; n_rows * n_cols],
        }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.n_cols + col]
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> &mut f64 {
        &mut self.values[row * self.n_cols + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.values[row * self.n_cols..(row + 1) * self.n_cols]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        &mut self.values[row * self.n_cols..(row + 1) * self.n_cols]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.n_rows).map(move |r| self.row(r))
    }
}

/// Trained first-order HMM.
///
/// Tag ids passed to the accessors index the **real** tags (the start context
/// is never a current tag); `0..n_tags()` enumerates them in tag order.
#[derive(Debug, Clone, PartialEq)]
pub struct HmmModel {
    tags: Vocabulary,
    /// Where the start context sits in the full tag order (0 for trained models).
    start_position: usize,
    words: Vocabulary,
    emission: Table,
    transition: Table,
}

impl HmmModel {
    /// Assembles a model from already-normalized tables.
    ///
    /// # Panics
    /// Panics if the table shapes disagree with the vocabularies.
    pub(crate) fn from_parts(
        tags: Vocabulary,
        start_position: usize,
        words: Vocabulary,
        emission: Table,
        transition: Table,
    ) -> Self {
        assert!(start_position <= tags.len());
        assert_eq!(emission.n_rows(), words.len());
        assert_eq!(emission.n_cols(), tags.len());
        assert_eq!(transition.n_rows(), tags.len() + 1);
        assert_eq!(transition.n_cols(), tags.len());
        Self {
            tags,
            start_position,
            words,
            emission,
            transition,
        }
    }

    /// Number of real tags (the start context excluded).
    pub fn n_tags(&self) -> usize {
        self.tags.len()
    }

    /// `true` when there is no real tag to decode with (empty training corpus).
    pub fn is_degenerate(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn tags(&self) -> &Vocabulary {
        &self.tags
    }

    pub fn tag_label(&self, tag: usize) -> &str {
        self.tags.label(tag)
    }

    pub fn tag_id(&self, label: &str) -> Option<usize> {
        self.tags.get(label)
    }

    /// Full tag order as persisted: real tags with [`START_TAG`] at its position.
    pub fn tag_order(&self) -> Vec<&str> {
        let mut order: Vec<&str> = self.tags.iter().collect();
        order.insert(self.start_position, START_TAG);
        order
    }

    pub fn words(&self) -> &Vocabulary {
        &self.words
    }

    /// Id of a word seen during training; `None` means the word is unknown.
    pub fn word_id(&self, word: &str) -> Option<usize> {
        self.words.get(word)
    }

    pub fn emission(&self, word: usize, tag: usize) -> f64 {
        self.emission.get(word, tag)
    }

    /// Emission scores of `word` for every real tag.
    pub fn emission_row(&self, word: usize) -> &[f64] {
        self.emission.row(word)
    }

    /// $P(tag | START)$.
    pub fn start_transition(&self, tag: usize) -> f64 {
        self.transition.get(0, tag)
    }

    /// $P(next | prev)$ for real tags `prev` and `next`.
    pub fn transition(&self, prev: usize, next: usize) -> f64 {
        self.transition.get(prev + 1, next)
    }

    /// Transition distribution out of the start context.
    pub fn start_transition_row(&self) -> &[f64] {
        self.transition.row(0)
    }

    /// Transition distribution out of the real tag `prev`.
    pub fn transition_row(&self, prev: usize) -> &[f64] {
        self.transition.row(prev + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(labels: &[&str]) -> Vocabulary {
        let mut v = Vocabulary::new();
        for l in labels {
            v.intern(l);
        }
        v
    }

    #[test]
    fn test_table_indexing() {
        let mut table = Table::filled(2, 3, 0.0);
        *table.get_mut(1, 2) = 5.0;
        table.row_mut(0)[1] = 2.0;
        assert_eq!(table.get(1, 2), 5.0);
        assert_eq!(table.row(0), &[0.0, 2.0, 0.0]);
        assert_eq!(table.rows().count(), 2);
    }

    #[test]
    fn test_transition_rows_are_shifted_past_start() {
        let mut transition = Table::filled(3, 2, 0.0);
        transition.row_mut(0).copy_from_slice(&[0.9, 0.1]);
        transition.row_mut(1).copy_from_slice(&[0.2, 0.8]);
        transition.row_mut(2).copy_from_slice(&[0.6, 0.4]);
        let model = HmmModel::from_parts(
            vocab(&["N", "V"]),
            0,
            vocab(&["dog"]),
            Table::filled(1, 2, 0.5),
            transition,
        );
        assert_eq!(model.start_transition(0), 0.9);
        assert_eq!(model.transition(0, 1), 0.8);
        assert_eq!(model.transition_row(1), &[0.6, 0.4]);
        assert_eq!(model.tag_order(), vec![START_TAG, "N", "V"]);
        assert_eq!(model.word_id("dog"), Some(0));
        assert_eq!(model.word_id("cat"), None);
    }

    #[test]
    fn test_tag_order_respects_start_position() {
        let model = HmmModel::from_parts(
            vocab(&["A", "B"]),
            2,
            Vocabulary::new(),
            Table::filled(0, 2, 0.0),
            Table::filled(3, 2, 0.5),
        );
        assert_eq!(model.tag_order(), vec!["A", "B", START_TAG]);
    }
}
