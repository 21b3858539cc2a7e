//! # Vocabulary — String Interning
//!
//! Tags and words are stored as small integer ids so the probability tables
//! can be flat arrays instead of nested hash maps. Ids are handed out in
//! **first-occurrence order**, which is exactly the enumeration order the
//! decoder relies on for tie-breaking.

use std::collections::HashMap;

/// An insertion-ordered set of labels with a reverse `label -> id` index.
///
/// ```rust
/// use hmm_core::vocab::Vocabulary;
///
/// let mut tags = Vocabulary::new();
/// assert_eq!(tags.intern("NN"), 0);
/// assert_eq!(tags.intern("VB"), 1);
/// assert_eq!(tags.intern("NN"), 0);
/// assert_eq!(tags.label(1), "VB");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    labels: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of `label`, assigning the next free id if it is new.
    pub fn intern(&mut self, label: &str) -> usize {
        if let Some(&id) = self.index.get(label) {
            return id;
        }
        let id = self.labels.len();
        self.labels.push(label.to_string());
        self.index.insert(label.to_string(), id);
        id
    }

    /// Looks up an existing label without inserting it.
    pub fn get(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    /// Label for `id`.
    ///
    /// # Panics
    /// Panics if `id` was not produced by this vocabulary.
    pub fn label(&self, id: usize) -> &str {
        &self.labels[id]
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels in id order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.labels.iter().map(String::as_str)
    }
}
