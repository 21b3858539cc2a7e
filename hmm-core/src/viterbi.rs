//! # Viterbi Algorithm — Most Probable Tag Sequence
//!
//! The Viterbi algorithm is a **dynamic programming** method that finds the
//! best tag sequence without enumerating all `T^N` candidates.
//!
//! ## Intuition
//!
//! The best path ending in tag `t` at word `i` only depends on the best paths
//! ending in each tag at word `i - 1` (the Markov property), so keeping one
//! score per `(position, tag)` is enough → `O(N × T²)`.
//!
//! ## Algorithm
//!
//! ```text
//! Init:        score[0][t] = P(t | START) · e(w_0, t)
//! Recurrence:  score[i][t] = max_p score[i-1][p] · P(t | p) · e(w_i, t)
//! Termination: best last tag = first tag with the strictly largest score > 0
//! Backtrack:   follow back[i][t] from the last position to the first
//!
//! e(w, t) = emission[w][t] if w was seen in training, 1 otherwise
//! ```
//!
//! An unknown word contributes no emission evidence at all (factor 1, not the
//! smoothing floor), so its tag is chosen from transitions alone.
//!
//! ## Numeric behaviour
//!
//! Scores are plain products of factors in `(0, 1]`, not log-probabilities.
//! On long sentences they can underflow to `0.0`: ties then resolve to the
//! earliest tag, and if the whole last column is zero decoding fails with
//! [`HmmError::AllZeroTerminalScores`].

use serde::{Deserialize, Serialize};

use crate::argmax::{first_above_zero_max, first_max};
use crate::error::{HmmError, Result};
use crate::model::HmmModel;

/// Predecessor of a lattice cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Backpointer {
    /// The cell is at position 0; its predecessor is the sentence start.
    Start,
    /// Real tag id at the previous position.
    Tag(usize),
}

/// Score and backpointer tables filled by the decoder, one column per word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lattice {
    n_tags: usize,
    /// `scores[i * n_tags + t]`
    scores: Vec<f64>,
    /// `back[(i - 1) * n_tags + t]` for positions `i >= 1`.
    back: Vec<usize>,
}

impl Lattice {
    fn new(n_positions: usize, n_tags: usize) -> Self {
        Self {
            n_tags,
            scores: vec![0.0; n_positions * n_tags],
            back: vec![0; n_positions.saturating_sub(1) * n_tags],
        }
    }

    /// Number of positions (words).
    pub fn len(&self) -> usize {
        if self.n_tags == 0 {
            0
        } else {
            self.scores.len() / self.n_tags
        }
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn n_tags(&self) -> usize {
        self.n_tags
    }

    /// Best path score ending in `tag` at `position`.
    pub fn score(&self, position: usize, tag: usize) -> f64 {
        self.scores[position * self.n_tags + tag]
    }

    /// Scores of every tag at `position`.
    pub fn column(&self, position: usize) -> &[f64] {
        &self.scores[position * self.n_tags..(position + 1) * self.n_tags]
    }

    pub fn backpointer(&self, position: usize, tag: usize) -> Backpointer {
        if position == 0 {
            Backpointer::Start
        } else {
            Backpointer::Tag(self.back[(position - 1) * self.n_tags + tag])
        }
    }

    fn column_mut(&mut self, position: usize) -> &mut [f64] {
        &mut self.scores[position * self.n_tags..(position + 1) * self.n_tags]
    }
}

/// Outcome of decoding one sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViterbiResult {
    /// Tag id per word, left to right.
    pub best_path: Vec<usize>,
    /// Score of the best path (product of all factors along it).
    pub best_score: f64,
    /// Full table of scores, kept for inspection.
    pub lattice: Lattice,
}

/// Runs Viterbi over `sentence` with `model`.
///
/// # Errors
/// - [`HmmError::EmptySentence`] for a sentence with no words.
/// - [`HmmError::DegenerateModel`] if the model has no real tags.
/// - [`HmmError::AllZeroTerminalScores`] if no tag scores above zero at the
///   last position.
pub fn viterbi_decode<S: AsRef<str>>(model: &HmmModel, sentence: &[S]) -> Result<ViterbiResult> {
    if sentence.is_empty() {
        return Err(HmmError::EmptySentence);
    }
    if model.is_degenerate() {
        return Err(HmmError::DegenerateModel);
    }

    let n_words = sentence.len();
    let n_tags = model.n_tags();
    let mut lattice = Lattice::new(n_words, n_tags);

    // === Init (word 0) ===
    let word = model.word_id(sentence[0].as_ref());
    for (t, score) in lattice.column_mut(0).iter_mut().enumerate() {
        *score = match word {
            Some(w) => model.start_transition(t) * model.emission(w, t),
            None => model.start_transition(t),
        };
    }

    // === Recurrence (words 1..N-1) ===
    for i in 1..n_words {
        let word = model.word_id(sentence[i].as_ref());
        for t in 0..n_tags {
            let (best_prev, best_score) = {
                let prev = lattice.column(i - 1);
                let candidates = (0..n_tags).map(|p| match word {
                    Some(w) => prev[p] * model.transition(p, t) * model.emission(w, t),
                    None => prev[p] * model.transition(p, t),
                });
                first_max(candidates).ok_or(HmmError::DegenerateModel)?
            };
            lattice.scores[i * n_tags + t] = best_score;
            lattice.back[(i - 1) * n_tags + t] = best_prev;
        }
    }

    // === Termination ===
    let last = n_words - 1;
    let (mut current, best_score) = first_above_zero_max(lattice.column(last).iter().copied())
        .ok_or(HmmError::AllZeroTerminalScores { length: n_words })?;

    // === Backtracking ===
    let mut best_path = Vec::with_capacity(n_words);
    best_path.push(current);
    for i in (1..n_words).rev() {
        current = lattice.back[(i - 1) * n_tags + current];
        best_path.push(current);
    }
    best_path.reverse();

    Ok(ViterbiResult {
        best_path,
        best_score,
        lattice,
    })
}
