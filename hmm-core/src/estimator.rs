//! # Parameter Estimation — Counting and Normalizing
//!
//! Supervised maximum-likelihood estimation with a fixed additive floor
//! [`EPSILON`] on every count:
//!
//! ```text
//! emission[w][t]   = (ε + count(w, t)) / (freq(t) + ε)
//! transition[p][t] = (ε + count(p → t)) / Σ_t' (ε + count(p → t'))
//! ```
//!
//! `freq(t)` is the number of corpus tokens tagged `t`. Dividing by it (and
//! not by the row sum) means an emission row is a relative-likelihood score,
//! not a distribution over tags; that is the model the decoder expects.
//! Transition rows, including the one out of the start context, are proper
//! distributions.
//!
//! ## Accumulators
//!
//! Raw counts live in a [`Counts`] value local to the caller. Counts built over
//! consecutive shards of the corpus merge in shard order without changing
//! either the first-occurrence order of tags and words or the final numbers,
//! so sharded counting on the rayon pool yields the same model as a
//! single pass.

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::debug;

use crate::corpus::AnnotatedSentence;
use crate::model::{HmmModel, Table, EPSILON};
use crate::vocab::Vocabulary;

/// Estimation settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EstimatorConfig {
    /// Count shards of this many sentences in parallel. `None` (or `Some(0)`)
    /// counts the corpus in a single sequential pass.
    pub shard_size: Option<usize>,
}

/// Raw counts gathered from a span of the corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counts {
    tags: Vocabulary,
    words: Vocabulary,
    /// (word, tag) -> occurrences.
    emission: HashMap<(usize, usize), u64>,
    /// (prev, next) -> occurrences.
    transition: HashMap<(usize, usize), u64>,
    /// Sentence-initial occurrences, by tag.
    start: Vec<u64>,
    /// Token occurrences, by tag.
    tag_freq: Vec<u64>,
    sentences: usize,
    tokens: usize,
}

impl Counts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sentences(sentences: &[AnnotatedSentence]) -> Self {
        let mut counts = Self::new();
        for sentence in sentences {
            counts.observe(sentence);
        }
        counts
    }

    pub fn sentences(&self) -> usize {
        self.sentences
    }

    pub fn tokens(&self) -> usize {
        self.tokens
    }

    fn intern_tag(&mut self, tag: &str) -> usize {
        let id = self.tags.intern(tag);
        if id == self.tag_freq.len() {
            self.tag_freq.push(0);
            self.start.push(0);
        }
        id
    }

    /// Adds one tagged sentence.
    pub fn observe(&mut self, sentence: &AnnotatedSentence) {
        let mut prev: Option<usize> = None;
        for (word, tag) in &sentence.annotations {
            let t = self.intern_tag(tag);
            let w = self.words.intern(word);

            *self.emission.entry((w, t)).or_insert(0) += 1;
            self.tag_freq[t] += 1;

            match prev {
                None => self.start[t] += 1,
                Some(p) => *self.transition.entry((p, t)).or_insert(0) += 1,
            }
            prev = Some(t);
        }
        self.sentences += 1;
        self.tokens += sentence.len();
    }

    /// Folds `other` into `self`. `other` must cover sentences that come
    /// after the ones already counted, or the first-occurrence order breaks.
    pub fn merge(&mut self, other: Counts) {
        let tag_map: Vec<usize> = other.tags.iter().map(|t| self.intern_tag(t)).collect();
        let word_map: Vec<usize> = other.words.iter().map(|w| self.words.intern(w)).collect();

        for ((w, t), c) in other.emission {
            *self.emission.entry((word_map[w], tag_map[t])).or_insert(0) += c;
        }
        for ((p, t), c) in other.transition {
            *self.transition.entry((tag_map[p], tag_map[t])).or_insert(0) += c;
        }
        for (t, c) in other.start.into_iter().enumerate() {
            self.start[tag_map[t]] += c;
        }
        for (t, c) in other.tag_freq.into_iter().enumerate() {
            self.tag_freq[tag_map[t]] += c;
        }
        self.sentences += other.sentences;
        self.tokens += other.tokens;
    }

    /// Smooths and normalizes the counts into a model.
    pub fn into_model(self) -> HmmModel {
        let n_tags = self.tags.len();

        let mut emission = Table::filled(self.words.len(), n_tags, EPSILON);
        for (&(w, t), &c) in &self.emission {
            *emission.get_mut(w, t) += c as f64;
        }
        for w in 0..emission.n_rows() {
            for (t, value) in emission.row_mut(w).iter_mut().enumerate() {
                *value /= self.tag_freq[t] as f64 + EPSILON;
            }
        }

        // Row 0 is the start context, row p + 1 is real tag p.
        let mut transition = Table::filled(n_tags + 1, n_tags, EPSILON);
        for (t, &c) in self.start.iter().enumerate() {
            *transition.get_mut(0, t) += c as f64;
        }
        for (&(p, t), &c) in &self.transition {
            *transition.get_mut(p + 1, t) += c as f64;
        }
        for r in 0..transition.n_rows() {
            let row = transition.row_mut(r);
            let total: f64 = row.iter().sum();
            for value in row.iter_mut() {
                *value /= total;
            }
        }

        debug!(
            sentences = self.sentences,
            tokens = self.tokens,
            tags = n_tags,
            words = self.words.len(),
            "normalized counts"
        );

        HmmModel::from_parts(self.tags, 0, self.words, emission, transition)
    }
}

/// Estimates a model from a tagged corpus in one sequential pass.
///
/// An empty corpus yields a model whose only tag is the start context; decoding
/// against it fails with [`HmmError::DegenerateModel`](crate::HmmError::DegenerateModel).
pub fn estimate(corpus: &[AnnotatedSentence]) -> HmmModel {
    Counts::from_sentences(corpus).into_model()
}

/// Estimates a model, optionally counting corpus shards in parallel.
pub fn estimate_with(corpus: &[AnnotatedSentence], config: &EstimatorConfig) -> HmmModel {
    match config.shard_size {
        Some(shard_size) if shard_size > 0 && corpus.len() > shard_size => {
            let shards: Vec<Counts> = corpus
                .par_chunks(shard_size)
                .map(Counts::from_sentences)
                .collect();
            debug!(shards = shards.len(), shard_size, "counted corpus shards");
            let mut merged = Counts::new();
            for shard in shards {
                merged.merge(shard);
            }
            merged.into_model()
        }
        _ => estimate(corpus),
    }
}

impl HmmModel {
    /// Trains a model on `corpus`. Shorthand for [`estimate`].
    pub fn train(corpus: &[AnnotatedSentence]) -> Self {
        estimate(corpus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::parse_annotated_line;
    use crate::model::START_TAG;

    fn corpus(lines: &[&str]) -> Vec<AnnotatedSentence> {
        lines
            .iter()
            .enumerate()
            .map(|(i, l)| parse_annotated_line(l, i + 1).unwrap())
            .collect()
    }

    fn sample_corpus() -> Vec<AnnotatedSentence> {
        corpus(&[
            "The/DT dog/NN barks/VBZ ./.",
            "A/DT cat/NN sleeps/VBZ ./.",
            "Dogs/NNS bark/VBP at/IN the/DT cat/NN ./.",
            "The/DT cat/NN and/CC the/DT dog/NN play/VBP ./.",
            "Time/NN flies/VBZ like/IN an/DT arrow/NN ./.",
            "1/2/CD cup/NN ./.",
        ])
    }

    #[test]
    fn test_dog_barks_tables() {
        let model = estimate(&corpus(&["Dog/N barks/V"]));
        assert_eq!(model.tag_order(), vec![START_TAG, "N", "V"]);

        let n = model.tag_id("N").unwrap();
        let v = model.tag_id("V").unwrap();
        let expected_start_n = (1.0 + EPSILON) / (1.0 + 2.0 * EPSILON);
        let expected_start_v = EPSILON / (1.0 + 2.0 * EPSILON);
        assert!((model.start_transition(n) - expected_start_n).abs() < 1e-15);
        assert!((model.start_transition(v) - expected_start_v).abs() < 1e-20);

        let dog = model.word_id("Dog").unwrap();
        let barks = model.word_id("barks").unwrap();
        assert!((model.emission(dog, n) - 1.0).abs() < 1e-15);
        assert!((model.emission(dog, v) - EPSILON / (1.0 + EPSILON)).abs() < 1e-20);
        assert!((model.emission(barks, v) - 1.0).abs() < 1e-15);
        assert!((model.emission(barks, n) - EPSILON / (1.0 + EPSILON)).abs() < 1e-20);
    }

    #[test]
    fn test_transition_rows_sum_to_one() {
        let model = estimate(&sample_corpus());
        let sum: f64 = model.start_transition_row().iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        for p in 0..model.n_tags() {
            let sum: f64 = model.transition_row(p).iter().sum();
            assert!((sum - 1.0).abs() < 1e-9, "row {} sums to {}", p, sum);
            assert!(model.transition_row(p).iter().all(|&x| x > 0.0));
        }
    }

    #[test]
    fn test_emission_entries_are_floored_and_finite() {
        let corpus = sample_corpus();
        let tokens = Counts::from_sentences(&corpus).tokens() as f64;
        let model = estimate(&corpus);
        // An unseen pair scores ε / (freq(t) + ε), and freq(t) never exceeds the token count.
        let floor = EPSILON / (tokens + EPSILON);
        for w in 0..model.words().len() {
            for &x in model.emission_row(w) {
                assert!(x.is_finite());
                assert!(x >= floor, "entry {} below floor", x);
            }
        }
    }

    #[test]
    fn test_emission_uses_global_tag_frequency() {
        // NN occurs 8 times; "cat" is NN 3 times.
        let model = estimate(&sample_corpus());
        let nn = model.tag_id("NN").unwrap();
        let cat = model.word_id("cat").unwrap();
        let expected = (3.0 + EPSILON) / (8.0 + EPSILON);
        assert!((model.emission(cat, nn) - expected).abs() < 1e-12);
        let row_sum: f64 = model.emission_row(cat).iter().sum();
        assert!((row_sum - 1.0).abs() > 1e-3);
    }

    #[test]
    fn test_vocabulary_in_first_occurrence_order() {
        let model = estimate(&sample_corpus());
        let order = model.tag_order();
        assert_eq!(&order[..5], &[START_TAG, "DT", "NN", "VBZ", "."]);
        assert_eq!(model.words().label(0), "The");
        assert!(model.word_id("1/2").is_some());
    }

    #[test]
    fn test_empty_corpus_is_degenerate() {
        let model = estimate(&[]);
        assert!(model.is_degenerate());
        assert_eq!(model.tag_order(), vec![START_TAG]);
        assert!(model.words().is_empty());
    }

    #[test]
    fn test_sharded_estimation_matches_sequential() {
        let corpus = sample_corpus();
        let sequential = estimate(&corpus);
        for shard_size in [1, 2, 4] {
            let sharded = estimate_with(
                &corpus,
                &EstimatorConfig {
                    shard_size: Some(shard_size),
                },
            );
            assert_eq!(sharded, sequential, "shard size {}", shard_size);
        }
    }

    #[test]
    fn test_merge_keeps_counts() {
        let corpus = sample_corpus();
        let mut merged = Counts::from_sentences(&corpus[..2]);
        merged.merge(Counts::from_sentences(&corpus[2..]));
        assert_eq!(merged.sentences(), corpus.len());
        assert_eq!(merged.tokens(), corpus.iter().map(|s| s.len()).sum::<usize>());
        assert_eq!(merged.into_model(), estimate(&corpus));
    }
}
