//! # Evaluation — Token Accuracy Against a Gold Corpus
//!
//! The gold sentences are stripped of their tags, decoded, and compared token
//! by token. Accuracy on words unseen in training is reported separately,
//! since for those the decoder relies on transitions only.

use serde::Serialize;
use tracing::warn;

use crate::corpus::AnnotatedSentence;
use crate::tagger::{DecodeOptions, HmmTagger};

/// Counters produced by [`evaluate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub sentences: usize,
    pub tokens: usize,
    pub correct: usize,
    /// Tokens whose word is not in the model vocabulary.
    pub unknown_tokens: usize,
    pub unknown_correct: usize,
    /// Sentences the decoder could not tag; all their tokens count as wrong.
    pub failed_sentences: usize,
}

impl Evaluation {
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct, self.tokens)
    }

    pub fn unknown_accuracy(&self) -> f64 {
        ratio(self.unknown_correct, self.unknown_tokens)
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Decodes every gold sentence and counts matching tags.
pub fn evaluate(tagger: &HmmTagger, gold: &[AnnotatedSentence], options: DecodeOptions) -> Evaluation {
    let sentences: Vec<Vec<&str>> = gold.iter().map(|s| s.words().collect()).collect();
    let predictions = tagger.tag_all(&sentences, options);

    let mut eval = Evaluation {
        sentences: gold.len(),
        ..Default::default()
    };
    for (i, (reference, predicted)) in gold.iter().zip(predictions).enumerate() {
        eval.tokens += reference.len();
        for word in reference.words() {
            if tagger.model().word_id(word).is_none() {
                eval.unknown_tokens += 1;
            }
        }
        let predicted = match predicted {
            Ok(predicted) => predicted,
            Err(e) => {
                warn!(sentence = i + 1, error = %e, "could not decode gold sentence");
                eval.failed_sentences += 1;
                continue;
            }
        };
        for ((word, gold_tag), tag) in reference.annotations.iter().zip(predicted.tags()) {
            if gold_tag == tag {
                eval.correct += 1;
                if tagger.model().word_id(word).is_none() {
                    eval.unknown_correct += 1;
                }
            }
        }
    }
    eval
}
