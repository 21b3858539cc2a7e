//! # Tagger — Words In, `word/tag` Out
//!
//! [`HmmTagger`] owns a trained model and turns sentences into
//! [`DecodeResult`]s. Each sentence is decoded independently against the
//! read-only model, so a batch can be spread over the rayon pool; results
//! come back in input order either way.

use std::fmt;
use std::io::{self, Write};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::corpus::SEPARATOR;
use crate::error::Result;
use crate::model::HmmModel;
use crate::viterbi::viterbi_decode;

/// A word with its predicted tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedToken {
    pub word: String,
    pub tag: String,
}

impl fmt::Display for TaggedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.word, SEPARATOR, self.tag)
    }
}

/// Tagged sentence, same length and order as the input.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DecodeResult {
    pub tokens: Vec<TaggedToken>,
}

impl DecodeResult {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> + '_ {
        self.tokens.iter().map(|t| t.tag.as_str())
    }
}

/// Renders `word/tag` tokens separated by single spaces.
impl fmt::Display for DecodeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", token)?;
        }
        Ok(())
    }
}

/// Batch decoding settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Decode sentences on the rayon pool instead of one by one.
    pub parallel: bool,
}

/// Decoder facade over a trained model.
#[derive(Debug, Clone)]
pub struct HmmTagger {
    model: HmmModel,
}

impl HmmTagger {
    pub fn new(model: HmmModel) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &HmmModel {
        &self.model
    }

    /// Tags one sentence.
    pub fn tag<S: AsRef<str>>(&self, sentence: &[S]) -> Result<DecodeResult> {
        let result = viterbi_decode(&self.model, sentence)?;
        let tokens = sentence
            .iter()
            .zip(result.best_path)
            .map(|(word, tag)| TaggedToken {
                word: word.as_ref().to_string(),
                tag: self.model.tag_label(tag).to_string(),
            })
            .collect();
        Ok(DecodeResult { tokens })
    }

    /// Tags every sentence, keeping input order. A failing sentence does not
    /// stop the others; the caller decides whether one failure aborts the batch.
    pub fn tag_all<S>(&self, sentences: &[Vec<S>], options: DecodeOptions) -> Vec<Result<DecodeResult>>
    where
        S: AsRef<str> + Sync,
    {
        if options.parallel {
            sentences.par_iter().map(|s| self.tag(s)).collect()
        } else {
            sentences.iter().map(|s| self.tag(s)).collect()
        }
    }
}

/// Writes one line per result.
pub fn write_results<'a, W, I>(mut writer: W, results: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a DecodeResult>,
{
    for result in results {
        writeln!(writer, "{}", result)?;
    }
    writer.flush()
}
