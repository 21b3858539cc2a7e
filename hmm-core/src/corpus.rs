//! # Corpus Reading — `word/tag` Lines
//!
//! Training data is plain text, one sentence per line, tokens separated by
//! whitespace. Each token is `word/tag`; the word itself may contain more
//! slashes, so only the **last** `/`-delimited field is the tag:
//!
//! ```text
//! The/DT 1/2/CD cup/NN
//!         ^^^ ^^
//!         word tag
//! ```
//!
//! Decoding input is the same layout without tags.

use std::io::BufRead;

use serde::{Deserialize, Serialize};

use crate::error::{HmmError, Result};
use crate::model::START_TAG;

/// Separator between the word and its tag inside a corpus token.
pub const SEPARATOR: char = '/';

/// A training sentence: `(word, tag)` pairs in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnnotatedSentence {
    /// `(word, tag)` pairs.
    /// Example: `[("Dog", "N"), ("barks", "V")]`
    pub annotations: Vec<(String, String)>,
}

impl AnnotatedSentence {
    pub fn new(annotations: Vec<(String, String)>) -> Self {
        Self { annotations }
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn words(&self) -> impl Iterator<Item = &str> + '_ {
        self.annotations.iter().map(|(w, _)| w.as_str())
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> + '_ {
        self.annotations.iter().map(|(_, t)| t.as_str())
    }
}

/// Splits a token on its last separator. Returns `None` when there is no
/// separator or when either side is empty.
pub fn split_token(token: &str) -> Option<(&str, &str)> {
    let (word, tag) = token.rsplit_once(SEPARATOR)?;
    if word.is_empty() || tag.is_empty() {
        return None;
    }
    Some((word, tag))
}

/// Parses one corpus line. `line_no` is 1-based and only used in errors.
pub fn parse_annotated_line(line: &str, line_no: usize) -> Result<AnnotatedSentence> {
    let mut annotations = Vec::new();
    for token in line.split_whitespace() {
        let (word, tag) = split_token(token).ok_or_else(|| HmmError::MalformedToken {
            line: line_no,
            token: token.to_string(),
        })?;
        if tag == START_TAG {
            return Err(HmmError::ReservedTag {
                line: line_no,
                token: token.to_string(),
            });
        }
        annotations.push((word.to_string(), tag.to_string()));
    }
    if annotations.is_empty() {
        return Err(HmmError::MalformedLine { line: line_no });
    }
    Ok(AnnotatedSentence { annotations })
}

/// Reads a whole tagged corpus. Any malformed line aborts the read: a
/// partially parsed corpus would silently skew the counts.
pub fn read_corpus<R: BufRead>(reader: R) -> Result<Vec<AnnotatedSentence>> {
    let mut corpus = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        corpus.push(parse_annotated_line(&line?, i + 1)?);
    }
    Ok(corpus)
}

/// Splits an untagged line into words.
pub fn parse_sentence(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

/// Reads untagged sentences, one per line. Blank lines are kept as empty
/// sentences so the output stays aligned with the input; the decoder
/// decides what to do with them.
pub fn read_sentences<R: BufRead>(reader: R) -> Result<Vec<Vec<String>>> {
    reader
        .lines()
        .map(|line| Ok(parse_sentence(&line?)))
        .collect()
}
