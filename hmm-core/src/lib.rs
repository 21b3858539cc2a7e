//! # hmm-core — First-Order HMM Tagger
//!
//! This crate estimates a Hidden Markov Model from a `word/tag` corpus and
//! labels new sentences with their most probable tag sequence.
//!
//! ## Architecture
//!
//! Data flows through the modules in one direction:
//!
//! 1.  **Input**: tagged lines ([`corpus`]), `word/tag` split on the last `/`.
//! 2.  **Estimation** ([`estimator`]): counts with an ε floor, normalized into
//!     emission and transition tables.
//! 3.  **Model** ([`model`]): immutable, integer-indexed tables; saved and
//!     loaded as a versioned JSON record ([`persist`]).
//! 4.  **Decoding** ([`viterbi`]): max-product dynamic programming with
//!     backpointers; ties are broken by tag order ([`argmax`]).
//! 5.  **Output** ([`tagger`]): `word/tag` tokens, one sentence per line.
//!
//! ## Example
//!
//! ```rust
//! use hmm_core::{corpus::parse_annotated_line, HmmModel, HmmTagger};
//!
//! // 1. Train on a tiny corpus
//! let corpus = vec![parse_annotated_line("Dog/N barks/V", 1).unwrap()];
//! let model = HmmModel::train(&corpus);
//!
//! // 2. Decode a new sentence
//! let tagger = HmmTagger::new(model);
//! let result = tagger.tag(&["Dog", "barks"]).unwrap();
//! assert_eq!(result.to_string(), "Dog/N barks/V");
//! ```

pub mod argmax;
pub mod corpus;
pub mod error;
pub mod estimator;
pub mod eval;
pub mod model;
pub mod persist;
pub mod tagger;
pub mod viterbi;
pub mod vocab;

pub use corpus::AnnotatedSentence;
pub use error::{HmmError, Result};
pub use estimator::{estimate, estimate_with, EstimatorConfig};
pub use model::{HmmModel, EPSILON, START_TAG};
pub use persist::ModelRecord;
pub use tagger::{DecodeOptions, DecodeResult, HmmTagger, TaggedToken};
pub use viterbi::{viterbi_decode, ViterbiResult};
