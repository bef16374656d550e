//! Rule-based Spanish to English translation.
//! # Overview
//!
//! traducir translates a sentence in four strictly sequential stages:
//! - A [Tagger][components::tagger::Tagger] assigns part-of-speech tags: every word first gets its most likely
//! tag from a [Lexicon][components::tagger::Lexicon], then an ordered list of transformation rules learned by
//! the [Learner][components::tagger::learn::Learner] (transformation-based learning) corrects them.
//! - A [Chunker][components::chunker::Chunker] groups the tagged tokens into a flat [ShallowTree][types::ShallowTree].
//! - [SyntacticTransfer][components::transfer::SyntacticTransfer] reorders chunks and tokens towards English word order.
//! - A [Dictionary][components::dictionary::Dictionary] substitutes every source word with an English form.
//!
//! The [Translator][pipeline::Translator] composes all of them.
//!
//! # Examples
//!
//! Train a tagger and translate a sentence:
//!
//! ```
//! use traducir::components::{dictionary::Dictionary, tagger::learn::Learner};
//! use traducir::{lang::es, pipeline::Translator, types::tokens_from};
//!
//! let corpus = vec![
//!     vec![("la", "da"), ("casa", "n"), ("roja", "a")],
//!     vec![("el", "da"), ("perro", "n"), ("come", "v")],
//! ];
//! let tagger = Learner::new(es::learner_options())?.train(&corpus, es::lexicon_options())?;
//!
//! let dictionary: Dictionary = vec![("la", "the"), ("casa", "house"), ("roja", "red")]
//!     .into_iter()
//!     .collect();
//!
//! let translator = Translator::new(tagger, es::chunker(), es::syntactic_transfer(), dictionary);
//! let translation = translator.translate_tokens(&tokens_from(vec!["la", "casa", "roja"]))?;
//!
//! assert_eq!(translation.words(), vec!["the", "red", "house"]);
//! # Ok::<(), traducir::Error>(())
//! ```

// #![warn(missing_docs)]
use std::io;

use thiserror::Error;

#[cfg(feature = "compile")]
pub mod compile;
pub mod components;
#[macro_use]
pub mod lang;
pub mod pipeline;
pub mod rule;
pub mod types;
pub(crate) mod utils;

pub use components::{
    chunker::Chunker,
    dictionary::Dictionary,
    tagger::{learn::Learner, Tagger},
    transfer::SyntacticTransfer,
};
pub use pipeline::{Translation, Translator};

/// Errors in the static configuration of a component. These are fatal and
/// reported when the component is constructed, never while translating.
#[derive(Error, Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum ConfigError {
    #[error("the tag set must contain at least one tag")]
    EmptyTagSet,
    #[error("the fallback tag for unknown words must not be empty")]
    EmptyFallbackTag,
    #[error("tag '{0}' is listed more than once")]
    DuplicateTag(String),
    #[error("the learner needs at least one rule template")]
    EmptyTemplateSet,
    #[error("rule template '{0}' is listed more than once")]
    DuplicateTemplate(String),
    #[error("the minimum rule score must be at least one")]
    ZeroMinScore,
    #[error("rule #{index} references tag id {id} outside of the tag set")]
    UnknownTagId { index: usize, id: u16 },
    #[error("the chunk grammar must contain at least one rule")]
    EmptyChunkGrammar,
    #[error("the chunk grammar supports at most {max} rules, got {found}")]
    TooManyChunkRules { max: usize, found: usize },
    #[error("chunk rule for {0} has no start patterns")]
    ChunkRuleWithoutStart(String),
    #[error("chunk kind {0} has more than one rule")]
    DuplicateChunkKind(String),
    #[error("unknown chunk label '{0}'")]
    UnknownChunkLabel(String),
    #[error("invalid tag matcher '{0}'")]
    InvalidTagMatcher(String),
    #[error("syntactic rule '{name}' matches chunks but sets the token level option `{option}`")]
    TokenLevelOption { name: String, option: String },
    #[error("syntactic rule '{0}' has an empty pattern")]
    EmptyPattern(String),
    #[error("syntactic rule '{name}' does not output a permutation of its pattern: {reason}")]
    NotAPermutation { name: String, reason: String },
}

/// Violations of the guarantees a pipeline stage makes about its output.
/// These indicate a bug in a component or its rules, not bad input.
#[derive(Error, Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum InvariantError {
    #[error("chunks do not reproduce the input tokens: expected positions {expected:?}, found {found:?}")]
    ChunkMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    #[error("syntactic transfer output is not a permutation of its input: expected positions {expected:?}, found {found:?}")]
    NotAPermutation {
        expected: Vec<usize>,
        found: Vec<usize>,
    },
}

#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    /// (De)serialization error. Can have occured during deserialization or during serialization.
    #[error(transparent)]
    Serialization(#[from] bincode::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Invariant(#[from] InvariantError),
    #[error("tag '{0}' is not part of the tag set")]
    UnknownTag(String),
    #[error("failed to translate sentence \"{sentence}\"")]
    Sentence {
        sentence: String,
        #[source]
        source: InvariantError,
    },
    #[error("{path}:{line}: {message}")]
    Parse {
        path: String,
        line: usize,
        message: String,
    },
}
