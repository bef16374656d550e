//! Spanish defaults for EAGLES tags, e.g. `ncfs000` for a feminine singular common noun.
//! Chunk grammar and transfer rules match tags by their lowercase category prefix.

use super::ERROR_MSG;
use crate::components::{
    chunker::{ChunkGrammar, Chunker},
    dictionary::DictionaryOptions,
    tagger::{learn::LearnerOptions, LexiconOptions},
    transfer::SyntacticTransfer,
};

pub fn learner_options() -> LearnerOptions {
    config!(LearnerOptions, "es", "learner").expect(ERROR_MSG)
}

pub fn lexicon_options() -> LexiconOptions {
    config!(LexiconOptions, "es", "lexicon").expect(ERROR_MSG)
}

pub fn dictionary_options() -> DictionaryOptions {
    config!(DictionaryOptions, "es", "dictionary").expect(ERROR_MSG)
}

/// Noun, verb, prepositional, adjective and adverb phrases, in this priority.
pub fn chunk_grammar() -> ChunkGrammar {
    config!(ChunkGrammar, "es", "chunker").expect(ERROR_MSG)
}

pub fn chunker() -> Chunker {
    Chunker::new(chunk_grammar()).expect(ERROR_MSG)
}

/// Moves adjectives in front of the noun they follow.
pub fn syntactic_transfer() -> SyntacticTransfer {
    config!(SyntacticTransfer, "es", "transfer").expect(ERROR_MSG)
}
