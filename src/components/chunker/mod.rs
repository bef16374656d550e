//! A shallow parser grouping tagged tokens into a flat sequence of labeled chunks.
//!
//! Chunking is a single left-to-right scan. The scanner is either outside of any chunk or inside the chunk of
//! exactly one [ChunkRule]. A token which cannot continue the current chunk closes it and opens the chunk of the
//! first rule (in grammar order) which can start at its tag. If no rule can start at the tag, the token becomes a
//! single-token [ChunkKind::Other] chunk.

use serde::{Deserialize, Serialize};
use std::{collections::HashSet, convert::TryFrom, mem, num::NonZeroUsize};

use crate::{
    types::{Chunk, ChunkKind, ShallowTree, Tag, TagMatcher, TaggedSentence, TaggedToken},
    ConfigError, InvariantError,
};

use super::Component;

/// The transition table is a bit set over rules.
const MAX_RULES: usize = 64;

/// How one kind of chunk starts and continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRule {
    pub kind: ChunkKind,
    /// Tags which can open a chunk of this kind.
    pub starts: Vec<TagMatcher>,
    /// Tags which can extend an open chunk of this kind.
    #[serde(default)]
    pub continues: Vec<TagMatcher>,
    /// The maximum number of tokens in one chunk. Unbounded if not set.
    #[serde(default)]
    pub max_len: Option<NonZeroUsize>,
}

impl ChunkRule {
    /// Creates a rule from tag matcher strings, see [TagMatcher].
    pub fn new<S: AsRef<str>>(
        kind: ChunkKind,
        starts: &[S],
        continues: &[S],
    ) -> Result<Self, ConfigError> {
        let parse = |matchers: &[S]| {
            matchers
                .iter()
                .map(|x| x.as_ref().parse())
                .collect::<Result<Vec<TagMatcher>, _>>()
        };

        Ok(ChunkRule {
            kind,
            starts: parse(starts)?,
            continues: parse(continues)?,
            max_len: None,
        })
    }

    pub fn with_max_len(mut self, max_len: NonZeroUsize) -> Self {
        self.max_len = Some(max_len);
        self
    }

    fn can_start(&self, tag: &Tag) -> bool {
        self.starts.iter().any(|x| x.is_match(tag))
    }

    fn can_continue(&self, tag: &Tag) -> bool {
        self.continues.iter().any(|x| x.is_match(tag))
    }
}

/// An ordered list of chunk rules. The order is the priority for tags which can start more than one kind of chunk.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChunkGrammar {
    pub rules: Vec<ChunkRule>,
}

impl ChunkGrammar {
    /// Checks that the grammar can be used by a [Chunker].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rules.is_empty() {
            return Err(ConfigError::EmptyChunkGrammar);
        }

        if self.rules.len() > MAX_RULES {
            return Err(ConfigError::TooManyChunkRules {
                max: MAX_RULES,
                found: self.rules.len(),
            });
        }

        let mut kinds = HashSet::new();
        for rule in &self.rules {
            if rule.starts.is_empty() {
                return Err(ConfigError::ChunkRuleWithoutStart(rule.kind.to_string()));
            }

            if !kinds.insert(rule.kind) {
                return Err(ConfigError::DuplicateChunkKind(rule.kind.to_string()));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Outside,
    Inside { rule: usize, len: usize },
}

/// What a tag can do: the rule it opens a chunk of, if any, and the set of rules whose chunks it can extend.
#[derive(Debug, Clone, Copy)]
struct TagClass {
    opens: Option<usize>,
    continues: u64,
}

/// Splits tagged sentences into chunks according to a [ChunkGrammar].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ChunkGrammar", into = "ChunkGrammar")]
pub struct Chunker {
    grammar: ChunkGrammar,
}

impl TryFrom<ChunkGrammar> for Chunker {
    type Error = ConfigError;

    fn try_from(grammar: ChunkGrammar) -> Result<Self, Self::Error> {
        Chunker::new(grammar)
    }
}

impl From<Chunker> for ChunkGrammar {
    fn from(chunker: Chunker) -> Self {
        chunker.grammar
    }
}

impl Component for Chunker {
    fn name() -> &'static str {
        "chunker"
    }
}

impl Chunker {
    /// Creates a new chunker.
    ///
    /// # Errors
    /// - If the grammar is empty or has more rules than supported.
    /// - If a rule has no start patterns.
    /// - If two rules have the same kind.
    pub fn new(grammar: ChunkGrammar) -> Result<Self, ConfigError> {
        grammar.validate()?;
        Ok(Chunker { grammar })
    }

    pub fn grammar(&self) -> &ChunkGrammar {
        &self.grammar
    }

    fn classify(&self, tag: &Tag) -> TagClass {
        let rules = &self.grammar.rules;

        TagClass {
            opens: rules.iter().position(|rule| rule.can_start(tag)),
            continues: rules
                .iter()
                .enumerate()
                .filter(|(_, rule)| rule.can_continue(tag))
                .fold(0, |mask, (i, _)| mask | 1u64 << i),
        }
    }

    fn close(&self, state: State, current: &mut Vec<TaggedToken>, chunks: &mut Vec<Chunk>) {
        if let State::Inside { rule, .. } = state {
            chunks.push(Chunk::new(self.grammar.rules[rule].kind, mem::take(current)));
        }
    }

    /// Chunks a tagged sentence.
    ///
    /// # Errors
    /// - If the chunks do not reproduce the input tokens in order. This is a bug, not a property of the input.
    pub fn chunk(&self, sentence: TaggedSentence) -> Result<ShallowTree, InvariantError> {
        let expected: Vec<usize> = sentence.iter().map(TaggedToken::position).collect();

        let mut chunks = Vec::new();
        let mut current = Vec::new();
        let mut state = State::Outside;

        for token in sentence {
            let class = self.classify(token.tag());

            state = match state {
                State::Inside { rule, len }
                    if class.continues & (1u64 << rule) != 0
                        && self.grammar.rules[rule]
                            .max_len
                            .map_or(true, |max| len < max.get()) =>
                {
                    current.push(token);
                    State::Inside { rule, len: len + 1 }
                }
                _ => {
                    self.close(state, &mut current, &mut chunks);

                    match class.opens {
                        Some(rule) => {
                            current.push(token);
                            State::Inside { rule, len: 1 }
                        }
                        None => {
                            chunks.push(Chunk::new(ChunkKind::Other, vec![token]));
                            State::Outside
                        }
                    }
                }
            };
        }
        self.close(state, &mut current, &mut chunks);

        let tree = ShallowTree::new(chunks);
        let found = tree.positions();

        if found != expected {
            return Err(InvariantError::ChunkMismatch { expected, found });
        }

        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Origin, Token};

    fn grammar() -> ChunkGrammar {
        ChunkGrammar {
            rules: vec![
                ChunkRule::new(ChunkKind::NounPhrase, &["d", "n"], &["n", "a"]).unwrap(),
                ChunkRule::new(ChunkKind::VerbPhrase, &["v"], &["v"]).unwrap(),
                ChunkRule::new(ChunkKind::AdjectivePhrase, &["a", "n"], &["a"]).unwrap(),
            ],
        }
    }

    fn sentence(tagged: &[(&str, &str)]) -> TaggedSentence {
        tagged
            .iter()
            .enumerate()
            .map(|(i, (word, tag))| TaggedToken::new(Token::new(*word, i), *tag, Origin::Lexicon))
            .collect()
    }

    fn labels(tree: &ShallowTree) -> Vec<(ChunkKind, usize)> {
        tree.chunks().iter().map(|x| (x.kind(), x.len())).collect()
    }

    #[test]
    fn chunks_by_grammar() {
        let chunker = Chunker::new(grammar()).unwrap();
        let tree = chunker
            .chunk(sentence(&[
                ("el", "da"),
                ("perro", "ncms000"),
                ("negro", "aq0ms0"),
                ("come", "vmip3s0"),
                (".", "Fp"),
                ("rojo", "aq0ms0"),
            ]))
            .unwrap();

        assert_eq!(
            labels(&tree),
            vec![
                (ChunkKind::NounPhrase, 3),
                (ChunkKind::VerbPhrase, 1),
                (ChunkKind::Other, 1),
                (ChunkKind::AdjectivePhrase, 1),
            ]
        );
        assert_eq!(
            tree.to_string(),
            "(S (NP el/da perro/ncms000 negro/aq0ms0) (VP come/vmip3s0) (O ./Fp) (AdjP rojo/aq0ms0))"
        );
    }

    #[test]
    fn priority_decides_ambiguous_starts() {
        // `n` starts both NP and AdjP, NP comes first
        let chunker = Chunker::new(grammar()).unwrap();
        let tree = chunker.chunk(sentence(&[("casa", "n")])).unwrap();
        assert_eq!(labels(&tree), vec![(ChunkKind::NounPhrase, 1)]);

        let mut reversed = grammar();
        reversed.rules.reverse();
        let tree = Chunker::new(reversed)
            .unwrap()
            .chunk(sentence(&[("casa", "n")]))
            .unwrap();
        assert_eq!(labels(&tree), vec![(ChunkKind::AdjectivePhrase, 1)]);
    }

    #[test]
    fn non_continuing_tag_opens_new_chunk() {
        let chunker = Chunker::new(grammar()).unwrap();
        let tree = chunker
            .chunk(sentence(&[("la", "d"), ("el", "d"), ("casa", "n")]))
            .unwrap();

        assert_eq!(
            labels(&tree),
            vec![(ChunkKind::NounPhrase, 1), (ChunkKind::NounPhrase, 2)]
        );
    }

    #[test]
    fn max_len_splits_chunks() {
        let mut grammar = grammar();
        grammar.rules[1] = grammar.rules[1]
            .clone()
            .with_max_len(NonZeroUsize::new(2).unwrap());
        let chunker = Chunker::new(grammar).unwrap();

        let tree = chunker
            .chunk(sentence(&[("ha", "v"), ("sido", "v"), ("visto", "v")]))
            .unwrap();
        assert_eq!(
            labels(&tree),
            vec![(ChunkKind::VerbPhrase, 2), (ChunkKind::VerbPhrase, 1)]
        );
    }

    #[test]
    fn empty_sentence() {
        let chunker = Chunker::new(grammar()).unwrap();
        assert!(chunker.chunk(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn rejects_invalid_grammars() {
        assert_eq!(
            Chunker::new(ChunkGrammar::default()).unwrap_err(),
            ConfigError::EmptyChunkGrammar
        );

        let mut grammar = grammar();
        grammar.rules[0].starts.clear();
        assert_eq!(
            Chunker::new(grammar).unwrap_err(),
            ConfigError::ChunkRuleWithoutStart("NP".into())
        );

        let mut grammar = self::grammar();
        grammar.rules.push(grammar.rules[0].clone());
        assert_eq!(
            Chunker::new(grammar).unwrap_err(),
            ConfigError::DuplicateChunkKind("NP".into())
        );

        assert!(matches!(
            ChunkRule::new(ChunkKind::NounPhrase, &["="], &[]),
            Err(ConfigError::InvalidTagMatcher(_))
        ));
    }

    #[test]
    fn deserialization_validates() {
        let chunker = Chunker::new(grammar()).unwrap();
        let bytes = bincode::serialize(&chunker).unwrap();
        let restored: Chunker = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored.grammar(), chunker.grammar());

        let json = r#"{"rules": [{"kind": "NP", "starts": []}]}"#;
        assert!(serde_json::from_str::<Chunker>(json).is_err());
    }
}
