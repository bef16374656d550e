//! Syntactic transfer: reordering a [ShallowTree] towards target language word order.
//!
//! A [SyntacticRule] matches a contiguous sequence of chunk labels or of token tags and permutes the matched
//! elements. Rules are applied in priority order, each in one left-to-right pass over the result of the previous
//! rules. Matches of one rule never overlap and elements rewritten by any rule are claimed: no later match at the
//! same level may include them, so every chunk and every token is moved by at most one rewrite of each level and
//! no rule ever sees its own output. Moving whole chunks keeps their inner order, so a chunk level rewrite never
//! conflicts with a token level rewrite.
//!
//! A token level rewrite spanning several chunks fuses them into one chunk labeled like the first of them.

use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt, iter};

use crate::{
    types::{Chunk, ChunkKind, ShallowTree, TagMatcher, TaggedToken},
    ConfigError, InvariantError,
};

use super::Component;

/// What the pattern of a rule is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// The labels of consecutive chunks.
    Chunk,
    /// The tags of consecutive tokens.
    Token,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    Chunks(Vec<ChunkKind>),
    Tokens(Vec<TagMatcher>),
}

impl Pattern {
    pub fn level(&self) -> Level {
        match self {
            Pattern::Chunks(_) => Level::Chunk,
            Pattern::Tokens(_) => Level::Token,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Pattern::Chunks(kinds) => kinds.len(),
            Pattern::Tokens(matchers) => matchers.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn labels(&self) -> Vec<String> {
        match self {
            Pattern::Chunks(kinds) => kinds.iter().map(|x| x.to_string()).collect(),
            Pattern::Tokens(matchers) => matchers.iter().map(|x| x.to_string()).collect(),
        }
    }
}

/// The serialized form of a [SyntacticRule]: the pattern and its rewritten order as label sequences, like
/// `["n", "a"] -> ["a", "n"]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntacticRuleData {
    pub name: String,
    pub level: Level,
    pub pattern: Vec<String>,
    pub output: Vec<String>,
    #[serde(default)]
    pub within: Vec<ChunkKind>,
    #[serde(default)]
    pub single_chunk: bool,
}

/// A rewrite of a contiguous sequence of chunks or tokens into a permutation of itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SyntacticRuleData", into = "SyntacticRuleData")]
pub struct SyntacticRule {
    name: String,
    pattern: Pattern,
    order: Vec<usize>,
    within: Vec<ChunkKind>,
    single_chunk: bool,
}

impl TryFrom<SyntacticRuleData> for SyntacticRule {
    type Error = ConfigError;

    fn try_from(data: SyntacticRuleData) -> Result<Self, Self::Error> {
        if data.level == Level::Chunk {
            let option = match (data.within.is_empty(), data.single_chunk) {
                (false, _) => Some("within"),
                (true, true) => Some("single_chunk"),
                (true, false) => None,
            };

            if let Some(option) = option {
                return Err(ConfigError::TokenLevelOption {
                    name: data.name,
                    option: option.to_string(),
                });
            }
        }

        let rule =
            SyntacticRule::from_labels(&data.name, data.level, &data.pattern, &data.output)?;
        Ok(rule.within(data.within).single_chunk(data.single_chunk))
    }
}

impl From<SyntacticRule> for SyntacticRuleData {
    fn from(rule: SyntacticRule) -> Self {
        let labels = rule.pattern.labels();
        let level = rule.pattern.level();
        let is_token_level = level == Level::Token;

        SyntacticRuleData {
            level,
            output: rule.order.iter().map(|i| labels[*i].clone()).collect(),
            pattern: labels,
            name: rule.name,
            within: if is_token_level { rule.within } else { Vec::new() },
            single_chunk: is_token_level && rule.single_chunk,
        }
    }
}

impl SyntacticRule {
    /// Creates a new rule. `order[i]` is the index of the pattern element which ends up at position `i`.
    ///
    /// # Errors
    /// - If the pattern is empty.
    /// - If `order` is not a permutation of the pattern indices.
    pub fn new<S: Into<String>>(
        name: S,
        pattern: Pattern,
        order: Vec<usize>,
    ) -> Result<Self, ConfigError> {
        let name = name.into();

        if pattern.is_empty() {
            return Err(ConfigError::EmptyPattern(name));
        }

        if order.len() != pattern.len() {
            return Err(ConfigError::NotAPermutation {
                reason: format!(
                    "the output has {} elements but the pattern has {}",
                    order.len(),
                    pattern.len()
                ),
                name,
            });
        }

        let mut seen = vec![false; order.len()];
        for i in &order {
            match seen.get_mut(*i) {
                Some(x) if !*x => *x = true,
                _ => {
                    return Err(ConfigError::NotAPermutation {
                        reason: format!("index {} is out of range or repeated", i),
                        name,
                    })
                }
            }
        }

        Ok(SyntacticRule {
            name,
            pattern,
            order,
            within: Vec::new(),
            single_chunk: false,
        })
    }

    /// Creates a rule from a pattern and the same labels in their new order, e.g. `["n", "a"]` and `["a", "n"]`.
    /// Repeated labels keep their relative order.
    ///
    /// # Errors
    /// - If a label can not be parsed at the given level.
    /// - If the output adds or drops labels.
    pub fn from_labels<S: AsRef<str>>(
        name: &str,
        level: Level,
        pattern: &[S],
        output: &[S],
    ) -> Result<Self, ConfigError> {
        let pattern = match level {
            Level::Chunk => Pattern::Chunks(
                pattern
                    .iter()
                    .map(|x| x.as_ref().trim().parse())
                    .collect::<Result<_, _>>()?,
            ),
            Level::Token => Pattern::Tokens(
                pattern
                    .iter()
                    .map(|x| x.as_ref().parse())
                    .collect::<Result<_, _>>()?,
            ),
        };
        let labels = pattern.labels();

        let mut used = vec![false; labels.len()];
        let mut order = Vec::with_capacity(output.len());

        for label in output {
            // normalize the label the same way the pattern was parsed
            let label = match level {
                Level::Chunk => label.as_ref().trim().parse::<ChunkKind>()?.to_string(),
                Level::Token => label.as_ref().parse::<TagMatcher>()?.to_string(),
            };

            let index = labels
                .iter()
                .enumerate()
                .position(|(i, x)| !used[i] && *x == label)
                .ok_or_else(|| ConfigError::NotAPermutation {
                    name: name.to_string(),
                    reason: format!("'{}' is not left in the pattern", label),
                })?;

            used[index] = true;
            order.push(index);
        }

        SyntacticRule::new(name, pattern, order)
    }

    /// Restricts a token level rule to tokens inside chunks of the given kinds. No restriction if empty.
    /// Chunk level rules ignore it.
    pub fn within(mut self, kinds: Vec<ChunkKind>) -> Self {
        self.within = kinds;
        self
    }

    /// Restricts a token level rule to matches inside a single chunk. Chunk level rules ignore it.
    pub fn single_chunk(mut self, single_chunk: bool) -> Self {
        self.single_chunk = single_chunk;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    fn allows(&self, kind: ChunkKind) -> bool {
        self.within.is_empty() || self.within.contains(&kind)
    }

    fn apply(&self, groups: Vec<Group>) -> Vec<Group> {
        match &self.pattern {
            Pattern::Chunks(kinds) => self.apply_chunks(kinds, groups),
            Pattern::Tokens(matchers) => self.apply_tokens(matchers, groups),
        }
    }

    fn apply_chunks(&self, kinds: &[ChunkKind], mut groups: Vec<Group>) -> Vec<Group> {
        let k = kinds.len();
        let mut perm: Vec<usize> = (0..groups.len()).collect();
        let mut start = 0;

        while start + k <= groups.len() {
            let span = &groups[start..start + k];

            let is_match = span
                .iter()
                .zip(kinds)
                .all(|(group, kind)| group.kind == *kind && !group.claimed);

            if !is_match {
                start += 1;
                continue;
            }

            debug!(
                "Rule \"{}\" reordered {}.",
                self.name,
                span.iter().map(|x| x.kind.label()).join(" ")
            );

            for (i, j) in self.order.iter().enumerate() {
                perm[start + i] = start + j;
                groups[start + i].claimed = true;
            }
            start += k;
        }

        permute(groups, &perm)
    }

    fn apply_tokens(&self, matchers: &[TagMatcher], groups: Vec<Group>) -> Vec<Group> {
        let k = matchers.len();
        let kinds: Vec<ChunkKind> = groups.iter().map(|x| x.kind).collect();
        let sizes: Vec<usize> = groups.iter().map(|x| x.slots.len()).collect();
        let claimed: Vec<bool> = groups.iter().map(|x| x.claimed).collect();
        let owners: Vec<usize> = sizes
            .iter()
            .enumerate()
            .flat_map(|(c, size)| iter::repeat(c).take(*size))
            .collect();
        let mut slots: Vec<Slot> = groups.into_iter().flat_map(|x| x.slots).collect();

        let mut perm: Vec<usize> = (0..slots.len()).collect();
        // the chunk each chunk is fused into
        let mut fused_into: Vec<usize> = (0..kinds.len()).collect();
        let mut start = 0;

        while start + k <= slots.len() {
            let is_match = (0..k).all(|i| {
                let slot = &slots[start + i];
                !slot.claimed
                    && matchers[i].is_match(slot.token.tag())
                    && self.allows(kinds[owners[start + i]])
            }) && (!self.single_chunk || owners[start] == owners[start + k - 1]);

            if !is_match {
                start += 1;
                continue;
            }

            debug!(
                "Rule \"{}\" reordered \"{}\".",
                self.name,
                slots[start..start + k].iter().map(|x| x.token.text()).join(" ")
            );

            for (i, j) in self.order.iter().enumerate() {
                perm[start + i] = start + j;
                slots[start + i].claimed = true;
            }

            let (first, last) = (owners[start], owners[start + k - 1]);
            for c in first + 1..=last {
                fused_into[c] = fused_into[first];
            }
            start += k;
        }

        let mut slots = permute(slots, &perm).into_iter();
        let mut output: Vec<Group> = Vec::with_capacity(kinds.len());

        for (c, (kind, size)) in kinds.into_iter().zip(sizes).enumerate() {
            let taken = slots.by_ref().take(size);

            match output.last_mut() {
                Some(group) if fused_into[c] != c => {
                    group.slots.extend(taken);
                    group.claimed |= claimed[c];
                }
                _ => output.push(Group {
                    kind,
                    slots: taken.collect(),
                    claimed: claimed[c],
                }),
            }
        }

        output
    }
}

impl fmt::Display for SyntacticRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels = self.pattern.labels();
        write!(
            f,
            "{}: [{}] -> [{}]",
            self.name,
            labels.join(", "),
            self.order.iter().map(|i| &labels[*i]).join(", ")
        )
    }
}

/// Reorders `items` such that the item at `perm[i]` ends up at `i`.
fn permute<T>(items: Vec<T>, perm: &[usize]) -> Vec<T> {
    let mut items: Vec<Option<T>> = items.into_iter().map(Some).collect();
    perm.iter().filter_map(|i| items[*i].take()).collect()
}

/// A token together with whether a rewrite has moved it already.
#[derive(Debug)]
struct Slot {
    token: TaggedToken,
    claimed: bool,
}

/// A chunk under rewriting, claimed once a chunk level rewrite has moved it.
#[derive(Debug)]
struct Group {
    kind: ChunkKind,
    slots: Vec<Slot>,
    claimed: bool,
}

/// Applies an ordered list of [SyntacticRule]s to shallow trees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyntacticTransfer {
    rules: Vec<SyntacticRule>,
}

impl Component for SyntacticTransfer {
    fn name() -> &'static str {
        "transfer"
    }
}

impl SyntacticTransfer {
    /// Creates a new transfer engine. The order of `rules` is their priority.
    pub fn new(rules: Vec<SyntacticRule>) -> Self {
        SyntacticTransfer { rules }
    }

    pub fn rules(&self) -> &[SyntacticRule] {
        &self.rules
    }

    /// Reorders the tree.
    ///
    /// # Errors
    /// - If the output is not a permutation of the input tokens. This is a bug, not a property of the input.
    pub fn transfer(&self, tree: &ShallowTree) -> Result<ShallowTree, InvariantError> {
        let mut groups: Vec<Group> = tree
            .chunks()
            .iter()
            .map(|chunk| Group {
                kind: chunk.kind(),
                slots: chunk
                    .tokens()
                    .iter()
                    .map(|token| Slot {
                        token: token.clone(),
                        claimed: false,
                    })
                    .collect(),
                claimed: false,
            })
            .collect();

        for rule in &self.rules {
            groups = rule.apply(groups);
        }

        let output = ShallowTree::new(
            groups
                .into_iter()
                .map(|group| {
                    Chunk::new(
                        group.kind,
                        group.slots.into_iter().map(|x| x.token).collect(),
                    )
                })
                .collect(),
        );

        let mut expected = tree.positions();
        let mut found = output.positions();
        expected.sort_unstable();
        found.sort_unstable();

        if expected != found {
            return Err(InvariantError::NotAPermutation {
                expected: tree.positions(),
                found: output.positions(),
            });
        }

        Ok(output)
    }
}
