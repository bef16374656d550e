//! A part-of-speech tagger: every word gets its most likely tag from a [Lexicon], then an ordered [RuleList]
//! of transformation rules corrects the initial guess.

use bimap::BiMap;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeSet, HashMap},
    convert::TryFrom,
    iter::FromIterator,
};

use crate::{
    rule::TransformRule,
    types::{Origin, Tag, TaggedSentence, TaggedToken, Token},
    utils, ConfigError, Error,
};

use super::Component;

pub mod learn;

/// An interned part-of-speech tag. Ids are assigned in the order of the tag names, after the fallback tag
/// which always has id zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PosId(u16);

impl PosId {
    pub fn value(&self) -> u16 {
        self.0
    }
}

/// The admissible part-of-speech tags, including the designated fallback tag for unknown words.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "TagSetData", into = "TagSetData")]
pub struct TagSet {
    tags: BiMap<String, PosId>,
}

/// The tag names ordered by id, the fallback tag first.
#[derive(Serialize, Deserialize)]
struct TagSetData {
    names: Vec<String>,
}

impl TryFrom<TagSetData> for TagSet {
    type Error = ConfigError;

    fn try_from(data: TagSetData) -> Result<Self, Self::Error> {
        match data.names.first() {
            Some(fallback) if !fallback.trim().is_empty() => {}
            _ => return Err(ConfigError::EmptyFallbackTag),
        }

        let mut tags = BiMap::new();
        for (i, name) in data.names.into_iter().enumerate() {
            if tags.contains_left(&name) {
                return Err(ConfigError::DuplicateTag(name));
            }
            tags.insert(name, PosId(i as u16));
        }

        Ok(TagSet { tags })
    }
}

impl From<TagSet> for TagSetData {
    fn from(tagset: TagSet) -> Self {
        TagSetData {
            names: tagset.iter().map(|(name, _)| name.to_string()).collect(),
        }
    }
}

impl TagSet {
    /// Creates a tag set from a non-empty collection of tags.
    ///
    /// # Errors
    /// - If `tags` contains no tag apart from the fallback tag.
    /// - If the fallback tag is empty.
    pub fn new<I, S>(tags: I, fallback: &str) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tagset = Self::build(tags, fallback)?;

        if tagset.len() < 2 {
            return Err(ConfigError::EmptyTagSet);
        }

        Ok(tagset)
    }

    /// Same as [TagSet::new] but allows a tag set holding only the fallback tag, which is what an empty
    /// training corpus yields.
    pub(crate) fn build<I, S>(tags: I, fallback: &str) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fallback = fallback.trim();
        if fallback.is_empty() {
            return Err(ConfigError::EmptyFallbackTag);
        }

        // tag ids should be consistent across runs
        let names: BTreeSet<String> = tags
            .into_iter()
            .map(|x| x.as_ref().trim().to_string())
            .filter(|x| !x.is_empty() && x != fallback)
            .collect();

        let mut tags = BiMap::new();
        tags.insert(fallback.to_string(), PosId(0));
        for (i, name) in names.into_iter().enumerate() {
            tags.insert(name, PosId(i as u16 + 1));
        }

        Ok(TagSet { tags })
    }

    pub fn id(&self, name: &str) -> Option<PosId> {
        self.tags.get_by_left(name).copied()
    }

    pub fn name(&self, id: PosId) -> Option<&str> {
        self.tags.get_by_right(&id).map(|x| x.as_str())
    }

    pub(crate) fn name_or_fallback(&self, id: PosId) -> &str {
        self.name(id).unwrap_or_else(|| self.fallback_name())
    }

    pub fn fallback(&self) -> PosId {
        PosId(0)
    }

    pub fn fallback_name(&self) -> &str {
        // always present, inserted on construction
        self.name(self.fallback()).unwrap_or_default()
    }

    pub fn contains(&self, id: PosId) -> bool {
        self.tags.contains_right(&id)
    }

    /// The number of tags including the fallback tag.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// All tags ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = (&str, PosId)> {
        (0..self.tags.len()).filter_map(move |i| {
            let id = PosId(i as u16);
            self.name(id).map(|name| (name, id))
        })
    }
}

/// Options for a lexicon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconOptions {
    /// The tag assigned to words which are not in the lexicon.
    pub fallback_tag: String,
    /// Whether to look up the lowercase form of title case or uppercase words which are not in the lexicon.
    pub lowercase_lookup: bool,
}

impl Default for LexiconOptions {
    fn default() -> Self {
        LexiconOptions {
            fallback_tag: "UNK".into(),
            lowercase_lookup: true,
        }
    }
}

/// Maps known words to their most likely tag. This is the initial guess of the tagger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lexicon {
    tagset: TagSet,
    words: IndexMap<String, PosId>,
    options: LexiconOptions,
}

impl Lexicon {
    /// Creates a lexicon from a tag set and the most likely tag of each word.
    ///
    /// # Errors
    /// - If a tag is not part of the tag set.
    pub fn new<I, S, T>(tagset: TagSet, entries: I, options: LexiconOptions) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: AsRef<str>,
    {
        let mut words: Vec<(String, PosId)> = entries
            .into_iter()
            .map(|(word, tag)| {
                tagset
                    .id(tag.as_ref())
                    .map(|id| (word.into(), id))
                    .ok_or_else(|| Error::UnknownTag(tag.as_ref().to_string()))
            })
            .collect::<Result<_, _>>()?;
        words.sort();

        Ok(Lexicon {
            tagset,
            words: words.into_iter().collect(),
            options,
        })
    }

    /// Creates a lexicon from a tagged corpus. Each word gets the tag it has most often in the corpus.
    /// Ties are broken in favor of the lexicographically smallest tag.
    pub fn from_corpus<S, T>(corpus: &[Vec<(S, T)>], options: LexiconOptions) -> Result<Self, Error>
    where
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let mut counts: HashMap<&str, HashMap<&str, usize>> = HashMap::new();

        for (word, tag) in corpus.iter().flatten() {
            *counts
                .entry(word.as_ref())
                .or_insert_with(HashMap::new)
                .entry(tag.as_ref())
                .or_insert(0) += 1;
        }

        let tagset = TagSet::build(
            counts.values().flat_map(|tags| tags.keys()),
            &options.fallback_tag,
        )?;

        let entries: Vec<_> = counts
            .iter()
            .filter_map(|(word, tags)| {
                tags.iter()
                    .max_by(|(tag_a, count_a), (tag_b, count_b)| {
                        count_a.cmp(count_b).then_with(|| tag_b.cmp(tag_a))
                    })
                    .map(|(tag, _)| (word.to_string(), *tag))
            })
            .collect();

        Lexicon::new(tagset, entries, options)
    }

    pub fn tagset(&self) -> &TagSet {
        &self.tagset
    }

    pub fn options(&self) -> &LexiconOptions {
        &self.options
    }

    /// The number of known words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Gets the most likely tag of a word and whether it is known.
    pub fn lookup(&self, word: &str) -> (PosId, Origin) {
        if let Some(id) = self.words.get(word) {
            return (*id, Origin::Lexicon);
        }

        if self.options.lowercase_lookup
            && (utils::is_title_case(word) || utils::is_uppercase(word))
        {
            let lower = word.to_lowercase();
            if lower != word {
                if let Some(id) = self.words.get(&lower) {
                    return (*id, Origin::Lexicon);
                }
            }
        }

        (self.tagset.fallback(), Origin::Fallback)
    }
}

/// The ordered transformation rules of a tagger. Earlier rules are applied first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RuleList {
    rules: Vec<TransformRule>,
}

impl RuleList {
    pub fn rules(&self) -> &[TransformRule] {
        &self.rules
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TransformRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub(crate) fn push(&mut self, rule: TransformRule) {
        self.rules.push(rule);
    }

    /// Checks that all rules only refer to tags of the tag set.
    pub fn validate(&self, tagset: &TagSet) -> Result<(), ConfigError> {
        for (index, rule) in self.rules.iter().enumerate() {
            if let Some(id) = rule.tag_ids().into_iter().find(|id| !tagset.contains(*id)) {
                return Err(ConfigError::UnknownTagId {
                    index,
                    id: id.value(),
                });
            }
        }

        Ok(())
    }
}

impl FromIterator<TransformRule> for RuleList {
    fn from_iter<I: IntoIterator<Item = TransformRule>>(iter: I) -> Self {
        RuleList {
            rules: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for RuleList {
    type Item = TransformRule;
    type IntoIter = std::vec::IntoIter<TransformRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.into_iter()
    }
}

impl<'a> IntoIterator for &'a RuleList {
    type Item = &'a TransformRule;
    type IntoIter = std::slice::Iter<'a, TransformRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

/// Tags sentences with the initial guess from the lexicon, then applies every rule in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "TaggerData", into = "TaggerData")]
pub struct Tagger {
    lexicon: Lexicon,
    rules: RuleList,
}

#[derive(Serialize, Deserialize)]
struct TaggerData {
    lexicon: Lexicon,
    rules: RuleList,
}

impl TryFrom<TaggerData> for Tagger {
    type Error = ConfigError;

    fn try_from(data: TaggerData) -> Result<Self, Self::Error> {
        Tagger::new(data.lexicon, data.rules)
    }
}

impl From<Tagger> for TaggerData {
    fn from(tagger: Tagger) -> Self {
        TaggerData {
            lexicon: tagger.lexicon,
            rules: tagger.rules,
        }
    }
}

impl Component for Tagger {
    fn name() -> &'static str {
        "tagger"
    }
}

impl Tagger {
    /// Creates a new tagger.
    ///
    /// # Errors
    /// - If a rule refers to a tag which is not in the tag set of the lexicon.
    pub fn new(lexicon: Lexicon, rules: RuleList) -> Result<Self, ConfigError> {
        rules.validate(lexicon.tagset())?;
        Ok(Tagger { lexicon, rules })
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn tagset(&self) -> &TagSet {
        self.lexicon.tagset()
    }

    /// Gets the transformation rules in the order they are applied.
    pub fn rule_list(&self) -> &RuleList {
        &self.rules
    }

    /// The initial guess for a word, before any rule is applied.
    pub fn most_likely_tag(&self, word: &str) -> &str {
        self.tagset().name_or_fallback(self.lexicon.lookup(word).0)
    }

    /// Tags the tokens with the initial guess only.
    pub fn initial(&self, tokens: &[Token]) -> TaggedSentence {
        let (tags, origins): (Vec<_>, Vec<_>) = tokens
            .iter()
            .map(|token| self.lexicon.lookup(token.text()))
            .unzip();

        self.finalize(tokens, &tags, origins)
    }

    /// Tags the tokens. Rules are applied in order, each one to the whole sentence.
    pub fn tag(&self, tokens: &[Token]) -> TaggedSentence {
        let words: Vec<String> = tokens.iter().map(|x| x.text().to_lowercase()).collect();
        let (mut tags, mut origins): (Vec<_>, Vec<_>) = tokens
            .iter()
            .map(|token| self.lexicon.lookup(token.text()))
            .unzip();

        for (index, rule) in self.rules.iter().enumerate() {
            for i in rule.apply(&words, &mut tags) {
                debug!(
                    "Rule #{} ({}) changed the tag of \"{}\".",
                    index,
                    rule.display(self.tagset()),
                    tokens[i].text()
                );
                origins[i] = Origin::Rule(index);
            }
        }

        self.finalize(tokens, &tags, origins)
    }

    fn finalize(&self, tokens: &[Token], tags: &[PosId], origins: Vec<Origin>) -> TaggedSentence {
        tokens
            .iter()
            .zip(tags)
            .zip(origins)
            .map(|((token, id), origin)| {
                TaggedToken::new(
                    token.clone(),
                    Tag::new(self.tagset().name_or_fallback(*id)),
                    origin,
                )
            })
            .collect()
    }
}
