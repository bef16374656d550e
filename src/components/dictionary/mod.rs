//! Lexical transfer: substituting every source word with a target language form from a bilingual [Dictionary].
//!
//! A word can have many entries. Entries whose context restrictions do not hold are discarded, the remaining
//! ones are preferred in this order:
//! 1. entries whose tag matcher matches the tag of the token as a whole,
//! 2. entries whose tag matcher matches a category of the tag,
//! 3. entries without tag,
//! 4. entries with a different tag.
//!
//! Within a tier the lowest rank wins, then the entry inserted first. A word without usable entry is passed
//! through unchanged and marked as [Status::Untranslated].

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::iter::FromIterator;

use crate::{
    types::{ShallowTree, Tag, TagMatcher, TaggedToken},
    utils,
};

use super::Component;

/// One translation of a source lemma.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub target: String,
    /// The source tags this translation applies to. Applies to any tag if not set.
    #[serde(default)]
    pub tag: Option<TagMatcher>,
    /// Lower is preferred.
    #[serde(default)]
    pub rank: u32,
    /// Only use this entry if the previous token has a matching tag.
    #[serde(default)]
    pub prev: Option<TagMatcher>,
    /// Only use this entry if the next token has a matching tag.
    #[serde(default)]
    pub next: Option<TagMatcher>,
}

impl Entry {
    pub fn new<S: Into<String>>(target: S) -> Self {
        Entry {
            target: target.into(),
            tag: None,
            rank: 0,
            prev: None,
            next: None,
        }
    }

    pub fn with_tag(mut self, tag: TagMatcher) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn with_rank(mut self, rank: u32) -> Self {
        self.rank = rank;
        self
    }

    pub fn with_context(mut self, prev: Option<TagMatcher>, next: Option<TagMatcher>) -> Self {
        self.prev = prev;
        self.next = next;
        self
    }

    fn context_holds(&self, prev: Option<&Tag>, next: Option<&Tag>) -> bool {
        let holds = |matcher: &Option<TagMatcher>, tag: Option<&Tag>| match (matcher, tag) {
            (None, _) => true,
            (Some(matcher), Some(tag)) => matcher.is_match(tag),
            (Some(_), None) => false,
        };

        holds(&self.prev, prev) && holds(&self.next, next)
    }

    fn tier(&self, tag: &Tag) -> u8 {
        match &self.tag {
            Some(matcher) if matcher.is_exact_match(tag) => 0,
            Some(matcher) if matcher.is_match(tag) => 1,
            None => 2,
            Some(_) => 3,
        }
    }
}

/// Options for a dictionary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryOptions {
    /// Whether to carry the casing of source words over to their translations and capitalize the first word of a
    /// sentence which started with a capitalized word.
    pub preserve_case: bool,
}

impl Default for DictionaryOptions {
    fn default() -> Self {
        DictionaryOptions {
            preserve_case: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Translated,
    /// The source form was passed through.
    Untranslated,
}

/// A word of the translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetWord {
    text: String,
    source: TaggedToken,
    status: Status,
}

impl TargetWord {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The token this word is a translation of.
    pub fn source(&self) -> &TaggedToken {
        &self.source
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_translated(&self) -> bool {
        self.status == Status::Translated
    }
}

/// A bilingual dictionary from lowercase source lemmas to target forms.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dictionary {
    entries: IndexMap<String, Vec<Entry>>,
    options: DictionaryOptions,
}

impl Component for Dictionary {
    fn name() -> &'static str {
        "dictionary"
    }
}

impl<S: Into<String>, T: Into<String>> FromIterator<(S, T)> for Dictionary {
    /// Creates a dictionary with default options from `(source, target)` pairs. Earlier pairs for the same
    /// source are ranked higher.
    fn from_iter<I: IntoIterator<Item = (S, T)>>(iter: I) -> Self {
        let mut dictionary = Dictionary::new(DictionaryOptions::default());

        for (source, target) in iter {
            dictionary.add(source, target);
        }

        dictionary
    }
}

impl Dictionary {
    pub fn new(options: DictionaryOptions) -> Self {
        Dictionary {
            entries: IndexMap::new(),
            options,
        }
    }

    pub fn options(&self) -> &DictionaryOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: DictionaryOptions) {
        self.options = options;
    }

    /// Adds an entry for the lemma.
    pub fn insert<S: AsRef<str>>(&mut self, lemma: S, entry: Entry) {
        self.entries
            .entry(lemma.as_ref().to_lowercase())
            .or_insert_with(Vec::new)
            .push(entry);
    }

    /// Adds an untagged translation ranked below all existing translations of the lemma.
    pub fn add<S: Into<String>, T: Into<String>>(&mut self, lemma: S, target: T) {
        let lemma = lemma.into();
        let rank = self.get(&lemma).len() as u32;

        self.insert(lemma, Entry::new(target).with_rank(rank));
    }

    /// All entries of the lemma in insertion order.
    pub fn get(&self, lemma: &str) -> &[Entry] {
        self.entries
            .get(&lemma.to_lowercase())
            .map(|x| x.as_slice())
            .unwrap_or(&[])
    }

    /// The number of lemmas.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Picks the preferred entry for a word with the given tag between tokens with the given tags.
    pub fn lookup(
        &self,
        word: &str,
        tag: &Tag,
        prev: Option<&Tag>,
        next: Option<&Tag>,
    ) -> Option<&Entry> {
        self.get(word)
            .iter()
            .filter(|entry| entry.context_holds(prev, next))
            .min_by_key(|entry| (entry.tier(tag), entry.rank))
    }

    fn cased(&self, target: &str, source: &str, sentence_initial: bool) -> String {
        if !self.options.preserve_case {
            return target.to_string();
        }

        if source.chars().nth(1).is_some() && utils::is_uppercase(source) {
            target.to_uppercase()
        } else if utils::is_title_case(source) && !sentence_initial {
            utils::capitalize(target)
        } else {
            target.to_string()
        }
    }

    /// Translates every token of the tree, in tree order. Never fails: words without entry are passed through.
    pub fn transfer(&self, tree: &ShallowTree) -> Vec<TargetWord> {
        let tokens: Vec<&TaggedToken> = tree.tokens().collect();
        let first = tokens.iter().map(|x| x.position()).min();

        let mut words: Vec<TargetWord> = tokens
            .iter()
            .enumerate()
            .map(|(i, token)| {
                let prev = i.checked_sub(1).map(|j| tokens[j].tag());
                let next = tokens.get(i + 1).map(|x| x.tag());

                match self.lookup(token.text(), token.tag(), prev, next) {
                    Some(entry) => TargetWord {
                        text: self.cased(
                            &entry.target,
                            token.text(),
                            Some(token.position()) == first,
                        ),
                        source: (*token).clone(),
                        status: Status::Translated,
                    },
                    None => {
                        debug!("No translation for \"{}\" ({}).", token.text(), token.tag());

                        TargetWord {
                            text: token.text().to_string(),
                            source: (*token).clone(),
                            status: Status::Untranslated,
                        }
                    }
                }
            })
            .collect();

        let capitalize = self.options.preserve_case
            && tokens
                .iter()
                .find(|x| Some(x.position()) == first)
                .map_or(false, |x| utils::is_title_case(x.text()));

        if capitalize {
            if let Some(word) = words.first_mut() {
                word.text = utils::capitalize(&word.text);
            }
        }

        words
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chunk, ChunkKind, Origin, Token};

    fn tree(tagged: &[(&str, &str)]) -> ShallowTree {
        ShallowTree::new(vec![Chunk::new(
            ChunkKind::Other,
            tagged
                .iter()
                .enumerate()
                .map(|(i, (word, tag))| {
                    TaggedToken::new(Token::new(*word, i), *tag, Origin::Lexicon)
                })
                .collect(),
        )])
    }

    fn texts(words: &[TargetWord]) -> Vec<&str> {
        words.iter().map(|x| x.text()).collect()
    }

    fn matcher(s: &str) -> Option<TagMatcher> {
        Some(s.parse().unwrap())
    }

    #[test]
    fn translates_and_passes_through() {
        let dictionary: Dictionary = vec![("la", "the"), ("casa", "house")].into_iter().collect();
        let words =
            dictionary.transfer(&tree(&[("la", "da"), ("casa", "n"), ("Xochimilco", "UNK")]));

        assert_eq!(texts(&words), vec!["the", "house", "Xochimilco"]);
        assert!(words[0].is_translated());
        assert_eq!(words[2].status(), Status::Untranslated);
        assert_eq!(words[2].source().text(), "Xochimilco");
    }

    #[test]
    fn prefers_matching_tags() {
        let mut dictionary = Dictionary::default();
        dictionary.insert("bajo", Entry::new("short").with_tag("a".parse().unwrap()));
        dictionary.insert("bajo", Entry::new("under").with_tag("s".parse().unwrap()));
        dictionary.insert("bajo", Entry::new("bass"));
        dictionary.insert("bajo", Entry::new("low").with_tag("=aq0ms0".parse().unwrap()));

        let tag = |x: &str| Tag::new(x);
        let lookup = |t: &str| {
            dictionary
                .lookup("bajo", &tag(t), None, None)
                .map(|x| x.target.as_str())
        };

        assert_eq!(lookup("aq0ms0"), Some("low"));
        assert_eq!(lookup("aq0fs0"), Some("short"));
        assert_eq!(lookup("sps00"), Some("under"));
        assert_eq!(lookup("ncms000"), Some("bass"));
    }

    #[test]
    fn mismatched_tags_are_a_last_resort() {
        let mut dictionary = Dictionary::default();
        dictionary.insert("vino", Entry::new("came").with_tag("v".parse().unwrap()));

        let entry = dictionary.lookup("vino", &Tag::new("n"), None, None).unwrap();
        assert_eq!(entry.target, "came");
    }

    #[test]
    fn ranks_break_ties() {
        let dictionary: Dictionary = vec![("casa", "house"), ("casa", "home")]
            .into_iter()
            .collect();
        assert_eq!(dictionary.get("casa").len(), 2);
        assert_eq!(
            dictionary.lookup("casa", &Tag::new("n"), None, None).unwrap().target,
            "house"
        );

        let mut dictionary = dictionary;
        dictionary.insert("casa", Entry::new("household").with_rank(0));
        // equal rank, the first inserted wins
        assert_eq!(
            dictionary.lookup("casa", &Tag::new("n"), None, None).unwrap().target,
            "house"
        );
    }

    #[test]
    fn context_restricts_entries() {
        let mut dictionary = Dictionary::default();
        dictionary.insert("que", Entry::new("than").with_context(matcher("a"), None));
        dictionary.insert("que", Entry::new("that").with_rank(1));

        let words = dictionary.transfer(&tree(&[("más", "r"), ("alto", "a"), ("que", "c")]));
        assert_eq!(words[2].text(), "than");

        let words = dictionary.transfer(&tree(&[("que", "c")]));
        assert_eq!(words[0].text(), "that");
    }

    #[test]
    fn preserves_case() {
        let dictionary: Dictionary = vec![
            ("la", "the"),
            ("casa", "house"),
            ("roja", "red"),
            ("onu", "un"),
        ]
        .into_iter()
        .collect();

        let mut tree = tree(&[("La", "da"), ("Casa", "n"), ("ONU", "n")]);
        assert_eq!(texts(&dictionary.transfer(&tree)), vec!["The", "House", "UN"]);

        // the capitalized first word moved, the new first word is capitalized instead
        let mut chunks = tree.into_chunks();
        let mut tokens = chunks.remove(0).into_tokens();
        tokens.swap(0, 1);
        tree = ShallowTree::new(vec![Chunk::new(ChunkKind::Other, tokens)]);
        assert_eq!(texts(&dictionary.transfer(&tree)), vec!["House", "the", "UN"]);

        let mut plain = dictionary.clone();
        plain.set_options(DictionaryOptions {
            preserve_case: false,
        });
        assert_eq!(texts(&plain.transfer(&tree)), vec!["house", "the", "un"]);
    }
}
