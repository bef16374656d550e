//! Transformation rules as induced by transformation-based learning.
//!
//! A [TransformRule] changes a tag `from` into a tag `to` at every position where the current tag is `from`
//! and a [Context] predicate over the surrounding tags and words holds. Contexts are instances of a
//! [Template], e.g. the template [Template::PrevTag] creates contexts like "the previous tag is `t`".
//!
//! Rules are applied against a snapshot: all matching positions are determined first and changed afterwards,
//! so a change at one position never influences whether the same rule fires at another position.

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::components::tagger::{PosId, TagSet};

/// The current state of one sentence as seen by a rule: the lowercased words and the current tags.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Window<'a> {
    words: &'a [String],
    tags: &'a [PosId],
}

impl<'a> Window<'a> {
    pub(crate) fn new(words: &'a [String], tags: &'a [PosId]) -> Self {
        debug_assert_eq!(words.len(), tags.len());
        Window { words, tags }
    }

    pub(crate) fn len(&self) -> usize {
        self.tags.len()
    }

    fn index(&self, i: usize, offset: isize) -> Option<usize> {
        let j = i as isize + offset;
        if j >= 0 && (j as usize) < self.len() {
            Some(j as usize)
        } else {
            None
        }
    }

    fn tag(&self, i: usize, offset: isize) -> Option<PosId> {
        self.index(i, offset).map(|j| self.tags[j])
    }

    fn word(&self, i: usize, offset: isize) -> Option<&'a str> {
        self.index(i, offset).map(|j| self.words[j].as_str())
    }
}

/// The kinds of context a rule can condition on. The order in a template list is the priority used to break
/// ties between equally scoring rules during learning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Template {
    PrevTag,
    NextTag,
    PrevTwoTag,
    NextTwoTag,
    PrevOrPrevTwoTag,
    SurroundTags,
    PrevWord,
    NextWord,
    CurrentWord,
}

impl Template {
    /// All templates in their default priority.
    pub fn all() -> &'static [Template] {
        &[
            Template::PrevTag,
            Template::NextTag,
            Template::PrevTwoTag,
            Template::NextTwoTag,
            Template::PrevOrPrevTwoTag,
            Template::SurroundTags,
            Template::PrevWord,
            Template::NextWord,
            Template::CurrentWord,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Template::PrevTag => "prev_tag",
            Template::NextTag => "next_tag",
            Template::PrevTwoTag => "prev_two_tag",
            Template::NextTwoTag => "next_two_tag",
            Template::PrevOrPrevTwoTag => "prev_or_prev_two_tag",
            Template::SurroundTags => "surround_tags",
            Template::PrevWord => "prev_word",
            Template::NextWord => "next_word",
            Template::CurrentWord => "current_word",
        }
    }

    /// Creates the context of this template which holds at position `i` of the window.
    /// Returns `None` if the context would reach outside of the sentence.
    pub(crate) fn instantiate(&self, window: &Window, i: usize) -> Option<Context> {
        Some(match self {
            Template::PrevTag => PrevTag {
                tag: window.tag(i, -1)?,
            }
            .into(),
            Template::NextTag => NextTag {
                tag: window.tag(i, 1)?,
            }
            .into(),
            Template::PrevTwoTag => PrevTwoTag {
                tag: window.tag(i, -2)?,
            }
            .into(),
            Template::NextTwoTag => NextTwoTag {
                tag: window.tag(i, 2)?,
            }
            .into(),
            // instantiated from the closer tag, the farther one is `PrevTwoTag`
            Template::PrevOrPrevTwoTag => PrevOrPrevTwoTag {
                tag: window.tag(i, -1)?,
            }
            .into(),
            Template::SurroundTags => SurroundTags {
                prev: window.tag(i, -1)?,
                next: window.tag(i, 1)?,
            }
            .into(),
            Template::PrevWord => PrevWord {
                word: window.word(i, -1)?.to_string(),
            }
            .into(),
            Template::NextWord => NextWord {
                word: window.word(i, 1)?.to_string(),
            }
            .into(),
            Template::CurrentWord => CurrentWord {
                word: window.word(i, 0)?.to_string(),
            }
            .into(),
        })
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[enum_dispatch]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Context {
    PrevTag,
    NextTag,
    PrevTwoTag,
    NextTwoTag,
    PrevOrPrevTwoTag,
    SurroundTags,
    PrevWord,
    NextWord,
    CurrentWord,
}

#[enum_dispatch(Context)]
pub(crate) trait Predicate {
    fn is_match(&self, window: &Window, i: usize) -> bool;

    fn template(&self) -> Template;

    fn tag_ids(&self) -> Vec<PosId> {
        Vec::new()
    }

    fn describe(&self, tagset: &TagSet) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrevTag {
    tag: PosId,
}

impl Predicate for PrevTag {
    fn is_match(&self, window: &Window, i: usize) -> bool {
        window.tag(i, -1) == Some(self.tag)
    }

    fn template(&self) -> Template {
        Template::PrevTag
    }

    fn tag_ids(&self) -> Vec<PosId> {
        vec![self.tag]
    }

    fn describe(&self, tagset: &TagSet) -> String {
        format!("{} _", tagset.name_or_fallback(self.tag))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NextTag {
    tag: PosId,
}

impl Predicate for NextTag {
    fn is_match(&self, window: &Window, i: usize) -> bool {
        window.tag(i, 1) == Some(self.tag)
    }

    fn template(&self) -> Template {
        Template::NextTag
    }

    fn tag_ids(&self) -> Vec<PosId> {
        vec![self.tag]
    }

    fn describe(&self, tagset: &TagSet) -> String {
        format!("_ {}", tagset.name_or_fallback(self.tag))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrevTwoTag {
    tag: PosId,
}

impl Predicate for PrevTwoTag {
    fn is_match(&self, window: &Window, i: usize) -> bool {
        window.tag(i, -2) == Some(self.tag)
    }

    fn template(&self) -> Template {
        Template::PrevTwoTag
    }

    fn tag_ids(&self) -> Vec<PosId> {
        vec![self.tag]
    }

    fn describe(&self, tagset: &TagSet) -> String {
        format!("{} * _", tagset.name_or_fallback(self.tag))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NextTwoTag {
    tag: PosId,
}

impl Predicate for NextTwoTag {
    fn is_match(&self, window: &Window, i: usize) -> bool {
        window.tag(i, 2) == Some(self.tag)
    }

    fn template(&self) -> Template {
        Template::NextTwoTag
    }

    fn tag_ids(&self) -> Vec<PosId> {
        vec![self.tag]
    }

    fn describe(&self, tagset: &TagSet) -> String {
        format!("_ * {}", tagset.name_or_fallback(self.tag))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrevOrPrevTwoTag {
    tag: PosId,
}

impl Predicate for PrevOrPrevTwoTag {
    fn is_match(&self, window: &Window, i: usize) -> bool {
        window.tag(i, -1) == Some(self.tag) || window.tag(i, -2) == Some(self.tag)
    }

    fn template(&self) -> Template {
        Template::PrevOrPrevTwoTag
    }

    fn tag_ids(&self) -> Vec<PosId> {
        vec![self.tag]
    }

    fn describe(&self, tagset: &TagSet) -> String {
        format!("{} (*) _", tagset.name_or_fallback(self.tag))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurroundTags {
    prev: PosId,
    next: PosId,
}

impl Predicate for SurroundTags {
    fn is_match(&self, window: &Window, i: usize) -> bool {
        window.tag(i, -1) == Some(self.prev) && window.tag(i, 1) == Some(self.next)
    }

    fn template(&self) -> Template {
        Template::SurroundTags
    }

    fn tag_ids(&self) -> Vec<PosId> {
        vec![self.prev, self.next]
    }

    fn describe(&self, tagset: &TagSet) -> String {
        format!(
            "{} _ {}",
            tagset.name_or_fallback(self.prev),
            tagset.name_or_fallback(self.next)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrevWord {
    word: String,
}

impl Predicate for PrevWord {
    fn is_match(&self, window: &Window, i: usize) -> bool {
        window.word(i, -1) == Some(self.word.as_str())
    }

    fn template(&self) -> Template {
        Template::PrevWord
    }

    fn describe(&self, _tagset: &TagSet) -> String {
        format!("\"{}\" _", self.word)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NextWord {
    word: String,
}

impl Predicate for NextWord {
    fn is_match(&self, window: &Window, i: usize) -> bool {
        window.word(i, 1) == Some(self.word.as_str())
    }

    fn template(&self) -> Template {
        Template::NextWord
    }

    fn describe(&self, _tagset: &TagSet) -> String {
        format!("_ \"{}\"", self.word)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CurrentWord {
    word: String,
}

impl Predicate for CurrentWord {
    fn is_match(&self, window: &Window, i: usize) -> bool {
        window.word(i, 0) == Some(self.word.as_str())
    }

    fn template(&self) -> Template {
        Template::CurrentWord
    }

    fn describe(&self, _tagset: &TagSet) -> String {
        format!("_=\"{}\"", self.word)
    }
}

/// Changes `from` into `to` wherever the context holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransformRule {
    pub(crate) from: PosId,
    pub(crate) to: PosId,
    pub(crate) context: Context,
}

impl TransformRule {
    pub(crate) fn new(from: PosId, to: PosId, context: Context) -> Self {
        TransformRule { from, to, context }
    }

    pub fn from_tag(&self) -> PosId {
        self.from
    }

    pub fn to_tag(&self) -> PosId {
        self.to
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn template(&self) -> Template {
        self.context.template()
    }

    /// All tag ids this rule refers to.
    pub(crate) fn tag_ids(&self) -> Vec<PosId> {
        let mut ids = vec![self.from, self.to];
        ids.extend(self.context.tag_ids());
        ids
    }

    /// Whether the rule fires at position `i` of the window.
    pub(crate) fn is_match(&self, window: &Window, i: usize) -> bool {
        window.tags[i] == self.from && self.context.is_match(window, i)
    }

    /// Applies the rule to one sentence and returns the changed positions.
    pub(crate) fn apply(&self, words: &[String], tags: &mut [PosId]) -> Vec<usize> {
        let positions: Vec<usize> = {
            let window = Window::new(words, tags);
            (0..window.len())
                .filter(|i| self.is_match(&window, *i))
                .collect()
        };

        for i in positions.iter() {
            tags[*i] = self.to;
        }

        positions
    }

    /// Formats the rule in the `from -> to / context` notation.
    pub fn display<'a>(&'a self, tagset: &'a TagSet) -> RuleDisplay<'a> {
        RuleDisplay { rule: self, tagset }
    }
}

/// Helper to display a [TransformRule] with tag names instead of ids.
pub struct RuleDisplay<'a> {
    rule: &'a TransformRule,
    tagset: &'a TagSet,
}

impl<'a> fmt::Display for RuleDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} / {}",
            self.tagset.name_or_fallback(self.rule.from),
            self.tagset.name_or_fallback(self.rule.to),
            self.rule.context.describe(self.tagset)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagset() -> TagSet {
        TagSet::new(vec!["d", "n", "t", "v"], "UNK").unwrap()
    }

    fn words(words: &[&str]) -> Vec<String> {
        words.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn rule_is_applied_against_snapshot() {
        let tagset = tagset();
        let n = tagset.id("n").unwrap();
        let v = tagset.id("v").unwrap();

        // n -> v / n _ applied to n n n becomes n v v, every position sees the original tags
        let rule = TransformRule::new(n, v, PrevTag { tag: n }.into());
        let words = words(&["a", "b", "c"]);
        let mut tags = vec![n, n, n];

        assert_eq!(rule.apply(&words, &mut tags), vec![1, 2]);
        assert_eq!(tags, vec![n, v, v]);
    }

    #[test]
    fn contexts_do_not_reach_outside_the_sentence() {
        let tagset = tagset();
        let n = tagset.id("n").unwrap();
        let words = words(&["casa"]);
        let tags = vec![n];
        let window = Window::new(&words, &tags);

        for template in Template::all() {
            let context = template.instantiate(&window, 0);
            assert_eq!(context.is_some(), *template == Template::CurrentWord);
        }
    }

    #[test]
    fn instantiated_context_matches_its_origin() {
        let tagset = tagset();
        let ids: Vec<_> = ["d", "n", "t", "v", "n"]
            .iter()
            .map(|x| tagset.id(x).unwrap())
            .collect();
        let words = words(&["the", "horse", "to", "race", "race"]);
        let window = Window::new(&words, &ids);

        for i in 0..window.len() {
            for template in Template::all() {
                if let Some(context) = template.instantiate(&window, i) {
                    assert!(context.is_match(&window, i));
                    assert_eq!(context.template(), *template);
                }
            }
        }
    }

    #[test]
    fn rule_display() {
        let tagset = tagset();
        let rule = TransformRule::new(
            tagset.id("n").unwrap(),
            tagset.id("v").unwrap(),
            PrevTag {
                tag: tagset.id("t").unwrap(),
            }
            .into(),
        );

        assert_eq!(rule.display(&tagset).to_string(), "n -> v / t _");
    }
}
