//! Fundamental types used by this crate.

use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt, str::FromStr};

use crate::ConfigError;

/// A surface word and its position in the sentence. Tokens are never changed after creation,
/// later stages only reorder them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    text: String,
    position: usize,
}

impl Token {
    pub fn new<S: Into<String>>(text: S, position: usize) -> Self {
        Token {
            text: text.into(),
            position,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The index of this token in the sentence it was created from.
    pub fn position(&self) -> usize {
        self.position
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

/// Creates tokens with consecutive positions starting at zero.
pub fn tokens_from<I, S>(words: I) -> Vec<Token>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    words
        .into_iter()
        .enumerate()
        .map(|(i, word)| Token::new(word, i))
        .collect()
}

/// A part-of-speech tag, e.g. the EAGLES tag `ncfs000` or its category `n`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(String);

impl Tag {
    pub fn new<S: Into<String>>(tag: S) -> Self {
        Tag(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The EAGLES category i. e. the lowercased first character.
    pub fn category(&self) -> Option<char> {
        self.0.chars().next().map(|c| c.to_ascii_lowercase())
    }
}

impl AsRef<str> for Tag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Tag {
    fn from(tag: &str) -> Self {
        Tag(tag.to_string())
    }
}

impl From<String> for Tag {
    fn from(tag: String) -> Self {
        Tag(tag)
    }
}

/// Matches tags in rules and grammars. Parsed from strings:
/// - `*` matches any tag.
/// - `=ncfs000` matches exactly this tag.
/// - anything else matches tags starting with it, ignoring case, so `n` matches every noun.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TagMatcher {
    Any,
    Exact(String),
    Prefix(String),
}

impl TagMatcher {
    pub fn is_match(&self, tag: &Tag) -> bool {
        match self {
            TagMatcher::Any => true,
            TagMatcher::Exact(exact) => exact == tag.as_str(),
            TagMatcher::Prefix(prefix) => tag.as_str().to_lowercase().starts_with(prefix.as_str()),
        }
    }

    /// Whether this matcher describes the tag as a whole, not just a category of tags.
    pub fn is_exact_match(&self, tag: &Tag) -> bool {
        match self {
            TagMatcher::Any => false,
            TagMatcher::Exact(exact) => exact == tag.as_str(),
            TagMatcher::Prefix(prefix) => tag.as_str().to_lowercase() == *prefix,
        }
    }
}

impl FromStr for TagMatcher {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        match s {
            "" | "=" => Err(ConfigError::InvalidTagMatcher(s.to_string())),
            "*" => Ok(TagMatcher::Any),
            _ => Ok(match s.strip_prefix('=') {
                Some(exact) => TagMatcher::Exact(exact.to_string()),
                None => TagMatcher::Prefix(s.to_lowercase()),
            }),
        }
    }
}

impl TryFrom<String> for TagMatcher {
    type Error = ConfigError;

    fn try_from(string: String) -> Result<Self, Self::Error> {
        string.parse()
    }
}

impl From<TagMatcher> for String {
    fn from(matcher: TagMatcher) -> Self {
        matcher.to_string()
    }
}

impl fmt::Display for TagMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagMatcher::Any => write!(f, "*"),
            TagMatcher::Exact(exact) => write!(f, "={}", exact),
            TagMatcher::Prefix(prefix) => write!(f, "{}", prefix),
        }
    }
}

/// Where the tag of a [TaggedToken] comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    /// The most likely tag of a known word.
    Lexicon,
    /// The designated tag for words missing from the lexicon.
    Fallback,
    /// Set by the transformation rule at this index of the rule list.
    Rule(usize),
}

/// A token with its part-of-speech tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedToken {
    token: Token,
    tag: Tag,
    origin: Origin,
}

impl TaggedToken {
    pub fn new<T: Into<Tag>>(token: Token, tag: T, origin: Origin) -> Self {
        TaggedToken {
            token,
            tag: tag.into(),
            origin,
        }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn text(&self) -> &str {
        self.token.text()
    }

    pub fn position(&self) -> usize {
        self.token.position()
    }

    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }
}

/// A sentence after tagging. The order is the source order.
pub type TaggedSentence = Vec<TaggedToken>;

/// The label of a [Chunk].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChunkKind {
    #[serde(rename = "NP")]
    NounPhrase,
    #[serde(rename = "VP")]
    VerbPhrase,
    #[serde(rename = "AdjP")]
    AdjectivePhrase,
    #[serde(rename = "AdvP")]
    AdverbPhrase,
    #[serde(rename = "PP")]
    PrepositionalPhrase,
    /// A token no chunk rule could take up.
    #[serde(rename = "O")]
    Other,
}

impl ChunkKind {
    pub fn label(&self) -> &'static str {
        match self {
            ChunkKind::NounPhrase => "NP",
            ChunkKind::VerbPhrase => "VP",
            ChunkKind::AdjectivePhrase => "AdjP",
            ChunkKind::AdverbPhrase => "AdvP",
            ChunkKind::PrepositionalPhrase => "PP",
            ChunkKind::Other => "O",
        }
    }
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for ChunkKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "NP" => ChunkKind::NounPhrase,
            "VP" => ChunkKind::VerbPhrase,
            "AdjP" => ChunkKind::AdjectivePhrase,
            "AdvP" => ChunkKind::AdverbPhrase,
            "PP" => ChunkKind::PrepositionalPhrase,
            "O" => ChunkKind::Other,
            _ => return Err(ConfigError::UnknownChunkLabel(s.to_string())),
        })
    }
}

/// A contiguous span of tagged tokens with a phrase label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    kind: ChunkKind,
    tokens: Vec<TaggedToken>,
}

impl Chunk {
    pub fn new(kind: ChunkKind, tokens: Vec<TaggedToken>) -> Self {
        Chunk { kind, tokens }
    }

    pub fn kind(&self) -> ChunkKind {
        self.kind
    }

    pub fn tokens(&self) -> &[TaggedToken] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<TaggedToken> {
        self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.kind)?;
        for token in &self.tokens {
            write!(f, " {}/{}", token.text(), token.tag())?;
        }
        write!(f, ")")
    }
}

/// A flat, one level syntax tree: the ordered chunks of a sentence.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShallowTree {
    chunks: Vec<Chunk>,
}

impl ShallowTree {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        ShallowTree { chunks }
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn into_chunks(self) -> Vec<Chunk> {
        self.chunks
    }

    /// All tokens in tree order.
    pub fn tokens(&self) -> impl Iterator<Item = &TaggedToken> {
        self.chunks.iter().flat_map(|chunk| chunk.tokens.iter())
    }

    /// The number of tokens in the tree.
    pub fn len(&self) -> usize {
        self.chunks.iter().map(Chunk::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The source positions of all tokens in tree order.
    pub fn positions(&self) -> Vec<usize> {
        self.tokens().map(TaggedToken::position).collect()
    }
}

impl fmt::Display for ShallowTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(S")?;
        for chunk in &self.chunks {
            write!(f, " {}", chunk)?;
        }
        write!(f, ")")
    }
}
