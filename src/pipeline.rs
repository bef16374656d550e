//! The [Translator] composing all stages: tag, chunk, reorder, substitute.

use itertools::Itertools;
use log::error;
use std::sync::Arc;

use crate::{
    components::{
        chunker::Chunker,
        dictionary::{Dictionary, TargetWord},
        tagger::Tagger,
        transfer::SyntacticTransfer,
    },
    types::{ShallowTree, Token},
    utils::{
        self,
        parallelism::{MaybeParallelRefIterator, ParallelIterator},
    },
    Error, InvariantError,
};

/// The result of translating one sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    source: ShallowTree,
    tree: ShallowTree,
    words: Vec<TargetWord>,
}

impl Translation {
    /// The chunked source sentence.
    pub fn source(&self) -> &ShallowTree {
        &self.source
    }

    /// The tree after syntactic transfer. The target words are in the order of its tokens.
    pub fn tree(&self) -> &ShallowTree {
        &self.tree
    }

    pub fn target_words(&self) -> &[TargetWord] {
        &self.words
    }

    pub fn words(&self) -> Vec<&str> {
        self.words.iter().map(TargetWord::text).collect()
    }

    /// Renders the translation as text.
    pub fn text(&self) -> String {
        utils::join_words(&self.words())
    }
}

/// Translates sentences. Cheap to clone, all stages are shared and never mutated.
#[derive(Debug, Clone)]
pub struct Translator {
    tagger: Arc<Tagger>,
    chunker: Arc<Chunker>,
    transfer: Arc<SyntacticTransfer>,
    dictionary: Arc<Dictionary>,
}

impl Translator {
    pub fn new(
        tagger: Tagger,
        chunker: Chunker,
        transfer: SyntacticTransfer,
        dictionary: Dictionary,
    ) -> Self {
        Self::from_shared(
            Arc::new(tagger),
            Arc::new(chunker),
            Arc::new(transfer),
            Arc::new(dictionary),
        )
    }

    /// Creates a translator from stages which are shared with other translators.
    pub fn from_shared(
        tagger: Arc<Tagger>,
        chunker: Arc<Chunker>,
        transfer: Arc<SyntacticTransfer>,
        dictionary: Arc<Dictionary>,
    ) -> Self {
        Translator {
            tagger,
            chunker,
            transfer,
            dictionary,
        }
    }

    pub fn tagger(&self) -> &Arc<Tagger> {
        &self.tagger
    }

    pub fn chunker(&self) -> &Arc<Chunker> {
        &self.chunker
    }

    pub fn transfer(&self) -> &Arc<SyntacticTransfer> {
        &self.transfer
    }

    pub fn dictionary(&self) -> &Arc<Dictionary> {
        &self.dictionary
    }

    fn stages(&self, tokens: &[Token]) -> Result<Translation, InvariantError> {
        let source = self.chunker.chunk(self.tagger.tag(tokens))?;
        let tree = self.transfer.transfer(&source)?;
        let words = self.dictionary.transfer(&tree);

        Ok(Translation {
            source,
            tree,
            words,
        })
    }

    /// Translates one sentence of tokens.
    ///
    /// # Errors
    /// - If a stage breaks its guarantees on this sentence. The error names the sentence.
    pub fn translate_tokens(&self, tokens: &[Token]) -> Result<Translation, Error> {
        self.stages(tokens).map_err(|source| {
            let sentence = tokens.iter().map(Token::text).join(" ");
            error!("Failed to translate \"{}\": {}", sentence, source);

            Error::Sentence { sentence, source }
        })
    }

    /// Tokenizes and translates one sentence.
    pub fn translate_sentence(&self, sentence: &str) -> Result<Translation, Error> {
        let tokens: Vec<Token> = utils::split(sentence)
            .into_iter()
            .enumerate()
            .map(|(i, word)| Token::new(word, i))
            .collect();

        self.translate_tokens(&tokens)
    }

    /// Translates many sentences, in parallel if the `parallel` feature is enabled. Every sentence gets its own
    /// result in input order.
    pub fn translate_batch<S: AsRef<str> + Sync>(
        &self,
        sentences: &[S],
    ) -> Vec<Result<Translation, Error>> {
        sentences
            .maybe_par_iter()
            .map(|sentence| self.translate_sentence(sentence.as_ref()))
            .collect()
    }

    /// Splits text into sentences and translates them.
    ///
    /// # Errors
    /// - The first error of any sentence.
    pub fn translate(&self, text: &str) -> Result<Vec<Translation>, Error> {
        self.translate_batch(&utils::sentences(text))
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        components::{
            chunker::{ChunkGrammar, ChunkRule},
            dictionary::Status,
            tagger::{learn::Learner, LexiconOptions},
            transfer::{Level, SyntacticRule},
        },
        types::{tokens_from, ChunkKind},
    };

    fn translator() -> Translator {
        let corpus = vec![
            vec![("la", "da"), ("casa", "n"), ("roja", "a"), (".", "Fp")],
            vec![("el", "da"), ("perro", "n"), ("come", "v")],
        ];
        let tagger = Learner::new(Default::default())
            .unwrap()
            .train(&corpus, LexiconOptions::default())
            .unwrap();
        let chunker = Chunker::new(ChunkGrammar {
            rules: vec![
                ChunkRule::new(ChunkKind::NounPhrase, &["d", "n"], &["n"]).unwrap(),
                ChunkRule::new(ChunkKind::AdjectivePhrase, &["a"], &["a"]).unwrap(),
                ChunkRule::new(ChunkKind::VerbPhrase, &["v"], &["v"]).unwrap(),
            ],
        })
        .unwrap();
        let transfer = SyntacticTransfer::new(vec![SyntacticRule::from_labels(
            "noun-adjective",
            Level::Token,
            &["n", "a"],
            &["a", "n"],
        )
        .unwrap()
        .within(vec![ChunkKind::NounPhrase, ChunkKind::AdjectivePhrase])]);
        let dictionary: Dictionary = vec![
            ("la", "the"),
            ("el", "the"),
            ("casa", "house"),
            ("roja", "red"),
            ("perro", "dog"),
            ("come", "eats"),
            (".", "."),
        ]
        .into_iter()
        .collect();

        Translator::new(tagger, chunker, transfer, dictionary)
    }

    #[test]
    fn translates_tokens() {
        let translation = translator()
            .translate_tokens(&tokens_from(vec!["la", "casa", "roja"]))
            .unwrap();

        assert_eq!(translation.words(), vec!["the", "red", "house"]);
        assert_eq!(
            translation.source().to_string(),
            "(S (NP la/da casa/n) (AdjP roja/a))"
        );
        assert_eq!(translation.tree().to_string(), "(S (NP la/da roja/a casa/n))");
    }

    #[test]
    fn translates_text() {
        let translations = translator()
            .translate("La casa roja. El perro come gatos.")
            .unwrap();

        assert_eq!(translations.len(), 2);
        assert_eq!(translations[0].text(), "The red house.");
        assert_eq!(translations[1].text(), "The dog eats gatos.");
        assert_eq!(
            translations[1].target_words()[3].status(),
            Status::Untranslated
        );
    }

    #[test]
    fn batch_keeps_order() {
        let sentences = vec!["el perro come", "la casa roja", ""];
        let results = translator().translate_batch(&sentences);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().text(), "the dog eats");
        assert_eq!(results[1].as_ref().unwrap().text(), "the red house");
        assert!(results[2].as_ref().unwrap().words().is_empty());
    }
}
