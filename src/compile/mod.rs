//! Trains and writes the component binaries from a *build directory* containing:
//! - `corpus.tsv`: the tagged training corpus, one `word<TAB>tag` pair per line, sentences separated by blank lines.
//! - `dictionary.tsv`: the bilingual dictionary, one `english;english<TAB>spanish;spanish[<TAB>tag]` row per line.
//! - optionally `lexicon.tsv` with `word<TAB>tag` lines, which replaces the lexicon derived from the corpus.
//! - optionally `learner.json`, `lexicon.json`, `chunker.json`, `transfer.json` and `dictionary.json` to override
//! the bundled Spanish defaults.
//!
//! Lines starting with `#` are comments in all TSV files.

use fs_err as fs;
use log::info;
use serde::de::DeserializeOwned;
use std::{
    io,
    path::{Path, PathBuf},
};

use crate::{
    components::{
        chunker::{ChunkGrammar, Chunker},
        dictionary::{Dictionary, DictionaryOptions, Entry},
        tagger::{
            learn::{Learner, LearnerOptions},
            Lexicon, LexiconOptions, TagSet, Tagger,
        },
        transfer::SyntacticTransfer,
        Component,
    },
    lang::es,
    types::TagMatcher,
    Error,
};

pub type Corpus = Vec<Vec<(String, String)>>;

struct BuildFilePaths {
    corpus_path: PathBuf,
    dictionary_path: PathBuf,
    lexicon_path: PathBuf,
    learner_options_path: PathBuf,
    lexicon_options_path: PathBuf,
    chunker_path: PathBuf,
    transfer_path: PathBuf,
    dictionary_options_path: PathBuf,
}

impl BuildFilePaths {
    fn new<P: AsRef<Path>>(build_dir: P) -> Self {
        let p = build_dir.as_ref();
        BuildFilePaths {
            corpus_path: p.join("corpus.tsv"),
            dictionary_path: p.join("dictionary.tsv"),
            lexicon_path: p.join("lexicon.tsv"),
            learner_options_path: p.join("learner.json"),
            lexicon_options_path: p.join("lexicon.json"),
            chunker_path: p.join("chunker.json"),
            transfer_path: p.join("transfer.json"),
            dictionary_options_path: p.join("dictionary.json"),
        }
    }
}

/// Reads a JSON file if it exists, otherwise uses the default.
fn json_or<T: DeserializeOwned>(path: &Path, default: impl FnOnce() -> T) -> Result<T, Error> {
    if path.exists() {
        info!("{} exists. Using it instead of the default.", path.display());
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    } else {
        Ok(default())
    }
}

/// Iterates over the lines which are not comments, with their 1-based line numbers. Blank lines are kept.
fn lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim_start().starts_with('#'))
}

fn parse_error(path: &str, line: usize, message: impl Into<String>) -> Error {
    Error::Parse {
        path: path.to_string(),
        line,
        message: message.into(),
    }
}

fn parse_pair(path: &str, number: usize, line: &str) -> Result<(String, String), Error> {
    let mut columns = line.split('\t').map(str::trim);

    match (columns.next(), columns.next(), columns.next()) {
        (Some(word), Some(tag), None) if !word.is_empty() && !tag.is_empty() => {
            Ok((word.to_string(), tag.to_string()))
        }
        _ => Err(parse_error(path, number, "expected `word<TAB>tag`")),
    }
}

/// Parses a tagged corpus. `path` is only used in errors.
pub fn parse_corpus(text: &str, path: &str) -> Result<Corpus, Error> {
    let mut corpus = Vec::new();
    let mut sentence = Vec::new();

    for (number, line) in lines(text) {
        if line.trim().is_empty() {
            if !sentence.is_empty() {
                corpus.push(std::mem::take(&mut sentence));
            }
            continue;
        }

        sentence.push(parse_pair(path, number, line)?);
    }

    if !sentence.is_empty() {
        corpus.push(sentence);
    }

    Ok(corpus)
}

/// Parses a lexicon of `word<TAB>tag` lines. `path` is only used in errors.
pub fn parse_lexicon(text: &str, path: &str) -> Result<Vec<(String, String)>, Error> {
    lines(text)
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| parse_pair(path, number, line))
        .collect()
}

/// Parses a bilingual dictionary. All Spanish forms of a row get all English forms of the row, ranked in the order
/// they are listed. `path` is only used in errors.
pub fn parse_dictionary(
    text: &str,
    path: &str,
    options: DictionaryOptions,
) -> Result<Dictionary, Error> {
    let mut dictionary = Dictionary::new(options);

    for (number, line) in lines(text) {
        if line.trim().is_empty() {
            continue;
        }

        let columns: Vec<&str> = line.split('\t').map(str::trim).collect();
        if columns.len() < 2 || columns.len() > 3 {
            return Err(parse_error(
                path,
                number,
                "expected `english;english<TAB>spanish;spanish[<TAB>tag]`",
            ));
        }

        let tag = match columns.get(2).filter(|x| !x.is_empty()) {
            Some(tag) => Some(
                tag.parse::<TagMatcher>()
                    .map_err(|err| parse_error(path, number, err.to_string()))?,
            ),
            None => None,
        };

        let split = |column: &str| -> Vec<String> {
            column
                .split(';')
                .map(str::trim)
                .filter(|x| !x.is_empty())
                .map(str::to_string)
                .collect()
        };
        let targets = split(columns[0]);
        let sources = split(columns[1]);

        if targets.is_empty() || sources.is_empty() {
            return Err(parse_error(path, number, "empty translation"));
        }

        for source in &sources {
            for (rank, target) in targets.iter().enumerate() {
                let mut entry = Entry::new(target.as_str()).with_rank(rank as u32);
                entry.tag = tag.clone();
                dictionary.insert(source, entry);
            }
        }
    }

    Ok(dictionary)
}

pub fn read_corpus<P: AsRef<Path>>(path: P) -> Result<Corpus, Error> {
    let path = path.as_ref();
    parse_corpus(&fs::read_to_string(path)?, &path.display().to_string())
}

pub fn read_lexicon<P: AsRef<Path>>(path: P) -> Result<Vec<(String, String)>, Error> {
    let path = path.as_ref();
    parse_lexicon(&fs::read_to_string(path)?, &path.display().to_string())
}

pub fn read_dictionary<P: AsRef<Path>>(
    path: P,
    options: DictionaryOptions,
) -> Result<Dictionary, Error> {
    let path = path.as_ref();
    parse_dictionary(&fs::read_to_string(path)?, &path.display().to_string(), options)
}

/// Creates the lexicon from a lexicon file. Tags which only occur in the corpus are added to the tag set.
fn lexicon_from_file(
    path: &Path,
    corpus: &Corpus,
    options: LexiconOptions,
) -> Result<Lexicon, Error> {
    let entries = read_lexicon(path)?;
    let tagset = TagSet::new(
        entries
            .iter()
            .map(|(_, tag)| tag.as_str())
            .chain(corpus.iter().flatten().map(|(_, tag)| tag.as_str())),
        &options.fallback_tag,
    )?;

    Lexicon::new(tagset, entries, options)
}

/// Trains the tagger on the corpus of the build directory.
pub fn train<P: AsRef<Path>>(build_dir: P) -> Result<Tagger, Error> {
    let paths = BuildFilePaths::new(build_dir);

    let learner_options: LearnerOptions =
        json_or(&paths.learner_options_path, es::learner_options)?;
    let lexicon_options: LexiconOptions =
        json_or(&paths.lexicon_options_path, es::lexicon_options)?;

    info!("Reading corpus from {}.", paths.corpus_path.display());
    let corpus = read_corpus(&paths.corpus_path)?;

    let lexicon = if paths.lexicon_path.exists() {
        info!("{} exists. Using it as lexicon.", paths.lexicon_path.display());
        lexicon_from_file(&paths.lexicon_path, &corpus, lexicon_options)?
    } else {
        Lexicon::from_corpus(&corpus, lexicon_options)?
    };
    info!(
        "Lexicon has {} words and {} tags.",
        lexicon.len(),
        lexicon.tagset().len()
    );

    let rules = Learner::new(learner_options)?.learn(&corpus, &lexicon)?;
    Ok(Tagger::new(lexicon, rules)?)
}

/// Compiles the binaries from a build directory.
pub fn compile(
    build_dir: impl AsRef<Path>,
    tagger_dest: impl io::Write,
    chunker_dest: impl io::Write,
    transfer_dest: impl io::Write,
    dictionary_dest: impl io::Write,
) -> Result<(), Error> {
    let paths = BuildFilePaths::new(&build_dir);

    info!("Creating tagger.");
    train(&build_dir)?.to_writer(tagger_dest)?;

    info!("Creating chunker.");
    let grammar: ChunkGrammar = json_or(&paths.chunker_path, es::chunk_grammar)?;
    Chunker::new(grammar)?.to_writer(chunker_dest)?;

    info!("Creating syntactic transfer.");
    let transfer: SyntacticTransfer = json_or(&paths.transfer_path, es::syntactic_transfer)?;
    transfer.to_writer(transfer_dest)?;

    info!("Creating dictionary from {}.", paths.dictionary_path.display());
    let options = json_or(&paths.dictionary_options_path, es::dictionary_options)?;
    let dictionary = read_dictionary(&paths.dictionary_path, options)?;
    info!("Dictionary has {} lemmas.", dictionary.len());
    dictionary.to_writer(dictionary_dest)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{tokens_from, Tag};
    use tempdir::TempDir;

    const CORPUS: &str = concat!(
        "la\tda\ncasa\tn\nroja\ta\n\n",
        "el\tda\nperro\tn\ncome\tv\n\n",
        "la\tp\ncome\tv\n",
    );

    fn build_dir() -> TempDir {
        let dir = TempDir::new("traducir_build").unwrap();
        fs::write(dir.path().join("corpus.tsv"), CORPUS).unwrap();
        fs::write(
            dir.path().join("dictionary.tsv"),
            "the\tla;el\nhouse\tcasa\tn\nred\troja\n",
        )
        .unwrap();
        dir
    }

    fn tags(tagger: &Tagger, words: &[&str]) -> Vec<String> {
        tagger
            .tag(&tokens_from(words.iter().copied()))
            .iter()
            .map(|x| x.tag().to_string())
            .collect()
    }

    #[test]
    fn parses_corpus() {
        let text = "# comment\nla\tda\ncasa\tn\n\n\nel\tda\nperro\tn\n";
        let corpus = parse_corpus(text, "corpus.tsv").unwrap();

        assert_eq!(corpus.len(), 2);
        assert_eq!(
            corpus[0],
            vec![
                ("la".to_string(), "da".to_string()),
                ("casa".to_string(), "n".to_string())
            ]
        );
    }

    #[test]
    fn reports_line_numbers() {
        let text = "la\tda\ncasa\n";
        match parse_corpus(text, "corpus.tsv") {
            Err(Error::Parse { path, line, .. }) => {
                assert_eq!(path, "corpus.tsv");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn parses_dictionary() {
        let text = "house; home\tcasa\tn\nthe\tla;el\n";
        let dictionary =
            parse_dictionary(text, "dictionary.tsv", DictionaryOptions::default()).unwrap();

        assert_eq!(dictionary.len(), 3);
        assert_eq!(
            dictionary.lookup("casa", &Tag::new("ncfs000"), None, None).unwrap().target,
            "house"
        );
        assert_eq!(dictionary.get("casa")[1].rank, 1);
        assert_eq!(dictionary.get("el")[0].target, "the");

        assert!(matches!(
            parse_dictionary("house\n", "dictionary.tsv", DictionaryOptions::default()),
            Err(Error::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn parses_lexicon() {
        let lexicon = parse_lexicon("la\tda\n\ncasa\tn\n", "lexicon.tsv").unwrap();
        assert_eq!(lexicon.len(), 2);
    }

    #[test]
    fn trains_from_build_dir() {
        let dir = build_dir();
        let tagger = train(dir.path()).unwrap();

        assert_eq!(tagger.most_likely_tag("la"), "da");
        assert_eq!(tagger.most_likely_tag("azul"), "UNK");
        assert_eq!(tagger.rule_list().len(), 1);
        assert_eq!(tags(&tagger, &["la", "come"]), vec!["p", "v"]);
        assert_eq!(tags(&tagger, &["la", "casa"]), vec!["da", "n"]);
    }

    #[test]
    fn lexicon_file_replaces_corpus_lexicon() {
        let dir = build_dir();
        fs::write(
            dir.path().join("lexicon.tsv"),
            "# word\ttag\nla\tp\ncasa\tn\nazul\ta\n",
        )
        .unwrap();

        let tagger = train(dir.path()).unwrap();

        assert_eq!(tagger.lexicon().len(), 3);
        assert_eq!(tagger.most_likely_tag("azul"), "a");
        assert_eq!(tagger.most_likely_tag("perro"), "UNK");
        // corpus tags missing from the lexicon file are still part of the tag set
        assert!(tagger.tagset().id("v").is_some());
        assert!(tagger.tagset().id("da").is_some());
    }

    #[test]
    fn json_files_override_defaults() {
        let dir = build_dir();
        fs::write(dir.path().join("learner.json"), r#"{"max_rules": 0}"#).unwrap();
        assert!(train(dir.path()).unwrap().rule_list().is_empty());

        fs::write(dir.path().join("learner.json"), r#"{"min_score": 0}"#).unwrap();
        assert!(matches!(
            train(dir.path()),
            Err(Error::Config(crate::ConfigError::ZeroMinScore))
        ));

        fs::write(dir.path().join("learner.json"), "{").unwrap();
        assert!(matches!(train(dir.path()), Err(Error::Json(_))));
    }

    #[test]
    fn missing_corpus_is_an_error() {
        let dir = TempDir::new("traducir_empty").unwrap();
        assert!(matches!(train(dir.path()), Err(Error::Io(_))));
    }

    #[test]
    fn compiles_all_components() {
        let dir = build_dir();
        fs::write(
            dir.path().join("chunker.json"),
            r#"{"rules": [{"kind": "NP", "starts": ["d", "n"], "continues": ["n", "a"]}]}"#,
        )
        .unwrap();

        let (mut tagger, mut chunker, mut transfer, mut dictionary) =
            (Vec::new(), Vec::new(), Vec::new(), Vec::new());
        compile(
            dir.path(),
            &mut tagger,
            &mut chunker,
            &mut transfer,
            &mut dictionary,
        )
        .unwrap();

        let tagger = Tagger::from_reader(&tagger[..]).unwrap();
        assert_eq!(tags(&tagger, &["la", "come"]), vec!["p", "v"]);

        let chunker = Chunker::from_reader(&chunker[..]).unwrap();
        assert_eq!(chunker.grammar().rules.len(), 1);

        let transfer = SyntacticTransfer::from_reader(&transfer[..]).unwrap();
        assert_eq!(transfer, es::syntactic_transfer());

        let dictionary = Dictionary::from_reader(&dictionary[..]).unwrap();
        assert_eq!(dictionary.get("el")[0].target, "the");
        assert_eq!(dictionary.len(), 4);
    }

    #[test]
    fn saved_components_load_from_path() {
        let dir = build_dir();
        let path = dir.path().join("tagger.bin");

        let tagger = train(dir.path()).unwrap();
        tagger.save(&path).unwrap();
        let loaded = <Tagger as Component>::new(&path).unwrap();

        assert_eq!(
            tags(&loaded, &["la", "come", "la", "casa"]),
            tags(&tagger, &["la", "come", "la", "casa"])
        );
    }
}
