//! Transformation-based learning of the [RuleList] of a [Tagger].
//!
//! Starting from the initial guess of the lexicon, the learner repeatedly scores every candidate rule on the
//! training corpus and keeps the one with the highest net score, i. e. the number of tags it corrects minus the
//! number of tags it breaks. Candidates are all instances of the configured templates at positions which are
//! currently tagged incorrectly.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::{
    rule::{Template, TransformRule, Window},
    ConfigError, Error,
};

use super::{Lexicon, LexiconOptions, PosId, RuleList, Tagger};

/// Options for a learner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerOptions {
    /// The templates to create candidate rules from. Equally scoring rules are ordered by the position of
    /// their template in this list, then by their tags and parameters.
    pub templates: Vec<Template>,
    /// Learning stops once the best rule has a lower net score.
    pub min_score: usize,
    /// Learning stops after this many rules.
    pub max_rules: usize,
}

impl Default for LearnerOptions {
    fn default() -> Self {
        LearnerOptions {
            templates: Template::all().to_vec(),
            min_score: 1,
            max_rules: 200,
        }
    }
}

/// The number of tags a rule would correct (`good`) and break (`bad`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Score {
    pub good: usize,
    pub bad: usize,
}

impl Score {
    pub fn net(&self) -> isize {
        self.good as isize - self.bad as isize
    }
}

/// One training sentence: lowercased words, the current hypothesis and the gold tags.
struct Sample {
    words: Vec<String>,
    tags: Vec<PosId>,
    gold: Vec<PosId>,
}

impl Sample {
    fn window(&self) -> Window {
        Window::new(&self.words, &self.tags)
    }

    fn errors(&self) -> usize {
        self.tags
            .iter()
            .zip(&self.gold)
            .filter(|(tag, gold)| tag != gold)
            .count()
    }
}

/// Learns transformation rules from a tagged corpus.
#[derive(Debug, Clone)]
pub struct Learner {
    options: LearnerOptions,
}

impl Learner {
    /// Creates a new learner.
    ///
    /// # Errors
    /// - If there are no templates or a template is listed twice.
    /// - If the minimum score is zero.
    pub fn new(options: LearnerOptions) -> Result<Self, ConfigError> {
        if options.templates.is_empty() {
            return Err(ConfigError::EmptyTemplateSet);
        }

        let mut seen = BTreeSet::new();
        for template in &options.templates {
            if !seen.insert(*template) {
                return Err(ConfigError::DuplicateTemplate(template.name().to_string()));
            }
        }

        if options.min_score == 0 {
            return Err(ConfigError::ZeroMinScore);
        }

        Ok(Learner { options })
    }

    pub fn options(&self) -> &LearnerOptions {
        &self.options
    }

    /// Creates a lexicon from the corpus and learns the rules to correct it.
    pub fn train<S, T>(
        &self,
        corpus: &[Vec<(S, T)>],
        lexicon_options: LexiconOptions,
    ) -> Result<Tagger, Error>
    where
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let lexicon = Lexicon::from_corpus(corpus, lexicon_options)?;
        let rules = self.learn(corpus, &lexicon)?;

        Ok(Tagger::new(lexicon, rules)?)
    }

    /// Learns the rules which correct the initial guess of the lexicon on the corpus. The initial guess is
    /// computed exactly like the [Tagger] does. An empty corpus or a corpus without errors yields an empty list.
    ///
    /// # Errors
    /// - If a gold tag is not part of the tag set of the lexicon.
    pub fn learn<S, T>(&self, corpus: &[Vec<(S, T)>], lexicon: &Lexicon) -> Result<RuleList, Error>
    where
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let tagset = lexicon.tagset();
        let mut samples = corpus
            .iter()
            .map(|sentence| {
                let gold = sentence
                    .iter()
                    .map(|(_, tag)| {
                        tagset
                            .id(tag.as_ref())
                            .ok_or_else(|| Error::UnknownTag(tag.as_ref().to_string()))
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(Sample {
                    words: sentence
                        .iter()
                        .map(|(word, _)| word.as_ref().to_lowercase())
                        .collect(),
                    tags: sentence
                        .iter()
                        .map(|(word, _)| lexicon.lookup(word.as_ref()).0)
                        .collect(),
                    gold,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let n_tokens: usize = samples.iter().map(|x| x.tags.len()).sum();
        let mut errors: usize = samples.iter().map(Sample::errors).sum();
        let mut rules = RuleList::default();

        info!(
            "Learning rules from {} tokens with {} initial errors.",
            n_tokens, errors
        );

        while errors > 0 {
            if rules.len() >= self.options.max_rules {
                warn!(
                    "Stopped after the maximum of {} rules with {} errors left.",
                    self.options.max_rules, errors
                );
                break;
            }

            let (rule, score) = match self.best_rule(&samples) {
                Some((rule, score)) if score.net() >= self.options.min_score as isize => {
                    (rule, score)
                }
                _ => break,
            };

            for sample in samples.iter_mut() {
                rule.apply(&sample.words, &mut sample.tags);
            }

            let remaining: usize = samples.iter().map(Sample::errors).sum();
            debug_assert_eq!(remaining as isize, errors as isize - score.net());
            errors = remaining;

            info!(
                "Rule #{}: {} (+{} -{}), {} errors left.",
                rules.len(),
                rule.display(tagset),
                score.good,
                score.bad,
                errors
            );
            rules.push(rule);
        }

        info!("Learned {} rules.", rules.len());
        Ok(rules)
    }

    /// Finds the candidate rule with the highest net score. Ties go to the candidate which comes first in
    /// template priority, then in the order of [TransformRule].
    fn best_rule(&self, samples: &[Sample]) -> Option<(TransformRule, Score)> {
        let mut candidates: BTreeSet<(usize, TransformRule)> = BTreeSet::new();
        // upper bound of the good count of any rule changing `from` to `to`
        let mut n_errors: HashMap<(PosId, PosId), usize> = HashMap::new();
        let mut positions: HashMap<PosId, Vec<(usize, usize)>> = HashMap::new();

        for (s, sample) in samples.iter().enumerate() {
            let window = sample.window();

            for i in 0..window.len() {
                let (tag, gold) = (sample.tags[i], sample.gold[i]);
                positions.entry(tag).or_insert_with(Vec::new).push((s, i));

                if tag == gold {
                    continue;
                }

                *n_errors.entry((tag, gold)).or_insert(0) += 1;
                for (rank, template) in self.options.templates.iter().enumerate() {
                    if let Some(context) = template.instantiate(&window, i) {
                        candidates.insert((rank, TransformRule::new(tag, gold, context)));
                    }
                }
            }
        }

        let mut best: Option<(TransformRule, Score)> = None;

        for (_, rule) in candidates {
            let best_net = best.as_ref().map_or(0, |(_, score)| score.net());
            if n_errors[&(rule.from, rule.to)] as isize <= best_net {
                continue;
            }

            let score = Self::score(&rule, samples, &positions[&rule.from]);
            if score.net() > best_net {
                best = Some((rule, score));
            }
        }

        best
    }

    fn score(rule: &TransformRule, samples: &[Sample], positions: &[(usize, usize)]) -> Score {
        let mut score = Score::default();

        for (s, i) in positions {
            let sample = &samples[*s];

            if !rule.is_match(&sample.window(), *i) {
                continue;
            }

            let gold = sample.gold[*i];
            if gold == rule.to {
                score.good += 1;
            } else if gold == rule.from {
                score.bad += 1;
            }
        }

        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tokens_from;

    // the point of this corpus is to generate a n -> v / t _ rule
    fn corpus() -> Vec<Vec<(&'static str, &'static str)>> {
        vec![
            vec![
                ("the", "d"),
                ("horse", "n"),
                ("wants", "v"),
                ("to", "t"),
                ("race", "v"),
            ],
            vec![("the", "d"), ("race", "n"), ("happened", "v")],
            vec![("the", "d"), ("race", "n"), ("continued", "v")],
        ]
    }

    fn tags(tagger: &Tagger, words: &[&str]) -> Vec<String> {
        tagger
            .tag(&tokens_from(words.iter().copied()))
            .iter()
            .map(|x| x.tag().to_string())
            .collect()
    }

    #[test]
    fn learns_single_rule() {
        let tagger = Learner::new(LearnerOptions::default())
            .unwrap()
            .train(&corpus(), LexiconOptions::default())
            .unwrap();

        assert_eq!(tagger.most_likely_tag("race"), "n");
        assert_eq!(tagger.most_likely_tag("the"), "d");
        assert_eq!(tagger.rule_list().len(), 1);
        assert_eq!(
            tagger.rule_list().rules()[0]
                .display(tagger.tagset())
                .to_string(),
            "n -> v / t _"
        );

        assert_eq!(tags(&tagger, &["the", "race"]), vec!["d", "n"]);
        assert_eq!(tags(&tagger, &["to", "race"]), vec!["t", "v"]);
        assert_eq!(
            tags(&tagger, &["the", "horse", "continued", "the", "race"]),
            vec!["d", "n", "v", "d", "n"]
        );
    }

    #[test]
    fn empty_corpus_gives_empty_rules() {
        let learner = Learner::new(LearnerOptions::default()).unwrap();
        let corpus: Vec<Vec<(&str, &str)>> = Vec::new();

        let tagger = learner.train(&corpus, LexiconOptions::default()).unwrap();
        assert!(tagger.rule_list().is_empty());
        assert_eq!(tagger.tagset().len(), 1);
    }

    #[test]
    fn perfect_initial_guess_gives_empty_rules() {
        let corpus = vec![vec![("el", "d"), ("perro", "n")]];
        let tagger = Learner::new(LearnerOptions::default())
            .unwrap()
            .train(&corpus, LexiconOptions::default())
            .unwrap();

        assert!(tagger.rule_list().is_empty());
    }

    #[test]
    fn respects_max_rules() {
        let options = LearnerOptions {
            max_rules: 0,
            ..LearnerOptions::default()
        };
        let tagger = Learner::new(options)
            .unwrap()
            .train(&corpus(), LexiconOptions::default())
            .unwrap();

        assert!(tagger.rule_list().is_empty());
    }

    #[test]
    fn respects_min_score() {
        let options = LearnerOptions {
            min_score: 2,
            ..LearnerOptions::default()
        };
        let tagger = Learner::new(options)
            .unwrap()
            .train(&corpus(), LexiconOptions::default())
            .unwrap();

        // the only useful rule corrects a single tag
        assert!(tagger.rule_list().is_empty());
    }

    #[test]
    fn tie_break_follows_template_priority() {
        // both `prev_word` and `prev_tag` fix the error, the earlier template wins
        let corpus = vec![
            vec![("to", "t"), ("race", "v")],
            vec![("race", "n"), ("race", "n")],
        ];

        for (templates, expected) in vec![
            (vec![Template::PrevTag, Template::PrevWord], Template::PrevTag),
            (vec![Template::PrevWord, Template::PrevTag], Template::PrevWord),
        ] {
            let options = LearnerOptions {
                templates,
                ..LearnerOptions::default()
            };
            let tagger = Learner::new(options)
                .unwrap()
                .train(&corpus, LexiconOptions::default())
                .unwrap();

            assert_eq!(tagger.rule_list().len(), 1);
            assert_eq!(tagger.rule_list().rules()[0].template(), expected);
        }
    }

    #[test]
    fn rejects_invalid_options() {
        assert_eq!(
            Learner::new(LearnerOptions {
                templates: Vec::new(),
                ..LearnerOptions::default()
            })
            .unwrap_err(),
            ConfigError::EmptyTemplateSet
        );
        assert_eq!(
            Learner::new(LearnerOptions {
                templates: vec![Template::PrevTag, Template::PrevTag],
                ..LearnerOptions::default()
            })
            .unwrap_err(),
            ConfigError::DuplicateTemplate("prev_tag".into())
        );
        assert_eq!(
            Learner::new(LearnerOptions {
                min_score: 0,
                ..LearnerOptions::default()
            })
            .unwrap_err(),
            ConfigError::ZeroMinScore
        );
    }

    #[test]
    fn rejects_unknown_gold_tags() {
        let lexicon = Lexicon::new(
            crate::components::tagger::TagSet::new(vec!["n"], "UNK").unwrap(),
            vec![("casa", "n")],
            LexiconOptions::default(),
        )
        .unwrap();
        let corpus = vec![vec![("casa", "v")]];

        let result = Learner::new(LearnerOptions::default())
            .unwrap()
            .learn(&corpus, &lexicon);
        assert!(matches!(result, Err(Error::UnknownTag(tag)) if tag == "v"));
    }
}
