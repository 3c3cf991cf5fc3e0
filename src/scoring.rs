//! Page scoring strategies.
//!
//! The extractor asks a [`PageScorer`] for a score per document. The default
//! is a constant; [`PhraseRatioScorer`] rates content by how many of its
//! phrases fall in positive versus negative phrase sets.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Scores the visible text of a document.
pub trait PageScorer: Send + Sync {
    /// Returns the score for `content`.
    fn score(&self, content: &str) -> f32;
}

/// Gives every page the same score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantScorer(pub f32);

impl Default for ConstantScorer {
    fn default() -> Self {
        Self(1.0)
    }
}

impl PageScorer for ConstantScorer {
    fn score(&self, _content: &str) -> f32 {
        self.0
    }
}

/// Splits text into lowercase word shingles of 1..=`max_words` words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhraseShingler {
    max_words: usize,
}

impl PhraseShingler {
    /// Creates a shingler; `max_words` below 1 is treated as 1.
    #[must_use]
    pub fn new(max_words: usize) -> Self {
        Self {
            max_words: max_words.max(1),
        }
    }

    /// Every shingle of the text, shortest first at each position.
    #[must_use]
    pub fn terms(&self, text: &str) -> Vec<String> {
        let words = tokenize(text);
        let mut terms = Vec::new();
        for start in 0..words.len() {
            for len in 1..=self.max_words {
                let end = start + len;
                if end > words.len() {
                    break;
                }
                terms.push(words[start..end].join(" "));
            }
        }
        terms
    }

    /// Canonical form of a phrase, as it would appear among [`Self::terms`].
    #[must_use]
    pub fn analyze_phrase(&self, phrase: &str) -> String {
        tokenize(phrase).join(" ")
    }
}

impl Default for PhraseShingler {
    fn default() -> Self {
        Self::new(2)
    }
}

/// Scores content as `positive ratio - negative ratio` over all shingles.
///
/// A shingle in both sets counts as positive. Empty content scores 0.
#[derive(Debug, Clone, Default)]
pub struct PhraseRatioScorer {
    shingler: PhraseShingler,
    positive: HashSet<String>,
    negative: HashSet<String>,
}

impl PhraseRatioScorer {
    /// Builds a scorer from phrase lists.
    pub fn new<P, N, S>(shingler: PhraseShingler, positive: P, negative: N) -> Self
    where
        P: IntoIterator<Item = S>,
        N: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let positive = analyze_all(shingler, positive);
        let negative = analyze_all(shingler, negative);
        Self {
            shingler,
            positive,
            negative,
        }
    }

    /// Loads positive and negative phrase files (one phrase per line, `#` comments).
    pub fn from_files(shingler: PhraseShingler, positive: &Path, negative: &Path) -> Result<Self> {
        let positive = read_phrases(positive)?;
        let negative = read_phrases(negative)?;
        Ok(Self::new(shingler, positive, negative))
    }
}

impl PageScorer for PhraseRatioScorer {
    fn score(&self, content: &str) -> f32 {
        let terms = self.shingler.terms(content);
        if terms.is_empty() {
            return 0.0;
        }

        let (mut positive, mut negative) = (0usize, 0usize);
        for term in &terms {
            if self.positive.contains(term) {
                positive += 1;
            } else if self.negative.contains(term) {
                negative += 1;
            }
        }

        let total = terms.len() as f32;
        (positive as f32 / total) - (negative as f32 / total)
    }
}

fn analyze_all<I, S>(shingler: PhraseShingler, phrases: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    phrases
        .into_iter()
        .map(|p| shingler.analyze_phrase(p.as_ref()))
        .filter(|p| !p.is_empty())
        .collect()
}

fn read_phrases(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).map_err(|source| Error::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(text
        .lines()
        .filter(|line| !line.trim().starts_with('#'))
        .map(ToString::to_string)
        .collect())
}

/// Tokenize text into words.
///
/// Splits on anything that is not alphanumeric (apostrophes kept) and lowercases.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(str::to_lowercase)
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_scorer_ignores_content() {
        assert_eq!(ConstantScorer::default().score("anything"), 1.0);
        assert_eq!(ConstantScorer(0.25).score(""), 0.25);
    }

    #[test]
    fn shingles_cover_one_and_two_word_phrases() {
        let terms = PhraseShingler::new(2).terms("Great value, fast");
        assert_eq!(terms, vec!["great", "great value", "value", "value fast", "fast"]);
    }

    #[test]
    fn ratio_score_is_positive_minus_negative() {
        let scorer = PhraseRatioScorer::new(PhraseShingler::new(1), ["great"], ["bad"]);
        // terms: great, bad, okay, fine
        let score = scorer.score("great bad okay fine");
        assert!((score - 0.0).abs() < f32::EPSILON);

        let score = scorer.score("great great okay fine");
        assert!((score - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn multi_word_phrases_match_shingles() {
        let scorer = PhraseRatioScorer::new(PhraseShingler::new(2), ["customer service"], Vec::<&str>::new());
        // terms: customer, customer service, service
        let score = scorer.score("Customer   SERVICE");
        assert!((score - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn empty_content_scores_zero() {
        let scorer = PhraseRatioScorer::new(PhraseShingler::default(), ["x"], ["y"]);
        assert_eq!(scorer.score("   "), 0.0);
    }

    #[test]
    fn tokenize_splits_and_lowercases() {
        assert_eq!(tokenize("The QUICK, brown-fox"), vec!["the", "quick", "brown", "fox"]);
        assert!(tokenize("").is_empty());
    }
}
