//! # Quiz Question Bank
//!
//! Loads the quiz dataset once at startup. The file is a CSV with a header row
//! and the columns `lang,question,answer`, where `lang` is a locale tag such as
//! `fr-FR`. Rows are grouped by locale when a quiz starts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors while reading the dataset.
#[derive(Debug, Error)]
pub enum BankError {
    #[error("failed to read quiz dataset: {0}")]
    Io(#[from] io::Error),

    #[error("malformed quiz dataset: {0}")]
    Csv(#[from] csv::Error),
}

/// One quiz prompt and the phrase the learner should say.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizQuestion {
    pub prompt: String,
    pub expected_answer: String,
    pub locale: String,
}

/// Raw CSV row, named after the dataset's columns.
#[derive(Debug, Deserialize)]
struct QuizRow {
    lang: String,
    question: String,
    answer: String,
}

/// All quiz questions, across every locale.
#[derive(Debug, Clone, Default)]
pub struct QuizBank {
    questions: Vec<QuizQuestion>,
}

impl QuizBank {
    /// Build a bank from already-parsed questions.
    #[cfg(test)]
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        Self { questions }
    }

    /// Load the dataset from a CSV file.
    ///
    /// A missing file is not an error: the bank is empty and every quiz start
    /// reports that no questions are available for the chosen language.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BankError> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "Quiz dataset not found, quiz mode has no questions");
            return Ok(Self::default());
        }

        let file = std::fs::File::open(path)?;
        let bank = Self::from_reader(file)?;
        debug!(path = %path.display(), questions = bank.len(), "Quiz dataset loaded");
        Ok(bank)
    }

    /// Parse CSV from any reader (header row required).
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, BankError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut questions = Vec::new();
        for (line, row) in csv_reader.deserialize::<QuizRow>().enumerate() {
            let row = row?;
            if row.lang.is_empty() || row.question.is_empty() || row.answer.is_empty() {
                // +2: header row and 1-based numbering
                warn!(line = line + 2, "Skipping incomplete quiz row");
                continue;
            }
            questions.push(QuizQuestion {
                prompt: row.question,
                expected_answer: row.answer,
                locale: row.lang,
            });
        }

        Ok(Self { questions })
    }

    /// Questions for one locale tag, in dataset order.
    pub fn questions_for(&self, locale: &str) -> Vec<QuizQuestion> {
        self.questions
            .iter()
            .filter(|question| question.locale.eq_ignore_ascii_case(locale))
            .cloned()
            .collect()
    }

    /// Number of questions per locale (for health and language listings).
    pub fn counts_by_locale(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for question in &self.questions {
            *counts.entry(question.locale.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
lang,question,answer
fr-FR,How do you say 'good morning'?,Bonjour
fr-FR,How do you say 'thank you'?,Merci
es-ES,How do you say 'good night'?,Buenas noches
de-DE, How do you say 'please'? , Bitte
hi-IN,,नमस्ते
";

    #[test]
    fn parses_rows_and_trims_fields() {
        let bank = QuizBank::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(bank.len(), 4);

        let german = bank.questions_for("de-DE");
        assert_eq!(german.len(), 1);
        assert_eq!(german[0].prompt, "How do you say 'please'?");
        assert_eq!(german[0].expected_answer, "Bitte");
    }

    #[test]
    fn filters_by_locale() {
        let bank = QuizBank::from_reader(SAMPLE.as_bytes()).unwrap();
        let french = bank.questions_for("fr-FR");
        assert_eq!(french.len(), 2);
        assert!(french.iter().all(|q| q.locale == "fr-FR"));
        assert_eq!(bank.questions_for("fr-fr").len(), 2);
    }

    #[test]
    fn locale_without_rows_is_empty() {
        let bank = QuizBank::from_reader(SAMPLE.as_bytes()).unwrap();
        assert!(bank.questions_for("ta-IN").is_empty());
        // the Hindi row has no question, so it was skipped
        assert!(bank.questions_for("hi-IN").is_empty());
    }

    #[test]
    fn counts_by_locale() {
        let bank = QuizBank::from_reader(SAMPLE.as_bytes()).unwrap();
        let counts = bank.counts_by_locale();
        assert_eq!(counts.get("fr-FR"), Some(&2));
        assert_eq!(counts.get("es-ES"), Some(&1));
        assert_eq!(counts.get("ta-IN"), None);
    }

    #[test]
    fn missing_file_gives_empty_bank() {
        let dir = tempfile::tempdir().unwrap();
        let bank = QuizBank::load(dir.path().join("absent.csv")).unwrap();
        assert!(bank.is_empty());
    }

    #[test]
    fn malformed_csv_is_an_error() {
        let broken = "lang,question\nfr-FR,Only two columns\n";
        assert!(matches!(
            QuizBank::from_reader(broken.as_bytes()),
            Err(BankError::Csv(_))
        ));
    }

    #[test]
    fn bundled_dataset_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/game_phrases.csv");
        let bank = QuizBank::load(path).unwrap();
        assert!(!bank.questions_for("fr-FR").is_empty());
        assert!(bank.questions_for("ta-IN").is_empty());
    }
}
