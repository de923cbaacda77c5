use chrono::{DateTime, Utc};
use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{ConstructionError, LoadError};

static BUNDLED_DIR: Dir = include_dir!("src/quizzes");

/// Name of the quiz used when none is given on the command line.
pub const DEFAULT_BUNDLED: &str = "sample";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(rename = "question")]
    pub prompt: String,
    pub choices: Vec<String>,
    pub correct_choice: usize,
}

impl Question {
    pub fn new<I: Into<String>, P: Into<String>>(
        id: I,
        prompt: P,
        choices: Vec<String>,
        correct_choice: usize,
    ) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            choices,
            correct_choice,
        }
    }

    pub fn is_correct(&self, choice: usize) -> bool {
        self.correct_choice == choice
    }
}

/// A read-only quiz as supplied by a quiz source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subject_ids: Vec<String>,
    pub questions: Vec<Question>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Quiz {
    pub fn new<S: Into<String>>(id: S, questions: Vec<Question>) -> Self {
        Self {
            id: id.into(),
            title: None,
            subject_ids: Vec::new(),
            questions,
            created_at: None,
            updated_at: None,
        }
    }

    /// Title for display, falling back to the id.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Check that the quiz can back a session.
    pub fn validate(&self) -> Result<(), ConstructionError> {
        if self.questions.is_empty() {
            return Err(ConstructionError::NoQuestions);
        }

        for q in &self.questions {
            if q.choices.len() < 2 {
                return Err(ConstructionError::TooFewChoices {
                    question_id: q.id.clone(),
                    count: q.choices.len(),
                });
            }
            if q.correct_choice >= q.choices.len() {
                return Err(ConstructionError::CorrectChoiceOutOfRange {
                    question_id: q.id.clone(),
                    index: q.correct_choice,
                    len: q.choices.len(),
                });
            }
        }

        Ok(())
    }

    pub fn from_json_str(s: &str) -> Result<Self, LoadError> {
        let quiz: Quiz = serde_json::from_str(s)?;
        quiz.validate()?;
        Ok(quiz)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Load one of the quizzes compiled into the binary.
    pub fn bundled(name: &str) -> Result<Self, LoadError> {
        let file = BUNDLED_DIR
            .get_file(format!("{name}.json"))
            .ok_or_else(|| LoadError::UnknownBundled(name.to_string()))?;
        let contents = file
            .contents_utf8()
            .ok_or_else(|| LoadError::UnknownBundled(name.to_string()))?;
        Self::from_json_str(contents)
    }
}

/// Names of all bundled quizzes, sorted.
pub fn bundled_names() -> Vec<String> {
    let mut names: Vec<String> = BUNDLED_DIR
        .files()
        .filter(|f| f.path().extension().is_some_and(|ext| ext == "json"))
        .filter_map(|f| f.path().file_stem().map(|s| s.to_string_lossy().into_owned()))
        .collect();
    names.sort();
    names
}

/// Per-question answer slot, positionally matching `Quiz::questions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerRecord {
    pub question_id: String,
    pub answer: Option<usize>,
}

impl AnswerRecord {
    pub fn unanswered(question: &Question) -> Self {
        Self {
            question_id: question.id.clone(),
            answer: None,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.answer.is_some()
    }
}
