use itertools::Itertools;
use log::warn;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::LoadError;
use crate::quiz::{bundled_names, Quiz};
use crate::subject::{Subject, SubjectStore};

/// Where a quiz in the library came from.
#[derive(Debug, Clone, PartialEq)]
pub enum QuizSource {
    Bundled(String),
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct QuizEntry {
    pub source: QuizSource,
    pub quiz: Quiz,
}

/// Dashboard view over available quizzes and subjects
#[derive(Debug, Clone, Default)]
pub struct Library {
    pub quizzes: Vec<QuizEntry>,
    pub subjects: Vec<Subject>,
}

impl Library {
    /// Bundled quizzes, then any valid `*.json` quiz in `quiz_dir` (sorted by file name).
    pub fn discover(quiz_dir: Option<&Path>, subjects: &SubjectStore) -> Self {
        let mut quizzes: Vec<QuizEntry> = bundled_names()
            .into_iter()
            .filter_map(|name| match Quiz::bundled(&name) {
                Ok(quiz) => Some(QuizEntry {
                    source: QuizSource::Bundled(name),
                    quiz,
                }),
                Err(e) => {
                    warn!("bundled quiz {name} is invalid: {e}");
                    None
                }
            })
            .collect();

        if let Some(dir) = quiz_dir {
            quizzes.extend(load_dir(dir));
        }

        Self {
            quizzes,
            subjects: subjects.list(),
        }
    }

    pub fn find(&self, id: &str) -> Option<&Quiz> {
        self.quizzes.iter().map(|e| &e.quiz).find(|q| q.id == id)
    }
}

fn load_dir(dir: &Path) -> Vec<QuizEntry> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("cannot read quiz dir {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .sorted()
        .filter_map(|path| match Quiz::from_path(&path) {
            Ok(quiz) => Some(QuizEntry {
                source: QuizSource::File(path),
                quiz,
            }),
            Err(e) => {
                warn!("skipping quiz {}: {}", path.display(), e);
                None
            }
        })
        .collect()
}

/// Resolve a `--quiz` argument: an existing path, then a quiz id from `quiz_dir`,
/// then a bundled quiz name.
pub fn resolve_quiz(arg: &str, quiz_dir: Option<&Path>) -> Result<Quiz, LoadError> {
    let path = Path::new(arg);
    if path.exists() {
        return Quiz::from_path(path);
    }

    if let Some(dir) = quiz_dir {
        if let Some(entry) = load_dir(dir).into_iter().find(|e| e.quiz.id == arg) {
            return Ok(entry.quiz);
        }
    }

    Quiz::bundled(arg)
}
