use log::{debug, info};
use serde::Serialize;
use std::sync::Arc;

use crate::error::QuizError;
use crate::quiz::{AnswerRecord, Question, Quiz};

/// Lifecycle status of a quiz session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Status {
    NotStarted,
    InProgress,
    Complete,
}

/// Final result of a completed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Score {
    pub correct: usize,
    pub total: usize,
    pub percent: u8,
}

impl Score {
    /// `total` must be non-zero.
    pub fn new(correct: usize, total: usize) -> Self {
        Self {
            correct,
            total,
            percent: round_half_up_percent(correct, total),
        }
    }
}

/// `round(100 * correct / total)` with halves rounded up, in integer arithmetic.
pub fn round_half_up_percent(correct: usize, total: usize) -> u8 {
    let pct = (200 * correct + total) / (2 * total);
    pct.min(100) as u8
}

#[derive(Debug, Clone, PartialEq)]
enum Phase {
    NotStarted,
    InProgress { cursor: usize },
    // cursor stays on the last question
    Complete { cursor: usize, score: Score },
}

/// Navigation and answer state of one run through a quiz.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSession {
    quiz: Arc<Quiz>,
    answers: Vec<AnswerRecord>,
    phase: Phase,
}

impl QuizSession {
    pub fn new(quiz: Arc<Quiz>) -> Result<Self, QuizError> {
        quiz.validate()?;
        let answers = fresh_answers(&quiz);
        Ok(Self {
            quiz,
            answers,
            phase: Phase::NotStarted,
        })
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn status(&self) -> Status {
        match self.phase {
            Phase::NotStarted => Status::NotStarted,
            Phase::InProgress { .. } => Status::InProgress,
            Phase::Complete { .. } => Status::Complete,
        }
    }

    pub fn cursor(&self) -> usize {
        match self.phase {
            Phase::NotStarted => 0,
            Phase::InProgress { cursor } | Phase::Complete { cursor, .. } => cursor,
        }
    }

    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    pub fn question_count(&self) -> usize {
        self.quiz.questions.len()
    }

    pub fn current_question(&self) -> &Question {
        &self.quiz.questions[self.cursor()]
    }

    /// Selected choice for the question under the cursor.
    pub fn selected(&self) -> Option<usize> {
        self.answers[self.cursor()].answer
    }

    pub fn is_last_question(&self) -> bool {
        self.cursor() == self.last_index()
    }

    pub fn final_score(&self) -> Option<Score> {
        match self.phase {
            Phase::Complete { score, .. } => Some(score),
            _ => None,
        }
    }

    /// Percentage of the way through the quiz, counting the current question.
    pub fn progress(&self) -> Option<f64> {
        match self.phase {
            Phase::InProgress { cursor } => {
                Some(100.0 * (cursor + 1) as f64 / self.question_count() as f64)
            }
            _ => None,
        }
    }

    pub fn correct_count(&self) -> usize {
        self.answers
            .iter()
            .zip(self.quiz.questions.iter())
            .filter(|(a, q)| a.answer == Some(q.correct_choice))
            .count()
    }

    pub fn start(&mut self) -> Result<(), QuizError> {
        match self.phase {
            Phase::NotStarted => {
                self.phase = Phase::InProgress { cursor: 0 };
                info!("started quiz {}", self.quiz.id);
                Ok(())
            }
            _ => Err(self.reject("start")),
        }
    }

    pub fn select_answer(&mut self, choice: usize) -> Result<(), QuizError> {
        let Phase::InProgress { cursor } = self.phase else {
            return Err(self.reject("select_answer"));
        };

        let len = self.quiz.questions[cursor].choices.len();
        if choice >= len {
            debug!("choice {choice} rejected, question {cursor} has {len} choices");
            return Err(QuizError::InvalidChoice { index: choice, len });
        }

        self.answers[cursor].answer = Some(choice);
        Ok(())
    }

    /// Advance to the next question, or complete the quiz on the last one.
    pub fn next(&mut self) -> Result<(), QuizError> {
        let Phase::InProgress { cursor } = self.phase else {
            return Err(self.reject("next"));
        };

        if !self.answers[cursor].is_answered() {
            debug!("next rejected, question {cursor} is unanswered");
            return Err(QuizError::AnswerRequired);
        }

        if cursor < self.last_index() {
            self.phase = Phase::InProgress { cursor: cursor + 1 };
        } else {
            let score = Score::new(self.correct_count(), self.question_count());
            info!(
                "completed quiz {} with {}/{} ({}%)",
                self.quiz.id, score.correct, score.total, score.percent
            );
            self.phase = Phase::Complete { cursor, score };
        }

        Ok(())
    }

    pub fn previous(&mut self) -> Result<(), QuizError> {
        let Phase::InProgress { cursor } = self.phase else {
            return Err(self.reject("previous"));
        };

        if cursor == 0 {
            return Err(QuizError::AtBoundary);
        }

        self.phase = Phase::InProgress { cursor: cursor - 1 };
        Ok(())
    }

    /// Back to the freshly constructed state for the same quiz.
    pub fn restart(&mut self) {
        self.answers = fresh_answers(&self.quiz);
        self.phase = Phase::NotStarted;
        debug!("restarted quiz {}", self.quiz.id);
    }

    fn last_index(&self) -> usize {
        self.question_count() - 1
    }

    fn reject(&self, operation: &'static str) -> QuizError {
        let status = self.status();
        debug!("{operation} rejected while {status}");
        QuizError::InvalidTransition { operation, status }
    }
}

fn fresh_answers(quiz: &Quiz) -> Vec<AnswerRecord> {
    quiz.questions.iter().map(AnswerRecord::unanswered).collect()
}
