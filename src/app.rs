use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::{error, info};
use std::sync::Arc;

use crate::error::QuizError;
use crate::history::{HistoryDb, QuizSummary, SessionRecord};
use crate::quiz::Quiz;
use crate::session::{QuizSession, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Quiz,
    History,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

/// Presentation state around a single quiz session.
#[derive(Debug)]
pub struct App {
    pub session: QuizSession,
    pub screen: Screen,
    pub show_progress: bool,
    /// Feedback for the last rejected key, cleared on the next accepted one.
    pub message: Option<String>,
    pub history_summary: Vec<QuizSummary>,
    history: Option<HistoryDb>,
}

impl App {
    pub fn new(
        quiz: Arc<Quiz>,
        history: Option<HistoryDb>,
        show_progress: bool,
    ) -> Result<Self, QuizError> {
        Ok(Self {
            session: QuizSession::new(quiz)?,
            screen: Screen::Quiz,
            show_progress,
            message: None,
            history_summary: Vec::new(),
            history,
        })
    }

    pub fn has_history(&self) -> bool {
        self.history.is_some()
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Action {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return Action::Quit;
        }

        match self.screen {
            Screen::History => {
                if matches!(key.code, KeyCode::Char('b') | KeyCode::Backspace) {
                    self.screen = Screen::Quiz;
                }
            }
            Screen::Quiz => {
                let result = match self.session.status() {
                    Status::NotStarted => self.on_start_key(key.code),
                    Status::InProgress => self.on_question_key(key.code),
                    Status::Complete => self.on_result_key(key.code),
                };
                self.message = result.err().map(|e| e.to_string());
            }
        }

        Action::Continue
    }

    fn on_start_key(&mut self, code: KeyCode) -> Result<(), QuizError> {
        match code {
            KeyCode::Enter | KeyCode::Char('s') => self.session.start(),
            _ => Ok(()),
        }
    }

    fn on_question_key(&mut self, code: KeyCode) -> Result<(), QuizError> {
        match code {
            KeyCode::Char(c @ '1'..='9') => {
                let idx = c as usize - '1' as usize;
                self.session.select_answer(idx)
            }
            KeyCode::Down => {
                let len = self.session.current_question().choices.len();
                let idx = self.session.selected().map_or(0, |s| (s + 1).min(len - 1));
                self.session.select_answer(idx)
            }
            KeyCode::Up => {
                let len = self.session.current_question().choices.len();
                let idx = self.session.selected().map_or(len - 1, |s| s.saturating_sub(1));
                self.session.select_answer(idx)
            }
            KeyCode::Enter | KeyCode::Right => {
                self.session.next()?;
                if self.session.status() == Status::Complete {
                    self.record_result();
                }
                Ok(())
            }
            KeyCode::Left => self.session.previous(),
            _ => Ok(()),
        }
    }

    fn on_result_key(&mut self, code: KeyCode) -> Result<(), QuizError> {
        match code {
            KeyCode::Char('r') => self.session.restart(),
            KeyCode::Char('h') => self.open_history(),
            _ => {}
        }
        Ok(())
    }

    fn record_result(&self) {
        let (Some(db), Some(rec)) = (&self.history, SessionRecord::from_session(&self.session))
        else {
            return;
        };
        match db.record(&rec) {
            Ok(()) => info!("recorded result for {}: {}%", rec.quiz_id, rec.percent),
            Err(e) => error!("failed to record result for {}: {}", rec.quiz_id, e),
        }
    }

    pub fn open_history(&mut self) {
        self.history_summary = match &self.history {
            Some(db) => db.summary().unwrap_or_else(|e| {
                error!("failed to load history: {}", e);
                Vec::new()
            }),
            None => Vec::new(),
        };
        self.screen = Screen::History;
    }
}
