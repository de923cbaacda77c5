// Library surface for headless/integration tests and reuse.
// The binary in main.rs only owns the terminal and CLI parsing.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod history;
pub mod library;
pub mod quiz;
pub mod runtime;
pub mod session;
pub mod subject;
pub mod ui;

pub use error::{ConstructionError, QuizError};
pub use quiz::{AnswerRecord, Question, Quiz};
pub use session::{QuizSession, Score, Status};

/// Interval between idle ticks of the TUI loop.
pub const TICK_RATE_MS: u64 = 100;
