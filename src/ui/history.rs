use chrono::{DateTime, Local};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::app::App;
use crate::history::QuizSummary;

fn score_color(percent: f64) -> Color {
    if percent >= 80.0 {
        Color::Green
    } else if percent >= 50.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Pure presenter for one history row
pub fn present_row(summary: &QuizSummary, now: DateTime<Local>) -> Row<'static> {
    Row::new(vec![
        Cell::from(summary.quiz_id.clone()).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(summary.attempts.to_string()),
        Cell::from(format!("{}%", summary.best_percent))
            .style(Style::default().fg(score_color(summary.best_percent as f64))),
        Cell::from(format!("{:.1}%", summary.avg_percent))
            .style(Style::default().fg(score_color(summary.avg_percent))),
        Cell::from(summary.last_completed_ago(now)),
    ])
}

/// Render the result history screen
pub fn render_history(app: &App, f: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Table
            Constraint::Length(3), // Instructions
        ])
        .split(f.area());

    let title = Paragraph::new("Quiz History")
        .block(Block::default().borders(Borders::ALL))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    if app.history_summary.is_empty() {
        let text = if app.has_history() {
            "No results yet.\nComplete a quiz to see your history!"
        } else {
            "History is disabled for this run."
        };
        let no_data = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("No Data"))
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        f.render_widget(no_data, chunks[1]);
    } else {
        let now = Local::now();
        let header = Row::new(vec!["Quiz", "Attempts", "Best", "Average", "Last taken"]).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
        let rows: Vec<Row> = app
            .history_summary
            .iter()
            .map(|s| present_row(s, now))
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Min(16),
                Constraint::Length(10),
                Constraint::Length(8),
                Constraint::Length(10),
                Constraint::Length(20),
            ],
        )
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Results by quiz"));
        f.render_widget(table, chunks[1]);
    }

    let instructions = Paragraph::new("(b)ack / (esc)ape")
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC))
        .alignment(Alignment::Center);
    f.render_widget(instructions, chunks[2]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{HistoryDb, SessionRecord};
    use crate::quiz::Quiz;
    use crate::session::Score;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(90, 20)).unwrap();
        terminal.draw(|f| render_history(app, f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_score_color() {
        assert_eq!(score_color(100.0), Color::Green);
        assert_eq!(score_color(67.0), Color::Yellow);
        assert_eq!(score_color(0.0), Color::Red);
    }

    #[test]
    fn test_render_empty_history() {
        let db = HistoryDb::open_in_memory().unwrap();
        let mut app = App::new(Arc::new(Quiz::bundled("sample").unwrap()), Some(db), true).unwrap();
        app.open_history();

        assert!(render(&app).contains("No results yet."));
    }

    #[test]
    fn test_render_disabled_history() {
        let mut app = App::new(Arc::new(Quiz::bundled("sample").unwrap()), None, true).unwrap();
        app.open_history();

        assert!(render(&app).contains("History is disabled"));
    }

    #[test]
    fn test_render_with_results() {
        let db = HistoryDb::open_in_memory().unwrap();
        db.record(&SessionRecord::new("sample", Score::new(2, 3), Local::now()))
            .unwrap();
        let mut app = App::new(Arc::new(Quiz::bundled("sample").unwrap()), Some(db), true).unwrap();
        app.open_history();

        let out = render(&app);
        assert!(out.contains("sample"));
        assert!(out.contains("67%"));
        assert!(out.contains("67.0%"));
    }
}
