pub mod history;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, Screen};
use crate::session::{QuizSession, Status};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

pub fn draw(app: &App, f: &mut Frame) {
    match app.screen {
        Screen::Quiz => f.render_widget(app, f.area()),
        Screen::History => history::render_history(app, f),
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let session = &self.session;
        let title = session.quiz().display_title().to_string();

        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(title, Style::default().add_modifier(Modifier::BOLD)));
        let inner = block.inner(area);
        block.render(area, buf);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN.min(inner.height / 4))
            .constraints([
                Constraint::Min(1),    // body
                Constraint::Length(1), // message
                Constraint::Length(1), // legend
            ])
            .split(inner);

        match session.status() {
            Status::NotStarted => render_start(session, chunks[0], buf),
            Status::InProgress => render_question(session, self.show_progress, chunks[0], buf),
            Status::Complete => render_result(session, chunks[0], buf),
        }

        if let Some(msg) = &self.message {
            Paragraph::new(Span::styled(msg.as_str(), Style::default().fg(Color::Yellow)))
                .alignment(Alignment::Center)
                .render(chunks[1], buf);
        }

        Paragraph::new(Span::styled(
            legend(session),
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .render(chunks[2], buf);
    }
}

fn legend(session: &QuizSession) -> &'static str {
    match session.status() {
        Status::NotStarted => "(enter) start / (esc)ape",
        Status::InProgress if session.is_last_question() => {
            "(1-9 ↑↓) choose / (enter) submit / (←) previous / (esc)ape"
        }
        Status::InProgress => "(1-9 ↑↓) choose / (enter →) next / (←) previous / (esc)ape",
        Status::Complete => "(r)estart / (h)istory / (esc)ape",
    }
}

fn render_start(session: &QuizSession, area: Rect, buf: &mut Buffer) {
    let text = vec![
        Line::from(Span::styled(
            "Ready to start the quiz?",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("{} questions", session.question_count())),
    ];
    Paragraph::new(text)
        .alignment(Alignment::Center)
        .render(centered_rows(area, 3), buf);
}

fn render_question(session: &QuizSession, show_progress: bool, area: Rect, buf: &mut Buffer) {
    let question = session.current_question();
    let prompt_lines = wrapped_height(&question.prompt, area.width);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),                          // counter
            Constraint::Length(if show_progress { 1 } else { 0 }),
            Constraint::Length(1),                          // spacing
            Constraint::Length(prompt_lines),
            Constraint::Length(1),                          // spacing
            Constraint::Min(question.choices.len() as u16),
        ])
        .split(area);

    let progress = session.progress().unwrap_or(0.0);
    let counter = format!(
        "Question {} of {}   {:.0}% complete",
        session.cursor() + 1,
        session.question_count(),
        progress
    );
    Paragraph::new(Span::styled(counter, Style::default().fg(Color::Gray))).render(chunks[0], buf);

    if show_progress {
        Gauge::default()
            .gauge_style(Style::default().fg(Color::Magenta))
            .ratio((progress / 100.0).clamp(0.0, 1.0))
            .label("")
            .render(chunks[1], buf);
    }

    Paragraph::new(Span::styled(
        question.prompt.as_str(),
        Style::default().add_modifier(Modifier::BOLD),
    ))
    .wrap(Wrap { trim: true })
    .render(chunks[3], buf);

    let selected = session.selected();
    let choices: Vec<Line> = question
        .choices
        .iter()
        .enumerate()
        .map(|(i, choice)| {
            let is_selected = selected == Some(i);
            let marker = if is_selected { "(•)" } else { "( )" };
            let style = if is_selected {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(Span::styled(format!("{marker} {}. {choice}", i + 1), style))
        })
        .collect();

    Paragraph::new(choices).render(chunks[5], buf);
}

fn render_result(session: &QuizSession, area: Rect, buf: &mut Buffer) {
    let Some(score) = session.final_score() else {
        return;
    };

    let color = match score.percent {
        80..=100 => Color::Green,
        50..=79 => Color::Yellow,
        _ => Color::Red,
    };

    let text = vec![
        Line::from(Span::styled(
            "Quiz Complete!",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Your Score"),
        Line::from(Span::styled(
            format!("{}%", score.percent),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                "You got {} out of {} questions correct",
                score.correct, score.total
            ),
            Style::default().fg(Color::Gray),
        )),
    ];

    Paragraph::new(text)
        .alignment(Alignment::Center)
        .render(centered_rows(area, 6), buf);
}

/// Rows needed to show `text` wrapped at `width` columns.
fn wrapped_height(text: &str, width: u16) -> u16 {
    if width == 0 {
        return 1;
    }
    (text.width() as f64 / width as f64).ceil().max(1.0) as u16
}

fn centered_rows(area: Rect, rows: u16) -> Rect {
    let rows = rows.min(area.height);
    Rect {
        y: area.y + (area.height - rows) / 2,
        height: rows,
        ..area
    }
}
