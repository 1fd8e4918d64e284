use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Padding, Paragraph, Wrap},
};

use crate::app::App;
use crate::models::{AnswerFeedback, Question};

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let Some(question) = app.current_question() else {
        return;
    };

    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(4),
        Constraint::Length(9),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .margin(2)
    .split(area);

    render_progress(frame, chunks[0], app);
    render_question_text(frame, chunks[1], &question.question);
    render_options(frame, chunks[2], question, app);
    if let Some(feedback) = app.feedback() {
        render_feedback(frame, chunks[3], question, feedback);
    }
    render_controls(frame, chunks[4], app.feedback().is_some());
}

fn render_progress(frame: &mut Frame, area: Rect, app: &App) {
    let progress = format!(
        "{}/{}",
        app.current_question_number(),
        app.total_questions()
    );
    let widget = Paragraph::new(progress)
        .alignment(Alignment::Right)
        .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}

fn render_question_text(frame: &mut Frame, area: Rect, text: &str) {
    let widget = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .fg(Color::White)
        .bold();
    frame.render_widget(widget, area);
}

fn option_style(is_selected: bool, is_answer: bool, revealed: bool) -> Style {
    match (revealed, is_answer, is_selected) {
        (true, true, _) => Style::default().fg(Color::Green).bold(),
        (true, false, true) => Style::default().fg(Color::Red).bold(),
        (false, _, true) => Style::default().fg(Color::Cyan).bold(),
        _ => Style::default().fg(Color::Gray),
    }
}

fn render_options(frame: &mut Frame, area: Rect, question: &Question, app: &App) {
    let revealed = app.feedback().is_some();
    let mut lines: Vec<Line> = Vec::with_capacity(question.choices.len() * 2);

    for (index, choice) in question.choices.iter().enumerate() {
        let is_selected = index == app.selected_option();
        let style = option_style(is_selected, choice.key == question.answer, revealed);
        let marker = if is_selected { ">" } else { " " };

        lines.push(Line::from(vec![
            Span::styled(format!(" {} ", marker), style),
            Span::styled(choice.label(), style),
        ]));
        lines.push(Line::from(""));
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn render_feedback(frame: &mut Frame, area: Rect, question: &Question, feedback: &AnswerFeedback) {
    let verdict = if feedback.correct {
        Span::styled("Correct!", Style::default().fg(Color::Green).bold())
    } else {
        Span::styled(
            format!("Incorrect. The answer is {}.", question.answer),
            Style::default().fg(Color::Red).bold(),
        )
    };

    let lines = vec![
        Line::from(verdict),
        Line::from(""),
        Line::from(feedback.explanation.as_str()).fg(Color::Gray),
    ];

    let widget = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Color::DarkGray)
            .padding(Padding::horizontal(1)),
    );
    frame.render_widget(widget, area);
}

fn render_controls(frame: &mut Frame, area: Rect, answered: bool) {
    let text = if answered {
        "n next  ·  p previous  ·  q quit"
    } else {
        "j/k navigate  ·  enter answer  ·  n/p skip  ·  q quit"
    };
    let widget = Paragraph::new(text)
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}
