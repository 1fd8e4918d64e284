use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Padding, Paragraph, Wrap},
};

use crate::app::{App, BuilderField, DocumentSummary};
use crate::generator::{DEFAULT_TOPIC, MAX_QUESTIONS};

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Fill(1),
        Constraint::Length(2),
        Constraint::Length(1),
    ])
    .margin(1)
    .split(area);

    let title = Paragraph::new(Line::from(Span::styled(
        "PDF QUIZ",
        Style::default().fg(Color::Cyan).bold(),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(title, chunks[0]);

    render_topic(frame, chunks[1], app);
    render_count(frame, chunks[2], app);
    render_documents(frame, chunks[3], app.documents());
    render_status(frame, chunks[4], app.status());
    render_controls(frame, chunks[5]);
}

fn field_block(title: &str, focused: bool) -> Block<'_> {
    let border = if focused { Color::Cyan } else { Color::DarkGray };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border)
        .padding(Padding::horizontal(1))
}

fn render_topic(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.field() == BuilderField::Topic;
    let line = if app.topic().is_empty() {
        Line::from(Span::styled(DEFAULT_TOPIC, Style::default().fg(Color::DarkGray)))
    } else {
        let cursor = if focused { "_" } else { "" };
        Line::from(vec![
            Span::styled(app.topic(), Style::default().fg(Color::White)),
            Span::styled(cursor, Style::default().fg(Color::Cyan)),
        ])
    };

    frame.render_widget(Paragraph::new(line).block(field_block(" Topic ", focused)), area);
}

fn render_count(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.field() == BuilderField::Count;
    let line = Line::from(vec![
        Span::styled(
            app.num_questions().to_string(),
            Style::default().fg(Color::White).bold(),
        ),
        Span::styled(
            format!("  (1-{})", MAX_QUESTIONS),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(line).block(field_block(" Questions ", focused)), area);
}

fn render_documents(frame: &mut Frame, area: Rect, documents: &DocumentSummary) {
    let mut lines: Vec<Line> = documents
        .files
        .iter()
        .map(|file| Line::from(format!(" {}", file)).fg(Color::Gray))
        .collect();

    lines.push(Line::from(""));
    let indexed = if documents.chunks > 0 {
        format!("{} pages · {} chunks indexed", documents.pages, documents.chunks)
    } else {
        format!("{} pages · indexed on first generation", documents.pages)
    };
    lines.push(Line::from(indexed).fg(Color::DarkGray));

    let widget = Paragraph::new(lines).block(
        Block::default()
            .title(" Documents ")
            .borders(Borders::ALL)
            .border_style(Color::DarkGray),
    );
    frame.render_widget(widget, area);
}

fn render_status(frame: &mut Frame, area: Rect, status: Option<&str>) {
    if let Some(status) = status {
        let widget = Paragraph::new(status)
            .wrap(Wrap { trim: true })
            .fg(Color::Red);
        frame.render_widget(widget, area);
    }
}

fn render_controls(frame: &mut Frame, area: Rect) {
    let widget = Paragraph::new("tab switch field  ·  ↑/↓ count  ·  enter generate  ·  esc quit")
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}
