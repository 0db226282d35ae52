use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::stats::StatsStore;
use crate::tui::App;

pub fn draw<S: StatsStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    let Some(session) = app.session() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Score
            Constraint::Min(0),    // Cumulative stats
        ])
        .split(area);

    let summary = session.summary();
    let score_color = if summary.total > 0 && summary.correct * 2 >= summary.total {
        Color::Green
    } else {
        Color::Yellow
    };

    let text = if session.is_empty() {
        vec![Line::from(Span::styled(
            "The selected topics have no questions.",
            Style::default().fg(Color::Yellow),
        ))]
    } else {
        vec![
            Line::from(vec![
                Span::styled("Correct answers: ", Style::default().fg(Color::Gray)),
                Span::styled(
                    format!(
                        "{} of {} ({}%)",
                        summary.correct,
                        summary.total,
                        summary.percent_label()
                    ),
                    Style::default()
                        .fg(score_color)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(Span::styled(
                format!("Topics: {}", session.topics().join(", ")),
                Style::default().fg(Color::DarkGray),
            )),
        ]
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Quiz Results ")
        .title_style(Style::default().fg(Color::Cyan));
    f.render_widget(Paragraph::new(text).block(block), chunks[0]);

    let items: Vec<ListItem> = session
        .topics()
        .iter()
        .filter_map(|name| app.stats.get(name).map(|s| (name, s)))
        .map(|(name, stats)| {
            let title = app
                .quiz()
                .bank()
                .topic(name)
                .map_or(name.as_str(), |t| t.title.as_str());
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<30}", title), Style::default().fg(Color::White)),
                Span::styled(
                    format!(
                        "{} of {} ({:.1}%)",
                        stats.correct_answers, stats.total_questions, stats.percent_correct
                    ),
                    Style::default().fg(Color::Green),
                ),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" All-time by topic ")
            .title_style(Style::default().fg(Color::Magenta)),
    );
    f.render_widget(list, chunks[1]);
}
