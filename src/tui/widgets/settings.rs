use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::stats::StatsStore;
use crate::tui::App;

pub fn draw<S: StatsStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Topics
            Constraint::Length(3), // Question count
        ])
        .split(area);

    draw_topics(f, app, chunks[0]);
    draw_count(f, app, chunks[1]);
}

fn draw_topics<S: StatsStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Topics ")
        .title_style(Style::default().fg(Color::Cyan));

    if app.topics.items.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from("No topics available."),
            Line::from(Span::styled(
                "Run `quizzer build` to generate the question bank.",
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        f.render_widget(empty, area);
        return;
    }

    let settings = app.quiz().settings();
    let bank = app.quiz().bank();

    let items: Vec<ListItem> = app
        .topics
        .items
        .iter()
        .map(|topic| {
            let checked = if settings.is_selected(&topic.name) {
                "[x] "
            } else {
                "[ ] "
            };

            let mut lines = vec![Line::from(vec![
                Span::styled(checked, Style::default().fg(Color::Yellow)),
                Span::styled(
                    topic.title.clone(),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("  ({} questions)", bank.question_count(&topic.name)),
                    Style::default().fg(Color::DarkGray),
                ),
            ])];

            if !topic.description.is_empty() {
                lines.push(Line::from(Span::styled(
                    format!("    {}", topic.description),
                    Style::default().fg(Color::Gray),
                )));
            }

            if let Some(stats) = app.stats.get(&topic.name) {
                if stats.total_questions > 0 {
                    lines.push(Line::from(Span::styled(
                        format!(
                            "    Last result: {} of {} ({:.1}%)",
                            stats.correct_answers, stats.total_questions, stats.percent_correct
                        ),
                        Style::default()
                            .fg(Color::Green)
                            .add_modifier(Modifier::BOLD),
                    )));
                }
            }

            ListItem::new(lines)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.topics.selected);

    f.render_stateful_widget(list, area, &mut state);
}

fn draw_count<S: StatsStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    let settings = app.quiz().settings();

    let text = Line::from(vec![
        Span::styled("Questions: ", Style::default().fg(Color::Gray)),
        Span::styled(
            format!("< {} >", settings.count),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("   Selected topics: {}", settings.topics.len()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let block = Block::default().borders(Borders::ALL).title(" Quiz ");
    f.render_widget(Paragraph::new(text).block(block), area);
}
