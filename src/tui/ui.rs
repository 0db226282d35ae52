use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use super::widgets::{question, results, settings};
use super::{App, Screen};
use crate::session::Phase;
use crate::stats::StatsStore;

pub fn draw<S: StatsStore>(f: &mut Frame, app: &App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Help bar
        ])
        .split(f.area());

    draw_tabs(f, app, chunks[0]);
    draw_content(f, app, chunks[1]);
    draw_help_bar(f, app, chunks[2]);
}

fn draw_tabs<S: StatsStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    let tab_titles = vec!["Settings", "Question", "Results"];
    let selected = match app.screen() {
        Screen::Settings => 0,
        Screen::Question => 1,
        Screen::Results => 2,
    };

    let tabs = Tabs::new(tab_titles)
        .block(Block::default().borders(Borders::ALL).title(" Quizzer "))
        .select(selected)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(tabs, area);
}

fn draw_content<S: StatsStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    match app.screen() {
        Screen::Settings => settings::draw(f, app, area),
        Screen::Question => question::draw(f, app, area),
        Screen::Results => results::draw(f, app, area),
    }
}

fn key(label: &str) -> Span<'_> {
    Span::styled(label, Style::default().fg(Color::Cyan))
}

fn draw_help_bar<S: StatsStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    let help_text = if let Some(notice) = &app.notice {
        vec![
            Span::styled("! ", Style::default().fg(Color::Yellow)),
            Span::styled(notice.as_str(), Style::default().fg(Color::White)),
        ]
    } else {
        let mut spans = Vec::new();

        match app.screen() {
            Screen::Settings => {
                spans.extend(vec![
                    key("j/k"),
                    Span::raw(" Nav  "),
                    key("<Space>"),
                    Span::raw(" Toggle  "),
                    key("h/l"),
                    Span::raw(" Count  "),
                    key("<CR>"),
                    Span::raw(" Start  "),
                ]);
            }
            Screen::Question => {
                let feedback = matches!(
                    app.session().map(|s| s.phase()),
                    Some(Phase::Feedback(_))
                );
                if feedback {
                    spans.extend(vec![key("<CR>"), Span::raw(" Next  ")]);
                } else {
                    let ready = app.session().is_some_and(|s| s.can_grade());
                    let check_style = if ready {
                        Style::default().fg(Color::Cyan)
                    } else {
                        Style::default().fg(Color::Gray)
                    };
                    spans.extend(vec![
                        key("j/k"),
                        Span::raw(" Nav  "),
                        key("<Space>/1-9"),
                        Span::raw(" Choose  "),
                        Span::styled("<CR>", check_style),
                        Span::raw(" Check  "),
                    ]);
                }
                spans.extend(vec![key("<Esc>"), Span::raw(" Abandon  ")]);
            }
            Screen::Results => {
                spans.extend(vec![key("r/<CR>"), Span::raw(" Start over  ")]);
            }
        }

        spans.extend(vec![key("q"), Span::raw(" Quit")]);

        spans
    };

    let help = Paragraph::new(Line::from(help_text)).style(Style::default().bg(Color::DarkGray));

    f.render_widget(help, area);
}
