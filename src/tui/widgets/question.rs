use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::models::{GradeMode, GradeResult, Question};
use crate::session::Session;
use crate::stats::StatsStore;
use crate::tui::App;

pub fn draw<S: StatsStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    let Some(session) = app.session() else {
        return;
    };
    let Some(question) = session.current() else {
        return;
    };

    let feedback_height = match session.feedback() {
        Some(_) => 6,
        None => 0,
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),               // Question text
            Constraint::Min(0),                  // Answers
            Constraint::Length(feedback_height), // Feedback
        ])
        .split(area);

    draw_question(f, session, question, chunks[0]);
    draw_answers(f, app, session, question, chunks[1]);
    if let Some(result) = session.feedback() {
        draw_feedback(f, question, result, chunks[2]);
    }
}

fn draw_question(f: &mut Frame, session: &Session, question: &Question, area: Rect) {
    let title = format!(
        " Question {} of {}  Score {} ",
        session.position() + 1,
        session.len(),
        session.score()
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(Color::Cyan));

    let text = Paragraph::new(question.text.as_str())
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(block)
        .wrap(Wrap { trim: true });

    f.render_widget(text, area);
}

fn draw_answers<S: StatsStore>(
    f: &mut Frame,
    app: &App<S>,
    session: &Session,
    question: &Question,
    area: Rect,
) {
    let mode = question.grade_mode();
    let selection = session.selection();
    let revealed = session.feedback().is_some();

    let items: Vec<ListItem> = session
        .display_answers()
        .iter()
        .enumerate()
        .map(|(i, answer)| {
            let chosen = selection.is_some_and(|s| s.contains(&answer.id));
            let marker = match (mode, chosen) {
                (GradeMode::Single, true) => "(*)",
                (GradeMode::Single, false) => "( )",
                (GradeMode::Multiple, true) => "[x]",
                (GradeMode::Multiple, false) => "[ ]",
            };

            let is_correct = question.correct_answer_ids.contains(&answer.id);
            let color = match (revealed, is_correct, chosen) {
                (true, true, _) => Color::Green,
                (true, false, true) => Color::Red,
                _ => Color::White,
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("{}. ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::styled(format!("{} ", marker), Style::default().fg(Color::Yellow)),
                Span::styled(answer.text.clone(), Style::default().fg(color)),
            ]))
        })
        .collect();

    let hint = match mode {
        GradeMode::Single => " Choose one ",
        GradeMode::Multiple => " Choose all that apply ",
    };

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(hint))
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !revealed {
        state.select(Some(app.answer_cursor));
    }

    f.render_stateful_widget(list, area, &mut state);
}

fn draw_feedback(f: &mut Frame, question: &Question, result: GradeResult, area: Rect) {
    let mut lines = Vec::new();

    if result.is_correct {
        lines.push(Line::from(Span::styled(
            "Correct!",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )));
    } else {
        let expected: Vec<&str> = question
            .correct_answers()
            .iter()
            .map(|a| a.text.as_str())
            .collect();
        lines.push(Line::from(Span::styled(
            "Incorrect!",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(vec![
            Span::styled("Correct answer: ", Style::default().fg(Color::Gray)),
            Span::raw(expected.join(", ")),
        ]));
        if let Some(description) = &question.correct_answer_description {
            lines.push(Line::from(Span::styled(
                description.as_str(),
                Style::default().fg(Color::Gray),
            )));
        }
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Feedback ")
        .title_style(Style::default().fg(Color::Magenta));

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}
