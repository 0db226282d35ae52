mod ui;
mod widgets;

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use rand::rngs::StdRng;
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::models::{StatsByTopic, Topic};
use crate::session::{Intent, Phase, Quiz, QuizState, Session, SessionError};
use crate::stats::StatsStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Settings,
    Question,
    Results,
}

pub struct StatefulList<T> {
    pub items: Vec<T>,
    pub selected: Option<usize>,
}

impl<T> StatefulList<T> {
    fn with_items(items: Vec<T>) -> Self {
        let selected = if items.is_empty() { None } else { Some(0) };
        Self { items, selected }
    }

    fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) if i + 1 < self.items.len() => i + 1,
            _ => 0,
        };
        self.selected = Some(i);
    }

    fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(0) | None => self.items.len() - 1,
            Some(i) => i - 1,
        };
        self.selected = Some(i);
    }

    fn selected_item(&self) -> Option<&T> {
        self.selected.and_then(|i| self.items.get(i))
    }
}

pub struct App<S: StatsStore> {
    quiz: Quiz<S, StdRng>,
    pub topics: StatefulList<Topic>,
    pub answer_cursor: usize,
    pub stats: StatsByTopic,
    pub notice: Option<String>,
    pub should_quit: bool,
}

impl<S: StatsStore> App<S> {
    pub fn new(quiz: Quiz<S, StdRng>) -> Self {
        let topics = StatefulList::with_items(quiz.bank().topics.clone());
        let stats = quiz.stats();

        Self {
            quiz,
            topics,
            answer_cursor: 0,
            stats,
            notice: None,
            should_quit: false,
        }
    }

    pub fn quiz(&self) -> &Quiz<S, StdRng> {
        &self.quiz
    }

    pub fn session(&self) -> Option<&Session> {
        self.quiz.session()
    }

    pub fn screen(&self) -> Screen {
        match self.quiz.state() {
            QuizState::Selecting => Screen::Settings,
            QuizState::Running(session) if session.is_complete() => Screen::Results,
            QuizState::Running(_) => Screen::Question,
        }
    }

    fn refresh_stats(&mut self) {
        self.stats = self.quiz.stats();
    }

    // Dispatches an intent; refusals become a notice instead of an error
    fn apply(&mut self, intent: Intent) -> bool {
        match self.quiz.dispatch(intent) {
            Ok(_) => {
                self.notice = None;
                true
            }
            Err(SessionError::InvalidSelection) => {
                self.notice = Some("Select an answer first".to_string());
                false
            }
            Err(e) => {
                log::warn!("{}", e);
                self.notice = Some(e.to_string());
                false
            }
        }
    }

    fn answer_count(&self) -> usize {
        self.session().map_or(0, |s| s.display_answers().len())
    }

    fn toggle_answer_at(&mut self, index: usize) {
        let id = self
            .session()
            .and_then(|s| s.display_answers().get(index).map(|a| a.id.clone()));
        if let Some(id) = id {
            self.answer_cursor = index;
            self.apply(Intent::ToggleAnswer(id));
        }
    }

    fn restart(&mut self) {
        self.apply(Intent::Restart);
        self.answer_cursor = 0;
        self.refresh_stats();
    }

    fn handle_key(&mut self, key: KeyCode) {
        if key == KeyCode::Char('q') {
            self.should_quit = true;
            return;
        }

        match self.screen() {
            Screen::Settings => self.handle_settings_key(key),
            Screen::Question => self.handle_question_key(key),
            Screen::Results => {
                if matches!(key, KeyCode::Enter | KeyCode::Char('r') | KeyCode::Esc) {
                    self.restart();
                }
            }
        }
    }

    fn handle_settings_key(&mut self, key: KeyCode) {
        let count = self.quiz.settings().count;
        match key {
            KeyCode::Char('j') | KeyCode::Down => self.topics.next(),
            KeyCode::Char('k') | KeyCode::Up => self.topics.previous(),
            KeyCode::Char(' ') | KeyCode::Char('x') => {
                if let Some(topic) = self.topics.selected_item() {
                    let name = topic.name.clone();
                    self.apply(Intent::ToggleTopic(name));
                }
            }
            KeyCode::Char('l') | KeyCode::Right | KeyCode::Char('+') => {
                self.apply(Intent::SetCount(count + 1));
            }
            KeyCode::Char('h') | KeyCode::Left | KeyCode::Char('-') => {
                self.apply(Intent::SetCount(count.saturating_sub(1)));
            }
            KeyCode::Enter => {
                if self.apply(Intent::Start) {
                    self.answer_cursor = 0;
                }
            }
            _ => {}
        }
    }

    fn handle_question_key(&mut self, key: KeyCode) {
        let answers = self.answer_count();
        let phase = self.session().map(Session::phase);

        match key {
            KeyCode::Char('j') | KeyCode::Down if answers > 0 => {
                self.answer_cursor = (self.answer_cursor + 1) % answers;
            }
            KeyCode::Char('k') | KeyCode::Up if answers > 0 => {
                self.answer_cursor = (self.answer_cursor + answers - 1) % answers;
            }
            KeyCode::Char(' ') => self.toggle_answer_at(self.answer_cursor),
            KeyCode::Char(c @ '1'..='9') => {
                if let Some(n) = c.to_digit(10) {
                    self.toggle_answer_at(n as usize - 1);
                }
            }
            KeyCode::Enter => match phase {
                Some(Phase::Answering(_)) => {
                    self.apply(Intent::Grade);
                }
                Some(Phase::Feedback(_)) => {
                    if self.apply(Intent::Continue) {
                        self.answer_cursor = 0;
                        if self.screen() == Screen::Results {
                            self.refresh_stats();
                        }
                    }
                }
                _ => {}
            },
            KeyCode::Esc => self.restart(),
            _ => {}
        }
    }
}

pub fn run<S: StatsStore>(quiz: Quiz<S, StdRng>) -> Result<(), Box<dyn std::error::Error>> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(quiz);

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app<S: StatsStore>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<S>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key.code);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::{QuestionBank, QuestionsByTopic};
    use crate::models::{question, TopicStats};
    use crate::stats::MemoryStore;
    use rand::SeedableRng;

    fn app() -> App<MemoryStore> {
        let mut questions = QuestionsByTopic::new();
        questions.insert(
            "rust".to_string(),
            vec![question("q1", &["a", "b"], &["a"])],
        );
        let bank = QuestionBank {
            questions,
            topics: vec![
                Topic {
                    name: "rust".to_string(),
                    title: "Rust".to_string(),
                    description: String::new(),
                },
                Topic {
                    name: "sql".to_string(),
                    title: "SQL".to_string(),
                    description: String::new(),
                },
            ],
        };
        App::new(Quiz::new(bank, MemoryStore::new(), StdRng::seed_from_u64(1)))
    }

    mod stateful_list_tests {
        use super::*;

        #[test]
        fn wraps_in_both_directions() {
            let mut list = StatefulList::with_items(vec![1, 2, 3]);
            list.previous();
            assert_eq!(list.selected, Some(2));
            list.next();
            assert_eq!(list.selected, Some(0));
        }

        #[test]
        fn empty_list_has_no_selection() {
            let mut list: StatefulList<i32> = StatefulList::with_items(vec![]);
            list.next();
            assert!(list.selected_item().is_none());
        }
    }

    mod key_tests {
        use super::*;

        #[test]
        fn start_without_topic_shows_notice() {
            let mut app = app();
            app.handle_key(KeyCode::Enter);
            assert_eq!(app.screen(), Screen::Settings);
            assert!(app.notice.is_some());
        }

        #[test]
        fn count_keys_stay_in_bounds() {
            let mut app = app();
            for _ in 0..10 {
                app.handle_key(KeyCode::Char('-'));
            }
            assert_eq!(app.quiz().settings().count, 1);
            app.handle_key(KeyCode::Char('+'));
            assert_eq!(app.quiz().settings().count, 2);
        }

        #[test]
        fn grade_without_answer_shows_notice() {
            let mut app = app();
            app.handle_key(KeyCode::Char(' '));
            app.handle_key(KeyCode::Enter);
            app.handle_key(KeyCode::Enter);
            assert_eq!(app.screen(), Screen::Question);
            assert_eq!(app.notice.as_deref(), Some("Select an answer first"));
        }

        #[test]
        fn full_quiz_by_keyboard() {
            let mut app = app();
            app.handle_key(KeyCode::Char(' '));
            app.handle_key(KeyCode::Enter);

            let correct = app
                .session()
                .unwrap()
                .display_answers()
                .iter()
                .position(|a| a.id == "a")
                .unwrap();
            app.handle_key(KeyCode::Char(char::from_digit(correct as u32 + 1, 10).unwrap()));
            app.handle_key(KeyCode::Enter);
            assert!(matches!(
                app.session().unwrap().phase(),
                Phase::Feedback(0)
            ));

            app.handle_key(KeyCode::Enter);
            assert_eq!(app.screen(), Screen::Results);
            assert_eq!(app.stats["rust"], TopicStats::new(1, 1));

            app.handle_key(KeyCode::Char('r'));
            assert_eq!(app.screen(), Screen::Settings);
        }

        #[test]
        fn q_quits_anywhere() {
            let mut app = app();
            app.handle_key(KeyCode::Char('q'));
            assert!(app.should_quit);
        }
    }
}
