use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use thiserror::Error;

use crate::bank::{QuestionBank, QuestionsByTopic};
use crate::models::{percent, Answer, GradeResult, Question, Selection, StatsByTopic};
use crate::stats::{record_session, StatsStore, StoreError};

pub const DEFAULT_COUNT: usize = 5;
pub const MIN_COUNT: usize = 1;
pub const MAX_COUNT: usize = 50;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no answer selected")]
    InvalidSelection,
    #[error("not allowed while {0}")]
    WrongPhase(&'static str),
    #[error("select at least one topic")]
    NoTopics,
    #[error("unknown topic {0}")]
    UnknownTopic(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

// Where a running session is in its question sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Answering(usize),
    Feedback(usize),
    Complete,
}

impl Phase {
    fn label(&self) -> &'static str {
        match self {
            Phase::Answering(_) => "answering",
            Phase::Feedback(_) => "showing feedback",
            Phase::Complete => "complete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResultSummary {
    pub correct: usize,
    pub total: usize,
}

impl ResultSummary {
    pub fn percent(&self) -> f64 {
        percent(self.correct as u64, self.total as u64)
    }

    pub fn percent_label(&self) -> String {
        format!("{:.1}", self.percent())
    }
}

/// One run through a randomly drawn set of questions.
#[derive(Debug, Clone)]
pub struct Session {
    topics: Vec<String>,
    questions: Vec<Question>,
    answer_orders: Vec<Vec<usize>>,
    position: usize,
    score: usize,
    selection: Option<Selection>,
    feedback: Option<GradeResult>,
}

impl Session {
    /// Draws up to `count` questions from the requested topics.
    ///
    /// The candidate pool is shuffled uniformly before the prefix is taken, so
    /// every question appears at most once. Topics missing from `pool` add
    /// nothing; an empty pool gives a session that is already complete.
    pub fn start<R: Rng + ?Sized>(
        topics: &[String],
        count: usize,
        pool: &QuestionsByTopic,
        rng: &mut R,
    ) -> Self {
        let mut candidates: Vec<Question> = topics
            .iter()
            .filter_map(|topic| pool.get(topic))
            .flatten()
            .cloned()
            .collect();

        candidates.shuffle(rng);
        candidates.truncate(count);

        let answer_orders = candidates
            .iter()
            .map(|q| {
                let mut order: Vec<usize> = (0..q.answers.len()).collect();
                order.shuffle(rng);
                order
            })
            .collect();

        log::debug!(
            "started session over {:?} with {} questions",
            topics,
            candidates.len()
        );

        Self {
            topics: topics.to_vec(),
            questions: candidates,
            answer_orders,
            position: 0,
            score: 0,
            selection: None,
            feedback: None,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.position >= self.questions.len() {
            Phase::Complete
        } else if self.feedback.is_some() {
            Phase::Feedback(self.position)
        } else {
            Phase::Answering(self.position)
        }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.phase() == Phase::Complete
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.position)
    }

    /// Answers of the current question in their shuffled display order.
    pub fn display_answers(&self) -> Vec<&Answer> {
        match (self.current(), self.answer_orders.get(self.position)) {
            (Some(q), Some(order)) => order.iter().map(|&i| &q.answers[i]).collect(),
            _ => Vec::new(),
        }
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn feedback(&self) -> Option<GradeResult> {
        self.feedback
    }

    /// Stores the raw selection; grading waits for [`Session::grade`].
    pub fn submit_answer(&mut self, selection: Selection) -> Result<(), SessionError> {
        self.expect_answering()?;
        self.selection = Some(selection);
        Ok(())
    }

    pub fn toggle_answer(&mut self, answer_id: &str) -> Result<(), SessionError> {
        let question = self.expect_answering()?;
        let mode = question.grade_mode();
        let current = self
            .selection
            .take()
            .unwrap_or_else(|| Selection::empty(mode));
        self.selection = Some(current.toggle(mode, answer_id));
        Ok(())
    }

    pub fn can_grade(&self) -> bool {
        matches!(self.phase(), Phase::Answering(_))
            && self.selection.as_ref().is_some_and(|s| !s.is_empty())
    }

    pub fn grade(&mut self) -> Result<GradeResult, SessionError> {
        let question = self.expect_answering()?;
        let selection = match &self.selection {
            Some(s) if !s.is_empty() => s,
            _ => return Err(SessionError::InvalidSelection),
        };

        let result = GradeResult {
            is_correct: question.is_correct(selection),
        };
        if result.is_correct {
            self.score += 1;
        }
        self.feedback = Some(result);
        Ok(result)
    }

    /// Moves past the feedback for the current question.
    ///
    /// Advancing past the last question folds the session into `store` before
    /// the session becomes complete; the updated statistics are returned in
    /// that case. A failed write leaves the session on its feedback screen.
    pub fn advance<S: StatsStore + ?Sized>(
        &mut self,
        store: &S,
    ) -> Result<Option<StatsByTopic>, SessionError> {
        let phase = self.phase();
        if !matches!(phase, Phase::Feedback(_)) {
            return Err(SessionError::WrongPhase(phase.label()));
        }

        let next = self.position + 1;
        let folded = if next == self.questions.len() {
            Some(record_session(
                store,
                &self.topics,
                self.score as u64,
                self.questions.len() as u64,
            )?)
        } else {
            None
        };

        self.feedback = None;
        self.selection = None;
        self.position = next;
        Ok(folded)
    }

    pub fn summary(&self) -> ResultSummary {
        ResultSummary {
            correct: self.score,
            total: self.questions.len(),
        }
    }

    fn expect_answering(&self) -> Result<&Question, SessionError> {
        match (self.phase(), self.current()) {
            (Phase::Answering(_), Some(q)) => Ok(q),
            (phase, _) => Err(SessionError::WrongPhase(phase.label())),
        }
    }
}

// Topic and count choices made before a session starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub topics: Vec<String>,
    pub count: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            topics: Vec::new(),
            count: DEFAULT_COUNT,
        }
    }
}

impl Settings {
    pub fn toggle_topic(&mut self, name: &str) {
        if let Some(i) = self.topics.iter().position(|t| t == name) {
            self.topics.remove(i);
        } else {
            self.topics.push(name.to_string());
        }
    }

    /// Adds `name` unless it is already selected.
    pub fn select_topic(&mut self, name: &str) {
        if !self.is_selected(name) {
            self.topics.push(name.to_string());
        }
    }

    pub fn set_count(&mut self, count: usize) {
        self.count = count.clamp(MIN_COUNT, MAX_COUNT);
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.topics.iter().any(|t| t == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    ToggleTopic(String),
    SelectTopic(String),
    SetCount(usize),
    Start,
    ToggleAnswer(String),
    Submit(Selection),
    Grade,
    Continue,
    Restart,
}

#[derive(Debug, Clone)]
pub enum QuizState {
    Selecting,
    Running(Session),
}

/// The quiz as a whole: settings, the running session and the stats store.
pub struct Quiz<S: StatsStore, R: Rng> {
    bank: QuestionBank,
    store: S,
    rng: R,
    settings: Settings,
    state: QuizState,
}

impl<S: StatsStore, R: Rng> Quiz<S, R> {
    pub fn new(bank: QuestionBank, store: S, rng: R) -> Self {
        Self {
            bank,
            store,
            rng,
            settings: Settings::default(),
            state: QuizState::Selecting,
        }
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> &QuizState {
        &self.state
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            QuizState::Running(session) => Some(session),
            QuizState::Selecting => None,
        }
    }

    /// Stored statistics for the settings screen; unreadable stats show as none.
    pub fn stats(&self) -> StatsByTopic {
        self.store.load_stats().unwrap_or_else(|e| {
            log::warn!("could not load stats: {}", e);
            StatsByTopic::new()
        })
    }

    pub fn dispatch(&mut self, intent: Intent) -> Result<Option<GradeResult>, SessionError> {
        match intent {
            Intent::ToggleTopic(name) => {
                self.expect_known_topic(&name)?;
                self.settings.toggle_topic(&name);
            }
            Intent::SelectTopic(name) => {
                self.expect_known_topic(&name)?;
                self.settings.select_topic(&name);
            }
            Intent::SetCount(count) => {
                self.expect_selecting()?;
                self.settings.set_count(count);
            }
            Intent::Start => self.start()?,
            Intent::ToggleAnswer(id) => self.running()?.toggle_answer(&id)?,
            Intent::Submit(selection) => self.running()?.submit_answer(selection)?,
            Intent::Grade => return self.running()?.grade().map(Some),
            Intent::Continue => {
                let QuizState::Running(session) = &mut self.state else {
                    return Err(SessionError::WrongPhase("selecting"));
                };
                session.advance(&self.store)?;
            }
            Intent::Restart => self.restart(),
        }
        Ok(None)
    }

    pub fn start(&mut self) -> Result<(), SessionError> {
        self.expect_selecting()?;
        if self.settings.topics.is_empty() {
            return Err(SessionError::NoTopics);
        }
        let session = Session::start(
            &self.settings.topics,
            self.settings.count,
            &self.bank.questions,
            &mut self.rng,
        );
        self.state = QuizState::Running(session);
        Ok(())
    }

    /// Drops the current session without touching statistics.
    pub fn restart(&mut self) {
        self.state = QuizState::Selecting;
    }

    fn expect_selecting(&self) -> Result<(), SessionError> {
        match &self.state {
            QuizState::Selecting => Ok(()),
            QuizState::Running(_) => Err(SessionError::WrongPhase("a session is running")),
        }
    }

    fn expect_known_topic(&self, name: &str) -> Result<(), SessionError> {
        self.expect_selecting()?;
        match self.bank.topic(name) {
            Some(_) => Ok(()),
            None => Err(SessionError::UnknownTopic(name.to_string())),
        }
    }

    fn running(&mut self) -> Result<&mut Session, SessionError> {
        match &mut self.state {
            QuizState::Running(session) => Ok(session),
            QuizState::Selecting => Err(SessionError::WrongPhase("selecting")),
        }
    }
}
