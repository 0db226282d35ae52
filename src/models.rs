use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub text: String,
    pub answers: Vec<Answer>,
    pub correct_answer_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer_description: Option<String>,
}

// How a question expects to be answered, decided by its number of correct ids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeMode {
    Single,
    Multiple,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidQuestion {
    #[error("question {0} has no correct answers")]
    NoCorrectAnswers(String),
    #[error("question {question} marks unknown answer {answer} as correct")]
    UnknownAnswer { question: String, answer: String },
    #[error("question {question} repeats answer id {answer}")]
    DuplicateAnswer { question: String, answer: String },
}

impl Question {
    pub fn grade_mode(&self) -> GradeMode {
        if self.correct_answer_ids.len() == 1 {
            GradeMode::Single
        } else {
            GradeMode::Multiple
        }
    }

    /// Grades a selection against this question.
    ///
    /// Single mode accepts exactly one chosen id that is among the correct ids.
    /// Multiple mode requires the chosen set to equal the correct set; there is
    /// no partial credit.
    pub fn is_correct(&self, selection: &Selection) -> bool {
        let chosen = selection.ids();
        match self.grade_mode() {
            GradeMode::Single => {
                chosen.len() == 1
                    && chosen
                        .iter()
                        .all(|id| self.correct_answer_ids.iter().any(|c| c.as_str() == *id))
            }
            GradeMode::Multiple => {
                let correct: BTreeSet<&str> =
                    self.correct_answer_ids.iter().map(String::as_str).collect();
                chosen == correct
            }
        }
    }

    /// Correct answers in the order they are listed in the question.
    pub fn correct_answers(&self) -> Vec<&Answer> {
        self.answers
            .iter()
            .filter(|a| self.correct_answer_ids.contains(&a.id))
            .collect()
    }

    pub fn validate(&self) -> Result<(), InvalidQuestion> {
        if self.correct_answer_ids.is_empty() {
            return Err(InvalidQuestion::NoCorrectAnswers(self.id.clone()));
        }

        let mut seen = BTreeSet::new();
        for answer in &self.answers {
            if !seen.insert(answer.id.as_str()) {
                return Err(InvalidQuestion::DuplicateAnswer {
                    question: self.id.clone(),
                    answer: answer.id.clone(),
                });
            }
        }

        for id in &self.correct_answer_ids {
            if !seen.contains(id.as_str()) {
                return Err(InvalidQuestion::UnknownAnswer {
                    question: self.id.clone(),
                    answer: id.clone(),
                });
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    pub title: String,
    pub description: String,
}

// The user's current answer choice for a question
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Single(String),
    Multiple(BTreeSet<String>),
}

impl Selection {
    pub fn empty(mode: GradeMode) -> Self {
        match mode {
            GradeMode::Single => Selection::Single(String::new()),
            GradeMode::Multiple => Selection::Multiple(BTreeSet::new()),
        }
    }

    pub fn ids(&self) -> BTreeSet<&str> {
        match self {
            Selection::Single(id) if id.is_empty() => BTreeSet::new(),
            Selection::Single(id) => BTreeSet::from([id.as_str()]),
            Selection::Multiple(ids) => ids.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ids().is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        match self {
            Selection::Single(chosen) => chosen == id,
            Selection::Multiple(ids) => ids.contains(id),
        }
    }

    /// Applies a click on `id`: single mode replaces the choice, multiple mode
    /// flips membership.
    pub fn toggle(self, mode: GradeMode, id: &str) -> Self {
        match (mode, self) {
            (GradeMode::Single, _) => Selection::Single(id.to_string()),
            (GradeMode::Multiple, Selection::Multiple(mut ids)) => {
                if !ids.remove(id) {
                    ids.insert(id.to_string());
                }
                Selection::Multiple(ids)
            }
            (GradeMode::Multiple, Selection::Single(prev)) => {
                let mut ids: BTreeSet<String> = BTreeSet::new();
                if !prev.is_empty() {
                    ids.insert(prev);
                }
                Selection::Multiple(ids).toggle(GradeMode::Multiple, id)
            }
        }
    }
}

impl From<&str> for Selection {
    fn from(id: &str) -> Self {
        Selection::Single(id.to_string())
    }
}

impl<'a> FromIterator<&'a str> for Selection {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Selection::Multiple(iter.into_iter().map(str::to_string).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeResult {
    pub is_correct: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicStats {
    pub correct_answers: u64,
    pub total_questions: u64,
    pub percent_correct: f64,
}

impl TopicStats {
    pub fn new(correct_answers: u64, total_questions: u64) -> Self {
        Self {
            correct_answers,
            total_questions,
            percent_correct: percent(correct_answers, total_questions),
        }
    }

    /// Adds one finished session's score and length to these totals.
    pub fn record(&self, score: u64, length: u64) -> Self {
        Self::new(self.correct_answers + score, self.total_questions + length)
    }
}

pub type StatsByTopic = BTreeMap<String, TopicStats>;

pub fn percent(correct: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (correct as f64 / total as f64) * 100.0
    }
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

#[cfg(test)]
pub(crate) fn question(id: &str, answers: &[&str], correct: &[&str]) -> Question {
    Question {
        id: id.to_string(),
        text: format!("Question {}", id),
        answers: answers
            .iter()
            .map(|a| Answer {
                id: a.to_string(),
                text: format!("Answer {}", a),
            })
            .collect(),
        correct_answer_ids: correct.iter().map(|c| c.to_string()).collect(),
        correct_answer_description: None,
    }
}
