use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::{Question, Topic};

pub const QUESTIONS_FILE: &str = "allQuestions.json";
pub const TOPICS_FILE: &str = "topics.json";

pub type QuestionsByTopic = BTreeMap<String, Vec<Question>>;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// The consolidated question bank and topic list, read once at startup.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    pub questions: QuestionsByTopic,
    pub topics: Vec<Topic>,
}

impl QuestionBank {
    pub fn question_count(&self, topic: &str) -> usize {
        self.questions.get(topic).map_or(0, Vec::len)
    }

    pub fn topic(&self, name: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.name == name)
    }
}

pub fn load(assets_dir: &Path) -> Result<QuestionBank, LoadError> {
    let questions: QuestionsByTopic = read_json(&assets_dir.join(QUESTIONS_FILE))?;
    let topics: Vec<Topic> = read_json(&assets_dir.join(TOPICS_FILE))?;

    for (topic, list) in &questions {
        for question in list {
            if let Err(e) = question.validate() {
                log::warn!("topic {}: {}", topic, e);
            }
        }
    }

    log::debug!(
        "loaded {} topics and {} questions from {}",
        topics.len(),
        questions.values().map(Vec::len).sum::<usize>(),
        assets_dir.display()
    );

    Ok(QuestionBank { questions, topics })
}

/// Like [`load`], but a failure leaves the quiz with nothing to ask.
pub fn load_or_empty(assets_dir: &Path) -> QuestionBank {
    match load(assets_dir) {
        Ok(bank) => bank,
        Err(e) => {
            log::error!("{}", e);
            QuestionBank::default()
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
pub(crate) mod testdir {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT: AtomicUsize = AtomicUsize::new(0);

    /// A fresh, empty directory under the system temp dir.
    pub fn fresh(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "quizzer-{}-{}-{}",
            label,
            std::process::id(),
            NEXT.fetch_add(1, Ordering::SeqCst)
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).expect("Failed to create test directory");
        dir
    }
}
