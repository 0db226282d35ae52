use std::cell::RefCell;

use thiserror::Error;

use crate::models::StatsByTopic;

/// Key under which the per-topic statistics blob is persisted.
pub const STATS_KEY: &str = "quizStatsByTopic";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("could not encode statistics: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Durable home of the per-topic statistics blob.
///
/// The blob is always read and written as a whole.
pub trait StatsStore {
    fn load_stats(&self) -> Result<StatsByTopic, StoreError>;

    fn save_stats(&self, stats: &StatsByTopic) -> Result<(), StoreError>;
}

/// Credits a finished session to every topic it was drawn from.
///
/// Each topic receives the full score and length; a session over two topics
/// counts once for each of them.
pub fn fold_session(stats: &mut StatsByTopic, topics: &[String], score: u64, length: u64) {
    for topic in topics {
        let updated = stats
            .get(topic)
            .cloned()
            .unwrap_or_default()
            .record(score, length);
        stats.insert(topic.clone(), updated);
    }
}

/// Loads the current blob, folds the session into it and writes it back.
pub fn record_session<S: StatsStore + ?Sized>(
    store: &S,
    topics: &[String],
    score: u64,
    length: u64,
) -> Result<StatsByTopic, StoreError> {
    let mut stats = store.load_stats()?;
    fold_session(&mut stats, topics, score, length);
    store.save_stats(&stats)?;
    log::debug!(
        "recorded session {}/{} for topics {:?}",
        score,
        length,
        topics
    );
    Ok(stats)
}

/// In-process store, used when no database is wanted and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    stats: RefCell<StatsByTopic>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatsStore for MemoryStore {
    fn load_stats(&self) -> Result<StatsByTopic, StoreError> {
        Ok(self.stats.borrow().clone())
    }

    fn save_stats(&self, stats: &StatsByTopic) -> Result<(), StoreError> {
        *self.stats.borrow_mut() = stats.clone();
        Ok(())
    }
}
