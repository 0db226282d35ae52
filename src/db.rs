use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result};
use std::path::Path;

use crate::models::StatsByTopic;
use crate::stats::{StatsStore, StoreError, STATS_KEY};

pub struct Database {
    conn: Connection,
}

// A raw value in the key-value table
#[derive(Debug, Clone)]
pub struct StoredValue {
    pub value: String,
    pub updated_at: String,
}

impl StoredValue {
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.updated_at)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;

        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Result<Option<StoredValue>> {
        let value = self.conn.query_row(
            "SELECT value, updated_at FROM kv_store WHERE key = ?1",
            params![key],
            |row| {
                Ok(StoredValue {
                    value: row.get(0)?,
                    updated_at: row.get(1)?,
                })
            },
        );

        match value {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    // Replaces the whole value stored under `key`
    pub fn put_value(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn delete_value(&self, key: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(rows > 0)
    }

    pub fn stats_updated_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.get_value(STATS_KEY)?.and_then(|v| v.updated_at()))
    }
}

impl StatsStore for Database {
    fn load_stats(&self) -> std::result::Result<StatsByTopic, StoreError> {
        let Some(stored) = self.get_value(STATS_KEY)? else {
            return Ok(StatsByTopic::new());
        };

        match serde_json::from_str(&stored.value) {
            Ok(stats) => Ok(stats),
            Err(e) => {
                log::warn!("ignoring unreadable {} blob: {}", STATS_KEY, e);
                Ok(StatsByTopic::new())
            }
        }
    }

    fn save_stats(&self, stats: &StatsByTopic) -> std::result::Result<(), StoreError> {
        let blob = serde_json::to_string(stats)?;
        self.put_value(STATS_KEY, &blob)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TopicStats;
    use crate::stats::record_session;

    fn setup_db() -> Database {
        let db = Database::open(":memory:").expect("Failed to create in-memory database");
        db.init().expect("Failed to initialize database");
        db
    }

    mod init_tests {
        use super::*;

        #[test]
        fn init_creates_tables() {
            let db = setup_db();
            let rows: i64 = db
                .conn
                .query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))
                .expect("kv_store table should exist");
            assert_eq!(rows, 0);
        }

        #[test]
        fn init_is_idempotent() {
            let db = setup_db();
            db.put_value("k", "v").unwrap();

            db.init().expect("Re-init should succeed");

            assert_eq!(db.get_value("k").unwrap().unwrap().value, "v");
        }
    }

    mod kv_tests {
        use super::*;

        #[test]
        fn get_missing_key() {
            let db = setup_db();
            assert!(db.get_value("nope").unwrap().is_none());
        }

        #[test]
        fn put_overwrites() {
            let db = setup_db();
            db.put_value("k", "one").unwrap();
            db.put_value("k", "two").unwrap();
            assert_eq!(db.get_value("k").unwrap().unwrap().value, "two");
        }

        #[test]
        fn put_stamps_rfc3339_time() {
            let db = setup_db();
            let before = Utc::now();
            db.put_value("k", "v").unwrap();
            let stamped = db.get_value("k").unwrap().unwrap().updated_at().unwrap();
            assert!(stamped >= before - chrono::Duration::seconds(1));
        }

        #[test]
        fn delete_value_reports_presence() {
            let db = setup_db();
            db.put_value("k", "v").unwrap();
            assert!(db.delete_value("k").unwrap());
            assert!(!db.delete_value("k").unwrap());
        }
    }

    mod stats_store_tests {
        use super::*;

        #[test]
        fn load_without_blob_is_empty() {
            let db = setup_db();
            assert!(db.load_stats().unwrap().is_empty());
            assert!(db.stats_updated_at().unwrap().is_none());
        }

        #[test]
        fn stats_round_trip() {
            let db = setup_db();
            let mut stats = StatsByTopic::new();
            stats.insert("rust".to_string(), TopicStats::new(3, 7));
            stats.insert("sql".to_string(), TopicStats::new(0, 0));

            db.save_stats(&stats).unwrap();

            assert_eq!(db.load_stats().unwrap(), stats);
            assert!(db.stats_updated_at().unwrap().is_some());
        }

        #[test]
        fn stats_saved_under_single_key() {
            let db = setup_db();
            db.save_stats(&StatsByTopic::new()).unwrap();
            let stored = db.get_value("quizStatsByTopic").unwrap().unwrap();
            assert_eq!(stored.value, "{}");
        }

        #[test]
        fn corrupt_blob_reads_as_empty() {
            let db = setup_db();
            db.put_value(STATS_KEY, "not json").unwrap();
            assert!(db.load_stats().unwrap().is_empty());
        }

        #[test]
        fn reads_blob_written_by_hand() {
            let db = setup_db();
            db.put_value(
                STATS_KEY,
                r#"{"js":{"correctAnswers":2,"totalQuestions":4,"percentCorrect":50}}"#,
            )
            .unwrap();
            assert_eq!(db.load_stats().unwrap()["js"], TopicStats::new(2, 4));
        }

        #[test]
        fn sessions_accumulate_in_database() {
            let db = setup_db();
            let topics = vec!["t".to_string()];
            record_session(&db, &topics, 2, 5).unwrap();
            record_session(&db, &topics, 3, 5).unwrap();
            assert_eq!(db.load_stats().unwrap()["t"], TopicStats::new(5, 10));
        }
    }
}
