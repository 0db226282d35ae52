use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bank::{QuestionsByTopic, QUESTIONS_FILE, TOPICS_FILE};
use crate::models::{Question, Topic};

pub const DEFAULT_QUESTIONS_ROOT: &str = "public/questions";
pub const METADATA_FILE: &str = "metadata.json";

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("could not access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not encode output: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Default, Deserialize)]
struct TopicMeta {
    title: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub questions_path: PathBuf,
    pub topics_path: PathBuf,
    pub topics: usize,
    pub questions: usize,
}

/// Flattens `root/<topic>/**/*.json` into `allQuestions.json` and
/// `topics.json`, both written next to `root`.
pub fn build(root: &Path) -> Result<BuildReport, BuildError> {
    let out_dir = root
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let questions = collect_questions(root)?;
    let questions_path = out_dir.join(QUESTIONS_FILE);
    write_json(&questions_path, &questions)?;
    log::info!("wrote {}", questions_path.display());

    let topics = collect_topics(root)?;
    let topics_path = out_dir.join(TOPICS_FILE);
    write_json(&topics_path, &topics)?;
    log::info!("wrote {}", topics_path.display());

    Ok(BuildReport {
        questions_path,
        topics_path,
        topics: topics.len(),
        questions: questions.values().map(Vec::len).sum(),
    })
}

/// Groups every question file by the topic directory it lives under.
///
/// Files are taken in sorted path order and their questions concatenated in
/// file order. Ids are not de-duplicated.
pub fn collect_questions(root: &Path) -> Result<QuestionsByTopic, BuildError> {
    let mut result = QuestionsByTopic::new();

    for topic_dir in sorted_entries(root)? {
        if !topic_dir.is_dir() {
            log::debug!("skipping {}: not a topic directory", topic_dir.display());
            continue;
        }
        let Some(topic) = dir_name(&topic_dir) else {
            continue;
        };

        for file in json_files(&topic_dir)? {
            if file.parent() == Some(topic_dir.as_path())
                && file.file_name().is_some_and(|n| n == METADATA_FILE)
            {
                continue;
            }
            let questions = read_question_file(&file);
            result.entry(topic.clone()).or_default().extend(questions);
        }
    }

    Ok(result)
}

/// One topic per subdirectory of `root`, described by its `metadata.json`
/// when that file is present and readable.
pub fn collect_topics(root: &Path) -> Result<Vec<Topic>, BuildError> {
    let mut topics = Vec::new();

    for dir in sorted_entries(root)? {
        if !dir.is_dir() {
            continue;
        }
        let Some(name) = dir_name(&dir) else {
            continue;
        };

        let meta = read_metadata(&dir.join(METADATA_FILE), &name);
        let title = meta
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| name.clone());

        topics.push(Topic {
            name,
            title,
            description: meta.description.unwrap_or_default(),
        });
    }

    Ok(topics)
}

fn read_question_file(path: &Path) -> Vec<Question> {
    let parsed = fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|raw| serde_json::from_str::<Vec<Question>>(&raw).map_err(|e| e.to_string()));

    match parsed {
        Ok(questions) => questions,
        Err(e) => {
            log::error!("skipping malformed question file {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

fn read_metadata(path: &Path, topic: &str) -> TopicMeta {
    if !path.exists() {
        return TopicMeta::default();
    }

    let parsed = fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|raw| serde_json::from_str::<TopicMeta>(&raw).map_err(|e| e.to_string()));

    match parsed {
        Ok(meta) => meta,
        Err(e) => {
            log::warn!("could not read {} for topic {}: {}", METADATA_FILE, topic, e);
            TopicMeta::default()
        }
    }
}

fn json_files(dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let mut files = Vec::new();
    for path in sorted_entries(dir)? {
        if path.is_dir() {
            files.extend(json_files(&path)?);
        } else if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    Ok(files)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let io_err = |source| BuildError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(dir)
        .map_err(io_err)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err)?;
    entries.sort();
    Ok(entries)
}

fn dir_name(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), BuildError> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::{self, testdir};

    fn question_json(ids: &[&str]) -> String {
        let items: Vec<String> = ids
            .iter()
            .map(|id| {
                format!(
                    r#"{{"id":"{}","text":"?","answers":[{{"id":"a","text":"x"}}],"correctAnswerIds":["a"]}}"#,
                    id
                )
            })
            .collect();
        format!("[{}]", items.join(","))
    }

    fn write(path: &Path, contents: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    fn ids(questions: &[Question]) -> Vec<&str> {
        questions.iter().map(|q| q.id.as_str()).collect()
    }

    mod collect_questions_tests {
        use super::*;

        #[test]
        fn groups_by_topic_in_file_order() {
            let root = testdir::fresh("build-group").join("questions");
            write(&root.join("rust/b.json"), &question_json(&["b1", "b2"]));
            write(&root.join("rust/a.json"), &question_json(&["a1"]));
            write(&root.join("sql/basics.json"), &question_json(&["s1"]));

            let questions = collect_questions(&root).unwrap();
            assert_eq!(ids(&questions["rust"]), vec!["a1", "b1", "b2"]);
            assert_eq!(ids(&questions["sql"]), vec!["s1"]);
        }

        #[test]
        fn walks_nested_directories() {
            let root = testdir::fresh("build-nested").join("questions");
            write(&root.join("rust/ownership/borrow.json"), &question_json(&["n1"]));
            write(&root.join("rust/top.json"), &question_json(&["t1"]));

            let questions = collect_questions(&root).unwrap();
            assert_eq!(ids(&questions["rust"]), vec!["n1", "t1"]);
        }

        #[test]
        fn skips_metadata_and_non_json() {
            let root = testdir::fresh("build-skip").join("questions");
            write(&root.join("rust/metadata.json"), r#"{"title":"Rust"}"#);
            write(&root.join("rust/notes.txt"), "ignore me");
            write(&root.join("rust/q.json"), &question_json(&["q1"]));

            let questions = collect_questions(&root).unwrap();
            assert_eq!(ids(&questions["rust"]), vec!["q1"]);
        }

        #[test]
        fn malformed_file_contributes_nothing() {
            let root = testdir::fresh("build-malformed").join("questions");
            write(&root.join("rust/a.json"), "{ not json");
            write(&root.join("rust/b.json"), &question_json(&["ok"]));

            let questions = collect_questions(&root).unwrap();
            assert_eq!(ids(&questions["rust"]), vec!["ok"]);
        }

        #[test]
        fn duplicate_ids_are_kept() {
            let root = testdir::fresh("build-dupes").join("questions");
            write(&root.join("rust/a.json"), &question_json(&["q1"]));
            write(&root.join("rust/b.json"), &question_json(&["q1"]));

            let questions = collect_questions(&root).unwrap();
            assert_eq!(ids(&questions["rust"]), vec!["q1", "q1"]);
        }

        #[test]
        fn missing_root_is_error() {
            let root = testdir::fresh("build-missing").join("nope");
            assert!(matches!(collect_questions(&root), Err(BuildError::Io { .. })));
        }
    }

    mod collect_topics_tests {
        use super::*;

        #[test]
        fn metadata_fills_title_and_description() {
            let root = testdir::fresh("topics-meta").join("questions");
            write(
                &root.join("rust/metadata.json"),
                r#"{"title":"Rust","description":"Ownership and traits"}"#,
            );

            let topics = collect_topics(&root).unwrap();
            assert_eq!(
                topics,
                vec![Topic {
                    name: "rust".to_string(),
                    title: "Rust".to_string(),
                    description: "Ownership and traits".to_string(),
                }]
            );
        }

        #[test]
        fn missing_or_broken_metadata_uses_defaults() {
            let root = testdir::fresh("topics-defaults").join("questions");
            fs::create_dir_all(root.join("plain")).unwrap();
            write(&root.join("broken/metadata.json"), "{{{");
            write(&root.join("untitled/metadata.json"), r#"{"description":"d"}"#);
            write(&root.join("stray.json"), "[]");

            let topics = collect_topics(&root).unwrap();
            let summary: Vec<(&str, &str, &str)> = topics
                .iter()
                .map(|t| (t.name.as_str(), t.title.as_str(), t.description.as_str()))
                .collect();
            assert_eq!(
                summary,
                vec![
                    ("broken", "broken", ""),
                    ("plain", "plain", ""),
                    ("untitled", "untitled", "d"),
                ]
            );
        }

        #[test]
        fn null_title_keeps_description() {
            let root = testdir::fresh("topics-null").join("questions");
            write(
                &root.join("go/metadata.json"),
                r#"{"title":null,"description":"Goroutines"}"#,
            );
            write(&root.join("js/metadata.json"), r#"{"title":"","description":null}"#);

            let topics = collect_topics(&root).unwrap();
            assert_eq!(topics[0].title, "go");
            assert_eq!(topics[0].description, "Goroutines");
            assert_eq!(topics[1].title, "js");
            assert_eq!(topics[1].description, "");
        }
    }

    mod build_tests {
        use super::*;

        #[test]
        fn build_writes_assets_next_to_root() {
            let base = testdir::fresh("build-full");
            let root = base.join("questions");
            write(&root.join("rust/metadata.json"), r#"{"title":"Rust"}"#);
            write(&root.join("rust/q.json"), &question_json(&["q1", "q2"]));

            let report = build(&root).unwrap();
            assert_eq!(report.questions_path, base.join(QUESTIONS_FILE));
            assert_eq!(report.topics_path, base.join(TOPICS_FILE));
            assert_eq!(report.topics, 1);
            assert_eq!(report.questions, 2);

            let bank = bank::load(&base).unwrap();
            assert_eq!(bank.question_count("rust"), 2);
            assert_eq!(bank.topic("rust").unwrap().title, "Rust");
        }
    }
}
