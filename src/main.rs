mod assets;
mod bank;
mod config;
mod db;
mod models;
mod session;
mod stats;
mod tui;

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

use config::Config;
use db::Database;
use models::{JsonOutput, StatsByTopic};
use session::{Intent, Quiz};
use stats::{MemoryStore, StatsStore};

#[derive(Parser)]
#[command(name = "quizzer")]
#[command(about = "Topic-based multiple-choice quizzes from a static question bank")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Flatten per-topic question files into allQuestions.json and topics.json
    Build {
        /// Directory holding one subdirectory per topic
        #[arg(long, default_value = assets::DEFAULT_QUESTIONS_ROOT)]
        questions_dir: PathBuf,
    },

    /// List available topics with past results
    Topics {
        /// Directory holding allQuestions.json and topics.json
        #[arg(long)]
        assets: Option<PathBuf>,
    },

    /// Show cumulative statistics per topic
    Stats,

    /// Forget all stored statistics
    ResetStats,

    /// Launch the interactive quiz
    Quiz {
        /// Directory holding allQuestions.json and topics.json
        #[arg(long)]
        assets: Option<PathBuf>,

        /// Preselect a topic (repeatable)
        #[arg(long, short)]
        topic: Vec<String>,

        /// Number of questions
        #[arg(long, short)]
        count: Option<usize>,

        /// Keep results in memory only
        #[arg(long)]
        practice: bool,
    },
}

fn init_logging() {
    let mut builder = pretty_env_logger::formatted_builder();
    match std::env::var("RUST_LOG") {
        Ok(filters) => {
            builder.parse_filters(&filters);
        }
        Err(_) => {
            builder.filter_level(log::LevelFilter::Warn);
        }
    }
    builder.init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(e) = run(cli) {
        if json {
            let output = JsonOutput::<()>::err(e.to_string());
            if let Ok(line) = serde_json::to_string(&output) {
                println!("{}", line);
            }
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

fn open_db(config: &Config) -> Result<Database, Box<dyn std::error::Error>> {
    let db = Database::open(&config.db_path)?;
    db.init()?;
    Ok(db)
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Build { questions_dir } => {
            let report = assets::build(&questions_dir)?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&report))?);
            } else {
                println!(
                    "Wrote {} questions to {}",
                    report.questions,
                    report.questions_path.display()
                );
                println!(
                    "Wrote {} topics to {}",
                    report.topics,
                    report.topics_path.display()
                );
            }
        }

        Commands::Topics { assets } => {
            let config = Config::resolve(assets.as_deref());
            let bank = bank::load_or_empty(&config.assets_dir);
            let stats = open_db(&config)?.load_stats()?;

            if cli.json {
                let rows: Vec<_> = bank
                    .topics
                    .iter()
                    .map(|topic| {
                        serde_json::json!({
                            "topic": topic,
                            "questions": bank.question_count(&topic.name),
                            "stats": stats.get(&topic.name),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string(&JsonOutput::ok(rows))?);
            } else if bank.topics.is_empty() {
                println!("No topics found. Run `quizzer build` first.");
            } else {
                println!("{:<20} {:<32} {:>9}  LAST RESULT", "NAME", "TITLE", "QUESTIONS");
                println!("{}", "-".repeat(80));
                for topic in &bank.topics {
                    let result = match stats.get(&topic.name) {
                        Some(s) if s.total_questions > 0 => format!(
                            "{} of {} ({:.1}%)",
                            s.correct_answers, s.total_questions, s.percent_correct
                        ),
                        _ => String::from("-"),
                    };
                    println!(
                        "{:<20} {:<32} {:>9}  {}",
                        truncate(&topic.name, 18),
                        truncate(&topic.title, 30),
                        bank.question_count(&topic.name),
                        result
                    );
                }
            }
        }

        Commands::Stats => {
            let config = Config::resolve(None);
            let db = open_db(&config)?;
            let stats = db.load_stats()?;

            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&stats))?);
            } else if stats.is_empty() {
                println!("No quizzes completed yet.");
            } else {
                println!("=== Quiz Statistics ===");
                print_stats(&stats);
                if let Some(updated) = db.stats_updated_at()? {
                    println!();
                    println!("Last updated: {}", updated.format("%Y-%m-%d %H:%M UTC"));
                }
            }
        }

        Commands::ResetStats => {
            let config = Config::resolve(None);
            open_db(&config)?.delete_value(stats::STATS_KEY)?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else {
                println!("Statistics cleared.");
            }
        }

        Commands::Quiz {
            assets,
            topic,
            count,
            practice,
        } => {
            let config = Config::resolve(assets.as_deref());
            let bank = bank::load_or_empty(&config.assets_dir);

            if practice {
                let quiz = Quiz::new(bank, MemoryStore::new(), StdRng::from_entropy());
                run_quiz(quiz, topic, count)?;
            } else {
                let db = open_db(&config)?;
                run_quiz(Quiz::new(bank, db, StdRng::from_entropy()), topic, count)?;
            }
        }
    }

    Ok(())
}

fn run_quiz<S: StatsStore>(
    mut quiz: Quiz<S, StdRng>,
    topics: Vec<String>,
    count: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    for name in topics {
        quiz.dispatch(Intent::SelectTopic(name))?;
    }
    if let Some(count) = count {
        quiz.dispatch(Intent::SetCount(count))?;
    }

    tui::run(quiz)
}

fn print_stats(stats: &StatsByTopic) {
    println!("{:<24} {:>8} {:>8} {:>8}", "TOPIC", "CORRECT", "TOTAL", "PERCENT");
    for (topic, s) in stats {
        println!(
            "{:<24} {:>8} {:>8} {:>7.1}%",
            truncate(topic, 22),
            s.correct_answers,
            s.total_questions,
            s.percent_correct
        );
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    mod truncate_tests {
        use super::*;

        #[test]
        fn truncate_short_string() {
            assert_eq!(truncate("hello", 10), "hello");
        }

        #[test]
        fn truncate_exact_length() {
            assert_eq!(truncate("hello", 5), "hello");
        }

        #[test]
        fn truncate_long_string() {
            assert_eq!(truncate("hello world", 8), "hello...");
        }

        #[test]
        fn truncate_multibyte() {
            assert_eq!(truncate("Простые тесты", 8), "Прост...");
        }
    }

    mod cli_parsing_tests {
        use super::*;

        #[test]
        fn parse_build_without_arguments() {
            let cli = Cli::try_parse_from(["quizzer", "build"]).unwrap();
            match cli.command {
                Commands::Build { questions_dir } => {
                    assert_eq!(questions_dir, PathBuf::from("public/questions"));
                }
                _ => panic!("Expected Build command"),
            }
        }

        #[test]
        fn parse_build_with_dir() {
            let cli =
                Cli::try_parse_from(["quizzer", "build", "--questions-dir", "data/q"]).unwrap();
            match cli.command {
                Commands::Build { questions_dir } => {
                    assert_eq!(questions_dir, PathBuf::from("data/q"));
                }
                _ => panic!("Expected Build command"),
            }
        }

        #[test]
        fn parse_topics_with_assets() {
            let cli = Cli::try_parse_from(["quizzer", "topics", "--assets", "dist"]).unwrap();
            match cli.command {
                Commands::Topics { assets } => {
                    assert_eq!(assets, Some(PathBuf::from("dist")));
                }
                _ => panic!("Expected Topics command"),
            }
        }

        #[test]
        fn parse_stats_and_reset() {
            let cli = Cli::try_parse_from(["quizzer", "stats"]).unwrap();
            assert!(matches!(cli.command, Commands::Stats));

            let cli = Cli::try_parse_from(["quizzer", "reset-stats"]).unwrap();
            assert!(matches!(cli.command, Commands::ResetStats));
        }

        #[test]
        fn parse_quiz_defaults() {
            let cli = Cli::try_parse_from(["quizzer", "quiz"]).unwrap();
            match cli.command {
                Commands::Quiz {
                    assets,
                    topic,
                    count,
                    practice,
                } => {
                    assert!(assets.is_none());
                    assert!(topic.is_empty());
                    assert!(count.is_none());
                    assert!(!practice);
                }
                _ => panic!("Expected Quiz command"),
            }
        }

        #[test]
        fn parse_quiz_preselection() {
            let cli = Cli::try_parse_from([
                "quizzer", "quiz", "-t", "rust", "--topic", "sql", "-c", "10", "--practice",
            ])
            .unwrap();
            match cli.command {
                Commands::Quiz {
                    topic,
                    count,
                    practice,
                    ..
                } => {
                    assert_eq!(topic, vec!["rust".to_string(), "sql".to_string()]);
                    assert_eq!(count, Some(10));
                    assert!(practice);
                }
                _ => panic!("Expected Quiz command"),
            }
        }

        #[test]
        fn parse_json_flag_global() {
            let cli1 = Cli::try_parse_from(["quizzer", "--json", "stats"]).unwrap();
            assert!(cli1.json);

            let cli2 = Cli::try_parse_from(["quizzer", "stats", "--json"]).unwrap();
            assert!(cli2.json);
        }

        #[test]
        fn parse_invalid_command_fails() {
            assert!(Cli::try_parse_from(["quizzer", "invalid"]).is_err());
            assert!(Cli::try_parse_from(["quizzer", "quiz", "--count", "many"]).is_err());
        }
    }
}
