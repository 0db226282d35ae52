use std::path::{Path, PathBuf};

const DEFAULT_DB_NAME: &str = "quizzer.db";
const DEFAULT_ASSETS_DIR: &str = "public";

pub const DB_ENV: &str = "QUIZZER_DB";
pub const ASSETS_ENV: &str = "QUIZZER_ASSETS";

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub assets_dir: PathBuf,
}

impl Config {
    /// Resolves paths from the environment, then defaults. An explicit
    /// `assets` argument wins over both.
    pub fn resolve(assets: Option<&Path>) -> Self {
        Self {
            db_path: db_path(),
            assets_dir: assets
                .map(Path::to_path_buf)
                .unwrap_or_else(assets_dir),
        }
    }
}

pub fn db_path() -> PathBuf {
    if let Ok(path) = std::env::var(DB_ENV) {
        return PathBuf::from(path);
    }

    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quizzer");

    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join(DEFAULT_DB_NAME)
}

pub fn assets_dir() -> PathBuf {
    std::env::var(ASSETS_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_ASSETS_DIR))
}
