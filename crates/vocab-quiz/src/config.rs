//! Configuration shared by the quiz server and trainer.

use crate::generator::GeneratorSettings;
use crate::models::UserId;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "vocab-quiz";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub quiz: QuizConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub trainer: TrainerConfig,
}

impl Config {
    /// Load the platform config file. `Ok(None)` means there is no file yet.
    pub fn try_load() -> anyhow::Result<Option<Self>> {
        match Self::config_path() {
            Some(path) => Self::try_load_from(&path),
            None => Ok(None),
        }
    }

    /// Load and validate `path`. A file that exists but doesn't parse is an
    /// error, so callers never write defaults over it.
    pub fn try_load_from(path: &Path) -> anyhow::Result<Option<Self>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()))
            }
        };

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config in {}", path.display()))?;
        Ok(Some(config))
    }

    pub fn save(&self) -> anyhow::Result<()> {
        if let Some(path) = Self::config_path() {
            self.save_to(&path)?;
        }
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.quiz.choice_count < 2 {
            bail!(
                "quiz.choice_count must be at least 2, got {}",
                self.quiz.choice_count
            );
        }
        Ok(())
    }

    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", APP_NAME)
            .map(|d| d.config_dir().join("config.toml"))
    }

    pub fn data_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", APP_NAME).map(|d| d.data_dir().to_path_buf())
    }

    /// Database location: explicit setting, else the platform data dir.
    pub fn db_path(&self) -> PathBuf {
        self.storage
            .db_path
            .clone()
            .or_else(|| Self::data_dir().map(|d| d.join("vocab-quiz.db")))
            .unwrap_or_else(|| "vocab-quiz.db".into())
    }

    pub fn to_generator_settings(&self) -> GeneratorSettings {
        GeneratorSettings {
            choice_count: self.quiz.choice_count,
            allow_underfilled: self.quiz.allow_underfilled,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizConfig {
    #[serde(default = "default_choice_count")]
    pub choice_count: usize,
    #[serde(default = "default_true")]
    pub allow_underfilled: bool,
}

fn default_choice_count() -> usize { 4 }
fn default_true() -> bool { true }

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            choice_count: 4,
            allow_underfilled: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Header carrying the acting user's id, set by the fronting auth layer.
    #[serde(default = "default_user_header")]
    pub user_header: String,
}

fn default_bind() -> String { "127.0.0.1:8000".to_string() }
fn default_user_header() -> String { "x-user-id".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            user_header: default_user_header(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Generated and saved on first run.
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_history_limit() -> usize { 50 }

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            user_id: None,
            history_limit: 50,
        }
    }
}
