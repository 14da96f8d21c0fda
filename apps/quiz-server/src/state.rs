use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use tokio::task::spawn_blocking;
use tracing::warn;
use vocab_quiz::{
    AnswerOutcome, Config, Database, GeneratorSettings, QuestionType, QuizResult, TermId, UserId,
};

use crate::error::AppError;

/// Results nobody came back for are dropped after this long.
const RESULT_TTL: Duration = Duration::from_secs(10 * 60);

/// Key for a one-time result: who answered what.
pub type ResultKey = (UserId, TermId, QuestionType);

#[derive(Clone)]
pub struct AppState {
    pub settings: GeneratorSettings,
    pub user_header: String,
    db: Arc<Mutex<Database>>,
    last_results: Arc<Mutex<PendingResults>>,
}

impl AppState {
    pub fn new(db: Database, config: &Config) -> anyhow::Result<Self> {
        config.validate()?;

        Ok(Self {
            settings: config.to_generator_settings(),
            user_header: config.server.user_header.clone(),
            db: Arc::new(Mutex::new(db)),
            last_results: Arc::new(Mutex::new(PendingResults::default())),
        })
    }

    /// Run blocking database work off the async executor.
    pub async fn with_db<T, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Database) -> QuizResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);

        spawn_blocking(move || {
            let mut guard = db
                .lock()
                .map_err(|_| AppError::Internal("database lock poisoned".to_string()))?;
            f(&mut guard).map_err(AppError::from)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub fn store_result(&self, key: ResultKey, outcome: AnswerOutcome) {
        match self.last_results.lock() {
            Ok(mut results) => results.insert(key, outcome, Instant::now()),
            Err(_) => warn!(user_id = %key.0, term_id = %key.1, "Result lock poisoned, dropping {outcome:?}"),
        }
    }

    /// Remove and return the pending result, so it shows only once.
    pub fn take_result(&self, key: &ResultKey) -> Option<AnswerOutcome> {
        match self.last_results.lock() {
            Ok(mut results) => results.take(key, Instant::now()),
            Err(_) => {
                warn!(user_id = %key.0, term_id = %key.1, "Result lock poisoned");
                None
            }
        }
    }
}

/// One-time answer results waiting for the follow-up GET.
#[derive(Debug, Default)]
struct PendingResults {
    entries: HashMap<ResultKey, (AnswerOutcome, Instant)>,
}

impl PendingResults {
    fn insert(&mut self, key: ResultKey, outcome: AnswerOutcome, now: Instant) {
        self.entries
            .retain(|_, (_, stored)| now.saturating_duration_since(*stored) < RESULT_TTL);
        self.entries.insert(key, (outcome, now));
    }

    fn take(&mut self, key: &ResultKey, now: Instant) -> Option<AnswerOutcome> {
        let (outcome, stored) = self.entries.remove(key)?;
        (now.saturating_duration_since(stored) < RESULT_TTL).then_some(outcome)
    }
}
