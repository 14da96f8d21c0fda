//! Application state and logic.

use crossterm::event::{KeyCode, KeyEvent};
use anyhow::Context;
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;
use uuid::Uuid;
use vocab_quiz::{
    ChoiceId, Config, Database, GeneratorSettings, QuestionType, Quiz, QuizError, QuizHistory,
    QuizId, QuizResult, Term, UserId,
};

pub struct App {
    pub db: Database,
    pub settings: GeneratorSettings,
    pub history_limit: usize,
    pub user_id: UserId,
    pub view: View,
    pub terms: Vec<Term>,
    pub selected_term: usize,
    pub play: Option<Play>,
    pub stats: SessionStats,
    pub history: Vec<HistoryRow>,
    pub editing: bool,
    pub input_buffer: String,
    pub input_field: InputField,
    pub pending_name: Option<String>,
    pub message: Option<String>,
    pub show_help: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    TermList,
    Quiz,
    History,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    None,
    TermName,
    TermDefinition,
}

/// The quiz currently on screen.
#[derive(Debug, Clone)]
pub struct Play {
    pub term: Term,
    pub quiz: Quiz,
    pub answered: Option<Answered>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Answered {
    pub choice_id: ChoiceId,
    pub is_correct: bool,
}

/// Answers given since the trainer started.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionStats {
    pub answered: usize,
    pub correct: usize,
}

impl SessionStats {
    pub fn accuracy(&self) -> f64 {
        if self.answered == 0 {
            0.0
        } else {
            self.correct as f64 / self.answered as f64
        }
    }
}

#[derive(Debug, Clone)]
pub struct HistoryRow {
    pub history: QuizHistory,
    pub term_name: String,
    pub question_type: QuestionType,
}

impl App {
    pub fn new() -> anyhow::Result<Self> {
        let config = load_config(Config::config_path().as_deref())?;
        let user_id = config.trainer.user_id.unwrap_or_else(Uuid::new_v4);

        let db_path = config.db_path();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::open(&db_path)?;

        Ok(Self::with_database(db, &config, user_id)?)
    }

    pub fn with_database(db: Database, config: &Config, user_id: UserId) -> QuizResult<Self> {
        let mut app = Self {
            db,
            settings: config.to_generator_settings(),
            history_limit: config.trainer.history_limit,
            user_id,
            view: View::TermList,
            terms: Vec::new(),
            selected_term: 0,
            play: None,
            stats: SessionStats::default(),
            history: Vec::new(),
            editing: false,
            input_buffer: String::new(),
            input_field: InputField::None,
            pending_name: None,
            message: None,
            show_help: false,
        };

        app.refresh_terms()?;
        Ok(app)
    }

    pub fn refresh_terms(&mut self) -> QuizResult<()> {
        self.terms = self.db.list_terms()?;
        if self.selected_term >= self.terms.len() && !self.terms.is_empty() {
            self.selected_term = self.terms.len() - 1;
        }
        Ok(())
    }

    pub fn can_quit(&self) -> bool {
        !self.editing && self.view == View::TermList
    }

    pub fn selected_term(&self) -> Option<&Term> {
        self.terms.get(self.selected_term)
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        self.message = None;

        if self.show_help {
            self.show_help = false;
            return;
        }

        if self.editing {
            self.handle_edit_key(key);
            return;
        }

        match self.view {
            View::TermList => self.handle_term_list_key(key),
            View::Quiz => self.handle_quiz_key(key),
            View::History => self.handle_history_key(key),
        }
    }

    fn handle_edit_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.cancel_editing(),
            KeyCode::Enter => self.finish_editing(),
            KeyCode::Backspace => { self.input_buffer.pop(); }
            KeyCode::Char(c) => self.input_buffer.push(c),
            _ => {}
        }
    }

    fn handle_term_list_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if !self.terms.is_empty() {
                    self.selected_term = (self.selected_term + 1).min(self.terms.len() - 1);
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected_term = self.selected_term.saturating_sub(1);
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.start_quiz(QuestionType::DefToTerm),
            KeyCode::Char('t') => self.start_quiz(QuestionType::TermToDef),
            KeyCode::Char('a') => {
                self.editing = true;
                self.input_field = InputField::TermName;
                self.input_buffer.clear();
            }
            KeyCode::Char('h') => self.show_history(),
            KeyCode::Char('?') => self.show_help = true,
            _ => {}
        }
    }

    fn handle_quiz_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                self.answer(index);
            }
            KeyCode::Char('n') | KeyCode::Char('r') => {
                if let Some(play) = &mut self.play {
                    play.answered = None;
                }
            }
            KeyCode::Char('q') | KeyCode::Esc => self.end_quiz(),
            KeyCode::Char('?') => self.show_help = true,
            _ => {}
        }
    }

    fn handle_history_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.view = View::TermList,
            KeyCode::Char('?') => self.show_help = true,
            _ => {}
        }
    }

    fn cancel_editing(&mut self) {
        self.editing = false;
        self.input_buffer.clear();
        self.input_field = InputField::None;
        self.pending_name = None;
    }

    fn finish_editing(&mut self) {
        match self.input_field {
            InputField::TermName => {
                let name = self.input_buffer.trim().to_string();
                if !name.is_empty() {
                    self.pending_name = Some(name);
                    self.input_field = InputField::TermDefinition;
                    self.input_buffer.clear();
                    return;
                }
            }
            InputField::TermDefinition => {
                let definition = self.input_buffer.trim().to_string();
                let name = self.pending_name.take();
                if let Some(name) = name.filter(|_| !definition.is_empty()) {
                    let term = Term::new(name, definition).with_owner(self.user_id);
                    match self.db.insert_term(&term) {
                        Ok(()) => {
                            self.message = Some("Term added".to_string());
                            if let Err(e) = self.refresh_terms() {
                                warn!("Failed to reload terms: {e}");
                            }
                        }
                        Err(e) => self.message = Some(format!("Could not add term: {e}")),
                    }
                }
            }
            InputField::None => {}
        }
        self.cancel_editing();
    }

    fn start_quiz(&mut self, question_type: QuestionType) {
        let Some(term) = self.selected_term().cloned() else {
            return;
        };

        let result = self.db.get_or_create_quiz(
            term.id,
            question_type,
            Some(self.user_id),
            &self.settings,
            &mut rand::thread_rng(),
        );

        match result {
            Ok(quiz) => {
                self.play = Some(Play { term, quiz, answered: None });
                self.view = View::Quiz;
            }
            Err(QuizError::InsufficientChoices { .. }) => {
                self.message = Some("Not enough other terms for a quiz yet".to_string());
            }
            Err(e) => {
                warn!(term_id = %term.id, "Quiz unavailable: {e}");
                self.message = Some(format!("Quiz unavailable: {e}"));
            }
        }
    }

    fn answer(&mut self, index: usize) {
        let Some(play) = &mut self.play else { return };
        if play.answered.is_some() {
            return;
        }
        let Some(choice_id) = play.quiz.choices.get(index).map(|c| c.id) else { return };

        let raw = choice_id.to_string();
        match self.db.record_answer(self.user_id, &play.quiz, Some(&raw)) {
            Ok(history) => {
                play.answered = Some(Answered {
                    choice_id,
                    is_correct: history.is_correct,
                });
                self.stats.answered += 1;
                if history.is_correct {
                    self.stats.correct += 1;
                }
            }
            Err(e) => self.message = Some(format!("Could not record answer: {e}")),
        }
    }

    fn end_quiz(&mut self) {
        self.play = None;
        self.view = View::TermList;
    }

    fn show_history(&mut self) {
        match self.load_history() {
            Ok(rows) => {
                self.history = rows;
                self.view = View::History;
            }
            Err(e) => self.message = Some(format!("Could not load history: {e}")),
        }
    }

    fn load_history(&self) -> QuizResult<Vec<HistoryRow>> {
        let histories = self.db.histories_for_user(self.user_id, self.history_limit)?;
        let mut quizzes: HashMap<QuizId, (String, QuestionType)> = HashMap::new();
        let mut rows = Vec::with_capacity(histories.len());

        for history in histories {
            if !quizzes.contains_key(&history.quiz_id) {
                let Some(quiz) = self.db.get_quiz(history.quiz_id)? else { continue };
                let name = self
                    .db
                    .get_term(quiz.term_id)?
                    .map(|t| t.name)
                    .unwrap_or_default();
                quizzes.insert(quiz.id, (name, quiz.question_type));
            }
            if let Some((term_name, question_type)) = quizzes.get(&history.quiz_id) {
                rows.push(HistoryRow {
                    term_name: term_name.clone(),
                    question_type: *question_type,
                    history,
                });
            }
        }
        Ok(rows)
    }
}

/// Load the config, generating and persisting a user id on first run.
///
/// An unreadable or invalid file is an error and is left untouched.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let mut config = Config::try_load_from(path)
        .context("fix or remove the config file to continue")?
        .unwrap_or_default();
    if config.trainer.user_id.is_none() {
        config.trainer.user_id = Some(Uuid::new_v4());
        config.save_to(path)?;
    }
    Ok(config)
}
