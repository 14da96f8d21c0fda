//! Database operations for vocabulary quizzes.

use crate::error::{QuizError, QuizResult};
use crate::generator::{self, GeneratorSettings, TermSource};
use crate::models::{
    Choice, ChoiceId, QuestionType, Quiz, QuizHistory, QuizId, Term, TermId, UserId, Vocabulary,
    VocabularyId,
};
use crate::recorder;
use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use rusqlite::{params, Connection, Result as SqlResult, TransactionBehavior};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SIBLING_TERMS_SQL: &str = "SELECT DISTINCT t.* FROM terms t
     JOIN vocabulary_terms vt ON vt.term_id = t.id
     WHERE vt.vocabulary_id IN (SELECT vocabulary_id FROM vocabulary_terms WHERE term_id = ?1)
       AND t.id != ?1";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> QuizResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    pub fn in_memory() -> QuizResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> QuizResult<()> {
        self.conn.busy_timeout(BUSY_TIMEOUT)?;
        self.conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS terms (
                id TEXT PRIMARY KEY,
                owner_id TEXT,
                name TEXT NOT NULL,
                definition TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS vocabularies (
                id TEXT PRIMARY KEY,
                owner_id TEXT,
                title TEXT NOT NULL,
                description TEXT,
                is_public INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS vocabulary_terms (
                vocabulary_id TEXT NOT NULL REFERENCES vocabularies(id) ON DELETE CASCADE,
                term_id TEXT NOT NULL REFERENCES terms(id) ON DELETE CASCADE,
                order_index INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (vocabulary_id, term_id)
            );

            CREATE TABLE IF NOT EXISTS quizzes (
                id TEXT PRIMARY KEY,
                term_id TEXT NOT NULL REFERENCES terms(id) ON DELETE CASCADE,
                created_by TEXT,
                question_type TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE (term_id, question_type)
            );

            CREATE TABLE IF NOT EXISTS quiz_choices (
                id TEXT PRIMARY KEY,
                quiz_id TEXT NOT NULL REFERENCES quizzes(id) ON DELETE CASCADE,
                text TEXT NOT NULL,
                is_correct INTEGER NOT NULL,
                sort_order INTEGER NOT NULL,
                UNIQUE (quiz_id, sort_order)
            );

            CREATE TABLE IF NOT EXISTS quiz_histories (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                quiz_id TEXT NOT NULL REFERENCES quizzes(id) ON DELETE CASCADE,
                selected_choice_id TEXT REFERENCES quiz_choices(id) ON DELETE SET NULL,
                is_correct INTEGER NOT NULL,
                answered_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_vocabulary_terms_term ON vocabulary_terms(term_id);
            CREATE INDEX IF NOT EXISTS idx_choices_quiz_correct ON quiz_choices(quiz_id, is_correct);
            CREATE INDEX IF NOT EXISTS idx_histories_user_time ON quiz_histories(user_id, answered_at);
            CREATE INDEX IF NOT EXISTS idx_histories_quiz ON quiz_histories(quiz_id);
            "#,
        )?;
        Ok(())
    }

    // Term operations

    pub fn insert_term(&self, term: &Term) -> QuizResult<()> {
        self.conn.execute(
            "INSERT INTO terms (id, owner_id, name, definition, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                term.id.to_string(),
                term.owner.map(|u| u.to_string()),
                term.name,
                term.definition,
                fmt_time(&term.created_at),
                fmt_time(&term.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_term(&self, id: TermId) -> QuizResult<Option<Term>> {
        Ok(load_term(&self.conn, id)?)
    }

    pub fn list_terms(&self) -> QuizResult<Vec<Term>> {
        Ok(query_terms(
            &self.conn,
            "SELECT * FROM terms ORDER BY name COLLATE NOCASE",
            [],
        )?)
    }

    /// Delete a term along with its quizzes, choices, and answer history.
    pub fn delete_term(&self, id: TermId) -> QuizResult<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM terms WHERE id = ?1", params![id.to_string()])?;
        if deleted == 0 {
            return Err(QuizError::NotFound(format!("term {id}")));
        }
        Ok(())
    }

    // Vocabulary operations

    pub fn insert_vocabulary(&self, vocabulary: &Vocabulary) -> QuizResult<()> {
        self.conn.execute(
            "INSERT INTO vocabularies (id, owner_id, title, description, is_public, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                vocabulary.id.to_string(),
                vocabulary.owner.map(|u| u.to_string()),
                vocabulary.title,
                vocabulary.description,
                vocabulary.is_public,
                fmt_time(&vocabulary.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn add_term_to_vocabulary(
        &self,
        vocabulary_id: VocabularyId,
        term_id: TermId,
        order_index: u32,
    ) -> QuizResult<()> {
        self.conn.execute(
            "INSERT INTO vocabulary_terms (vocabulary_id, term_id, order_index)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(vocabulary_id, term_id) DO UPDATE SET order_index = excluded.order_index",
            params![vocabulary_id.to_string(), term_id.to_string(), order_index],
        )?;
        Ok(())
    }

    // Quiz operations

    pub fn find_quiz(&self, term_id: TermId, question_type: QuestionType) -> QuizResult<Option<Quiz>> {
        Ok(find_quiz_in(&self.conn, term_id, question_type)?)
    }

    pub fn get_quiz(&self, id: QuizId) -> QuizResult<Option<Quiz>> {
        let mut stmt = self.conn.prepare("SELECT * FROM quizzes WHERE id = ?1")?;
        let quiz = stmt.query_row(params![id.to_string()], parse_quiz_row);

        match quiz {
            Ok(mut q) => {
                q.choices = load_choices(&self.conn, q.id)?;
                Ok(Some(q))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Persist a quiz and all of its choices, or nothing.
    pub fn insert_quiz(&mut self, quiz: &Quiz) -> QuizResult<()> {
        let tx = self.conn.transaction()?;
        insert_quiz_rows(&tx, quiz)?;
        tx.commit()?;
        Ok(())
    }

    /// Return the quiz for (term, question type), generating it on first use.
    ///
    /// The lookup, generation, and insert run in one immediate transaction so
    /// concurrent first requests end up sharing a single quiz.
    pub fn get_or_create_quiz<R: Rng + ?Sized>(
        &mut self,
        term_id: TermId,
        question_type: QuestionType,
        created_by: Option<UserId>,
        settings: &GeneratorSettings,
        rng: &mut R,
    ) -> QuizResult<Quiz> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if let Some(existing) = find_quiz_in(&tx, term_id, question_type)? {
            debug!(quiz_id = %existing.id, %question_type, "Reusing quiz");
            return Ok(existing);
        }

        let term = load_term(&tx, term_id)?
            .ok_or_else(|| QuizError::NotFound(format!("term {term_id}")))?;
        let quiz = generator::generate(&*tx, &term, question_type, created_by, settings, rng)?;
        insert_quiz_rows(&tx, &quiz)?;
        tx.commit()?;

        info!(
            quiz_id = %quiz.id,
            term_id = %term_id,
            %question_type,
            choices = quiz.choices.len(),
            "Generated quiz"
        );
        Ok(quiz)
    }

    // History operations

    /// Validate `raw_choice_id` against `quiz` and append a history row.
    pub fn record_answer(
        &self,
        user: UserId,
        quiz: &Quiz,
        raw_choice_id: Option<&str>,
    ) -> QuizResult<QuizHistory> {
        let history = recorder::record_answer(user, quiz, raw_choice_id)?;
        self.conn.execute(
            "INSERT INTO quiz_histories (id, user_id, quiz_id, selected_choice_id, is_correct, answered_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                history.id.to_string(),
                history.user_id.to_string(),
                history.quiz_id.to_string(),
                history.selected_choice_id.map(|c| c.to_string()),
                history.is_correct,
                fmt_time(&history.answered_at),
            ],
        )?;

        info!(
            user_id = %user,
            quiz_id = %quiz.id,
            correct = history.is_correct,
            "Recorded answer"
        );
        Ok(history)
    }

    /// Most recent answers first.
    pub fn histories_for_user(&self, user: UserId, limit: usize) -> QuizResult<Vec<QuizHistory>> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM quiz_histories WHERE user_id = ?1
             ORDER BY answered_at DESC, rowid DESC
             LIMIT ?2",
        )?;
        let histories = stmt
            .query_map(params![user.to_string(), limit as i64], parse_history_row)?
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(histories)
    }

    pub fn history_for_quiz(&self, quiz_id: QuizId) -> QuizResult<Vec<QuizHistory>> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM quiz_histories WHERE quiz_id = ?1 ORDER BY answered_at, rowid",
        )?;
        let histories = stmt
            .query_map(params![quiz_id.to_string()], parse_history_row)?
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(histories)
    }

    /// Remove a choice. History rows that selected it keep their correctness.
    pub fn delete_choice(&self, id: ChoiceId) -> QuizResult<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM quiz_choices WHERE id = ?1", params![id.to_string()])?;
        if deleted == 0 {
            return Err(QuizError::NotFound(format!("choice {id}")));
        }
        Ok(())
    }
}

impl TermSource for Connection {
    fn sibling_terms(&self, term: &Term) -> QuizResult<Vec<Term>> {
        Ok(query_terms(self, SIBLING_TERMS_SQL, params![term.id.to_string()])?)
    }

    fn all_terms(&self) -> QuizResult<Vec<Term>> {
        Ok(query_terms(self, "SELECT * FROM terms", [])?)
    }
}

impl TermSource for Database {
    fn sibling_terms(&self, term: &Term) -> QuizResult<Vec<Term>> {
        self.conn.sibling_terms(term)
    }

    fn all_terms(&self) -> QuizResult<Vec<Term>> {
        self.conn.all_terms()
    }
}

fn load_term(conn: &Connection, id: TermId) -> SqlResult<Option<Term>> {
    let mut stmt = conn.prepare("SELECT * FROM terms WHERE id = ?1")?;
    let term = stmt.query_row(params![id.to_string()], parse_term_row);

    match term {
        Ok(t) => Ok(Some(t)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

fn query_terms<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> SqlResult<Vec<Term>> {
    let mut stmt = conn.prepare(sql)?;
    let terms = stmt
        .query_map(params, parse_term_row)?
        .collect::<SqlResult<Vec<_>>>()?;
    Ok(terms)
}

fn find_quiz_in(
    conn: &Connection,
    term_id: TermId,
    question_type: QuestionType,
) -> SqlResult<Option<Quiz>> {
    let mut stmt = conn.prepare("SELECT * FROM quizzes WHERE term_id = ?1 AND question_type = ?2")?;
    let quiz = stmt.query_row(
        params![term_id.to_string(), question_type.code()],
        parse_quiz_row,
    );

    match quiz {
        Ok(mut q) => {
            q.choices = load_choices(conn, q.id)?;
            Ok(Some(q))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

fn load_choices(conn: &Connection, quiz_id: QuizId) -> SqlResult<Vec<Choice>> {
    let mut stmt = conn.prepare("SELECT * FROM quiz_choices WHERE quiz_id = ?1 ORDER BY sort_order")?;
    let choices = stmt
        .query_map(params![quiz_id.to_string()], parse_choice_row)?
        .collect::<SqlResult<Vec<_>>>()?;
    Ok(choices)
}

fn insert_quiz_rows(conn: &Connection, quiz: &Quiz) -> SqlResult<()> {
    conn.execute(
        "INSERT INTO quizzes (id, term_id, created_by, question_type, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            quiz.id.to_string(),
            quiz.term_id.to_string(),
            quiz.created_by.map(|u| u.to_string()),
            quiz.question_type.code(),
            fmt_time(&quiz.created_at),
        ],
    )?;

    let mut stmt = conn.prepare(
        "INSERT INTO quiz_choices (id, quiz_id, text, is_correct, sort_order)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for choice in &quiz.choices {
        stmt.execute(params![
            choice.id.to_string(),
            quiz.id.to_string(),
            choice.text,
            choice.is_correct,
            choice.order,
        ])?;
    }
    Ok(())
}

fn fmt_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error(column: &str, value: &str, reason: impl std::fmt::Display) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        format!("{column}: invalid value {value:?}: {reason}").into(),
    )
}

fn get_uuid(row: &rusqlite::Row, column: &str) -> SqlResult<Uuid> {
    let value: String = row.get(column)?;
    Uuid::parse_str(&value).map_err(|e| conversion_error(column, &value, e))
}

fn get_opt_uuid(row: &rusqlite::Row, column: &str) -> SqlResult<Option<Uuid>> {
    let value: Option<String> = row.get(column)?;
    value
        .map(|v| Uuid::parse_str(&v).map_err(|e| conversion_error(column, &v, e)))
        .transpose()
}

fn get_time(row: &rusqlite::Row, column: &str) -> SqlResult<DateTime<Utc>> {
    let value: String = row.get(column)?;
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, &value, e))
}

fn parse_term_row(row: &rusqlite::Row) -> SqlResult<Term> {
    Ok(Term {
        id: get_uuid(row, "id")?,
        owner: get_opt_uuid(row, "owner_id")?,
        name: row.get("name")?,
        definition: row.get("definition")?,
        created_at: get_time(row, "created_at")?,
        updated_at: get_time(row, "updated_at")?,
    })
}

fn parse_quiz_row(row: &rusqlite::Row) -> SqlResult<Quiz> {
    let type_str: String = row.get("question_type")?;
    let question_type = type_str
        .parse::<QuestionType>()
        .map_err(|e| conversion_error("question_type", &type_str, e))?;

    Ok(Quiz {
        id: get_uuid(row, "id")?,
        term_id: get_uuid(row, "term_id")?,
        created_by: get_opt_uuid(row, "created_by")?,
        question_type,
        created_at: get_time(row, "created_at")?,
        choices: Vec::new(),
    })
}

fn parse_choice_row(row: &rusqlite::Row) -> SqlResult<Choice> {
    Ok(Choice {
        id: get_uuid(row, "id")?,
        quiz_id: get_uuid(row, "quiz_id")?,
        text: row.get("text")?,
        is_correct: row.get("is_correct")?,
        order: row.get("sort_order")?,
    })
}

fn parse_history_row(row: &rusqlite::Row) -> SqlResult<QuizHistory> {
    Ok(QuizHistory {
        id: get_uuid(row, "id")?,
        user_id: get_uuid(row, "user_id")?,
        quiz_id: get_uuid(row, "quiz_id")?,
        selected_choice_id: get_opt_uuid(row, "selected_choice_id")?,
        is_correct: row.get("is_correct")?,
        answered_at: get_time(row, "answered_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn seed_vocabulary(db: &Database, title: &str, names: &[&str]) -> Vec<Term> {
        let vocabulary = Vocabulary::new(title);
        db.insert_vocabulary(&vocabulary).unwrap();
        names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let term = Term::new(*name, format!("Definition of {name}"));
                db.insert_term(&term).unwrap();
                db.add_term_to_vocabulary(vocabulary.id, term.id, i as u32).unwrap();
                term
            })
            .collect()
    }

    fn count(db: &Database, table: &str) -> i64 {
        db.conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_term_crud() {
        let db = Database::in_memory().unwrap();
        let term = Term::new("Osmosis", "Water crossing a membrane").with_owner(Uuid::new_v4());
        db.insert_term(&term).unwrap();

        let loaded = db.get_term(term.id).unwrap().unwrap();
        assert_eq!(loaded.name, "Osmosis");
        assert_eq!(loaded.owner, term.owner);
        assert_eq!(db.list_terms().unwrap().len(), 1);

        db.delete_term(term.id).unwrap();
        assert!(db.get_term(term.id).unwrap().is_none());
        assert!(matches!(db.delete_term(term.id), Err(QuizError::NotFound(_))));
    }

    #[test]
    fn test_sibling_terms() {
        let db = Database::in_memory().unwrap();
        let biology = seed_vocabulary(&db, "Biology", &["Cell", "Tissue", "Organ"]);
        seed_vocabulary(&db, "Physics", &["Force", "Mass"]);

        let siblings = db.sibling_terms(&biology[0]).unwrap();
        let names: HashSet<String> = siblings.into_iter().map(|t| t.name).collect();
        assert_eq!(names, HashSet::from(["Tissue".to_string(), "Organ".to_string()]));

        assert_eq!(db.all_terms().unwrap().len(), 5);
    }

    #[test]
    fn test_get_or_create_reuses_quiz() {
        let mut db = Database::in_memory().unwrap();
        let terms = seed_vocabulary(&db, "Biology", &["Photosynthesis", "Respiration", "Osmosis", "Mitosis"]);
        seed_vocabulary(&db, "Physics", &["Force", "Mass", "Energy"]);
        let settings = GeneratorSettings::default();
        let mut rng = StdRng::seed_from_u64(42);

        let quiz = db
            .get_or_create_quiz(terms[0].id, QuestionType::DefToTerm, None, &settings, &mut rng)
            .unwrap();
        assert_eq!(quiz.choices.len(), 4);

        // All three distractors come from the same vocabulary.
        let distractors: HashSet<&str> = quiz
            .choices
            .iter()
            .filter(|c| !c.is_correct)
            .map(|c| c.text.as_str())
            .collect();
        assert_eq!(distractors, HashSet::from(["Respiration", "Osmosis", "Mitosis"]));

        let again = db
            .get_or_create_quiz(terms[0].id, QuestionType::DefToTerm, None, &settings, &mut rng)
            .unwrap();
        assert_eq!(again.id, quiz.id);
        let orders: Vec<u16> = again.choices.iter().map(|c| c.order).collect();
        assert_eq!(orders, vec![0, 1, 2, 3]);

        let other_type = db
            .get_or_create_quiz(terms[0].id, QuestionType::TermToDef, None, &settings, &mut rng)
            .unwrap();
        assert_ne!(other_type.id, quiz.id);
        assert_eq!(count(&db, "quizzes"), 2);
        assert_eq!(count(&db, "quiz_choices"), 8);

        let loaded = db.get_quiz(quiz.id).unwrap().unwrap();
        assert_eq!(loaded, again);
    }

    #[test]
    fn test_get_or_create_unknown_term() {
        let mut db = Database::in_memory().unwrap();
        let result = db.get_or_create_quiz(
            Uuid::new_v4(),
            QuestionType::DefToTerm,
            None,
            &GeneratorSettings::default(),
            &mut StdRng::seed_from_u64(1),
        );
        assert!(matches!(result, Err(QuizError::NotFound(_))));
        assert_eq!(count(&db, "quizzes"), 0);
    }

    #[test]
    fn test_failed_generation_leaves_nothing() {
        let mut db = Database::in_memory().unwrap();
        let terms = seed_vocabulary(&db, "Solo", &["Lonely"]);

        let result = db.get_or_create_quiz(
            terms[0].id,
            QuestionType::DefToTerm,
            None,
            &GeneratorSettings::default(),
            &mut StdRng::seed_from_u64(1),
        );
        assert!(matches!(result, Err(QuizError::InsufficientChoices { .. })));
        assert_eq!(count(&db, "quizzes"), 0);
        assert_eq!(count(&db, "quiz_choices"), 0);
    }

    #[test]
    fn test_insert_quiz_is_all_or_nothing() {
        let mut db = Database::in_memory().unwrap();
        let terms = seed_vocabulary(&db, "Biology", &["Cell", "Tissue"]);

        let quiz_id = Uuid::new_v4();
        // Two choices sharing order 0 violate the unique constraint on the second insert.
        let quiz = Quiz {
            id: quiz_id,
            term_id: terms[0].id,
            created_by: None,
            question_type: QuestionType::DefToTerm,
            created_at: Utc::now(),
            choices: vec![
                Choice::new(quiz_id, "Cell", true),
                Choice::new(quiz_id, "Tissue", false),
            ],
        };

        assert!(matches!(db.insert_quiz(&quiz), Err(QuizError::Storage(_))));
        assert_eq!(count(&db, "quizzes"), 0);
        assert_eq!(count(&db, "quiz_choices"), 0);
    }

    #[test]
    fn test_record_answer() {
        let mut db = Database::in_memory().unwrap();
        let terms = seed_vocabulary(&db, "Biology", &["Cell", "Tissue", "Organ", "System"]);
        let user = Uuid::new_v4();
        let quiz = db
            .get_or_create_quiz(
                terms[0].id,
                QuestionType::DefToTerm,
                Some(user),
                &GeneratorSettings::default(),
                &mut StdRng::seed_from_u64(2),
            )
            .unwrap();
        assert_eq!(quiz.created_by, Some(user));

        let correct = quiz.correct_choice().unwrap().id.to_string();
        let wrong = quiz.choices.iter().find(|c| !c.is_correct).unwrap().id.to_string();

        assert!(db.record_answer(user, &quiz, Some(&correct)).unwrap().is_correct);
        assert!(!db.record_answer(user, &quiz, Some(&wrong)).unwrap().is_correct);
        assert!(db.record_answer(user, &quiz, Some(&correct)).unwrap().is_correct);

        let history = db.histories_for_user(user, 10).unwrap();
        assert_eq!(history.len(), 3);
        assert!(history[0].is_correct);
        assert!(!history[1].is_correct);

        assert_eq!(db.history_for_quiz(quiz.id).unwrap().len(), 3);
        assert!(db.histories_for_user(Uuid::new_v4(), 10).unwrap().is_empty());
    }

    #[test]
    fn test_rejected_answers_write_nothing() {
        let mut db = Database::in_memory().unwrap();
        let terms = seed_vocabulary(&db, "Biology", &["Cell", "Tissue", "Organ"]);
        let settings = GeneratorSettings::default();
        let mut rng = StdRng::seed_from_u64(3);
        let quiz = db
            .get_or_create_quiz(terms[0].id, QuestionType::DefToTerm, None, &settings, &mut rng)
            .unwrap();
        let other = db
            .get_or_create_quiz(terms[1].id, QuestionType::DefToTerm, None, &settings, &mut rng)
            .unwrap();
        let user = Uuid::new_v4();

        let foreign = other.choices[0].id.to_string();
        assert!(matches!(
            db.record_answer(user, &quiz, Some(&foreign)),
            Err(QuizError::NotFound(_))
        ));
        assert!(matches!(
            db.record_answer(user, &quiz, None),
            Err(QuizError::InvalidArgument(_))
        ));
        assert!(matches!(
            db.record_answer(user, &quiz, Some("not-a-uuid")),
            Err(QuizError::InvalidArgument(_))
        ));
        assert_eq!(count(&db, "quiz_histories"), 0);
    }

    #[test]
    fn test_deleted_choice_keeps_history_snapshot() {
        let mut db = Database::in_memory().unwrap();
        let terms = seed_vocabulary(&db, "Biology", &["Cell", "Tissue", "Organ"]);
        let quiz = db
            .get_or_create_quiz(
                terms[0].id,
                QuestionType::DefToTerm,
                None,
                &GeneratorSettings::default(),
                &mut StdRng::seed_from_u64(4),
            )
            .unwrap();
        let user = Uuid::new_v4();
        let correct = quiz.correct_choice().unwrap().id;

        let recorded = db
            .record_answer(user, &quiz, Some(&correct.to_string()))
            .unwrap();
        db.delete_choice(correct).unwrap();

        let history = db.histories_for_user(user, 1).unwrap();
        assert_eq!(history[0].id, recorded.id);
        assert_eq!(history[0].selected_choice_id, None);
        assert!(history[0].is_correct);
        // Stored with microsecond precision.
        assert_eq!((history[0].answered_at - recorded.answered_at).num_milliseconds(), 0);

        assert!(matches!(db.delete_choice(correct), Err(QuizError::NotFound(_))));
    }

    #[test]
    fn test_delete_term_cascades() {
        let mut db = Database::in_memory().unwrap();
        let terms = seed_vocabulary(&db, "Biology", &["Cell", "Tissue", "Organ"]);
        let quiz = db
            .get_or_create_quiz(
                terms[0].id,
                QuestionType::DefToTerm,
                None,
                &GeneratorSettings::default(),
                &mut StdRng::seed_from_u64(5),
            )
            .unwrap();
        let choice = quiz.choices[0].id.to_string();
        db.record_answer(Uuid::new_v4(), &quiz, Some(&choice)).unwrap();

        db.delete_term(terms[0].id).unwrap();
        assert_eq!(count(&db, "quizzes"), 0);
        assert_eq!(count(&db, "quiz_choices"), 0);
        assert_eq!(count(&db, "quiz_histories"), 0);
    }

    #[test]
    fn test_concurrent_first_requests_share_quiz() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quiz.db");

        let term_id = {
            let db = Database::open(&path).unwrap();
            seed_vocabulary(&db, "Biology", &["Cell", "Tissue", "Organ", "System"])[0].id
        };

        let barrier = Arc::new(Barrier::new(4));
        let handles: Vec<_> = (0..4u64)
            .map(|seed| {
                let path = path.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let mut db = Database::open(&path).unwrap();
                    barrier.wait();
                    db.get_or_create_quiz(
                        term_id,
                        QuestionType::DefToTerm,
                        None,
                        &GeneratorSettings::default(),
                        &mut StdRng::seed_from_u64(seed),
                    )
                    .unwrap()
                    .id
                })
            })
            .collect();

        let ids: HashSet<QuizId> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(ids.len(), 1);

        let db = Database::open(&path).unwrap();
        assert_eq!(count(&db, "quizzes"), 1);
        assert_eq!(count(&db, "quiz_choices"), 4);
    }
}
