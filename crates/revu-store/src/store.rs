use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Row, Transaction, TransactionBehavior, params};
use serde::Serialize;

use revu_core::{
    AllocationResult, Answer, FeedbackEvent, FeedbackPolicy, ReviewState, schedule,
};

use crate::error::{Result, StoreError};
use crate::schema;

/// Persisted schedule for one (user, question) pair.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReviewRecord {
    pub user_id: String,
    pub question_id: String,
    pub content_id: String,
    pub state: ReviewState,
    pub last_reviewed_at: u64,
    pub next_review_due_at: u64,
}

/// One answered review, as appended to the history log.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReviewLogEntry {
    pub question_id: String,
    pub content_id: String,
    pub quality: u8,
    pub feedback: Option<String>,
    pub response_time_seconds: Option<f64>,
    pub reviewed_at: u64,
    pub interval_days: u32,
    pub ease_factor: f64,
}

/// Aggregate statistics over a user's recorded sessions.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SessionSummary {
    pub sessions: u64,
    pub total_questions: u64,
    pub total_minutes: f64,
}

pub struct Store {
    conn: Connection,
}

const RECORD_COLUMNS: &str = "user_id, question_id, content_id, repetitions, ease_factor,
     interval_days, last_quality, last_reviewed_at, next_review_due_at";

fn to_sql_secs(secs: u64) -> Result<i64> {
    i64::try_from(secs)
        .map_err(|_| StoreError::InvalidData(format!("timestamp {secs} out of range")))
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<ReviewRecord> {
    Ok(ReviewRecord {
        user_id: row.get(0)?,
        question_id: row.get(1)?,
        content_id: row.get(2)?,
        state: ReviewState {
            repetitions: row.get(3)?,
            ease_factor: row.get(4)?,
            interval: row.get(5)?,
            last_quality: row.get(6)?,
        },
        last_reviewed_at: row.get::<_, i64>(7)?.max(0) as u64,
        next_review_due_at: row.get::<_, i64>(8)?.max(0) as u64,
    })
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    // --- Metadata ---

    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    // --- Review state ---

    pub fn load_review_state(&self, user_id: &str, question_id: &str) -> Result<Option<ReviewRecord>> {
        load_record(&self.conn, user_id, question_id)
    }

    /// Stored state, or the fresh initializer for a question never reviewed.
    pub fn review_state_or_fresh(&self, user_id: &str, question_id: &str) -> Result<ReviewState> {
        Ok(self
            .load_review_state(user_id, question_id)?
            .map(|r| r.state)
            .unwrap_or_default())
    }

    /// Apply one answer and persist the new schedule.
    ///
    /// Read, update and write happen in one IMMEDIATE transaction, so two
    /// writers answering the same question are serialized by SQLite.
    pub fn record_feedback(
        &self,
        user_id: &str,
        event: &FeedbackEvent,
        policy: &FeedbackPolicy,
        now: u64,
    ) -> Result<ReviewRecord> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;

        let prior = load_record(&tx, user_id, &event.question_id)?;
        if let Some(prior) = &prior
            && prior.content_id != event.content_id
        {
            return Err(StoreError::InvalidData(format!(
                "question '{}' belongs to content '{}', not '{}'",
                event.question_id, prior.content_id, event.content_id
            )));
        }

        let state = prior.map(|r| r.state).unwrap_or_default();
        let scheduled = schedule(&state, event, policy, now)?;
        let reviewed_at = to_sql_secs(scheduled.reviewed_at)?;
        let due_at = to_sql_secs(scheduled.next_review_due_at)?;

        tx.execute(
            "INSERT INTO review_states
                (user_id, question_id, content_id, repetitions, ease_factor,
                 interval_days, last_quality, last_reviewed_at, next_review_due_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(user_id, question_id) DO UPDATE SET
                repetitions = excluded.repetitions,
                ease_factor = excluded.ease_factor,
                interval_days = excluded.interval_days,
                last_quality = excluded.last_quality,
                last_reviewed_at = excluded.last_reviewed_at,
                next_review_due_at = excluded.next_review_due_at",
            params![
                user_id,
                event.question_id,
                event.content_id,
                scheduled.state.repetitions,
                scheduled.state.ease_factor,
                scheduled.state.interval,
                scheduled.state.last_quality,
                reviewed_at,
                due_at,
            ],
        )?;

        let feedback = match event.answer {
            Answer::Feedback(f) => Some(f.as_str()),
            Answer::Quality(_) => None,
        };
        tx.execute(
            "INSERT INTO review_log
                (user_id, question_id, content_id, quality, feedback,
                 response_time_seconds, reviewed_at, interval_days, ease_factor)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                user_id,
                event.question_id,
                event.content_id,
                scheduled.quality,
                feedback,
                event.response_time_seconds,
                reviewed_at,
                scheduled.state.interval,
                scheduled.state.ease_factor,
            ],
        )?;

        tx.commit()?;

        tracing::info!(
            user = user_id,
            question = %event.question_id,
            quality = scheduled.quality,
            interval = scheduled.state.interval,
            "recorded review"
        );

        Ok(ReviewRecord {
            user_id: user_id.to_string(),
            question_id: event.question_id.clone(),
            content_id: event.content_id.clone(),
            state: scheduled.state,
            last_reviewed_at: scheduled.reviewed_at,
            next_review_due_at: scheduled.next_review_due_at,
        })
    }

    /// Reviews due at or before `now`, soonest first.
    pub fn due_reviews(&self, user_id: &str, now: u64) -> Result<Vec<ReviewRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM review_states
             WHERE user_id = ?1 AND next_review_due_at <= ?2
             ORDER BY next_review_due_at, question_id"
        ))?;
        let records = stmt
            .query_map(params![user_id, to_sql_secs(now)?], row_to_record)?
            .collect::<std::result::Result<_, _>>()?;
        Ok(records)
    }

    /// Number of questions with a stored schedule for the user.
    pub fn review_count(&self, user_id: &str) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM review_states WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Answer history for one question, oldest first.
    pub fn review_history(&self, user_id: &str, question_id: &str) -> Result<Vec<ReviewLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT question_id, content_id, quality, feedback, response_time_seconds,
                    reviewed_at, interval_days, ease_factor
             FROM review_log WHERE user_id = ?1 AND question_id = ?2 ORDER BY id",
        )?;
        let entries = stmt
            .query_map(params![user_id, question_id], |row| {
                Ok(ReviewLogEntry {
                    question_id: row.get(0)?,
                    content_id: row.get(1)?,
                    quality: row.get(2)?,
                    feedback: row.get(3)?,
                    response_time_seconds: row.get(4)?,
                    reviewed_at: row.get::<_, i64>(5)?.max(0) as u64,
                    interval_days: row.get(6)?,
                    ease_factor: row.get(7)?,
                })
            })?
            .collect::<std::result::Result<_, _>>()?;
        Ok(entries)
    }

    // --- Session statistics ---

    /// Persist aggregate figures for an emitted plan. Returns the session id.
    pub fn record_session(&self, user_id: &str, plan: &AllocationResult, now: u64) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO session_stats
                (id, user_id, strategy, question_count, content_count, estimated_minutes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id,
                user_id,
                plan.strategy.as_str(),
                plan.len() as i64,
                plan.content_distribution.len() as i64,
                plan.estimated_total_time_minutes,
                to_sql_secs(now)?,
            ],
        )?;
        tracing::debug!(session = %id, questions = plan.len(), "recorded session");
        Ok(id)
    }

    pub fn session_summary(&self, user_id: &str) -> Result<SessionSummary> {
        let (sessions, total_questions, total_minutes): (i64, i64, f64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(question_count), 0), COALESCE(SUM(estimated_minutes), 0.0)
             FROM session_stats WHERE user_id = ?1",
            [user_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        Ok(SessionSummary {
            sessions: sessions as u64,
            total_questions: total_questions as u64,
            total_minutes,
        })
    }
}

fn load_record(conn: &Connection, user_id: &str, question_id: &str) -> Result<Option<ReviewRecord>> {
    let record = conn
        .query_row(
            &format!(
                "SELECT {RECORD_COLUMNS} FROM review_states WHERE user_id = ?1 AND question_id = ?2"
            ),
            params![user_id, question_id],
            row_to_record,
        )
        .optional()?;
    Ok(record)
}
