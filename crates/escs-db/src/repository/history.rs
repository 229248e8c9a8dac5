//! # History Repository
//!
//! Append-only log of returned books.
//!
//! There is no update or delete here, and triggers on the table reject both.
//! Check-ins normally reach this table through
//! [`StudentRepository::replace_books`](super::student::StudentRepository::replace_books),
//! which calls [`insert_record`] inside its transaction.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use escs_core::{Book, HistoryAction, HistoryRecord};

#[derive(Debug, sqlx::FromRow)]
struct HistoryRow {
    id: String,
    student_id: String,
    student_name: String,
    code: String,
    title: String,
    author: String,
    cover: Option<String>,
    checkout_date: Option<DateTime<Utc>>,
    checkin_date: Option<DateTime<Utc>>,
    action: String,
    occurred_at: DateTime<Utc>,
}

impl TryFrom<HistoryRow> for HistoryRecord {
    type Error = DbError;

    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        let action: HistoryAction = row
            .action
            .parse()
            .map_err(|reason: String| DbError::corrupt("history", reason))?;

        Ok(HistoryRecord {
            id: row.id,
            student_id: row.student_id,
            student_name: row.student_name,
            book: Book {
                code: row.code,
                title: row.title,
                author: row.author,
                cover: row.cover,
                checkout_date: row.checkout_date,
                checkin_date: row.checkin_date,
            },
            action,
            occurred_at: row.occurred_at,
        })
    }
}

/// Inserts one record on an existing connection or transaction.
pub(crate) async fn insert_record(
    conn: &mut SqliteConnection,
    record: &HistoryRecord,
) -> DbResult<()> {
    debug!(
        id = %record.id,
        student_id = %record.student_id,
        code = %record.book.code,
        "Appending history record"
    );

    sqlx::query(
        r#"
        INSERT INTO history (
            id, student_id, student_name,
            code, title, author, cover,
            checkout_date, checkin_date,
            action, occurred_at
        ) VALUES (
            ?1, ?2, ?3,
            ?4, ?5, ?6, ?7,
            ?8, ?9,
            ?10, ?11
        )
        "#,
    )
    .bind(&record.id)
    .bind(&record.student_id)
    .bind(&record.student_name)
    .bind(&record.book.code)
    .bind(&record.book.title)
    .bind(&record.book.author)
    .bind(&record.book.cover)
    .bind(record.book.checkout_date)
    .bind(record.book.checkin_date)
    .bind(record.action.to_string())
    .bind(record.occurred_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Repository for return history.
#[derive(Debug, Clone)]
pub struct HistoryRepository {
    pool: SqlitePool,
}

impl HistoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        HistoryRepository { pool }
    }

    /// Appends a record outside of a book list commit.
    pub async fn append(&self, record: &HistoryRecord) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        insert_record(&mut conn, record).await
    }

    /// All records for a student, newest first.
    pub async fn list_for_student(&self, student_id: &str) -> DbResult<Vec<HistoryRecord>> {
        let rows: Vec<HistoryRow> = sqlx::query_as(
            r#"
            SELECT
                id, student_id, student_name,
                code, title, author, cover,
                checkout_date, checkin_date,
                action, occurred_at
            FROM history
            WHERE student_id = ?1
            ORDER BY occurred_at DESC, rowid DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        let mut records = rows
            .into_iter()
            .map(HistoryRecord::try_from)
            .collect::<DbResult<Vec<_>>>()?;

        // Stored text has a variable number of fractional digits.
        escs_core::history::sort_newest_first(&mut records);
        Ok(records)
    }
}
