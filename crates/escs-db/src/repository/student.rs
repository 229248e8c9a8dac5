//! # Student Repository
//!
//! Students and the books they currently hold.
//!
//! ## Book List Commit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  replace_books(student_id, books, history)                              │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │    SELECT student            ── missing? NotFound, rollback            │
//! │    DELETE student_books                                                │
//! │    INSERT each book          ── UNIQUE(student_id, code)               │
//! │    INSERT history record     ── check-ins only                         │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  Either the new list and its record both land, or neither does.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::history;
use escs_core::validation::validate_student_name;
use escs_core::{Book, HistoryRecord, Student};

/// Attempts at finding an unused random id before giving up.
const MAX_ID_ATTEMPTS: usize = 5;

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct StudentRow {
    id: String,
    name: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct BookRow {
    student_id: String,
    code: String,
    title: String,
    author: String,
    cover: Option<String>,
    checkout_date: Option<DateTime<Utc>>,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Book {
            code: row.code,
            title: row.title,
            author: row.author,
            cover: row.cover,
            checkout_date: row.checkout_date,
            checkin_date: None,
        }
    }
}

fn assemble(row: StudentRow, books: Vec<Book>) -> Student {
    Student {
        id: row.id,
        name: row.name,
        books,
        created_at: row.created_at,
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for students and their checked-out books.
#[derive(Debug, Clone)]
pub struct StudentRepository {
    pool: SqlitePool,
}

impl StudentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StudentRepository { pool }
    }

    /// All students ordered by name, each with their books in checkout order.
    pub async fn list(&self) -> DbResult<Vec<Student>> {
        let rows: Vec<StudentRow> = sqlx::query_as(
            r#"
            SELECT id, name, created_at
            FROM students
            ORDER BY name COLLATE NOCASE, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let book_rows: Vec<BookRow> = sqlx::query_as(
            r#"
            SELECT student_id, code, title, author, cover, checkout_date
            FROM student_books
            ORDER BY student_id, position
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut books_by_student: HashMap<String, Vec<Book>> = HashMap::new();
        for row in book_rows {
            books_by_student
                .entry(row.student_id.clone())
                .or_default()
                .push(row.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let books = books_by_student.remove(&row.id).unwrap_or_default();
                assemble(row, books)
            })
            .collect())
    }

    /// Gets one student by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<Student>> {
        let row: Option<StudentRow> =
            sqlx::query_as("SELECT id, name, created_at FROM students WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let books: Vec<BookRow> = sqlx::query_as(
            r#"
            SELECT student_id, code, title, author, cover, checkout_date
            FROM student_books
            WHERE student_id = ?1
            ORDER BY position
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(assemble(
            row,
            books.into_iter().map(Book::from).collect(),
        )))
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Adds a student with a fresh 8-digit id.
    ///
    /// The name is trimmed and must be 2..=100 characters.
    pub async fn add(&self, name: &str) -> DbResult<Student> {
        validate_student_name(name)?;
        let name = name.trim();
        let now = Utc::now();

        for _ in 0..MAX_ID_ATTEMPTS {
            let id = generate_student_id();

            let result = sqlx::query(
                "INSERT INTO students (id, name, created_at) VALUES (?1, ?2, ?3)",
            )
            .bind(&id)
            .bind(name)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(DbError::from);

            match result {
                Ok(_) => {
                    info!(student_id = %id, "Student added");
                    return Ok(Student {
                        id,
                        name: name.to_string(),
                        books: Vec::new(),
                        created_at: now,
                    });
                }
                Err(DbError::UniqueViolation { .. }) => {
                    warn!(student_id = %id, "Student id collision, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(DbError::Internal(
            "could not allocate a unique student id".to_string(),
        ))
    }

    /// Removes students and their book lists. History is kept.
    ///
    /// Returns the number of students removed.
    pub async fn remove(&self, ids: &[String]) -> DbResult<u64> {
        let mut tx = self.pool.begin().await?;
        let mut removed = 0;

        for id in ids {
            let result = sqlx::query("DELETE FROM students WHERE id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            removed += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(requested = ids.len(), removed, "Students removed");
        Ok(removed)
    }

    /// Replaces a student's book list, appending `history` in the same transaction.
    ///
    /// ## Returns
    /// The student as stored after the commit.
    ///
    /// ## Errors
    /// - `NotFound` if the student doesn't exist
    /// - `UniqueViolation` if `books` contains a code twice
    pub async fn replace_books(
        &self,
        student_id: &str,
        books: &[Book],
        history: Option<&HistoryRecord>,
    ) -> DbResult<Student> {
        debug!(
            student_id = %student_id,
            books = books.len(),
            with_history = history.is_some(),
            "Replacing book list"
        );

        let mut tx = self.pool.begin().await?;

        let exists: Option<String> = sqlx::query_scalar("SELECT id FROM students WHERE id = ?1")
            .bind(student_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(DbError::not_found("Student", student_id));
        }

        sqlx::query("DELETE FROM student_books WHERE student_id = ?1")
            .bind(student_id)
            .execute(&mut *tx)
            .await?;

        for (position, book) in books.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO student_books (
                    student_id, code, title, author, cover, checkout_date, position
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(student_id)
            .bind(&book.code)
            .bind(&book.title)
            .bind(&book.author)
            .bind(&book.cover)
            .bind(book.checkout_date)
            .bind(position as i64)
            .execute(&mut *tx)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => DbError::duplicate("book code", &book.code),
                other => other,
            })?;
        }

        if let Some(record) = history {
            history::insert_record(&mut tx, record).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        self.get(student_id)
            .await?
            .ok_or_else(|| DbError::not_found("Student", student_id))
    }
}

/// Generates a random 8-digit numeric student id (10000000..=99999999).
pub fn generate_student_id() -> String {
    let n = 10_000_000u128 + Uuid::new_v4().as_u128() % 90_000_000;
    n.to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use escs_core::history::record;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn book(code: &str) -> Book {
        Book {
            code: code.to_string(),
            title: format!("Book {}", code),
            author: "Author".to_string(),
            cover: None,
            checkout_date: Some(Utc::now()),
            checkin_date: None,
        }
    }

    #[test]
    fn test_generate_student_id_is_eight_digits() {
        for _ in 0..100 {
            let id = generate_student_id();
            assert_eq!(id.len(), 8);
            assert!(id.chars().all(|c| c.is_ascii_digit()));
            assert!(!id.starts_with('0'));
        }
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let db = db().await;
        db.students().add("Zed").await.unwrap();
        db.students().add("  ada  ").await.unwrap();

        let students = db.students().list().await.unwrap();
        let names: Vec<_> = students.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["ada", "Zed"]);
        assert!(students.iter().all(|s| s.books.is_empty()));
        assert_eq!(db.students().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_add_rejects_invalid_name() {
        let db = db().await;
        let err = db.students().add("A").await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[tokio::test]
    async fn test_replace_books_keeps_order() {
        let db = db().await;
        let student = db.students().add("Ada").await.unwrap();

        let stored = db
            .students()
            .replace_books(&student.id, &[book("222"), book("111")], None)
            .await
            .unwrap();

        let codes: Vec<_> = stored.books.iter().map(|b| b.code.as_str()).collect();
        assert_eq!(codes, vec!["222", "111"]);
        assert!(stored.books.iter().all(|b| b.checkin_date.is_none()));
    }

    #[tokio::test]
    async fn test_replace_books_rejects_duplicate_code() {
        let db = db().await;
        let student = db.students().add("Ada").await.unwrap();
        db.students()
            .replace_books(&student.id, &[book("111")], None)
            .await
            .unwrap();

        let err = db
            .students()
            .replace_books(&student.id, &[book("111"), book("111")], None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        // Rolled back: previous list intact.
        let stored = db.students().get(&student.id).await.unwrap().unwrap();
        assert_eq!(stored.books.len(), 1);
    }

    #[tokio::test]
    async fn test_replace_books_unknown_student() {
        let db = db().await;
        let err = db
            .students()
            .replace_books("99999999", &[book("111")], None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_replace_books_appends_history_atomically() {
        let db = db().await;
        let student = db.students().add("Ada").await.unwrap();
        db.students()
            .replace_books(&student.id, &[book("111")], None)
            .await
            .unwrap();

        let rec = record(&student.id, &student.name, book("111"), Utc::now());
        let stored = db
            .students()
            .replace_books(&student.id, &[], Some(&rec))
            .await
            .unwrap();

        assert!(stored.books.is_empty());
        let history = db.history().list_for_student(&student.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, rec.id);
    }

    #[tokio::test]
    async fn test_failed_commit_writes_no_history() {
        let db = db().await;
        let student = db.students().add("Ada").await.unwrap();

        let rec = record(&student.id, &student.name, book("111"), Utc::now());
        let err = db
            .students()
            .replace_books(&student.id, &[book("222"), book("222")], Some(&rec))
            .await;

        assert!(err.is_err());
        assert!(db
            .history()
            .list_for_student(&student.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_remove_keeps_history() {
        let db = db().await;
        let a = db.students().add("Ada").await.unwrap();
        let b = db.students().add("Bob").await.unwrap();

        let rec = record(&a.id, &a.name, book("111"), Utc::now());
        db.students()
            .replace_books(&a.id, &[], Some(&rec))
            .await
            .unwrap();

        let removed = db
            .students()
            .remove(&[a.id.clone(), "00000000".to_string()])
            .await
            .unwrap();

        assert_eq!(removed, 1);
        assert!(db.students().get(&a.id).await.unwrap().is_none());
        assert!(db.students().get(&b.id).await.unwrap().is_some());
        assert_eq!(db.history().list_for_student(&a.id).await.unwrap().len(), 1);
    }
}
