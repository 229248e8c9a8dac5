//! # History Records
//!
//! Builds the immutable record written when a book is returned.
//!
//! Records are append-only. This module only constructs them; the store
//! appends the record in the same commit that removes the book from the
//! student's list, so a return never exists without its record.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::types::{Book, HistoryAction, HistoryRecord};

/// Builds the history record for one returned book.
///
/// Stamps `checkin_date` with `occurred_at` and backfills a missing
/// `checkout_date` with the same instant.
pub fn record(
    student_id: &str,
    student_name: &str,
    book: Book,
    occurred_at: DateTime<Utc>,
) -> HistoryRecord {
    let mut book = book;
    book.checkin_date = Some(occurred_at);
    if book.checkout_date.is_none() {
        book.checkout_date = Some(occurred_at);
    }

    HistoryRecord {
        id: Uuid::new_v4().to_string(),
        student_id: student_id.to_string(),
        student_name: student_name.to_string(),
        book,
        action: HistoryAction::Checkin,
        occurred_at,
    }
}

/// Orders records newest first. Ties keep their input order.
pub fn sort_newest_first(records: &mut [HistoryRecord]) {
    records.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn book(checkout_date: Option<DateTime<Utc>>) -> Book {
        Book {
            code: "111".to_string(),
            title: "Unknown Book".to_string(),
            author: "Unknown Author".to_string(),
            cover: None,
            checkout_date,
            checkin_date: None,
        }
    }

    #[test]
    fn test_record_stamps_checkin_date() {
        let now = Utc::now();
        let checked_out = now - Duration::days(3);

        let rec = record("12345678", "Ada", book(Some(checked_out)), now);

        assert_eq!(rec.book.checkin_date, Some(now));
        assert_eq!(rec.book.checkout_date, Some(checked_out));
        assert_eq!(rec.action, HistoryAction::Checkin);
        assert_eq!(rec.student_name, "Ada");
        assert_eq!(rec.occurred_at, now);
        assert!(Uuid::parse_str(&rec.id).is_ok());
    }

    #[test]
    fn test_record_backfills_missing_checkout_date() {
        let now = Utc::now();
        let rec = record("12345678", "Ada", book(None), now);
        assert_eq!(rec.book.checkout_date, Some(now));
    }

    #[test]
    fn test_records_get_distinct_ids() {
        let now = Utc::now();
        let a = record("1", "A", book(None), now);
        let b = record("1", "A", book(None), now);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_sort_newest_first() {
        let now = Utc::now();
        let mut records = vec![
            record("1", "A", book(None), now - Duration::hours(2)),
            record("1", "A", book(None), now),
            record("1", "A", book(None), now - Duration::hours(1)),
        ];

        sort_newest_first(&mut records);

        assert_eq!(records[0].occurred_at, now);
        assert_eq!(records[2].occurred_at, now - Duration::hours(2));
    }
}
