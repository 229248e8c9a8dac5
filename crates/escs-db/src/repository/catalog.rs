//! # Catalog Repository
//!
//! Code → metadata tables consulted by the resolver chain.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  catalog          curated by the user; save rejects duplicate codes    │
//! │  legacy_catalog   written by older versions; lower trust               │
//! │                                                                         │
//! │  promote_legacy(): legacy rows whose code is not curated yet are       │
//! │  copied into catalog and then removed from legacy_catalog.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use escs_core::validation::validate_catalog_entry;
use escs_core::CatalogEntry;

#[derive(Debug, sqlx::FromRow)]
struct CatalogRow {
    code: String,
    title: String,
    author: String,
    cover: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<CatalogRow> for CatalogEntry {
    fn from(row: CatalogRow) -> Self {
        CatalogEntry {
            code: row.code,
            title: row.title,
            author: row.author,
            cover: row.cover,
            created_at: row.created_at,
        }
    }
}

/// Which of the two catalog tables to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Table {
    Curated,
    Legacy,
}

impl Table {
    fn name(self) -> &'static str {
        match self {
            Table::Curated => "catalog",
            Table::Legacy => "legacy_catalog",
        }
    }
}

/// Repository for the curated and legacy catalogs.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // ===== Curated =====

    /// Curated entries, newest first.
    pub async fn list(&self) -> DbResult<Vec<CatalogEntry>> {
        self.list_table(Table::Curated).await
    }

    /// Exact-match lookup in the curated catalog.
    pub async fn find(&self, code: &str) -> DbResult<Option<CatalogEntry>> {
        self.find_in(Table::Curated, code).await
    }

    /// Saves a curated entry.
    ///
    /// ## Errors
    /// - `UniqueViolation` if the code is already in the catalog
    /// - `Validation` if the code or title is unusable
    pub async fn save(&self, entry: &CatalogEntry) -> DbResult<()> {
        validate_catalog_entry(entry)?;

        if self.find(&entry.code).await?.is_some() {
            return Err(DbError::duplicate("code", &entry.code));
        }

        sqlx::query(
            r#"
            INSERT INTO catalog (code, title, author, cover, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&entry.code)
        .bind(&entry.title)
        .bind(&entry.author)
        .bind(&entry.cover)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("code", &entry.code),
            other => other,
        })?;

        info!(code = %entry.code, "Catalog entry saved");
        Ok(())
    }

    /// Deletes a curated entry.
    pub async fn delete(&self, code: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM catalog WHERE code = ?1")
            .bind(code)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Catalog entry", code));
        }

        info!(code = %code, "Catalog entry deleted");
        Ok(())
    }

    // ===== Legacy =====

    /// Legacy entries, newest first.
    pub async fn list_legacy(&self) -> DbResult<Vec<CatalogEntry>> {
        self.list_table(Table::Legacy).await
    }

    pub async fn find_legacy(&self, code: &str) -> DbResult<Option<CatalogEntry>> {
        self.find_in(Table::Legacy, code).await
    }

    /// Writes a legacy entry, replacing any previous one with the same code.
    pub async fn save_legacy(&self, entry: &CatalogEntry) -> DbResult<()> {
        validate_catalog_entry(entry)?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO legacy_catalog (code, title, author, cover, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&entry.code)
        .bind(&entry.title)
        .bind(&entry.author)
        .bind(&entry.cover)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        debug!(code = %entry.code, "Legacy catalog entry saved");
        Ok(())
    }

    /// Moves legacy entries into the curated catalog.
    ///
    /// Entries whose code is already curated stay in the legacy table.
    /// Returns how many entries were promoted.
    pub async fn promote_legacy(&self) -> DbResult<u64> {
        let mut tx = self.pool.begin().await?;

        let codes: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT code FROM legacy_catalog
            WHERE code NOT IN (SELECT code FROM catalog)
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        for code in &codes {
            sqlx::query(
                r#"
                INSERT INTO catalog (code, title, author, cover, created_at)
                SELECT code, title, author, cover, created_at
                FROM legacy_catalog WHERE code = ?1
                "#,
            )
            .bind(code)
            .execute(&mut *tx)
            .await?;

            sqlx::query("DELETE FROM legacy_catalog WHERE code = ?1")
                .bind(code)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(promoted = codes.len(), "Legacy catalog promoted");
        Ok(codes.len() as u64)
    }

    // ===== Shared =====

    async fn list_table(&self, table: Table) -> DbResult<Vec<CatalogEntry>> {
        let sql = format!(
            "SELECT code, title, author, cover, created_at FROM {} ORDER BY created_at DESC, rowid DESC",
            table.name()
        );
        let rows: Vec<CatalogRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(CatalogEntry::from).collect())
    }

    async fn find_in(&self, table: Table, code: &str) -> DbResult<Option<CatalogEntry>> {
        let sql = format!(
            "SELECT code, title, author, cover, created_at FROM {} WHERE code = ?1",
            table.name()
        );
        let row: Option<CatalogRow> = sqlx::query_as(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(CatalogEntry::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::Duration;

    fn entry(code: &str, title: &str) -> CatalogEntry {
        CatalogEntry {
            code: code.to_string(),
            title: title.to_string(),
            author: "Author".to_string(),
            cover: None,
            created_at: Utc::now(),
        }
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_save_find_delete() {
        let db = db().await;
        db.catalog().save(&entry("111", "T1")).await.unwrap();

        let found = db.catalog().find("111").await.unwrap().unwrap();
        assert_eq!(found.title, "T1");
        assert!(db.catalog().find("222").await.unwrap().is_none());

        db.catalog().delete("111").await.unwrap();
        assert!(db.catalog().find("111").await.unwrap().is_none());

        let err = db.catalog().delete("111").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_save_rejects_duplicate_code() {
        let db = db().await;
        db.catalog().save(&entry("111", "T1")).await.unwrap();

        let err = db.catalog().save(&entry("111", "Other")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(db.catalog().find("111").await.unwrap().unwrap().title, "T1");
    }

    #[tokio::test]
    async fn test_save_rejects_invalid_entry() {
        let db = db().await;
        let err = db.catalog().save(&entry("111", "")).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let db = db().await;
        let mut old = entry("111", "Old");
        old.created_at = Utc::now() - Duration::days(2);
        db.catalog().save(&old).await.unwrap();
        db.catalog().save(&entry("222", "New")).await.unwrap();

        let titles: Vec<_> = db
            .catalog()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["New", "Old"]);
    }

    #[tokio::test]
    async fn test_promote_legacy_skips_existing_codes() {
        let db = db().await;
        db.catalog().save(&entry("111", "Curated")).await.unwrap();
        db.catalog().save_legacy(&entry("111", "Legacy dup")).await.unwrap();
        db.catalog().save_legacy(&entry("222", "Legacy only")).await.unwrap();

        let promoted = db.catalog().promote_legacy().await.unwrap();

        assert_eq!(promoted, 1);
        assert_eq!(db.catalog().find("111").await.unwrap().unwrap().title, "Curated");
        assert_eq!(
            db.catalog().find("222").await.unwrap().unwrap().title,
            "Legacy only"
        );

        let legacy = db.catalog().list_legacy().await.unwrap();
        assert_eq!(legacy.len(), 1);
        assert_eq!(legacy[0].code, "111");

        assert_eq!(db.catalog().promote_legacy().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_save_legacy_replaces() {
        let db = db().await;
        db.catalog().save_legacy(&entry("111", "First")).await.unwrap();
        db.catalog().save_legacy(&entry("111", "Second")).await.unwrap();

        let found = db.catalog().find_legacy("111").await.unwrap().unwrap();
        assert_eq!(found.title, "Second");
        assert_eq!(db.catalog().list_legacy().await.unwrap().len(), 1);
    }
}
