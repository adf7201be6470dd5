// ==========================================
// 销售导入门户 - 上传批次 Repository 实现
// ==========================================
// 职责: 实现 BatchStore（使用 rusqlite）
// 存储: 原始表格以 JSON 数组落库（data_json）
// ==========================================

use crate::db::{lock_connection, DbPool};
use crate::domain::types::UploadStatus;
use crate::domain::upload::{RawTable, UploadBatch};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::upload_batch_repo::BatchStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use std::sync::Arc;

// ==========================================
// SqliteBatchStore
// ==========================================
pub struct SqliteBatchStore {
    pool: Arc<DbPool>,
}

/// 数据库原始行（JSON/状态尚未解析）
struct BatchRow {
    batch_id: String,
    upload_type: String,
    year: i32,
    month: u32,
    row_count: i64,
    column_count: i64,
    data_json: String,
    uploaded_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    status: String,
}

impl BatchRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            batch_id: row.get(0)?,
            upload_type: row.get(1)?,
            year: row.get(2)?,
            month: row.get(3)?,
            row_count: row.get(4)?,
            column_count: row.get(5)?,
            data_json: row.get(6)?,
            uploaded_at: row.get(7)?,
            updated_at: row.get(8)?,
            status: row.get(9)?,
        })
    }

    fn into_batch(self) -> RepositoryResult<UploadBatch> {
        let status = UploadStatus::parse(&self.status).ok_or_else(|| RepositoryError::FieldValueError {
            field: "status".to_string(),
            message: format!("未知批次状态: {}", self.status),
        })?;
        let data: RawTable = serde_json::from_str(&self.data_json)?;

        Ok(UploadBatch {
            batch_id: self.batch_id,
            upload_type: self.upload_type,
            year: self.year,
            month: self.month,
            row_count: self.row_count.max(0) as usize,
            column_count: self.column_count.max(0) as usize,
            data,
            uploaded_at: self.uploaded_at,
            updated_at: self.updated_at,
            status,
        })
    }
}

impl SqliteBatchStore {
    /// 创建新的 Repository 实例
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BatchStore for SqliteBatchStore {
    async fn find_by_period(
        &self,
        upload_type: &str,
        year: i32,
        month: u32,
    ) -> RepositoryResult<Option<UploadBatch>> {
        let handle = self.pool.connection().await?;
        let conn = lock_connection(&handle)?;

        let row = conn
            .query_row(
                r#"
                SELECT batch_id, upload_type, year, month, row_count, column_count,
                       data_json, uploaded_at, updated_at, status
                FROM upload_batch
                WHERE upload_type = ?1 AND year = ?2 AND month = ?3
                "#,
                params![upload_type, year, month],
                BatchRow::from_row,
            )
            .optional()?;

        row.map(BatchRow::into_batch).transpose()
    }

    async fn insert(&self, batch: &UploadBatch) -> RepositoryResult<()> {
        let data_json = serde_json::to_string(&batch.data)?;
        let handle = self.pool.connection().await?;
        let conn = lock_connection(&handle)?;

        conn.execute(
            r#"
            INSERT INTO upload_batch (
                batch_id, upload_type, year, month, row_count, column_count,
                data_json, uploaded_at, updated_at, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                batch.batch_id,
                batch.upload_type,
                batch.year,
                batch.month,
                batch.row_count as i64,
                batch.column_count as i64,
                data_json,
                batch.uploaded_at,
                batch.updated_at,
                batch.status.as_str(),
            ],
        )?;
        Ok(())
    }

    async fn replace(
        &self,
        upload_type: &str,
        year: i32,
        month: u32,
        batch: &UploadBatch,
    ) -> RepositoryResult<()> {
        let data_json = serde_json::to_string(&batch.data)?;
        let handle = self.pool.connection().await?;
        let conn = lock_connection(&handle)?;

        let affected = conn.execute(
            r#"
            UPDATE upload_batch
            SET row_count = ?4,
                column_count = ?5,
                data_json = ?6,
                updated_at = ?7,
                status = ?8
            WHERE upload_type = ?1 AND year = ?2 AND month = ?3
            "#,
            params![
                upload_type,
                year,
                month,
                batch.row_count as i64,
                batch.column_count as i64,
                data_json,
                batch.updated_at,
                batch.status.as_str(),
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "UploadBatch".to_string(),
                id: format!("{}/{}-{:02}", upload_type, year, month),
            });
        }
        Ok(())
    }

    async fn find_by_type(&self, upload_type: &str) -> RepositoryResult<Vec<UploadBatch>> {
        let handle = self.pool.connection().await?;
        let conn = lock_connection(&handle)?;

        let mut stmt = conn.prepare(
            r#"
            SELECT batch_id, upload_type, year, month, row_count, column_count,
                   data_json, uploaded_at, updated_at, status
            FROM upload_batch
            WHERE upload_type = ?1
            ORDER BY year, month
            "#,
        )?;
        let rows = stmt.query_map(params![upload_type], BatchRow::from_row)?;

        let mut batches = Vec::new();
        for row in rows {
            batches.push(row?.into_batch()?);
        }
        Ok(batches)
    }

    async fn uploaded_months(&self, upload_type: &str, year: i32) -> RepositoryResult<Vec<u32>> {
        let handle = self.pool.connection().await?;
        let conn = lock_connection(&handle)?;

        let mut stmt = conn.prepare(
            "SELECT month FROM upload_batch WHERE upload_type = ?1 AND year = ?2 ORDER BY month",
        )?;
        let rows = stmt.query_map(params![upload_type, year], |row| row.get::<_, u32>(0))?;

        let mut months = Vec::new();
        for row in rows {
            months.push(row?);
        }
        Ok(months)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;
    use uuid::Uuid;

    fn batch(upload_type: &str, year: i32, month: u32, cell: &str) -> UploadBatch {
        let data = RawTable::new(vec![
            vec!["Page Title".to_string()],
            vec![cell.to_string()],
        ]);
        UploadBatch {
            batch_id: Uuid::new_v4().to_string(),
            upload_type: upload_type.to_string(),
            year,
            month,
            row_count: data.row_count(),
            column_count: data.column_count(),
            data,
            uploaded_at: Utc::now(),
            updated_at: None,
            status: UploadStatus::Uploaded,
        }
    }

    fn store() -> (NamedTempFile, SqliteBatchStore) {
        let temp_file = NamedTempFile::new().unwrap();
        let pool = Arc::new(DbPool::new(temp_file.path().to_str().unwrap()));
        (temp_file, SqliteBatchStore::new(pool))
    }

    #[tokio::test]
    async fn test_insert_and_find_roundtrip() {
        let (_tmp, store) = store();
        let original = batch("website", 2024, 3, "Home");
        store.insert(&original).await.unwrap();

        let loaded = store.find_by_period("website", 2024, 3).await.unwrap().unwrap();
        assert_eq!(loaded.batch_id, original.batch_id);
        assert_eq!(loaded.data, original.data);
        assert_eq!(loaded.status, UploadStatus::Uploaded);

        assert!(store.find_by_period("website", 2024, 4).await.unwrap().is_none());
        assert!(store.find_by_period("petpooja", 2024, 3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_period_violates_unique() {
        let (_tmp, store) = store();
        store.insert(&batch("website", 2024, 3, "A")).await.unwrap();

        let err = store.insert(&batch("website", 2024, 3, "B")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }

    #[tokio::test]
    async fn test_replace_keeps_identity_and_requires_existing() {
        let (_tmp, store) = store();
        let original = batch("website", 2024, 3, "A");
        store.insert(&original).await.unwrap();

        let mut next = batch("website", 2024, 3, "B");
        next.status = UploadStatus::Updated;
        next.updated_at = Some(Utc::now());
        store.replace("website", 2024, 3, &next).await.unwrap();

        let loaded = store.find_by_period("website", 2024, 3).await.unwrap().unwrap();
        assert_eq!(loaded.batch_id, original.batch_id);
        assert_eq!(loaded.status, UploadStatus::Updated);
        assert_eq!(loaded.data.rows()[1][0], "B");

        let err = store.replace("website", 2024, 9, &next).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_uploaded_months_sorted() {
        let (_tmp, store) = store();
        for month in [11, 2, 7] {
            store.insert(&batch("website", 2024, month, "x")).await.unwrap();
        }
        store.insert(&batch("website", 2023, 5, "x")).await.unwrap();

        assert_eq!(store.uploaded_months("website", 2024).await.unwrap(), vec![2, 7, 11]);
    }

    #[tokio::test]
    async fn test_find_by_type_ordered_by_period() {
        let (_tmp, store) = store();
        store.insert(&batch("website", 2024, 2, "b")).await.unwrap();
        store.insert(&batch("website", 2023, 12, "a")).await.unwrap();
        store.insert(&batch("petpooja", 2024, 1, "x")).await.unwrap();

        let batches = store.find_by_type("website").await.unwrap();
        let periods: Vec<(i32, u32)> = batches.iter().map(|b| (b.year, b.month)).collect();
        assert_eq!(periods, vec![(2023, 12), (2024, 2)]);
        assert_eq!(batches[0].data.rows()[1][0], "a");

        assert!(store.find_by_type("pain_lebs").await.unwrap().is_empty());
    }
}
