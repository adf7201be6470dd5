// ==========================================
// 销售导入门户 - 导入管道实现
// ==========================================
// 职责: 整合表头校验、行选择、批次落库、编码匹配、渠道分类
// 流程: 请求校验 → 行选择 → 周期冲突检查 → 批次落库 → 逐行入账
// 约束: 销售记录逐条追加，失败时已写入部分不回滚
// ==========================================

use crate::config::ingest_config_trait::IngestConfigReader;
use crate::config::upload_formats::find_format;
use crate::domain::types::UploadStatus;
use crate::domain::upload::{RawTable, UploadBatch, UploadFormat};
use crate::importer::code_matcher::CodeMatchIndex;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::ingest_trait::{
    CommitRequest, IngestOutcome, PreValidationReport, RowRejection, SalesIngestor, ValidRow,
};
use crate::importer::row_classifier::{ClassifiedRow, ColumnIndices, RowClassifier};
use crate::importer::schema_validator::SchemaValidator;
use crate::repository::error::RepositoryError;
use crate::repository::item_repo::ItemStore;
use crate::repository::upload_batch_repo::BatchStore;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// 表头行占第 1 行，数据行号从 2 开始
const FIRST_DATA_ROW: usize = 2;

fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

/// 逐行分类结果
struct ClassifiedTable {
    accepted: Vec<(usize, ClassifiedRow)>,
    rejected: Vec<RowRejection>,
}

// ==========================================
// SalesIngestorImpl - 导入管道
// ==========================================
pub struct SalesIngestorImpl {
    item_store: Arc<dyn ItemStore>,
    batch_store: Arc<dyn BatchStore>,
    config: Arc<dyn IngestConfigReader>,
}

impl SalesIngestorImpl {
    /// 创建导入管道
    ///
    /// # 参数
    /// - item_store: 商品目录（读取 + 追加销售记录）
    /// - batch_store: 上传批次
    /// - config: 导入配置（拒绝行日志上限）
    pub fn new(
        item_store: Arc<dyn ItemStore>,
        batch_store: Arc<dyn BatchStore>,
        config: Arc<dyn IngestConfigReader>,
    ) -> Self {
        Self {
            item_store,
            batch_store,
            config,
        }
    }

    /// 上传类型 + 表头校验
    fn check_format(upload_type: &str, table: &RawTable) -> ImportResult<&'static UploadFormat> {
        let format =
            find_format(upload_type).ok_or_else(|| ImportError::UnknownUploadType(upload_type.to_string()))?;

        let header = table.header().ok_or(ImportError::EmptyTable)?;
        let validation = SchemaValidator.validate(header, format);
        if !validation.valid {
            return Err(ImportError::MissingColumns {
                missing: validation.missing,
            });
        }
        Ok(format)
    }

    /// 请求校验 + 行选择
    ///
    /// # 返回
    /// - (格式, 待落库表格)
    fn prepare(request: &CommitRequest) -> ImportResult<(&'static UploadFormat, RawTable)> {
        if request.year <= 0 || !(1..=12).contains(&request.month) {
            return Err(ImportError::InvalidPeriod {
                year: request.year,
                month: request.month,
            });
        }

        let format = Self::check_format(&request.upload_type, &request.table)?;

        let table = match request.selected_row_indices.as_deref() {
            Some(positions) if !positions.is_empty() => request
                .table
                .select_rows(positions)
                .map_err(ImportError::InvalidRowSelection)?,
            _ => request.table.clone(),
        };

        Ok((format, table))
    }

    /// 重建编码索引并逐行分类（纯内存，不落库）
    async fn classify_table(&self, table: &RawTable) -> ImportResult<ClassifiedTable> {
        let header = table.header().ok_or(ImportError::EmptyTable)?;
        let columns = ColumnIndices::resolve(header)?;

        // 每次导入都从当前目录重建，不复用旧索引
        let catalog = self.item_store.find_all().await?;
        let index = CodeMatchIndex::build(&catalog);
        debug!(items = catalog.len(), codes = index.len(), "编码索引已重建");

        let classifier = RowClassifier::new(&columns, &index);
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();

        for (offset, row) in table.data_rows().iter().enumerate() {
            if is_blank_row(row) {
                continue;
            }
            let row_index = offset + FIRST_DATA_ROW;
            match classifier.classify(row) {
                Ok(classified) => accepted.push((row_index, classified)),
                Err(reason) => rejected.push(RowRejection {
                    row_index,
                    data: row.clone(),
                    reason,
                }),
            }
        }

        Ok(ClassifiedTable { accepted, rejected })
    }

    /// 拒绝行日志：前 N 条逐条记录，其余只汇总
    async fn log_rejections(&self, rejected: &[RowRejection]) {
        if rejected.is_empty() {
            return;
        }

        let limit = match self.config.get_rejection_log_limit().await {
            Ok(limit) => limit,
            Err(e) => {
                warn!(error = %e, "读取拒绝行日志上限失败，使用默认值");
                10
            }
        };

        for rejection in rejected.iter().take(limit) {
            warn!(
                row_index = rejection.row_index,
                reason = %rejection.reason,
                detail = rejection.reason.detail().unwrap_or(""),
                "行被拒绝"
            );
        }
        if rejected.len() > limit {
            warn!(
                logged = limit,
                suppressed = rejected.len() - limit,
                "其余拒绝行未逐条记录"
            );
        }
    }

    fn new_batch(request: &CommitRequest, table: RawTable) -> UploadBatch {
        UploadBatch {
            batch_id: Uuid::new_v4().to_string(),
            upload_type: request.upload_type.clone(),
            year: request.year,
            month: request.month,
            row_count: table.row_count(),
            column_count: table.column_count(),
            data: table,
            uploaded_at: Utc::now(),
            updated_at: None,
            status: UploadStatus::Uploaded,
        }
    }

    fn conflict(request: &CommitRequest) -> ImportError {
        ImportError::BatchConflict {
            upload_type: request.upload_type.clone(),
            year: request.year,
            month: request.month,
        }
    }
}

#[async_trait]
impl SalesIngestor for SalesIngestorImpl {
    #[instrument(skip(self, table), fields(rows = table.row_count()))]
    async fn pre_validate(
        &self,
        upload_type: &str,
        table: &RawTable,
    ) -> ImportResult<PreValidationReport> {
        let format = Self::check_format(upload_type, table)?;

        if !format.channel_matching {
            // 非渠道匹配类型: 表头通过即全部有效
            let valid_rows = table
                .data_rows()
                .iter()
                .enumerate()
                .filter(|(_, row)| !is_blank_row(row))
                .map(|(offset, row)| ValidRow {
                    row_index: offset + FIRST_DATA_ROW,
                    data: row.clone(),
                })
                .collect();
            return Ok(PreValidationReport {
                valid_rows,
                invalid_rows: Vec::new(),
            });
        }

        let classified = self.classify_table(table).await?;
        let report = PreValidationReport {
            valid_rows: classified
                .accepted
                .into_iter()
                .map(|(row_index, _)| ValidRow {
                    row_index,
                    data: table.rows()[row_index - 1].clone(),
                })
                .collect(),
            invalid_rows: classified.rejected,
        };

        info!(
            valid = report.valid_count(),
            invalid = report.invalid_count(),
            "预校验完成"
        );
        Ok(report)
    }

    #[instrument(
        skip(self, request),
        fields(upload_type = %request.upload_type, year = request.year, month = request.month)
    )]
    async fn commit(&self, request: CommitRequest) -> ImportResult<IngestOutcome> {
        let start_time = Instant::now();
        info!("开始提交上传批次");

        // === 步骤 1: 请求校验 + 行选择 ===
        debug!("步骤 1: 请求校验");
        let (format, table) = Self::prepare(&request)?;

        // === 步骤 2: 周期冲突检查 ===
        debug!("步骤 2: 周期冲突检查");
        if self
            .batch_store
            .find_by_period(&request.upload_type, request.year, request.month)
            .await?
            .is_some()
        {
            warn!("该周期已有批次，拒绝重复提交");
            return Err(Self::conflict(&request));
        }

        // === 步骤 3: 批次落库 ===
        debug!("步骤 3: 批次落库");
        let batch = Self::new_batch(&request, table);
        let stored_rows = batch.row_count;
        match self.batch_store.insert(&batch).await {
            Ok(()) => {}
            // 并发提交同一周期时由唯一约束兜底
            Err(RepositoryError::UniqueConstraintViolation(_)) => {
                warn!("批次写入触发唯一约束，视为周期冲突");
                return Err(Self::conflict(&request));
            }
            Err(e) => return Err(e.into()),
        }
        info!(batch_id = %batch.batch_id, rows = stored_rows, "批次已落库");

        // === 步骤 4: 渠道匹配入账 ===
        let (accepted, rejected) = if format.channel_matching {
            debug!("步骤 4: 编码匹配与渠道分类");
            let classified = self.classify_table(&batch.data).await?;

            for (row_index, row) in &classified.accepted {
                self.item_store
                    .append_sale_record(&row.target.item_id, row.target.variation_index, &row.record)
                    .await
                    .map_err(|e| {
                        warn!(row_index, error = %e, "销售记录追加失败，已写入部分保留");
                        e
                    })?;
            }

            self.log_rejections(&classified.rejected).await;
            (classified.accepted.len(), classified.rejected)
        } else {
            (stored_rows, Vec::new())
        };

        let elapsed_time = start_time.elapsed();
        info!(
            batch_id = %batch.batch_id,
            stored_rows,
            accepted,
            rejected = rejected.len(),
            elapsed_ms = elapsed_time.as_millis(),
            "上传批次提交完成"
        );

        Ok(IngestOutcome {
            batch_id: batch.batch_id,
            upload_type: request.upload_type,
            year: request.year,
            month: request.month,
            stored_rows,
            accepted,
            rejected,
            replaced: false,
        })
    }

    #[instrument(
        skip(self, request),
        fields(upload_type = %request.upload_type, year = request.year, month = request.month)
    )]
    async fn replace(&self, request: CommitRequest) -> ImportResult<IngestOutcome> {
        let (_format, table) = Self::prepare(&request)?;

        let existing = self
            .batch_store
            .find_by_period(&request.upload_type, request.year, request.month)
            .await?
            .ok_or_else(|| ImportError::BatchNotFound {
                upload_type: request.upload_type.clone(),
                year: request.year,
                month: request.month,
            })?;

        let stored_rows = table.row_count();
        let batch = UploadBatch {
            batch_id: existing.batch_id,
            upload_type: existing.upload_type,
            year: existing.year,
            month: existing.month,
            row_count: stored_rows,
            column_count: table.column_count(),
            data: table,
            uploaded_at: existing.uploaded_at,
            updated_at: Some(Utc::now()),
            status: UploadStatus::Updated,
        };

        self.batch_store
            .replace(&request.upload_type, request.year, request.month, &batch)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound { .. } => ImportError::BatchNotFound {
                    upload_type: request.upload_type.clone(),
                    year: request.year,
                    month: request.month,
                },
                other => other.into(),
            })?;

        // 替换只更新批次原始数据，销售历史不重复追加
        info!(batch_id = %batch.batch_id, rows = stored_rows, "上传批次已替换");

        Ok(IngestOutcome {
            batch_id: batch.batch_id,
            upload_type: request.upload_type,
            year: request.year,
            month: request.month,
            stored_rows,
            accepted: stored_rows,
            rejected: Vec::new(),
            replaced: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigManager;
    use crate::config::upload_formats::{PETPOOJA, WEBSITE};
    use crate::db::DbPool;
    use crate::domain::catalog::{CatalogItem, Variation};
    use crate::repository::{SqliteBatchStore, SqliteItemStore};
    use tempfile::NamedTempFile;

    struct Fixture {
        _tmp: NamedTempFile,
        items: Arc<SqliteItemStore>,
        batches: Arc<SqliteBatchStore>,
        ingestor: SalesIngestorImpl,
    }

    async fn fixture() -> Fixture {
        let tmp = NamedTempFile::new().unwrap();
        let pool = Arc::new(DbPool::new(tmp.path().to_str().unwrap()));
        let items = Arc::new(SqliteItemStore::new(pool.clone()));
        let batches = Arc::new(SqliteBatchStore::new(pool.clone()));
        let config = Arc::new(ConfigManager::new(pool));

        items
            .insert_item(&CatalogItem {
                item_id: "I1".to_string(),
                short_code: None,
                name: "Sourdough".to_string(),
                group: None,
                category: None,
                variations: vec![Variation {
                    value: "500 Gms".to_string(),
                    sap_code: Some("X1".to_string()),
                    ..Default::default()
                }],
            })
            .await
            .unwrap();

        let ingestor = SalesIngestorImpl::new(items.clone(), batches.clone(), config);
        Fixture {
            _tmp: tmp,
            items,
            batches,
            ingestor,
        }
    }

    fn pos_table(rows: &[[&str; 4]]) -> RawTable {
        let format = find_format(PETPOOJA).unwrap();
        let header: Vec<String> = format.required_columns.iter().map(|c| c.to_string()).collect();
        let col = |name: &str| header.iter().position(|h| h == name).unwrap();
        let (restaurant, date, code, qty) = (
            col("restaurant_name"),
            col("New Date"),
            col("sap_code"),
            col("item_quantity"),
        );
        let price = col("item_price");

        let mut all = vec![header.clone()];
        for r in rows {
            let mut row = vec![String::new(); header.len()];
            row[restaurant] = r[0].to_string();
            row[date] = r[1].to_string();
            row[code] = r[2].to_string();
            row[qty] = r[3].to_string();
            row[price] = "100".to_string();
            all.push(row);
        }
        RawTable::new(all)
    }

    fn request(table: RawTable) -> CommitRequest {
        CommitRequest {
            upload_type: PETPOOJA.to_string(),
            year: 2024,
            month: 3,
            table,
            selected_row_indices: None,
        }
    }

    #[tokio::test]
    async fn test_commit_appends_accepted_rows_and_reports_rejections() {
        let f = fixture().await;
        let table = pos_table(&[
            ["Outlet A", "2024-03-15", "X1", "2"],
            ["Outlet A", "2024-03-15", "UNKNOWN", "1"],
            ["", "2024-03-15", "X1", "1"],
        ]);

        let outcome = f.ingestor.commit(request(table)).await.unwrap();

        assert_eq!(outcome.stored_rows, 3);
        assert_eq!(outcome.accepted, 1);
        assert_eq!(outcome.rejected.len(), 2);
        assert_eq!(outcome.rejected[0].row_index, 3);
        assert_eq!(outcome.rejected[0].reason.to_string(), "code not found in catalog");
        assert_eq!(outcome.rejected[1].reason.to_string(), "no restaurant name");

        let item = f.items.find_by_id("I1").await.unwrap().unwrap();
        assert_eq!(item.variations[0].sales_history.len(), 1);
        assert_eq!(item.variations[0].sales_history[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_second_commit_for_same_period_conflicts() {
        let f = fixture().await;
        let first = f
            .ingestor
            .commit(request(pos_table(&[["Outlet A", "2024-03-15", "X1", "2"]])))
            .await
            .unwrap();

        let err = f
            .ingestor
            .commit(request(pos_table(&[["Outlet B", "2024-03-16", "X1", "5"]])))
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::BatchConflict { month: 3, .. }));

        let stored = f.batches.find_by_period(PETPOOJA, 2024, 3).await.unwrap().unwrap();
        assert_eq!(stored.batch_id, first.batch_id);
        assert_eq!(stored.data.data_rows()[0][0], "Outlet A");

        let item = f.items.find_by_id("I1").await.unwrap().unwrap();
        assert_eq!(item.variations[0].sales_history.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_columns_reject_whole_batch() {
        let f = fixture().await;
        let table = RawTable::new(vec![vec!["Page Title".to_string()]]);
        let mut req = request(table);
        req.upload_type = WEBSITE.to_string();

        let err = f.ingestor.commit(req).await.unwrap_err();
        match err {
            ImportError::MissingColumns { missing } => assert_eq!(missing.len(), 5),
            other => panic!("Expected MissingColumns, got {:?}", other),
        }
        assert!(f.batches.find_by_period(WEBSITE, 2024, 3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_period_and_unknown_type() {
        let f = fixture().await;
        let mut req = request(pos_table(&[]));
        req.month = 13;
        assert!(matches!(
            f.ingestor.commit(req).await,
            Err(ImportError::InvalidPeriod { month: 13, .. })
        ));

        let mut req = request(pos_table(&[]));
        req.upload_type = "unknown".to_string();
        assert!(matches!(
            f.ingestor.commit(req).await,
            Err(ImportError::UnknownUploadType(_))
        ));
    }

    #[tokio::test]
    async fn test_replace_keeps_identity_and_does_not_append() {
        let f = fixture().await;
        let first = f
            .ingestor
            .commit(request(pos_table(&[["Outlet A", "2024-03-15", "X1", "2"]])))
            .await
            .unwrap();

        let outcome = f
            .ingestor
            .replace(request(pos_table(&[
                ["Outlet B", "2024-03-16", "X1", "5"],
                ["Outlet C", "2024-03-17", "X1", "1"],
            ])))
            .await
            .unwrap();

        assert!(outcome.replaced);
        assert_eq!(outcome.batch_id, first.batch_id);
        assert_eq!(outcome.stored_rows, 2);

        let stored = f.batches.find_by_period(PETPOOJA, 2024, 3).await.unwrap().unwrap();
        assert_eq!(stored.status, UploadStatus::Updated);
        assert!(stored.updated_at.is_some());
        assert_eq!(stored.row_count, 2);

        let item = f.items.find_by_id("I1").await.unwrap().unwrap();
        assert_eq!(item.variations[0].sales_history.len(), 1);
    }

    #[tokio::test]
    async fn test_replace_without_existing_batch() {
        let f = fixture().await;
        let err = f
            .ingestor
            .replace(request(pos_table(&[["Outlet A", "2024-03-15", "X1", "2"]])))
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::BatchNotFound { .. }));
    }

    #[tokio::test]
    async fn test_selected_rows_only() {
        let f = fixture().await;
        let mut req = request(pos_table(&[
            ["Outlet A", "2024-03-15", "X1", "2"],
            ["Outlet B", "2024-03-16", "X1", "7"],
        ]));
        req.selected_row_indices = Some(vec![3]);

        let outcome = f.ingestor.commit(req).await.unwrap();
        assert_eq!(outcome.stored_rows, 1);

        let item = f.items.find_by_id("I1").await.unwrap().unwrap();
        assert_eq!(item.variations[0].sales_history[0].restaurant, "Outlet B");

        let mut req = request(pos_table(&[["Outlet A", "2024-03-15", "X1", "2"]]));
        req.month = 4;
        req.selected_row_indices = Some(vec![1]);
        assert!(matches!(
            f.ingestor.commit(req).await,
            Err(ImportError::InvalidRowSelection(1))
        ));
    }

    #[tokio::test]
    async fn test_pre_validate_does_not_persist() {
        let f = fixture().await;
        let table = pos_table(&[
            ["Outlet A", "2024-03-15", "X1", "2"],
            ["Outlet A", "not a date", "X1", "2"],
        ]);

        let report = f.ingestor.pre_validate(PETPOOJA, &table).await.unwrap();
        assert_eq!(report.valid_count(), 1);
        assert_eq!(report.valid_rows[0].row_index, 2);
        assert_eq!(report.invalid_rows[0].row_index, 3);
        assert_eq!(report.invalid_rows[0].reason.to_string(), "invalid date");

        assert!(f.batches.find_by_period(PETPOOJA, 2024, 3).await.unwrap().is_none());
        let item = f.items.find_by_id("I1").await.unwrap().unwrap();
        assert!(item.variations[0].sales_history.is_empty());
    }
}
