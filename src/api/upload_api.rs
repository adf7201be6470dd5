// ==========================================
// 销售导入门户 - 上传API
// ==========================================
// 职责: 预校验 / 提交 / 替换 / 文件上传 / 周期查询
// 输出: camelCase 响应结构，错误统一转换为 ApiError
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::upload_formats::find_format;
use crate::domain::types::MonthStatus;
use crate::domain::upload::{MonthUploadStatus, RawTable, UploadBatch};
use crate::i18n::t_with_args;
use crate::importer::{
    CommitRequest, FileParser, IngestOutcome, PreValidationReport, RowRejection, SalesIngestor,
    UniversalFileParser,
};
use crate::repository::upload_batch_repo::BatchStore;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// 提交/替换请求（二维表形式）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub upload_type: String,
    pub year: i32,
    pub month: u32,
    pub rows: RawTable,
    #[serde(default)]
    pub selected_row_indices: Option<Vec<usize>>,
}

impl From<UploadRequest> for CommitRequest {
    fn from(req: UploadRequest) -> Self {
        CommitRequest {
            upload_type: req.upload_type,
            year: req.year,
            month: req.month,
            table: req.rows,
            selected_row_indices: req.selected_row_indices,
        }
    }
}

/// 预校验响应
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreValidateResponse {
    pub valid_count: usize,
    pub invalid_count: usize,
    #[serde(flatten)]
    pub report: PreValidationReport,
}

/// 提交/替换响应
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub batch_id: String,
    pub accepted: usize,
    pub stored_rows: usize,
    pub rejected_count: usize,
    /// 被拒绝行（1 起始行号 + 原因）
    pub rejected_rows: Vec<RowRejection>,
    pub replaced: bool,
    pub message: String,
}

impl From<IngestOutcome> for UploadResponse {
    fn from(outcome: IngestOutcome) -> Self {
        let key = if outcome.replaced {
            "upload.updated"
        } else {
            "upload.success"
        };
        let message = t_with_args(
            key,
            &[
                ("type", &outcome.upload_type),
                ("period", &format!("{}-{:02}", outcome.year, outcome.month)),
                ("rows", &outcome.accepted.to_string()),
            ],
        );

        UploadResponse {
            batch_id: outcome.batch_id,
            accepted: outcome.accepted,
            stored_rows: outcome.stored_rows,
            rejected_count: outcome.rejected.len(),
            rejected_rows: outcome.rejected,
            replaced: outcome.replaced,
            message,
        }
    }
}

/// 上传API
pub struct UploadApi {
    ingestor: Arc<dyn SalesIngestor>,
    batch_store: Arc<dyn BatchStore>,
}

impl UploadApi {
    /// 创建新的UploadApi实例
    pub fn new(ingestor: Arc<dyn SalesIngestor>, batch_store: Arc<dyn BatchStore>) -> Self {
        Self {
            ingestor,
            batch_store,
        }
    }

    fn check_upload_type(upload_type: &str) -> ApiResult<()> {
        if find_format(upload_type).is_none() {
            return Err(ApiError::InvalidInput(format!("未知上传类型: {}", upload_type)));
        }
        Ok(())
    }

    /// 预校验（不落库）
    pub async fn pre_validate(
        &self,
        upload_type: &str,
        rows: &RawTable,
    ) -> ApiResult<PreValidateResponse> {
        let report = self.ingestor.pre_validate(upload_type, rows).await?;
        Ok(PreValidateResponse {
            valid_count: report.valid_count(),
            invalid_count: report.invalid_count(),
            report,
        })
    }

    /// 提交新批次
    ///
    /// # 返回
    /// - Err(ApiError::Conflict): 该周期已有数据，可改用 update
    /// - Err(ApiError::SchemaMismatch): 表头缺列
    pub async fn commit(&self, request: UploadRequest) -> ApiResult<UploadResponse> {
        let outcome = self.ingestor.commit(request.into()).await?;
        Ok(outcome.into())
    }

    /// 替换已有批次
    ///
    /// # 返回
    /// - Err(ApiError::NotFound): 该周期没有批次
    pub async fn update(&self, request: UploadRequest) -> ApiResult<UploadResponse> {
        let outcome = self.ingestor.replace(request.into()).await?;
        Ok(outcome.into())
    }

    /// 解析文件后走预校验
    pub async fn pre_validate_file(
        &self,
        file_path: &str,
        upload_type: &str,
    ) -> ApiResult<PreValidateResponse> {
        let table = UniversalFileParser.parse_table(Path::new(file_path))?;
        self.pre_validate(upload_type, &table).await
    }

    /// 解析文件后提交（replace=true 走替换路径）
    ///
    /// # 参数
    /// - rows: 预校验给出的行号（None = 全部行）
    pub async fn upload_file(
        &self,
        file_path: &str,
        upload_type: &str,
        year: i32,
        month: u32,
        replace: bool,
        rows: Option<Vec<usize>>,
    ) -> ApiResult<UploadResponse> {
        Self::check_upload_type(upload_type)?;

        let table = UniversalFileParser.parse_table(Path::new(file_path))?;
        info!(
            file_path,
            upload_type,
            rows = table.row_count(),
            "上传文件解析完成"
        );

        let request = UploadRequest {
            upload_type: upload_type.to_string(),
            year,
            month,
            rows: table,
            selected_row_indices: rows,
        };

        if replace {
            self.update(request).await
        } else {
            self.commit(request).await
        }
    }

    /// 指定年份 12 个月的上传状态
    pub async fn month_statuses(
        &self,
        upload_type: &str,
        year: i32,
    ) -> ApiResult<Vec<MonthUploadStatus>> {
        Self::check_upload_type(upload_type)?;

        let uploaded = self.batch_store.uploaded_months(upload_type, year).await?;
        Ok((1..=12u32)
            .map(|month| MonthUploadStatus {
                month,
                status: if uploaded.contains(&month) {
                    MonthStatus::Uploaded
                } else {
                    MonthStatus::Pending
                },
            })
            .collect())
    }

    /// 读取指定周期的批次
    pub async fn get_batch(
        &self,
        upload_type: &str,
        year: i32,
        month: u32,
    ) -> ApiResult<UploadBatch> {
        Self::check_upload_type(upload_type)?;

        self.batch_store
            .find_by_period(upload_type, year, month)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound(format!("批次({} {}-{:02})不存在", upload_type, year, month))
            })
    }
}
