// ==========================================
// 销售导入门户 - 商品目录API
// ==========================================
// 职责: 目录导入 / 编码统计 / 编码对照 / 编码设置
// 说明: 编码对照只读取已存的 POS 批次，不重新解析文件
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::upload_formats::PETPOOJA;
use crate::domain::catalog::CatalogItem;
use crate::domain::code_match::{CatalogCodeEntry, CodeMatchReport, UploadedCode};
use crate::engine::CodeReporter;
use crate::i18n::{t, t_with_args};
use crate::importer::ImportError;
use crate::repository::error::RepositoryError;
use crate::repository::item_repo::ItemStore;
use crate::repository::upload_batch_repo::BatchStore;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// 编码设置请求
///
/// variation_index 为 None 时设置商品短码
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCodeRequest {
    pub item_id: String,
    #[serde(default)]
    pub variation_index: Option<usize>,
    #[serde(alias = "sapCode")]
    pub code: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCodeResponse {
    pub item_id: String,
    pub variation_index: Option<usize>,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCodeResult {
    pub item_id: String,
    pub variation_index: Option<usize>,
    pub code: String,
    pub updated: bool,
}

/// 批量编码设置响应
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCodesResponse {
    pub updated: usize,
    pub total: usize,
    pub results: Vec<SetCodeResult>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedCodesResponse {
    pub batch_count: usize,
    pub total_unique_codes: usize,
    pub codes: Vec<UploadedCode>,
    pub message: String,
}

/// 目录导入响应
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportCatalogResponse {
    pub inserted: usize,
    /// 已存在而跳过的 item_id
    pub skipped: Vec<String>,
    pub message: String,
}

/// 商品目录API
pub struct CatalogApi {
    item_store: Arc<dyn ItemStore>,
    batch_store: Arc<dyn BatchStore>,
    reporter: CodeReporter,
}

impl CatalogApi {
    pub fn new(item_store: Arc<dyn ItemStore>, batch_store: Arc<dyn BatchStore>) -> Self {
        Self {
            item_store,
            batch_store,
            reporter: CodeReporter::new(),
        }
    }

    fn validate_set_code(request: &SetCodeRequest) -> ApiResult<()> {
        if request.item_id.trim().is_empty() || request.code.trim().is_empty() {
            return Err(ApiError::InvalidInput(
                "item_id 与 code 均不能为空".to_string(),
            ));
        }
        Ok(())
    }

    /// 从 JSON 文件导入商品目录（CatalogItem 数组）
    ///
    /// # 返回
    /// - 已存在的 item_id 跳过，不覆盖
    /// - Err(ApiError::InvalidInput): JSON 无法解析或缺少 itemId/name
    #[instrument(skip(self))]
    pub async fn import_catalog(&self, file_path: &str) -> ApiResult<ImportCatalogResponse> {
        let path = Path::new(file_path);
        if !path.exists() {
            return Err(ImportError::FileNotFound(file_path.to_string()).into());
        }
        let reader = BufReader::new(File::open(path).map_err(ImportError::from)?);
        let items: Vec<CatalogItem> = serde_json::from_reader(reader)
            .map_err(|e| ApiError::InvalidInput(format!("商品目录 JSON 解析失败: {}", e)))?;

        if let Some(pos) = items
            .iter()
            .position(|i| i.item_id.trim().is_empty() || i.name.trim().is_empty())
        {
            return Err(ApiError::InvalidInput(format!(
                "第 {} 个商品缺少 itemId 或 name",
                pos + 1
            )));
        }

        let mut inserted = 0;
        let mut skipped = Vec::new();
        for item in &items {
            match self.item_store.insert_item(item).await {
                Ok(()) => inserted += 1,
                Err(RepositoryError::UniqueConstraintViolation(_)) => {
                    warn!(item_id = %item.item_id, "商品已存在，跳过");
                    skipped.push(item.item_id.clone());
                }
                Err(e) => return Err(e.into()),
            }
        }

        info!(inserted, skipped = skipped.len(), "商品目录导入完成");
        Ok(ImportCatalogResponse {
            message: t_with_args(
                "catalog.imported",
                &[
                    ("inserted", &inserted.to_string()),
                    ("skipped", &skipped.len().to_string()),
                ],
            ),
            inserted,
            skipped,
        })
    }

    /// 目录编码一览
    pub async fn catalog_codes(&self) -> ApiResult<Vec<CatalogCodeEntry>> {
        let items = self.item_store.find_all().await?;
        Ok(items.iter().map(CatalogCodeEntry::from).collect())
    }

    /// 已存 POS 批次中出现的编码（按行数降序）
    pub async fn uploaded_codes(&self) -> ApiResult<UploadedCodesResponse> {
        let batches = self.batch_store.find_by_type(PETPOOJA).await?;
        let codes = self.reporter.collect_uploaded_codes(&batches);

        let message = if batches.is_empty() {
            t("codes.no_uploads")
        } else {
            t_with_args("codes.found", &[("count", &codes.len().to_string())])
        };
        Ok(UploadedCodesResponse {
            batch_count: batches.len(),
            total_unique_codes: codes.len(),
            codes,
            message,
        })
    }

    /// 目录规格与上传编码对照
    pub async fn match_codes(&self) -> ApiResult<CodeMatchReport> {
        let batches = self.batch_store.find_by_type(PETPOOJA).await?;
        let uploaded = self.reporter.collect_uploaded_codes(&batches);
        let items = self.item_store.find_all().await?;
        Ok(self.reporter.match_catalog(&items, &uploaded))
    }

    async fn apply_code(&self, request: &SetCodeRequest) -> ApiResult<()> {
        let code = request.code.trim();
        match request.variation_index {
            Some(index) => {
                let items = self.item_store.find_all().await?;
                for item in &items {
                    for (other_index, variation) in item.variations.iter().enumerate() {
                        let same_target = item.item_id == request.item_id && other_index == index;
                        if !same_target && variation.matching_code() == Some(code) {
                            warn!(
                                code,
                                owner = %item.item_id,
                                owner_variation = other_index,
                                "编码已登记在其他规格，导入时按目录顺序后者覆盖前者"
                            );
                        }
                    }
                }
                self.item_store
                    .set_variation_code(&request.item_id, index, Some(code))
                    .await?;
            }
            None => {
                self.item_store
                    .set_short_code(&request.item_id, Some(code))
                    .await?;
            }
        }
        Ok(())
    }

    /// 设置单个编码
    ///
    /// # 返回
    /// - Err(ApiError::NotFound): 商品或规格不存在
    #[instrument(skip(self))]
    pub async fn set_code(&self, request: SetCodeRequest) -> ApiResult<SetCodeResponse> {
        Self::validate_set_code(&request)?;
        self.apply_code(&request).await?;

        let target = match request.variation_index {
            Some(index) => format!("{}#{}", request.item_id, index),
            None => request.item_id.clone(),
        };
        let code = request.code.trim().to_string();
        info!(item = %target, code = %code, "编码已设置");

        Ok(SetCodeResponse {
            message: t_with_args("catalog.code_set", &[("code", &code), ("target", &target)]),
            item_id: request.item_id,
            variation_index: request.variation_index,
            code,
        })
    }

    /// 批量设置编码；不存在的商品/规格记为未更新，不中断其余映射
    #[instrument(skip(self, mappings), fields(total = mappings.len()))]
    pub async fn set_codes(&self, mappings: Vec<SetCodeRequest>) -> ApiResult<SetCodesResponse> {
        if mappings.is_empty() {
            return Err(ApiError::InvalidInput("编码映射不能为空".to_string()));
        }
        for mapping in &mappings {
            Self::validate_set_code(mapping)?;
        }

        let total = mappings.len();
        let mut results = Vec::with_capacity(total);
        for mapping in mappings {
            let updated = match self.apply_code(&mapping).await {
                Ok(()) => true,
                Err(ApiError::NotFound(what)) => {
                    warn!(what = %what, "编码映射目标不存在");
                    false
                }
                Err(e) => return Err(e),
            };
            results.push(SetCodeResult {
                item_id: mapping.item_id,
                variation_index: mapping.variation_index,
                code: mapping.code.trim().to_string(),
                updated,
            });
        }

        let updated = results.iter().filter(|r| r.updated).count();
        Ok(SetCodesResponse {
            message: t_with_args(
                "catalog.codes_set",
                &[("updated", &updated.to_string()), ("total", &total.to_string())],
            ),
            updated,
            total,
            results,
        })
    }

    /// 从 JSON 文件读取映射后批量设置
    pub async fn set_codes_from_file(&self, file_path: &str) -> ApiResult<SetCodesResponse> {
        let path = Path::new(file_path);
        if !path.exists() {
            return Err(ImportError::FileNotFound(file_path.to_string()).into());
        }
        let reader = BufReader::new(File::open(path).map_err(ImportError::from)?);
        let mappings: Vec<SetCodeRequest> = serde_json::from_reader(reader)
            .map_err(|e| ApiError::InvalidInput(format!("编码映射 JSON 解析失败: {}", e)))?;
        self.set_codes(mappings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbPool;
    use crate::domain::catalog::Variation;
    use crate::repository::{SqliteBatchStore, SqliteItemStore};
    use tempfile::NamedTempFile;

    async fn api() -> (NamedTempFile, CatalogApi) {
        let tmp = NamedTempFile::new().unwrap();
        let pool = Arc::new(DbPool::new(tmp.path().to_str().unwrap()));
        let items = Arc::new(SqliteItemStore::new(pool.clone()));
        items
            .insert_item(&CatalogItem {
                item_id: "I1".to_string(),
                short_code: None,
                name: "Sourdough".to_string(),
                group: None,
                category: None,
                variations: vec![
                    Variation {
                        value: "500 Gms".to_string(),
                        sap_code: Some("X1".to_string()),
                        ..Default::default()
                    },
                    Variation {
                        value: "1 Kg".to_string(),
                        ..Default::default()
                    },
                ],
            })
            .await
            .unwrap();
        let batches = Arc::new(SqliteBatchStore::new(pool));
        (tmp, CatalogApi::new(items, batches))
    }

    fn request(item_id: &str, variation_index: Option<usize>, code: &str) -> SetCodeRequest {
        SetCodeRequest {
            item_id: item_id.to_string(),
            variation_index,
            code: code.to_string(),
        }
    }

    #[tokio::test]
    async fn test_set_code_on_variation_and_item() {
        let (_tmp, api) = api().await;

        let resp = api.set_code(request("I1", Some(1), " X2 ")).await.unwrap();
        assert_eq!(resp.code, "X2");
        api.set_code(request("I1", None, "SD")).await.unwrap();

        let entries = api.catalog_codes().await.unwrap();
        assert_eq!(entries[0].short_code.as_deref(), Some("SD"));
        assert_eq!(entries[0].variations[1].sap_code.as_deref(), Some("X2"));
    }

    #[tokio::test]
    async fn test_set_code_validation_and_not_found() {
        let (_tmp, api) = api().await;

        let err = api.set_code(request("I1", Some(0), "  ")).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");

        let err = api.set_code(request("I1", Some(7), "X9")).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
        let err = api.set_code(request("ghost", None, "X9")).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_set_codes_reports_each_mapping() {
        let (_tmp, api) = api().await;

        let resp = api
            .set_codes(vec![
                request("I1", Some(1), "X2"),
                request("ghost", Some(0), "Z1"),
            ])
            .await
            .unwrap();
        assert_eq!(resp.total, 2);
        assert_eq!(resp.updated, 1);
        assert!(resp.results[0].updated);
        assert!(!resp.results[1].updated);

        let err = api.set_codes(Vec::new()).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_uploaded_codes_without_batches() {
        let (_tmp, api) = api().await;
        let resp = api.uploaded_codes().await.unwrap();
        assert_eq!(resp.batch_count, 0);
        assert!(resp.codes.is_empty());

        let report = api.match_codes().await.unwrap();
        assert_eq!(report.summary.total_variations, 2);
        assert_eq!(report.summary.matched_variations, 0);
    }

    #[tokio::test]
    async fn test_import_catalog_missing_file() {
        let (_tmp, api) = api().await;
        let err = api.import_catalog("no_such_catalog.json").await.unwrap_err();
        assert!(matches!(err, ApiError::FileNotFound(_)));
    }
}
