// ==========================================
// 销售导入门户 - 销售API
// ==========================================
// 职责: 单品销售聚合查询 / 销售历史清空 / 门店列表
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::config_keys;
use crate::config::ingest_config_trait::IngestConfigReader;
use crate::domain::sales::{AggregatedSalesView, DateRange};
use crate::engine::SalesAggregator;
use crate::i18n::t_with_args;
use crate::importer::date_parser::parse_date;
use crate::repository::error::RepositoryError;
use crate::repository::item_repo::ItemStore;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// 聚合查询请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRequest {
    pub item_id: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub restaurant: Option<String>,
}

/// 清空销售历史响应
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetResponse {
    pub item_id: String,
    pub cleared_item_name: String,
    pub cleared_records: usize,
    pub message: String,
}

/// 销售API
pub struct SalesApi {
    item_store: Arc<dyn ItemStore>,
    config: Arc<dyn IngestConfigReader>,
    aggregator: SalesAggregator,
}

impl SalesApi {
    pub fn new(item_store: Arc<dyn ItemStore>, config: Arc<dyn IngestConfigReader>) -> Self {
        Self {
            item_store,
            config,
            aggregator: SalesAggregator::new(),
        }
    }

    fn parse_request_date(field: &str, raw: &str) -> ApiResult<NaiveDate> {
        parse_date(raw).ok_or_else(|| {
            ApiError::InvalidInput(format!("{}日期格式错误: {}（应为 YYYY-MM-DD）", field, raw))
        })
    }

    /// 解析查询区间；起止日期缺任一项时使用默认滚动窗口
    async fn resolve_range(&self, request: &AggregateRequest) -> ApiResult<DateRange> {
        let start = request.start_date.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let end = request.end_date.as_deref().map(str::trim).filter(|s| !s.is_empty());

        match (start, end) {
            (Some(start), Some(end)) => {
                let start = Self::parse_request_date("开始", start)?;
                let end = Self::parse_request_date("结束", end)?;
                if end < start {
                    return Err(ApiError::InvalidInput(format!(
                        "结束日期早于开始日期: {} < {}",
                        end, start
                    )));
                }
                Ok(DateRange::from_dates(start, end))
            }
            _ => {
                let days = self.config.get_default_range_days().await?;
                DateRange::rolling_days(Utc::now(), days).ok_or_else(|| {
                    RepositoryError::FieldValueError {
                        field: config_keys::DEFAULT_RANGE_DAYS.to_string(),
                        message: format!("回溯天数超出可表示范围: {}", days),
                    }
                    .into()
                })
            }
        }
    }

    /// 单品销售聚合
    ///
    /// # 返回
    /// - 商品不存在时返回全零视图（不报错）
    #[instrument(skip(self, request), fields(item_id = %request.item_id))]
    pub async fn aggregate(&self, request: AggregateRequest) -> ApiResult<AggregatedSalesView> {
        if request.item_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("item_id 不能为空".to_string()));
        }

        let range = self.resolve_range(&request).await?;
        let item = self.item_store.find_by_id(&request.item_id).await?;
        if item.is_none() {
            warn!("商品不存在，返回空聚合");
        }

        let restaurant = request
            .restaurant
            .as_deref()
            .filter(|r| !r.trim().is_empty());

        Ok(self
            .aggregator
            .aggregate(item.as_ref(), &request.item_id, &range, restaurant))
    }

    /// 清空商品全部规格的销售历史（不可恢复）
    ///
    /// # 返回
    /// - Err(ApiError::NotFound): 商品不存在
    #[instrument(skip(self))]
    pub async fn reset_sales_history(&self, item_id: &str) -> ApiResult<ResetResponse> {
        let item = self
            .item_store
            .find_by_id(item_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("商品(id={})不存在", item_id)))?;

        let cleared_records = self.item_store.clear_sales_history(item_id).await?;
        info!(item_name = %item.name, cleared_records, "销售历史已清空");

        Ok(ResetResponse {
            item_id: item.item_id,
            message: t_with_args("sales.reset_done", &[("name", &item.name)]),
            cleared_item_name: item.name,
            cleared_records,
        })
    }

    /// 全部门店名（去重、升序）
    pub async fn list_restaurants(&self) -> ApiResult<Vec<String>> {
        Ok(self.item_store.list_restaurants().await?)
    }
}
