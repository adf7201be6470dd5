// ==========================================
// 销售导入门户 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入与聚合所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// IngestConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait IngestConfigReader: Send + Sync {
    /// 聚合查询未指定日期时的回溯天数
    ///
    /// # 默认值
    /// - 365
    async fn get_default_range_days(&self) -> RepositoryResult<i64>;

    /// 单次导入中逐条记录日志的拒绝行上限（其余只计数）
    ///
    /// # 默认值
    /// - 10
    async fn get_rejection_log_limit(&self) -> RepositoryResult<usize>;
}
