// ==========================================
// 销售导入门户 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: POS 销售导入与单品销售聚合
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 聚合规则
pub mod engine;

// 导入层 - 上传表格
pub mod importer;

// 配置层 - 上传格式与运行期配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/连接池）
pub mod db;

// 日志系统
pub mod logging;

// 性能统计（SQL 计数/慢查询）
pub mod perf;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{Channel, MonthStatus, UploadStatus};

// 领域实体
pub use domain::{
    AggregatedSalesView, CatalogItem, DateRange, RawTable, SaleRecord, UploadBatch, Variation,
};

// 引擎
pub use engine::SalesAggregator;

// 导入
pub use importer::{SalesIngestor, SalesIngestorImpl};

// API
pub use api::{ApiError, ApiResult, CatalogApi, SalesApi, UploadApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "销售导入门户";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
