// ==========================================
// 销售导入门户 - 领域模型层
// ==========================================
// 职责: 定义领域实体与类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod catalog;
pub mod code_match;
pub mod sales;
pub mod types;
pub mod upload;

// 重导出核心类型
pub use catalog::{CatalogItem, SaleRecord, Variation};
pub use code_match::{
    CatalogCodeEntry, CodeMatchReport, CodeMatchSummary, MatchedVariation, UnmatchedVariation,
    UploadedCode, VariationCode,
};
pub use sales::{
    AggregatedSalesView, ChannelQuantities, ChannelSales, DailySales, DateRange, MonthlySales,
    VariationSales,
};
pub use types::{Channel, MonthStatus, UploadStatus};
pub use upload::{MonthUploadStatus, RawTable, UploadBatch, UploadFormat};
