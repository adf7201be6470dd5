// ==========================================
// 销售导入门户 - 引擎层
// ==========================================
// 职责: 实现聚合与对照规则，不拼 SQL
// ==========================================

pub mod code_report;
pub mod sales_aggregator;

// 重导出核心引擎
pub use code_report::CodeReporter;
pub use sales_aggregator::{SalesAggregator, UNKNOWN_RESTAURANT};
