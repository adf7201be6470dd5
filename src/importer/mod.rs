// ==========================================
// 销售导入门户 - 导入层
// ==========================================
// 职责: 上传表格 → 批次落库 + 销售历史追加
// 支持: Excel, CSV, 已解析的二维表
// ==========================================

// 模块声明
pub mod channel_classifier;
pub mod code_matcher;
pub mod date_parser;
pub mod error;
pub mod file_parser;
pub mod ingest_impl;
pub mod ingest_trait;
pub mod row_classifier;
pub mod schema_validator;

// 重导出核心类型
pub use channel_classifier::classify_channel;
pub use code_matcher::{CodeMatchIndex, VariationRef};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use ingest_impl::SalesIngestorImpl;
pub use row_classifier::{ColumnIndices, RejectReason, RowClassifier};
pub use schema_validator::{SchemaValidation, SchemaValidator};

// 重导出 Trait 接口
pub use ingest_trait::{
    CommitRequest, FileParser, IngestOutcome, PreValidationReport, RowRejection, SalesIngestor,
    ValidRow,
};
