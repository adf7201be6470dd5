// ==========================================
// 销售导入门户 - API 层
// ==========================================
// 职责: 提供业务 API 接口，供命令行前端调用
// ==========================================

pub mod catalog_api;
pub mod error;
pub mod sales_api;
pub mod upload_api;

// 重导出核心类型
pub use catalog_api::{
    CatalogApi, ImportCatalogResponse, SetCodeRequest, SetCodeResponse, SetCodesResponse,
    UploadedCodesResponse,
};
pub use error::{ApiError, ApiResult};
pub use sales_api::{AggregateRequest, ResetResponse, SalesApi};
pub use upload_api::{PreValidateResponse, UploadApi, UploadRequest, UploadResponse};
