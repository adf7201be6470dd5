// ==========================================
// 销售导入门户 - 数据仓储层
// ==========================================
// 职责: 商品目录 / 销售历史 / 上传批次的数据访问
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

pub mod error;
pub mod item_repo;
pub mod item_repo_impl;
pub mod upload_batch_repo;
pub mod upload_batch_repo_impl;

// 重导出
pub use error::{RepositoryError, RepositoryResult};
pub use item_repo::ItemStore;
pub use item_repo_impl::SqliteItemStore;
pub use upload_batch_repo::BatchStore;
pub use upload_batch_repo_impl::SqliteBatchStore;
