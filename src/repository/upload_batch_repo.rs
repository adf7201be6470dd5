// ==========================================
// 销售导入门户 - 上传批次 Repository Trait
// ==========================================
// 职责: 定义上传批次的数据访问接口（不包含实现）
// 约束: (upload_type, year, month) 唯一，由存储层唯一约束兜底
// ==========================================

use crate::domain::upload::UploadBatch;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// BatchStore Trait
// ==========================================
// 实现者: SqliteBatchStore
#[async_trait]
pub trait BatchStore: Send + Sync {
    /// 按周期查询批次
    async fn find_by_period(
        &self,
        upload_type: &str,
        year: i32,
        month: u32,
    ) -> RepositoryResult<Option<UploadBatch>>;

    /// 插入批次
    ///
    /// # 返回
    /// - Err(UniqueConstraintViolation): 该周期已存在批次
    async fn insert(&self, batch: &UploadBatch) -> RepositoryResult<()>;

    /// 整体替换已有批次（保留 batch_id 与 uploaded_at）
    ///
    /// # 返回
    /// - Err(NotFound): 该周期不存在批次
    async fn replace(
        &self,
        upload_type: &str,
        year: i32,
        month: u32,
        batch: &UploadBatch,
    ) -> RepositoryResult<()>;

    /// 指定类型的全部批次（按年、月升序）
    async fn find_by_type(&self, upload_type: &str) -> RepositoryResult<Vec<UploadBatch>>;

    /// 指定年份已上传的月份（升序）
    async fn uploaded_months(&self, upload_type: &str, year: i32) -> RepositoryResult<Vec<u32>>;
}
