// ==========================================
// 销售导入门户 - 商品目录 Repository Trait
// ==========================================
// 职责: 定义商品目录与销售历史的数据访问接口（不包含实现）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::catalog::{CatalogItem, SaleRecord};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// ItemStore Trait
// ==========================================
// 用途: 商品目录读取 + 销售历史追加/清空
// 实现者: SqliteItemStore
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// 读取全部商品（含规格与销售历史）
    ///
    /// # 返回
    /// - 按 item_id 排序；规格按 variation_index 排序；历史按追加顺序
    async fn find_all(&self) -> RepositoryResult<Vec<CatalogItem>>;

    /// 按 ID 读取单个商品
    ///
    /// # 返回
    /// - Ok(None): 商品不存在
    async fn find_by_id(&self, item_id: &str) -> RepositoryResult<Option<CatalogItem>>;

    /// 追加一条销售记录到指定规格
    ///
    /// # 参数
    /// - item_id: 商品 ID
    /// - variation_index: 规格下标
    /// - record: 销售记录
    ///
    /// # 返回
    /// - Err(NotFound): 规格不存在
    async fn append_sale_record(
        &self,
        item_id: &str,
        variation_index: usize,
        record: &SaleRecord,
    ) -> RepositoryResult<()>;

    /// 清空商品全部规格的销售历史（单事务）
    ///
    /// # 返回
    /// - Ok(usize): 删除的记录数
    /// - Err(NotFound): 商品不存在
    async fn clear_sales_history(&self, item_id: &str) -> RepositoryResult<usize>;

    /// 写入商品（含规格与已有历史），用于目录导入
    ///
    /// # 返回
    /// - Err(UniqueConstraintViolation): item_id 已存在
    async fn insert_item(&self, item: &CatalogItem) -> RepositoryResult<()>;

    /// 设置商品短码（None = 清除）
    ///
    /// # 返回
    /// - Err(NotFound): 商品不存在
    async fn set_short_code(&self, item_id: &str, code: Option<&str>) -> RepositoryResult<()>;

    /// 设置规格匹配编码（None = 清除）
    ///
    /// # 返回
    /// - Err(NotFound): 规格不存在
    async fn set_variation_code(
        &self,
        item_id: &str,
        variation_index: usize,
        code: Option<&str>,
    ) -> RepositoryResult<()>;

    /// 全部销售记录中出现过的门店名（去重、非空、升序）
    async fn list_restaurants(&self) -> RepositoryResult<Vec<String>>;
}
