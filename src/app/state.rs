// ==========================================
// 销售导入门户 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 装配: DbPool → Repository → 导入管道 → API
// ==========================================

use std::path::PathBuf;
use std::sync::Arc;

use crate::api::{ApiResult, CatalogApi, SalesApi, UploadApi};
use crate::config::ConfigManager;
use crate::db::DbPool;
use crate::importer::SalesIngestorImpl;
use crate::repository::{SqliteBatchStore, SqliteItemStore};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "SALES_INGEST_DB_PATH";

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 连接池（生命周期 init/shutdown）
    pub pool: Arc<DbPool>,

    /// 运行期配置
    pub config: Arc<ConfigManager>,

    /// 上传API
    pub upload_api: Arc<UploadApi>,

    /// 销售API
    pub sales_api: Arc<SalesApi>,

    /// 商品目录API（目录导入与编码维护）
    pub catalog_api: Arc<CatalogApi>,

    /// 商品目录仓储（测试装配用）
    pub item_store: Arc<SqliteItemStore>,
}

impl AppState {
    /// 创建并初始化AppState
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 建立数据库连接并建表
    /// 2. 初始化所有Repository
    /// 3. 装配导入管道与API实例
    pub async fn initialize(db_path: impl Into<String>) -> ApiResult<Self> {
        let db_path = db_path.into();
        tracing::info!(db_path = %db_path, "初始化AppState");

        let pool = Arc::new(DbPool::new(db_path.clone()));
        pool.init().await?;

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let item_store = Arc::new(SqliteItemStore::new(pool.clone()));
        let batch_store = Arc::new(SqliteBatchStore::new(pool.clone()));
        let config = Arc::new(ConfigManager::new(pool.clone()));

        // ==========================================
        // 初始化导入管道与API层
        // ==========================================
        let ingestor = Arc::new(SalesIngestorImpl::new(
            item_store.clone(),
            batch_store.clone(),
            config.clone(),
        ));
        let upload_api = Arc::new(UploadApi::new(ingestor, batch_store.clone()));
        let sales_api = Arc::new(SalesApi::new(item_store.clone(), config.clone()));
        let catalog_api = Arc::new(CatalogApi::new(item_store.clone(), batch_store));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            pool,
            config,
            upload_api,
            sales_api,
            catalog_api,
            item_store,
        })
    }

    /// 关闭数据库连接
    pub async fn shutdown(&self) {
        self.pool.shutdown().await;
    }
}

/// 默认数据库路径
///
/// 优先级: SALES_INGEST_DB_PATH 环境变量 → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./sales_ingest.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("sales-ingest");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("sales_ingest.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[tokio::test]
    async fn test_initialize_and_shutdown() {
        let tmp = NamedTempFile::new().unwrap();
        let state = AppState::initialize(tmp.path().to_str().unwrap()).await.unwrap();
        assert!(state.pool.is_connected().await);

        let statuses = state.upload_api.month_statuses("petpooja", 2024).await.unwrap();
        assert_eq!(statuses.len(), 12);

        let codes = state.catalog_api.uploaded_codes().await.unwrap();
        assert_eq!(codes.batch_count, 0);

        state.shutdown().await;
        assert!(!state.pool.is_connected().await);
    }
}
