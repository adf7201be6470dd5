// ==========================================
// 销售导入门户 - SQLite 连接与连接池
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键 + busy_timeout）
// - 建表幂等，记录 schema_version
// - DbPool 显式管理连接生命周期（init / shutdown），并发首连只建一次
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 共享连接句柄（仓储层持有）
pub type SharedConnection = Arc<Mutex<Connection>>;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 建表（幂等）
///
/// 表:
/// - config_kv: 运行期配置
/// - catalog_item / item_variation: 商品目录
/// - sale_record: 追加式销售历史（record_id 自增 = 上传顺序）
/// - upload_batch: 上传批次，(upload_type, year, month) 唯一
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL DEFAULT 'global',
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS catalog_item (
            item_id TEXT PRIMARY KEY,
            short_code TEXT,
            item_name TEXT NOT NULL,
            group_name TEXT,
            category TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS item_variation (
            item_id TEXT NOT NULL REFERENCES catalog_item(item_id) ON DELETE CASCADE,
            variation_index INTEGER NOT NULL,
            value TEXT NOT NULL,
            name TEXT,
            sap_code TEXT,
            prices_json TEXT NOT NULL DEFAULT '{}',
            PRIMARY KEY (item_id, variation_index)
        );

        CREATE TABLE IF NOT EXISTS sale_record (
            record_id INTEGER PRIMARY KEY AUTOINCREMENT,
            item_id TEXT NOT NULL,
            variation_index INTEGER NOT NULL,
            sale_date TEXT NOT NULL,
            sale_time TEXT,
            channel TEXT NOT NULL,
            restaurant TEXT NOT NULL,
            quantity INTEGER NOT NULL,
            value INTEGER NOT NULL,
            category TEXT NOT NULL DEFAULT '',
            FOREIGN KEY (item_id, variation_index)
                REFERENCES item_variation(item_id, variation_index) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_sale_record_variation
            ON sale_record(item_id, variation_index, record_id);

        CREATE TABLE IF NOT EXISTS upload_batch (
            batch_id TEXT PRIMARY KEY,
            upload_type TEXT NOT NULL,
            year INTEGER NOT NULL,
            month INTEGER NOT NULL,
            row_count INTEGER NOT NULL,
            column_count INTEGER NOT NULL,
            data_json TEXT NOT NULL,
            uploaded_at TEXT NOT NULL,
            updated_at TEXT,
            status TEXT NOT NULL,
            UNIQUE (upload_type, year, month)
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

/// 打开连接 → 安装 SQL 统计 → 建表 → 版本检查
fn open_and_prepare(db_path: &str) -> RepositoryResult<Connection> {
    let mut conn = open_sqlite_connection(db_path)
        .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
    crate::perf::install_sqlite_tracing(&mut conn);
    ensure_schema(&conn)?;

    if let Some(version) = read_schema_version(&conn)? {
        if version > CURRENT_SCHEMA_VERSION {
            warn!(
                db_version = version,
                expected = CURRENT_SCHEMA_VERSION,
                "数据库 schema_version 高于当前程序版本"
            );
        }
    }

    Ok(conn)
}

// ==========================================
// DbPool - 连接池（显式生命周期）
// ==========================================
// 单连接 + 异步互斥: 并发调用者在同一把锁上等待正在进行的连接，
// 连接失败时槽位保持为空，下一次调用重新尝试。
pub struct DbPool {
    db_path: String,
    slot: tokio::sync::Mutex<Option<SharedConnection>>,
}

impl DbPool {
    /// 创建连接池（不立即连接）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            slot: tokio::sync::Mutex::new(None),
        }
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// 建立连接并完成建表
    pub async fn init(&self) -> RepositoryResult<()> {
        self.connection().await.map(|_| ())
    }

    /// 获取共享连接（connect-or-await-pending）
    ///
    /// # 返回
    /// - Ok(SharedConnection): 已建立的连接
    /// - Err(DatabaseConnectionError): 打开失败（下次调用重试）
    pub async fn connection(&self) -> RepositoryResult<SharedConnection> {
        let mut slot = self.slot.lock().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(Arc::clone(conn));
        }

        let db_path = self.db_path.clone();
        let conn = tokio::task::spawn_blocking(move || open_and_prepare(&db_path))
            .await
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))??;

        info!(db_path = %self.db_path, "数据库连接已建立");
        let shared = Arc::new(Mutex::new(conn));
        *slot = Some(Arc::clone(&shared));
        Ok(shared)
    }

    /// 释放连接（之后的 connection() 会重新连接）
    pub async fn shutdown(&self) {
        let mut slot = self.slot.lock().await;
        if slot.take().is_some() {
            info!(db_path = %self.db_path, "数据库连接已关闭");
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.slot.lock().await.is_some()
    }
}

/// 获取连接锁
pub fn lock_connection(
    conn: &SharedConnection,
) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| RepositoryError::LockError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_read_schema_version_without_table() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);
    }

    #[tokio::test]
    async fn test_pool_connects_once_and_shuts_down() {
        let temp_file = NamedTempFile::new().unwrap();
        let pool = Arc::new(DbPool::new(temp_file.path().to_str().unwrap()));
        assert!(!pool.is_connected().await);

        // 并发首连返回同一个连接
        let (a, b) = tokio::join!(pool.connection(), pool.connection());
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(Arc::ptr_eq(&a, &b));

        pool.shutdown().await;
        assert!(!pool.is_connected().await);

        pool.init().await.unwrap();
        assert!(pool.is_connected().await);
    }

    #[tokio::test]
    async fn test_pool_connect_failure_leaves_slot_empty() {
        let pool = DbPool::new("/nonexistent-dir/for/sure/sales.db");
        assert!(pool.connection().await.is_err());
        assert!(!pool.is_connected().await);
    }
}
