// ==========================================
// 销售导入门户 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::ingest_config_trait::IngestConfigReader;
use crate::db::{lock_connection, DbPool};
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    pool: Arc<DbPool>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - pool: 连接池
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub async fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let handle = self.pool.connection().await?;
        let conn = lock_connection(&handle)?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入配置值（UPSERT）
    pub async fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let handle = self.pool.connection().await?;
        let conn = lock_connection(&handle)?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 从 config_kv 表读取配置值，带默认值
    pub async fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_config_value(key)
            .await?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 读取并解析数值配置；格式错误时告警并使用默认值
    async fn get_parsed_or_default<T>(&self, key: &str, default: T) -> RepositoryResult<T>
    where
        T: FromStr + Copy + Send + std::fmt::Display,
    {
        match self.get_config_value(key).await? {
            None => Ok(default),
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    warn!(key, value = %raw, default = %default, "配置值格式错误，使用默认值");
                    Ok(default)
                }
            },
        }
    }

    /// 界面消息语言（默认 en）
    pub async fn get_locale(&self) -> RepositoryResult<String> {
        self.get_config_or_default(config_keys::UI_LOCALE, defaults::UI_LOCALE)
            .await
    }
}

#[async_trait]
impl IngestConfigReader for ConfigManager {
    async fn get_default_range_days(&self) -> RepositoryResult<i64> {
        let days = self
            .get_parsed_or_default(config_keys::DEFAULT_RANGE_DAYS, defaults::DEFAULT_RANGE_DAYS)
            .await?;
        if days <= 0 {
            return Err(RepositoryError::FieldValueError {
                field: config_keys::DEFAULT_RANGE_DAYS.to_string(),
                message: format!("回溯天数必须为正数: {}", days),
            });
        }
        Ok(days)
    }

    async fn get_rejection_log_limit(&self) -> RepositoryResult<usize> {
        self.get_parsed_or_default(
            config_keys::REJECTION_LOG_LIMIT,
            defaults::REJECTION_LOG_LIMIT,
        )
        .await
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 聚合
    pub const DEFAULT_RANGE_DAYS: &str = "sales.default_range_days";

    // 导入
    pub const REJECTION_LOG_LIMIT: &str = "upload.rejection_log_limit";

    // 界面
    pub const UI_LOCALE: &str = "ui.locale";
}

// ==========================================
// 默认值
// ==========================================
pub mod defaults {
    pub const DEFAULT_RANGE_DAYS: i64 = 365;
    pub const REJECTION_LOG_LIMIT: usize = 10;
    pub const UI_LOCALE: &str = "en";
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn manager() -> (NamedTempFile, ConfigManager) {
        let temp_file = NamedTempFile::new().unwrap();
        let pool = Arc::new(DbPool::new(temp_file.path().to_str().unwrap()));
        (temp_file, ConfigManager::new(pool))
    }

    #[tokio::test]
    async fn test_defaults_when_absent() {
        let (_tmp, config) = manager();
        assert_eq!(config.get_default_range_days().await.unwrap(), 365);
        assert_eq!(config.get_rejection_log_limit().await.unwrap(), 10);
        assert_eq!(config.get_locale().await.unwrap(), "en");
    }

    #[tokio::test]
    async fn test_override_and_upsert() {
        let (_tmp, config) = manager();
        config.set_config_value(config_keys::DEFAULT_RANGE_DAYS, "30").await.unwrap();
        assert_eq!(config.get_default_range_days().await.unwrap(), 30);

        config.set_config_value(config_keys::DEFAULT_RANGE_DAYS, "90").await.unwrap();
        assert_eq!(config.get_default_range_days().await.unwrap(), 90);
    }

    #[tokio::test]
    async fn test_malformed_value_falls_back_to_default() {
        let (_tmp, config) = manager();
        config.set_config_value(config_keys::REJECTION_LOG_LIMIT, "many").await.unwrap();
        assert_eq!(config.get_rejection_log_limit().await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_non_positive_range_is_rejected() {
        let (_tmp, config) = manager();
        config.set_config_value(config_keys::DEFAULT_RANGE_DAYS, "0").await.unwrap();
        assert!(config.get_default_range_days().await.is_err());
    }
}
