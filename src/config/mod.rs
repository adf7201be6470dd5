// ==========================================
// 销售导入门户 - 配置层
// ==========================================
// 职责: 上传格式注册表（静态） + 运行期配置（config_kv 表）
// ==========================================

pub mod config_manager;
pub mod ingest_config_trait;
pub mod upload_formats;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use ingest_config_trait::IngestConfigReader;
pub use upload_formats::{find_format, get_required_columns, UPLOAD_FORMATS};
