// ==========================================
// 销售导入门户 - 应用层
// ==========================================
// 职责: 装配共享状态，连接命令行前端与后端
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
