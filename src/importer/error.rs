// ==========================================
// 销售导入门户 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 行级拒绝不属于错误，见 row_classifier::RejectReason
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 请求校验错误 =====
    #[error("未知上传类型: {0}")]
    UnknownUploadType(String),

    #[error("无效周期: year={year}, month={month}")]
    InvalidPeriod { year: i32, month: u32 },

    #[error("表格为空（缺少表头行）")]
    EmptyTable,

    #[error("表头缺少必需列: {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("无效的行号选择: {0}（应为 2 起始的数据行号）")]
    InvalidRowSelection(usize),

    // ===== 批次错误 =====
    #[error("该周期已有上传数据: type={upload_type}, {year}-{month:02}")]
    BatchConflict {
        upload_type: String,
        year: i32,
        month: u32,
    },

    #[error("该周期没有上传数据: type={upload_type}, {year}-{month:02}")]
    BatchNotFound {
        upload_type: String,
        year: i32,
        month: u32,
    },

    // ===== 存储错误 =====
    #[error("存储失败: {0}")]
    Storage(#[from] RepositoryError),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
