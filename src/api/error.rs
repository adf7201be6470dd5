// ==========================================
// 销售导入门户 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，把导入/仓储错误转换为调用方可识别的错误
// 约束: 每个错误带稳定的 code()，供调用方按类别分支处理
// ==========================================

use crate::i18n::t_with_args;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 请求错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    /// 表头缺列，整批拒绝
    #[error("表头缺少必需列: {}", missing_columns.join(", "))]
    SchemaMismatch { missing_columns: Vec<String> },

    /// 该周期已有批次（调用方可改走替换）
    #[error("该周期已有上传数据: type={upload_type}, {year}-{month:02}")]
    Conflict {
        upload_type: String,
        year: i32,
        month: u32,
    },

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件导入失败: {0}")]
    ImportError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 错误类别标识
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) | ApiError::FileNotFound(_) | ApiError::ImportError(_) => {
                "INVALID_INPUT"
            }
            ApiError::SchemaMismatch { .. } => "SCHEMA_MISMATCH",
            ApiError::Conflict { .. } => "CONFLICT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::DatabaseError(_) | ApiError::DatabaseConnectionError(_) => "STORAGE",
            ApiError::InternalError(_) | ApiError::Other(_) => "INTERNAL",
        }
    }

    /// 面向用户的本地化消息（按当前 locale）
    pub fn user_message(&self) -> String {
        match self {
            ApiError::SchemaMismatch { missing_columns } => t_with_args(
                "upload.schema_mismatch",
                &[("columns", &missing_columns.join(", "))],
            ),
            ApiError::Conflict {
                upload_type,
                year,
                month,
            } => t_with_args(
                "upload.conflict",
                &[
                    ("type", upload_type),
                    ("period", &format!("{}-{:02}", year, month)),
                ],
            ),
            ApiError::NotFound(what) => t_with_args("common.not_found", &[("what", what)]),
            ApiError::FileNotFound(path) => t_with_args("import.file_not_found", &[("path", path)]),
            other => t_with_args("common.error", &[("message", &other.to_string())]),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg)
            | RepositoryError::UniqueConstraintViolation(msg)
            | RepositoryError::ForeignKeyViolation(msg) => ApiError::DatabaseError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::SerializationError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::MissingColumns { missing } => ApiError::SchemaMismatch {
                missing_columns: missing,
            },
            ImportError::BatchConflict {
                upload_type,
                year,
                month,
            } => ApiError::Conflict {
                upload_type,
                year,
                month,
            },
            ImportError::BatchNotFound {
                upload_type,
                year,
                month,
            } => ApiError::NotFound(format!("批次({} {}-{:02})不存在", upload_type, year, month)),
            ImportError::UnknownUploadType(_)
            | ImportError::InvalidPeriod { .. }
            | ImportError::EmptyTable
            | ImportError::InvalidRowSelection(_) => ApiError::InvalidInput(err.to_string()),
            ImportError::FileNotFound(path) => ApiError::FileNotFound(path),
            ImportError::UnsupportedFormat(_)
            | ImportError::FileReadError(_)
            | ImportError::ExcelParseError(_)
            | ImportError::CsvParseError(_) => ApiError::ImportError(err.to_string()),
            ImportError::Storage(repo_err) => repo_err.into(),
            ImportError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "CatalogItem".to_string(),
            id: "I001".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(ref msg) => {
                assert!(msg.contains("CatalogItem"));
                assert!(msg.contains("I001"));
            }
            _ => panic!("Expected NotFound"),
        }
        assert_eq!(api_err.code(), "NOT_FOUND");

        let api_err: ApiError = RepositoryError::LockError("poisoned".to_string()).into();
        assert_eq!(api_err.code(), "STORAGE");
    }

    #[test]
    fn test_import_error_conversion() {
        let api_err: ApiError = ImportError::MissingColumns {
            missing: vec!["area".to_string(), "sap_code".to_string()],
        }
        .into();
        assert_eq!(api_err.code(), "SCHEMA_MISMATCH");
        assert!(api_err.to_string().contains("area, sap_code"));

        let api_err: ApiError = ImportError::BatchConflict {
            upload_type: "petpooja".to_string(),
            year: 2024,
            month: 3,
        }
        .into();
        assert_eq!(api_err.code(), "CONFLICT");
        assert!(api_err.to_string().contains("2024-03"));

        let api_err: ApiError = ImportError::InvalidPeriod { year: 2024, month: 0 }.into();
        assert_eq!(api_err.code(), "INVALID_INPUT");

        let api_err: ApiError =
            ImportError::Storage(RepositoryError::DatabaseQueryError("disk full".to_string())).into();
        assert_eq!(api_err.code(), "STORAGE");

        let api_err: ApiError =
            RepositoryError::DatabaseTransactionError("busy".to_string()).into();
        assert_eq!(api_err.code(), "STORAGE");
    }

    #[test]
    fn test_file_not_found_message_names_path() {
        let api_err: ApiError = ImportError::FileNotFound("march.csv".to_string()).into();
        assert_eq!(api_err.code(), "INVALID_INPUT");
        assert!(matches!(api_err, ApiError::FileNotFound(ref p) if p == "march.csv"));
        assert!(api_err.user_message().contains("march.csv"));
    }
}
