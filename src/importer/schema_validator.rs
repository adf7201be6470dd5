// ==========================================
// 销售导入门户 - 表头校验
// ==========================================
// 职责: 检查表头是否包含上传类型的全部必需列
// 规则: trim + 大小写不敏感的精确匹配；列顺序无关
// ==========================================

use crate::domain::upload::UploadFormat;
use serde::Serialize;

/// 表头校验结果（不抛错，由调用方决定是否整批拒绝）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaValidation {
    pub valid: bool,
    pub missing: Vec<String>, // 缺失列（已规范化：trim + 小写）
}

/// 列名规范化
pub fn normalize_column(name: &str) -> String {
    name.trim().to_lowercase()
}

pub struct SchemaValidator;

impl SchemaValidator {
    /// 校验表头
    ///
    /// # 参数
    /// - headers: 表头行
    /// - format: 上传格式
    ///
    /// # 返回
    /// - valid = missing 为空
    pub fn validate(&self, headers: &[String], format: &UploadFormat) -> SchemaValidation {
        let present: Vec<String> = headers.iter().map(|h| normalize_column(h)).collect();

        let mut missing: Vec<String> = Vec::new();
        for required in format.required_columns {
            let required = normalize_column(required);
            // "total" / "Total" 这类规范化后重复的必需列只报告一次
            if missing.contains(&required) {
                continue;
            }
            if !present.iter().any(|h| *h == required) {
                missing.push(required);
            }
        }

        SchemaValidation {
            valid: missing.is_empty(),
            missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::upload_formats::{find_format, PETPOOJA, WEBSITE};

    fn headers(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_any_order_any_case_any_whitespace() {
        let format = find_format(WEBSITE).unwrap();
        let result = SchemaValidator.validate(
            &headers(&["  date ", "AVG DURATION", "url", "Visits", "bounce rate", "page title", "extra"]),
            format,
        );
        assert!(result.valid);
        assert!(result.missing.is_empty());
    }

    #[test]
    fn test_missing_reports_exact_normalized_columns() {
        let format = find_format(WEBSITE).unwrap();
        let result = SchemaValidator.validate(&headers(&["Page Title", "URL", "Visits", "Date"]), format);

        assert!(!result.valid);
        assert_eq!(result.missing, vec!["bounce rate".to_string(), "avg duration".to_string()]);
    }

    #[test]
    fn test_no_fuzzy_matching() {
        let format = find_format(WEBSITE).unwrap();
        let result = SchemaValidator.validate(
            &headers(&["Page_Title", "URL", "Visits", "Bounce Rate", "Avg Duration", "Date"]),
            format,
        );
        assert_eq!(result.missing, vec!["page title".to_string()]);
    }

    #[test]
    fn test_duplicate_normalized_requirement_reported_once() {
        let format = find_format(PETPOOJA).unwrap();
        let all: Vec<String> = format
            .required_columns
            .iter()
            .filter(|c| !c.eq_ignore_ascii_case("total"))
            .map(|c| c.to_string())
            .collect();

        let result = SchemaValidator.validate(&all, format);
        assert_eq!(result.missing, vec!["total".to_string()]);
    }

    #[test]
    fn test_empty_header_misses_everything() {
        let format = find_format(WEBSITE).unwrap();
        let result = SchemaValidator.validate(&[], format);
        assert_eq!(result.missing.len(), 6);
    }
}
