// ==========================================
// 销售导入门户 - 上传批次领域模型
// ==========================================
// 职责: UploadFormat / RawTable / UploadBatch
// 约束: 每个 (upload_type, year, month) 至多一个批次
// ==========================================

use crate::domain::types::{MonthStatus, UploadStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// UploadFormat - 上传格式描述（静态）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFormat {
    pub upload_type: &'static str,                // 上传类型标识（如 "petpooja"）
    pub name: &'static str,                       // 展示名称
    pub required_columns: &'static [&'static str], // 必需列（比较时 trim + 小写）
    pub description: &'static str,                // 格式说明
    pub channel_matching: bool,                   // 是否执行渠道匹配入账
}

// ==========================================
// RawTable - 原始表格（首行为表头）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawTable {
    rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// 表头行（空表返回 None）
    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }

    /// 数据行（不含表头）
    pub fn data_rows(&self) -> &[Vec<String>] {
        if self.rows.is_empty() {
            &[]
        } else {
            &self.rows[1..]
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 数据行数（不含表头）
    pub fn row_count(&self) -> usize {
        self.data_rows().len()
    }

    /// 列数（以表头为准）
    pub fn column_count(&self) -> usize {
        self.header().map_or(0, <[String]>::len)
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<String>> {
        self.rows
    }

    /// 按表格行号挑选数据行，保留表头
    ///
    /// # 参数
    /// - positions: 1 起始的表格行号（表头为第 1 行，首条数据为第 2 行）
    ///
    /// # 返回
    /// - Ok(RawTable): 表头 + 按给定顺序挑选的行
    /// - Err(usize): 第一个越界或指向表头的行号
    pub fn select_rows(&self, positions: &[usize]) -> Result<RawTable, usize> {
        let header = match self.rows.first() {
            Some(h) => h.clone(),
            None => return Err(positions.first().copied().unwrap_or(0)),
        };

        let mut rows = Vec::with_capacity(positions.len() + 1);
        rows.push(header);
        for &pos in positions {
            if pos < 2 || pos > self.rows.len() {
                return Err(pos);
            }
            rows.push(self.rows[pos - 1].clone());
        }

        Ok(RawTable { rows })
    }
}

// ==========================================
// UploadBatch - 一次上传事件
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadBatch {
    pub batch_id: String,                     // 批次 ID (UUID)
    pub upload_type: String,                  // 上传类型
    pub year: i32,                            // 目标年份
    pub month: u32,                           // 目标月份 (1-12)
    pub row_count: usize,                     // 数据行数
    pub column_count: usize,                  // 列数
    pub data: RawTable,                       // 原始表格
    pub uploaded_at: DateTime<Utc>,           // 首次上传时间
    pub updated_at: Option<DateTime<Utc>>,    // 最近替换时间
    pub status: UploadStatus,                 // uploaded / updated
}

// ==========================================
// MonthUploadStatus - 年度月份上传状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthUploadStatus {
    pub month: u32,
    pub status: MonthStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RawTable {
        RawTable::new(vec![
            vec!["a".to_string(), "b".to_string()],
            vec!["1".to_string(), "2".to_string()],
            vec!["3".to_string(), "4".to_string()],
            vec!["5".to_string(), "6".to_string()],
        ])
    }

    #[test]
    fn test_counts_exclude_header() {
        let t = table();
        assert_eq!(t.row_count(), 3);
        assert_eq!(t.column_count(), 2);
        assert_eq!(RawTable::default().row_count(), 0);
        assert_eq!(RawTable::default().column_count(), 0);
    }

    #[test]
    fn test_select_rows_uses_sheet_positions() {
        let selected = table().select_rows(&[4, 2]).unwrap();
        assert_eq!(selected.rows().len(), 3);
        assert_eq!(selected.rows()[0][0], "a");
        assert_eq!(selected.rows()[1][0], "5");
        assert_eq!(selected.rows()[2][0], "1");
    }

    #[test]
    fn test_select_rows_rejects_header_and_out_of_range() {
        assert_eq!(table().select_rows(&[1]), Err(1));
        assert_eq!(table().select_rows(&[2, 5]), Err(5));
        assert_eq!(table().select_rows(&[0]), Err(0));
    }
}
