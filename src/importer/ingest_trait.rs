// ==========================================
// 销售导入门户 - 导入管道 Trait
// ==========================================
// 职责: 定义导入管道接口与输入输出结构（不包含实现）
// ==========================================

use crate::domain::upload::RawTable;
use crate::importer::error::ImportResult;
use crate::importer::row_classifier::RejectReason;
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;

// ==========================================
// 输入输出结构
// ==========================================

/// 提交/替换请求
#[derive(Debug, Clone)]
pub struct CommitRequest {
    pub upload_type: String,
    pub year: i32,
    pub month: u32,
    pub table: RawTable,
    /// 预校验给出的表格行号（2 起始）；None 或空 = 全部行
    pub selected_row_indices: Option<Vec<usize>>,
}

/// 预校验通过的行
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidRow {
    pub row_index: usize,
    pub data: Vec<String>,
}

/// 被拒绝的行（row_index 为 1 起始表格行号，表头占第 1 行）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowRejection {
    pub row_index: usize,
    pub data: Vec<String>,
    pub reason: RejectReason,
}

/// 预校验报告
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreValidationReport {
    pub valid_rows: Vec<ValidRow>,
    pub invalid_rows: Vec<RowRejection>,
}

impl PreValidationReport {
    pub fn valid_count(&self) -> usize {
        self.valid_rows.len()
    }

    pub fn invalid_count(&self) -> usize {
        self.invalid_rows.len()
    }
}

/// 提交/替换结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestOutcome {
    pub batch_id: String,
    pub upload_type: String,
    pub year: i32,
    pub month: u32,
    pub stored_rows: usize,           // 批次落库的数据行数
    pub accepted: usize,              // 渠道匹配类型: 入账行数；其他类型: 落库行数
    pub rejected: Vec<RowRejection>,  // 逐行拒绝明细
    pub replaced: bool,               // 是否走替换路径
}

// ==========================================
// SalesIngestor Trait
// ==========================================
// 用途: 导入管道主接口
// 实现者: SalesIngestorImpl
#[async_trait]
pub trait SalesIngestor: Send + Sync {
    /// 预校验（不落库）
    ///
    /// # 参数
    /// - upload_type: 上传类型
    /// - table: 原始表格（首行为表头）
    ///
    /// # 返回
    /// - Ok(PreValidationReport): 有效行/无效行（含行号与原因）
    /// - Err(MissingColumns): 表头缺列，整批拒绝
    async fn pre_validate(&self, upload_type: &str, table: &RawTable)
        -> ImportResult<PreValidationReport>;

    /// 提交新批次
    ///
    /// # 返回
    /// - Err(BatchConflict): 该周期已有批次（可改走 replace）
    /// - Err(MissingColumns): 表头缺列
    /// - Err(Storage): 存储失败（已写入部分不回滚）
    ///
    /// # 流程
    /// 1. 请求校验（类型/周期/表头）
    /// 2. 行选择
    /// 3. 周期冲突检查
    /// 4. 批次落库
    /// 5. 渠道匹配类型: 重建编码索引 → 逐行分类 → 逐条追加销售记录
    async fn commit(&self, request: CommitRequest) -> ImportResult<IngestOutcome>;

    /// 整体替换已有批次（不重复追加销售历史）
    ///
    /// # 返回
    /// - Err(BatchNotFound): 该周期没有批次
    async fn replace(&self, request: CommitRequest) -> ImportResult<IngestOutcome>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 上传文件解析
// 实现者: CsvParser, ExcelParser, UniversalFileParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始表格（首行为表头）
    fn parse_table(&self, file_path: &Path) -> ImportResult<RawTable>;
}
