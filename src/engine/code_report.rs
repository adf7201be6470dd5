// ==========================================
// 销售导入门户 - 编码对照引擎
// ==========================================
// 职责: 已存批次 → 编码统计；商品目录 × 编码统计 → 对照报告
// 红线: 纯函数，不访问存储
// ==========================================

use crate::domain::catalog::CatalogItem;
use crate::domain::code_match::{
    CodeMatchReport, CodeMatchSummary, MatchedVariation, UnmatchedVariation, UploadedCode,
};
use crate::domain::upload::UploadBatch;
use crate::importer::schema_validator::normalize_column;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// 编码列
pub const CODE_COLUMN: &str = "sap_code";
/// 品类列
pub const CATEGORY_COLUMN: &str = "category_name";
/// 品类为空时的归属
pub const UNKNOWN_CATEGORY: &str = "Unknown";
/// 未命中规格的候选编码数
pub const MAX_SUGGESTIONS: usize = 5;

#[derive(Debug, Default, Clone, Copy)]
pub struct CodeReporter;

impl CodeReporter {
    pub fn new() -> Self {
        Self
    }

    /// 统计批次中出现的编码
    ///
    /// # 返回
    /// - 按出现行数降序，行数相同按编码升序
    /// - 表头无编码列的批次跳过
    pub fn collect_uploaded_codes(&self, batches: &[UploadBatch]) -> Vec<UploadedCode> {
        let mut codes: HashMap<String, UploadedCode> = HashMap::new();

        for batch in batches {
            let Some(header) = batch.data.header() else {
                continue;
            };
            let position = |name: &str| header.iter().position(|h| normalize_column(h) == name);
            let Some(code_idx) = position(CODE_COLUMN) else {
                debug!(batch_id = %batch.batch_id, "批次无编码列，跳过");
                continue;
            };
            let category_idx = position(CATEGORY_COLUMN);

            for row in batch.data.data_rows() {
                let code = row.get(code_idx).map(|c| c.trim()).unwrap_or("");
                if code.is_empty() {
                    continue;
                }
                let category = category_idx
                    .and_then(|idx| row.get(idx))
                    .map(|c| c.trim())
                    .filter(|c| !c.is_empty())
                    .unwrap_or(UNKNOWN_CATEGORY);

                let entry = codes.entry(code.to_string()).or_insert_with(|| UploadedCode {
                    sap_code: code.to_string(),
                    row_count: 0,
                    categories: Vec::new(),
                });
                entry.row_count += 1;
                if !entry.categories.iter().any(|c| c == category) {
                    entry.categories.push(category.to_string());
                }
            }
        }

        let mut codes: Vec<UploadedCode> = codes.into_values().collect();
        codes.sort_by(|a, b| {
            b.row_count
                .cmp(&a.row_count)
                .then_with(|| a.sap_code.cmp(&b.sap_code))
        });
        codes
    }

    /// 目录规格与上传编码对照
    ///
    /// # 参数
    /// - items: 商品目录
    /// - uploaded: collect_uploaded_codes 的结果（顺序决定候选编码顺序）
    pub fn match_catalog(&self, items: &[CatalogItem], uploaded: &[UploadedCode]) -> CodeMatchReport {
        let uploaded_rows: HashMap<&str, usize> = uploaded
            .iter()
            .map(|c| (c.sap_code.as_str(), c.row_count))
            .collect();
        let registered: HashSet<&str> = items
            .iter()
            .flat_map(|item| item.variations.iter().filter_map(|v| v.matching_code()))
            .collect();

        let unassigned_codes: Vec<UploadedCode> = uploaded
            .iter()
            .filter(|c| !registered.contains(c.sap_code.as_str()))
            .cloned()
            .collect();
        let suggestions: Vec<String> = unassigned_codes
            .iter()
            .take(MAX_SUGGESTIONS)
            .map(|c| c.sap_code.clone())
            .collect();

        let mut report = CodeMatchReport::default();
        for item in items {
            for (variation_index, variation) in item.variations.iter().enumerate() {
                let code = variation.matching_code();
                match code.and_then(|c| uploaded_rows.get(c).map(|rows| (c, *rows))) {
                    Some((code, row_count)) => report.matched.push(MatchedVariation {
                        item_id: item.item_id.clone(),
                        item_name: item.name.clone(),
                        variation_index,
                        variation: variation.display_name(variation_index),
                        sap_code: code.to_string(),
                        row_count,
                    }),
                    None => report.unmatched.push(UnmatchedVariation {
                        item_id: item.item_id.clone(),
                        item_name: item.name.clone(),
                        variation_index,
                        variation: variation.display_name(variation_index),
                        current_code: code.map(str::to_string),
                        suggested_codes: suggestions.clone(),
                    }),
                }
            }
        }

        report.summary = CodeMatchSummary {
            total_items: items.len(),
            total_variations: report.matched.len() + report.unmatched.len(),
            matched_variations: report.matched.len(),
            unmatched_variations: report.unmatched.len(),
            total_uploaded_codes: uploaded.len(),
            unassigned_codes: unassigned_codes.len(),
        };
        report.unassigned_codes = unassigned_codes;
        report
    }
}
