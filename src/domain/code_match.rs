// ==========================================
// 销售导入门户 - 编码对照领域模型
// ==========================================
// 职责: 上传数据中的编码统计 / 目录编码一览 / 目录与上传编码的对照报告
// 说明: 只读投影，不落库
// ==========================================

use crate::domain::catalog::CatalogItem;
use serde::Serialize;

/// 上传数据中出现的编码
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedCode {
    pub sap_code: String,
    pub row_count: usize,        // 出现行数（跨全部批次）
    pub categories: Vec<String>, // 品类（按首次出现顺序，去重）
}

// ==========================================
// 目录编码一览
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariationCode {
    pub variation_index: usize,
    pub value: String,
    pub sap_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogCodeEntry {
    pub item_id: String,
    pub item_name: String,
    pub short_code: Option<String>,
    pub group: Option<String>,
    pub category: Option<String>,
    pub variations: Vec<VariationCode>,
}

impl From<&CatalogItem> for CatalogCodeEntry {
    fn from(item: &CatalogItem) -> Self {
        Self {
            item_id: item.item_id.clone(),
            item_name: item.name.clone(),
            short_code: item.short_code.clone(),
            group: item.group.clone(),
            category: item.category.clone(),
            variations: item
                .variations
                .iter()
                .enumerate()
                .map(|(variation_index, v)| VariationCode {
                    variation_index,
                    value: v.value.clone(),
                    sap_code: v.matching_code().map(str::to_string),
                })
                .collect(),
        }
    }
}

// ==========================================
// 对照报告
// ==========================================

/// 编码已在上传数据中出现的规格
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedVariation {
    pub item_id: String,
    pub item_name: String,
    pub variation_index: usize,
    pub variation: String,
    pub sap_code: String,
    pub row_count: usize,
}

/// 未命中的规格（无编码或编码未出现在上传数据中）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmatchedVariation {
    pub item_id: String,
    pub item_name: String,
    pub variation_index: usize,
    pub variation: String,
    pub current_code: Option<String>,
    pub suggested_codes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeMatchSummary {
    pub total_items: usize,
    pub total_variations: usize,
    pub matched_variations: usize,
    pub unmatched_variations: usize,
    pub total_uploaded_codes: usize,
    pub unassigned_codes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeMatchReport {
    pub summary: CodeMatchSummary,
    pub matched: Vec<MatchedVariation>,
    pub unmatched: Vec<UnmatchedVariation>,
    /// 上传数据中出现、但没有任何规格登记的编码（导入时会被拒绝）
    pub unassigned_codes: Vec<UploadedCode>,
}
