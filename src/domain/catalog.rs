// ==========================================
// 销售导入门户 - 商品目录领域模型
// ==========================================
// 职责: CatalogItem / Variation / SaleRecord
// 说明: 目录可由 JSON 文件导入；导入管道只读取编码并追加销售记录
// ==========================================

use crate::domain::types::Channel;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// CatalogItem - 商品
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub item_id: String,            // 商品唯一标识
    pub short_code: Option<String>, // 商品短码
    #[serde(alias = "itemName")]
    pub name: String, // 商品名称
    pub group: Option<String>,    // 商品分组
    pub category: Option<String>, // 商品分类
    #[serde(default)]
    pub variations: Vec<Variation>, // 规格列表（下标即 variation_index）
}

impl CatalogItem {
    /// 全部规格的销售记录总数
    pub fn sales_record_count(&self) -> usize {
        self.variations.iter().map(|v| v.sales_history.len()).sum()
    }
}

// ==========================================
// Variation - 商品规格
// ==========================================
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variation {
    pub value: String,        // 规格描述（如 "500 Gms"）
    pub name: Option<String>, // 展示名称（可选）
    #[serde(default)]
    pub prices: BTreeMap<String, f64>, // 渠道 → 价格
    pub sap_code: Option<String>, // 渠道匹配编码
    #[serde(default)]
    pub sales_history: Vec<SaleRecord>, // 追加式销售历史（按上传顺序）
}

impl Variation {
    /// 聚合视图中使用的规格名称
    ///
    /// 优先级: name → value → "Variation {index+1}"
    pub fn display_name(&self, index: usize) -> String {
        let non_empty = |s: &str| {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        };

        self.name
            .as_deref()
            .and_then(non_empty)
            .or_else(|| non_empty(&self.value))
            .unwrap_or_else(|| format!("Variation {}", index + 1))
    }

    /// 非空的匹配编码（已 trim）
    pub fn matching_code(&self) -> Option<&str> {
        self.sap_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

// ==========================================
// SaleRecord - 销售记录（导入后不可变）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    pub date: NaiveDate,      // 销售日期（按 UTC 零点存储）
    pub time: Option<String>, // 时间（原样字符串）
    pub channel: Channel,     // 销售渠道
    pub restaurant: String,   // 门店名称
    pub quantity: i64,        // 数量（取整后，非负）
    pub value: i64,           // 金额（单价 × 数量，取整）
    pub category: String,     // 品类标签
}

impl SaleRecord {
    /// 销售日期对应的 UTC 零点时刻
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.date.and_time(chrono::NaiveTime::MIN).and_utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variation(value: &str, name: Option<&str>) -> Variation {
        Variation {
            value: value.to_string(),
            name: name.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_display_name_priority() {
        assert_eq!(variation("500 Gms", Some("Half Kg")).display_name(0), "Half Kg");
        assert_eq!(variation("500 Gms", None).display_name(0), "500 Gms");
        assert_eq!(variation("  ", Some("")).display_name(2), "Variation 3");
    }

    #[test]
    fn test_matching_code_trims_and_filters_empty() {
        let mut v = variation("1 Kg", None);
        assert_eq!(v.matching_code(), None);

        v.sap_code = Some("   ".to_string());
        assert_eq!(v.matching_code(), None);

        v.sap_code = Some(" X1 ".to_string());
        assert_eq!(v.matching_code(), Some("X1"));
    }

    #[test]
    fn test_catalog_json_accepts_minimal_items() {
        let json = r#"[
            {"itemId": "I1", "itemName": "Sourdough", "group": "Breads",
             "variations": [{"value": "500 Gms", "sapCode": "X1"}, {"value": "1 Kg"}]},
            {"itemId": "I2", "name": "Croissant"}
        ]"#;
        let items: Vec<CatalogItem> = serde_json::from_str(json).unwrap();

        assert_eq!(items[0].name, "Sourdough");
        assert_eq!(items[0].variations[0].matching_code(), Some("X1"));
        assert!(items[0].variations[1].prices.is_empty());
        assert!(items[0].variations[1].sales_history.is_empty());
        assert!(items[1].variations.is_empty());
        assert_eq!(items[1].short_code, None);
    }

    #[test]
    fn test_sale_record_timestamp_is_utc_midnight() {
        let record = SaleRecord {
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            time: None,
            channel: Channel::Dining,
            restaurant: "Outlet A".to_string(),
            quantity: 1,
            value: 10,
            category: String::new(),
        };
        assert_eq!(record.timestamp().to_rfc3339(), "2024-03-15T00:00:00+00:00");
    }
}
