// ==========================================
// 销售导入门户 - 行分类器
// ==========================================
// 职责: POS 原始行 → 结构化销售记录，或给出拒绝原因
// 两阶段:
// 1. 表头 → 列下标映射（每张表解析一次，关键列缺失即失败）
// 2. 逐行类型化解码（字符串解析只发生在这里）
// 校验顺序: 门店名 → 匹配编码 → 日期
// ==========================================

use crate::domain::catalog::SaleRecord;
use crate::importer::channel_classifier::classify_channel;
use crate::importer::code_matcher::{CodeMatchIndex, VariationRef};
use crate::importer::date_parser::parse_date;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::schema_validator::normalize_column;
use serde::Serialize;
use std::fmt;

// ===== 列名 =====
pub const COL_RESTAURANT: &str = "restaurant_name";
pub const COL_DATE: &str = "New Date";
pub const COL_TIME: &str = "Time";
pub const COL_AREA: &str = "area";
pub const COL_ORDER_TYPE: &str = "order_type";
pub const COL_CATEGORY: &str = "category_name";
pub const COL_CODE: &str = "sap_code";
pub const COL_PRICE: &str = "item_price";
pub const COL_QUANTITY: &str = "item_quantity";

// ==========================================
// ColumnIndices - 列下标映射
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnIndices {
    pub restaurant: usize,
    pub date: usize,
    pub area: usize,
    pub code: usize,
    pub price: usize,
    pub quantity: usize,
    pub time: Option<usize>,
    pub order_type: Option<usize>,
    pub category: Option<usize>,
}

impl ColumnIndices {
    /// 解析表头
    ///
    /// # 返回
    /// - Err(MissingColumns): 关键列缺失（缺失列名已规范化）
    pub fn resolve(header: &[String]) -> ImportResult<Self> {
        let normalized: Vec<String> = header.iter().map(|h| normalize_column(h)).collect();
        let find = |name: &str| {
            let wanted = normalize_column(name);
            normalized.iter().position(|h| *h == wanted)
        };

        let mut missing = Vec::new();
        let mut require = |name: &str| {
            let idx = find(name);
            if idx.is_none() {
                missing.push(normalize_column(name));
            }
            idx.unwrap_or(0)
        };

        let restaurant = require(COL_RESTAURANT);
        let date = require(COL_DATE);
        let area = require(COL_AREA);
        let code = require(COL_CODE);
        let price = require(COL_PRICE);
        let quantity = require(COL_QUANTITY);

        if !missing.is_empty() {
            return Err(ImportError::MissingColumns { missing });
        }

        Ok(Self {
            restaurant,
            date,
            area,
            code,
            price,
            quantity,
            time: find(COL_TIME),
            order_type: find(COL_ORDER_TYPE),
            category: find(COL_CATEGORY),
        })
    }
}

// ==========================================
// RejectReason - 行拒绝原因（非致命）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    NoRestaurantName,
    CodeNotFound { code: String },
    InvalidDate { value: String },
}

impl RejectReason {
    /// 触发拒绝的原始值
    pub fn detail(&self) -> Option<&str> {
        match self {
            RejectReason::NoRestaurantName => None,
            RejectReason::CodeNotFound { code } => Some(code),
            RejectReason::InvalidDate { value } => Some(value),
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::NoRestaurantName => write!(f, "no restaurant name"),
            RejectReason::CodeNotFound { .. } => write!(f, "code not found in catalog"),
            RejectReason::InvalidDate { .. } => write!(f, "invalid date"),
        }
    }
}

impl Serialize for RejectReason {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 分类成功的行
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRow {
    pub target: VariationRef,
    pub record: SaleRecord,
}

// ==========================================
// 数值解析
// ==========================================

/// 解析浮点数，失败或非有限值记为 0
pub fn parse_amount(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// 四舍五入（.5 向上）
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

// ==========================================
// RowClassifier
// ==========================================
pub struct RowClassifier<'a> {
    columns: &'a ColumnIndices,
    index: &'a CodeMatchIndex,
}

impl<'a> RowClassifier<'a> {
    pub fn new(columns: &'a ColumnIndices, index: &'a CodeMatchIndex) -> Self {
        Self { columns, index }
    }

    fn cell<'r>(row: &'r [String], idx: usize) -> &'r str {
        row.get(idx).map(|s| s.trim()).unwrap_or("")
    }

    fn optional_cell<'r>(row: &'r [String], idx: Option<usize>) -> &'r str {
        idx.map(|i| Self::cell(row, i)).unwrap_or("")
    }

    /// 分类单行（纯函数）
    ///
    /// # 返回
    /// - Ok(ClassifiedRow): 命中规格 + 销售记录
    /// - Err(RejectReason): 门店名为空 / 编码未登记 / 日期无法识别
    pub fn classify(&self, row: &[String]) -> Result<ClassifiedRow, RejectReason> {
        let cols = self.columns;

        // === 门店名 ===
        let restaurant = Self::cell(row, cols.restaurant);
        if restaurant.is_empty() {
            return Err(RejectReason::NoRestaurantName);
        }

        // === 匹配编码 ===
        let code = Self::cell(row, cols.code);
        let target = self
            .index
            .lookup(code)
            .cloned()
            .ok_or_else(|| RejectReason::CodeNotFound {
                code: code.to_string(),
            })?;

        // === 日期 ===
        let raw_date = Self::cell(row, cols.date);
        let date = parse_date(raw_date).ok_or_else(|| RejectReason::InvalidDate {
            value: raw_date.to_string(),
        })?;

        // === 渠道 ===
        let channel = classify_channel(
            Self::cell(row, cols.area),
            Self::optional_cell(row, cols.order_type),
        );

        // === 数量 / 金额（负数量按 0 计）===
        let price = parse_amount(Self::cell(row, cols.price));
        let quantity = parse_amount(Self::cell(row, cols.quantity)).max(0.0);

        let time = Self::optional_cell(row, cols.time);

        Ok(ClassifiedRow {
            target,
            record: SaleRecord {
                date,
                time: (!time.is_empty()).then(|| time.to_string()),
                channel,
                restaurant: restaurant.to_string(),
                quantity: round_half_up(quantity),
                value: round_half_up(price * quantity),
                category: Self::optional_cell(row, cols.category).to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{CatalogItem, Variation};
    use crate::domain::types::Channel;
    use chrono::NaiveDate;

    const HEADER: &[&str] = &[
        "restaurant_name",
        "New Date",
        "Time",
        "area",
        "order_type",
        "category_name",
        "sap_code",
        "item_price",
        "item_quantity",
    ];

    fn header() -> Vec<String> {
        HEADER.iter().map(|h| h.to_string()).collect()
    }

    fn row(restaurant: &str, date: &str, area: &str, order_type: &str, code: &str, price: &str, qty: &str) -> Vec<String> {
        [restaurant, date, "13:05", area, order_type, "Bakery", code, price, qty]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn index() -> CodeMatchIndex {
        CodeMatchIndex::build(&[CatalogItem {
            item_id: "I1".to_string(),
            short_code: None,
            name: "Sourdough".to_string(),
            group: None,
            category: None,
            variations: vec![Variation {
                value: "500 Gms".to_string(),
                sap_code: Some("X1".to_string()),
                ..Default::default()
            }],
        }])
    }

    #[test]
    fn test_resolve_is_case_and_space_insensitive() {
        let header: Vec<String> = vec![
            " Restaurant_Name ", "new date", "AREA", "SAP_CODE", "Item_Price", "item_quantity",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let cols = ColumnIndices::resolve(&header).unwrap();
        assert_eq!(cols.restaurant, 0);
        assert_eq!(cols.quantity, 5);
        assert_eq!(cols.order_type, None);
        assert_eq!(cols.time, None);
    }

    #[test]
    fn test_resolve_fails_fast_on_missing_critical_columns() {
        let header = vec!["restaurant_name".to_string(), "area".to_string()];
        match ColumnIndices::resolve(&header) {
            Err(ImportError::MissingColumns { missing }) => {
                assert_eq!(
                    missing,
                    vec!["new date", "sap_code", "item_price", "item_quantity"]
                );
            }
            other => panic!("Expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_accepts_known_code() {
        let cols = ColumnIndices::resolve(&header()).unwrap();
        let index = index();
        let classifier = RowClassifier::new(&cols, &index);

        let result = classifier
            .classify(&row("Outlet A", "2024-03-15", "Zomato", "Delivery", "X1", "100", "2"))
            .unwrap();

        assert_eq!(result.target.item_id, "I1");
        assert_eq!(result.record.date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(result.record.channel, Channel::Zomato);
        assert_eq!(result.record.quantity, 2);
        assert_eq!(result.record.value, 200);
        assert_eq!(result.record.time.as_deref(), Some("13:05"));
        assert_eq!(result.record.category, "Bakery");
    }

    #[test]
    fn test_rejection_order_and_reasons() {
        let cols = ColumnIndices::resolve(&header()).unwrap();
        let index = index();
        let classifier = RowClassifier::new(&cols, &index);

        // 门店名为空优先于编码与日期
        let err = classifier
            .classify(&row("  ", "bad", "", "", "UNKNOWN", "1", "1"))
            .unwrap_err();
        assert_eq!(err.to_string(), "no restaurant name");

        // 编码优先于日期
        let err = classifier
            .classify(&row("Outlet A", "bad", "", "", "UNKNOWN", "1", "1"))
            .unwrap_err();
        assert_eq!(err.to_string(), "code not found in catalog");
        assert_eq!(err.detail(), Some("UNKNOWN"));

        let err = classifier
            .classify(&row("Outlet A", "someday", "", "", "X1", "1", "1"))
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid date");
    }

    #[test]
    fn test_rounding_and_defaults() {
        let cols = ColumnIndices::resolve(&header()).unwrap();
        let index = index();
        let classifier = RowClassifier::new(&cols, &index);

        let r = classifier
            .classify(&row("Outlet A", "15-03-2024", "", "", "X1", "33.3", "2.5"))
            .unwrap();
        assert_eq!(r.record.quantity, 3);
        assert_eq!(r.record.value, 83); // 83.25
        assert_eq!(r.record.channel, Channel::Dining);

        let r = classifier
            .classify(&row("Outlet A", "15-03-2024", "", "", "X1", "abc", "n/a"))
            .unwrap();
        assert_eq!(r.record.quantity, 0);
        assert_eq!(r.record.value, 0);

        let r = classifier
            .classify(&row("Outlet A", "15-03-2024", "", "", "X1", "50", "-2"))
            .unwrap();
        assert_eq!(r.record.quantity, 0);
        assert_eq!(r.record.value, 0);
    }

    #[test]
    fn test_short_row_treated_as_empty_cells() {
        let cols = ColumnIndices::resolve(&header()).unwrap();
        let index = index();
        let classifier = RowClassifier::new(&cols, &index);

        let err = classifier.classify(&["Outlet A".to_string()]).unwrap_err();
        assert_eq!(err, RejectReason::CodeNotFound { code: String::new() });
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(2.49), 2);
        assert_eq!(round_half_up(0.0), 0);
    }
}
