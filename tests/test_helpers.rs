// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、POS 表格构造、商品目录种子数据
// ==========================================
#![allow(dead_code)]

use sales_ingest::app::AppState;
use sales_ingest::config::upload_formats::{find_format, PETPOOJA};
use sales_ingest::domain::{CatalogItem, RawTable, Variation};
use sales_ingest::repository::ItemStore;
use std::collections::BTreeMap;
use std::error::Error;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并装配 AppState
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - AppState: 已建表的应用状态
pub async fn create_test_state() -> Result<(NamedTempFile, AppState), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().ok_or("临时路径非 UTF-8")?.to_string();
    let state = AppState::initialize(db_path).await?;
    Ok((temp_file, state))
}

/// POS 表头（petpooja 全部必需列）
pub fn petpooja_header() -> Vec<String> {
    find_format(PETPOOJA)
        .expect("petpooja 格式已注册")
        .required_columns
        .iter()
        .map(|c| c.to_string())
        .collect()
}

/// POS 数据行
#[derive(Debug, Clone)]
pub struct PosRow<'a> {
    pub restaurant: &'a str,
    pub date: &'a str,
    pub area: &'a str,
    pub order_type: &'a str,
    pub code: &'a str,
    pub price: &'a str,
    pub quantity: &'a str,
}

impl Default for PosRow<'_> {
    fn default() -> Self {
        Self {
            restaurant: "Outlet A",
            date: "2024-03-15",
            area: "",
            order_type: "",
            code: "X1",
            price: "100",
            quantity: "1",
        }
    }
}

/// 按表头把 PosRow 展开成完整行，其余列留空
pub fn petpooja_row(header: &[String], row: &PosRow<'_>) -> Vec<String> {
    let mut cells = vec![String::new(); header.len()];
    let mut set = |name: &str, value: &str| {
        if let Some(idx) = header.iter().position(|h| h == name) {
            cells[idx] = value.to_string();
        }
    };
    set("restaurant_name", row.restaurant);
    set("New Date", row.date);
    set("area", row.area);
    set("order_type", row.order_type);
    set("sap_code", row.code);
    set("item_price", row.price);
    set("item_quantity", row.quantity);
    set("category_name", "Bakery");
    cells
}

/// 表头 + 数据行
pub fn petpooja_table(rows: &[PosRow<'_>]) -> RawTable {
    let header = petpooja_header();
    let mut all = vec![header.clone()];
    all.extend(rows.iter().map(|r| petpooja_row(&header, r)));
    RawTable::new(all)
}

fn variation(value: &str, code: Option<&str>) -> Variation {
    let mut prices = BTreeMap::new();
    prices.insert("dining".to_string(), 100.0);
    Variation {
        value: value.to_string(),
        name: None,
        prices,
        sap_code: code.map(str::to_string),
        sales_history: Vec::new(),
    }
}

/// 种子目录:
/// - I1 Sourdough: [500 Gms → X1, 1 Kg → X2]
/// - I2 Croissant: [Single → Y1]
/// - I3 Baguette: 无匹配编码
pub async fn seed_catalog(store: &dyn ItemStore) -> Result<(), Box<dyn Error>> {
    let items = vec![
        CatalogItem {
            item_id: "I1".to_string(),
            short_code: Some("SD".to_string()),
            name: "Sourdough".to_string(),
            group: Some("Breads".to_string()),
            category: Some("Bakery".to_string()),
            variations: vec![variation("500 Gms", Some("X1")), variation("1 Kg", Some("X2"))],
        },
        CatalogItem {
            item_id: "I2".to_string(),
            short_code: None,
            name: "Croissant".to_string(),
            group: None,
            category: Some("Viennoiserie".to_string()),
            variations: vec![variation("Single", Some("Y1"))],
        },
        CatalogItem {
            item_id: "I3".to_string(),
            short_code: None,
            name: "Baguette".to_string(),
            group: None,
            category: None,
            variations: vec![variation("Regular", None)],
        },
    ];

    for item in &items {
        store.insert_item(item).await?;
    }
    Ok(())
}
