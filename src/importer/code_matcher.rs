// ==========================================
// 销售导入门户 - 编码匹配索引
// ==========================================
// 职责: 匹配编码 → (商品, 规格下标)
// 约束: 每次导入重新构建，不跨导入缓存（目录随时可能被编辑）
// ==========================================

use crate::domain::catalog::CatalogItem;
use std::collections::HashMap;
use tracing::warn;

/// 编码命中的规格
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariationRef {
    pub item_id: String,
    pub variation_index: usize,
}

/// 编码匹配索引
#[derive(Debug, Default)]
pub struct CodeMatchIndex {
    entries: HashMap<String, VariationRef>,
}

impl CodeMatchIndex {
    /// 由商品目录构建索引
    ///
    /// 按 商品 → 规格 顺序遍历；同一编码出现多次时后者覆盖前者
    pub fn build(items: &[CatalogItem]) -> Self {
        let mut entries: HashMap<String, VariationRef> = HashMap::new();

        for item in items {
            for (variation_index, variation) in item.variations.iter().enumerate() {
                let Some(code) = variation.matching_code() else {
                    continue;
                };

                let target = VariationRef {
                    item_id: item.item_id.clone(),
                    variation_index,
                };
                if let Some(previous) = entries.insert(code.to_string(), target) {
                    warn!(
                        code = %code,
                        previous_item = %previous.item_id,
                        previous_variation = previous.variation_index,
                        item_id = %item.item_id,
                        variation_index,
                        "匹配编码重复，后出现的规格覆盖先前规格"
                    );
                }
            }
        }

        Self { entries }
    }

    /// 查找编码
    ///
    /// # 返回
    /// - None: 编码为空或未登记
    pub fn lookup(&self, code: &str) -> Option<&VariationRef> {
        let code = code.trim();
        if code.is_empty() {
            return None;
        }
        self.entries.get(code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::Variation;

    fn item(item_id: &str, codes: &[Option<&str>]) -> CatalogItem {
        CatalogItem {
            item_id: item_id.to_string(),
            short_code: None,
            name: item_id.to_string(),
            group: None,
            category: None,
            variations: codes
                .iter()
                .map(|code| Variation {
                    value: "1 Kg".to_string(),
                    sap_code: code.map(str::to_string),
                    ..Default::default()
                })
                .collect(),
        }
    }

    #[test]
    fn test_build_registers_non_empty_codes() {
        let index = CodeMatchIndex::build(&[
            item("I1", &[Some("X1"), None, Some("  ")]),
            item("I2", &[Some(" Y1 ")]),
        ]);

        assert_eq!(index.len(), 2);
        assert_eq!(
            index.lookup("X1"),
            Some(&VariationRef { item_id: "I1".to_string(), variation_index: 0 })
        );
        assert_eq!(index.lookup("Y1").unwrap().item_id, "I2");
    }

    #[test]
    fn test_lookup_empty_or_unknown() {
        let index = CodeMatchIndex::build(&[item("I1", &[Some("X1")])]);
        assert!(index.lookup("").is_none());
        assert!(index.lookup("   ").is_none());
        assert!(index.lookup("UNKNOWN").is_none());
        assert!(index.lookup("x1").is_none());
    }

    #[test]
    fn test_later_registration_wins() {
        let index = CodeMatchIndex::build(&[
            item("I1", &[Some("DUP")]),
            item("I2", &[None, Some("DUP")]),
        ]);

        let hit = index.lookup("DUP").unwrap();
        assert_eq!(hit.item_id, "I2");
        assert_eq!(hit.variation_index, 1);
    }

    #[test]
    fn test_empty_catalog() {
        let index = CodeMatchIndex::build(&[]);
        assert!(index.is_empty());
    }
}
