// ==========================================
// 销售导入门户 - 销售聚合引擎
// ==========================================
// 职责: 单品销售历史 → 渠道汇总 / 月度序列 / 日度序列 / 门店汇总
// 输入: CatalogItem（含全部规格的销售历史） + 日期区间 + 可选门店
// 输出: AggregatedSalesView（只读投影，不落库）
// 红线: 纯函数，不访问存储；同一输入重复调用结果一致
// ==========================================

use crate::domain::catalog::CatalogItem;
use crate::domain::sales::{
    AggregatedSalesView, ChannelQuantities, DailySales, DateRange, MonthlySales,
};
use std::collections::BTreeMap;
use tracing::instrument;

/// 门店名为空的记录在门店汇总中的归属
pub const UNKNOWN_RESTAURANT: &str = "Unknown";

// ==========================================
// SalesAggregator - 销售聚合引擎
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct SalesAggregator;

impl SalesAggregator {
    pub fn new() -> Self {
        Self
    }

    /// 聚合单品销售
    ///
    /// # 参数
    /// - item: 商品（None = 商品不存在，返回全零视图）
    /// - item_id: 商品 ID（回填到视图）
    /// - range: 闭区间，按记录日期的 UTC 零点判定
    /// - restaurant: 门店过滤（精确匹配；None = 全部门店）
    #[instrument(skip(self, item), fields(found = item.is_some()))]
    pub fn aggregate(
        &self,
        item: Option<&CatalogItem>,
        item_id: &str,
        range: &DateRange,
        restaurant: Option<&str>,
    ) -> AggregatedSalesView {
        let mut view = AggregatedSalesView::empty(item_id);
        let Some(item) = item else {
            return view;
        };

        let _perf = crate::perf::PerfGuard::new("engine.aggregate_sales");

        let mut monthly: BTreeMap<String, ChannelQuantities> = BTreeMap::new();
        let mut daily: BTreeMap<String, ChannelQuantities> = BTreeMap::new();

        for (index, variation) in item.variations.iter().enumerate() {
            let variation_name = variation.display_name(index);

            for record in &variation.sales_history {
                if !range.contains(record.timestamp()) {
                    continue;
                }
                if let Some(wanted) = restaurant {
                    if record.restaurant != wanted {
                        continue;
                    }
                }

                view.channel_mut(record.channel).accumulate(
                    &variation_name,
                    record.quantity,
                    record.value,
                );

                monthly
                    .entry(record.date.format("%Y-%m").to_string())
                    .or_default()
                    .add(record.channel, record.quantity);
                daily
                    .entry(record.date.format("%Y-%m-%d").to_string())
                    .or_default()
                    .add(record.channel, record.quantity);

                let restaurant_key = if record.restaurant.trim().is_empty() {
                    UNKNOWN_RESTAURANT.to_string()
                } else {
                    record.restaurant.clone()
                };
                *view.restaurant_sales.entry(restaurant_key).or_insert(0) += record.quantity;
            }
        }

        // BTreeMap 键为零填充日期串，迭代顺序即时间顺序
        view.monthly_data = monthly
            .into_iter()
            .map(|(month, quantities)| MonthlySales { month, quantities })
            .collect();
        view.date_wise_data = daily
            .into_iter()
            .map(|(date, quantities)| DailySales { date, quantities })
            .collect();

        view
    }
}
