// ==========================================
// 销售导入门户 - 销售聚合视图模型
// ==========================================
// 职责: 聚合查询的日期区间与输出结构（只读、不落库）
// 序列化: camelCase（zomatoData / monthlyData / dateWiseData）
// ==========================================

use crate::domain::types::Channel;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// DateRange - 闭区间 [start, end]
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// 由日历日构造区间，end 延伸到当日 23:59:59.999 UTC
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Self {
        let start = start.and_time(NaiveTime::MIN).and_utc();
        let end = end_of_day(end);
        Self { start, end }
    }

    /// 截至 now 所在 UTC 日结束的滚动区间
    ///
    /// # 参数
    /// - now: 当前时刻
    /// - days: 回溯天数（默认配置 365）
    ///
    /// # 返回
    /// - None: 回溯超出可表示的时间范围
    pub fn rolling_days(now: DateTime<Utc>, days: i64) -> Option<Self> {
        let end = end_of_day(now.date_naive());
        let start = end.checked_sub_signed(TimeDelta::try_days(days)?)?;
        Some(Self { start, end })
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let next_midnight = date.and_time(NaiveTime::MIN).and_utc() + Duration::days(1);
    next_midnight - Duration::milliseconds(1)
}

// ==========================================
// 渠道数量拆分（月度/日度序列共用）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelQuantities {
    pub zomato_qty: i64,
    pub swiggy_qty: i64,
    pub dining_qty: i64,
    pub parcel_qty: i64,
    pub total_qty: i64,
}

impl ChannelQuantities {
    pub fn add(&mut self, channel: Channel, quantity: i64) {
        match channel {
            Channel::Zomato => self.zomato_qty += quantity,
            Channel::Swiggy => self.swiggy_qty += quantity,
            Channel::Dining => self.dining_qty += quantity,
            Channel::Parcel => self.parcel_qty += quantity,
        }
        self.total_qty += quantity;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySales {
    pub month: String, // YYYY-MM
    #[serde(flatten)]
    pub quantities: ChannelQuantities,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySales {
    pub date: String, // YYYY-MM-DD
    #[serde(flatten)]
    pub quantities: ChannelQuantities,
}

// ==========================================
// 渠道汇总（含规格明细）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationSales {
    pub name: String,
    pub quantity: i64,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelSales {
    pub quantity: i64,
    pub value: i64,
    pub variations: Vec<VariationSales>, // 首次出现顺序
}

impl ChannelSales {
    /// 累加一条记录到指定规格名下
    pub fn accumulate(&mut self, variation_name: &str, quantity: i64, value: i64) {
        self.quantity += quantity;
        self.value += value;
        match self.variations.iter_mut().find(|v| v.name == variation_name) {
            Some(entry) => {
                entry.quantity += quantity;
                entry.value += value;
            }
            None => self.variations.push(VariationSales {
                name: variation_name.to_string(),
                quantity,
                value,
            }),
        }
    }
}

// ==========================================
// AggregatedSalesView - 单品销售聚合视图
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedSalesView {
    pub item_id: String,
    pub zomato_data: ChannelSales,
    pub swiggy_data: ChannelSales,
    pub dining_data: ChannelSales,
    pub parcel_data: ChannelSales,
    pub monthly_data: Vec<MonthlySales>,         // 按月份升序
    pub date_wise_data: Vec<DailySales>,         // 按日期升序
    pub restaurant_sales: BTreeMap<String, i64>, // 门店 → 数量
}

impl AggregatedSalesView {
    pub fn empty(item_id: &str) -> Self {
        Self {
            item_id: item_id.to_string(),
            ..Default::default()
        }
    }

    pub fn channel(&self, channel: Channel) -> &ChannelSales {
        match channel {
            Channel::Zomato => &self.zomato_data,
            Channel::Swiggy => &self.swiggy_data,
            Channel::Dining => &self.dining_data,
            Channel::Parcel => &self.parcel_data,
        }
    }

    pub fn channel_mut(&mut self, channel: Channel) -> &mut ChannelSales {
        match channel {
            Channel::Zomato => &mut self.zomato_data,
            Channel::Swiggy => &mut self.swiggy_data,
            Channel::Dining => &mut self.dining_data,
            Channel::Parcel => &mut self.parcel_data,
        }
    }

    /// 全渠道数量合计
    pub fn total_quantity(&self) -> i64 {
        Channel::ALL.iter().map(|c| self.channel(*c).quantity).sum()
    }
}
