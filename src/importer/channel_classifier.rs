// ==========================================
// 销售导入门户 - 渠道判定规则表
// ==========================================
// 职责: 由 area / order_type 判定销售渠道
// 规则: 有序 (谓词, 渠道) 表，自上而下首个命中者胜出，全部未命中 → 堂食
// ==========================================

use crate::domain::types::Channel;

/// 规则检查的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleField {
    Area,
    OrderType,
}

/// 单条判定规则: 字段包含任一关键字（大小写不敏感）→ 渠道
#[derive(Debug, Clone, Copy)]
pub struct ChannelRule {
    pub field: RuleField,
    pub needles: &'static [&'static str],
    pub channel: Channel,
}

impl ChannelRule {
    fn matches(&self, area: &str, order_type: &str) -> bool {
        let haystack = match self.field {
            RuleField::Area => area,
            RuleField::OrderType => order_type,
        };
        self.needles.iter().any(|needle| haystack.contains(needle))
    }
}

/// 渠道判定规则（顺序即优先级）
pub const CHANNEL_RULES: &[ChannelRule] = &[
    ChannelRule {
        field: RuleField::Area,
        needles: &["zomato"],
        channel: Channel::Zomato,
    },
    ChannelRule {
        field: RuleField::Area,
        needles: &["swiggy"],
        channel: Channel::Swiggy,
    },
    ChannelRule {
        field: RuleField::Area,
        needles: &["parcel", "home delivery", "pickup"],
        channel: Channel::Parcel,
    },
    ChannelRule {
        field: RuleField::OrderType,
        needles: &["pickup", "home delivery"],
        channel: Channel::Parcel,
    },
    ChannelRule {
        field: RuleField::OrderType,
        needles: &["delivery"],
        channel: Channel::Parcel,
    },
];

/// 判定渠道
///
/// # 参数
/// - area: area 列原始值
/// - order_type: order_type 列原始值（缺列时传空串）
pub fn classify_channel(area: &str, order_type: &str) -> Channel {
    let area = area.trim().to_lowercase();
    let order_type = order_type.trim().to_lowercase();

    CHANNEL_RULES
        .iter()
        .find(|rule| rule.matches(&area, &order_type))
        .map(|rule| rule.channel)
        .unwrap_or(Channel::Dining)
}
