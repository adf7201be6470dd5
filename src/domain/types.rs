// ==========================================
// 销售导入门户 - 领域类型定义
// ==========================================
// 职责: 销售渠道、批次状态等封闭枚举
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 销售渠道 (Channel)
// ==========================================
// 两个外卖平台 + 自取/外带 + 堂食
// 序列化格式: lowercase (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Zomato, // 外卖平台 Zomato
    Swiggy, // 外卖平台 Swiggy
    Parcel, // 自取/外带/自营外送
    Dining, // 堂食（默认）
}

impl Channel {
    /// 全部渠道（输出顺序固定）
    pub const ALL: [Channel; 4] = [
        Channel::Zomato,
        Channel::Swiggy,
        Channel::Dining,
        Channel::Parcel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Zomato => "zomato",
            Channel::Swiggy => "swiggy",
            Channel::Parcel => "parcel",
            Channel::Dining => "dining",
        }
    }

    /// 从存储值解析渠道（大小写不敏感）
    ///
    /// # 返回
    /// - None: 未知渠道值
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "zomato" => Some(Channel::Zomato),
            "swiggy" => Some(Channel::Swiggy),
            "parcel" => Some(Channel::Parcel),
            "dining" => Some(Channel::Dining),
            _ => None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 上传批次状态 (Upload Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Uploaded, // 首次上传
    Updated,  // 已整体替换
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Uploaded => "uploaded",
            UploadStatus::Updated => "updated",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "uploaded" => Some(UploadStatus::Uploaded),
            "updated" => Some(UploadStatus::Updated),
            _ => None,
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 月份上传状态 (Month Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthStatus {
    Uploaded,
    Pending,
}

impl fmt::Display for MonthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthStatus::Uploaded => write!(f, "uploaded"),
            MonthStatus::Pending => write!(f, "pending"),
        }
    }
}
