// ==========================================
// 销售导入门户 - 日期解析
// ==========================================
// 职责: 多格式日期识别，统一为日历日（UTC 零点）
// 顺序: YYYY-M-D → DD-MM-YYYY → MM/DD/YYYY → 通用格式，首个成功者胜出
// ==========================================

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// 年-月-日（月、日可不补零）
fn iso_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").unwrap())
}

/// 日-月-年（非锚定，可出现在单元格任意位置）
fn dashed_dmy_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"(\d{2})-(\d{2})-(\d{4})").unwrap())
}

/// 月/日/年（非锚定）
fn slashed_mdy_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"(\d{1,2})/(\d{1,2})/(\d{4})").unwrap())
}

/// 通用兜底格式（含时间部分的按日期截断）
const FALLBACK_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
];

const FALLBACK_DATE_FORMATS: &[&str] = &[
    "%Y/%m/%d",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
];

fn capture_ymd(caps: &regex::Captures<'_>, y: usize, m: usize, d: usize) -> Option<(i32, u32, u32)> {
    Some((
        caps.get(y)?.as_str().parse().ok()?,
        caps.get(m)?.as_str().parse().ok()?,
        caps.get(d)?.as_str().parse().ok()?,
    ))
}

/// 解析日期字符串
///
/// # 参数
/// - raw: 单元格原始文本
///
/// # 返回
/// - Some(NaiveDate): 识别成功（日历日，无时区偏移）
/// - None: 全部格式失败
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    // 1. YYYY-MM-DD（含 2024-3-5 这类不补零写法）
    if let Some(caps) = iso_regex().captures(s) {
        if let Some(date) = capture_ymd(&caps, 1, 2, 3)
            .and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
        {
            return Some(date);
        }
    }

    // 2. DD-MM-YYYY
    if let Some(caps) = dashed_dmy_regex().captures(s) {
        if let Some(date) = capture_ymd(&caps, 3, 2, 1)
            .and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
        {
            return Some(date);
        }
    }

    // 3. MM/DD/YYYY，月份越界且日 <= 12 时按 D/M/YYYY 识别
    if let Some(caps) = slashed_mdy_regex().captures(s) {
        if let Some((y, first, second)) = capture_ymd(&caps, 3, 1, 2) {
            let date = NaiveDate::from_ymd_opt(y, first, second)
                .or_else(|| NaiveDate::from_ymd_opt(y, second, first));
            if date.is_some() {
                return date;
            }
        }
    }

    // 4. 通用格式
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    FALLBACK_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok().map(|dt| dt.date()))
        .or_else(|| {
            FALLBACK_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        })
}

/// 日历日 → UTC 零点
pub fn to_utc_midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// 日历日 → YYYY-MM-DD
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
