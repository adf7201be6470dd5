// ==========================================
// 销售导入门户 - 性能统计
// ==========================================
// 职责: SQLite 语句计数 + 慢查询日志 + 操作耗时
// 开关:
// - SALES_INGEST_PERF_SQL=1 强制开启（Debug 默认开启，Release 默认关闭）
// - SALES_INGEST_SLOW_SQL_MS=50 慢 SQL 阈值（毫秒）
// 约束: 计数器为线程局部，PerfGuard 只包裹同步代码段（中间不跨 await）
// ==========================================

use rusqlite::Connection;
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

pub const PERF_SQL_ENV: &str = "SALES_INGEST_PERF_SQL";
pub const SLOW_SQL_MS_ENV: &str = "SALES_INGEST_SLOW_SQL_MS";

const SQL_LOG_MAX_LEN: usize = 420;

static PERF_SQL_ENABLED: AtomicBool = AtomicBool::new(false);
static SLOW_SQL_THRESHOLD_MS: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static PERF_DEPTH: Cell<u32> = const { Cell::new(0) };
    static SQL_COUNT: Cell<u64> = const { Cell::new(0) };
    static SLOW_SQL_COUNT: Cell<u64> = const { Cell::new(0) };
}

/// SQL 统计设置（来自环境变量）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlPerfSettings {
    pub enabled: bool,
    pub slow_ms: u64,
}

impl SqlPerfSettings {
    /// 按原始环境变量值解析；None 表示未设置
    pub fn resolve(enabled: Option<&str>, slow_ms: Option<&str>) -> Self {
        let enabled = match enabled {
            Some(v) => is_true(v),
            None => cfg!(debug_assertions),
        };
        let slow_ms = slow_ms
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(if cfg!(debug_assertions) { 50 } else { 200 });
        Self { enabled, slow_ms }
    }

    pub fn from_env() -> Self {
        let enabled = std::env::var(PERF_SQL_ENV).ok();
        let slow_ms = std::env::var(SLOW_SQL_MS_ENV).ok();
        Self::resolve(enabled.as_deref(), slow_ms.as_deref())
    }
}

fn is_true(v: &str) -> bool {
    matches!(
        v.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

fn truncate_sql(sql: &str, max_len: usize) -> String {
    let s = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    if s.chars().count() <= max_len {
        return s;
    }
    let cut: String = s.chars().take(max_len).collect();
    format!("{}…", cut)
}

/// 在连接上安装语句 trace/profile 回调
pub fn install_sqlite_tracing(conn: &mut Connection) {
    let settings = SqlPerfSettings::from_env();
    PERF_SQL_ENABLED.store(settings.enabled, Ordering::Relaxed);

    if !settings.enabled {
        // 复用连接时清掉残留回调
        conn.trace(None);
        conn.profile(None);
        return;
    }

    SLOW_SQL_THRESHOLD_MS.store(settings.slow_ms, Ordering::Relaxed);
    conn.trace(Some(on_sql_trace));
    conn.profile(Some(on_sql_profile));
}

fn guard_active() -> bool {
    PERF_DEPTH.with(|d| d.get() > 0)
}

fn on_sql_trace(_sql: &str) {
    if PERF_SQL_ENABLED.load(Ordering::Relaxed) && guard_active() {
        SQL_COUNT.with(|c| c.set(c.get().saturating_add(1)));
    }
}

fn on_sql_profile(sql: &str, duration: Duration) {
    if !PERF_SQL_ENABLED.load(Ordering::Relaxed) {
        return;
    }

    let ms = duration.as_millis() as u64;
    let threshold = SLOW_SQL_THRESHOLD_MS.load(Ordering::Relaxed);
    if threshold == 0 || ms < threshold {
        return;
    }

    tracing::warn!(
        target: "slow_sql",
        duration_ms = ms,
        sql = %truncate_sql(sql, SQL_LOG_MAX_LEN),
        "slow sql"
    );
    if guard_active() {
        SLOW_SQL_COUNT.with(|c| c.set(c.get().saturating_add(1)));
    }
}

/// 操作级性能统计，Drop 时输出 elapsed_ms / sql_count / slow_sql_count
///
/// ```ignore
/// let _perf = sales_ingest::perf::PerfGuard::new("engine.aggregate_sales");
/// ```
pub struct PerfGuard {
    op: &'static str,
    start: Instant,
    sql_start: u64,
    slow_sql_start: u64,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        PERF_DEPTH.with(|d| d.set(d.get().saturating_add(1)));
        Self {
            op,
            start: Instant::now(),
            sql_start: SQL_COUNT.with(Cell::get),
            slow_sql_start: SLOW_SQL_COUNT.with(Cell::get),
        }
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let sql_count = SQL_COUNT.with(Cell::get).saturating_sub(self.sql_start);
        let slow_sql_count = SLOW_SQL_COUNT.with(Cell::get).saturating_sub(self.slow_sql_start);

        tracing::info!(
            target: "perf",
            op = self.op,
            elapsed_ms = self.start.elapsed().as_millis() as u64,
            sql_count,
            slow_sql_count,
            "done"
        );

        PERF_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_resolve() {
        let s = SqlPerfSettings::resolve(Some("on"), Some(" 75 "));
        assert!(s.enabled);
        assert_eq!(s.slow_ms, 75);

        let s = SqlPerfSettings::resolve(Some("0"), Some("abc"));
        assert!(!s.enabled);
        assert!(s.slow_ms > 0);
    }

    #[test]
    fn test_truncate_sql_collapses_whitespace() {
        assert_eq!(truncate_sql("SELECT *\n   FROM t", 100), "SELECT * FROM t");
        assert_eq!(truncate_sql("SELECT 1", 3), "SEL…");
    }

    #[test]
    fn test_guard_depth_restored() {
        {
            let _outer = PerfGuard::new("outer");
            let _inner = PerfGuard::new("inner");
            assert!(guard_active());
        }
        assert!(!guard_active());
    }
}
