// ==========================================
// 车队维保工单系统 - 日志系统初始化
// ==========================================
// 基于 tracing + tracing-subscriber,日志级别由 RUST_LOG 控制
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 未设置 RUST_LOG 时的默认过滤器: 本库 debug,其余 info
const DEFAULT_FILTER: &str = "info,fleet_cmms=debug";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 级别过滤器,如 RUST_LOG=debug 或 RUST_LOG=fleet_cmms=trace
///
/// # 示例
/// ```no_run
/// use fleet_cmms::logging;
/// logging::init();
/// ```
pub fn init() {
    fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// 初始化测试环境日志 (可重复调用,输出交给测试框架捕获)
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
