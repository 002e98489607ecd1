// ==========================================
// 车队维保工单系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 提供内嵌 schema 引导，保证库与测试使用同一套表结构
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 说明：
/// - 版本号用于**提示/告警**（不做自动迁移），避免静默在旧库上运行导致隐性错误。
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 内嵌建库脚本
///
/// 表结构:
/// - work_order: 工单主表 (status/priority 存储为 SCREAMING_SNAKE_CASE 字符串)
/// - technician: 技师主表 (specializations 存储为 JSON 数组)
/// - vehicle: 车辆主表 (时间线展示用)
/// - activity_log: 工单活动日志 (kind_json 为 tagged JSON, 追加写入)
/// - config_kv: 键值配置表 (scope_id + key)
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version     INTEGER PRIMARY KEY,
    applied_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS vehicle (
    vehicle_id  TEXT PRIMARY KEY,
    plate_no    TEXT NOT NULL,
    model       TEXT,
    location_id TEXT
);

CREATE TABLE IF NOT EXISTS technician (
    technician_id         TEXT PRIMARY KEY,
    name                  TEXT NOT NULL,
    location_id           TEXT NOT NULL,
    specializations_json  TEXT NOT NULL DEFAULT '[]',
    status                TEXT NOT NULL DEFAULT 'AVAILABLE',
    max_concurrent_orders INTEGER NOT NULL DEFAULT 5
);

CREATE TABLE IF NOT EXISTS work_order (
    work_order_id          TEXT PRIMARY KEY,
    title                  TEXT NOT NULL,
    vehicle_id             TEXT REFERENCES vehicle(vehicle_id),
    location_id            TEXT NOT NULL,
    status                 TEXT NOT NULL DEFAULT 'NEW',
    priority               TEXT NOT NULL DEFAULT 'MEDIUM',
    assigned_technician_id TEXT REFERENCES technician(technician_id),
    created_at             TEXT NOT NULL,
    sla_due                TEXT,
    completed_at           TEXT
);

CREATE INDEX IF NOT EXISTS idx_work_order_location ON work_order(location_id);
CREATE INDEX IF NOT EXISTS idx_work_order_technician ON work_order(assigned_technician_id);

CREATE TABLE IF NOT EXISTS activity_log (
    entry_id      TEXT PRIMARY KEY,
    work_order_id TEXT NOT NULL REFERENCES work_order(work_order_id),
    entry_ts      TEXT NOT NULL,
    actor         TEXT,
    kind_json     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_activity_log_order ON activity_log(work_order_id, entry_ts);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL,
    key      TEXT NOT NULL,
    value    TEXT NOT NULL,
    PRIMARY KEY (scope_id, key)
);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 在连接上引导建库（幂等）
///
/// # 返回
/// - Ok(()): 建表完成并记录 schema_version
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
