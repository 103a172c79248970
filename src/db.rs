// ==========================================
// 汽车维修门店管理系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为, 避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout, 减少并发写入时的偶发 busy 错误
// - 集中建表语句, 应用启动与测试共用同一套 schema
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout (毫秒)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明:
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

/// 读取 schema_version (若表不存在则返回 None)
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

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化数据库 schema (幂等)
///
/// # 说明
/// - 所有建表使用 IF NOT EXISTS, 可在已有库上安全重入
/// - work_order.appointment_id 的 UNIQUE 约束是"一预约一工单"
///   不变量的唯一事实来源, 应用层不做先查后写
/// - work_order_counter 固定单行, 工单号通过对该行的原子自增分配
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS appointment (
            appointment_id TEXT PRIMARY KEY,
            customer_id TEXT NOT NULL,
            vehicle_id TEXT NOT NULL,
            service_type_id TEXT NOT NULL,
            scheduled_date TEXT NOT NULL,
            scheduled_time TEXT,
            estimated_subtotal REAL NOT NULL DEFAULT 0,
            estimated_total REAL NOT NULL DEFAULT 0,
            priority TEXT NOT NULL,
            approval_status TEXT NOT NULL DEFAULT 'PENDING',
            approval_notes TEXT,
            decline_reason TEXT,
            assigned_follow_up_to TEXT,
            work_order_id TEXT,
            labor_rate_override REAL,
            created_at TEXT NOT NULL,
            decided_at TEXT,
            version INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_appointment_status
            ON appointment(approval_status, created_at);

        CREATE TABLE IF NOT EXISTS work_order (
            work_order_id TEXT PRIMARY KEY,
            appointment_id TEXT NOT NULL UNIQUE
                REFERENCES appointment(appointment_id),
            work_order_number TEXT NOT NULL UNIQUE,
            status TEXT NOT NULL,
            priority TEXT NOT NULL,
            service_name TEXT NOT NULL,
            labor_rate REAL NOT NULL,
            estimated_duration_minutes INTEGER NOT NULL,
            estimated_start_date TEXT,
            parts_availability_json TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS work_order_counter (
            counter_id INTEGER PRIMARY KEY CHECK (counter_id = 1),
            next_no INTEGER NOT NULL
        );

        INSERT OR IGNORE INTO work_order_counter (counter_id, next_no) VALUES (1, 0);

        CREATE TABLE IF NOT EXISTS service_catalog (
            service_type_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            labor_rate REAL,
            estimated_duration_minutes INTEGER NOT NULL,
            required_parts_json TEXT NOT NULL DEFAULT '[]'
        );

        CREATE TABLE IF NOT EXISTS parts_inventory (
            sku TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            quantity_in_stock INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS action_log (
            action_id TEXT PRIMARY KEY,
            appointment_id TEXT,
            action_type TEXT NOT NULL,
            action_ts TEXT NOT NULL,
            actor TEXT NOT NULL,
            payload_json TEXT,
            detail TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_action_log_appointment
            ON action_log(appointment_id, action_ts);
        "#,
    )?;

    // 记录 schema 版本 (幂等)
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}
