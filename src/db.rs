// ==========================================
// BOM 包装管理系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键 / busy_timeout）
// - 统一建表（目录表 + 包装表 + 审计/配置表），幂等
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    configure_sqlite_connection_with_timeout(conn, DEFAULT_BUSY_TIMEOUT_MS)
}

/// 配置 SQLite 连接（指定 busy_timeout）
pub fn configure_sqlite_connection_with_timeout(
    conn: &Connection,
    busy_timeout_ms: u64,
) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(busy_timeout_ms))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
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

/// 初始化数据库 schema（幂等）
///
/// 说明：
/// - bom_drawing / bom_part / bom_material 属于 BOM 目录，由目录维护方写入
/// - packaging_unit 以 (drawing_id, part_id) 作为真正的唯一约束，unit_id 只是派生出的对外标识
/// - packaging_unit.list_id 外键延迟到提交时检查：组成清单时先更新单元、后插入清单
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS bom_drawing (
            drawing_id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL,
            drawing_name TEXT NOT NULL DEFAULT '',
            drawing_kind TEXT NOT NULL DEFAULT 'OTHER',
            assembly_drawing_id TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_bom_drawing_project ON bom_drawing(project_id);

        CREATE TABLE IF NOT EXISTS bom_part (
            drawing_id TEXT NOT NULL REFERENCES bom_drawing(drawing_id) ON DELETE CASCADE,
            part_id TEXT NOT NULL,
            part_name TEXT NOT NULL DEFAULT '',
            quantity REAL NOT NULL DEFAULT 0,
            spare_quantity REAL NOT NULL DEFAULT 0,
            manufacturer TEXT NOT NULL DEFAULT '',
            PRIMARY KEY (drawing_id, part_id)
        );

        CREATE TABLE IF NOT EXISTS bom_material (
            drawing_id TEXT NOT NULL,
            part_id TEXT NOT NULL,
            material_id TEXT NOT NULL,
            material_name TEXT NOT NULL DEFAULT '',
            weight REAL NOT NULL DEFAULT 0,
            quantity REAL NOT NULL DEFAULT 0,
            material_type TEXT NOT NULL DEFAULT '',
            PRIMARY KEY (drawing_id, part_id, material_id),
            FOREIGN KEY (drawing_id, part_id) REFERENCES bom_part(drawing_id, part_id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS packaging_list (
            list_id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL,
            list_weight REAL NOT NULL DEFAULT 0,
            ship_from TEXT,
            ship_to TEXT,
            image_id TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_packaging_list_project ON packaging_list(project_id);

        CREATE TABLE IF NOT EXISTS packaging_unit (
            unit_id TEXT PRIMARY KEY,
            drawing_id TEXT NOT NULL,
            part_id TEXT NOT NULL,
            part_count INTEGER NOT NULL DEFAULT 0,
            total_count TEXT NOT NULL DEFAULT '',
            list_id TEXT REFERENCES packaging_list(list_id) DEFERRABLE INITIALLY DEFERRED,
            UNIQUE (drawing_id, part_id),
            FOREIGN KEY (drawing_id, part_id) REFERENCES bom_part(drawing_id, part_id)
        );
        CREATE INDEX IF NOT EXISTS idx_packaging_unit_list ON packaging_unit(list_id);

        CREATE TABLE IF NOT EXISTS packaging_action_log (
            action_id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL,
            action_type TEXT NOT NULL,
            action_ts TEXT NOT NULL,
            actor TEXT NOT NULL,
            payload_json TEXT,
            detail TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_packaging_action_log_project
            ON packaging_action_log(project_id, action_ts);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), None);

        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        assert_eq!(
            read_schema_version(&conn).unwrap(),
            Some(CURRENT_SCHEMA_VERSION)
        );
    }
}
