// ==========================================
// MBA 院校数据后台 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 按字段表建立实体表（仅 CREATE IF NOT EXISTS，不做迁移）
// ==========================================

use crate::domain::types::EntityKind;
use crate::importer::schema::schema_for;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：busy_timeout 需要"每个连接"单独配置
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

/// 实体表 DDL（id + 字段表列 + 审计列）
pub fn entity_table_ddl(kind: EntityKind) -> String {
    let schema = schema_for(kind);
    let mut columns = vec!["id TEXT PRIMARY KEY".to_string()];
    for spec in schema.fields {
        columns.push(format!("{} {}", spec.name, spec.field_type().sql_type()));
    }
    columns.push("created_at TEXT NOT NULL".to_string());
    columns.push("updated_at TEXT NOT NULL".to_string());

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        kind.collection(),
        columns.join(",\n    ")
    )
}

/// 确保所有实体表存在（已存在的表保持原样）
pub fn ensure_entity_tables(conn: &Connection) -> rusqlite::Result<()> {
    for kind in EntityKind::ALL {
        conn.execute_batch(&entity_table_ddl(kind))?;
    }
    Ok(())
}

/// 表是否存在
pub fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1 LIMIT 1",
            [table],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}
