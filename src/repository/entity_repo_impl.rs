// ==========================================
// MBA 院校数据后台 - 实体仓储 SQLite 实现
// ==========================================
// 职责: 按字段表读写 mba_schools / scholarships（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据读写
// 约束: 所有查询使用参数化；列名只来自字段表
// ==========================================

use crate::db::{ensure_entity_tables, open_sqlite_connection};
use crate::domain::entity::{CanonicalEntity, ExistingRecord, FieldDelta};
use crate::domain::types::{EntityKind, FieldType, FieldValue};
use crate::importer::field_normalizer::{parse_boolean, parse_decimal, parse_integer};
use crate::importer::schema::schema_for;
use crate::repository::entity_repo::{EntityRepository, StoredId};
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

// ==========================================
// SqliteEntityRepository
// ==========================================
pub struct SqliteEntityRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteEntityRepository {
    /// 打开数据库文件并确保实体表存在
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Self::from_connection(conn)
    }

    /// 使用已有连接（调用方可预先建表/加约束）
    pub fn from_connection(conn: Connection) -> RepositoryResult<Self> {
        ensure_entity_tables(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 内存数据库（测试与演练用）
    pub fn open_in_memory() -> RepositoryResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        crate::db::configure_sqlite_connection(&conn)?;
        Self::from_connection(conn)
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

/// FieldValue → SQLite 值
fn to_sql_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Text(s) => Value::Text(s.clone()),
        FieldValue::Integer(n) => Value::Integer(*n),
        FieldValue::Decimal(f) | FieldValue::Percentage(f) => Value::Real(*f),
        FieldValue::Boolean(b) => Value::Integer(i64::from(*b)),
        FieldValue::Null => Value::Null,
    }
}

/// SQLite 值 → FieldValue（按字段表类型解码，类型不符时尽量转换）
fn from_sql_value(field_type: FieldType, value: Value) -> FieldValue {
    match (field_type, value) {
        (_, Value::Null) | (_, Value::Blob(_)) => FieldValue::Null,

        (FieldType::Text, Value::Text(s)) => FieldValue::Text(s),
        (FieldType::Text, Value::Integer(n)) => FieldValue::Text(n.to_string()),
        (FieldType::Text, Value::Real(f)) => FieldValue::Text(f.to_string()),

        (FieldType::Integer, Value::Integer(n)) => FieldValue::Integer(n),
        (FieldType::Integer, Value::Real(f)) => FieldValue::Integer(f as i64),
        (FieldType::Integer, Value::Text(s)) => parse_integer(&s)
            .map(FieldValue::Integer)
            .unwrap_or(FieldValue::Null),

        (FieldType::Decimal, Value::Real(f)) => FieldValue::Decimal(f),
        (FieldType::Decimal, Value::Integer(n)) => FieldValue::Decimal(n as f64),
        (FieldType::Decimal, Value::Text(s)) => parse_decimal(&s)
            .map(FieldValue::Decimal)
            .unwrap_or(FieldValue::Null),

        (FieldType::Percentage, Value::Real(f)) => FieldValue::Percentage(f),
        (FieldType::Percentage, Value::Integer(n)) => FieldValue::Percentage(n as f64),
        (FieldType::Percentage, Value::Text(s)) => parse_decimal(&s)
            .map(FieldValue::Percentage)
            .unwrap_or(FieldValue::Null),

        (FieldType::Boolean, Value::Integer(n)) => FieldValue::Boolean(n != 0),
        (FieldType::Boolean, Value::Real(f)) => FieldValue::Boolean(f != 0.0),
        (FieldType::Boolean, Value::Text(s)) => FieldValue::Boolean(parse_boolean(&s)),
    }
}

#[async_trait]
impl EntityRepository for SqliteEntityRepository {
    async fn read_all(&self, kind: EntityKind) -> RepositoryResult<Vec<ExistingRecord>> {
        let schema = schema_for(kind);
        let columns: Vec<&str> = schema.field_names().collect();
        let sql = format!(
            "SELECT id, {}, created_at FROM {} ORDER BY created_at, rowid",
            columns.join(", "),
            kind.collection()
        );

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            let id: String = row.get(0)?;
            let mut fields = BTreeMap::new();
            for (idx, spec) in schema.fields.iter().enumerate() {
                let raw: Value = row.get(idx + 1)?;
                fields.insert(spec.name.to_string(), from_sql_value(spec.field_type(), raw));
            }
            let created_at: Option<String> = row.get(schema.fields.len() + 1)?;
            Ok((id, fields, created_at))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, fields, created_at) = row?;
            let created_at = created_at
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc));
            records.push(ExistingRecord {
                id,
                entity: CanonicalEntity::from_fields(kind, fields),
                created_at,
            });
        }

        debug!(kind = %kind, count = records.len(), "读取现有记录快照");
        Ok(records)
    }

    async fn insert_many(
        &self,
        kind: EntityKind,
        entities: &[CanonicalEntity],
    ) -> RepositoryResult<Vec<StoredId>> {
        if entities.is_empty() {
            return Ok(Vec::new());
        }

        let schema = schema_for(kind);
        let columns: Vec<&str> = schema.field_names().collect();
        let placeholders: Vec<String> = (1..=columns.len() + 3).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} (id, {}, created_at, updated_at) VALUES ({})",
            kind.collection(),
            columns.join(", "),
            placeholders.join(", ")
        );

        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut ids = Vec::with_capacity(entities.len());
        {
            let mut stmt = tx.prepare(&sql)?;
            let now = Utc::now().to_rfc3339();
            for entity in entities {
                let id = Uuid::new_v4().to_string();
                let mut values = Vec::with_capacity(columns.len() + 3);
                values.push(Value::Text(id.clone()));
                for name in &columns {
                    values.push(to_sql_value(entity.get(name)));
                }
                values.push(Value::Text(now.clone()));
                values.push(Value::Text(now.clone()));

                stmt.execute(params_from_iter(values))?;
                ids.push(id);
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        debug!(kind = %kind, count = ids.len(), "批量插入完成");
        Ok(ids)
    }

    async fn update_by_id(
        &self,
        kind: EntityKind,
        id: &str,
        delta: &FieldDelta,
    ) -> RepositoryResult<()> {
        let schema = schema_for(kind);
        for field in delta.field_names() {
            if schema.field(field).is_none() {
                return Err(RepositoryError::FieldValueError {
                    field: field.to_string(),
                    message: format!("{} 不包含该字段", kind.collection()),
                });
            }
        }

        let mut assignments = Vec::with_capacity(delta.len() + 1);
        let mut values = Vec::with_capacity(delta.len() + 2);
        for (idx, (field, value)) in delta.iter().enumerate() {
            assignments.push(format!("{} = ?{}", field, idx + 1));
            values.push(to_sql_value(value));
        }
        assignments.push(format!("updated_at = ?{}", values.len() + 1));
        values.push(Value::Text(Utc::now().to_rfc3339()));
        values.push(Value::Text(id.to_string()));

        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            kind.collection(),
            assignments.join(", "),
            values.len()
        );

        let conn = self.get_conn()?;
        let affected = conn.execute(&sql, params_from_iter(values))?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: kind.collection().to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
