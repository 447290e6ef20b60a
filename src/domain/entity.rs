// ==========================================
// MBA 院校数据后台 - 导入实体模型
// ==========================================
// 用途: 导入管道中间产物（原始行 → 规范实体 → 字段增量）
// 生命周期: RawRow / CanonicalEntity 仅在单次导入流程内存在
// ==========================================

use crate::domain::types::{EntityKind, FieldValue};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

static NULL_VALUE: FieldValue = FieldValue::Null;

// ==========================================
// RawRow - 原始行
// ==========================================
// 列名保持文件中的原样（仅去除首尾空白），按列顺序保存
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawRow {
    /// 原始文件行号（含表头偏移，从 1 开始计数）
    pub row_number: usize,
    pub cells: Vec<(String, String)>,
    /// 超出表头宽度的非空单元格（无法归属到任何列）
    pub overflow: Vec<String>,
}

impl RawRow {
    pub fn new(row_number: usize) -> Self {
        Self {
            row_number,
            ..Default::default()
        }
    }

    pub fn with_cell(mut self, label: &str, value: &str) -> Self {
        self.push(label, value);
        self
    }

    pub fn push(&mut self, label: &str, value: &str) {
        self.cells.push((label.trim().to_string(), value.trim().to_string()));
    }

    /// 列是否存在（不论是否为空）
    pub fn has_column(&self, label: &str) -> bool {
        self.cells.iter().any(|(l, _)| l == label)
    }

    /// 按列名取值；重名列以第一列为准
    pub fn get(&self, label: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    /// 所有单元格均为空
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.is_empty()) && self.overflow.is_empty()
    }
}

// ==========================================
// CanonicalEntity - 规范实体
// ==========================================
// 字段集合由映射表固定，映射器之外不可修改
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalEntity {
    kind: EntityKind,
    fields: BTreeMap<String, FieldValue>,
}

impl CanonicalEntity {
    pub(crate) fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            fields: BTreeMap::new(),
        }
    }

    /// 由完整字段表构造（仓储层回读使用）
    pub fn from_fields(kind: EntityKind, fields: BTreeMap<String, FieldValue>) -> Self {
        Self { kind, fields }
    }

    pub(crate) fn set(&mut self, name: &str, value: FieldValue) {
        self.fields.insert(name.to_string(), value);
    }

    /// 应用增量（导入规划阶段维护投影状态）
    pub(crate) fn apply(&mut self, delta: &FieldDelta) {
        for (field, value) in delta.iter() {
            self.set(field, value.clone());
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// 取字段值；不存在的字段视为 NULL
    pub fn get(&self, name: &str) -> &FieldValue {
        self.fields.get(name).unwrap_or(&NULL_VALUE)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).as_text().filter(|s| !s.trim().is_empty())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 用于提示消息的名称
    pub fn display_name(&self) -> &str {
        self.text("name").unwrap_or("(unnamed)")
    }
}

// ==========================================
// ExistingRecord - 已存储记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExistingRecord {
    /// 仓储分配的主键（对导入器不透明）
    pub id: String,
    pub entity: CanonicalEntity,
    pub created_at: Option<DateTime<Utc>>,
}

// ==========================================
// FieldDelta - 字段增量
// ==========================================
// 空增量表示"无需变更"，与"记录不存在"是两回事
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldDelta(BTreeMap<String, FieldValue>);

impl FieldDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: &str, value: FieldValue) {
        self.0.insert(field.to_string(), value);
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.get(field)
    }

    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.0.remove(field)
    }

    pub fn retain<F: FnMut(&str, &FieldValue) -> bool>(&mut self, mut keep: F) {
        self.0.retain(|k, v| keep(k.as_str(), v));
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

impl FromIterator<(String, FieldValue)> for FieldDelta {
    fn from_iter<T: IntoIterator<Item = (String, FieldValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ==========================================
// IdentityKey - 身份键
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub(crate) fn from_parts(parts: &[String]) -> Self {
        Self(parts.join(IDENTITY_SEPARATOR))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 身份键分隔符（数据中不会出现）
pub const IDENTITY_SEPARATOR: &str = "|";
