// ==========================================
// MBA 院校数据后台 - 领域类型定义
// ==========================================
// 职责: 实体种类 / 合并策略 / 导入模式 / 字段值类型
// 约束: 枚举均可从字符串解析（不区分大小写），Display 输出小写规范名
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 实体种类 (Entity Kind)
// ==========================================
// 决定: 使用哪张字段映射表、哪种身份键、写入哪个集合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    School,      // MBA 院校
    Scholarship, // 奖学金
}

impl EntityKind {
    pub const ALL: [EntityKind; 2] = [EntityKind::School, EntityKind::Scholarship];

    /// 存储集合（表）名
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::School => "mba_schools",
            EntityKind::Scholarship => "scholarships",
        }
    }

    /// 报告中使用的展示名
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::School => "MBA Schools",
            EntityKind::Scholarship => "Scholarships",
        }
    }

    /// 单条记录的称呼（用于提示消息）
    pub fn noun(&self) -> &'static str {
        match self {
            EntityKind::School => "school",
            EntityKind::Scholarship => "scholarship",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::School => write!(f, "school"),
            EntityKind::Scholarship => write!(f, "scholarship"),
        }
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "school" | "schools" | "mba" | "mba_schools" => Ok(EntityKind::School),
            "scholarship" | "scholarships" => Ok(EntityKind::Scholarship),
            other => Err(format!("unknown entity kind: {} (expected school|scholarship)", other)),
        }
    }
}

// ==========================================
// 合并策略 (Merge Policy)
// ==========================================
// 显式参数，随每次导入传递，不存在全局可变状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    Replace, // 任何不同即覆盖
    #[default]
    Merge, // 完整度启发式
    Preserve, // 只填空
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergePolicy::Replace => write!(f, "replace"),
            MergePolicy::Merge => write!(f, "merge"),
            MergePolicy::Preserve => write!(f, "preserve"),
        }
    }
}

impl FromStr for MergePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "replace" => Ok(MergePolicy::Replace),
            "merge" | "smart" => Ok(MergePolicy::Merge),
            "preserve" => Ok(MergePolicy::Preserve),
            other => Err(format!(
                "unknown merge policy: {} (expected replace|merge|preserve)",
                other
            )),
        }
    }
}

// ==========================================
// 导入模式 (Import Mode)
// ==========================================
// smart: 新增 + 合并；insert: 只新增；update: 只合并
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    #[default]
    #[serde(alias = "upsert")]
    Smart,
    Insert,
    Update,
}

impl ImportMode {
    pub fn allows_insert(&self) -> bool {
        !matches!(self, ImportMode::Update)
    }

    pub fn allows_update(&self) -> bool {
        !matches!(self, ImportMode::Insert)
    }
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportMode::Smart => write!(f, "smart"),
            ImportMode::Insert => write!(f, "insert"),
            ImportMode::Update => write!(f, "update"),
        }
    }
}

impl FromStr for ImportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "smart" | "upsert" => Ok(ImportMode::Smart),
            "insert" => Ok(ImportMode::Insert),
            "update" => Ok(ImportMode::Update),
            other => Err(format!(
                "unknown import mode: {} (expected smart|insert|update|upsert)",
                other
            )),
        }
    }
}

// ==========================================
// 字段类型 (Field Type)
// ==========================================
// 对齐: 存储列类型（TEXT / INTEGER / REAL）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Integer,
    Decimal,
    Percentage,
    Boolean,
}

impl FieldType {
    /// SQLite 列类型
    pub fn sql_type(&self) -> &'static str {
        match self {
            FieldType::Text => "TEXT",
            FieldType::Integer | FieldType::Boolean => "INTEGER",
            FieldType::Decimal | FieldType::Percentage => "REAL",
        }
    }
}

// ==========================================
// 字段值 (Field Value)
// ==========================================
// 规范化后的标量值；序列化为 JSON 原生类型
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Percentage(f64),
    Boolean(bool),
    Null,
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// 空值判定：NULL / 空字符串 / 数值零
    ///
    /// 布尔 false 不算空（false 是一个已知答案）
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Integer(n) => *n == 0,
            FieldValue::Decimal(n) | FieldValue::Percentage(n) => *n == 0.0,
            FieldValue::Boolean(_) => false,
        }
    }

    /// 作为导入来源时是否"有值"（非 NULL、非空字符串）
    pub fn is_present(&self) -> bool {
        match self {
            FieldValue::Null => false,
            FieldValue::Text(s) => !s.trim().is_empty(),
            _ => true,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(n) => Some(*n as f64),
            FieldValue::Decimal(n) | FieldValue::Percentage(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldValue::Integer(_) | FieldValue::Decimal(_) | FieldValue::Percentage(_)
        )
    }

    /// 从可选字符串构造文本值（空 → NULL）
    pub fn text_or_null(value: Option<String>) -> Self {
        match value {
            Some(s) if !s.trim().is_empty() => FieldValue::Text(s),
            _ => FieldValue::Null,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Decimal(n) => write!(f, "{}", n),
            FieldValue::Percentage(n) => write!(f, "{}%", n),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Null => write!(f, "null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_parse() {
        assert_eq!("School".parse::<EntityKind>().unwrap(), EntityKind::School);
        assert_eq!("mba".parse::<EntityKind>().unwrap(), EntityKind::School);
        assert_eq!(
            " scholarships ".parse::<EntityKind>().unwrap(),
            EntityKind::Scholarship
        );
        assert!("university".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_import_mode_upsert_alias() {
        assert_eq!("upsert".parse::<ImportMode>().unwrap(), ImportMode::Smart);
        assert!(ImportMode::Smart.allows_insert() && ImportMode::Smart.allows_update());
        assert!(!ImportMode::Insert.allows_update());
        assert!(!ImportMode::Update.allows_insert());
    }

    #[test]
    fn test_field_value_blank_vs_present() {
        assert!(FieldValue::Integer(0).is_blank());
        assert!(FieldValue::Integer(0).is_present());
        assert!(FieldValue::Text("  ".to_string()).is_blank());
        assert!(!FieldValue::Text("  ".to_string()).is_present());
        assert!(!FieldValue::Boolean(false).is_blank());
        assert!(!FieldValue::Null.is_present());
    }

    #[test]
    fn test_field_value_serializes_as_plain_json() {
        let json = serde_json::to_string(&vec![
            FieldValue::Text("a".to_string()),
            FieldValue::Integer(3),
            FieldValue::Boolean(true),
            FieldValue::Null,
        ])
        .unwrap();
        assert_eq!(json, r#"["a",3,true,null]"#);
    }
}
