// ==========================================
// MBA 院校数据后台 - 领域模型层
// ==========================================
// 职责: 定义导入实体、类型、结果模型
// 红线: 不含数据访问逻辑，不含导入流程逻辑
// ==========================================

pub mod entity;
pub mod import_result;
pub mod types;

// 重导出核心类型
pub use entity::{CanonicalEntity, ExistingRecord, FieldDelta, IdentityKey, RawRow};
pub use import_result::{
    ImportIssue, ImportResult, IssueKind, IssueSeverity, RowOutcome, RowReport, SkipReason,
};
pub use types::{EntityKind, FieldType, FieldValue, ImportMode, MergePolicy};
