// ==========================================
// MBA 院校数据后台 - 导入结果模型
// ==========================================
// 职责: 行级结果 / 问题清单 / 汇总计数
// 约束: 每个数据行恰好对应一个 RowOutcome
//       total_rows == inserted + updated + skipped + failed
// ==========================================

use crate::domain::entity::FieldDelta;
use crate::domain::types::EntityKind;
use serde::Serialize;
use std::fmt;

// ==========================================
// IssueKind - 问题种类
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    FileParse,     // 文件无法解析（致命）
    SnapshotRead,  // 现有记录快照读取失败（致命）
    RowValidation, // 行校验失败（行被排除）
    RowProcessing, // 行处理异常（行被排除）
    Write,         // 写入失败（行标记失败）
    Notice,        // 提示信息（非失败）
}

impl IssueKind {
    /// 是否终止整次导入
    pub fn is_fatal(&self) -> bool {
        matches!(self, IssueKind::FileParse | IssueKind::SnapshotRead)
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IssueKind::FileParse => "FILE_PARSE",
            IssueKind::SnapshotRead => "SNAPSHOT_READ",
            IssueKind::RowValidation => "ROW_VALIDATION",
            IssueKind::RowProcessing => "ROW_PROCESSING",
            IssueKind::Write => "WRITE",
            IssueKind::Notice => "NOTICE",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Error,
    Warning,
}

// ==========================================
// ImportIssue - 问题条目
// ==========================================
// 展示格式: Row <n>: [<field>] <message>
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportIssue {
    pub row: usize,
    pub field: Option<String>,
    pub kind: IssueKind,
    pub severity: IssueSeverity,
    pub message: String,
}

impl ImportIssue {
    pub fn error(row: usize, field: Option<&str>, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            row,
            field: field.map(|f| f.to_string()),
            kind,
            severity: IssueSeverity::Error,
            message: message.into(),
        }
    }

    pub fn notice(row: usize, field: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            row,
            field: field.map(|f| f.to_string()),
            kind: IssueKind::Notice,
            severity: IssueSeverity::Warning,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == IssueSeverity::Error
    }
}

impl fmt::Display for ImportIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "Row {}: [{}] {}", self.row, field, self.message),
            None => write!(f, "Row {}: {}", self.row, self.message),
        }
    }
}

// ==========================================
// RowOutcome - 行级结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoChanges,    // 合并增量为空
    ModeExcluded, // 被导入模式排除
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowOutcome {
    /// 新增（仅校验模式下 id 为 None）
    Inserted { id: Option<String> },
    /// 按增量更新
    Updated { id: Option<String>, delta: FieldDelta },
    Skipped { reason: SkipReason },
    Failed { kind: IssueKind, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowReport {
    pub row: usize,
    pub identity: Option<String>,
    pub outcome: RowOutcome,
}

// ==========================================
// ImportResult - 导入结果汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportResult {
    pub run_id: String,
    pub kind: EntityKind,
    pub validate_only: bool,

    // ===== 结论 =====
    pub success: bool, // 当且仅当 errors 为空

    // ===== 计数 =====
    pub total_rows: usize,
    pub processed_rows: usize, // 进入写入计划的行（新增 + 有增量的更新）
    pub inserted_rows: usize,
    pub updated_rows: usize,
    pub skipped_rows: usize,
    pub failed_rows: usize,

    // ===== 明细（按行号排序）=====
    pub errors: Vec<ImportIssue>,
    pub warnings: Vec<ImportIssue>,
    pub outcomes: Vec<RowReport>,

    pub summary: String,
    pub elapsed_ms: u64,
}

impl ImportResult {
    /// 由行级结果与问题清单汇总
    ///
    /// # 参数
    /// - outcomes: 每个数据行一条
    /// - issues: 所有问题（错误与提示混合，内部按行号稳定排序后拆分）
    /// - processed_rows: 进入写入计划的行数
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        run_id: String,
        kind: EntityKind,
        validate_only: bool,
        mut outcomes: Vec<RowReport>,
        mut issues: Vec<ImportIssue>,
        processed_rows: usize,
        summary: String,
        elapsed_ms: u64,
    ) -> Self {
        outcomes.sort_by_key(|o| o.row);
        issues.sort_by_key(|i| i.row);
        let (errors, warnings): (Vec<_>, Vec<_>) = issues.into_iter().partition(|i| i.is_error());

        let mut inserted_rows = 0;
        let mut updated_rows = 0;
        let mut skipped_rows = 0;
        let mut failed_rows = 0;
        for report in &outcomes {
            match report.outcome {
                RowOutcome::Inserted { .. } => inserted_rows += 1,
                RowOutcome::Updated { .. } => updated_rows += 1,
                RowOutcome::Skipped { .. } => skipped_rows += 1,
                RowOutcome::Failed { .. } => failed_rows += 1,
            }
        }

        Self {
            run_id,
            kind,
            validate_only,
            success: errors.is_empty(),
            total_rows: outcomes.len(),
            processed_rows,
            inserted_rows,
            updated_rows,
            skipped_rows,
            failed_rows,
            errors,
            warnings,
            outcomes,
            summary,
            elapsed_ms,
        }
    }

    /// 计数是否对账平衡
    pub fn is_reconciled(&self) -> bool {
        self.total_rows
            == self.inserted_rows + self.updated_rows + self.skipped_rows + self.failed_rows
    }

    /// 指定行的问题（错误与提示）
    pub fn issues_for_row(&self, row: usize) -> Vec<&ImportIssue> {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .filter(|i| i.row == row)
            .collect()
    }

    /// 指定行的结果
    pub fn outcome_for_row(&self, row: usize) -> Option<&RowOutcome> {
        self.outcomes.iter().find(|o| o.row == row).map(|o| &o.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(row: usize, outcome: RowOutcome) -> RowReport {
        RowReport {
            row,
            identity: None,
            outcome,
        }
    }

    #[test]
    fn test_issue_display_with_and_without_field() {
        let with_field = ImportIssue::error(3, Some("name"), IssueKind::RowValidation, "is required");
        assert_eq!(with_field.to_string(), "Row 3: [name] is required");

        let without = ImportIssue::notice(4, None, "No changes needed");
        assert_eq!(without.to_string(), "Row 4: No changes needed");
        assert!(!without.is_error());
    }

    #[test]
    fn test_assemble_counts_and_orders_issues() {
        let outcomes = vec![
            report(3, RowOutcome::Skipped { reason: SkipReason::NoChanges }),
            report(2, RowOutcome::Inserted { id: Some("a".into()) }),
            report(
                4,
                RowOutcome::Failed {
                    kind: IssueKind::RowValidation,
                    message: "name is required".into(),
                },
            ),
        ];
        let issues = vec![
            ImportIssue::error(4, Some("name"), IssueKind::RowValidation, "required"),
            ImportIssue::notice(3, None, "no changes"),
        ];

        let result = ImportResult::assemble(
            "run".into(),
            EntityKind::School,
            false,
            outcomes,
            issues,
            1,
            String::new(),
            0,
        );

        assert_eq!(result.total_rows, 3);
        assert_eq!(result.inserted_rows, 1);
        assert_eq!(result.skipped_rows, 1);
        assert_eq!(result.failed_rows, 1);
        assert!(!result.success);
        assert!(result.is_reconciled());
        assert_eq!(result.outcomes[0].row, 2);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_success_with_warnings_only() {
        let result = ImportResult::assemble(
            "run".into(),
            EntityKind::Scholarship,
            true,
            vec![report(2, RowOutcome::Skipped { reason: SkipReason::ModeExcluded })],
            vec![ImportIssue::notice(2, None, "skipped")],
            0,
            String::new(),
            0,
        );
        assert!(result.success);
        assert_eq!(result.inserted_rows + result.updated_rows, 0);
    }
}
