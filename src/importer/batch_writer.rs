// ==========================================
// MBA 院校数据后台 - 批量写入器
// ==========================================
// 职责: 将新增/更新计划写入仓储
// 规则:
// - 新增按固定批大小分批；整批失败时逐行重试该批成员，
//   单行失败记为行级错误，成功照常计数
// - 更新逐条执行，单条失败不影响后续
// 红线: 除"批 → 逐行"这一次降级外不做任何自动重试
// ==========================================

use crate::domain::entity::{CanonicalEntity, FieldDelta};
use crate::domain::import_result::{ImportIssue, IssueKind};
use crate::domain::types::EntityKind;
use crate::i18n::t_with_args;
use crate::repository::{EntityRepository, StoredId};
use tracing::{debug, info, warn};

// ==========================================
// 写入计划
// ==========================================

/// 新增计划（一行一条）
#[derive(Debug, Clone)]
pub struct InsertPlan {
    pub row: usize,
    pub entity: CanonicalEntity,
}

/// 更新目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateTarget {
    /// 已存储记录
    Stored(StoredId),
    /// 同文件内先出现、本次新增的行（新增计划下标），写入后才有主键
    Pending(usize),
}

/// 更新计划
#[derive(Debug, Clone)]
pub struct UpdatePlan {
    pub row: usize,
    pub name: String,
    pub target: UpdateTarget,
    pub delta: FieldDelta,
}

/// 单条计划的写入状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteStatus {
    Written(StoredId),
    Failed(String),
}

impl WriteStatus {
    pub fn stored_id(&self) -> Option<&str> {
        match self {
            WriteStatus::Written(id) => Some(id.as_str()),
            WriteStatus::Failed(_) => None,
        }
    }
}

/// 写入汇总（statuses 与计划一一对应）
#[derive(Debug, Default)]
pub struct WriteOutcome {
    pub statuses: Vec<WriteStatus>,
    pub succeeded: usize,
    pub issues: Vec<ImportIssue>,
}

impl WriteOutcome {
    fn record_success(&mut self, id: StoredId) {
        self.statuses.push(WriteStatus::Written(id));
        self.succeeded += 1;
    }

    fn record_failure(&mut self, row: usize, message: String) {
        self.issues
            .push(ImportIssue::error(row, None, IssueKind::Write, message.clone()));
        self.statuses.push(WriteStatus::Failed(message));
    }
}

// ==========================================
// BatchWriter
// ==========================================
pub struct BatchWriter<'a> {
    repo: &'a dyn EntityRepository,
    batch_size: usize,
}

impl<'a> BatchWriter<'a> {
    /// # 参数
    /// - repo: 实体仓储
    /// - batch_size: 批大小（0 按 1 处理）
    pub fn new(repo: &'a dyn EntityRepository, batch_size: usize) -> Self {
        Self {
            repo,
            batch_size: batch_size.max(1),
        }
    }

    /// 分批新增
    pub async fn insert_new(&self, kind: EntityKind, plans: &[InsertPlan]) -> WriteOutcome {
        let mut outcome = WriteOutcome::default();

        for (batch_idx, chunk) in plans.chunks(self.batch_size).enumerate() {
            let entities: Vec<CanonicalEntity> = chunk.iter().map(|p| p.entity.clone()).collect();

            match self.repo.insert_many(kind, &entities).await {
                Ok(ids) if ids.len() == chunk.len() => {
                    debug!(batch = batch_idx + 1, size = chunk.len(), "批量插入成功");
                    for id in ids {
                        outcome.record_success(id);
                    }
                }
                Ok(ids) => {
                    warn!(
                        batch = batch_idx + 1,
                        expected = chunk.len(),
                        returned = ids.len(),
                        "仓储返回的主键数量与批大小不一致"
                    );
                    let mut ids = ids.into_iter();
                    for plan in chunk {
                        match ids.next() {
                            Some(id) => outcome.record_success(id),
                            None => outcome.record_failure(
                                plan.row,
                                insert_failed_message(&plan.entity, "no id returned"),
                            ),
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        batch = batch_idx + 1,
                        size = chunk.len(),
                        error = %e,
                        "批量插入失败，降级为逐行插入"
                    );
                    self.insert_individually(kind, chunk, &mut outcome).await;
                }
            }
        }

        info!(
            kind = %kind,
            planned = plans.len(),
            inserted = outcome.succeeded,
            failed = outcome.issues.len(),
            "新增写入完成"
        );
        outcome
    }

    async fn insert_individually(&self, kind: EntityKind, chunk: &[InsertPlan], outcome: &mut WriteOutcome) {
        for plan in chunk {
            match self
                .repo
                .insert_many(kind, std::slice::from_ref(&plan.entity))
                .await
            {
                Ok(mut ids) if ids.len() == 1 => outcome.record_success(ids.remove(0)),
                Ok(_) => outcome.record_failure(
                    plan.row,
                    insert_failed_message(&plan.entity, "no id returned"),
                ),
                Err(e) => {
                    warn!(row = plan.row, error = %e, "单行插入失败");
                    outcome.record_failure(
                        plan.row,
                        insert_failed_message(&plan.entity, &e.to_string()),
                    );
                }
            }
        }
    }

    /// 逐条更新
    ///
    /// # 参数
    /// - plans: 更新计划
    /// - inserted: 新增写入状态（用于解析 Pending 目标）
    pub async fn apply_updates(
        &self,
        kind: EntityKind,
        plans: &[UpdatePlan],
        inserted: &[WriteStatus],
    ) -> WriteOutcome {
        let mut outcome = WriteOutcome::default();

        for plan in plans {
            let target_id = match &plan.target {
                UpdateTarget::Stored(id) => id.clone(),
                UpdateTarget::Pending(idx) => {
                    match inserted.get(*idx).and_then(|s| s.stored_id()) {
                        Some(id) => id.to_string(),
                        None => {
                            outcome.record_failure(
                                plan.row,
                                t_with_args("import.pending_target_failed", &[("name", plan.name.as_str())]),
                            );
                            continue;
                        }
                    }
                }
            };

            match self.repo.update_by_id(kind, &target_id, &plan.delta).await {
                Ok(()) => outcome.record_success(target_id),
                Err(e) => {
                    warn!(row = plan.row, id = %target_id, error = %e, "更新失败");
                    outcome.record_failure(
                        plan.row,
                        t_with_args(
                            "import.update_failed",
                            &[("name", plan.name.as_str()), ("error", e.to_string().as_str())],
                        ),
                    );
                }
            }
        }

        info!(
            kind = %kind,
            planned = plans.len(),
            updated = outcome.succeeded,
            failed = outcome.issues.len(),
            "更新写入完成"
        );
        outcome
    }
}

fn insert_failed_message(entity: &CanonicalEntity, error: &str) -> String {
    t_with_args(
        "import.insert_failed",
        &[("name", entity.display_name()), ("error", error)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::RawRow;
    use crate::domain::types::FieldValue;
    use crate::importer::field_mapper::FieldMapper;
    use crate::repository::InMemoryEntityRepository;

    fn plan(row: usize, name: &str) -> InsertPlan {
        InsertPlan {
            row,
            entity: FieldMapper.map_row(EntityKind::School, &RawRow::new(row).with_cell("name", name)),
        }
    }

    #[tokio::test]
    async fn test_one_bad_row_in_batch_of_ten() {
        let repo = InMemoryEntityRepository::new().with_rejection(|e| e.text("name") == Some("School 6"));
        let writer = BatchWriter::new(&repo, 10);
        let plans: Vec<_> = (1..=10).map(|i| plan(i + 1, &format!("School {}", i))).collect();

        let outcome = writer.insert_new(EntityKind::School, &plans).await;

        assert_eq!(outcome.succeeded, 9);
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].row, 7);
        assert_eq!(outcome.issues[0].kind, IssueKind::Write);
        assert_eq!(outcome.statuses.len(), 10);
        assert!(outcome.statuses[5].stored_id().is_none());
        assert_eq!(repo.records(EntityKind::School).unwrap().len(), 9);
        // 1 次整批 + 10 次逐行
        assert_eq!(repo.insert_calls(), 11);
    }

    #[tokio::test]
    async fn test_failure_only_degrades_its_own_batch() {
        let repo = InMemoryEntityRepository::new().with_rejection(|e| e.text("name") == Some("School 2"));
        let writer = BatchWriter::new(&repo, 2);
        let plans: Vec<_> = (1..=4).map(|i| plan(i + 1, &format!("School {}", i))).collect();

        let outcome = writer.insert_new(EntityKind::School, &plans).await;

        assert_eq!(outcome.succeeded, 3);
        // 批 1 失败（1 次）+ 逐行 2 次 + 批 2（1 次）
        assert_eq!(repo.insert_calls(), 4);
    }

    #[tokio::test]
    async fn test_updates_continue_after_failure() {
        let repo = InMemoryEntityRepository::new();
        let inserted = BatchWriter::new(&repo, 10)
            .insert_new(EntityKind::School, &[plan(2, "Ross"), plan(3, "Fuqua")])
            .await;

        let mut delta = FieldDelta::new();
        delta.insert("class_size", FieldValue::Integer(400));
        let updates = vec![
            UpdatePlan {
                row: 4,
                name: "Ghost".into(),
                target: UpdateTarget::Stored("missing-id".into()),
                delta: delta.clone(),
            },
            UpdatePlan {
                row: 5,
                name: "Fuqua".into(),
                target: UpdateTarget::Pending(1),
                delta,
            },
        ];

        let outcome = BatchWriter::new(&repo, 10)
            .apply_updates(EntityKind::School, &updates, &inserted.statuses)
            .await;

        assert_eq!(outcome.succeeded, 1);
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].row, 4);
        let records = repo.records(EntityKind::School).unwrap();
        let fuqua = records.iter().find(|r| r.entity.text("name") == Some("Fuqua")).unwrap();
        assert_eq!(fuqua.entity.get("class_size"), &FieldValue::Integer(400));
    }

    #[tokio::test]
    async fn test_pending_target_of_failed_insert_is_write_error() {
        let repo = InMemoryEntityRepository::new();
        let statuses = vec![WriteStatus::Failed("boom".into())];
        let updates = vec![UpdatePlan {
            row: 3,
            name: "Acme".into(),
            target: UpdateTarget::Pending(0),
            delta: FieldDelta::new(),
        }];

        let outcome = BatchWriter::new(&repo, 10)
            .apply_updates(EntityKind::School, &updates, &statuses)
            .await;

        assert_eq!(outcome.succeeded, 0);
        assert_eq!(outcome.issues[0].kind, IssueKind::Write);
        assert_eq!(repo.update_calls(), 0);
    }
}
