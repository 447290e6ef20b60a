// ==========================================
// MBA 院校数据后台 - 导入协调器
// ==========================================
// 职责: 串联整条导入管道
// 流程: 解析 → 读取快照 → 映射/校验/身份键 → 分区（新增/更新/跳过/错误）
//       → （演练直接汇总 | 批量写入）→ 汇总结果
// 约束: 单次运行严格顺序执行、单遍处理，不回溯
//       只有文件解析失败与快照读取失败会提前结束运行
// ==========================================

use crate::config::ImportConfig;
use crate::domain::entity::{CanonicalEntity, IdentityKey, RawRow};
use crate::domain::import_result::{
    ImportIssue, ImportResult, IssueKind, RowOutcome, RowReport, SkipReason,
};
use crate::domain::types::EntityKind;
use crate::i18n::t_with_args;
use crate::importer::batch_writer::{BatchWriter, InsertPlan, UpdatePlan, UpdateTarget, WriteStatus};
use crate::importer::error::ImportOpResult;
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::identity::{identity_fields, identity_key};
use crate::importer::importer_trait::EntityImporter;
use crate::importer::merge_engine::{drop_spelling_variants, merge_with_pending};
use crate::importer::report::summary_line;
use crate::repository::EntityRepository;
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

// ==========================================
// 规划阶段的已知实体
// ==========================================
// 快照记录与同文件内先出现的新行共用一张表；
// committed 为已落库状态（本文件新出现的身份键为空实体），
// entity 为投影状态（已叠加本次运行中先前计划的增量）
struct KnownEntity {
    target: UpdateTarget,
    committed: CanonicalEntity,
    entity: CanonicalEntity,
    /// 同文件内首次出现的行号（快照记录为 None）
    origin_row: Option<usize>,
}

/// 分区结果
#[derive(Default)]
struct Partition {
    inserts: Vec<InsertPlan>,
    updates: Vec<UpdatePlan>,
    outcomes: Vec<RowReport>,
    issues: Vec<ImportIssue>,
}

impl Partition {
    fn finish_row(&mut self, row: usize, identity: Option<&IdentityKey>, outcome: RowOutcome) {
        self.outcomes.push(RowReport {
            row,
            identity: identity.map(|k| k.to_string()),
            outcome,
        });
    }
}

// ==========================================
// ImportCoordinator
// ==========================================
pub struct ImportCoordinator {
    repo: Arc<dyn EntityRepository>,
    parser: UniversalFileParser,
    mapper: FieldMapper,
}

impl ImportCoordinator {
    /// 创建协调器
    ///
    /// # 参数
    /// - repo: 实体仓储（可在多个并发运行之间共享）
    pub fn new(repo: Arc<dyn EntityRepository>) -> Self {
        Self {
            repo,
            parser: UniversalFileParser,
            mapper: FieldMapper,
        }
    }

    pub fn repository(&self) -> &Arc<dyn EntityRepository> {
        &self.repo
    }

    /// 对已解析的原始行执行导入
    pub async fn run_rows(&self, rows: Vec<RawRow>, config: &ImportConfig) -> ImportResult {
        self.run_parsed(Uuid::new_v4().to_string(), Ok(rows), config).await
    }

    #[instrument(skip(self, run_id, parsed, config), fields(run_id = %run_id, kind = %config.kind))]
    async fn run_parsed(
        &self,
        run_id: String,
        parsed: ImportOpResult<Vec<RawRow>>,
        config: &ImportConfig,
    ) -> ImportResult {
        let started = Instant::now();
        let kind = config.kind;

        // === 阶段 1: 解析 ===
        let rows = match parsed {
            Ok(rows) => rows,
            Err(e) => {
                error!(error = %e, "文件解析失败");
                let issue = ImportIssue::error(
                    1,
                    Some("file"),
                    IssueKind::FileParse,
                    t_with_args("import.file_error", &[("error", e.to_string().as_str())]),
                );
                return Self::fatal(run_id, config, issue, started);
            }
        };
        info!(rows = rows.len(), "文件解析完成");

        // === 阶段 2: 读取现有记录快照（每次运行一次）===
        let snapshot = match self.repo.read_all(kind).await {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "现有记录快照读取失败");
                let issue = ImportIssue::error(
                    1,
                    Some("repository"),
                    IssueKind::SnapshotRead,
                    t_with_args("import.snapshot_error", &[("error", e.to_string().as_str())]),
                );
                return Self::fatal(run_id, config, issue, started);
            }
        };

        let mut known: HashMap<IdentityKey, KnownEntity> = HashMap::with_capacity(snapshot.len());
        for record in snapshot {
            let key = identity_key(kind, &record.entity);
            // 快照中身份键重复时以第一条为准
            known.entry(key).or_insert(KnownEntity {
                target: UpdateTarget::Stored(record.id),
                committed: record.entity.clone(),
                entity: record.entity,
                origin_row: None,
            });
        }
        debug!(existing = known.len(), "快照索引完成");

        // === 阶段 3: 映射 / 校验 / 身份键 / 分区 ===
        let mut partition = self.partition(kind, rows, &mut known, config);
        let processed_rows = partition.inserts.len() + partition.updates.len();
        info!(
            new = partition.inserts.len(),
            updates = processed_rows - partition.inserts.len(),
            excluded = partition.outcomes.len(),
            "分区完成"
        );

        // === 阶段 4: 写入 / 演练 ===
        if config.validate_only {
            for plan in &partition.inserts {
                partition.outcomes.push(RowReport {
                    row: plan.row,
                    identity: Some(identity_key(kind, &plan.entity).to_string()),
                    outcome: RowOutcome::Inserted { id: None },
                });
            }
            for plan in &partition.updates {
                let id = match &plan.target {
                    UpdateTarget::Stored(id) => Some(id.clone()),
                    UpdateTarget::Pending(_) => None,
                };
                partition.outcomes.push(RowReport {
                    row: plan.row,
                    identity: None,
                    outcome: RowOutcome::Updated {
                        id,
                        delta: plan.delta.clone(),
                    },
                });
            }
        } else {
            self.write(kind, config, &mut partition).await;
        }

        // === 阶段 5: 汇总 ===
        let mut result = ImportResult::assemble(
            run_id,
            kind,
            config.validate_only,
            partition.outcomes,
            partition.issues,
            processed_rows,
            String::new(),
            started.elapsed().as_millis() as u64,
        );
        result.summary = summary_line(&result);

        info!(
            success = result.success,
            inserted = result.inserted_rows,
            updated = result.updated_rows,
            skipped = result.skipped_rows,
            failed = result.failed_rows,
            elapsed_ms = result.elapsed_ms,
            "导入完成"
        );
        result
    }

    /// 逐行映射并分区（按输入顺序，单遍）
    fn partition(
        &self,
        kind: EntityKind,
        rows: Vec<RawRow>,
        known: &mut HashMap<IdentityKey, KnownEntity>,
        config: &ImportConfig,
    ) -> Partition {
        let mut part = Partition::default();
        let noun = kind.noun();

        for raw in rows {
            let row = raw.row_number;

            if let Some(issue) = self.mapper.check_row_shape(&raw) {
                part.finish_row(
                    row,
                    None,
                    RowOutcome::Failed {
                        kind: issue.kind,
                        message: issue.message.clone(),
                    },
                );
                part.issues.push(issue);
                continue;
            }

            let entity = self.mapper.map_row(kind, &raw);
            let violations = self.mapper.validate(&entity, row);
            if let Some(first) = violations.first() {
                debug!(row, violations = violations.len(), "行校验失败");
                part.finish_row(
                    row,
                    None,
                    RowOutcome::Failed {
                        kind: IssueKind::RowValidation,
                        message: first.message.clone(),
                    },
                );
                part.issues.extend(violations);
                continue;
            }

            let key = identity_key(kind, &entity);
            let name = entity.display_name().to_string();

            match known.get_mut(&key) {
                Some(existing) => {
                    if !config.mode.allows_update() {
                        part.issues.push(ImportIssue::notice(
                            row,
                            None,
                            t_with_args(
                                "import.skipped_insert_only",
                                &[("noun", noun), ("name", name.as_str())],
                            ),
                        ));
                        part.finish_row(
                            row,
                            Some(&key),
                            RowOutcome::Skipped {
                                reason: SkipReason::ModeExcluded,
                            },
                        );
                        continue;
                    }

                    let mut delta = merge_with_pending(
                        &existing.committed,
                        &existing.entity,
                        &entity,
                        config.merge_policy,
                    );
                    let origin = existing.origin_row.map(|r| r.to_string());
                    // 同文件重复行：身份字段与拼写沿用首次出现时的写法
                    if origin.is_some() {
                        for field in identity_fields(kind) {
                            delta.remove(field);
                        }
                        drop_spelling_variants(&mut delta, &existing.entity);
                    }

                    if delta.is_empty() {
                        let message = match &origin {
                            Some(origin) => t_with_args(
                                "import.duplicate_no_changes",
                                &[("row", origin.as_str()), ("name", name.as_str())],
                            ),
                            None => t_with_args(
                                "import.no_changes",
                                &[("noun", noun), ("name", name.as_str())],
                            ),
                        };
                        part.issues.push(ImportIssue::notice(row, None, message));
                        part.finish_row(
                            row,
                            Some(&key),
                            RowOutcome::Skipped {
                                reason: SkipReason::NoChanges,
                            },
                        );
                        continue;
                    }

                    let fields = delta.field_names().join(", ");
                    let message = match &origin {
                        Some(origin) => t_with_args(
                            "import.duplicate_will_merge",
                            &[("row", origin.as_str()), ("name", name.as_str()), ("fields", fields.as_str())],
                        ),
                        None => t_with_args(
                            "import.will_update",
                            &[("noun", noun), ("name", name.as_str()), ("fields", fields.as_str())],
                        ),
                    };
                    part.issues.push(ImportIssue::notice(row, None, message));

                    existing.entity.apply(&delta);
                    part.updates.push(UpdatePlan {
                        row,
                        name,
                        target: existing.target.clone(),
                        delta,
                    });
                }
                None => {
                    if !config.mode.allows_insert() {
                        part.issues.push(ImportIssue::notice(
                            row,
                            None,
                            t_with_args(
                                "import.skipped_update_only",
                                &[("noun", noun), ("name", name.as_str())],
                            ),
                        ));
                        part.finish_row(
                            row,
                            Some(&key),
                            RowOutcome::Skipped {
                                reason: SkipReason::ModeExcluded,
                            },
                        );
                        continue;
                    }

                    let idx = part.inserts.len();
                    part.inserts.push(InsertPlan {
                        row,
                        entity: entity.clone(),
                    });
                    known.insert(
                        key,
                        KnownEntity {
                            target: UpdateTarget::Pending(idx),
                            committed: CanonicalEntity::new(kind),
                            entity,
                            origin_row: Some(row),
                        },
                    );
                }
            }
        }

        part
    }

    /// 执行写入并把写入状态转为行级结果
    async fn write(&self, kind: EntityKind, config: &ImportConfig, part: &mut Partition) {
        let writer = BatchWriter::new(self.repo.as_ref(), config.batch_size);

        let inserted = writer.insert_new(kind, &part.inserts).await;
        for (plan, status) in part.inserts.iter().zip(&inserted.statuses) {
            let outcome = match status {
                WriteStatus::Written(id) => RowOutcome::Inserted {
                    id: Some(id.clone()),
                },
                WriteStatus::Failed(message) => RowOutcome::Failed {
                    kind: IssueKind::Write,
                    message: message.clone(),
                },
            };
            part.outcomes.push(RowReport {
                row: plan.row,
                identity: Some(identity_key(kind, &plan.entity).to_string()),
                outcome,
            });
        }

        let updated = writer
            .apply_updates(kind, &part.updates, &inserted.statuses)
            .await;
        for (plan, status) in part.updates.iter().zip(&updated.statuses) {
            let outcome = match status {
                WriteStatus::Written(id) => RowOutcome::Updated {
                    id: Some(id.clone()),
                    delta: plan.delta.clone(),
                },
                WriteStatus::Failed(message) => RowOutcome::Failed {
                    kind: IssueKind::Write,
                    message: message.clone(),
                },
            };
            part.outcomes.push(RowReport {
                row: plan.row,
                identity: None,
                outcome,
            });
        }

        part.issues.extend(inserted.issues);
        part.issues.extend(updated.issues);
    }

    /// 致命错误：零行处理，单条错误
    fn fatal(run_id: String, config: &ImportConfig, issue: ImportIssue, started: Instant) -> ImportResult {
        let mut result = ImportResult::assemble(
            run_id,
            config.kind,
            config.validate_only,
            Vec::new(),
            vec![issue],
            0,
            String::new(),
            started.elapsed().as_millis() as u64,
        );
        result.summary = summary_line(&result);
        result
    }
}

#[async_trait]
impl EntityImporter for ImportCoordinator {
    async fn import_file(&self, file_path: &Path, config: &ImportConfig) -> ImportResult {
        let run_id = Uuid::new_v4().to_string();
        info!(run_id = %run_id, file = %file_path.display(), "开始导入");
        let parsed = self.parser.parse(file_path);
        self.run_parsed(run_id, parsed, config).await
    }

    async fn import_bytes(&self, file_name: &str, bytes: &[u8], config: &ImportConfig) -> ImportResult {
        let run_id = Uuid::new_v4().to_string();
        info!(run_id = %run_id, file = %file_name, size = bytes.len(), "开始导入上传内容");
        let parsed = self.parser.parse_bytes(file_name, bytes);
        self.run_parsed(run_id, parsed, config).await
    }

    async fn run_many(&self, jobs: Vec<(PathBuf, ImportConfig)>) -> Vec<ImportResult> {
        info!(jobs = jobs.len(), "并发执行独立导入");
        let runs = jobs
            .iter()
            .map(|(path, config)| self.import_file(path.as_path(), config));
        join_all(runs).await
    }
}
