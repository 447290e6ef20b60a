// ==========================================
// MBA 院校数据后台 - 实体仓储内存实现
// ==========================================
// 用途: 测试与演练（不落盘）
// 特性: 可注入拒绝规则，模拟存储约束导致的整批失败
// ==========================================

use crate::domain::entity::{CanonicalEntity, ExistingRecord, FieldDelta};
use crate::domain::types::EntityKind;
use crate::importer::schema::schema_for;
use crate::repository::entity_repo::{EntityRepository, StoredId};
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

type RejectRule = Arc<dyn Fn(&CanonicalEntity) -> bool + Send + Sync>;

pub struct InMemoryEntityRepository {
    records: Mutex<HashMap<EntityKind, Vec<ExistingRecord>>>,
    reject_rule: Option<RejectRule>,
    fail_reads: bool,
    insert_calls: AtomicUsize,
    update_calls: AtomicUsize,
}

impl Default for InMemoryEntityRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEntityRepository {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            reject_rule: None,
            fail_reads: false,
            insert_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
        }
    }

    /// 任何包含命中实体的 insert_many 调用整体失败
    pub fn with_rejection<F>(mut self, rule: F) -> Self
    where
        F: Fn(&CanonicalEntity) -> bool + Send + Sync + 'static,
    {
        self.reject_rule = Some(Arc::new(rule));
        self
    }

    /// read_all 总是失败（快照不可用）
    pub fn with_failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    fn get_records(&self) -> RepositoryResult<MutexGuard<'_, HashMap<EntityKind, Vec<ExistingRecord>>>> {
        self.records
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 当前存储内容（按插入顺序）
    pub fn records(&self, kind: EntityKind) -> RepositoryResult<Vec<ExistingRecord>> {
        Ok(self.get_records()?.get(&kind).cloned().unwrap_or_default())
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntityRepository for InMemoryEntityRepository {
    async fn read_all(&self, kind: EntityKind) -> RepositoryResult<Vec<ExistingRecord>> {
        if self.fail_reads {
            return Err(RepositoryError::DatabaseConnectionError(
                "snapshot unavailable".to_string(),
            ));
        }
        self.records(kind)
    }

    async fn insert_many(
        &self,
        kind: EntityKind,
        entities: &[CanonicalEntity],
    ) -> RepositoryResult<Vec<StoredId>> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(rule) = &self.reject_rule {
            if let Some(rejected) = entities.iter().find(|e| rule.as_ref()(*e)) {
                return Err(RepositoryError::ValidationError(format!(
                    "rejected by store constraint: {}",
                    rejected.display_name()
                )));
            }
        }

        let now = Utc::now();
        let mut store = self.get_records()?;
        let bucket = store.entry(kind).or_default();
        let mut ids = Vec::with_capacity(entities.len());
        for entity in entities {
            let id = Uuid::new_v4().to_string();
            bucket.push(ExistingRecord {
                id: id.clone(),
                entity: entity.clone(),
                created_at: Some(now),
            });
            ids.push(id);
        }

        debug!(kind = %kind, count = ids.len(), "内存批量插入完成");
        Ok(ids)
    }

    async fn update_by_id(
        &self,
        kind: EntityKind,
        id: &str,
        delta: &FieldDelta,
    ) -> RepositoryResult<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);

        let schema = schema_for(kind);
        if let Some(unknown) = delta.field_names().into_iter().find(|f| schema.field(f).is_none()) {
            return Err(RepositoryError::FieldValueError {
                field: unknown.to_string(),
                message: format!("{} 不包含该字段", kind.collection()),
            });
        }

        let mut store = self.get_records()?;
        let record = store
            .get_mut(&kind)
            .and_then(|bucket| bucket.iter_mut().find(|r| r.id == id))
            .ok_or_else(|| RepositoryError::NotFound {
                entity: kind.collection().to_string(),
                id: id.to_string(),
            })?;

        record.entity.apply(delta);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::RawRow;
    use crate::domain::types::FieldValue;
    use crate::importer::field_mapper::FieldMapper;

    fn school(name: &str) -> CanonicalEntity {
        FieldMapper.map_row(EntityKind::School, &RawRow::new(2).with_cell("name", name))
    }

    #[tokio::test]
    async fn test_rejection_rule_fails_whole_call() {
        let repo = InMemoryEntityRepository::new().with_rejection(|e| e.text("name") == Some("Bad"));

        let result = repo
            .insert_many(EntityKind::School, &[school("Good"), school("Bad")])
            .await;
        assert!(result.is_err());
        assert!(repo.records(EntityKind::School).unwrap().is_empty());

        repo.insert_many(EntityKind::School, &[school("Good")]).await.unwrap();
        assert_eq!(repo.records(EntityKind::School).unwrap().len(), 1);
        assert_eq!(repo.insert_calls(), 2);
    }

    #[tokio::test]
    async fn test_update_merges_delta_into_record() {
        let repo = InMemoryEntityRepository::new();
        let ids = repo.insert_many(EntityKind::School, &[school("Tuck")]).await.unwrap();

        let mut delta = FieldDelta::new();
        delta.insert("class_size", FieldValue::Integer(290));
        repo.update_by_id(EntityKind::School, &ids[0], &delta).await.unwrap();

        let records = repo.read_all(EntityKind::School).await.unwrap();
        assert_eq!(records[0].entity.get("class_size"), &FieldValue::Integer(290));
        assert_eq!(records[0].entity.text("name"), Some("Tuck"));

        let err = repo.update_by_id(EntityKind::School, "nope", &delta).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_failing_reads() {
        let repo = InMemoryEntityRepository::new().with_failing_reads();
        assert!(repo.read_all(EntityKind::Scholarship).await.is_err());
    }
}
