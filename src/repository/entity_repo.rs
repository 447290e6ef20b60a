// ==========================================
// MBA 院校数据后台 - 实体仓储 Trait
// ==========================================
// 职责: 定义导入器依赖的三项存储操作（不包含实现）
// 红线: Repository 不含业务规则，只做数据读写
//       导入器不假设 SQL / 事务 / 具体存储引擎
// ==========================================

use crate::domain::entity::{CanonicalEntity, ExistingRecord, FieldDelta};
use crate::domain::types::EntityKind;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

/// 存储分配的主键
pub type StoredId = String;

// ==========================================
// EntityRepository Trait
// ==========================================
// 实现者: SqliteEntityRepository, InMemoryEntityRepository
#[async_trait]
pub trait EntityRepository: Send + Sync {
    /// 读取某类实体的全部记录（导入快照）
    ///
    /// # 参数
    /// - kind: 实体种类
    ///
    /// # 返回
    /// - Ok(Vec<ExistingRecord>): 时点快照
    async fn read_all(&self, kind: EntityKind) -> RepositoryResult<Vec<ExistingRecord>>;

    /// 批量插入
    ///
    /// # 参数
    /// - kind: 实体种类
    /// - entities: 待插入实体
    ///
    /// # 返回
    /// - Ok(Vec<StoredId>): 与输入顺序一致的主键
    /// - Err: 整批失败（单次调用内全有或全无）
    async fn insert_many(
        &self,
        kind: EntityKind,
        entities: &[CanonicalEntity],
    ) -> RepositoryResult<Vec<StoredId>>;

    /// 按主键应用字段增量
    ///
    /// # 返回
    /// - Err(NotFound): 主键不存在
    async fn update_by_id(
        &self,
        kind: EntityKind,
        id: &str,
        delta: &FieldDelta,
    ) -> RepositoryResult<()>;
}
