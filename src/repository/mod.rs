// ==========================================
// MBA 院校数据后台 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供实体读写接口，屏蔽存储细节
// 约束: 所有查询使用参数化，防止 SQL 注入
// ==========================================

pub mod entity_repo;
pub mod entity_repo_impl;
pub mod error;
pub mod in_memory_repo;

// 重导出核心仓储
pub use entity_repo::{EntityRepository, StoredId};
pub use entity_repo_impl::SqliteEntityRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use in_memory_repo::InMemoryEntityRepository;
