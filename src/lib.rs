// ==========================================
// MBA 院校数据后台 - 智能导入核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 运营人员触发的离线批量导入（院校 / 奖学金）
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 对账式导入管道
pub mod importer;

// 配置层 - 导入配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/实体表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 后台管理界面入口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{EntityKind, FieldValue, ImportMode, MergePolicy};

// 领域实体
pub use domain::{
    CanonicalEntity, ExistingRecord, FieldDelta, IdentityKey, ImportIssue, ImportResult,
    IssueKind, RawRow, RowOutcome,
};

// 导入
pub use importer::{EntityImporter, ImportCoordinator};

// 配置
pub use config::ImportConfig;

// API
pub use api::ImportApi;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "smart-import";
