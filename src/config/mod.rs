// ==========================================
// MBA 院校数据后台 - 配置层
// ==========================================
// 职责: 导入运行配置 / 数据库位置
// ==========================================

pub mod import_config;

pub use import_config::{default_db_path, ImportConfig, DB_PATH_ENV, DEFAULT_BATCH_SIZE};
