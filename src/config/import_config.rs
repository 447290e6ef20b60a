// ==========================================
// MBA 院校数据后台 - 导入配置
// ==========================================
// 职责: 单次导入运行的全部参数（随调用显式传递，无全局状态）
// 来源: UI 路径以 JSON 传入；CLI 路径由命令行参数构造
// ==========================================

use crate::domain::types::{EntityKind, ImportMode, MergePolicy};
use crate::importer::error::ImportError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 默认批大小
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "SMART_IMPORT_DB_PATH";

// ==========================================
// ImportConfig
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub kind: EntityKind,
    pub merge_policy: MergePolicy,
    pub mode: ImportMode,
    /// 演练：执行全部分析步骤，但不写入
    pub validate_only: bool,
    /// 插入批大小（正整数）
    pub batch_size: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            kind: EntityKind::School,
            merge_policy: MergePolicy::default(),
            mode: ImportMode::default(),
            validate_only: false,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl ImportConfig {
    pub fn for_kind(kind: EntityKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    pub fn with_merge_policy(mut self, policy: MergePolicy) -> Self {
        self.merge_policy = policy;
        self
    }

    pub fn with_mode(mut self, mode: ImportMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_validate_only(mut self, validate_only: bool) -> Self {
        self.validate_only = validate_only;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// 校验配置
    ///
    /// # 返回
    /// - Err(ConfigValueError): batch_size 为 0
    pub fn validate(&self) -> Result<(), ImportError> {
        if self.batch_size == 0 {
            return Err(ImportError::ConfigValueError {
                key: "batch_size".to_string(),
                value: self.batch_size.to_string(),
                message: "批大小必须为正整数".to_string(),
            });
        }
        Ok(())
    }
}

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 SMART_IMPORT_DB_PATH（非空时）
/// - 用户数据目录/smart-import/smart_import.db
/// - 回退: ./smart_import.db
pub fn default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./smart_import.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("smart-import");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("smart_import.db");
        }
    }

    path.to_string_lossy().to_string()
}
