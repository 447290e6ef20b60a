// ==========================================
// MBA 院校数据后台 - 导入接口 Trait
// ==========================================
// 职责: 定义导入入口与文件解析接口（不包含实现）
// ==========================================

use crate::config::ImportConfig;
use crate::domain::entity::RawRow;
use crate::domain::import_result::ImportResult;
use crate::importer::error::ImportOpResult;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

// ==========================================
// EntityImporter Trait
// ==========================================
// 用途: 对账式导入主接口（UI 路径与 CLI 路径共用）
// 实现者: ImportCoordinator
#[async_trait]
pub trait EntityImporter: Send + Sync {
    /// 从文件导入
    ///
    /// # 参数
    /// - file_path: .csv / .xlsx / .xls
    /// - config: 本次运行配置
    ///
    /// # 返回
    /// - ImportResult: 文件级失败同样以结果形式返回（success=false）
    async fn import_file(&self, file_path: &Path, config: &ImportConfig) -> ImportResult;

    /// 从上传内容导入（按文件名扩展名选择解析器）
    async fn import_bytes(&self, file_name: &str, bytes: &[u8], config: &ImportConfig) -> ImportResult;

    /// 并发执行多个独立导入
    ///
    /// # 说明
    /// - 每个运行各自读取快照，互不共享可变状态
    /// - 结果顺序与输入顺序一致
    async fn run_many(&self, jobs: Vec<(PathBuf, ImportConfig)>) -> Vec<ImportResult>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始行（保留原始行号）
    ///
    /// # 返回
    /// - Ok(Vec<RawRow>): 非空数据行
    /// - Err: 文件不存在、格式错误、缺少表头
    fn parse_to_raw_rows(&self, file_path: &Path) -> ImportOpResult<Vec<RawRow>>;

    /// 解析内存中的文件内容
    fn parse_bytes(&self, bytes: &[u8]) -> ImportOpResult<Vec<RawRow>>;
}
