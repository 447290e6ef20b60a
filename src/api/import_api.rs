// ==========================================
// MBA 院校数据后台 - 导入API
// ==========================================
// 职责: 封装智能导入相关功能（上传导入/演练/统计/模板）
// 约束: 与 CLI 共用 ImportCoordinator，不重复任何导入逻辑
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ImportConfig;
use crate::domain::import_result::ImportResult;
use crate::domain::types::EntityKind;
use crate::importer::{
    collect_stats, render_report, report_file_name, template_csv, EntityImporter, EntityStats,
    ImportCoordinator,
};
use crate::repository::{EntityRepository, SqliteEntityRepository};
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// 导入API响应
#[derive(Debug, Clone, Serialize)]
pub struct ImportApiResponse {
    /// 导入结果（计数、问题清单、逐行结果）
    pub result: ImportResult,
    /// 可下载的文本报告
    pub report: String,
    /// 报告文件名
    pub report_file_name: String,
}

/// 导入模板
#[derive(Debug, Clone, Serialize)]
pub struct TemplateFile {
    pub file_name: String,
    pub content: String,
}

/// 导入API
pub struct ImportApi {
    coordinator: ImportCoordinator,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    pub fn new(repo: Arc<dyn EntityRepository>) -> Self {
        Self {
            coordinator: ImportCoordinator::new(repo),
        }
    }

    /// 打开 SQLite 数据库（不存在的实体表会被创建）
    pub fn open(db_path: &str) -> ApiResult<Self> {
        let repo = SqliteEntityRepository::new(db_path)?;
        Ok(Self::new(Arc::new(repo)))
    }

    /// 导入上传的文件内容
    ///
    /// # 参数
    /// - file_name: 原始文件名（按扩展名选择解析器）
    /// - bytes: 文件内容
    /// - config: 导入配置
    ///
    /// # 返回
    /// - Ok(ImportApiResponse): 导入结果（行级问题在结果中，不作为 Err）
    /// - Err(ApiError): 配置无效
    pub async fn import_upload(
        &self,
        file_name: &str,
        bytes: &[u8],
        config: &ImportConfig,
    ) -> ApiResult<ImportApiResponse> {
        config.validate()?;
        let result = self.coordinator.import_bytes(file_name, bytes, config).await;
        Ok(respond(result, config, file_name))
    }

    /// 导入本地文件
    pub async fn import_file(&self, path: &Path, config: &ImportConfig) -> ApiResult<ImportApiResponse> {
        config.validate()?;
        let result = self.coordinator.import_file(path, config).await;
        Ok(respond(result, config, &display_name(path)))
    }

    /// 演练上传内容（强制仅校验，不写入）
    pub async fn validate_upload(
        &self,
        file_name: &str,
        bytes: &[u8],
        config: &ImportConfig,
    ) -> ApiResult<ImportApiResponse> {
        let config = config.clone().with_validate_only(true);
        self.import_upload(file_name, bytes, &config).await
    }

    /// 并发执行多个独立导入（结果顺序与输入一致）
    pub async fn import_many(&self, jobs: Vec<(PathBuf, ImportConfig)>) -> ApiResult<Vec<ImportApiResponse>> {
        for (_, config) in &jobs {
            config.validate()?;
        }
        info!(jobs = jobs.len(), "提交并发导入");

        let names: Vec<(String, ImportConfig)> = jobs
            .iter()
            .map(|(path, config)| (display_name(path), config.clone()))
            .collect();
        let results = self.coordinator.run_many(jobs).await;

        Ok(results
            .into_iter()
            .zip(names)
            .map(|(result, (name, config))| respond(result, &config, &name))
            .collect())
    }

    /// 集合统计
    pub async fn stats(&self, kind: EntityKind) -> ApiResult<EntityStats> {
        let records = self.coordinator.repository().read_all(kind).await?;
        Ok(collect_stats(kind, &records, Utc::now()))
    }

    /// 导入模板（仅表头的 CSV）
    pub fn template(&self, kind: EntityKind) -> ApiResult<TemplateFile> {
        let content = template_csv(kind).map_err(ApiError::from)?;
        Ok(TemplateFile {
            file_name: format!("{}_template.csv", kind.collection()),
            content,
        })
    }
}

fn respond(result: ImportResult, config: &ImportConfig, file_name: &str) -> ImportApiResponse {
    let now = Utc::now();
    ImportApiResponse {
        report: render_report(&result, config, file_name, now),
        report_file_name: report_file_name(result.kind, now.date_naive()),
        result,
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
