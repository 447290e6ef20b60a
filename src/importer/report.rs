// ==========================================
// MBA 院校数据后台 - 导入报告
// ==========================================
// 职责: 生成汇总语句与可下载的文本报告
// 格式: 问题行统一为 "Row <n>: [<field>] <message>"（无字段时省略方括号部分）
// ==========================================

use crate::config::ImportConfig;
use crate::domain::import_result::{ImportIssue, ImportResult};
use crate::domain::types::EntityKind;
use crate::i18n::{t, t_with_args};
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt::Write as _;

const RULE: &str = "==================================================";

/// 一句话汇总（ImportResult.summary）
pub fn summary_line(result: &ImportResult) -> String {
    let counts = [
        ("total", result.total_rows.to_string()),
        ("inserted", result.inserted_rows.to_string()),
        ("updated", result.updated_rows.to_string()),
        ("skipped", result.skipped_rows.to_string()),
        ("failed", result.failed_rows.to_string()),
        ("errors", result.errors.len().to_string()),
        ("label", result.kind.label().to_string()),
    ];
    let args: Vec<(&str, &str)> = counts.iter().map(|(k, v)| (*k, v.as_str())).collect();

    let fatal = result.errors.iter().find(|e| e.kind.is_fatal());
    if let Some(issue) = fatal {
        return t_with_args("report.summary_fatal", &[("label", result.kind.label()), ("error", issue.message.as_str())]);
    }

    let key = match (result.validate_only, result.success) {
        (true, true) => "report.summary_validated",
        (true, false) => "report.summary_validated_with_errors",
        (false, true) => "report.summary_completed",
        (false, false) => "report.summary_completed_with_errors",
    };
    t_with_args(key, &args)
}

/// 渲染可下载的文本报告
///
/// # 参数
/// - result: 导入结果
/// - config: 本次运行配置
/// - file_name: 导入文件名
/// - generated_at: 生成时间
pub fn render_report(
    result: &ImportResult,
    config: &ImportConfig,
    file_name: &str,
    generated_at: DateTime<Utc>,
) -> String {
    let mut out = String::new();

    // writeln! 写入 String 不会失败
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "{}", t_with_args("report.title", &[("label", result.kind.label())]));
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out);

    let _ = writeln!(out, "{}", t("report.configuration"));
    let config_lines = [
        ("report.kind", result.kind.to_string()),
        ("report.file", file_name.to_string()),
        ("report.generated_at", generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        ("report.run_id", result.run_id.clone()),
        ("report.merge_policy", config.merge_policy.to_string()),
        ("report.mode", config.mode.to_string()),
        ("report.validate_only", yes_no(result.validate_only)),
        ("report.batch_size", config.batch_size.to_string()),
    ];
    for (key, value) in &config_lines {
        let _ = writeln!(out, "  {}: {}", t(key), value);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "{}", t("report.summary"));
    let count_lines = [
        ("report.total_rows", result.total_rows),
        ("report.processed_rows", result.processed_rows),
        ("report.inserted_rows", result.inserted_rows),
        ("report.updated_rows", result.updated_rows),
        ("report.skipped_rows", result.skipped_rows),
        ("report.failed_rows", result.failed_rows),
    ];
    for (key, value) in &count_lines {
        let _ = writeln!(out, "  {}: {}", t(key), value);
    }
    let _ = writeln!(out, "  {}: {}", t("report.success"), yes_no(result.success));
    let _ = writeln!(out, "  {}: {} ms", t("report.elapsed"), result.elapsed_ms);
    let _ = writeln!(out, "  {}", result.summary);
    let _ = writeln!(out);

    write_issue_section(&mut out, &t("report.errors"), &result.errors);
    write_issue_section(&mut out, &t("report.warnings"), &result.warnings);

    out
}

fn write_issue_section(out: &mut String, title: &str, issues: &[ImportIssue]) {
    let _ = writeln!(out, "{} ({})", title, issues.len());
    let _ = writeln!(out, "{}", "-".repeat(RULE.len()));
    if issues.is_empty() {
        let _ = writeln!(out, "  {}", t("report.none"));
    }
    for issue in issues {
        let _ = writeln!(out, "{}", issue);
    }
    let _ = writeln!(out);
}

fn yes_no(flag: bool) -> String {
    if flag {
        t("report.yes")
    } else {
        t("report.no")
    }
}

/// 报告文件名: smart-<kind>-import-report-<YYYY-MM-DD>.txt
pub fn report_file_name(kind: EntityKind, date: NaiveDate) -> String {
    format!("smart-{}-import-report-{}.txt", kind, date.format("%Y-%m-%d"))
}
