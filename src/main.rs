// ==========================================
// MBA 院校数据后台 - 智能导入命令行入口
// ==========================================
// 用法:
//   smart-import import school schools.csv --merge replace --report report.txt
//   smart-import validate scholarship scholarships.xlsx --json
//   smart-import template school --output school_template.csv
//   smart-import stats scholarship --db ./smart_import.db
//
// 日志: RUST_LOG 控制级别（默认 info），SMART_IMPORT_LOG_FORMAT=json 输出结构化日志
// ==========================================

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use smart_import::api::ImportApi;
use smart_import::config::{default_db_path, ImportConfig, DEFAULT_BATCH_SIZE};
use smart_import::importer::template_csv;
use smart_import::{i18n, logging, EntityKind, ImportMode, MergePolicy};
use std::path::PathBuf;
use std::process::ExitCode;

/// Reconciling bulk importer for MBA schools and scholarships.
#[derive(Parser)]
#[command(name = "smart-import", version)]
struct Cli {
    /// Message language (en | zh-CN).
    #[arg(long, global = true, default_value = "en")]
    locale: String,

    /// Emit logs as JSON.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import a file, inserting new records and merging existing ones.
    Import(RunArgs),
    /// Analyse a file without writing anything (dry run).
    Validate(RunArgs),
    /// Write a header-only CSV template for a kind.
    Template {
        kind: EntityKind,
        /// Output path (stdout when omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show collection statistics.
    Stats {
        kind: EntityKind,
        #[arg(long)]
        db: Option<String>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Entity kind: school | scholarship.
    kind: EntityKind,

    /// Input file (.csv, .xlsx, .xls).
    file: PathBuf,

    /// Merge policy: replace | merge | preserve.
    #[arg(long, default_value = "merge")]
    merge: MergePolicy,

    /// Import mode: smart | insert | update (upsert = smart).
    #[arg(long, default_value = "smart")]
    mode: ImportMode,

    /// Rows per insert batch.
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Analyse only, no writes.
    #[arg(long, default_value_t = false)]
    validate_only: bool,

    /// SQLite database path (defaults to SMART_IMPORT_DB_PATH or the user data dir).
    #[arg(long)]
    db: Option<String>,

    /// Write the text report to this path.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Print the full result as JSON instead of the text report.
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl RunArgs {
    fn config(&self, force_validate_only: bool) -> ImportConfig {
        ImportConfig::for_kind(self.kind)
            .with_merge_policy(self.merge)
            .with_mode(self.mode)
            .with_batch_size(self.batch_size)
            .with_validate_only(self.validate_only || force_validate_only)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    logging::init_with_format(cli.log_json);

    if !i18n::set_locale(&cli.locale) {
        tracing::warn!(locale = %cli.locale, "不支持的语言，使用 en");
    }

    match cli.command {
        Command::Import(args) => run_import(args, false).await,
        Command::Validate(args) => run_import(args, true).await,
        Command::Template { kind, output } => {
            let content = template_csv(kind)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("写入模板失败: {}", path.display()))?;
                    println!("{}", path.display());
                }
                None => print!("{}", content),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Stats { kind, db } => {
            let db_path = db.unwrap_or_else(default_db_path);
            let api = ImportApi::open(&db_path)?;
            let stats = api.stats(kind).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_import(args: RunArgs, force_validate_only: bool) -> anyhow::Result<ExitCode> {
    let config = args.config(force_validate_only);
    let db_path = args.db.clone().unwrap_or_else(default_db_path);
    tracing::info!(db = %db_path, kind = %config.kind, file = %args.file.display(), "使用数据库");

    let api = ImportApi::open(&db_path)?;
    let response = api.import_file(&args.file, &config).await?;

    if let Some(path) = &args.report {
        std::fs::write(path, &response.report)
            .with_context(|| format!("写入报告失败: {}", path.display()))?;
        tracing::info!(report = %path.display(), "报告已写入");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response.result)?);
    } else {
        print!("{}", response.report);
    }

    Ok(if response.result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
