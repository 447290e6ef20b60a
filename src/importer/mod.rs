// ==========================================
// MBA 院校数据后台 - 导入层
// ==========================================
// 职责: 表格文件 → 规范实体 → 与已存储记录对账 → 批量写入
// 支持: CSV, Excel (.xlsx/.xls), 上传内容
// ==========================================
// 依赖方向: field_normalizer ← schema ← field_mapper
//           ← identity / merge_engine ← coordinator → batch_writer
// ==========================================

// 模块声明
pub mod batch_writer;
pub mod coordinator;
pub mod error;
pub mod field_mapper;
pub mod field_normalizer;
pub mod file_parser;
pub mod identity;
pub mod importer_trait;
pub mod merge_engine;
pub mod report;
pub mod schema;
pub mod stats;

// 重导出核心类型
pub use batch_writer::{BatchWriter, InsertPlan, UpdatePlan, UpdateTarget, WriteOutcome, WriteStatus};
pub use coordinator::ImportCoordinator;
pub use error::{ImportError, ImportOpResult};
pub use field_mapper::FieldMapper;
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use identity::identity_key;
pub use merge_engine::merge;
pub use report::{render_report, report_file_name, summary_line};
pub use schema::{schema_for, EntitySchema, FieldSpec};
pub use stats::{collect_stats, template_csv, EntityStats};

// 重导出 Trait 接口
pub use importer_trait::{EntityImporter, FileParser};
