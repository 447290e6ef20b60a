// ==========================================
// MBA 院校数据后台 - 字段映射器实现
// ==========================================
// 职责: RawRow → CanonicalEntity（按字段表逐字段解析）
// 解析顺序: 规范列名 → 历史别名 → 规范化函数 → 静态默认值
//          → 派生回填（第二遍，依赖同一实体的其他字段）
// 红线: 映射永不失败；缺失/异常列退化为 NULL，不丢字段
// ==========================================

use crate::domain::entity::{CanonicalEntity, RawRow};
use crate::domain::import_result::{ImportIssue, IssueKind};
use crate::domain::types::{EntityKind, FieldValue};
use crate::i18n::t_with_args;
use crate::importer::field_normalizer::infer_region_from_free_text;
use crate::importer::schema::{schema_for, Fallback, FieldSpec};

pub struct FieldMapper;

impl FieldMapper {
    /// 将原始行映射为规范实体
    ///
    /// # 参数
    /// - kind: 实体种类（决定字段表）
    /// - row: 原始行
    ///
    /// # 返回
    /// - CanonicalEntity: 字段集合与字段表一一对应
    pub fn map_row(&self, kind: EntityKind, row: &RawRow) -> CanonicalEntity {
        let schema = schema_for(kind);
        let mut entity = CanonicalEntity::new(kind);

        for spec in schema.fields {
            entity.set(spec.name, Self::resolve_field(spec, row));
        }

        // 派生回填只作用于仍为 NULL 的字段
        for spec in schema.fields {
            if let Some(fallback) = spec.fallback {
                if entity.get(spec.name).is_null() {
                    let derived = Self::derive_fallback(&fallback, &entity);
                    entity.set(spec.name, derived);
                }
            }
        }

        entity
    }

    /// 单字段解析：第一个非空候选列 → 规范化；无候选 → 默认值或 NULL
    fn resolve_field(spec: &FieldSpec, row: &RawRow) -> FieldValue {
        let matched = spec
            .candidates()
            .filter_map(|label| row.get(label))
            .find(|value| !value.trim().is_empty());

        match matched {
            Some(raw) => spec.normalizer.apply(raw),
            None => spec
                .default
                .map(|d| d.to_value())
                .unwrap_or(FieldValue::Null),
        }
    }

    fn derive_fallback(fallback: &Fallback, entity: &CanonicalEntity) -> FieldValue {
        match fallback {
            Fallback::RegionFrom(source) => match entity.text(source) {
                Some(text) => FieldValue::Text(infer_region_from_free_text(text)),
                None => FieldValue::Null,
            },
            Fallback::OfferedBy { name, provider } => {
                match (entity.text(name), entity.text(provider)) {
                    (Some(n), Some(p)) => FieldValue::Text(format!("{} offered by {}", n, p)),
                    _ => FieldValue::Null,
                }
            }
            Fallback::CopyOf(source) => {
                let value = entity.get(source);
                if value.is_present() {
                    value.clone()
                } else {
                    FieldValue::Null
                }
            }
        }
    }

    /// 行结构检查：超出表头宽度的非空单元格无法归属任何列
    pub fn check_row_shape(&self, row: &RawRow) -> Option<ImportIssue> {
        if row.overflow.is_empty() {
            return None;
        }
        let count = row.overflow.len().to_string();
        Some(ImportIssue::error(
            row.row_number,
            None,
            IssueKind::RowProcessing,
            t_with_args("import.row_overflow", &[("count", count.as_str())]),
        ))
    }

    /// 必填与长度校验（每处违规一条问题）
    pub fn validate(&self, entity: &CanonicalEntity, row_number: usize) -> Vec<ImportIssue> {
        let schema = schema_for(entity.kind());
        let mut issues = Vec::new();

        for spec in schema.fields {
            let value = entity.get(spec.name);
            if !value.is_present() {
                if spec.required {
                    issues.push(ImportIssue::error(
                        row_number,
                        Some(spec.name),
                        IssueKind::RowValidation,
                        t_with_args("import.required", &[("field", spec.name)]),
                    ));
                }
                continue;
            }

            let Some(text) = value.as_text() else {
                continue;
            };
            let len = text.chars().count();
            if let Some(min) = spec.min_len {
                if len < min {
                    issues.push(ImportIssue::error(
                        row_number,
                        Some(spec.name),
                        IssueKind::RowValidation,
                        t_with_args(
                            "import.too_short",
                            &[("min", min.to_string().as_str()), ("len", len.to_string().as_str())],
                        ),
                    ));
                }
            }
            if let Some(max) = spec.max_len {
                if len > max {
                    issues.push(ImportIssue::error(
                        row_number,
                        Some(spec.name),
                        IssueKind::RowValidation,
                        t_with_args(
                            "import.too_long",
                            &[("max", max.to_string().as_str()), ("len", len.to_string().as_str())],
                        ),
                    ));
                }
            }
        }

        issues
    }
}
