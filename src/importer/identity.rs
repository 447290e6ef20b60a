// ==========================================
// MBA 院校数据后台 - 身份键解析
// ==========================================
// 职责: 从规范实体派生确定性的去重键
// 约束: 纯函数、全函数；缺失字段组成空段，不返回 None
//       不依赖行号或存储主键
// ==========================================

use crate::domain::entity::{CanonicalEntity, IdentityKey};
use crate::domain::types::EntityKind;

/// 派生身份键
///
/// - school: 规范化名称 | 小写 TRIM 的 location
/// - scholarship: 规范化名称 | 小写 TRIM 的 provider
pub fn identity_key(kind: EntityKind, entity: &CanonicalEntity) -> IdentityKey {
    let name = normalize_name(entity.text("name").unwrap_or(""));
    let qualifier = match kind {
        EntityKind::School => lower_trim(entity.text("location").unwrap_or("")),
        EntityKind::Scholarship => lower_trim(entity.text("provider").unwrap_or("")),
    };
    IdentityKey::from_parts(&[name, qualifier])
}

/// 参与身份键的字段
pub fn identity_fields(kind: EntityKind) -> [&'static str; 2] {
    match kind {
        EntityKind::School => ["name", "location"],
        EntityKind::Scholarship => ["name", "provider"],
    }
}

/// 名称规范化：小写，去除非单词字符，折叠空白
fn normalize_name(name: &str) -> String {
    let stripped: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn lower_trim(value: &str) -> String {
    value.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::RawRow;
    use crate::importer::field_mapper::FieldMapper;

    fn school(name: &str, location: &str) -> CanonicalEntity {
        let row = RawRow::new(2)
            .with_cell("name", name)
            .with_cell("location", location);
        FieldMapper.map_row(EntityKind::School, &row)
    }

    #[test]
    fn test_school_key_is_case_and_whitespace_insensitive() {
        let a = school("Acme B-School", "Springfield");
        let b = school("  acme  b-school ", "  springfield ");
        assert_eq!(
            identity_key(EntityKind::School, &a),
            identity_key(EntityKind::School, &b)
        );
        assert_eq!(identity_key(EntityKind::School, &a).as_str(), "acme bschool|springfield");
    }

    #[test]
    fn test_identity_fields_match_key_parts() {
        assert_eq!(identity_fields(EntityKind::School), ["name", "location"]);
        assert_eq!(identity_fields(EntityKind::Scholarship), ["name", "provider"]);
    }

    #[test]
    fn test_location_keeps_punctuation() {
        let a = school("Acme", "Springfield, IL");
        let b = school("Acme", "Springfield IL");
        assert_ne!(
            identity_key(EntityKind::School, &a),
            identity_key(EntityKind::School, &b)
        );
    }

    #[test]
    fn test_missing_fields_compose_empty_segments() {
        let empty = FieldMapper.map_row(EntityKind::School, &RawRow::new(2));
        assert_eq!(identity_key(EntityKind::School, &empty).as_str(), "|");
    }

    #[test]
    fn test_scholarship_key_uses_provider_or_organization() {
        let by_provider = FieldMapper.map_row(
            EntityKind::Scholarship,
            &RawRow::new(2)
                .with_cell("name", "Chevening Award!")
                .with_cell("provider", "FCDO"),
        );
        let by_organization = FieldMapper.map_row(
            EntityKind::Scholarship,
            &RawRow::new(3)
                .with_cell("title", "chevening award")
                .with_cell("organization", " fcdo "),
        );
        assert_eq!(
            identity_key(EntityKind::Scholarship, &by_provider),
            identity_key(EntityKind::Scholarship, &by_organization)
        );
        assert_eq!(
            identity_key(EntityKind::Scholarship, &by_provider).as_str(),
            "chevening award|fcdo"
        );
    }
}
