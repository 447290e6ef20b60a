// ==========================================
// MBA 院校数据后台 - 数据统计与导入模板
// ==========================================

use crate::domain::entity::ExistingRecord;
use crate::domain::types::EntityKind;
use crate::importer::error::{ImportError, ImportOpResult};
use crate::importer::schema::schema_for;
use chrono::{DateTime, Duration, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::collections::HashSet;

/// "近期新增"的时间窗口（天）
pub const RECENT_WINDOW_DAYS: i64 = 7;

/// 集合统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntityStats {
    pub kind: Option<EntityKind>,
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    /// 院校: 国家数（location 最后一段）；奖学金: 提供方数
    pub distinct_groups: usize,
    pub recently_added: usize,
}

/// 统计已存储记录
///
/// # 参数
/// - records: 仓储快照
/// - now: 计算"近期"所用的当前时间
pub fn collect_stats(kind: EntityKind, records: &[ExistingRecord], now: DateTime<Utc>) -> EntityStats {
    let recent_since = now - Duration::days(RECENT_WINDOW_DAYS);
    let mut groups = HashSet::new();
    let mut stats = EntityStats {
        kind: Some(kind),
        total: records.len(),
        ..Default::default()
    };

    for record in records {
        // 未填写状态按 active 处理
        let active = record
            .entity
            .text("status")
            .map_or(true, |s| s.trim().eq_ignore_ascii_case("active"));
        if active {
            stats.active += 1;
        } else {
            stats.inactive += 1;
        }

        if let Some(group) = group_of(kind, record) {
            groups.insert(group);
        }

        if record.created_at.is_some_and(|at| at >= recent_since) {
            stats.recently_added += 1;
        }
    }

    stats.distinct_groups = groups.len();
    stats
}

fn group_of(kind: EntityKind, record: &ExistingRecord) -> Option<String> {
    let raw = match kind {
        EntityKind::School => record.entity.text("location")?.rsplit(',').next()?,
        EntityKind::Scholarship => record.entity.text("provider")?,
    };
    let group = raw.trim().to_lowercase();
    (!group.is_empty()).then_some(group)
}

/// 仅含规范列名表头的 CSV 模板
pub fn template_csv(kind: EntityKind) -> ImportOpResult<String> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(schema_for(kind).field_names())?;
    let bytes = writer
        .into_inner()
        .map_err(|e| ImportError::InternalError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ImportError::InternalError(e.to_string()))
}
