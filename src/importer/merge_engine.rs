// ==========================================
// MBA 院校数据后台 - 合并引擎
// ==========================================
// 职责: 对同一身份键的"已存储记录 + 导入实体"计算字段增量
// 策略:
// - replace: 任何不同即覆盖
// - merge: 已有值为空 / 新文本更长 / 布尔由未知或否变为是
// - preserve: 只填空
// 红线: 导入侧为空的字段永不进入增量（不用缺失数据抹掉已有数据）
//       与已有值相等的字段不进入增量（保证重复导入幂等）
// 未提交值: 同一次运行中先前行计划的值尚未落库，不作为已整理数据参与策略判断
// ==========================================

use crate::domain::entity::{CanonicalEntity, FieldDelta};
use crate::domain::types::{FieldValue, MergePolicy};

/// 计算字段增量
///
/// # 参数
/// - existing: 已存储实体
/// - incoming: 本行导入实体
/// - policy: 合并策略（显式传入，不读全局状态）
///
/// # 返回
/// - 空增量: 无需变更
pub fn merge(existing: &CanonicalEntity, incoming: &CanonicalEntity, policy: MergePolicy) -> FieldDelta {
    merge_with_pending(existing, existing, incoming, policy)
}

/// 计算叠加了本次运行未提交增量后的字段增量
///
/// 策略只针对快照中的已提交值判断；先前行计划的值只用于去掉无变化的字段。
/// 导入值与已提交值相同而投影值不同时（先前行改过该字段），同样进入增量。
///
/// # 参数
/// - committed: 快照中的记录（身份键首次出现于本文件时为空实体）
/// - projected: 已叠加本次运行先前增量的投影实体
/// - incoming: 本行导入实体
/// - policy: 合并策略
pub fn merge_with_pending(
    committed: &CanonicalEntity,
    projected: &CanonicalEntity,
    incoming: &CanonicalEntity,
    policy: MergePolicy,
) -> FieldDelta {
    let mut delta = FieldDelta::new();

    for (field, new_value) in incoming.fields() {
        if !new_value.is_present() || projected.get(field) == new_value {
            continue;
        }
        let old_value = committed.get(field);
        if old_value == new_value || policy_allows(old_value, new_value, policy) {
            delta.insert(field, new_value.clone());
        }
    }

    delta
}

/// 去掉仅大小写或首尾空白不同的文本字段（同文件重复行的拼写差异）
pub fn drop_spelling_variants(delta: &mut FieldDelta, projected: &CanonicalEntity) {
    delta.retain(|field, value| match (projected.get(field), value) {
        (FieldValue::Text(old), FieldValue::Text(new)) => {
            !old.trim().eq_ignore_ascii_case(new.trim())
        }
        _ => true,
    });
}

/// 单字段策略判断（调用方已排除相等值与空导入值）
fn policy_allows(existing: &FieldValue, incoming: &FieldValue, policy: MergePolicy) -> bool {
    match policy {
        MergePolicy::Replace => true,
        MergePolicy::Merge => is_more_complete(existing, incoming),
        MergePolicy::Preserve => is_unset(existing),
    }
}

/// 已有值是否"未填写"：NULL、空文本、零、否
fn is_unset(existing: &FieldValue) -> bool {
    match existing {
        FieldValue::Boolean(flag) => !flag,
        other => other.is_blank(),
    }
}

/// 完整度启发式：不缩短已有文本，不用非零数值替换非零数值
fn is_more_complete(existing: &FieldValue, incoming: &FieldValue) -> bool {
    if is_unset(existing) {
        return true;
    }
    match (existing, incoming) {
        (FieldValue::Text(old), FieldValue::Text(new)) => {
            new.trim().chars().count() > old.trim().chars().count()
        }
        _ => false,
    }
}
