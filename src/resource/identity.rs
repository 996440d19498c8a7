use super::record::Record;
use crate::session::dto::{LookupTable, SessionIdentity};
use std::collections::BTreeSet;

/// 记录集中出现的去重 owner id（升序，保证批量查询参数稳定）
pub fn distinct_owner_ids(records: &[Record]) -> Vec<i64> {
    records
        .iter()
        .filter_map(|r| r.owner_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// 批量查询结果 > 当前用户自己的名字（仅 owner 为自己时）
pub fn resolve_owner_name(
    owner_id: Option<i64>,
    session: Option<&SessionIdentity>,
    lookup: Option<&LookupTable>,
) -> Option<String> {
    let id = owner_id?;
    if let Some(name) = lookup.and_then(|t| t.get(&id.to_string())) {
        if !name.trim().is_empty() {
            return Some(name.clone());
        }
    }
    session
        .filter(|me| me.id == id)
        .and_then(|me| me.self_name())
        .map(str::to_string)
}

/// 为每条记录填充 owner_name；查询失败或覆盖不全时逐条走回退链，不会出错
pub fn attach_owner_names(
    records: &mut [Record],
    session: Option<&SessionIdentity>,
    lookup: Option<&LookupTable>,
) {
    for r in records.iter_mut() {
        r.owner_name = resolve_owner_name(r.owner_id, session, lookup);
    }
}

/// 展示用：解析出的名字 > "用户#id" > "-"
pub fn owner_label(record: &Record) -> String {
    match (&record.owner_name, record.owner_id) {
        (Some(name), _) => name.clone(),
        (None, Some(id)) => format!("用户#{}", id),
        (None, None) => "-".to_string(),
    }
}
