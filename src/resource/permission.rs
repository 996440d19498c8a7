use super::kind::ResourceKind;
use super::record::Record;
use super::status::CanonicalStatus;
use crate::session::dto::SessionIdentity;

/// 特殊管理员的用户 id（与 role 无关）
pub const ADMIN_ID: i64 = 1;

/// 删除、终止等改变状态的操作共用同一判定
pub fn can_mutate(session: Option<&SessionIdentity>, record: &Record) -> bool {
    match session {
        None => false,
        Some(me) => me.id == ADMIN_ID || record.owner_id == Some(me.id),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowActions {
    pub can_delete: bool,
    pub stop_visible: bool,
    pub can_stop: bool,
    pub can_export: bool,
    pub selectable: bool,
    pub can_download: bool,
}

pub fn row_actions(
    kind: ResourceKind,
    session: Option<&SessionIdentity>,
    record: &Record,
) -> RowActions {
    let status = kind.classify(record).key;
    let mutate = can_mutate(session, record);
    let stop_visible = kind.supports_task_actions() && status != CanonicalStatus::Completed;

    RowActions {
        can_delete: mutate,
        stop_visible,
        can_stop: stop_visible && mutate,
        can_export: kind.supports_task_actions() && status != CanonicalStatus::Running,
        // 勾选只服务于批量导出，导出记录不可勾选
        selectable: kind.supports_task_actions() && status != CanonicalStatus::Running,
        // 下载只看状态，与归属无关
        can_download: status == CanonicalStatus::Completed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::record::Metric;

    fn rec(owner: i64, status: &str) -> Record {
        Record {
            id: 100,
            name: "x".to_string(),
            raw_status: Some(status.to_string()),
            owner_id: Some(owner),
            timestamp: None,
            metric: Metric::default(),
            owner_name: None,
        }
    }

    fn me(id: i64, role: &str) -> SessionIdentity {
        SessionIdentity {
            id,
            username: "u".to_string(),
            display_name: None,
            role: Some(role.to_string()),
        }
    }

    #[test]
    fn admin_by_id_may_mutate_anything() {
        assert!(can_mutate(Some(&me(1, "user")), &rec(42, "运行中")));
    }

    #[test]
    fn role_string_grants_nothing() {
        assert!(!can_mutate(Some(&me(5, "admin")), &rec(42, "运行中")));
    }

    #[test]
    fn owner_may_mutate_own_record() {
        assert!(can_mutate(Some(&me(5, "user")), &rec(5, "运行中")));
    }

    #[test]
    fn no_session_may_mutate_nothing() {
        assert!(!can_mutate(None, &rec(1, "运行中")));
        let mut orphan = rec(1, "运行中");
        orphan.owner_id = None;
        assert!(!can_mutate(Some(&me(5, "user")), &orphan));
    }

    #[test]
    fn task_row_actions() {
        let owner = me(5, "user");
        let running = row_actions(ResourceKind::Tasks, Some(&owner), &rec(5, "运行中"));
        assert!(running.can_stop && running.can_delete);
        assert!(!running.selectable && !running.can_export && !running.can_download);

        let done = row_actions(ResourceKind::Tasks, Some(&owner), &rec(5, "已完成"));
        assert!(!done.stop_visible && !done.can_stop);
        assert!(done.selectable && done.can_export && done.can_download);

        let foreign = row_actions(ResourceKind::Tasks, Some(&owner), &rec(6, "已暂停"));
        assert!(foreign.stop_visible && !foreign.can_stop && !foreign.can_delete);
    }

    #[test]
    fn download_ignores_ownership() {
        let a = row_actions(ResourceKind::Exports, None, &rec(42, "completed"));
        assert!(a.can_download && !a.can_delete);
        assert!(!a.stop_visible && !a.can_export && !a.selectable);
        let b = row_actions(ResourceKind::Exports, Some(&me(1, "")), &rec(42, "failed"));
        assert!(!b.can_download && b.can_delete);
    }
}
