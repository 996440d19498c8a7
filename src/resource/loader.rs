use super::coordinator::LoadOutcome;
use super::identity::{attach_owner_names, distinct_owner_ids};
use super::kind::ResourceKind;
use crate::session::ConsoleBackend;
use log::warn;

/// 执行一次完整加载：当前用户与主列表并行获取，主列表成功后再做批量身份查询。
/// 用户信息与身份查询都是尽力而为，失败只会降级显示。
pub async fn load_snapshot(backend: &dyn ConsoleBackend, kind: ResourceKind) -> LoadOutcome {
    let (profile, list) =
        futures::future::join(backend.fetch_profile(), backend.fetch_records(kind)).await;

    let session = match profile {
        Ok(me) => me,
        Err(e) => {
            warn!("{} profile fetch failed, continuing without session: {}", kind, e);
            None
        }
    };

    let mut records = match list {
        Ok(records) => records,
        Err(e) => {
            return LoadOutcome {
                session,
                records: Err(e),
            }
        }
    };

    let ids = distinct_owner_ids(&records);
    let lookup = if ids.is_empty() {
        None
    } else {
        match backend.lookup_users(&ids).await {
            Ok(table) => Some(table),
            Err(e) => {
                warn!("{} user lookup failed, falling back: {}", kind, e);
                None
            }
        }
    };
    attach_owner_names(&mut records, session.as_ref(), lookup.as_ref());

    LoadOutcome {
        session,
        records: Ok(records),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::LoadFailurePolicy;
    use crate::error::{ConsoleError, ConsoleResult};
    use crate::resource::coordinator::{LoadApplied, ListCoordinator};
    use crate::resource::identity::owner_label;
    use crate::resource::record::{Metric, Record};
    use crate::session::{Download, LookupTable, SessionIdentity};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use tokio::sync::oneshot;

    pub(crate) fn rec(id: i64, owner: i64) -> Record {
        Record {
            id,
            name: format!("r{}", id),
            raw_status: Some("已完成".to_string()),
            owner_id: Some(owner),
            timestamp: None,
            metric: Metric::default(),
            owner_name: None,
        }
    }

    /// 内存后端；`gate` 存在时主列表请求会等待放行
    #[derive(Default)]
    pub(crate) struct FakeBackend {
        pub profile: Option<ConsoleResult<Option<SessionIdentity>>>,
        pub records: Option<ConsoleResult<Vec<Record>>>,
        pub lookup: Option<ConsoleResult<LookupTable>>,
        pub delete_result: Option<ConsoleResult<()>>,
        pub gate: Mutex<Option<oneshot::Receiver<()>>>,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeBackend {
        fn log(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ConsoleBackend for FakeBackend {
        async fn fetch_profile(&self) -> ConsoleResult<Option<SessionIdentity>> {
            self.log("profile".into());
            self.profile.clone().unwrap_or(Ok(None))
        }

        async fn fetch_records(&self, kind: ResourceKind) -> ConsoleResult<Vec<Record>> {
            self.log(format!("list {}", kind));
            let gate = self.gate.lock().unwrap().take();
            if let Some(rx) = gate {
                let _ = rx.await;
            }
            self.records.clone().unwrap_or(Ok(Vec::new()))
        }

        async fn lookup_users(&self, ids: &[i64]) -> ConsoleResult<LookupTable> {
            self.log(format!("lookup {:?}", ids));
            self.lookup.clone().unwrap_or(Ok(LookupTable::new()))
        }

        async fn delete_record(&self, kind: ResourceKind, id: i64) -> ConsoleResult<()> {
            self.log(format!("delete {} {}", kind, id));
            self.delete_result.clone().unwrap_or(Ok(()))
        }

        async fn create_export(&self, task_id: i64) -> ConsoleResult<()> {
            self.log(format!("export {}", task_id));
            Ok(())
        }

        async fn create_exports_batch(&self, task_ids: &[i64]) -> ConsoleResult<()> {
            self.log(format!("batch {:?}", task_ids));
            Ok(())
        }

        async fn download_file(&self, kind: ResourceKind, id: i64) -> ConsoleResult<Download> {
            self.log(format!("download {} {}", kind, id));
            Ok(Download {
                file_name: None,
                bytes: b"id,name\n".to_vec(),
            })
        }
    }

    fn me(id: i64, real: &str) -> SessionIdentity {
        SessionIdentity {
            id,
            username: format!("u{}", id),
            display_name: Some(real.to_string()),
            role: None,
        }
    }

    #[tokio::test]
    async fn names_are_resolved_with_precedence() {
        let backend = FakeBackend {
            profile: Some(Ok(Some(me(2, "王五")))),
            records: Some(Ok(vec![rec(1, 2), rec(2, 3), rec(3, 9)])),
            lookup: Some(Ok([("3".to_string(), "李四".to_string())].into_iter().collect())),
            ..Default::default()
        };
        let out = load_snapshot(&backend, ResourceKind::Tasks).await;
        let records = out.records.unwrap();
        let labels: Vec<String> = records.iter().map(owner_label).collect();
        assert_eq!(labels, vec!["王五", "李四", "用户#9"]);
        assert!(backend.calls().contains(&"lookup [2, 3, 9]".to_string()));
    }

    #[tokio::test]
    async fn empty_list_skips_lookup() {
        let backend = FakeBackend {
            records: Some(Ok(vec![])),
            ..Default::default()
        };
        let out = load_snapshot(&backend, ResourceKind::Exports).await;
        assert!(out.records.unwrap().is_empty());
        assert!(!backend.calls().iter().any(|c| c.starts_with("lookup")));
    }

    #[tokio::test]
    async fn list_failure_skips_lookup_and_keeps_session() {
        let backend = FakeBackend {
            profile: Some(Ok(Some(me(2, "王五")))),
            records: Some(Err(ConsoleError::Status { status: 502, body: String::new() })),
            ..Default::default()
        };
        let out = load_snapshot(&backend, ResourceKind::Tasks).await;
        assert!(out.records.is_err());
        assert_eq!(out.session.map(|s| s.id), Some(2));
        assert!(!backend.calls().iter().any(|c| c.starts_with("lookup")));
    }

    #[tokio::test]
    async fn profile_and_lookup_failures_degrade_gracefully() {
        let backend = FakeBackend {
            profile: Some(Err(ConsoleError::Http("reset".into()))),
            records: Some(Ok(vec![rec(1, 4)])),
            lookup: Some(Err(ConsoleError::Status { status: 500, body: String::new() })),
            ..Default::default()
        };
        let out = load_snapshot(&backend, ResourceKind::Tasks).await;
        assert!(out.session.is_none());
        let records = out.records.unwrap();
        assert_eq!(owner_label(&records[0]), "用户#4");
    }

    #[tokio::test]
    async fn slower_older_load_cannot_overwrite_newer_one() {
        let (release, gate) = oneshot::channel();
        let slow = Arc::new(FakeBackend {
            records: Some(Ok(vec![rec(1, 1), rec(2, 1)])),
            gate: Mutex::new(Some(gate)),
            ..Default::default()
        });
        let fast = FakeBackend {
            records: Some(Ok(vec![rec(3, 1)])),
            ..Default::default()
        };

        let mut coord = ListCoordinator::new(ResourceKind::Tasks, 10, LoadFailurePolicy::Retain);
        let g1 = coord.begin_load();
        let slow_bg = slow.clone();
        let first = tokio::spawn(async move {
            load_snapshot(slow_bg.as_ref(), ResourceKind::Tasks).await
        });

        let g2 = coord.begin_load();
        let second = load_snapshot(&fast, ResourceKind::Tasks).await;
        assert_eq!(coord.apply_load(g2, second), LoadApplied::Applied { count: 1 });

        release.send(()).unwrap();
        let late = first.await.unwrap();
        assert!(matches!(coord.apply_load(g1, late), LoadApplied::Stale { .. }));

        let ids: Vec<i64> = coord.records().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3]);
    }
}
