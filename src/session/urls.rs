use crate::resource::ResourceKind;

/// 控制台后端的各个接口地址，统一挂在 `CONSOLE_API_BASE` 之下
#[derive(Debug, Clone)]
pub struct ApiUrls {
    base: String,
}

impl ApiUrls {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// 当前用户
    pub fn profile(&self) -> String {
        format!("{}/profile", self.base)
    }

    /// 主列表：`/tasks` 或 `/exports`
    pub fn collection(&self, kind: ResourceKind) -> String {
        format!("{}/{}", self.base, kind.collection())
    }

    pub fn record(&self, kind: ResourceKind, id: i64) -> String {
        format!("{}/{}", self.collection(kind), id)
    }

    pub fn record_file(&self, kind: ResourceKind, id: i64) -> String {
        format!("{}/file", self.record(kind, id))
    }

    /// 批量 id → 姓名
    pub fn users_lookup(&self, ids: &[i64]) -> String {
        let csv = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        format!("{}/users/lookup?ids={}", self.base, csv)
    }

    pub fn exports_create_by_task(&self) -> String {
        format!("{}/exports/createByTask", self.base)
    }

    pub fn exports_batch(&self) -> String {
        format!("{}/exports/batch", self.base)
    }
}
