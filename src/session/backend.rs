use super::dto::{LookupTable, SessionIdentity};
use crate::error::ConsoleResult;
use crate::resource::{Record, ResourceKind};
use async_trait::async_trait;

/// 下载得到的文件
#[derive(Debug, Clone)]
pub struct Download {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

/// 引擎依赖的后端契约
#[async_trait]
pub trait ConsoleBackend: Send + Sync {
    /// 当前登录用户；401 视为未登录，返回 `Ok(None)`
    async fn fetch_profile(&self) -> ConsoleResult<Option<SessionIdentity>>;

    async fn fetch_records(&self, kind: ResourceKind) -> ConsoleResult<Vec<Record>>;

    async fn lookup_users(&self, ids: &[i64]) -> ConsoleResult<LookupTable>;

    async fn delete_record(&self, kind: ResourceKind, id: i64) -> ConsoleResult<()>;

    async fn create_export(&self, task_id: i64) -> ConsoleResult<()>;

    async fn create_exports_batch(&self, task_ids: &[i64]) -> ConsoleResult<()>;

    async fn download_file(&self, kind: ResourceKind, id: i64) -> ConsoleResult<Download>;
}
