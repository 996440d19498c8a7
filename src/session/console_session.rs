use super::backend::{ConsoleBackend, Download};
use super::dto::{parse_lookup, BatchExportRequest, CreateExportRequest, LookupTable, SessionIdentity};
use super::retry_session::RetrySession;
use super::urls::ApiUrls;
use crate::config::ConsoleConfig;
use crate::error::{ConsoleError, ConsoleResult};
use crate::resource::{Record, ResourceKind};
use async_trait::async_trait;
use log::info;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::{Response, StatusCode};
use serde_json::Value;

/// 控制台后端会话：把各接口封装为 `ConsoleBackend`
pub struct ConsoleSession {
    session: RetrySession,
    urls: ApiUrls,
}

impl ConsoleSession {
    pub fn new(config: &ConsoleConfig) -> ConsoleResult<Self> {
        Ok(Self {
            session: RetrySession::new(config)?,
            urls: ApiUrls::new(&config.api_base),
        })
    }

    async fn get_json(&self, url: &str) -> ConsoleResult<Value> {
        let resp = self.session.request(|client| client.get(url)).await?;
        let resp = ensure_success(resp).await?;
        Ok(resp.json::<Value>().await?)
    }
}

/// 非 2xx 转为错误，401 单独区分
async fn ensure_success(resp: Response) -> ConsoleResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(ConsoleError::Unauthorized);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ConsoleError::Status {
        status: status.as_u16(),
        body: body.chars().take(200).collect(),
    })
}

/// 从 Content-Disposition 中取出文件名
pub fn disposition_file_name(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|v| v.trim_matches('"').to_string())
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl ConsoleBackend for ConsoleSession {
    async fn fetch_profile(&self) -> ConsoleResult<Option<SessionIdentity>> {
        let url = self.urls.profile();
        let resp = self.session.request(|client| client.get(&url)).await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            info!("{} fetch_profile(...) [unauthenticated]", self);
            return Ok(None);
        }
        let resp = ensure_success(resp).await?;
        let me = resp.json::<SessionIdentity>().await?;
        info!("{} fetch_profile(...) [id {}]", self, me.id);
        Ok(Some(me))
    }

    async fn fetch_records(&self, kind: ResourceKind) -> ConsoleResult<Vec<Record>> {
        let url = self.urls.collection(kind);
        let body = self.get_json(&url).await?;
        let records = kind.parse_rows(body);
        info!("{} fetch_records(...) [{}] {} rows", self, url, records.len());
        Ok(records)
    }

    async fn lookup_users(&self, ids: &[i64]) -> ConsoleResult<LookupTable> {
        let url = self.urls.users_lookup(ids);
        let body = self.get_json(&url).await?;
        Ok(parse_lookup(body))
    }

    async fn delete_record(&self, kind: ResourceKind, id: i64) -> ConsoleResult<()> {
        let url = self.urls.record(kind, id);
        // 删除只发一次：重试可能在服务端已删除后得到 404
        let resp = self.session.request_once(|client| client.delete(&url)).await?;
        ensure_success(resp).await?;
        info!("{} delete_record(...) [{}]", self, url);
        Ok(())
    }

    async fn create_export(&self, task_id: i64) -> ConsoleResult<()> {
        let url = self.urls.exports_create_by_task();
        let body = CreateExportRequest { task_id };
        let resp = self
            .session
            .request_once(|client| client.post(&url).json(&body))
            .await?;
        ensure_success(resp).await?;
        info!("{} create_export(...) [task {}]", self, task_id);
        Ok(())
    }

    async fn create_exports_batch(&self, task_ids: &[i64]) -> ConsoleResult<()> {
        let url = self.urls.exports_batch();
        let body = BatchExportRequest {
            task_ids: task_ids.to_vec(),
        };
        let resp = self
            .session
            .request_once(|client| client.post(&url).json(&body))
            .await?;
        ensure_success(resp).await?;
        info!("{} create_exports_batch(...) [{} tasks]", self, task_ids.len());
        Ok(())
    }

    async fn download_file(&self, kind: ResourceKind, id: i64) -> ConsoleResult<Download> {
        let url = self.urls.record_file(kind, id);
        let resp = self.session.request(|client| client.get(&url)).await?;
        let resp = ensure_success(resp).await?;
        let file_name = resp
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(disposition_file_name);
        let bytes = resp.bytes().await?.to_vec();
        info!("{} download_file(...) [{}] {} bytes", self, url, bytes.len());
        Ok(Download { file_name, bytes })
    }
}

impl std::fmt::Display for ConsoleSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<ConsoleSession [{}]>", self.urls.base())
    }
}

impl std::fmt::Debug for ConsoleSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<ConsoleSession [{}]>", self.urls.base())
    }
}
