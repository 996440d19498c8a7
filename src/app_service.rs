use crate::app_state::AppEvent;
use crate::error::ConsoleResult;
use crate::resource::loader::load_snapshot;
use crate::resource::{LoadTicket, MutationTicket, ResourceKind};
use crate::session::{ConsoleBackend, Download};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

/// 发往后台的网络请求；所有状态写入都回到 UI 线程完成
#[derive(Debug, Clone)]
pub enum ServiceRequest {
    Load(LoadTicket),
    Delete(MutationTicket),
    CreateExport { task_id: i64 },
    BatchExport { task_ids: Vec<i64> },
    Download { kind: ResourceKind, id: i64 },
}

/// 后台 actor：逐条接收请求，每条请求独立运行，完成后以事件回报
pub async fn run_service(
    backend: Arc<dyn ConsoleBackend>,
    download_dir: PathBuf,
    mut req_rx: mpsc::UnboundedReceiver<ServiceRequest>,
    evt_tx: mpsc::UnboundedSender<AppEvent>,
) {
    while let Some(req) = req_rx.recv().await {
        let backend = backend.clone();
        let dir = download_dir.clone();
        let tx = evt_tx.clone();
        tokio::spawn(async move {
            handle_request(backend.as_ref(), &dir, req, &tx).await;
        });
    }
    info!("service channel closed, background loop exits");
}

pub async fn handle_request(
    backend: &dyn ConsoleBackend,
    download_dir: &Path,
    req: ServiceRequest,
    tx: &mpsc::UnboundedSender<AppEvent>,
) {
    let event = match req {
        ServiceRequest::Load(ticket) => {
            let outcome = load_snapshot(backend, ticket.kind).await;
            AppEvent::Loaded { ticket, outcome }
        }
        ServiceRequest::Delete(ticket) => {
            let result = backend.delete_record(ticket.kind, ticket.id).await;
            AppEvent::Deleted { ticket, result }
        }
        ServiceRequest::CreateExport { task_id } => {
            let result = backend.create_export(task_id).await;
            AppEvent::ExportCreated {
                task_ids: vec![task_id],
                batch: false,
                result,
            }
        }
        ServiceRequest::BatchExport { task_ids } => {
            let result = backend.create_exports_batch(&task_ids).await;
            AppEvent::ExportCreated {
                task_ids,
                batch: true,
                result,
            }
        }
        ServiceRequest::Download { kind, id } => {
            let result = match backend.download_file(kind, id).await {
                Ok(file) => save_download(download_dir, kind, id, file).await,
                Err(e) => Err(e),
            };
            AppEvent::Downloaded { kind, id, result }
        }
    };

    if tx.send(event).is_err() {
        error!("event channel closed, result dropped");
    }
}

/// 写入下载目录；服务端给出的文件名只取最后一段，防止越出目录
pub async fn save_download(
    dir: &Path,
    kind: ResourceKind,
    id: i64,
    file: Download,
) -> ConsoleResult<PathBuf> {
    let name = file
        .file_name
        .as_deref()
        .and_then(|n| Path::new(n).file_name())
        .map(|n| n.to_string_lossy().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("{}-{}.bin", kind.collection(), id));

    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(name);
    tokio::fs::write(&path, &file.bytes).await?;
    info!("saved {} bytes to {}", file.bytes.len(), path.display());
    Ok(path)
}
