use crate::session::dto::{ExportRow, TaskRow};
use log::warn;
use serde_json::Value;

/// 信息性指标，不参与控制逻辑
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metric {
    pub count: Option<u64>,
    pub bytes: Option<u64>,
    pub duration_secs: Option<u64>,
}

/// 任务或导出记录（对引擎而言结构相同）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: i64,
    pub name: String,
    pub raw_status: Option<String>,
    pub owner_id: Option<i64>,
    pub timestamp: Option<String>,
    pub metric: Metric,
    /// 由身份解析器事后填充，从不来自主列表接口
    pub owner_name: Option<String>,
}

impl Record {
    pub fn from_task(row: TaskRow) -> Option<Self> {
        Some(Self {
            id: row.id?,
            name: row.task_name.unwrap_or_default(),
            raw_status: row.collect_status,
            owner_id: row.creator_id,
            timestamp: row.created_at,
            metric: Metric {
                count: row.record_count,
                bytes: None,
                duration_secs: row.collect_duration,
            },
            owner_name: None,
        })
    }

    pub fn from_export(row: ExportRow) -> Option<Self> {
        Some(Self {
            id: row.id?,
            name: row.task_name.unwrap_or_default(),
            raw_status: row.export_status,
            owner_id: row.creator_id,
            timestamp: row.exported_at,
            metric: Metric {
                count: row.record_count,
                bytes: row.file_size_bytes,
                duration_secs: None,
            },
            owner_name: None,
        })
    }
}

/// 把主列表响应解析为记录；非数组按空列表处理，缺少 id 的行被跳过
pub fn parse_rows<T, F>(body: Value, convert: F) -> Vec<Record>
where
    T: serde::de::DeserializeOwned,
    F: Fn(T) -> Option<Record>,
{
    let items = match body {
        Value::Array(items) => items,
        other => {
            warn!("list response is not an array, treating as empty: {}", other);
            return Vec::new();
        }
    };

    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value::<T>(item) {
            Ok(row) => match convert(row) {
                Some(rec) => out.push(rec),
                None => warn!("skipping row without id"),
            },
            Err(e) => warn!("skipping undecodable row: {}", e),
        }
    }
    out
}
