use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// `GET /profile` 返回的当前登录用户
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIdentity {
    #[serde(deserialize_with = "required_id")]
    pub id: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default, alias = "realName")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl SessionIdentity {
    /// 优先显示真实姓名，其次用户名
    pub fn self_name(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| Some(self.username.as_str()).filter(|s| !s.trim().is_empty()))
    }
}

/// `GET /tasks` 的单行
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRow {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<i64>,
    #[serde(default)]
    pub task_name: Option<String>,
    #[serde(default)]
    pub collect_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub creator_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub collect_duration: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub record_count: Option<u64>,
}

/// `GET /exports` 的单行
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRow {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub task_id: Option<i64>,
    #[serde(default)]
    pub task_name: Option<String>,
    #[serde(default)]
    pub export_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub creator_id: Option<i64>,
    #[serde(default)]
    pub exported_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub file_size_bytes: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub record_count: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExportRequest {
    pub task_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchExportRequest {
    pub task_ids: Vec<i64>,
}

/// `GET /users/lookup` 的结果：字符串 id → 显示名
pub type LookupTable = HashMap<String, String>;

/// 解析批量查询结果；非字符串或空值视为缺失
pub fn parse_lookup(v: Value) -> LookupTable {
    match v {
        Value::Object(map) => map
            .into_iter()
            .filter_map(|(k, v)| match v {
                Value::String(s) if !s.trim().is_empty() => Some((k, s)),
                _ => None,
            })
            .collect(),
        _ => LookupTable::new(),
    }
}

fn value_as_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn lenient_id<'de, D>(d: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(value_as_i64))
}

fn lenient_count<'de, D>(d: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref()
        .and_then(|v| match v {
            Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        }))
}

fn required_id<'de, D>(d: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(d)?;
    value_as_i64(&v).ok_or_else(|| serde::de::Error::custom(format!("invalid id: {}", v)))
}
