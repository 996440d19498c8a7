use super::format::{format_bytes, format_duration};
use super::pipeline::TabFilter;
use super::record::{parse_rows, Record};
use super::status::{
    CanonicalStatus, StatusDecor, StatusTable, EXPORT_STATUS_TABLE, TASK_STATUS_TABLE,
};
use serde_json::Value;

/// 资源种类：任务列表与导出列表共用同一套引擎，差异全部在这里注入
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Tasks,
    Exports,
}

const TASK_TABS: &[(TabFilter, &str)] = &[
    (TabFilter::All, "全部"),
    (TabFilter::Status(CanonicalStatus::Running), "运行中"),
    (TabFilter::Status(CanonicalStatus::Stopped), "已终止"),
    (TabFilter::Status(CanonicalStatus::Completed), "已完成"),
];

const EXPORT_TABS: &[(TabFilter, &str)] = &[
    (TabFilter::All, "全部"),
    (TabFilter::Status(CanonicalStatus::Running), "导出中"),
    (TabFilter::Status(CanonicalStatus::Completed), "已完成"),
    (TabFilter::Status(CanonicalStatus::Failed), "失败"),
];

impl ResourceKind {
    pub fn collection(&self) -> &'static str {
        match self {
            ResourceKind::Tasks => "tasks",
            ResourceKind::Exports => "exports",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ResourceKind::Tasks => "任务管理",
            ResourceKind::Exports => "导出记录",
        }
    }

    pub fn status_table(&self) -> &'static StatusTable {
        match self {
            ResourceKind::Tasks => &TASK_STATUS_TABLE,
            ResourceKind::Exports => &EXPORT_STATUS_TABLE,
        }
    }

    pub fn classify(&self, record: &Record) -> StatusDecor {
        self.status_table().classify(record.raw_status.as_deref())
    }

    pub fn tabs(&self) -> &'static [(TabFilter, &'static str)] {
        match self {
            ResourceKind::Tasks => TASK_TABS,
            ResourceKind::Exports => EXPORT_TABS,
        }
    }

    /// 循环切换到下一个标签
    pub fn next_tab(&self, current: TabFilter) -> TabFilter {
        let tabs = self.tabs();
        let idx = tabs.iter().position(|(t, _)| *t == current);
        match idx {
            Some(i) => tabs[(i + 1) % tabs.len()].0,
            None => TabFilter::All,
        }
    }

    pub fn tab_label(&self, tab: TabFilter) -> &'static str {
        self.tabs()
            .iter()
            .find(|(t, _)| *t == tab)
            .map(|(_, label)| *label)
            .unwrap_or("其它")
    }

    pub fn parse_rows(&self, body: Value) -> Vec<Record> {
        match self {
            ResourceKind::Tasks => parse_rows(body, Record::from_task),
            ResourceKind::Exports => parse_rows(body, Record::from_export),
        }
    }

    pub fn metric_title(&self) -> &'static str {
        match self {
            ResourceKind::Tasks => "采集用时",
            ResourceKind::Exports => "文件大小",
        }
    }

    pub fn metric_text(&self, record: &Record) -> String {
        match self {
            ResourceKind::Tasks => format_duration(record.metric.duration_secs.unwrap_or(0)),
            ResourceKind::Exports => format_bytes(record.metric.bytes.unwrap_or(0)),
        }
    }

    pub fn timestamp_title(&self) -> &'static str {
        match self {
            ResourceKind::Tasks => "创建时间",
            ResourceKind::Exports => "导出时间",
        }
    }

    /// 只有任务可以终止、可以发起导出
    pub fn supports_task_actions(&self) -> bool {
        matches!(self, ResourceKind::Tasks)
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.collection())
    }
}
