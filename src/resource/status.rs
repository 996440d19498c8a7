use serde::{Deserialize, Serialize};

/// 规范化状态键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalStatus {
    Running,
    Completed,
    Stopped,
    Failed,
    Other,
}

impl CanonicalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalStatus::Running => "running",
            CanonicalStatus::Completed => "completed",
            CanonicalStatus::Stopped => "stopped",
            CanonicalStatus::Failed => "failed",
            CanonicalStatus::Other => "other",
        }
    }
}

impl std::str::FromStr for CanonicalStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "running" => Ok(CanonicalStatus::Running),
            "completed" => Ok(CanonicalStatus::Completed),
            "stopped" => Ok(CanonicalStatus::Stopped),
            "failed" => Ok(CanonicalStatus::Failed),
            "other" => Ok(CanonicalStatus::Other),
            _ => Err(()),
        }
    }
}

/// 视觉样式标记，由 UI 层映射为颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusStyle {
    Active,
    Done,
    Muted,
    Danger,
    Neutral,
}

impl StatusStyle {
    pub fn symbol(&self) -> &'static str {
        match self {
            StatusStyle::Active => "▶",
            StatusStyle::Done => "✓",
            StatusStyle::Muted => "‖",
            StatusStyle::Danger => "✗",
            StatusStyle::Neutral => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// 原始状态包含任一关键字
    Contains,
    /// 原始状态与任一关键字完全相等
    Exact,
}

#[derive(Debug, Clone, Copy)]
pub struct StatusRule {
    pub patterns: &'static [&'static str],
    pub key: CanonicalStatus,
    pub label: &'static str,
    pub style: StatusStyle,
}

/// 有序规则表：按顺序匹配，首个命中者胜出
#[derive(Debug, Clone, Copy)]
pub struct StatusTable {
    pub mode: MatchMode,
    pub rules: &'static [StatusRule],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusDecor {
    pub key: CanonicalStatus,
    pub label: String,
    pub style: StatusStyle,
}

pub const TASK_STATUS_TABLE: StatusTable = StatusTable {
    mode: MatchMode::Contains,
    rules: &[
        StatusRule {
            patterns: &["运行"],
            key: CanonicalStatus::Running,
            label: "运行中",
            style: StatusStyle::Active,
        },
        StatusRule {
            patterns: &["完成"],
            key: CanonicalStatus::Completed,
            label: "已完成",
            style: StatusStyle::Done,
        },
        StatusRule {
            patterns: &["终止", "停止", "暂停"],
            key: CanonicalStatus::Stopped,
            label: "已终止",
            style: StatusStyle::Muted,
        },
        StatusRule {
            patterns: &["失败"],
            key: CanonicalStatus::Failed,
            label: "失败",
            style: StatusStyle::Danger,
        },
    ],
};

pub const EXPORT_STATUS_TABLE: StatusTable = StatusTable {
    mode: MatchMode::Exact,
    rules: &[
        StatusRule {
            patterns: &["running"],
            key: CanonicalStatus::Running,
            label: "导出中",
            style: StatusStyle::Active,
        },
        StatusRule {
            patterns: &["completed"],
            key: CanonicalStatus::Completed,
            label: "已完成",
            style: StatusStyle::Done,
        },
        StatusRule {
            patterns: &["failed"],
            key: CanonicalStatus::Failed,
            label: "失败",
            style: StatusStyle::Danger,
        },
    ],
};

impl StatusTable {
    /// 全函数：任何输入（包括 None / 空串）都落到唯一的规范键上
    pub fn classify(&self, raw: Option<&str>) -> StatusDecor {
        let s = raw.unwrap_or("");
        let hit = self.rules.iter().find(|rule| {
            rule.patterns.iter().any(|p| match self.mode {
                MatchMode::Contains => s.contains(p),
                MatchMode::Exact => s == *p,
            })
        });

        match hit {
            Some(rule) => StatusDecor {
                key: rule.key,
                label: rule.label.to_string(),
                style: rule.style,
            },
            None => StatusDecor {
                key: CanonicalStatus::Other,
                label: if s.is_empty() {
                    "-".to_string()
                } else {
                    s.to_string()
                },
                style: StatusStyle::Neutral,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_keywords_follow_priority_order() {
        let t = &TASK_STATUS_TABLE;
        assert_eq!(t.classify(Some("运行中")).key, CanonicalStatus::Running);
        assert_eq!(t.classify(Some("已完成")).key, CanonicalStatus::Completed);
        assert_eq!(t.classify(Some("已暂停")).key, CanonicalStatus::Stopped);
        assert_eq!(t.classify(Some("手动停止")).key, CanonicalStatus::Stopped);
        assert_eq!(t.classify(Some("失败")).key, CanonicalStatus::Failed);
        // "运行" 排在 "失败" 之前
        assert_eq!(t.classify(Some("运行失败")).key, CanonicalStatus::Running);
        // "完成" 排在 "终止" 之前
        assert_eq!(t.classify(Some("完成后终止")).key, CanonicalStatus::Completed);
    }

    #[test]
    fn task_labels_are_canonical_not_raw() {
        let d = TASK_STATUS_TABLE.classify(Some("采集运行"));
        assert_eq!(d.label, "运行中");
        assert_eq!(d.style, StatusStyle::Active);
    }

    #[test]
    fn export_uses_exact_tokens() {
        let t = &EXPORT_STATUS_TABLE;
        assert_eq!(t.classify(Some("running")).label, "导出中");
        assert_eq!(t.classify(Some("completed")).key, CanonicalStatus::Completed);
        assert_eq!(t.classify(Some("failed")).key, CanonicalStatus::Failed);
        assert_eq!(t.classify(Some("Running")).key, CanonicalStatus::Other);
        assert_eq!(t.classify(Some("not_running")).key, CanonicalStatus::Other);
    }

    #[test]
    fn classification_is_total() {
        for table in [&TASK_STATUS_TABLE, &EXPORT_STATUS_TABLE] {
            let none = table.classify(None);
            assert_eq!(none.key, CanonicalStatus::Other);
            assert_eq!(none.label, "-");
            assert_eq!(table.classify(Some("")).label, "-");
            let odd = table.classify(Some("排队中"));
            assert_eq!(odd.key, CanonicalStatus::Other);
            assert_eq!(odd.label, "排队中");
            assert_eq!(odd.style, StatusStyle::Neutral);
        }
    }

    #[test]
    fn canonical_key_parses_from_tab_names() {
        assert_eq!("Stopped".parse::<CanonicalStatus>(), Ok(CanonicalStatus::Stopped));
        assert!("all".parse::<CanonicalStatus>().is_err());
    }
}
