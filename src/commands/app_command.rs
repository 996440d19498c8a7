use crate::resource::{ResourceKind, TabFilter};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Reload,
    Open(ResourceKind),
    Tab(TabFilter),
    Search(String),
    Page(usize),
    Select(i64),
    Delete(i64),
    Stop(i64),
    Export(i64),
    ExportSelected,
    Download(i64),
    Help,
    Quit,
    Unknown(String),
}

pub const HELP_TEXT: &str = "可用命令: reload | tasks | exports | tab <all|running|stopped|completed|failed> | search [文本] | page <n> | select <id> | delete <id> | stop <id> | export <id>|selected | download <id> | quit";

fn parse_id(arg: Option<&&str>, usage: &str) -> Result<i64, AppCommand> {
    arg.and_then(|s| s.trim_start_matches('#').parse::<i64>().ok())
        .ok_or_else(|| AppCommand::Unknown(format!("用法: {}", usage)))
}

impl FromStr for AppCommand {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        if parts.is_empty() {
            return Ok(AppCommand::Unknown("".to_string()));
        }

        let cmd = match parts[0] {
            "reload" | "refresh" | "r" => AppCommand::Reload,
            "tasks" => AppCommand::Open(ResourceKind::Tasks),
            "exports" => AppCommand::Open(ResourceKind::Exports),
            "tab" => match parts.get(1).map(|t| t.parse::<TabFilter>()) {
                Some(Ok(tab)) => AppCommand::Tab(tab),
                _ => AppCommand::Unknown(
                    "用法: tab <all|running|stopped|completed|failed|other>".to_string(),
                ),
            },
            "search" | "filter" => {
                // 保留原始文本（含内部空格），过滤时再 trim
                let rest = s.trim_start();
                let rest = rest[parts[0].len()..].trim();
                AppCommand::Search(rest.to_string())
            }
            "page" => match parts.get(1).and_then(|p| p.parse::<usize>().ok()) {
                Some(n) => AppCommand::Page(n),
                None => AppCommand::Unknown("用法: page <n>".to_string()),
            },
            "select" => match parse_id(parts.get(1), "select <id>") {
                Ok(id) => AppCommand::Select(id),
                Err(cmd) => cmd,
            },
            "delete" | "del" => match parse_id(parts.get(1), "delete <id>") {
                Ok(id) => AppCommand::Delete(id),
                Err(cmd) => cmd,
            },
            "stop" => match parse_id(parts.get(1), "stop <id>") {
                Ok(id) => AppCommand::Stop(id),
                Err(cmd) => cmd,
            },
            "export" => {
                if parts.get(1) == Some(&"selected") {
                    AppCommand::ExportSelected
                } else {
                    match parse_id(parts.get(1), "export <id>|selected") {
                        Ok(id) => AppCommand::Export(id),
                        Err(cmd) => cmd,
                    }
                }
            }
            "download" | "dl" => match parse_id(parts.get(1), "download <id>") {
                Ok(id) => AppCommand::Download(id),
                Err(cmd) => cmd,
            },
            "help" | "h" | "?" => AppCommand::Help,
            "quit" | "exit" => AppCommand::Quit,
            other => AppCommand::Unknown(other.to_string()),
        };
        Ok(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::CanonicalStatus;

    fn parse(s: &str) -> AppCommand {
        s.parse().unwrap()
    }

    #[test]
    fn parses_core_commands() {
        assert_eq!(parse("reload"), AppCommand::Reload);
        assert_eq!(parse("exports"), AppCommand::Open(ResourceKind::Exports));
        assert_eq!(parse("delete 7"), AppCommand::Delete(7));
        assert_eq!(parse("delete #7"), AppCommand::Delete(7));
        assert_eq!(parse("export selected"), AppCommand::ExportSelected);
        assert_eq!(parse("export 3"), AppCommand::Export(3));
        assert_eq!(parse("page 2"), AppCommand::Page(2));
        assert_eq!(
            parse("tab stopped"),
            AppCommand::Tab(TabFilter::Status(CanonicalStatus::Stopped))
        );
        assert_eq!(parse("tab all"), AppCommand::Tab(TabFilter::All));
    }

    #[test]
    fn search_keeps_inner_spaces_and_allows_clear() {
        assert_eq!(parse("search 新闻 采集"), AppCommand::Search("新闻 采集".into()));
        assert_eq!(parse("  search   "), AppCommand::Search(String::new()));
    }

    #[test]
    fn bad_arguments_become_usage_hints() {
        assert!(matches!(parse("delete x"), AppCommand::Unknown(m) if m.contains("delete <id>")));
        assert!(matches!(parse("tab nope"), AppCommand::Unknown(_)));
        assert_eq!(parse("frobnicate"), AppCommand::Unknown("frobnicate".into()));
    }
}
