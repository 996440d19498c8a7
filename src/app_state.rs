use crate::app_service::ServiceRequest;
use crate::commands::{AppCommand, HELP_TEXT};
use crate::config::ConsoleConfig;
use crate::error::ConsoleResult;
use crate::resource::{
    ListCoordinator, LoadApplied, LoadOutcome, LoadTicket, MutationApplied, MutationTicket,
    ResourceKind,
};
use crossterm::event::KeyCode;
use ratatui::widgets::TableState;
use std::path::PathBuf;
use std::str::FromStr;
use tokio::sync::mpsc;

pub const MENU_ITEMS: [ResourceKind; 2] = [ResourceKind::Tasks, ResourceKind::Exports];

#[derive(PartialEq, Debug, Clone)]
pub enum InputMode {
    Normal,
    Command,
    /// 等待删除确认（y 确认，其它键取消）
    Confirm,
}

#[derive(PartialEq, Debug, Clone)]
pub enum FocusArea {
    Menu,     // 焦点在左侧菜单
    MainView, // 焦点在主视图
}

#[derive(Debug)]
pub enum AppEvent {
    Loaded {
        ticket: LoadTicket,
        outcome: LoadOutcome,
    },
    Deleted {
        ticket: MutationTicket,
        result: ConsoleResult<()>,
    },
    ExportCreated {
        task_ids: Vec<i64>,
        batch: bool,
        result: ConsoleResult<()>,
    },
    Downloaded {
        kind: ResourceKind,
        id: i64,
        result: ConsoleResult<PathBuf>,
    },
}

pub struct App {
    pub view: ResourceKind,
    pub input_mode: InputMode,
    pub focus_area: FocusArea,
    pub menu_selected_index: usize,
    pub tasks: ListCoordinator,
    pub exports: ListCoordinator,
    pub selected_row: usize,
    pub table_state: TableState,
    pub pending_delete: Option<i64>,
    pub command_input: String,
    pub command_cursor: usize,
    pub command_history: Vec<String>,
    pub command_history_index: Option<usize>,
    pub log_messages: Vec<String>,
    pub req_tx: mpsc::UnboundedSender<ServiceRequest>,
    pub evt_rx: Option<mpsc::UnboundedReceiver<AppEvent>>, // 主循环启动时取走
}

impl App {
    pub fn new(
        startup_info: Vec<String>,
        config: &ConsoleConfig,
        req_tx: mpsc::UnboundedSender<ServiceRequest>,
        evt_rx: mpsc::UnboundedReceiver<AppEvent>,
    ) -> App {
        let mut log_messages = vec!["控制台已启动".to_string()];
        log_messages.extend(startup_info);

        App {
            view: ResourceKind::Tasks,
            input_mode: InputMode::Normal,
            focus_area: FocusArea::MainView,
            menu_selected_index: 0,
            tasks: ListCoordinator::new(ResourceKind::Tasks, config.page_size, config.load_failure),
            exports: ListCoordinator::new(
                ResourceKind::Exports,
                config.page_size,
                config.load_failure,
            ),
            selected_row: 0,
            table_state: {
                let mut s = TableState::default();
                s.select(Some(0));
                s
            },
            pending_delete: None,
            command_input: String::new(),
            command_cursor: 0,
            command_history: Vec::new(),
            command_history_index: None,
            log_messages,
            req_tx,
            evt_rx: Some(evt_rx),
        }
    }

    pub fn add_log(&mut self, msg: String) {
        self.log_messages.push(msg);
    }

    pub fn coordinator(&self) -> &ListCoordinator {
        self.coordinator_for(self.view)
    }

    pub fn coordinator_for(&self, kind: ResourceKind) -> &ListCoordinator {
        match kind {
            ResourceKind::Tasks => &self.tasks,
            ResourceKind::Exports => &self.exports,
        }
    }

    fn coordinator_mut(&mut self, kind: ResourceKind) -> &mut ListCoordinator {
        match kind {
            ResourceKind::Tasks => &mut self.tasks,
            ResourceKind::Exports => &mut self.exports,
        }
    }

    fn send(&mut self, req: ServiceRequest) {
        if self.req_tx.send(req).is_err() {
            self.add_log("✗ 后台服务不可用".to_string());
        }
    }

    // ---------- 加载与页面切换 ----------

    pub fn reload(&mut self) {
        let kind = self.view;
        let ticket = self.coordinator_mut(kind).begin_load();
        self.send(ServiceRequest::Load(ticket));
    }

    /// 切换页面：旧页面在途结果全部作废，新页面重新加载
    pub fn open(&mut self, kind: ResourceKind) {
        if kind != self.view {
            let old = self.view;
            self.coordinator_mut(old).abandon();
            self.view = kind;
            self.selected_row = 0;
            self.pending_delete = None;
            if self.input_mode == InputMode::Confirm {
                self.input_mode = InputMode::Normal;
            }
        }
        self.menu_selected_index = MENU_ITEMS.iter().position(|k| *k == kind).unwrap_or(0);
        self.reload();
    }

    pub fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Loaded { ticket, outcome } => {
                let title = ticket.kind.title();
                match self.coordinator_mut(ticket.kind).apply_load(ticket, outcome) {
                    LoadApplied::Applied { count } => {
                        if ticket.kind == self.view {
                            self.selected_row = 0;
                        }
                        self.add_log(format!("✓ {}: 已加载 {} 条", title, count));
                    }
                    LoadApplied::Failed(e) => {
                        self.add_log(format!("✗ {}: 加载失败 ({})", title, e));
                    }
                    LoadApplied::Stale { .. } => {}
                }
            }
            AppEvent::Deleted { ticket, result } => {
                match self.coordinator_mut(ticket.kind).apply_delete(ticket, result) {
                    MutationApplied::Removed | MutationApplied::AlreadyAbsent => {
                        self.add_log(format!("✓ 已删除 #{}", ticket.id));
                    }
                    MutationApplied::Failed(e) => {
                        self.add_log(format!("✗ 删除 #{} 失败 ({})", ticket.id, e));
                    }
                    MutationApplied::Abandoned => {}
                }
            }
            AppEvent::ExportCreated {
                task_ids,
                batch,
                result,
            } => match result {
                Ok(()) => {
                    if batch {
                        self.tasks.clear_selection();
                    }
                    self.add_log(format!("✓ 已写入导出记录 ({} 条任务)", task_ids.len()));
                }
                Err(e) => self.add_log(format!("✗ 写入导出记录失败 ({})", e)),
            },
            AppEvent::Downloaded { kind, id, result } => match result {
                Ok(path) => self.add_log(format!("✓ {} #{} 已下载到 {}", kind, id, path.display())),
                Err(e) => self.add_log(format!("✗ 下载 #{} 失败 ({})", id, e)),
            },
        }
        self.clamp_selection();
    }

    // ---------- 行光标 ----------

    pub fn clamp_selection(&mut self) {
        let len = self.coordinator().current_page().items.len();
        if self.selected_row >= len {
            self.selected_row = len.saturating_sub(1);
        }
        self.table_state.select(Some(self.selected_row));
    }

    pub fn selected_record_id(&self) -> Option<i64> {
        self.coordinator()
            .current_page()
            .items
            .get(self.selected_row)
            .map(|r| r.id)
    }

    // ---------- 命令执行 ----------

    fn request_delete(&mut self, id: i64) {
        let coord = self.coordinator();
        let Some(record) = coord.record(id) else {
            self.add_log(format!("✗ 记录 #{} 不存在", id));
            return;
        };
        if !coord.actions(record).can_delete {
            self.add_log("✗ 仅创建者或管理员可删除".to_string());
            return;
        }
        let prompt = format!("⚠ 确定删除 #{}（{}）？按 y 确认，其它键取消", id, record.name);
        self.pending_delete = Some(id);
        self.input_mode = InputMode::Confirm;
        self.add_log(prompt);
    }

    fn confirm_delete(&mut self) {
        let Some(id) = self.pending_delete.take() else {
            return;
        };
        let kind = self.view;
        match self.coordinator_mut(kind).begin_delete(id) {
            Ok(ticket) => {
                self.add_log(format!("正在删除 #{}...", id));
                self.send(ServiceRequest::Delete(ticket));
            }
            Err(e) => self.add_log(format!("✗ {}", e)),
        }
    }

    /// 执行命令，返回 true 表示退出
    pub fn execute(&mut self, cmd: AppCommand) -> bool {
        let kind = self.view;
        match cmd {
            AppCommand::Reload => self.reload(),
            AppCommand::Open(k) => self.open(k),
            AppCommand::Tab(tab) => {
                self.coordinator_mut(kind).set_tab(tab);
                self.selected_row = 0;
                self.add_log(format!("标签: {}", kind.tab_label(tab)));
            }
            AppCommand::Search(text) => {
                self.coordinator_mut(kind).set_search(&text);
                self.selected_row = 0;
            }
            AppCommand::Page(n) => {
                self.coordinator_mut(kind).set_page(n);
                self.selected_row = 0;
            }
            AppCommand::Select(id) => match self.coordinator_mut(kind).toggle_selection(id) {
                Ok(true) => self.add_log(format!("已勾选 #{}", id)),
                Ok(false) => self.add_log(format!("已取消勾选 #{}", id)),
                Err(e) => self.add_log(format!("✗ {}", e)),
            },
            AppCommand::Delete(id) => self.request_delete(id),
            AppCommand::Stop(id) => match self.coordinator().check_stop(id) {
                Ok(record) => {
                    let msg = format!("⚠ 终止接口未接入，无法终止 #{}（{}）", id, record.name);
                    self.add_log(msg);
                }
                Err(e) => self.add_log(format!("✗ {}", e)),
            },
            AppCommand::Export(id) => {
                if kind != ResourceKind::Tasks {
                    self.add_log("✗ 请在任务管理中发起导出".to_string());
                } else {
                    match self.tasks.check_export(id) {
                        Ok(_) => self.send(ServiceRequest::CreateExport { task_id: id }),
                        Err(e) => self.add_log(format!("✗ {}", e)),
                    }
                }
            }
            AppCommand::ExportSelected => {
                let ids = self.tasks.selected_ids();
                if kind != ResourceKind::Tasks {
                    self.add_log("✗ 请在任务管理中发起导出".to_string());
                } else if ids.is_empty() {
                    self.add_log("⚠ 请先勾选任务".to_string());
                } else {
                    self.send(ServiceRequest::BatchExport { task_ids: ids });
                }
            }
            AppCommand::Download(id) => match self.coordinator().check_download(id) {
                Ok(_) => self.send(ServiceRequest::Download { kind, id }),
                Err(e) => self.add_log(format!("✗ {}", e)),
            },
            AppCommand::Help => self.add_log(HELP_TEXT.to_string()),
            AppCommand::Quit => return true,
            AppCommand::Unknown(msg) => {
                if msg.starts_with("用法") {
                    self.add_log(msg);
                } else if !msg.is_empty() {
                    self.add_log(format!("未知命令: {}", msg));
                }
            }
        }
        self.clamp_selection();
        false
    }

    /// 获取当前的预测建议
    pub fn get_completion_hint(&self) -> Option<String> {
        let commands = [
            "reload", "tasks", "exports", "tab", "search", "page", "select", "delete", "stop",
            "export", "download", "help", "quit",
        ];
        let input = self.command_input.trim();
        if input.is_empty() {
            return None;
        }

        let parts: Vec<&str> = input.split_whitespace().collect();
        match parts.as_slice() {
            [first] => commands
                .iter()
                .find(|c| c.starts_with(first) && *c != first)
                .map(|c| c[first.len()..].to_string()),
            ["tab", cur] => ["all", "running", "stopped", "completed", "failed", "other"]
                .iter()
                .find(|s| s.starts_with(cur) && *s != cur)
                .map(|s| s[cur.len()..].to_string()),
            ["export", cur] => {
                if "selected".starts_with(cur) && *cur != "selected" {
                    Some("selected"[cur.len()..].to_string())
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn finish_command_input(&mut self) {
        self.command_history_index = None;
        self.command_input.clear();
        self.command_cursor = 0;
        self.input_mode = InputMode::Normal;
    }

    pub fn handle_key_event(&mut self, key: KeyCode) -> bool {
        match self.input_mode {
            InputMode::Confirm => {
                if matches!(key, KeyCode::Char('y') | KeyCode::Char('Y')) {
                    self.input_mode = InputMode::Normal;
                    self.confirm_delete();
                } else {
                    self.input_mode = InputMode::Normal;
                    if let Some(id) = self.pending_delete.take() {
                        self.add_log(format!("已取消删除 #{}", id));
                    }
                }
                return false;
            }
            InputMode::Command => return self.handle_command_key(key),
            InputMode::Normal => {}
        }

        // 正常模式下的按键处理
        match key {
            KeyCode::Char('/') | KeyCode::Char(':') => {
                self.input_mode = InputMode::Command;
                self.command_input.clear();
                self.command_cursor = 0;
                false
            }
            KeyCode::Char('q') => true,
            KeyCode::Left => {
                self.focus_area = FocusArea::Menu;
                false
            }
            KeyCode::Right => {
                self.focus_area = FocusArea::MainView;
                false
            }
            KeyCode::Up => {
                if self.focus_area == FocusArea::Menu {
                    self.menu_selected_index = self.menu_selected_index.saturating_sub(1);
                } else if self.selected_row > 0 {
                    self.selected_row -= 1;
                    self.table_state.select(Some(self.selected_row));
                }
                false
            }
            KeyCode::Down => {
                if self.focus_area == FocusArea::Menu {
                    if self.menu_selected_index < MENU_ITEMS.len() - 1 {
                        self.menu_selected_index += 1;
                    }
                } else {
                    let len = self.coordinator().current_page().items.len();
                    if self.selected_row + 1 < len {
                        self.selected_row += 1;
                        self.table_state.select(Some(self.selected_row));
                    }
                }
                false
            }
            KeyCode::Enter | KeyCode::Char('c') => {
                if self.focus_area == FocusArea::Menu {
                    let kind = MENU_ITEMS[self.menu_selected_index.min(MENU_ITEMS.len() - 1)];
                    self.open(kind);
                    self.focus_area = FocusArea::MainView;
                }
                false
            }
            KeyCode::Char('n') | KeyCode::PageDown => {
                let kind = self.view;
                self.coordinator_mut(kind).next_page();
                self.selected_row = 0;
                self.clamp_selection();
                false
            }
            KeyCode::Char('p') | KeyCode::PageUp => {
                let kind = self.view;
                self.coordinator_mut(kind).prev_page();
                self.selected_row = 0;
                self.clamp_selection();
                false
            }
            KeyCode::Char('f') => {
                let kind = self.view;
                self.coordinator_mut(kind).cycle_tab();
                self.selected_row = 0;
                self.clamp_selection();
                false
            }
            KeyCode::Char('r') => {
                self.reload();
                false
            }
            KeyCode::Char('E') => self.execute(AppCommand::ExportSelected),
            KeyCode::Char(c) if self.focus_area == FocusArea::MainView => {
                let Some(id) = self.selected_record_id() else {
                    return false;
                };
                match c {
                    ' ' => self.execute(AppCommand::Select(id)),
                    'd' => self.execute(AppCommand::Delete(id)),
                    's' => self.execute(AppCommand::Stop(id)),
                    'e' => self.execute(AppCommand::Export(id)),
                    'o' => self.execute(AppCommand::Download(id)),
                    _ => false,
                }
            }
            _ => false,
        }
    }

    fn handle_command_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Enter => {
                let cmd_owned = self.command_input.trim().to_string();
                if cmd_owned.is_empty() || cmd_owned == "q" {
                    self.finish_command_input();
                    return false;
                }
                let app_cmd = AppCommand::from_str(&cmd_owned)
                    .unwrap_or_else(|_| AppCommand::Unknown(cmd_owned.clone()));
                self.command_history.push(cmd_owned);
                self.finish_command_input();
                self.execute(app_cmd)
            }
            KeyCode::Esc => {
                self.finish_command_input();
                false
            }
            KeyCode::Tab => {
                if let Some(hint) = self.get_completion_hint() {
                    let insert = format!("{} ", hint);
                    let at = self.byte_cursor();
                    self.command_input.insert_str(at, &insert);
                    self.command_cursor += insert.chars().count();
                }
                false
            }
            KeyCode::Up => {
                if self.command_history.is_empty() {
                    return false;
                }
                let next = match self.command_history_index {
                    None => self.command_history.len() - 1,
                    Some(i) => i.saturating_sub(1),
                };
                self.command_history_index = Some(next);
                self.command_input = self.command_history[next].clone();
                self.command_cursor = self.command_input.chars().count();
                false
            }
            KeyCode::Down => {
                let Some(i) = self.command_history_index else {
                    return false;
                };
                let n = i + 1;
                if n >= self.command_history.len() {
                    self.command_history_index = None;
                    self.command_input.clear();
                    self.command_cursor = 0;
                } else {
                    self.command_history_index = Some(n);
                    self.command_input = self.command_history[n].clone();
                    self.command_cursor = self.command_input.chars().count();
                }
                false
            }
            KeyCode::Backspace => {
                if self.command_cursor > 0 {
                    self.command_cursor -= 1;
                    let at = self.byte_cursor();
                    self.command_input.remove(at);
                }
                false
            }
            KeyCode::Delete => {
                if self.command_cursor < self.command_input.chars().count() {
                    let at = self.byte_cursor();
                    self.command_input.remove(at);
                }
                false
            }
            KeyCode::Left => {
                self.command_cursor = self.command_cursor.saturating_sub(1);
                false
            }
            KeyCode::Right => {
                if self.command_cursor < self.command_input.chars().count() {
                    self.command_cursor += 1;
                }
                false
            }
            KeyCode::Home => {
                self.command_cursor = 0;
                false
            }
            KeyCode::End => {
                self.command_cursor = self.command_input.chars().count();
                false
            }
            KeyCode::Char(c) => {
                let at = self.byte_cursor();
                self.command_input.insert(at, c);
                self.command_cursor += 1;
                false
            }
            _ => false,
        }
    }

    /// 光标以字符计，这里换算成字节下标（搜索词多为中文）
    pub fn byte_cursor(&self) -> usize {
        self.command_input
            .char_indices()
            .nth(self.command_cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.command_input.len())
    }
}
