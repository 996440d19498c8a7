use crate::app_state::{App, FocusArea, InputMode, MENU_ITEMS};
use crate::resource::format::format_timestamp;
use crate::resource::identity::owner_label;
use crate::resource::permission::RowActions;
use crate::resource::{ListCoordinator, LoadState, Record, StatusStyle};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, Paragraph, Row, Table},
    Frame,
};

pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([
            Constraint::Length(3), // 顶部标题栏
            Constraint::Min(0),    // 中间内容区域
            Constraint::Min(8),    // 底部命令/日志区域
        ])
        .split(f.size());

    render_top_bar(f, chunks[0], app);

    let middle_chunks = Layout::default()
        .direction(ratatui::layout::Direction::Horizontal)
        .constraints([Constraint::Length(20), Constraint::Min(0)])
        .split(chunks[1]);

    render_left_menu(f, middle_chunks[0], app);
    render_main_view(f, middle_chunks[1], app);
    render_bottom_bar(f, chunks[2], app);
}

fn style_color(style: StatusStyle) -> Color {
    match style {
        StatusStyle::Active => Color::Cyan,
        StatusStyle::Done => Color::Green,
        StatusStyle::Muted => Color::DarkGray,
        StatusStyle::Danger => Color::Red,
        StatusStyle::Neutral => Color::Gray,
    }
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::White)
    }
}

fn render_top_bar(f: &mut Frame, area: Rect, app: &App) {
    let who = app
        .coordinator()
        .session()
        .map(|s| format!("{} (#{})", s.self_name().unwrap_or("-"), s.id))
        .unwrap_or_else(|| "未登录".to_string());

    let title_text = Line::from(vec![
        Span::styled(
            " 任务控制台 ",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" - "),
        Span::styled(who, Style::default().fg(Color::Yellow)),
    ]);

    let paragraph = Paragraph::new(title_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Cyan)),
        )
        .alignment(ratatui::layout::Alignment::Center);

    f.render_widget(paragraph, area);
}

fn render_left_menu(f: &mut Frame, area: Rect, app: &App) {
    let menu_items: Vec<ListItem> = MENU_ITEMS
        .iter()
        .enumerate()
        .map(|(i, kind)| {
            let is_selected = i == app.menu_selected_index;
            let is_active = *kind == app.view;

            let style = if is_selected && app.focus_area == FocusArea::Menu {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Magenta)
                    .add_modifier(Modifier::BOLD)
            } else if is_active {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };

            let prefix = if is_active { "● " } else { "○ " };
            ListItem::new(format!("{}{}", prefix, kind.title())).style(style)
        })
        .collect();

    let title = if app.focus_area == FocusArea::Menu {
        "菜单 (Enter 打开)"
    } else {
        "菜单 (← 切换)"
    };

    let menu = List::new(menu_items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .style(focus_style(app.focus_area == FocusArea::Menu)),
    );
    f.render_widget(menu, area);
}

/// 行内可用操作提示，不可用的操作不显示
fn action_hint(coord: &ListCoordinator, record: &Record, actions: RowActions) -> String {
    if coord.is_mutating(record.id) {
        return "删除中...".to_string();
    }
    let mut hints = Vec::new();
    if actions.can_delete {
        hints.push("d删除");
    }
    if actions.can_stop {
        hints.push("s终止");
    }
    if actions.can_export {
        hints.push("e导出");
    }
    if actions.can_download {
        hints.push("o下载");
    }
    hints.join(" ")
}

fn render_tabs_line(coord: &ListCoordinator) -> Line<'static> {
    let kind = coord.kind();
    let current = coord.view().tab;
    let mut spans = Vec::new();
    for (tab, label) in kind.tabs() {
        let style = if *tab == current {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {} ", label), style));
        spans.push(Span::raw(" "));
    }
    if !coord.view().search.trim().is_empty() {
        spans.push(Span::styled(
            format!(" 搜索: \"{}\"", coord.view().search.trim()),
            Style::default().fg(Color::Magenta),
        ));
    }
    Line::from(spans)
}

fn render_main_view(f: &mut Frame, area: Rect, app: &mut App) {
    let focused = app.focus_area == FocusArea::MainView;
    let coord = app.coordinator_for(app.view);
    let kind = coord.kind();
    let page = coord.current_page();

    let state_text = match coord.state() {
        LoadState::Loading => " 加载中...".to_string(),
        LoadState::LoadFailed(e) => format!(" 加载失败: {}", e),
        LoadState::Idle | LoadState::Loaded => String::new(),
    };
    let title = format!(
        "{} [共 {} 条 {}/{}]{}",
        kind.title(),
        page.total_count,
        page.page,
        page.total_pages,
        state_text
    );

    let chunks = Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);
    f.render_widget(Paragraph::new(render_tabs_line(coord)), chunks[0]);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .style(focus_style(focused));

    if page.items.is_empty() {
        let hint = if coord.is_loading() {
            "加载中..."
        } else {
            "暂无数据 (r 刷新)"
        };
        f.render_widget(Paragraph::new(hint).block(block), chunks[1]);
        return;
    }

    let rows: Vec<Row> = page
        .items
        .iter()
        .map(|record| {
            let decor = kind.classify(record);
            let color = style_color(decor.style);
            let actions = coord.actions(record);
            let mark = if coord.is_selected(record.id) {
                "[x]"
            } else if actions.selectable {
                "[ ]"
            } else {
                "   "
            };
            Row::new(vec![
                Cell::from(mark),
                Cell::from(format!("{} {}", decor.style.symbol(), decor.label))
                    .style(Style::default().fg(color)),
                Cell::from(format!("#{}", record.id)),
                Cell::from(record.name.clone()),
                Cell::from(kind.metric_text(record)),
                Cell::from(record.metric.count.unwrap_or(0).to_string()),
                Cell::from(owner_label(record)),
                Cell::from(format_timestamp(record.timestamp.as_deref())),
                Cell::from(action_hint(coord, record, actions))
                    .style(Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();

    let header = Row::new(vec![
        "",
        "状态",
        "ID",
        "名称",
        kind.metric_title(),
        "条数",
        "创建者",
        kind.timestamp_title(),
        "操作",
    ])
    .style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let widths = [
        Constraint::Length(3),
        Constraint::Length(10),
        Constraint::Length(7),
        Constraint::Min(16),
        Constraint::Length(12),
        Constraint::Length(8),
        Constraint::Length(12),
        Constraint::Length(16),
        Constraint::Length(24),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    app.table_state.select(Some(app.selected_row));
    f.render_stateful_widget(table, chunks[1], &mut app.table_state);
}

fn render_bottom_bar(f: &mut Frame, area: Rect, app: &App) {
    let bottom_chunks = Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let command_prompt = match app.input_mode {
        InputMode::Command => {
            let mut spans = vec![Span::styled(
                "命令: ",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )];
            let (left, right) = app.command_input.split_at(app.byte_cursor());
            spans.push(Span::raw(left));
            spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
            spans.push(Span::raw(right));
            if let Some(hint) = app.get_completion_hint() {
                spans.push(Span::styled(hint, Style::default().fg(Color::DarkGray)));
            }
            vec![
                Line::from(spans),
                Line::from("Enter执行 Esc取消 Tab补全 ←→光标 Home/End ↑↓历史"),
            ]
        }
        InputMode::Confirm => vec![
            Line::from(Span::styled(
                format!("确认删除 #{}？", app.pending_delete.unwrap_or_default()),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Line::from("y 确认  其它键取消"),
        ],
        InputMode::Normal => vec![
            Line::from(vec![
                Span::styled("命令: ", Style::default().fg(Color::Yellow)),
                Span::raw("(按 / 进入命令模式)"),
            ]),
            Line::from(
                "↑↓行 n/p翻页 f标签 r刷新 空格勾选 d删除 s终止 e导出 E批量导出 o下载 ←菜单 q退出",
            ),
        ],
    };
    let command_paragraph = Paragraph::new(command_prompt).block(
        Block::default()
            .borders(Borders::ALL)
            .title(match app.input_mode {
                InputMode::Command => "命令输入模式",
                InputMode::Confirm => "删除确认",
                InputMode::Normal => "命令输入",
            })
            .style(match app.input_mode {
                InputMode::Command => Style::default().fg(Color::Green),
                InputMode::Confirm => Style::default().fg(Color::Red),
                InputMode::Normal => Style::default().fg(Color::White),
            }),
    );
    f.render_widget(command_paragraph, bottom_chunks[0]);

    // 最新的在顶部，最多 20 条
    let log_items: Vec<ListItem> = app
        .log_messages
        .iter()
        .rev()
        .take(20)
        .map(|msg| {
            let style = if msg.starts_with("✓") {
                Style::default().fg(Color::Green)
            } else if msg.starts_with("✗") {
                Style::default().fg(Color::Red)
            } else if msg.starts_with("⚠") {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(msg.as_str()).style(style)
        })
        .collect();

    let log = List::new(log_items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("日志 (共 {} 条)", app.log_messages.len()))
            .style(Style::default().fg(Color::White)),
    );
    f.render_widget(log, bottom_chunks[1]);
}
