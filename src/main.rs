mod app_service;
mod app_state;
mod commands;
mod config;
mod error;
mod resource;
mod session;
mod ui;

use anyhow::Context;
use chrono::Local;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::app_service::run_service;
use crate::app_state::{App, AppEvent};
use crate::config::ConsoleConfig;
use crate::session::{ConsoleBackend, ConsoleSession};
use crate::ui::draw;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let ts = Local::now().format("%Y%m%d-%H%M%S").to_string();
    let log_dir = std::path::PathBuf::from("logs");
    std::fs::create_dir_all(&log_dir).context("无法创建日志目录")?;
    let log_file = std::fs::File::create(log_dir.join(format!("console-{}.log", ts)))
        .context("无法创建日志文件")?;
    // TUI 占用终端，日志只写文件
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter_level(log::LevelFilter::Warn)
        .filter_module("taskconsole", log::LevelFilter::Info)
        .init();

    let config = ConsoleConfig::from_env().context("读取配置失败")?;
    let mut startup_info = vec![format!("API 地址: {}", config.api_base)];
    match config.basic_credentials() {
        Some((user, _)) => startup_info.push(format!("✓ 使用账号: {}", user)),
        None if config.cookie.is_some() => startup_info.push("✓ 使用 Cookie 认证".to_string()),
        None => startup_info.push("⚠ 未配置 CONSOLE_USERNAME / CONSOLE_COOKIE".to_string()),
    }

    let session = ConsoleSession::new(&config).context("创建 HTTP 会话失败")?;
    log::info!("{} created", session);
    let backend: Arc<dyn ConsoleBackend> = Arc::new(session);
    probe_profile(backend.as_ref(), &mut startup_info).await;

    let (req_tx, req_rx) = mpsc::unbounded_channel();
    let (evt_tx, evt_rx) = mpsc::unbounded_channel::<AppEvent>();
    tokio::spawn(run_service(
        backend,
        config.download_dir.clone(),
        req_rx,
        evt_tx,
    ));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let mut app = App::new(startup_info, &config, req_tx, evt_rx);
    app.reload();

    let res = match app.evt_rx.take() {
        Some(rx) => run_app_loop(&mut terminal, &mut app, rx).await,
        None => Ok(()),
    };

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res.context("界面主循环异常退出")
}

/// 启动时探测一次登录状态，只用于提示，失败不影响启动
async fn probe_profile(backend: &dyn ConsoleBackend, info: &mut Vec<String>) {
    info.push("正在检查登录状态...".to_string());
    match backend.fetch_profile().await {
        Ok(Some(me)) => info.push(format!(
            "✓ 当前用户: {} (#{})",
            me.self_name().unwrap_or("-"),
            me.id
        )),
        Ok(None) => info.push("⚠ 未登录，删除与终止按钮将不可用".to_string()),
        Err(e) => info.push(format!("✗ 获取用户信息失败: {}", e)),
    }
}

async fn run_app_loop<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut evt_rx: mpsc::UnboundedReceiver<AppEvent>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, app))?;

        while let Ok(event) = evt_rx.try_recv() {
            app.apply_event(event);
        }

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_key_event(key.code) {
                    return Ok(());
                }
            }
        }
    }
}
