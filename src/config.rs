use crate::error::ConsoleError;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8080/api";
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// 主列表加载失败时，对已加载记录集的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadFailurePolicy {
    /// 保留上一次成功加载的数据
    Retain,
    /// 清空列表（旧页面的行为）
    Clear,
}

impl std::str::FromStr for LoadFailurePolicy {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "retain" | "keep" => Ok(LoadFailurePolicy::Retain),
            "clear" => Ok(LoadFailurePolicy::Clear),
            other => Err(ConsoleError::Config(format!(
                "CONSOLE_LOAD_FAILURE 只能是 retain 或 clear，收到: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub api_base: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub cookie: Option<String>,
    pub page_size: usize,
    pub max_tries: usize,
    pub retry_delay: Duration,
    pub timeout: Duration,
    pub proxy: Option<String>,
    pub load_failure: LoadFailurePolicy,
    pub download_dir: PathBuf,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            username: None,
            password: None,
            cookie: None,
            page_size: DEFAULT_PAGE_SIZE,
            max_tries: 3,
            retry_delay: Duration::from_secs(1),
            timeout: Duration::from_secs(30),
            proxy: None,
            load_failure: LoadFailurePolicy::Retain,
            download_dir: PathBuf::from("downloads"),
        }
    }
}

impl ConsoleConfig {
    /// 先加载 `.env`，再从进程环境变量读取配置
    pub fn from_env() -> Result<Self, ConsoleError> {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConsoleError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let api_base = get("CONSOLE_API_BASE")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base);
        if !api_base.starts_with("http://") && !api_base.starts_with("https://") {
            return Err(ConsoleError::Config(format!(
                "CONSOLE_API_BASE 必须以 http:// 或 https:// 开头: {}",
                api_base
            )));
        }

        let page_size = get("CONSOLE_PAGE_SIZE")
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.page_size);
        let max_tries = get("CONSOLE_MAX_TRIES")
            .and_then(|s| s.parse::<usize>().ok())
            .map(|n| n.max(1))
            .unwrap_or(defaults.max_tries);
        let retry_delay = get("CONSOLE_RETRY_DELAY")
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|x| x.is_finite())
            .map(|x| Duration::from_secs_f64(x.max(0.0)))
            .unwrap_or(defaults.retry_delay);
        let timeout = get("CONSOLE_TIMEOUT")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|n| *n > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);
        let proxy = get("CONSOLE_PROXY").map(|t| {
            if t.contains("://") {
                t
            } else {
                format!("socks5h://{}", t)
            }
        });
        let load_failure = match get("CONSOLE_LOAD_FAILURE") {
            Some(raw) => raw.parse()?,
            None => defaults.load_failure,
        };

        Ok(Self {
            api_base,
            username: get("CONSOLE_USERNAME"),
            password: get("CONSOLE_PASSWORD"),
            cookie: get("CONSOLE_COOKIE"),
            page_size,
            max_tries,
            retry_delay,
            timeout,
            proxy,
            load_failure,
            download_dir: get("CONSOLE_DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.download_dir),
        })
    }

    /// 用户名和密码同时存在时才返回
    pub fn basic_credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(u), Some(p)) => Some((u, p)),
            _ => None,
        }
    }
}
