use crate::config::ConsoleConfig;
use crate::error::{ConsoleError, ConsoleResult};
use base64::Engine;
use log::{info, warn};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, COOKIE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;

/// 默认判定：5xx 与 429 视为“非预期”，需要重试
pub fn default_expected(resp: &Response) -> bool {
    let status = resp.status();
    !status.is_server_error() && status != StatusCode::TOO_MANY_REQUESTS
}

/// 带凭据与重试的 HTTP 会话
///
/// 每个请求都会携带配置中的凭据（Basic 认证头和/或 Cookie），
/// 并在传输错误或非预期响应时按固定间隔重试。
pub struct RetrySession {
    client: Client,
    expected: Box<dyn Fn(&Response) -> bool + Send + Sync>,
    max_tries: usize,
    delay_unexpected: Duration,
}

impl RetrySession {
    pub fn new(config: &ConsoleConfig) -> ConsoleResult<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .user_agent("taskconsole/0.1")
            .default_headers(credential_headers(config)?);

        if let Some(ref url) = config.proxy {
            let proxy = reqwest::Proxy::all(url).map_err(|e| ConsoleError::Config(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            client: builder.build()?,
            expected: Box::new(default_expected),
            max_tries: config.max_tries.max(1),
            delay_unexpected: config.retry_delay,
        })
    }

    /// 执行请求（带重试）
    ///
    /// # 参数
    ///
    /// * `builder` - 一个闭包，接收 Client 并返回 RequestBuilder；每次重试都会重新调用
    pub async fn request<F>(&self, builder: F) -> ConsoleResult<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        self.request_with_tries(builder, self.max_tries).await
    }

    /// 只发送一次，不论结果如何都不重试。删除与创建导出这类有副作用的请求走这里
    pub async fn request_once<F>(&self, builder: F) -> ConsoleResult<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        self.request_with_tries(builder, 1).await
    }

    async fn request_with_tries<F>(&self, builder: F, max_tries: usize) -> ConsoleResult<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let max_tries = max_tries.max(1);
        let mut last_err = None;

        for try_num in 1..=max_tries {
            match builder(&self.client).send().await {
                Ok(resp) => {
                    if (self.expected)(&resp) || try_num == max_tries {
                        if (self.expected)(&resp) {
                            info!("{} {} [{} tries]", self, resp.url(), try_num);
                        } else {
                            warn!(
                                "{} {} [max {} tries ran out, HTTP {}]",
                                self,
                                resp.url(),
                                try_num,
                                resp.status()
                            );
                        }
                        return Ok(resp);
                    }
                    warn!(
                        "{} {} unexpected HTTP {} (try {}/{})",
                        self,
                        resp.url(),
                        resp.status(),
                        try_num,
                        max_tries
                    );
                }
                Err(e) => {
                    warn!("{} request failed (try {}/{}): {}", self, try_num, max_tries, e);
                    last_err = Some(e);
                }
            }

            if try_num < max_tries {
                tokio::time::sleep(self.delay_unexpected).await;
            }
        }

        Err(last_err
            .map(ConsoleError::from)
            .unwrap_or_else(|| ConsoleError::Http("no response".to_string())))
    }
}

fn credential_headers(config: &ConsoleConfig) -> ConsoleResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    if let Some((user, pass)) = config.basic_credentials() {
        let token =
            base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", user, pass));
        let value = HeaderValue::from_str(&format!("Basic {}", token))
            .map_err(|e| ConsoleError::Config(format!("无效的认证信息: {}", e)))?;
        headers.insert(AUTHORIZATION, value);
    }
    if let Some(ref cookie) = config.cookie {
        let value = HeaderValue::from_str(cookie)
            .map_err(|e| ConsoleError::Config(format!("无效的 CONSOLE_COOKIE: {}", e)))?;
        headers.insert(COOKIE, value);
    }
    Ok(headers)
}

impl std::fmt::Display for RetrySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<RetrySession [max {}]>", self.max_tries)
    }
}

impl std::fmt::Debug for RetrySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<RetrySession [max {}]>", self.max_tries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_and_cookie_headers() {
        let cfg = ConsoleConfig {
            username: Some("admin".into()),
            password: Some("pw".into()),
            cookie: Some("JSESSIONID=abc".into()),
            ..Default::default()
        };
        let h = credential_headers(&cfg).unwrap();
        assert_eq!(h.get(AUTHORIZATION).unwrap(), "Basic YWRtaW46cHc=");
        assert_eq!(h.get(COOKIE).unwrap(), "JSESSIONID=abc");
    }

    #[test]
    fn no_credentials_no_headers() {
        let h = credential_headers(&ConsoleConfig::default()).unwrap();
        assert!(h.is_empty());
    }

    #[test]
    fn control_characters_in_cookie_are_rejected() {
        let cfg = ConsoleConfig {
            cookie: Some("a\nb".into()),
            ..Default::default()
        };
        assert!(matches!(credential_headers(&cfg), Err(ConsoleError::Config(_))));
    }
}
