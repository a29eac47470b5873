//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置，环境变量 `CONFIG_PATH` / `API_KEY` 优先

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::services::stock::RetryPolicy;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
}

/// API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API Key（为空则不启用认证）
    #[serde(default)]
    pub api_key: String,
    /// 上游请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// 行情数据源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// 交易所后缀，东证为 `.T`
    #[serde(default = "default_market_suffix")]
    pub market_suffix: String,
    /// K线接口
    #[serde(default = "default_chart_url")]
    pub chart_url: String,
    /// 基本面接口
    #[serde(default = "default_summary_url")]
    pub summary_url: String,
    /// crumb 接口
    #[serde(default = "default_crumb_url")]
    pub crumb_url: String,
    /// 用于获取 cookie 的地址
    #[serde(default = "default_cookie_url")]
    pub cookie_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// 重试配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// 最大尝试次数
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// 退避基准时间（秒）
    #[serde(default = "default_base_delay")]
    pub base_delay_secs: f64,
}

/// 跨域配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Access-Control-Allow-Origin，为空则不添加跨域头
    #[serde(default = "default_allow_origin")]
    pub allow_origin: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub log: LogConfig,
}

// 默认值函数
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_timeout() -> u64 {
    10
}
fn default_connect_timeout() -> u64 {
    5
}
fn default_market_suffix() -> String {
    ".T".to_string()
}
fn default_chart_url() -> String {
    "https://query1.finance.yahoo.com/v8/finance/chart".to_string()
}
fn default_summary_url() -> String {
    "https://query2.finance.yahoo.com/v10/finance/quoteSummary".to_string()
}
fn default_crumb_url() -> String {
    "https://query1.finance.yahoo.com/v1/test/getcrumb".to_string()
}
fn default_cookie_url() -> String {
    "https://fc.yahoo.com".to_string()
}
fn default_user_agent() -> String {
    concat!(
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) ",
        "AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36"
    )
    .to_string()
}
fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay() -> f64 {
    2.0
}
fn default_allow_origin() -> String {
    "*".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            market_suffix: default_market_suffix(),
            chart_url: default_chart_url(),
            summary_url: default_summary_url(),
            crumb_url: default_crumb_url(),
            cookie_url: default_cookie_url(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_secs: default_base_delay(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origin: default_allow_origin(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl RetryConfig {
    /// 转换为服务层使用的重试策略，非法值回落到默认
    pub fn policy(&self) -> RetryPolicy {
        let base_delay = Duration::try_from_secs_f64(self.base_delay_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_base_delay()));
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay,
        }
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置，返回配置及其来源文件（None 表示使用默认配置）
    ///
    /// 依次查找 `CONFIG_PATH`、config.json、config/config.json，
    /// 文件存在但解析失败时报错；`API_KEY` 环境变量覆盖文件中的值
    pub fn load() -> anyhow::Result<(Self, Option<String>)> {
        let mut config_paths = vec!["config.json".to_string(), "config/config.json".to_string()];
        if let Ok(path) = env::var("CONFIG_PATH") {
            config_paths.insert(0, path);
        }

        let source = config_paths.into_iter().find(|p| Path::new(p).exists());
        let mut config = match &source {
            Some(path) => Self::from_file(path)
                .with_context(|| format!("加载配置文件 {} 失败", path))?,
            None => Self::default(),
        };

        if let Ok(key) = env::var("API_KEY") {
            config.api.api_key = key;
        }
        Ok((config, source))
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"server": {"port": 9000}, "retry": {"max_attempts": 5}}"#)
                .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay_secs, 2.0);
        assert_eq!(config.provider.market_suffix, ".T");
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
    }

    #[test]
    fn test_retry_policy_defaults() {
        let policy = RetryConfig::default().policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_retry_policy_sanitizes_values() {
        let policy = RetryConfig {
            max_attempts: 0,
            base_delay_secs: -1.0,
        }
        .policy();
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.base_delay, Duration::from_secs(2));
    }
}
