//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置，环境变量 API_KEY / DATABASE_PATH 可覆盖文件中的值

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

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
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 数据源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// 数据源优先级，前面的失败后依次尝试后面的（eastmoney, sina）
    #[serde(default = "default_providers")]
    pub providers: Vec<String>,
    /// 单次调用失败后的最大重试次数
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// 重试基础间隔（毫秒），按次数线性递增
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// 历史数据缓存有效期（秒，0 表示不缓存）
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

/// 调用间隔策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThrottleStrategy {
    /// 不等待
    None,
    /// 固定间隔 min_ms
    Fixed,
    /// [min_ms, max_ms] 内随机间隔
    Jitter,
    /// 令牌桶限速
    TokenBucket,
}

/// 数据源调用限速配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleConfig {
    #[serde(default = "default_strategy")]
    pub strategy: ThrottleStrategy,
    #[serde(default)]
    pub min_ms: u64,
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
    /// 令牌桶每秒补充令牌数
    #[serde(default = "default_rate")]
    pub rate_per_sec: f64,
    /// 令牌桶容量
    #[serde(default = "default_burst")]
    pub burst: u32,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite 文件路径
    #[serde(default = "default_db_path")]
    pub path: String,
}

/// 配置文件查找顺序
const CONFIG_PATHS: [&str; 2] = ["config.json", "config/config.json"];

/// 配置来源
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigOrigin {
    /// 从该文件加载
    File(String),
    /// 默认配置，附带解析失败的配置文件
    Default { failures: Vec<String> },
}

impl ConfigOrigin {
    /// 输出配置加载结果，需在日志初始化之后调用
    pub fn log(&self) {
        match self {
            ConfigOrigin::File(path) => log::info!("从 {} 加载配置成功", path),
            ConfigOrigin::Default { failures } => {
                for failure in failures {
                    log::warn!("加载配置文件失败 {}", failure);
                }
                log::info!("使用默认配置");
            }
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub throttle: ThrottleConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_timeout() -> u64 { 30 }
fn default_connect_timeout() -> u64 { 10 }
fn default_log_level() -> String { "info".to_string() }
fn default_providers() -> Vec<String> { vec!["eastmoney".to_string(), "sina".to_string()] }
fn default_max_retries() -> u32 { 2 }
fn default_retry_backoff_ms() -> u64 { 500 }
fn default_cache_ttl() -> u64 { 300 }
fn default_strategy() -> ThrottleStrategy { ThrottleStrategy::Jitter }
fn default_max_ms() -> u64 { 1000 }
fn default_rate() -> f64 { 2.0 }
fn default_burst() -> u32 { 1 }
fn default_db_path() -> String { "data/stock_analysis.db".to_string() }

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

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            providers: default_providers(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            cache_ttl_secs: default_cache_ttl(),
        }
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            min_ms: 0,
            max_ms: default_max_ms(),
            rate_per_sec: default_rate(),
            burst: default_burst(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
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

    /// 加载配置，优先从文件，失败则使用默认值，最后应用环境变量覆盖
    ///
    /// 此时日志尚未初始化，加载过程由返回的 [`ConfigOrigin`] 在初始化后输出
    pub fn load() -> (Self, ConfigOrigin) {
        let (mut config, origin) = Self::load_file(&CONFIG_PATHS);
        config.apply_env();
        (config, origin)
    }

    fn load_file<P: AsRef<Path>>(paths: &[P]) -> (Self, ConfigOrigin) {
        let mut failures = Vec::new();

        for path in paths {
            let path = path.as_ref();
            if path.exists() {
                match Self::from_file(path) {
                    Ok(config) => return (config, ConfigOrigin::File(path.display().to_string())),
                    Err(e) => failures.push(format!("{}: {}", path.display(), e)),
                }
            }
        }
        (Self::default(), ConfigOrigin::Default { failures })
    }

    fn apply_env(&mut self) {
        if let Ok(api_key) = env::var("API_KEY") {
            self.api.api_key = api_key;
        }
        if let Ok(path) = env::var("DATABASE_PATH") {
            self.database.path = path;
        }
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
