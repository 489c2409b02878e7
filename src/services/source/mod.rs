//! 行情数据源
//!
//! 屏蔽具体数据供应商的差异，上层服务只依赖 [`MarketDataSource`]。
//!
//! ## 数据源
//! - 东方财富：行业板块列表、板块日K线、个股日K线、实时行情
//! - 新浪财经：个股实时行情、个股日K线
//! - 同花顺：创新高排行（仅离线刷新任务使用）

mod cache;
mod eastmoney;
mod manager;
#[cfg(test)]
pub mod memory;
mod sina;
mod ths;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;
use reqwest::Client;

use crate::config::AppConfig;
use crate::error::{Result, ServiceError};
use crate::models::{Bar, Industry, InstrumentHistory, Quote};
use crate::services::throttle::RetryPolicy;

pub use cache::CachedSource;
pub use eastmoney::EastMoneySource;
pub use manager::SourceManager;
pub use sina::SinaSource;
pub use ths::ThsClient;

/// 浏览器 User-Agent，部分数据源会拒绝默认 UA
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// 行情数据源
///
/// 每个数据供应商一个实现。供应商不支持的能力使用默认实现，返回 `ServiceError::Unsupported`。
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// 数据源名称，用于日志
    fn name(&self) -> &str;

    /// 枚举一级行业板块
    async fn list_industries(&self) -> Result<Vec<Industry>> {
        Err(unsupported(self.name(), "行业板块列表"))
    }

    /// 行业板块日K线，日期闭区间 [start, end]
    async fn industry_daily_history(
        &self,
        code: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<Bar>> {
        Err(unsupported(self.name(), &format!("行业板块 {} 历史行情", code)))
    }

    /// 个股实时行情，没有数据时返回 `None`
    async fn realtime_quote(&self, code: &str) -> Result<Option<Quote>>;

    /// 个股日K线，日期闭区间 [start, end]
    async fn daily_history(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<InstrumentHistory>;
}

fn unsupported(source: &str, what: &str) -> ServiceError {
    ServiceError::Unsupported(format!("数据源 {} 不支持{}", source, what))
}

/// 交易所
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Market {
    /// 上交所
    Sh,
    /// 深交所
    Sz,
    /// 北交所
    Bj,
}

impl Market {
    /// 新浪代码前缀
    pub fn sina_prefix(&self) -> &'static str {
        match self {
            Market::Sh => "sh",
            Market::Sz => "sz",
            Market::Bj => "bj",
        }
    }

    /// 东方财富 secid 市场编号
    pub fn eastmoney_id(&self) -> u8 {
        match self {
            Market::Sh => 1,
            Market::Sz | Market::Bj => 0,
        }
    }
}

/// 解析 A 股代码，支持 600519、sh600519、SH600519、600519.SH 等写法
pub fn parse_a_share_code(code: &str) -> Option<(Market, String)> {
    let re = Regex::new(r"^(?i)(sh|sz|bj)?(\d{6})(?:\.(sh|sz|bj))?$").ok()?;
    let caps = re.captures(code.trim())?;
    let digits = caps.get(2)?.as_str().to_string();

    let explicit = caps
        .get(1)
        .or_else(|| caps.get(3))
        .map(|m| m.as_str().to_ascii_lowercase());

    let market = match explicit.as_deref() {
        Some("sh") => Market::Sh,
        Some("sz") => Market::Sz,
        Some("bj") => Market::Bj,
        _ => infer_market(&digits),
    };
    Some((market, digits))
}

fn infer_market(digits: &str) -> Market {
    if digits.starts_with('6') || digits.starts_with("900") {
        Market::Sh
    } else if digits.starts_with('8') || digits.starts_with('4') || digits.starts_with("92") {
        Market::Bj
    } else {
        Market::Sz
    }
}

/// 创建带超时的 HTTP 客户端
pub fn http_client(config: &AppConfig) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.api.timeout_secs))
        .connect_timeout(Duration::from_secs(config.api.connect_timeout_secs))
        .user_agent(USER_AGENT)
        .gzip(true)
        .build()?;
    Ok(client)
}

/// 按配置组装数据源：按优先级排列的供应商 + 重试 + 缓存
pub fn build_source(config: &AppConfig) -> Result<Arc<dyn MarketDataSource>> {
    let client = http_client(config)?;
    let mut sources: Vec<Arc<dyn MarketDataSource>> = Vec::new();

    for provider in &config.source.providers {
        match provider.as_str() {
            "eastmoney" => sources.push(Arc::new(EastMoneySource::new(client.clone()))),
            "sina" => sources.push(Arc::new(SinaSource::new(client.clone()))),
            other => log::warn!("忽略未知数据源: {}", other),
        }
    }

    if sources.is_empty() {
        return Err(ServiceError::Internal("未配置可用的数据源".to_string()));
    }

    let manager = SourceManager::new(sources, RetryPolicy::from_config(&config.source));

    if config.source.cache_ttl_secs == 0 {
        return Ok(Arc::new(manager));
    }
    Ok(Arc::new(CachedSource::new(
        Arc::new(manager),
        Duration::from_secs(config.source.cache_ttl_secs),
    )))
}
