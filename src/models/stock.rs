//! 股票数据模型
//!
//! 定义K线、K线周期、实时行情等数据结构

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// K线周期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// 日线
    Daily,
    /// 周线（按 ISO 周聚合）
    Weekly,
    /// 月线（按自然月聚合）
    Monthly,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
        }
    }
}

impl FromStr for Period {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Period::Daily),
            "weekly" => Ok(Period::Weekly),
            "monthly" => Ok(Period::Monthly),
            other => Err(ServiceError::UnsupportedPeriod(other.to_string())),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// K线数据
///
/// 一个时间桶内的 OHLCV 数据，序列内按日期升序排列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// 日期（周线/月线为桶内最后一个交易日）
    pub date: NaiveDate,
    /// 开盘价
    pub open: f64,
    /// 最高价
    pub high: f64,
    /// 最低价
    pub low: f64,
    /// 收盘价
    pub close: f64,
    /// 成交量
    pub volume: u64,
    /// 成交额
    pub amount: f64,
    /// 涨跌幅（百分比）
    pub change_percent: Option<f64>,
}

/// 股票实时行情
///
/// 数据源未提供的字段保持为空，只有当前价缺失时取 0.0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// 股票代码
    pub stock_code: String,
    /// 股票名称
    pub stock_name: Option<String>,
    /// 当前价格
    pub current_price: f64,
    /// 涨跌额
    pub change: Option<f64>,
    /// 涨跌幅（百分比）
    pub change_percent: Option<f64>,
    /// 开盘价
    pub open: Option<f64>,
    /// 最高价
    pub high: Option<f64>,
    /// 最低价
    pub low: Option<f64>,
    /// 昨收价
    pub prev_close: Option<f64>,
    /// 成交量
    pub volume: Option<u64>,
    /// 成交额
    pub amount: Option<f64>,
    /// 更新时间
    pub update_time: Option<String>,
}

impl Quote {
    /// 仅包含代码的空行情，字段由数据源逐个填充
    pub fn empty(stock_code: &str) -> Self {
        Self {
            stock_code: stock_code.to_string(),
            stock_name: None,
            current_price: 0.0,
            change: None,
            change_percent: None,
            open: None,
            high: None,
            low: None,
            prev_close: None,
            volume: None,
            amount: None,
            update_time: None,
        }
    }
}

/// 数据源返回的单只股票日线历史
#[derive(Debug, Clone)]
pub struct InstrumentHistory {
    /// 股票名称（部分数据源不提供）
    pub name: Option<String>,
    /// 日K线，按日期升序
    pub bars: Vec<Bar>,
}

/// 历史行情查询参数
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// K线周期：daily / weekly / monthly
    pub period: Option<String>,
    /// 获取天数（1-365）
    pub days: Option<u32>,
}

/// 历史行情响应
#[derive(Debug, Serialize, Deserialize)]
pub struct StockHistoryResponse {
    pub stock_code: String,
    pub stock_name: Option<String>,
    pub period: Period,
    pub data: Vec<Bar>,
}
