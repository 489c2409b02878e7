//! 股票行情服务
//!
//! 单只股票的实时行情与按周期聚合的历史K线

use std::sync::Arc;

use chrono::{Duration, NaiveDate};

use crate::error::{Result, ServiceError};
use crate::models::{Period, Quote, StockHistoryResponse};
use crate::services::resampler::resample;
use crate::services::source::MarketDataSource;
use crate::utils::beijing_today;

/// 历史行情最多回溯的天数
pub const MAX_HISTORY_DAYS: u32 = 365;

pub struct StockService {
    source: Arc<dyn MarketDataSource>,
}

impl StockService {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self { source }
    }

    /// 获取实时行情，数据源没有该股票时返回 `NotFound`
    pub async fn get_realtime_quote(&self, code: &str) -> Result<Quote> {
        match self.source.realtime_quote(code).await? {
            Some(quote) => Ok(quote),
            None => Err(ServiceError::NotFound(format!(
                "未找到股票 {} 的行情数据",
                code
            ))),
        }
    }

    /// 获取历史行情
    ///
    /// 先拉取最近 `days` 个自然日的日K线，再按周期在本地聚合
    pub async fn get_history_data(
        &self,
        code: &str,
        period: &str,
        days: u32,
    ) -> Result<StockHistoryResponse> {
        let period: Period = period.parse()?;
        self.get_history(code, period, days, beijing_today()).await
    }

    pub(crate) async fn get_history(
        &self,
        code: &str,
        period: Period,
        days: u32,
        today: NaiveDate,
    ) -> Result<StockHistoryResponse> {
        if days == 0 || days > MAX_HISTORY_DAYS {
            return Err(ServiceError::InvalidParameter(format!(
                "days 取值范围为 1-{}，实际为 {}",
                MAX_HISTORY_DAYS, days
            )));
        }

        let start = today - Duration::days(days as i64);
        let history = self.source.daily_history(code, start, today).await?;
        log::debug!(
            "{} 获取日K线 {} 条，聚合为 {}",
            code,
            history.bars.len(),
            period
        );

        Ok(StockHistoryResponse {
            stock_code: code.to_string(),
            stock_name: history.name,
            period,
            data: resample(&history.bars, period),
        })
    }
}
