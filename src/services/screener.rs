//! 五月均线行业筛选
//!
//! 东财一级行业板块日线 → 月线 → MA5，筛选最新月收盘价在 MA5 之上的行业，
//! 按 (收盘 - 均线) 降序返回。

use std::sync::Arc;

use chrono::{Duration, NaiveDate};

use crate::error::{Result, ServiceError};
use crate::models::{Industry, IndustryAboveMa5Item, Period};
use crate::services::resampler::{latest_mean, resample};
use crate::services::source::MarketDataSource;
use crate::services::throttle::Throttle;
use crate::utils::{beijing_today, round2};

/// 均线窗口（月）
pub const MA_WINDOW: usize = 5;
/// 最少月线数取值范围
pub const MIN_MONTHS_RANGE: (usize, usize) = (5, 12);
/// 日线天数取值范围
pub const DAILY_DAYS_RANGE: (u32, u32) = (90, 365);
pub const DEFAULT_MIN_MONTHS: usize = 6;
pub const DEFAULT_DAILY_DAYS: u32 = 180;

pub struct IndustryScreener {
    source: Arc<dyn MarketDataSource>,
    throttle: Arc<Throttle>,
}

impl IndustryScreener {
    pub fn new(source: Arc<dyn MarketDataSource>, throttle: Arc<Throttle>) -> Self {
        Self { source, throttle }
    }

    /// 筛选月线收盘价在五月均线之上的一级行业
    pub async fn get_industries_above_ma5_monthly(
        &self,
        min_months: usize,
        daily_days: u32,
    ) -> Result<Vec<IndustryAboveMa5Item>> {
        self.screen(min_months, daily_days, beijing_today()).await
    }

    pub(crate) async fn screen(
        &self,
        min_months: usize,
        daily_days: u32,
        today: NaiveDate,
    ) -> Result<Vec<IndustryAboveMa5Item>> {
        validate(min_months, daily_days)?;

        let industries = self.source.list_industries().await?;
        let start = today - Duration::days(daily_days as i64);
        let total = industries.len();
        log::info!(
            "开始筛选五月均线上行业: 共 {} 个行业, 日线区间 {} ~ {}",
            total,
            start,
            today
        );

        let mut items = Vec::new();
        for (i, industry) in industries.iter().enumerate() {
            if i > 0 {
                self.throttle.pause().await;
            }
            log::debug!("[ {}/{} ] 正在查询: {} ({})", i + 1, total, industry.name, industry.code);

            match self.evaluate(industry, min_months, start, today).await {
                Ok(Some(item)) => items.push(item),
                Ok(None) => {}
                Err(e) => log::warn!("行业 {} ({}) 获取失败，跳过: {}", industry.name, industry.code, e),
            }
        }

        // sort_by 是稳定排序，差值相同的保持行业枚举顺序
        items.sort_by(|a, b| b.delta().total_cmp(&a.delta()));
        log::info!("五月均线上行业 {} 个", items.len());
        Ok(items)
    }

    /// 单个行业的筛选结果，不满足条件时返回 `None`
    async fn evaluate(
        &self,
        industry: &Industry,
        min_months: usize,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<IndustryAboveMa5Item>> {
        let daily = self
            .source
            .industry_daily_history(&industry.code, start, end)
            .await?;
        let monthly = resample(&daily, Period::Monthly);

        if monthly.len() < min_months {
            log::debug!("    -> 跳过（月线数据不足: {} < {}）", monthly.len(), min_months);
            return Ok(None);
        }

        let Some(ma5) = latest_mean(&monthly, MA_WINDOW) else {
            log::debug!("    -> 跳过（MA5 无效）");
            return Ok(None);
        };
        let Some(last) = monthly.last() else {
            return Ok(None);
        };

        let item = IndustryAboveMa5Item {
            name: industry.name.clone(),
            close: round2(last.close),
            ma5_monthly: round2(ma5),
        };
        log::debug!("    -> 本月收盘={}, 本月MA5={}", item.close, item.ma5_monthly);

        Ok((item.delta() > 0.0).then_some(item))
    }
}

fn validate(min_months: usize, daily_days: u32) -> Result<()> {
    let (min_lo, min_hi) = MIN_MONTHS_RANGE;
    if !(min_lo..=min_hi).contains(&min_months) {
        return Err(ServiceError::InvalidParameter(format!(
            "min_months 取值范围为 {}-{}，实际为 {}",
            min_lo, min_hi, min_months
        )));
    }
    let (days_lo, days_hi) = DAILY_DAYS_RANGE;
    if !(days_lo..=days_hi).contains(&daily_days) {
        return Err(ServiceError::InvalidParameter(format!(
            "daily_days 取值范围为 {}-{}，实际为 {}",
            days_lo, days_hi, daily_days
        )));
    }
    Ok(())
}
