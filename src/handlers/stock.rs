//! 股票接口处理器
//!
//! - GET /stocks/industries/above-ma5-monthly - 五月均线上一级行业
//! - GET /stocks/{code}/quote - 实时行情
//! - GET /stocks/{code}/history - 历史行情

use actix_web::{web, HttpResponse};

use crate::error::ServiceError;
use crate::models::{HistoryQuery, IndustriesAboveMa5Response, IndustryScreenQuery};
use crate::services::screener::{DEFAULT_DAILY_DAYS, DEFAULT_MIN_MONTHS};
use crate::state::AppState;

const DEFAULT_PERIOD: &str = "daily";
const DEFAULT_HISTORY_DAYS: u32 = 30;

/// 筛选当前月收盘价在五月均线（月线 MA5）之上的一级行业，按 (收盘 - 均线) 降序返回
///
/// GET /api/v1/stocks/industries/above-ma5-monthly?min_months=6&daily_days=180
pub async fn get_industries_above_ma5_monthly(
    state: web::Data<AppState>,
    query: web::Query<IndustryScreenQuery>,
) -> Result<HttpResponse, ServiceError> {
    let min_months = query.min_months.unwrap_or(DEFAULT_MIN_MONTHS);
    let daily_days = query.daily_days.unwrap_or(DEFAULT_DAILY_DAYS);

    match state
        .screener()
        .get_industries_above_ma5_monthly(min_months, daily_days)
        .await
    {
        Ok(industries) => Ok(HttpResponse::Ok().json(IndustriesAboveMa5Response { industries })),
        Err(e) => {
            log::error!("获取五月均线上一级行业失败: {}", e);
            Err(e.context("获取五月均线上一级行业失败"))
        }
    }
}

/// 获取股票实时行情
///
/// GET /api/v1/stocks/{code}/quote
pub async fn get_stock_quote(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let code = path.into_inner();

    match state.stock_service().get_realtime_quote(&code).await {
        Ok(quote) => Ok(HttpResponse::Ok().json(quote)),
        Err(e @ ServiceError::NotFound(_)) => Err(e),
        Err(e) => {
            log::error!("获取 {} 实时行情失败: {}", code, e);
            Err(e.context("获取实时行情失败"))
        }
    }
}

/// 获取股票历史K线
///
/// GET /api/v1/stocks/{code}/history?period=daily&days=30
pub async fn get_stock_history(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse, ServiceError> {
    let code = path.into_inner();
    let period = query.period.as_deref().unwrap_or(DEFAULT_PERIOD);
    let days = query.days.unwrap_or(DEFAULT_HISTORY_DAYS);

    match state
        .stock_service()
        .get_history_data(&code, period, days)
        .await
    {
        Ok(history) => Ok(HttpResponse::Ok().json(history)),
        Err(e @ (ServiceError::UnsupportedPeriod(_) | ServiceError::InvalidParameter(_))) => Err(e),
        Err(e) => {
            log::error!("获取 {} 历史行情失败: {}", code, e);
            Err(e.context("获取历史行情失败"))
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/stocks")
            .route(
                "/industries/above-ma5-monthly",
                web::get().to(get_industries_above_ma5_monthly),
            )
            .route("/{code}/quote", web::get().to(get_stock_quote))
            .route("/{code}/history", web::get().to(get_stock_history)),
    );
}
