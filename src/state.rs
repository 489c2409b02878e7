//! 应用共享状态

use std::sync::Arc;

use crate::services::screener::IndustryScreener;
use crate::services::source::MarketDataSource;
use crate::services::stock_service::StockService;
use crate::services::throttle::Throttle;

/// 各 worker 共享的数据源与节流器，服务对象按请求创建
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn MarketDataSource>,
    pub throttle: Arc<Throttle>,
}

impl AppState {
    pub fn new(source: Arc<dyn MarketDataSource>, throttle: Throttle) -> Self {
        Self {
            source,
            throttle: Arc::new(throttle),
        }
    }

    pub fn stock_service(&self) -> StockService {
        StockService::new(self.source.clone())
    }

    pub fn screener(&self) -> IndustryScreener {
        IndustryScreener::new(self.source.clone(), self.throttle.clone())
    }
}
