//! 多数据源管理
//!
//! 按优先级依次尝试各数据源，前一个失败（或没有数据）时切换到下一个

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::MarketDataSource;
use crate::error::{Result, ServiceError};
use crate::models::{Bar, Industry, InstrumentHistory, Quote};
use crate::services::throttle::RetryPolicy;

pub struct SourceManager {
    sources: Vec<Arc<dyn MarketDataSource>>,
    retry: RetryPolicy,
}

impl SourceManager {
    pub fn new(sources: Vec<Arc<dyn MarketDataSource>>, retry: RetryPolicy) -> Self {
        Self { sources, retry }
    }

    fn no_source() -> ServiceError {
        ServiceError::Internal("没有可用的数据源".to_string())
    }
}

/// 记录失败原因：保留第一个真实错误，不支持该能力的数据源只在没有其他错误时返回
fn record_failure(slot: &mut Option<ServiceError>, label: &str, e: ServiceError) {
    if matches!(e, ServiceError::Unsupported(_)) {
        log::debug!("{} 跳过: {}", label, e);
        if slot.is_none() {
            *slot = Some(e);
        }
        return;
    }

    log::warn!("{} 失败，尝试下一个数据源: {}", label, e);
    if matches!(slot, None | Some(ServiceError::Unsupported(_))) {
        *slot = Some(e);
    }
}

#[async_trait]
impl MarketDataSource for SourceManager {
    fn name(&self) -> &str {
        "manager"
    }

    async fn list_industries(&self) -> Result<Vec<Industry>> {
        let mut failure = None;
        for source in &self.sources {
            let label = format!("[{}] 获取行业列表", source.name());
            match self.retry.run(&label, || source.list_industries()).await {
                Ok(industries) => return Ok(industries),
                Err(e) => record_failure(&mut failure, &label, e),
            }
        }
        Err(failure.unwrap_or_else(Self::no_source))
    }

    async fn industry_daily_history(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>> {
        let mut failure = None;
        for source in &self.sources {
            let label = format!("[{}] 获取板块 {} 日线", source.name(), code);
            match self
                .retry
                .run(&label, || source.industry_daily_history(code, start, end))
                .await
            {
                Ok(bars) => return Ok(bars),
                Err(e) => record_failure(&mut failure, &label, e),
            }
        }
        Err(failure.unwrap_or_else(Self::no_source))
    }

    async fn realtime_quote(&self, code: &str) -> Result<Option<Quote>> {
        let mut failure = None;
        let mut any_empty = false;
        for source in &self.sources {
            let label = format!("[{}] 获取 {} 实时行情", source.name(), code);
            match self.retry.run(&label, || source.realtime_quote(code)).await {
                Ok(Some(quote)) => return Ok(Some(quote)),
                Ok(None) => any_empty = true,
                Err(e) => record_failure(&mut failure, &label, e),
            }
        }
        match failure {
            Some(e) if !any_empty => Err(e),
            None if self.sources.is_empty() => Err(Self::no_source()),
            _ => Ok(None),
        }
    }

    async fn daily_history(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<InstrumentHistory> {
        let mut failure = None;
        let mut empty = None;
        for source in &self.sources {
            let label = format!("[{}] 获取 {} 日线", source.name(), code);
            match self
                .retry
                .run(&label, || source.daily_history(code, start, end))
                .await
            {
                Ok(history) if !history.bars.is_empty() => return Ok(history),
                Ok(history) => {
                    empty.get_or_insert(history);
                }
                Err(e) => record_failure(&mut failure, &label, e),
            }
        }
        match (empty, failure) {
            (Some(history), _) => Ok(history),
            (None, Some(e)) => Err(e),
            (None, None) => Err(Self::no_source()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::services::source::memory::MemorySource;

    /// 只提供个股行情的数据源，行业相关能力走默认实现
    struct QuoteOnlySource;

    #[async_trait]
    impl MarketDataSource for QuoteOnlySource {
        fn name(&self) -> &str {
            "quote_only"
        }

        async fn realtime_quote(&self, _code: &str) -> Result<Option<Quote>> {
            Ok(None)
        }

        async fn daily_history(
            &self,
            _code: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<InstrumentHistory> {
            Ok(InstrumentHistory {
                name: None,
                bars: Vec::new(),
            })
        }
    }

    fn manager(sources: Vec<MemorySource>) -> SourceManager {
        SourceManager::new(
            sources
                .into_iter()
                .map(|s| Arc::new(s) as Arc<dyn MarketDataSource>)
                .collect(),
            RetryPolicy::none(),
        )
    }

    #[tokio::test]
    async fn test_falls_through_on_error() {
        let failing = MemorySource::new().failing_industries();
        let healthy = MemorySource::new().with_industry("BK0001", "银行", Vec::new());
        let industries = manager(vec![failing, healthy]).list_industries().await.unwrap();
        assert_eq!(industries.len(), 1);
        assert_eq!(industries[0].name, "银行");
    }

    #[tokio::test]
    async fn test_all_sources_fail() {
        let result = manager(vec![MemorySource::new().failing_industries()])
            .list_industries()
            .await;
        assert!(matches!(result, Err(ServiceError::Source(_))));
    }

    #[tokio::test]
    async fn test_quote_falls_through_on_missing() {
        let empty = MemorySource::new();
        let quoted = MemorySource::new().with_quote("600519", 1688.0);
        let quote = manager(vec![empty, quoted])
            .realtime_quote("600519")
            .await
            .unwrap();
        assert_eq!(quote.unwrap().current_price, 1688.0);
    }

    #[tokio::test]
    async fn test_quote_missing_everywhere() {
        let quote = manager(vec![MemorySource::new(), MemorySource::new()])
            .realtime_quote("NONEXISTENT")
            .await
            .unwrap();
        assert!(quote.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsupported_source_keeps_vendor_error() {
        let manager = SourceManager::new(
            vec![
                Arc::new(MemorySource::new().failing_industries()) as Arc<dyn MarketDataSource>,
                Arc::new(QuoteOnlySource),
            ],
            RetryPolicy {
                max_retries: 2,
                backoff: Duration::from_millis(200),
            },
        );

        let started = tokio::time::Instant::now();
        let result = manager.list_industries().await;

        match result {
            Err(ServiceError::Source(message)) => assert_eq!(message, "行业列表不可用"),
            other => panic!("unexpected result: {:?}", other.map(|v| v.len())),
        }
        // 只有第一个数据源的两次重试等待（200ms + 400ms），不支持的能力不重试
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(600));
        assert!(elapsed < Duration::from_millis(700));
    }

    #[tokio::test]
    async fn test_only_unsupported_sources() {
        let manager = SourceManager::new(
            vec![Arc::new(QuoteOnlySource) as Arc<dyn MarketDataSource>],
            RetryPolicy::none(),
        );
        assert!(matches!(
            manager.list_industries().await,
            Err(ServiceError::Unsupported(_))
        ));
    }
}
