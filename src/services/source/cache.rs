//! 历史数据缓存
//!
//! 短时间内相同 (代码, 日期区间) 的请求直接返回缓存，减少对数据源的重复调用。
//! 实时行情不缓存。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;

use super::MarketDataSource;
use crate::error::Result;
use crate::models::{Bar, Industry, InstrumentHistory, Quote};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    Industries,
    IndustryHistory(String, NaiveDate, NaiveDate),
    History(String, NaiveDate, NaiveDate),
}

#[derive(Clone)]
enum CacheValue {
    Industries(Vec<Industry>),
    Bars(Vec<Bar>),
    History(InstrumentHistory),
}

pub struct CachedSource {
    inner: Arc<dyn MarketDataSource>,
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, (Instant, CacheValue)>>,
}

impl CachedSource {
    pub fn new(inner: Arc<dyn MarketDataSource>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn get(&self, key: &CacheKey) -> Option<CacheValue> {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        entries.retain(|_, (stored, _)| now.duration_since(*stored) < self.ttl);
        entries.get(key).map(|(_, value)| value.clone())
    }

    fn put(&self, key: CacheKey, value: CacheValue) {
        self.entries.lock().insert(key, (Instant::now(), value));
    }
}

#[async_trait]
impl MarketDataSource for CachedSource {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn list_industries(&self) -> Result<Vec<Industry>> {
        if let Some(CacheValue::Industries(v)) = self.get(&CacheKey::Industries) {
            return Ok(v);
        }
        let industries = self.inner.list_industries().await?;
        self.put(CacheKey::Industries, CacheValue::Industries(industries.clone()));
        Ok(industries)
    }

    async fn industry_daily_history(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>> {
        let key = CacheKey::IndustryHistory(code.to_string(), start, end);
        if let Some(CacheValue::Bars(bars)) = self.get(&key) {
            log::debug!("命中缓存: 板块 {} {}~{}", code, start, end);
            return Ok(bars);
        }
        let bars = self.inner.industry_daily_history(code, start, end).await?;
        self.put(key, CacheValue::Bars(bars.clone()));
        Ok(bars)
    }

    async fn realtime_quote(&self, code: &str) -> Result<Option<Quote>> {
        self.inner.realtime_quote(code).await
    }

    async fn daily_history(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<InstrumentHistory> {
        let key = CacheKey::History(code.to_string(), start, end);
        if let Some(CacheValue::History(history)) = self.get(&key) {
            log::debug!("命中缓存: {} {}~{}", code, start, end);
            return Ok(history);
        }
        let history = self.inner.daily_history(code, start, end).await?;
        self.put(key, CacheValue::History(history.clone()));
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::source::memory::MemorySource;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[tokio::test]
    async fn test_repeated_history_hits_cache() {
        let memory = Arc::new(MemorySource::new().with_history("600519", Some("贵州茅台"), Vec::new()));
        let cached = CachedSource::new(memory.clone(), Duration::from_secs(60));

        cached.daily_history("600519", day(1), day(31)).await.unwrap();
        cached.daily_history("600519", day(1), day(31)).await.unwrap();
        assert_eq!(memory.calls(), 1);

        cached.daily_history("600519", day(2), day(31)).await.unwrap();
        assert_eq!(memory.calls(), 2);
    }

    #[tokio::test]
    async fn test_expired_entries_refetch() {
        let memory = Arc::new(MemorySource::new().with_industry("BK0001", "银行", Vec::new()));
        let cached = CachedSource::new(memory.clone(), Duration::ZERO);

        cached.industry_daily_history("BK0001", day(1), day(31)).await.unwrap();
        cached.industry_daily_history("BK0001", day(1), day(31)).await.unwrap();
        assert_eq!(memory.calls(), 2);
    }
}
