//! 内存数据源，测试用

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;

use super::MarketDataSource;
use crate::error::{Result, ServiceError};
use crate::models::{Bar, Industry, InstrumentHistory, Quote};

#[derive(Default)]
pub struct MemorySource {
    industries: Vec<(Industry, Vec<Bar>)>,
    failing_codes: HashSet<String>,
    fail_enumeration: bool,
    quotes: HashMap<String, Quote>,
    histories: HashMap<String, InstrumentHistory>,
    calls: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_industry(mut self, code: &str, name: &str, daily: Vec<Bar>) -> Self {
        self.industries.push((
            Industry {
                code: code.to_string(),
                name: name.to_string(),
            },
            daily,
        ));
        self
    }

    /// 该板块的历史行情请求返回错误
    pub fn with_failing_industry(mut self, code: &str, name: &str) -> Self {
        self.failing_codes.insert(code.to_string());
        self.with_industry(code, name, Vec::new())
    }

    /// 行业枚举返回错误
    pub fn failing_industries(mut self) -> Self {
        self.fail_enumeration = true;
        self
    }

    pub fn with_quote(mut self, code: &str, price: f64) -> Self {
        let mut quote = Quote::empty(code);
        quote.stock_name = Some(format!("{} 名称", code));
        quote.current_price = price;
        self.quotes.insert(code.to_string(), quote);
        self
    }

    pub fn with_history(mut self, code: &str, name: Option<&str>, bars: Vec<Bar>) -> Self {
        self.histories.insert(
            code.to_string(),
            InstrumentHistory {
                name: name.map(|s| s.to_string()),
                bars,
            },
        );
        self
    }

    /// 历史数据请求次数
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list_industries(&self) -> Result<Vec<Industry>> {
        if self.fail_enumeration {
            return Err(ServiceError::Source("行业列表不可用".to_string()));
        }
        Ok(self.industries.iter().map(|(i, _)| i.clone()).collect())
    }

    async fn industry_daily_history(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_codes.contains(code) {
            return Err(ServiceError::Source(format!("板块 {} 请求超时", code)));
        }
        let bars = self
            .industries
            .iter()
            .find(|(i, _)| i.code == code)
            .map(|(_, bars)| bars.clone())
            .unwrap_or_default();
        Ok(bars
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect())
    }

    async fn realtime_quote(&self, code: &str) -> Result<Option<Quote>> {
        Ok(self.quotes.get(code).cloned())
    }

    async fn daily_history(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<InstrumentHistory> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut history = self.histories.get(code).cloned().unwrap_or(InstrumentHistory {
            name: None,
            bars: Vec::new(),
        });
        history.bars.retain(|b| b.date >= start && b.date <= end);
        Ok(history)
    }
}
