//! 新浪财经数据源
//!
//! 提供实时行情、日K线
//! 对接 https://hq.sinajs.cn 和 https://quotes.sina.cn

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;

use super::{parse_a_share_code, MarketDataSource};
use crate::error::{Result, ServiceError};
use crate::models::{Bar, InstrumentHistory, Quote};
use crate::utils::{json_f64, parse_opt_f64};

/// 新浪实时行情 API
pub const SINA_REALTIME_API: &str = "https://hq.sinajs.cn";
/// 新浪K线 API（scale=240 为日线）
pub const SINA_KLINE_API: &str =
    "https://quotes.sina.cn/cn/api/jsonp_v2.php/=/CN_MarketDataService.getKLineData";

/// 新浪财经数据源
pub struct SinaSource {
    client: Client,
}

impl SinaSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MarketDataSource for SinaSource {
    fn name(&self) -> &str {
        "sina"
    }

    async fn realtime_quote(&self, code: &str) -> Result<Option<Quote>> {
        let Some((market, digits)) = parse_a_share_code(code) else {
            return Ok(None);
        };
        let url = format!("{}/list={}{}", SINA_REALTIME_API, market.sina_prefix(), digits);
        log::debug!("📡 请求新浪实时行情: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Referer", "https://finance.sina.com.cn/")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::Source(format!(
                "获取股票数据失败: {}",
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        let text = encoding_rs::GBK.decode(&bytes).0.to_string();

        parse_sina_quote(&text, code)
    }

    async fn daily_history(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<InstrumentHistory> {
        let Some((market, digits)) = parse_a_share_code(code) else {
            return Ok(InstrumentHistory {
                name: None,
                bars: Vec::new(),
            });
        };
        let symbol = format!("{}{}", market.sina_prefix(), digits);
        // 日历天数一定不少于交易日数，取回后再按日期过滤
        let datalen = ((end - start).num_days() + 1).max(1).to_string();

        let response = self
            .client
            .get(SINA_KLINE_API)
            .query(&[
                ("symbol", symbol.as_str()),
                ("scale", "240"),
                ("ma", "no"),
                ("datalen", datalen.as_str()),
            ])
            .header("Referer", "https://finance.sina.com.cn/")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::Source(format!(
                "获取历史数据失败: {}",
                response.status()
            )));
        }

        let text = response.text().await?;
        let bars = parse_sina_history(&text)?
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();

        Ok(InstrumentHistory { name: None, bars })
    }
}

/// 解析新浪股票实时数据
///
/// 格式: var hq_str_sh600000="浦发银行,10.00,10.01,10.05,10.07,9.98,10.05,10.06,123456,123456789,...";
/// 引号内为空表示代码无效或已退市
fn parse_sina_quote(data: &str, code: &str) -> Result<Option<Quote>> {
    let start = data
        .find('"')
        .ok_or_else(|| ServiceError::Source("无法解析响应数据".to_string()))?;
    let end = data
        .rfind('"')
        .ok_or_else(|| ServiceError::Source("无法解析响应数据".to_string()))?;
    if end <= start {
        return Err(ServiceError::Source("无法解析响应数据".to_string()));
    }
    let content = &data[start + 1..end];

    if content.is_empty() {
        return Ok(None);
    }

    let fields: Vec<&str> = content.split(',').collect();
    if fields.len() < 32 {
        return Err(ServiceError::Source("数据字段不足".to_string()));
    }

    // 价格为 0 表示当日未成交或停牌
    let price = |i: usize| parse_opt_f64(fields[i]).filter(|v| *v > 0.0);

    let prev_close = price(2);
    let current = price(3);
    let change = match (current, prev_close) {
        (Some(c), Some(p)) => Some(c - p),
        _ => None,
    };
    let change_percent = match (change, prev_close) {
        (Some(c), Some(p)) => Some(c / p * 100.0),
        _ => None,
    };

    Ok(Some(Quote {
        stock_code: code.to_string(),
        stock_name: Some(fields[0].to_string()).filter(|s| !s.is_empty()),
        current_price: current.unwrap_or(0.0),
        change,
        change_percent,
        open: price(1),
        high: price(4),
        low: price(5),
        prev_close,
        volume: parse_opt_f64(fields[8]).map(|v| v as u64),
        amount: parse_opt_f64(fields[9]),
        update_time: Some(format!("{} {}", fields[30], fields[31])),
    }))
}

/// 解析新浪日K线
///
/// 格式: =([{day:"2024-01-01",open:"10.00",high:"10.50",low:"9.80",close:"10.20",volume:"123456"},...]);
fn parse_sina_history(data: &str) -> Result<Vec<Bar>> {
    let (Some(start), Some(end)) = (data.find("(["), data.rfind("])")) else {
        // 无数据时新浪返回 null
        return Ok(Vec::new());
    };
    let json_str = &data[start + 1..end + 1];

    let json_data: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| ServiceError::Source(format!("解析历史数据失败: {}", e)))?;

    let mut history = Vec::new();
    if let Some(arr) = json_data.as_array() {
        for item in arr {
            let Some(date) = item["day"]
                .as_str()
                .and_then(|d| NaiveDate::parse_and_remainder(d, "%Y-%m-%d").ok())
                .map(|(date, _)| date)
            else {
                continue;
            };
            let (Some(open), Some(high), Some(low), Some(close)) = (
                json_f64(&item["open"]),
                json_f64(&item["high"]),
                json_f64(&item["low"]),
                json_f64(&item["close"]),
            ) else {
                continue;
            };
            history.push(Bar {
                date,
                open,
                high,
                low,
                close,
                volume: json_f64(&item["volume"]).map(|v| v as u64).unwrap_or(0),
                amount: json_f64(&item["amount"]).unwrap_or(0.0),
                change_percent: None,
            });
        }
    }
    history.sort_by_key(|b| b.date);

    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sina_quote() {
        let mut fields = vec![
            "浦发银行", "10.00", "9.90", "10.05", "10.07", "9.98", "10.05", "10.06", "123456",
            "1234567.89",
        ];
        fields.extend(std::iter::repeat("0").take(20));
        fields.push("2024-01-02");
        fields.push("15:00:00");
        fields.push("00");
        let data = format!("var hq_str_sh600000=\"{}\";", fields.join(","));

        let quote = parse_sina_quote(&data, "600000").unwrap().unwrap();
        assert_eq!(quote.stock_name.as_deref(), Some("浦发银行"));
        assert_eq!(quote.current_price, 10.05);
        assert_eq!(quote.open, Some(10.0));
        assert_eq!(quote.prev_close, Some(9.9));
        assert_eq!(quote.volume, Some(123456));
        assert!((quote.change.unwrap() - 0.15).abs() < 1e-9);
        assert_eq!(quote.update_time.as_deref(), Some("2024-01-02 15:00:00"));
    }

    #[test]
    fn test_parse_sina_quote_empty() {
        let data = "var hq_str_sh999999=\"\";";
        assert!(parse_sina_quote(data, "999999").unwrap().is_none());
    }

    #[test]
    fn test_parse_sina_quote_malformed() {
        assert!(parse_sina_quote("garbage", "600000").is_err());
        assert!(parse_sina_quote("var x=\"a,b,c\";", "600000").is_err());
    }

    #[test]
    fn test_parse_sina_history() {
        let data = r#"/*<script>location.href='//sina.com';</script>*/
=([{"day":"2024-01-03","open":"10.10","high":"10.30","low":"10.00","close":"10.20","volume":"2000"},{"day":"2024-01-02","open":"10.00","high":"10.50","low":"9.80","close":"10.10","volume":"1000"}]);"#;
        let bars = parse_sina_history(data).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(bars[0].close, 10.1);
        assert_eq!(bars[1].volume, 2000);
    }

    #[test]
    fn test_parse_sina_history_odd_day_values() {
        let data = r#"=([{"day":"2024-01-02 15:00:00","open":"10.00","high":"10.50","low":"9.80","close":"10.10","volume":"1000"},{"day":"停牌中停牌中","open":"10.00","high":"10.50","low":"9.80","close":"10.10","volume":"1000"}]);"#;
        let bars = parse_sina_history(data).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn test_parse_sina_history_null() {
        assert!(parse_sina_history("=(null);").unwrap().is_empty());
    }
}
