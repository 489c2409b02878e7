//! 东方财富数据源
//!
//! 对接 push2.eastmoney.com（实时行情、板块列表）和 push2his.eastmoney.com（K线）

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone};
use chrono_tz::Asia::Shanghai;
use reqwest::Client;
use serde_json::Value;

use super::{parse_a_share_code, MarketDataSource};
use crate::error::{Result, ServiceError};
use crate::models::{Bar, Industry, IndustryBoard, InstrumentHistory, Quote};
use crate::utils::{json_f64, parse_opt_f64};

/// 板块/个股列表 API
pub const EM_CLIST_API: &str = "https://17.push2.eastmoney.com/api/qt/clist/get";
/// K线 API
pub const EM_KLINE_API: &str = "https://push2his.eastmoney.com/api/qt/stock/kline/get";
/// 个股实时行情 API
pub const EM_QUOTE_API: &str = "https://push2.eastmoney.com/api/qt/stock/get";

/// 行业板块市场编号
const BOARD_MARKET_ID: u8 = 90;

/// 复权方式
#[derive(Debug, Clone, Copy)]
enum Adjust {
    None,
    Forward,
}

impl Adjust {
    fn fqt(&self) -> &'static str {
        match self {
            Adjust::None => "0",
            Adjust::Forward => "1",
        }
    }
}

/// 东方财富数据源
pub struct EastMoneySource {
    client: Client,
}

impl EastMoneySource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// 获取行业板块列表
    /// 对应 akshare 的 stock_board_industry_name_em()
    pub async fn industry_boards(&self) -> Result<Vec<IndustryBoard>> {
        log::debug!("📡 请求东方财富行业板块列表: {}", EM_CLIST_API);

        let response = self
            .client
            .get(EM_CLIST_API)
            .query(&[
                ("pn", "1"),
                ("pz", "500"),
                ("po", "1"),
                ("np", "1"),
                ("ut", "bd1d9ddb04089700cf9c27f6f7426281"),
                ("fltt", "2"),
                ("invt", "2"),
                ("fid", "f3"),
                ("fs", "m:90 t:2 f:!50"),
                ("fields", "f2,f3,f12,f14,f20"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::Source(format!(
                "获取行业板块列表失败: {}",
                response.status()
            )));
        }

        let json: Value = response.json().await?;
        parse_board_list(&json)
    }

    async fn fetch_klines(
        &self,
        secid: &str,
        start: NaiveDate,
        end: NaiveDate,
        adjust: Adjust,
    ) -> Result<Value> {
        let beg = start.format("%Y%m%d").to_string();
        let end = end.format("%Y%m%d").to_string();
        log::debug!("📡 请求东方财富K线: secid={} {}-{}", secid, beg, end);

        let response = self
            .client
            .get(EM_KLINE_API)
            .query(&[
                ("secid", secid),
                ("ut", "7eea3edcaed734bea9cbfc24409ed989"),
                ("fields1", "f1,f2,f3,f4,f5,f6"),
                ("fields2", "f51,f52,f53,f54,f55,f56,f57,f58,f59,f60,f61"),
                ("klt", "101"),
                ("fqt", adjust.fqt()),
                ("beg", beg.as_str()),
                ("end", end.as_str()),
                ("smplmt", "10000"),
                ("lmt", "1000000"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::Source(format!(
                "获取K线数据失败: {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl MarketDataSource for EastMoneySource {
    fn name(&self) -> &str {
        "eastmoney"
    }

    async fn list_industries(&self) -> Result<Vec<Industry>> {
        let boards = self.industry_boards().await?;
        Ok(boards
            .into_iter()
            .map(|b| Industry {
                code: b.code,
                name: b.name,
            })
            .collect())
    }

    /// 对应 akshare 的 stock_board_industry_hist_em()
    async fn industry_daily_history(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>> {
        let secid = format!("{}.{}", BOARD_MARKET_ID, code);
        let json = self.fetch_klines(&secid, start, end, Adjust::None).await?;
        Ok(parse_kline_response(&json)?.bars)
    }

    async fn realtime_quote(&self, code: &str) -> Result<Option<Quote>> {
        let Some((market, digits)) = parse_a_share_code(code) else {
            return Ok(None);
        };
        let secid = format!("{}.{}", market.eastmoney_id(), digits);
        log::debug!("📡 请求东方财富实时行情: secid={}", secid);

        let response = self
            .client
            .get(EM_QUOTE_API)
            .query(&[
                ("secid", secid.as_str()),
                ("ut", "fa5fd1943c7b386f172d6893dbfba10b"),
                ("fltt", "2"),
                ("invt", "2"),
                ("fields", "f43,f44,f45,f46,f47,f48,f57,f58,f60,f86,f169,f170"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::Source(format!(
                "获取实时行情失败: {}",
                response.status()
            )));
        }

        let json: Value = response.json().await?;
        Ok(parse_quote(&json, code))
    }

    /// 对应 akshare 的 stock_zh_a_hist(adjust="qfq")
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
        let secid = format!("{}.{}", market.eastmoney_id(), digits);
        let json = self.fetch_klines(&secid, start, end, Adjust::Forward).await?;
        parse_kline_response(&json)
    }
}

/// 解析板块列表，data.diff 为空视为数据源异常
fn parse_board_list(json: &Value) -> Result<Vec<IndustryBoard>> {
    let diff = json["data"]["diff"]
        .as_array()
        .ok_or_else(|| ServiceError::Source("行业板块列表为空".to_string()))?;

    let boards = diff
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let code = item["f12"].as_str()?.to_string();
            let name = item["f14"].as_str()?.to_string();
            Some(IndustryBoard {
                rank: i as i64 + 1,
                name,
                code,
                total_market_cap: json_f64(&item["f20"]),
            })
        })
        .collect();

    Ok(boards)
}

/// 解析K线响应
///
/// klines 每行格式：日期,开盘,收盘,最高,最低,成交量,成交额,振幅,涨跌幅,涨跌额,换手率
fn parse_kline_response(json: &Value) -> Result<InstrumentHistory> {
    let data = &json["data"];
    if data.is_null() {
        return Ok(InstrumentHistory {
            name: None,
            bars: Vec::new(),
        });
    }

    let name = data["name"].as_str().map(|s| s.to_string());
    let lines = data["klines"]
        .as_array()
        .ok_or_else(|| ServiceError::Source("K线数据格式异常".to_string()))?;

    let mut bars = Vec::with_capacity(lines.len());
    for line in lines {
        let Some(line) = line.as_str() else { continue };
        match parse_kline_line(line) {
            Some(bar) => bars.push(bar),
            None => log::warn!("跳过无法解析的K线: {}", line),
        }
    }
    bars.sort_by_key(|b| b.date);

    Ok(InstrumentHistory { name, bars })
}

fn parse_kline_line(line: &str) -> Option<Bar> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < 7 {
        return None;
    }
    Some(Bar {
        date: NaiveDate::parse_from_str(fields[0], "%Y-%m-%d").ok()?,
        open: parse_opt_f64(fields[1])?,
        close: parse_opt_f64(fields[2])?,
        high: parse_opt_f64(fields[3])?,
        low: parse_opt_f64(fields[4])?,
        volume: parse_opt_f64(fields[5]).map(|v| v as u64).unwrap_or(0),
        amount: parse_opt_f64(fields[6]).unwrap_or(0.0),
        change_percent: fields.get(8).and_then(|s| parse_opt_f64(s)),
    })
}

/// 解析实时行情，停牌或无效代码时各字段为 "-"
fn parse_quote(json: &Value, code: &str) -> Option<Quote> {
    let data = &json["data"];
    if !data.is_object() {
        return None;
    }

    let mut quote = Quote::empty(code);
    quote.stock_name = data["f58"].as_str().map(|s| s.to_string());
    quote.current_price = json_f64(&data["f43"]).unwrap_or(0.0);
    quote.high = json_f64(&data["f44"]);
    quote.low = json_f64(&data["f45"]);
    quote.open = json_f64(&data["f46"]);
    quote.volume = json_f64(&data["f47"]).map(|v| v as u64);
    quote.amount = json_f64(&data["f48"]);
    quote.prev_close = json_f64(&data["f60"]);
    quote.change = json_f64(&data["f169"]);
    quote.change_percent = json_f64(&data["f170"]);
    quote.update_time = data["f86"]
        .as_i64()
        .and_then(|ts| Shanghai.timestamp_opt(ts, 0).single())
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string());

    Some(quote)
}
