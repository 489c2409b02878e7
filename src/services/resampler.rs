//! K线重采样与均线计算
//!
//! 将日K线聚合为周K线（ISO 周）或月K线（自然月），并计算收盘价的简单移动平均。
//! 末尾未走完的周/月同样输出一根K线，取最新值的调用方需要知道最后一根可能不完整。

use chrono::{Datelike, NaiveDate};

use crate::error::Result;
use crate::models::{Bar, Period};

/// 将日K线按周期聚合
///
/// `Period::Daily` 原样返回（按日期排序）。
pub fn resample(daily: &[Bar], period: Period) -> Vec<Bar> {
    let mut sorted = daily.to_vec();
    sorted.sort_by_key(|b| b.date);

    let key: fn(&NaiveDate) -> (i32, u32) = match period {
        Period::Daily => return sorted,
        Period::Weekly => iso_week_key,
        Period::Monthly => month_key,
    };

    let mut buckets: Vec<Bar> = Vec::new();
    let mut current_key = None;

    for bar in sorted {
        let k = key(&bar.date);
        match buckets.last_mut() {
            Some(last) if current_key == Some(k) => {
                last.date = bar.date;
                last.high = last.high.max(bar.high);
                last.low = last.low.min(bar.low);
                last.close = bar.close;
                last.volume += bar.volume;
                last.amount += bar.amount;
            }
            _ => {
                current_key = Some(k);
                buckets.push(Bar {
                    change_percent: None,
                    ..bar
                });
            }
        }
    }

    // 涨跌幅相对上一根K线的收盘价
    for i in 1..buckets.len() {
        let prev_close = buckets[i - 1].close;
        if prev_close != 0.0 {
            buckets[i].change_percent = Some((buckets[i].close - prev_close) / prev_close * 100.0);
        }
    }

    buckets
}

fn iso_week_key(date: &NaiveDate) -> (i32, u32) {
    let week = date.iso_week();
    (week.year(), week.week())
}

fn month_key(date: &NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

/// 按字符串周期重采样，未知周期返回 `UnsupportedPeriod`
pub fn resample_str(daily: &[Bar], period: &str) -> Result<Vec<Bar>> {
    let period: Period = period.parse()?;
    Ok(resample(daily, period))
}

/// 收盘价的简单移动平均
///
/// 前 `window - 1` 个位置没有足够数据，返回 `None`。
pub fn rolling_mean(series: &[Bar], window: usize) -> Vec<(NaiveDate, Option<f64>)> {
    series
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let value = (window > 0 && i + 1 >= window).then(|| {
                let sum: f64 = series[i + 1 - window..=i].iter().map(|b| b.close).sum();
                sum / window as f64
            });
            (bar.date, value)
        })
        .collect()
}

/// 最后一个位置的移动平均值
pub fn latest_mean(series: &[Bar], window: usize) -> Option<f64> {
    rolling_mean(series, window).last().and_then(|(_, v)| *v)
}
