//! 同花顺创新高排行
//!
//! 对应 akshare 的 stock_rank_cxg_ths()，数据来自 data.10jqka.com.cn 的分页 HTML 表格

use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use crate::error::{Result, ServiceError};
use crate::models::{NewHighBoard, NewHighRank};
use crate::services::throttle::Throttle;
use crate::utils::{beijing_time_string, parse_opt_f64};

/// 同花顺数据中心
pub const THS_DATA_BASE: &str = "http://data.10jqka.com.cn/";

pub struct ThsClient {
    client: Client,
}

impl ThsClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// 拉取创新高排行全部分页，分页之间按节流器等待
    pub async fn new_high_ranks(
        &self,
        board: NewHighBoard,
        throttle: &Throttle,
    ) -> Result<Vec<NewHighRank>> {
        let first = self.fetch_page(board, 1).await?;
        let pages = parse_page_count(&first);
        let mut ranks = parse_rank_table(&first)?;

        for page in 2..=pages {
            throttle.pause().await;
            log::info!("正在获取同花顺创新高第 {}/{} 页", page, pages);
            let html = self.fetch_page(board, page).await?;
            ranks.extend(parse_rank_table(&html)?);
        }

        Ok(ranks)
    }

    async fn fetch_page(&self, board: NewHighBoard, page: u32) -> Result<String> {
        let url = page_url(board, page)?;
        log::debug!("📡 请求同花顺创新高: {}", url);

        let response = self
            .client
            .get(url)
            .header("Referer", THS_DATA_BASE)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::Source(format!(
                "获取同花顺创新高失败: {}",
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        Ok(encoding_rs::GBK.decode(&bytes).0.to_string())
    }
}

fn page_url(board: NewHighBoard, page: u32) -> Result<Url> {
    let mut url = Url::parse(THS_DATA_BASE).map_err(|e| ServiceError::Internal(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| ServiceError::Internal("无效的同花顺地址".to_string()))?
        .pop_if_empty()
        .extend(&["rank", "cxg", "board"])
        .push(&board.board_id().to_string())
        .extend(&["field", "stockcode", "order", "asc", "page"])
        .push(&page.to_string())
        .extend(&["ajax", "1", "free", "1", ""]);
    Ok(url)
}

/// 解析分页信息，如 "1/5"，找不到时视为只有一页
fn parse_page_count(html: &str) -> u32 {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("span.page_info") else {
        return 1;
    };
    let Ok(re) = Regex::new(r"\d+/(\d+)") else {
        return 1;
    };

    document
        .select(&selector)
        .next()
        .map(|span| span.text().collect::<String>())
        .and_then(|text| re.captures(&text).and_then(|c| c[1].parse().ok()))
        .unwrap_or(1)
        .max(1)
}

/// 解析排行表格
///
/// 列：序号, 股票代码, 股票简称, 涨跌幅, 换手率, 最新价, 前期高点, 前期高点日期
///
/// 页面中没有表格（封禁页、验证码页）视为数据源错误，空表格返回空列表
fn parse_rank_table(html: &str) -> Result<Vec<NewHighRank>> {
    let document = Html::parse_document(html);
    let body_selector = Selector::parse("table tbody")
        .map_err(|e| ServiceError::Internal(format!("选择器错误: {:?}", e)))?;
    let row_selector =
        Selector::parse("tr").map_err(|e| ServiceError::Internal(format!("选择器错误: {:?}", e)))?;
    let cell_selector =
        Selector::parse("td").map_err(|e| ServiceError::Internal(format!("选择器错误: {:?}", e)))?;

    let updated_at = beijing_time_string();
    let mut ranks = Vec::new();

    let Some(body) = document.select(&body_selector).next() else {
        return Err(ServiceError::Source(
            "同花顺创新高页面中没有排行表格".to_string(),
        ));
    };

    for row in body.select(&row_selector) {
        let cells: Vec<String> = row
            .select(&cell_selector)
            .map(|td| td.text().collect::<String>().trim().to_string())
            .collect();
        if cells.len() < 8 || cells[1].is_empty() {
            continue;
        }
        ranks.push(NewHighRank {
            code: cells[1].clone(),
            name: cells[2].clone(),
            change_percent: parse_opt_f64(&cells[3]),
            turnover_rate: parse_opt_f64(&cells[4]),
            latest_price: parse_opt_f64(&cells[5]),
            prev_high: parse_opt_f64(&cells[6]),
            prev_high_date: Some(cells[7].clone()).filter(|s| !s.is_empty()),
            consecutive_days: 1,
            updated_at: updated_at.clone(),
        });
    }

    Ok(ranks)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"
<html><body>
<table class="m-table">
  <thead><tr><th>序号</th><th>股票代码</th><th>股票简称</th><th>涨跌幅</th><th>换手率</th><th>最新价</th><th>前期高点</th><th>前期高点日期</th></tr></thead>
  <tbody>
    <tr><td>1</td><td><a href="#">600519</a></td><td>贵州茅台</td><td>1.23%</td><td>0.45%</td><td>1800.00</td><td>1790.00</td><td>2024-01-02</td></tr>
    <tr><td>2</td><td>000001</td><td>平安银行</td><td>-0.50%</td><td>--</td><td>12.30</td><td>12.10</td><td></td></tr>
  </tbody>
</table>
<div class="m-page"><span class="page_info">1/3</span></div>
</body></html>"##;

    #[test]
    fn test_parse_rank_table() {
        let ranks = parse_rank_table(SAMPLE).unwrap();
        assert_eq!(ranks.len(), 2);
        assert_eq!(ranks[0].code, "600519");
        assert_eq!(ranks[0].name, "贵州茅台");
        assert_eq!(ranks[0].change_percent, Some(1.23));
        assert_eq!(ranks[0].prev_high_date.as_deref(), Some("2024-01-02"));
        assert_eq!(ranks[0].consecutive_days, 1);
        assert_eq!(ranks[1].turnover_rate, None);
        assert_eq!(ranks[1].change_percent, Some(-0.5));
        assert_eq!(ranks[1].prev_high_date, None);
    }

    #[test]
    fn test_parse_rank_table_blocked_page() {
        let html = "<html><body><h1>403 Forbidden</h1></body></html>";
        assert!(matches!(parse_rank_table(html), Err(ServiceError::Source(_))));
    }

    #[test]
    fn test_parse_rank_table_empty_table() {
        let html = r##"<table class="m-table"><thead><tr><th>序号</th></tr></thead><tbody></tbody></table>"##;
        assert!(parse_rank_table(html).unwrap().is_empty());
    }

    #[test]
    fn test_parse_page_count() {
        assert_eq!(parse_page_count(SAMPLE), 3);
        assert_eq!(parse_page_count("<html></html>"), 1);
    }

    #[test]
    fn test_page_url() {
        let url = page_url(NewHighBoard::History, 2).unwrap();
        assert_eq!(
            url.as_str(),
            "http://data.10jqka.com.cn/rank/cxg/board/4/field/stockcode/order/asc/page/2/ajax/1/free/1/"
        );
    }
}
