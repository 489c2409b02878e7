//! 参考数据模型
//!
//! 由离线刷新任务写入数据库的板块列表与创新高排行

use serde::{Deserialize, Serialize};

/// 东方财富行业板块快照（industry_board_em 表）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryBoard {
    /// 排名
    pub rank: i64,
    /// 板块名称
    pub name: String,
    /// 板块代码
    pub code: String,
    /// 总市值
    pub total_market_cap: Option<f64>,
}

/// 同花顺创新高排行（stock_rank_cxg_ths 表）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHighRank {
    /// 股票代码
    pub code: String,
    /// 股票简称
    pub name: String,
    /// 涨跌幅（%）
    pub change_percent: Option<f64>,
    /// 换手率（%）
    pub turnover_rate: Option<f64>,
    /// 最新价
    pub latest_price: Option<f64>,
    /// 前期高点
    pub prev_high: Option<f64>,
    /// 前期高点日期
    pub prev_high_date: Option<String>,
    /// 连续上榜次数
    pub consecutive_days: i64,
    /// 入库时间
    pub updated_at: String,
}

/// 同花顺创新高榜单类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewHighBoard {
    /// 创月新高
    Month,
    /// 半年新高
    HalfYear,
    /// 一年新高
    Year,
    /// 历史新高
    History,
}

impl NewHighBoard {
    /// 同花顺接口中的 board 编号
    pub fn board_id(&self) -> u8 {
        match self {
            NewHighBoard::Month => 1,
            NewHighBoard::HalfYear => 2,
            NewHighBoard::Year => 3,
            NewHighBoard::History => 4,
        }
    }
}
