//! 行业板块数据模型

use serde::{Deserialize, Serialize};

/// 一级行业板块
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Industry {
    /// 板块代码（如 BK0475）
    pub code: String,
    /// 板块名称
    pub name: String,
}

/// 月线收盘价在五月均线之上的行业
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryAboveMa5Item {
    /// 行业名称
    pub name: String,
    /// 最新月线收盘价
    pub close: f64,
    /// 最新月线 MA5
    pub ma5_monthly: f64,
}

impl IndustryAboveMa5Item {
    /// 收盘价与均线之差
    pub fn delta(&self) -> f64 {
        self.close - self.ma5_monthly
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IndustriesAboveMa5Response {
    pub industries: Vec<IndustryAboveMa5Item>,
}

/// 五月均线筛选查询参数
#[derive(Debug, Deserialize)]
pub struct IndustryScreenQuery {
    /// 计算 MA5 所需最少月线数（5-12）
    pub min_months: Option<usize>,
    /// 拉取日线天数（90-365）
    pub daily_days: Option<u32>,
}
