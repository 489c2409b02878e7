//! 股票分析后端
//!
//! 个股实时行情、按日/周/月聚合的历史K线、五月均线行业筛选，
//! 以及离线刷新的参考数据（东财行业板块、同花顺创新高排行）。

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;
