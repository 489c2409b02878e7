//! 业务逻辑服务模块
//!
//! 封装数据获取和处理逻辑

pub mod refresh;        // 参考数据离线刷新
pub mod resampler;      // K线重采样与均线
pub mod screener;       // 五月均线行业筛选
pub mod source;         // 行情数据源
pub mod stock_service;  // 个股行情服务
pub mod throttle;       // 调用节流与重试
