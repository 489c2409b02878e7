//! 公共辅助函数

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Asia::Shanghai;
use chrono_tz::Tz;

/// 获取北京时间（UTC+8）
pub fn beijing_now() -> DateTime<Tz> {
    Utc::now().with_timezone(&Shanghai)
}

/// 获取北京时间字符串（ISO 8601 格式，带+08:00时区）
pub fn beijing_time_string() -> String {
    beijing_now().to_rfc3339()
}

/// 北京时间的当前日期
pub fn beijing_today() -> NaiveDate {
    beijing_now().date_naive()
}

/// 保留两位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 解析数值字段，数据源用 "-"、"--" 或空串表示缺失
pub fn parse_opt_f64(raw: &str) -> Option<f64> {
    let s = raw.trim().trim_end_matches('%').replace(',', "");
    if s.is_empty() || s.chars().all(|c| c == '-') {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// 从 JSON 值中读取数值，兼容数字与字符串两种写法
pub fn json_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => parse_opt_f64(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_beijing_time() {
        let time = beijing_time_string();
        assert!(time.contains("+08:00"));
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(13.2), 13.2);
        assert_eq!(round2(2.345_6), 2.35);
        assert_eq!(round2(-1.004), -1.0);
    }

    #[test]
    fn test_parse_opt_f64() {
        assert_eq!(parse_opt_f64("12.5"), Some(12.5));
        assert_eq!(parse_opt_f64(" 3.1% "), Some(3.1));
        assert_eq!(parse_opt_f64("1,234.5"), Some(1234.5));
        assert_eq!(parse_opt_f64("-"), None);
        assert_eq!(parse_opt_f64("--"), None);
        assert_eq!(parse_opt_f64(""), None);
        assert_eq!(parse_opt_f64("-2.5"), Some(-2.5));
    }

    #[test]
    fn test_json_f64() {
        assert_eq!(json_f64(&serde_json::json!(1.5)), Some(1.5));
        assert_eq!(json_f64(&serde_json::json!("2.5")), Some(2.5));
        assert_eq!(json_f64(&serde_json::json!("-")), None);
        assert_eq!(json_f64(&serde_json::Value::Null), None);
    }
}
