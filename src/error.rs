//! 服务错误类型
//!
//! 统一的错误分类，以及到 HTTP 响应 `{error, message}` 的映射

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 服务层错误
#[derive(Error, Debug)]
pub enum ServiceError {
    /// 请求的股票没有行情数据
    #[error("{0}")]
    NotFound(String),

    /// 不支持的 K 线周期
    #[error("不支持的周期: {0}，可选值为 daily/weekly/monthly")]
    UnsupportedPeriod(String),

    /// 查询参数越界
    #[error("{0}")]
    InvalidParameter(String),

    /// 数据源获取失败（网络、超时、响应格式异常）
    #[error("数据源错误: {0}")]
    Source(String),

    /// 数据源不具备该能力，不重试
    #[error("{0}")]
    Unsupported(String),

    #[error("数据库错误: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP 请求错误: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    /// 机器可读的错误码
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "not_found",
            ServiceError::UnsupportedPeriod(_) => "unsupported_period",
            ServiceError::InvalidParameter(_) => "invalid_parameter",
            _ => "internal_error",
        }
    }

    /// 为服务端错误附加上下文，客户端错误保持原样
    pub fn context(self, context: &str) -> ServiceError {
        match self {
            ServiceError::NotFound(_)
            | ServiceError::UnsupportedPeriod(_)
            | ServiceError::InvalidParameter(_) => self,
            other => ServiceError::Internal(format!("{}: {}", context, other)),
        }
    }

    /// 是否值得重试（数据源不可用、超时）
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Source(_) => true,
            ServiceError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}

/// 错误响应体
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::UnsupportedPeriod(_) | ServiceError::InvalidParameter(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody::new(self.code(), self.to_string()))
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ServiceError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::UnsupportedPeriod("weird".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::Source("timeout".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ServiceError::NotFound("x".into()).code(), "not_found");
        assert_eq!(
            ServiceError::UnsupportedPeriod("weird".into()).code(),
            "unsupported_period"
        );
        assert_eq!(ServiceError::Internal("x".into()).code(), "internal_error");
        assert!(ServiceError::Source("x".into()).is_retryable());
        assert!(!ServiceError::NotFound("x".into()).is_retryable());
        assert!(!ServiceError::Unsupported("x".into()).is_retryable());
        assert_eq!(ServiceError::Unsupported("x".into()).code(), "internal_error");
    }
}
