pub mod health;
pub mod stock;

use actix_web::web;

use crate::error::ServiceError;

pub fn config(cfg: &mut web::ServiceConfig) {
    // 查询参数无法解析时返回 422 invalid_parameter，与越界参数一致
    let query_config = web::QueryConfig::default()
        .error_handler(|err, _req| ServiceError::InvalidParameter(err.to_string()).into());

    cfg.service(
        web::scope("/api/v1")
            .app_data(query_config)
            .configure(health::config)
            .configure(stock::config),
    );
}
