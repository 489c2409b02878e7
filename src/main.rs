//! 股票分析后端服务
//!
//! 提供个股行情、历史K线与行业均线筛选的 RESTful API 服务
//! 数据来源：东方财富、新浪财经

use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use stock_analysis_backend::config::AppConfig;
use stock_analysis_backend::handlers;
use stock_analysis_backend::middleware::ApiKeyMiddleware;
use stock_analysis_backend::services::source::build_source;
use stock_analysis_backend::services::throttle::Throttle;
use stock_analysis_backend::state::AppState;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let (config, origin) = AppConfig::load();
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));
    origin.log();

    if config.api.api_key.is_empty() {
        log::warn!("未设置 API_KEY，接口认证已关闭");
    }

    let source = build_source(&config)?;
    let state = AppState::new(source, Throttle::new(&config.throttle));
    let api_key = config.api.api_key.clone();

    log::info!(
        "启动股票分析后端服务: {}，数据源 {:?}",
        config.bind_addr(),
        config.source.providers
    );

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(ApiKeyMiddleware::new(api_key.clone()))
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::config)
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(config.bind_addr())?.run().await?;
    Ok(())
}
