//! 参考数据刷新工具
//!
//! 抓取东方财富行业板块列表、同花顺创新高排行，整表写入 SQLite。

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;

use stock_analysis_backend::config::AppConfig;
use stock_analysis_backend::db::Store;
use stock_analysis_backend::models::{IndustryBoard, NewHighBoard, NewHighRank};
use stock_analysis_backend::services::refresh::{RefreshJob, VendorFeed};
use stock_analysis_backend::services::source::{http_client, EastMoneySource, ThsClient};
use stock_analysis_backend::services::throttle::Throttle;

/// 连续上榜次数达到该值时单独列出
const STREAK_THRESHOLD: i64 = 2;

#[derive(Parser)]
#[command(name = "refresh", about = "股票参考数据刷新工具")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 刷新东方财富行业板块列表
    IndustryBoards,

    /// 刷新同花顺创新高排行
    NewHighs {
        /// 榜单类型
        #[arg(short, long, value_enum, default_value_t = BoardArg::History)]
        board: BoardArg,
    },

    /// 依次刷新全部参考数据
    All {
        /// 创新高榜单类型
        #[arg(short, long, value_enum, default_value_t = BoardArg::History)]
        board: BoardArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum BoardArg {
    Month,
    HalfYear,
    Year,
    History,
}

impl From<BoardArg> for NewHighBoard {
    fn from(arg: BoardArg) -> Self {
        match arg {
            BoardArg::Month => NewHighBoard::Month,
            BoardArg::HalfYear => NewHighBoard::HalfYear,
            BoardArg::Year => NewHighBoard::Year,
            BoardArg::History => NewHighBoard::History,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let (config, origin) = AppConfig::load();
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));
    origin.log();

    let cli = Cli::parse();

    let store = Store::open(&config.database.path)
        .with_context(|| format!("无法打开数据库 {}", config.database.path))?;
    let client = http_client(&config).context("无法创建 HTTP 客户端")?;
    let feed = VendorFeed::new(EastMoneySource::new(client.clone()), ThsClient::new(client));
    let job = RefreshJob::new(store, Box::new(feed), Throttle::new(&config.throttle));

    match cli.command {
        Commands::IndustryBoards => refresh_boards(&job).await?,
        Commands::NewHighs { board } => refresh_new_highs(&job, board.into()).await?,
        Commands::All { board } => {
            refresh_boards(&job).await?;
            refresh_new_highs(&job, board.into()).await?;
        }
    }

    Ok(())
}

async fn refresh_boards(job: &RefreshJob) -> Result<()> {
    let boards = job
        .refresh_industry_boards()
        .await
        .context("刷新行业板块失败")?;
    print_boards(&boards);
    log::info!("行业板块刷新完成，共 {} 个", boards.len());
    Ok(())
}

async fn refresh_new_highs(job: &RefreshJob, board: NewHighBoard) -> Result<()> {
    let ranks = job
        .refresh_new_highs(board)
        .await
        .context("刷新创新高排行失败")?;
    log::info!("创新高排行刷新完成，共 {} 条", ranks.len());

    let streak = job
        .store()
        .new_high_ranks_with_streak(STREAK_THRESHOLD)
        .context("读取连续上榜股票失败")?;
    print_streak(&streak);
    Ok(())
}

fn print_boards(boards: &[IndustryBoard]) {
    println!("{:>4}  {:<12} {:<8} {:>16}", "排名", "板块名称", "代码", "总市值");
    for b in boards {
        let cap = b
            .total_market_cap
            .map_or_else(|| "-".to_string(), |v| format!("{:.0}", v));
        println!("{:>4}  {:<12} {:<8} {:>16}", b.rank, b.name, b.code, cap);
    }
}

fn print_streak(ranks: &[NewHighRank]) {
    if ranks.is_empty() {
        println!("没有连续 {} 次以上上榜的股票", STREAK_THRESHOLD);
        return;
    }
    println!("连续上榜 {} 次以上:", STREAK_THRESHOLD);
    for r in ranks {
        let price = r
            .latest_price
            .map_or_else(|| "-".to_string(), |v| format!("{:.2}", v));
        println!("{:<8} {:<10} {:>10} 连续 {} 次", r.code, r.name, price, r.consecutive_days);
    }
}
