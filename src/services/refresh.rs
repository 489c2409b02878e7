//! 参考数据刷新
//!
//! 离线任务：将东方财富行业板块列表、同花顺创新高排行写入数据库。
//! 不在请求处理路径上，由 `refresh` 命令行程序触发。

use async_trait::async_trait;

use crate::db::Store;
use crate::error::Result;
use crate::models::{IndustryBoard, NewHighBoard, NewHighRank};
use crate::services::source::{EastMoneySource, ThsClient};
use crate::services::throttle::Throttle;

/// 参考数据来源
#[async_trait]
pub trait ReferenceFeed: Send + Sync {
    /// 行业板块列表
    async fn industry_boards(&self) -> Result<Vec<IndustryBoard>>;

    /// 创新高排行全部分页，分页之间按 `throttle` 等待
    async fn new_high_ranks(
        &self,
        board: NewHighBoard,
        throttle: &Throttle,
    ) -> Result<Vec<NewHighRank>>;
}

/// 东方财富板块 + 同花顺排行
pub struct VendorFeed {
    eastmoney: EastMoneySource,
    ths: ThsClient,
}

impl VendorFeed {
    pub fn new(eastmoney: EastMoneySource, ths: ThsClient) -> Self {
        Self { eastmoney, ths }
    }
}

#[async_trait]
impl ReferenceFeed for VendorFeed {
    async fn industry_boards(&self) -> Result<Vec<IndustryBoard>> {
        self.eastmoney.industry_boards().await
    }

    async fn new_high_ranks(
        &self,
        board: NewHighBoard,
        throttle: &Throttle,
    ) -> Result<Vec<NewHighRank>> {
        self.ths.new_high_ranks(board, throttle).await
    }
}

pub struct RefreshJob {
    store: Store,
    feed: Box<dyn ReferenceFeed>,
    throttle: Throttle,
}

impl RefreshJob {
    pub fn new(store: Store, feed: Box<dyn ReferenceFeed>, throttle: Throttle) -> Self {
        Self {
            store,
            feed,
            throttle,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// 刷新行业板块列表（整表替换）
    pub async fn refresh_industry_boards(&self) -> Result<Vec<IndustryBoard>> {
        self.throttle.pause().await;
        log::info!("### 板块分类名称查询（东方财富） ###");
        let boards = self.feed.industry_boards().await?;
        self.store.replace_industry_boards(&boards)?;
        self.store.industry_boards()
    }

    /// 刷新创新高排行，返回带连续上榜次数的结果
    ///
    /// 获取失败时不修改数据库，表中保留上一次成功刷新的结果
    pub async fn refresh_new_highs(&self, board: NewHighBoard) -> Result<Vec<NewHighRank>> {
        self.throttle.pause().await;
        log::info!("### 同花顺创新高排行 {:?} ###", board);
        let fresh = self.feed.new_high_ranks(board, &self.throttle).await?;
        self.store.refresh_new_high_ranks(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::{HashMap, VecDeque};

    use crate::error::ServiceError;

    /// 按调用顺序依次返回预置的排行快照，快照用完后返回错误
    #[derive(Default)]
    struct ScriptedFeed {
        boards: Vec<IndustryBoard>,
        snapshots: Mutex<VecDeque<Vec<NewHighRank>>>,
    }

    impl ScriptedFeed {
        fn with_snapshots(snapshots: Vec<Vec<&str>>) -> Self {
            let snapshots = snapshots
                .into_iter()
                .map(|codes| codes.into_iter().map(rank).collect())
                .collect();
            Self {
                snapshots: Mutex::new(snapshots),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl ReferenceFeed for ScriptedFeed {
        async fn industry_boards(&self) -> Result<Vec<IndustryBoard>> {
            Ok(self.boards.clone())
        }

        async fn new_high_ranks(
            &self,
            _board: NewHighBoard,
            _throttle: &Throttle,
        ) -> Result<Vec<NewHighRank>> {
            self.snapshots
                .lock()
                .pop_front()
                .ok_or_else(|| ServiceError::Source("同花顺创新高页面中没有排行表格".to_string()))
        }
    }

    fn rank(code: &str) -> NewHighRank {
        NewHighRank {
            code: code.to_string(),
            name: format!("股票{}", code),
            change_percent: None,
            turnover_rate: None,
            latest_price: Some(10.0),
            prev_high: None,
            prev_high_date: None,
            consecutive_days: 1,
            updated_at: "2024-01-03T15:00:00+08:00".to_string(),
        }
    }

    fn board(rank: i64, code: &str, cap: Option<f64>) -> IndustryBoard {
        IndustryBoard {
            rank,
            name: format!("板块{}", code),
            code: code.to_string(),
            total_market_cap: cap,
        }
    }

    fn job(feed: ScriptedFeed) -> RefreshJob {
        RefreshJob::new(
            Store::open_in_memory().unwrap(),
            Box::new(feed),
            Throttle::disabled(),
        )
    }

    fn streaks(ranks: &[NewHighRank]) -> HashMap<String, i64> {
        ranks
            .iter()
            .map(|r| (r.code.clone(), r.consecutive_days))
            .collect()
    }

    #[tokio::test]
    async fn test_refresh_new_highs_merges_streaks() {
        let job = job(ScriptedFeed::with_snapshots(vec![
            vec!["A", "B"],
            vec!["A", "B"],
            vec!["A", "C"],
        ]));

        job.refresh_new_highs(NewHighBoard::History).await.unwrap();
        job.refresh_new_highs(NewHighBoard::History).await.unwrap();
        let merged = job.refresh_new_highs(NewHighBoard::History).await.unwrap();

        assert_eq!(
            streaks(&merged),
            HashMap::from([("A".to_string(), 3), ("C".to_string(), 1)])
        );
        let streak = job.store().new_high_ranks_with_streak(2).unwrap();
        assert_eq!(streak.len(), 1);
        assert_eq!(streak[0].code, "A");
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let job = job(ScriptedFeed::with_snapshots(vec![vec!["A", "B"]]));
        job.refresh_new_highs(NewHighBoard::Month).await.unwrap();

        let result = job.refresh_new_highs(NewHighBoard::Month).await;
        assert!(matches!(result, Err(ServiceError::Source(_))));

        let stored = job.store().new_high_ranks().unwrap();
        assert_eq!(
            streaks(&stored),
            HashMap::from([("A".to_string(), 1), ("B".to_string(), 1)])
        );
    }

    #[tokio::test]
    async fn test_refresh_industry_boards_sorted_by_market_cap() {
        let feed = ScriptedFeed {
            boards: vec![
                board(1, "BK0001", Some(1.0e11)),
                board(2, "BK0002", None),
                board(3, "BK0003", Some(5.0e12)),
            ],
            ..ScriptedFeed::default()
        };
        let boards = job(feed).refresh_industry_boards().await.unwrap();
        let codes: Vec<&str> = boards.iter().map(|b| b.code.as_str()).collect();
        assert_eq!(codes, vec!["BK0003", "BK0001", "BK0002"]);
    }
}
