//! 同花顺创新高排行（stock_rank_cxg_ths）
//!
//! 每次刷新整表替换，consecutive_days 根据上一次快照计算：
//! 上次也在榜的 +1，新上榜的为 1，本次不在榜的直接丢弃。

use std::collections::{HashMap, HashSet};

use rusqlite::{params, Connection};

use super::Store;
use crate::error::Result;
use crate::models::NewHighRank;

/// 根据上一次快照计算连续上榜次数
///
/// `previous` 为代码到上次连续次数的映射；`fresh` 中重复的代码只保留第一条。
pub fn merge_consecutive_days(
    previous: &HashMap<String, i64>,
    fresh: Vec<NewHighRank>,
) -> Vec<NewHighRank> {
    let mut seen = HashSet::new();
    fresh
        .into_iter()
        .filter(|r| seen.insert(r.code.clone()))
        .map(|mut r| {
            r.consecutive_days = previous.get(&r.code).map_or(1, |days| days + 1);
            r
        })
        .collect()
}

fn previous_streaks(conn: &Connection) -> Result<HashMap<String, i64>> {
    let mut stmt = conn.prepare("SELECT code, consecutive_days FROM stock_rank_cxg_ths")?;
    let map = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
        .collect::<std::result::Result<HashMap<_, _>, _>>()?;
    Ok(map)
}

const SELECT_COLUMNS: &str = "SELECT code, name, change_percent, turnover_rate, latest_price,
        prev_high, prev_high_date, consecutive_days, updated_at
     FROM stock_rank_cxg_ths";

fn row_to_rank(row: &rusqlite::Row<'_>) -> rusqlite::Result<NewHighRank> {
    Ok(NewHighRank {
        code: row.get(0)?,
        name: row.get(1)?,
        change_percent: row.get(2)?,
        turnover_rate: row.get(3)?,
        latest_price: row.get(4)?,
        prev_high: row.get(5)?,
        prev_high_date: row.get(6)?,
        consecutive_days: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

impl Store {
    /// 写入新一期创新高排行，返回带连续次数的入库结果
    ///
    /// 读取旧快照、计算连续次数、删除、插入在同一个事务内完成
    pub fn refresh_new_high_ranks(&self, fresh: Vec<NewHighRank>) -> Result<Vec<NewHighRank>> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let previous = previous_streaks(&tx)?;
        let merged = merge_consecutive_days(&previous, fresh);

        tx.execute("DELETE FROM stock_rank_cxg_ths", [])?;
        let mut stmt = tx.prepare(
            "INSERT INTO stock_rank_cxg_ths (code, name, change_percent, turnover_rate,
                latest_price, prev_high, prev_high_date, consecutive_days, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        for r in &merged {
            stmt.execute(params![
                r.code,
                r.name,
                r.change_percent,
                r.turnover_rate,
                r.latest_price,
                r.prev_high,
                r.prev_high_date,
                r.consecutive_days,
                r.updated_at,
            ])?;
        }
        drop(stmt);
        tx.commit()?;

        log::info!("同花顺创新高已入库，共 {} 条", merged.len());
        Ok(merged)
    }

    /// 读取全部创新高排行
    pub fn new_high_ranks(&self) -> Result<Vec<NewHighRank>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("{} ORDER BY id", SELECT_COLUMNS))?;
        let ranks = stmt
            .query_map([], row_to_rank)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ranks)
    }

    /// 连续上榜次数不少于 `min_days` 的股票，连续次数多的在前
    pub fn new_high_ranks_with_streak(&self, min_days: i64) -> Result<Vec<NewHighRank>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "{} WHERE consecutive_days >= ?1 ORDER BY consecutive_days DESC, id",
            SELECT_COLUMNS
        ))?;
        let ranks = stmt
            .query_map([min_days], row_to_rank)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ranks)
    }
}
