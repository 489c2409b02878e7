//! 行业板块快照（industry_board_em）

use rusqlite::params;

use super::Store;
use crate::error::Result;
use crate::models::IndustryBoard;

impl Store {
    /// 整表替换行业板块，按总市值降序写入
    pub fn replace_industry_boards(&self, boards: &[IndustryBoard]) -> Result<usize> {
        let mut sorted = boards.to_vec();
        sorted.sort_by(|a, b| {
            let a = a.total_market_cap.unwrap_or(f64::MIN);
            let b = b.total_market_cap.unwrap_or(f64::MIN);
            b.total_cmp(&a)
        });

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM industry_board_em", [])?;

        let mut stmt = tx.prepare(
            "INSERT INTO industry_board_em (rank, name, code, total_market_cap)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for board in &sorted {
            stmt.execute(params![board.rank, board.name, board.code, board.total_market_cap])?;
        }
        drop(stmt);
        tx.commit()?;

        log::info!("已按总市值降序覆盖写入 industry_board_em 表，共 {} 条", sorted.len());
        Ok(sorted.len())
    }

    /// 读取行业板块，按总市值降序
    pub fn industry_boards(&self) -> Result<Vec<IndustryBoard>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT rank, name, code, total_market_cap FROM industry_board_em
             ORDER BY total_market_cap IS NULL, total_market_cap DESC, id",
        )?;

        let boards = stmt
            .query_map([], |row| {
                Ok(IndustryBoard {
                    rank: row.get(0)?,
                    name: row.get(1)?,
                    code: row.get(2)?,
                    total_market_cap: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(boards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(rank: i64, code: &str, cap: Option<f64>) -> IndustryBoard {
        IndustryBoard {
            rank,
            name: format!("板块{}", code),
            code: code.to_string(),
            total_market_cap: cap,
        }
    }

    #[test]
    fn test_replace_orders_by_market_cap() {
        let store = Store::open_in_memory().unwrap();
        let n = store
            .replace_industry_boards(&[
                board(1, "BK0001", Some(100.0)),
                board(2, "BK0002", None),
                board(3, "BK0003", Some(300.0)),
            ])
            .unwrap();
        assert_eq!(n, 3);

        let codes: Vec<String> = store
            .industry_boards()
            .unwrap()
            .into_iter()
            .map(|b| b.code)
            .collect();
        assert_eq!(codes, vec!["BK0003", "BK0001", "BK0002"]);
    }

    #[test]
    fn test_replace_discards_previous_snapshot() {
        let store = Store::open_in_memory().unwrap();
        store
            .replace_industry_boards(&[board(1, "BK0001", Some(1.0)), board(2, "BK0002", Some(2.0))])
            .unwrap();
        store
            .replace_industry_boards(&[board(1, "BK0009", Some(9.0))])
            .unwrap();

        let boards = store.industry_boards().unwrap();
        assert_eq!(boards.len(), 1);
        assert_eq!(boards[0].code, "BK0009");
    }

    #[test]
    fn test_failed_replace_keeps_previous_snapshot() {
        let store = Store::open_in_memory().unwrap();
        store
            .replace_industry_boards(&[board(1, "BK0001", Some(1.0))])
            .unwrap();

        // 重复代码违反唯一约束，事务回滚
        let result = store.replace_industry_boards(&[
            board(1, "BK0002", Some(2.0)),
            board(2, "BK0002", Some(3.0)),
        ]);
        assert!(result.is_err());

        let boards = store.industry_boards().unwrap();
        assert_eq!(boards.len(), 1);
        assert_eq!(boards[0].code, "BK0001");
    }
}
