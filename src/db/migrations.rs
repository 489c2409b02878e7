//! 数据库迁移

use rusqlite::Connection;

use crate::error::Result;

/// 执行全部迁移
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    run_migration(conn, "001_industry_board_em", CREATE_INDUSTRY_BOARD_EM)?;
    run_migration(conn, "002_stock_rank_cxg_ths", CREATE_STOCK_RANK_CXG_THS)?;

    Ok(())
}

fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM migrations WHERE name = ?1)",
        [name],
        |row| row.get(0),
    )?;

    if !exists {
        log::info!("执行数据库迁移: {}", name);
        conn.execute_batch(sql)?;
        conn.execute("INSERT INTO migrations (name) VALUES (?1)", [name])?;
    }
    Ok(())
}

const CREATE_INDUSTRY_BOARD_EM: &str = "
CREATE TABLE IF NOT EXISTS industry_board_em (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    rank INTEGER NOT NULL,
    name TEXT NOT NULL,
    code TEXT NOT NULL UNIQUE,
    total_market_cap REAL
);
";

const CREATE_STOCK_RANK_CXG_THS: &str = "
CREATE TABLE IF NOT EXISTS stock_rank_cxg_ths (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    change_percent REAL,
    turnover_rate REAL,
    latest_price REAL,
    prev_high REAL,
    prev_high_date TEXT,
    consecutive_days INTEGER NOT NULL DEFAULT 1,
    updated_at TEXT NOT NULL
);
";
