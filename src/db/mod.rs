//! 参考数据存储
//!
//! SQLite 保存离线刷新任务写入的板块列表与创新高排行。
//! 每次刷新在一个事务内整表替换，表中始终是最近一次成功刷新的结果。

mod industry_board;
mod migrations;
mod new_high_rank;

use std::fs;
use std::path::Path;

use parking_lot::Mutex;
use rusqlite::Connection;

use crate::error::{Result, ServiceError};

pub use new_high_rank::merge_consecutive_days;

/// SQLite 存储
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// 打开数据库文件，不存在时创建（包括父目录）
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| ServiceError::Internal(format!("创建数据目录失败: {}", e)))?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        log::info!("打开数据库: {}", path.display());
        Self::init(conn)
    }

    /// 内存数据库
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}
