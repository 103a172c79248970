// ==========================================
// 汽车维修门店管理系统 - 备件库存仓储
// ==========================================
// 职责: 本地备件库存只读查询, 作为库存查询服务的落地实现数据源
// 红线: 本系统对库存只读, 不做扣减; upsert 仅用于初始化与测试
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// PartStock - 备件库存行
// ==========================================
#[derive(Debug, Clone)]
pub struct PartStock {
    pub sku: String,            // 备件编码
    pub name: String,           // 备件名称
    pub quantity_in_stock: i64, // 在库数量
}

// ==========================================
// PartsInventoryRepository - 备件库存仓储
// ==========================================
pub struct PartsInventoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PartsInventoryRepository {
    /// 创建新的PartsInventoryRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按SKU查询库存
    pub fn find_by_sku(&self, sku: &str) -> RepositoryResult<Option<PartStock>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            "SELECT sku, name, quantity_in_stock FROM parts_inventory WHERE sku = ?",
            params![sku],
            |row| {
                Ok(PartStock {
                    sku: row.get(0)?,
                    name: row.get(1)?,
                    quantity_in_stock: row.get(2)?,
                })
            },
        ) {
            Ok(stock) => Ok(Some(stock)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入库存行 (初始化/测试数据用)
    pub fn upsert(&self, stock: &PartStock) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO parts_inventory (sku, name, quantity_in_stock)
               VALUES (?, ?, ?)
               ON CONFLICT(sku) DO UPDATE SET
                   name = excluded.name,
                   quantity_in_stock = excluded.quantity_in_stock"#,
            params![&stock.sku, &stock.name, stock.quantity_in_stock],
        )?;

        Ok(())
    }
}
