// ==========================================
// 汽车维修门店管理系统 - 服务目录仓储
// ==========================================
// 职责: 服务目录只读查询
// 红线: 本系统对目录只读; upsert 仅用于初始化与测试数据构造
// ==========================================

use crate::domain::catalog::ServiceCatalogItem;
use crate::domain::work_order::PartRequirement;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// CatalogRepository - 服务目录仓储
// ==========================================
pub struct CatalogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CatalogRepository {
    /// 创建新的CatalogRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按service_type_id解析目录条目
    ///
    /// # 返回
    /// - Ok(Some): 目录条目 (含备件需求清单)
    /// - Ok(None): 服务类型在目录中不存在
    pub fn find_by_id(
        &self,
        service_type_id: &str,
    ) -> RepositoryResult<Option<ServiceCatalogItem>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT service_type_id, name, labor_rate,
                      estimated_duration_minutes, required_parts_json
               FROM service_catalog
               WHERE service_type_id = ?"#,
            params![service_type_id],
            Self::map_row,
        ) {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询全部目录条目
    pub fn list_all(&self) -> RepositoryResult<Vec<ServiceCatalogItem>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT service_type_id, name, labor_rate,
                      estimated_duration_minutes, required_parts_json
               FROM service_catalog
               ORDER BY service_type_id"#,
        )?;

        let items = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<ServiceCatalogItem>, _>>()?;

        Ok(items)
    }

    /// 写入目录条目 (初始化/测试数据用)
    pub fn upsert(&self, item: &ServiceCatalogItem) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let required_parts_json = serde_json::to_string(&item.required_parts)
            .map_err(|e| RepositoryError::InternalError(e.to_string()))?;

        conn.execute(
            r#"INSERT INTO service_catalog (
                service_type_id, name, labor_rate,
                estimated_duration_minutes, required_parts_json
            ) VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(service_type_id) DO UPDATE SET
                name = excluded.name,
                labor_rate = excluded.labor_rate,
                estimated_duration_minutes = excluded.estimated_duration_minutes,
                required_parts_json = excluded.required_parts_json"#,
            params![
                &item.service_type_id,
                &item.name,
                item.labor_rate,
                item.estimated_duration_minutes,
                &required_parts_json,
            ],
        )?;

        Ok(())
    }

    /// 映射数据库行到ServiceCatalogItem对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<ServiceCatalogItem> {
        let parts_json: String = row.get(4)?;
        let required_parts: Vec<PartRequirement> =
            serde_json::from_str(&parts_json).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    4,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;

        Ok(ServiceCatalogItem {
            service_type_id: row.get(0)?,
            name: row.get(1)?,
            labor_rate: row.get(2)?,
            estimated_duration_minutes: row.get(3)?,
            required_parts,
        })
    }
}
