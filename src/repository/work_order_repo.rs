// ==========================================
// 汽车维修门店管理系统 - 工单仓储
// ==========================================
// 职责: 工单持久化 + 工单号原子分配 + 预约回链
// 红线:
// - 工单号通过对 work_order_counter 单行的一次 UPDATE..RETURNING
//   分配, 禁止先读后加
// - 重复创建由 appointment_id 唯一约束裁决, 不做应用层预检
// ==========================================

use crate::domain::types::{Priority, WorkOrderStatus};
use crate::domain::work_order::{PartsAvailability, WorkOrder};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

const WORK_ORDER_COLUMNS: &str = r#"work_order_id, appointment_id, work_order_number, status,
              priority, service_name, labor_rate, estimated_duration_minutes,
              estimated_start_date, parts_availability_json, created_at"#;

// ==========================================
// WorkOrderRepository - 工单仓储
// ==========================================
pub struct WorkOrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WorkOrderRepository {
    /// 创建新的WorkOrderRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建工单 (自动分配工单号, 同事务回链预约)
    ///
    /// # 原子性
    /// 同一事务内完成三步, 全有或全无:
    /// 1. 计数器单行自增并取回新值 (UPDATE..RETURNING, 原子分配)
    /// 2. 插入工单 (appointment_id 唯一约束在此裁决重复创建)
    /// 3. 回填 appointment.work_order_id
    ///
    /// 该方法会覆盖传入的 `work_order.work_order_number`
    ///
    /// # 错误
    /// - `RepositoryError::UniqueConstraintViolation`: 该预约已有工单
    pub fn create_with_next_number(&self, work_order: &mut WorkOrder) -> RepositoryResult<String> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let next_no: i64 = tx.query_row(
            "UPDATE work_order_counter SET next_no = next_no + 1 WHERE counter_id = 1 RETURNING next_no",
            [],
            |row| row.get(0),
        )?;

        work_order.work_order_number = format!("WO-{:06}", next_no);

        let parts_availability_json = serde_json::to_string(&work_order.parts_availability)
            .map_err(|e| RepositoryError::InternalError(e.to_string()))?;

        tx.execute(
            r#"INSERT INTO work_order (
                work_order_id, appointment_id, work_order_number, status,
                priority, service_name, labor_rate, estimated_duration_minutes,
                estimated_start_date, parts_availability_json, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &work_order.work_order_id,
                &work_order.appointment_id,
                &work_order.work_order_number,
                work_order.status.to_db_str(),
                work_order.priority.to_db_str(),
                &work_order.service_name,
                work_order.labor_rate,
                work_order.estimated_duration_minutes,
                &work_order
                    .estimated_start_date
                    .map(|d| d.format("%Y-%m-%d").to_string()),
                &parts_availability_json,
                work_order
                    .created_at
                    .naive_utc()
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
            ],
        )?;

        tx.execute(
            "UPDATE appointment SET work_order_id = ?, version = version + 1 WHERE appointment_id = ?",
            params![&work_order.work_order_id, &work_order.appointment_id],
        )?;

        tx.commit()?;
        Ok(work_order.work_order_id.clone())
    }

    /// 按work_order_id查询工单
    pub fn find_by_id(&self, work_order_id: &str) -> RepositoryResult<Option<WorkOrder>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!(
                r#"SELECT {WORK_ORDER_COLUMNS}
                   FROM work_order
                   WHERE work_order_id = ?"#
            ),
            params![work_order_id],
            Self::map_row,
        ) {
            Ok(work_order) => Ok(Some(work_order)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按来源预约查询工单 (1:1)
    pub fn find_by_appointment_id(
        &self,
        appointment_id: &str,
    ) -> RepositoryResult<Option<WorkOrder>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!(
                r#"SELECT {WORK_ORDER_COLUMNS}
                   FROM work_order
                   WHERE appointment_id = ?"#
            ),
            params![appointment_id],
            Self::map_row,
        ) {
            Ok(work_order) => Ok(Some(work_order)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 统计指定状态的工单数量
    pub fn count_by_status(&self, status: WorkOrderStatus) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM work_order WHERE status = ?",
            params![status.to_db_str()],
            |row| row.get(0),
        )?;

        Ok(count)
    }

    /// 工单总数
    pub fn count_all(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM work_order", [], |row| row.get(0))?;

        Ok(count)
    }

    /// 映射数据库行到WorkOrder对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<WorkOrder> {
        let status_str: String = row.get(3)?;
        let priority_str: String = row.get(4)?;
        let parts_json: String = row.get(9)?;

        let parts_availability: PartsAvailability =
            serde_json::from_str(&parts_json).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    9,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;

        let created_raw: String = row.get(10)?;
        let created_naive = NaiveDateTime::parse_from_str(&created_raw, "%Y-%m-%d %H:%M:%S")
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    10,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;

        Ok(WorkOrder {
            work_order_id: row.get(0)?,
            appointment_id: row.get(1)?,
            work_order_number: row.get(2)?,
            status: WorkOrderStatus::from_db_str(&status_str).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, e.into())
            })?,
            priority: Priority::from_db_str(&priority_str).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, e.into())
            })?,
            service_name: row.get(5)?,
            labor_rate: row.get(6)?,
            estimated_duration_minutes: row.get(7)?,
            estimated_start_date: row
                .get::<_, Option<String>>(8)?
                .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
            parts_availability,
            created_at: DateTime::from_naive_utc_and_offset(created_naive, Utc),
        })
    }
}
