// ==========================================
// 汽车维修门店管理系统 - 预约仓储
// ==========================================
// 职责: 预约数据访问 + 审批裁决的 CAS 落库
// 红线: 审批转换必须是 (id, expected_version, 'PENDING') 三条件
//       的单条 UPDATE, 失败方得到显式冲突错误后重读重试
// ==========================================

use crate::domain::appointment::{Appointment, ApprovalDecision, EstimatedCost};
use crate::domain::types::{ApprovalStatus, Priority};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

const APPOINTMENT_COLUMNS: &str = r#"appointment_id, customer_id, vehicle_id, service_type_id,
              scheduled_date, scheduled_time, estimated_subtotal, estimated_total,
              priority, approval_status, approval_notes, decline_reason,
              assigned_follow_up_to, work_order_id, labor_rate_override,
              created_at, decided_at, version"#;

// ==========================================
// AppointmentRepository - 预约仓储
// ==========================================
pub struct AppointmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AppointmentRepository {
    /// 创建新的AppointmentRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建预约
    ///
    /// 说明: 预约由外部预约服务创建 (初始 PENDING), 本方法供
    /// 外部写入路径与测试数据构造使用
    pub fn create(&self, appointment: &Appointment) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO appointment (
                appointment_id, customer_id, vehicle_id, service_type_id,
                scheduled_date, scheduled_time, estimated_subtotal, estimated_total,
                priority, approval_status, approval_notes, decline_reason,
                assigned_follow_up_to, work_order_id, labor_rate_override,
                created_at, decided_at, version
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &appointment.appointment_id,
                &appointment.customer_id,
                &appointment.vehicle_id,
                &appointment.service_type_id,
                &appointment.scheduled_date.format("%Y-%m-%d").to_string(),
                &appointment.scheduled_time,
                appointment.estimated_cost.subtotal,
                appointment.estimated_cost.total,
                appointment.priority.to_db_str(),
                appointment.approval_status.to_db_str(),
                &appointment.approval_notes,
                &appointment.decline_reason,
                &appointment.assigned_follow_up_to,
                &appointment.work_order_id,
                appointment.labor_rate_override,
                appointment
                    .created_at
                    .naive_utc()
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
                appointment
                    .decided_at
                    .map(|d| d.naive_utc().format("%Y-%m-%d %H:%M:%S").to_string()),
                appointment.version,
            ],
        )?;

        Ok(appointment.appointment_id.clone())
    }

    /// 按appointment_id查询预约
    pub fn find_by_id(&self, appointment_id: &str) -> RepositoryResult<Option<Appointment>> {
        let conn = self.get_conn()?;
        Self::find_by_id_with_conn(&conn, appointment_id)
    }

    /// 查询待审批预约列表 (按创建时间先入先出)
    ///
    /// # 参数
    /// - limit: 返回记录数上限
    /// - offset: 偏移量 (分页)
    pub fn list_pending(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<Appointment>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            r#"SELECT {APPOINTMENT_COLUMNS}
               FROM appointment
               WHERE approval_status = 'PENDING'
               ORDER BY created_at ASC
               LIMIT ? OFFSET ?"#
        ))?;

        let appointments = stmt
            .query_map(params![limit, offset], Self::map_row)?
            .collect::<Result<Vec<Appointment>, _>>()?;

        Ok(appointments)
    }

    /// 查询全部待审批预约 (告警派生用, 不分页)
    pub fn list_pending_all(&self) -> RepositoryResult<Vec<Appointment>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            r#"SELECT {APPOINTMENT_COLUMNS}
               FROM appointment
               WHERE approval_status = 'PENDING'
               ORDER BY created_at ASC"#
        ))?;

        let appointments = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<Appointment>, _>>()?;

        Ok(appointments)
    }

    /// 统计指定审批状态的预约数量
    pub fn count_by_status(&self, status: ApprovalStatus) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM appointment WHERE approval_status = ?",
            params![status.to_db_str()],
            |row| row.get(0),
        )?;

        Ok(count)
    }

    /// 待审批预约的预估总价值 (用于驾驶舱统计)
    pub fn sum_pending_total(&self) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;

        let total: f64 = conn.query_row(
            "SELECT COALESCE(SUM(estimated_total), 0) FROM appointment WHERE approval_status = 'PENDING'",
            [],
            |row| row.get(0),
        )?;

        Ok(total)
    }

    /// 应用审批裁决 (CAS, 带乐观锁检查)
    ///
    /// # 并发控制
    /// 单条 UPDATE 同时校验 appointment_id + version + 'PENDING':
    /// 两个管理员同时裁决同一预约时, 仅先到者生效, 后到者拿到
    /// 显式冲突错误, 必须重读后再决定是否重试
    ///
    /// # 错误
    /// - `RepositoryError::NotFound`: appointment_id 不存在
    /// - `RepositoryError::InvalidStateTransition`: 预约已被裁决 (非 PENDING)
    /// - `RepositoryError::OptimisticLockFailure`: version 不匹配 (其他写入已发生)
    pub fn apply_decision(
        &self,
        appointment_id: &str,
        expected_version: i32,
        decision: &ApprovalDecision,
    ) -> RepositoryResult<Appointment> {
        let conn = self.get_conn()?;

        let rows_affected = conn.execute(
            r#"UPDATE appointment
               SET approval_status = ?, approval_notes = ?, decline_reason = ?,
                   assigned_follow_up_to = ?, decided_at = ?, version = version + 1
               WHERE appointment_id = ? AND version = ? AND approval_status = 'PENDING'"#,
            params![
                decision.target_status.to_db_str(),
                &decision.approval_notes,
                &decision.decline_reason,
                &decision.assigned_follow_up_to,
                decision
                    .decided_at
                    .naive_utc()
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
                appointment_id,
                expected_version,
            ],
        )?;

        if rows_affected == 0 {
            // 判断是记录不存在、已被裁决, 还是version冲突
            let current: Result<(String, i32), _> = conn.query_row(
                "SELECT approval_status, version FROM appointment WHERE appointment_id = ?",
                params![appointment_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            );

            return match current {
                Ok((status, _)) if status != "PENDING" => {
                    Err(RepositoryError::InvalidStateTransition {
                        from: status,
                        to: decision.target_status.to_string(),
                    })
                }
                Ok((_, actual_version)) => Err(RepositoryError::OptimisticLockFailure {
                    appointment_id: appointment_id.to_string(),
                    expected: expected_version,
                    actual: actual_version,
                }),
                Err(_) => Err(RepositoryError::NotFound {
                    entity: "Appointment".to_string(),
                    id: appointment_id.to_string(),
                }),
            };
        }

        // 同一把锁内重读, 返回裁决后的最新预约
        Self::find_by_id_with_conn(&conn, appointment_id)?.ok_or_else(|| {
            RepositoryError::NotFound {
                entity: "Appointment".to_string(),
                id: appointment_id.to_string(),
            }
        })
    }

    /// 在既有连接上按ID查询 (供同锁复用, 避免 Mutex 重入)
    fn find_by_id_with_conn(
        conn: &Connection,
        appointment_id: &str,
    ) -> RepositoryResult<Option<Appointment>> {
        match conn.query_row(
            &format!(
                r#"SELECT {APPOINTMENT_COLUMNS}
                   FROM appointment
                   WHERE appointment_id = ?"#
            ),
            params![appointment_id],
            Self::map_row,
        ) {
            Ok(appointment) => Ok(Some(appointment)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 映射数据库行到Appointment对象
    ///
    /// 说明: 状态/优先级为封闭枚举, 未知取值在此转换为显式错误
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Appointment> {
        let priority_str: String = row.get(8)?;
        let status_str: String = row.get(9)?;

        Ok(Appointment {
            appointment_id: row.get(0)?,
            customer_id: row.get(1)?,
            vehicle_id: row.get(2)?,
            service_type_id: row.get(3)?,
            scheduled_date: NaiveDate::parse_from_str(&row.get::<_, String>(4)?, "%Y-%m-%d")
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        4,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?,
            scheduled_time: row.get(5)?,
            estimated_cost: EstimatedCost {
                subtotal: row.get(6)?,
                total: row.get(7)?,
            },
            priority: Priority::from_db_str(&priority_str).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(8, rusqlite::types::Type::Text, e.into())
            })?,
            approval_status: ApprovalStatus::from_db_str(&status_str).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, e.into())
            })?,
            approval_notes: row.get(10)?,
            decline_reason: row.get(11)?,
            assigned_follow_up_to: row.get(12)?,
            work_order_id: row.get(13)?,
            labor_rate_override: row.get(14)?,
            created_at: parse_utc(row, 15)?,
            decided_at: parse_utc_opt(row, 16)?,
            version: row.get(17)?,
        })
    }
}

/// 解析 UTC 时间戳列
fn parse_utc(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    let naive = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(DateTime::from_naive_utc_and_offset(naive, Utc))
}

/// 解析可空 UTC 时间戳列
fn parse_utc_opt(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    match raw {
        Some(s) => {
            let naive = NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S").map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;
            Ok(Some(DateTime::from_naive_utc_and_offset(naive, Utc)))
        }
        None => Ok(None),
    }
}
