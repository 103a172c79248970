// ==========================================
// 汽车维修门店管理系统 - 操作日志仓储
// ==========================================
// 红线: 审批/工单创建等裁决性写入必须落日志
// 用途: 审计追踪, 争议回溯
// ==========================================

use crate::domain::action_log::{ActionLog, ActionType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// ActionLogRepository - 操作日志仓储
// ==========================================
pub struct ActionLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ActionLogRepository {
    /// 创建新的ActionLogRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 追加操作日志
    pub fn insert(&self, log: &ActionLog) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        let payload_json = log
            .payload_json
            .as_ref()
            .map(|v| v.to_string());

        conn.execute(
            r#"INSERT INTO action_log (
                action_id, appointment_id, action_type, action_ts, actor,
                payload_json, detail
            ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &log.action_id,
                &log.appointment_id,
                log.action_type.to_db_str(),
                log.action_ts.format("%Y-%m-%d %H:%M:%S").to_string(),
                &log.actor,
                &payload_json,
                &log.detail,
            ],
        )?;

        Ok(log.action_id.clone())
    }

    /// 查询预约的操作日志 (按时间正序)
    pub fn list_by_appointment(&self, appointment_id: &str) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT action_id, appointment_id, action_type, action_ts, actor,
                      payload_json, detail
               FROM action_log
               WHERE appointment_id = ?
               ORDER BY action_ts ASC, rowid ASC"#,
        )?;

        let logs = stmt
            .query_map(params![appointment_id], Self::map_row)?
            .collect::<Result<Vec<ActionLog>, _>>()?;

        Ok(logs)
    }

    /// 映射数据库行到ActionLog对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<ActionLog> {
        let action_type_str: String = row.get(2)?;
        let action_ts_raw: String = row.get(3)?;
        let payload_raw: Option<String> = row.get(5)?;

        let payload_json = match payload_raw {
            Some(s) => Some(serde_json::from_str(&s).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    5,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?),
            None => None,
        };

        Ok(ActionLog {
            action_id: row.get(0)?,
            appointment_id: row.get(1)?,
            action_type: ActionType::from_db_str(&action_type_str).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, e.into())
            })?,
            action_ts: NaiveDateTime::parse_from_str(&action_ts_raw, "%Y-%m-%d %H:%M:%S")
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        3,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?,
            actor: row.get(4)?,
            payload_json,
            detail: row.get(6)?,
        })
    }
}
