// ==========================================
// 汽车维修门店管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 红线: 阈值与默认费率必须走命名配置, 业务代码不允许内联魔数
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::types::Priority;
use rusqlite::{params, Connection};
use serde_json::json;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ===== 配置键与默认值 =====
pub const KEY_URGENT_COST_THRESHOLD: &str = "urgent_cost_threshold";
pub const KEY_URGENT_AGE_HOURS: &str = "urgent_age_hours";
pub const KEY_BACKLOG_HIGH_THRESHOLD: &str = "backlog_high_threshold";
pub const KEY_DEFAULT_LABOR_RATE: &str = "default_labor_rate";

/// 紧急告警费用阈值 (元): 待审批预约预估总价超过该值即触发紧急告警
pub const DEFAULT_URGENT_COST_THRESHOLD: f64 = 1000.0;
/// 紧急告警积压阈值 (小时): 待审批超过该时长即触发紧急告警
pub const DEFAULT_URGENT_AGE_HOURS: i64 = 24;
/// 积压告警升高阈值 (单数): 待审批数量超过该值时积压告警升为 HIGH
pub const DEFAULT_BACKLOG_HIGH_THRESHOLD: i64 = 5;
/// 默认工时费率 (元/小时): 费率解析链的兜底值
pub const DEFAULT_LABOR_RATE: f64 = 100.0;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明: 为保证连接行为一致, 会对传入连接再次应用统一 PRAGMA (幂等)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值 (scope_id='global')
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入 global scope 配置 (覆写)
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            r#"INSERT INTO config_kv (scope_id, key, value, updated_at)
               VALUES ('global', ?1, ?2, datetime('now'))
               ON CONFLICT(scope_id, key) DO UPDATE SET
                   value = excluded.value,
                   updated_at = excluded.updated_at"#,
            params![key, value],
        )?;

        Ok(())
    }

    // ==========================================
    // 告警阈值
    // ==========================================

    /// 紧急告警费用阈值 (元)
    pub fn get_urgent_cost_threshold(&self) -> Result<f64, Box<dyn Error>> {
        match self.get_config_value(KEY_URGENT_COST_THRESHOLD)? {
            Some(v) => Ok(v.parse::<f64>()?),
            None => Ok(DEFAULT_URGENT_COST_THRESHOLD),
        }
    }

    /// 紧急告警积压阈值 (小时)
    pub fn get_urgent_age_hours(&self) -> Result<i64, Box<dyn Error>> {
        match self.get_config_value(KEY_URGENT_AGE_HOURS)? {
            Some(v) => Ok(v.parse::<i64>()?),
            None => Ok(DEFAULT_URGENT_AGE_HOURS),
        }
    }

    /// 积压告警升高阈值 (单数)
    pub fn get_backlog_high_threshold(&self) -> Result<i64, Box<dyn Error>> {
        match self.get_config_value(KEY_BACKLOG_HIGH_THRESHOLD)? {
            Some(v) => Ok(v.parse::<i64>()?),
            None => Ok(DEFAULT_BACKLOG_HIGH_THRESHOLD),
        }
    }

    // ==========================================
    // 计费与排期
    // ==========================================

    /// 默认工时费率 (元/小时, 费率解析链兜底)
    pub fn get_default_labor_rate(&self) -> Result<f64, Box<dyn Error>> {
        match self.get_config_value(KEY_DEFAULT_LABOR_RATE)? {
            Some(v) => Ok(v.parse::<f64>()?),
            None => Ok(DEFAULT_LABOR_RATE),
        }
    }

    /// 按优先级取开工提前期 (天)
    ///
    /// 说明: 默认排期策略 = 今天 + 提前期, 优先级越高开工越早;
    /// 可通过 start_lead_days_{priority} 覆写
    pub fn get_start_lead_days(&self, priority: Priority) -> Result<i64, Box<dyn Error>> {
        let key = match priority {
            Priority::Urgent => "start_lead_days_urgent",
            Priority::High => "start_lead_days_high",
            Priority::Medium => "start_lead_days_medium",
            Priority::Low => "start_lead_days_low",
        };

        let default = match priority {
            Priority::Urgent => 1,
            Priority::High => 2,
            Priority::Medium => 3,
            Priority::Low => 5,
        };

        match self.get_config_value(key)? {
            Some(v) => Ok(v.parse::<i64>()?),
            None => Ok(default),
        }
    }

    // ==========================================
    // 快照
    // ==========================================

    /// 获取当前生效配置的快照 (JSON 格式)
    ///
    /// # 用途
    /// - 启动日志与问题回溯时记录当时配置
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let snapshot = json!({
            "urgent_cost_threshold": self.get_urgent_cost_threshold()?,
            "urgent_age_hours": self.get_urgent_age_hours()?,
            "backlog_high_threshold": self.get_backlog_high_threshold()?,
            "default_labor_rate": self.get_default_labor_rate()?,
        });

        Ok(snapshot.to_string())
    }
}
