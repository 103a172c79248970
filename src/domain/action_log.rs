// ==========================================
// 汽车维修门店管理系统 - 操作日志领域模型
// ==========================================
// 红线: 审批与工单创建等所有裁决性写入必须记录
// 用途: 审计追踪, 争议回溯
// 对齐: action_log 表
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    // ===== 主键 =====
    pub action_id: String,              // 日志ID (UUID)
    pub appointment_id: Option<String>, // 关联预约 (系统级操作可为 None)
    pub action_type: ActionType,        // 操作类型
    pub action_ts: NaiveDateTime,       // 操作时间戳 (UTC)
    pub actor: String,                  // 操作人

    // ===== 操作负载 =====
    pub payload_json: Option<JsonValue>, // 操作参数 (JSON)
    pub detail: Option<String>,          // 详细描述
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    Approve,         // 批准预约
    Decline,         // 拒绝预约
    CreateWorkOrder, // 生成工单
}

impl ActionType {
    /// 转换为数据库存储字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ActionType::Approve => "APPROVE",
            ActionType::Decline => "DECLINE",
            ActionType::CreateWorkOrder => "CREATE_WORK_ORDER",
        }
    }

    /// 从数据库字符串解析
    pub fn from_db_str(s: &str) -> Result<Self, String> {
        match s {
            "APPROVE" => Ok(ActionType::Approve),
            "DECLINE" => Ok(ActionType::Decline),
            "CREATE_WORK_ORDER" => Ok(ActionType::CreateWorkOrder),
            other => Err(format!("未知的操作类型取值: {}", other)),
        }
    }
}
