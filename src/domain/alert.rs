// ==========================================
// 汽车维修门店管理系统 - 告警领域模型
// ==========================================
// 职责: 派生告警定义 (不落库, 每次轮询重算后丢弃)
// 说明: dismissed 为会话级前端状态, 派生时恒为 false;
//       告警不做跨轮询去重, 重算即最新事实
// ==========================================

use crate::domain::types::{AlertType, Priority};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Alert - 告警
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub alert_id: String,           // 告警ID (UUID, 每次派生重新生成)
    pub alert_type: AlertType,      // 告警类型
    pub title: String,              // 标题
    pub message: String,            // 描述 (含显式数据依据, 可解释)
    pub priority: Priority,         // 优先级 (排序依据)
    pub timestamp: DateTime<Utc>,   // 派生时间
    pub action_url: Option<String>, // 前端跳转地址
    #[serde(default)]
    pub dismissed: bool,            // 会话级已读标记 (派生时恒为 false)
}
