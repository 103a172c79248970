// ==========================================
// 汽车维修门店管理系统 - 领域类型定义
// ==========================================
// 职责: 定义审批/工单/告警的封闭状态词汇表
// 红线: 状态枚举为封闭集合, 未知取值必须显式报错, 不允许静默回退
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 优先级 (Priority)
// ==========================================
// 顺序: Low < Medium < High < Urgent (用于告警排序)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,    // 低
    Medium, // 中
    High,   // 高
    Urgent, // 紧急
}

impl Priority {
    /// 转换为数据库存储字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Urgent => "URGENT",
        }
    }

    /// 从数据库字符串解析
    ///
    /// # 错误
    /// 未知取值返回 Err, 调用方必须显式处理 (不做静默回退)
    pub fn from_db_str(s: &str) -> Result<Self, String> {
        match s {
            "LOW" => Ok(Priority::Low),
            "MEDIUM" => Ok(Priority::Medium),
            "HIGH" => Ok(Priority::High),
            "URGENT" => Ok(Priority::Urgent),
            other => Err(format!("未知的优先级取值: {}", other)),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 审批状态 (Approval Status)
// ==========================================
// 状态机: PENDING -> APPROVED / DECLINED / REQUIRES_FOLLOWUP
// 三个目标状态对本状态机均为终态 (工单生命周期独立运转)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,          // 待审批
    Approved,         // 已批准
    Declined,         // 已拒绝
    RequiresFollowup, // 需跟进 (拒绝时指定了跟进人)
}

impl ApprovalStatus {
    /// 转换为数据库存储字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "PENDING",
            ApprovalStatus::Approved => "APPROVED",
            ApprovalStatus::Declined => "DECLINED",
            ApprovalStatus::RequiresFollowup => "REQUIRES_FOLLOWUP",
        }
    }

    /// 从数据库字符串解析
    pub fn from_db_str(s: &str) -> Result<Self, String> {
        match s {
            "PENDING" => Ok(ApprovalStatus::Pending),
            "APPROVED" => Ok(ApprovalStatus::Approved),
            "DECLINED" => Ok(ApprovalStatus::Declined),
            "REQUIRES_FOLLOWUP" => Ok(ApprovalStatus::RequiresFollowup),
            other => Err(format!("未知的审批状态取值: {}", other)),
        }
    }

    /// 是否仍可被审批 (状态机入口条件)
    pub fn is_pending(&self) -> bool {
        matches!(self, ApprovalStatus::Pending)
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 工单状态 (Work Order Status)
// ==========================================
// 状态机: ON_HOLD <-> READY_TO_START -> IN_PROGRESS -> COMPLETED
//         CANCELLED 可从任一未完成状态进入
// 本系统只负责播种初始状态 (ON_HOLD / READY_TO_START),
// 后续流转由工单执行域负责
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkOrderStatus {
    OnHold,       // 待备件 (缺件或库存状态未知)
    ReadyToStart, // 可开工
    InProgress,   // 施工中
    Completed,    // 已完工
    Cancelled,    // 已取消
}

impl WorkOrderStatus {
    /// 转换为数据库存储字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            WorkOrderStatus::OnHold => "ON_HOLD",
            WorkOrderStatus::ReadyToStart => "READY_TO_START",
            WorkOrderStatus::InProgress => "IN_PROGRESS",
            WorkOrderStatus::Completed => "COMPLETED",
            WorkOrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// 从数据库字符串解析
    pub fn from_db_str(s: &str) -> Result<Self, String> {
        match s {
            "ON_HOLD" => Ok(WorkOrderStatus::OnHold),
            "READY_TO_START" => Ok(WorkOrderStatus::ReadyToStart),
            "IN_PROGRESS" => Ok(WorkOrderStatus::InProgress),
            "COMPLETED" => Ok(WorkOrderStatus::Completed),
            "CANCELLED" => Ok(WorkOrderStatus::Cancelled),
            other => Err(format!("未知的工单状态取值: {}", other)),
        }
    }
}

impl fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 告警类型 (Alert Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    Urgent,   // 紧急审批积压
    Deadline, // 临近预约时段仍未审批
    Reminder, // 常规积压提醒
    Info,     // 一般信息
}

impl AlertType {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Urgent => "URGENT",
            AlertType::Deadline => "DEADLINE",
            AlertType::Reminder => "REMINDER",
            AlertType::Info => "INFO",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approval_status_roundtrip() {
        for status in [
            ApprovalStatus::Pending,
            ApprovalStatus::Approved,
            ApprovalStatus::Declined,
            ApprovalStatus::RequiresFollowup,
        ] {
            assert_eq!(ApprovalStatus::from_db_str(status.to_db_str()), Ok(status));
        }
    }

    #[test]
    fn test_unknown_status_is_explicit_error() {
        // 红线: 未知状态不允许静默回退到默认值
        assert!(ApprovalStatus::from_db_str("WAITING").is_err());
        assert!(WorkOrderStatus::from_db_str("PAUSED").is_err());
        assert!(Priority::from_db_str("P0").is_err());
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Urgent > Priority::High);
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
    }
}
