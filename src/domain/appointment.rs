// ==========================================
// 汽车维修门店管理系统 - 预约领域模型
// ==========================================
// 职责: 预约实体定义 (客户服务请求, 等待门店管理员审批)
// 红线: 审批相关字段只能由审批协调器写入
// 对齐: appointment 表
// ==========================================

use crate::domain::types::{ApprovalStatus, Priority};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// EstimatedCost - 预估费用
// ==========================================
// 小计为工时+备件估算, 总计含税费
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimatedCost {
    pub subtotal: f64, // 小计 (元)
    pub total: f64,    // 总计 (元)
}

// ==========================================
// Appointment - 预约
// ==========================================
// 生命周期: 外部预约服务创建 (PENDING) -> 审批协调器裁决
//          -> 批准后由工单合成器生成工单并回填 work_order_id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    // ===== 主键 =====
    pub appointment_id: String, // 预约唯一标识 (UUID)

    // ===== 关联引用 =====
    pub customer_id: String,     // 客户引用
    pub vehicle_id: String,      // 车辆引用
    pub service_type_id: String, // 服务类型引用 (服务目录外键, 审批后解析)

    // ===== 预约时段 =====
    pub scheduled_date: NaiveDate,      // 预约日期
    pub scheduled_time: Option<String>, // 预约时段 ("HH:MM", 可空)

    // ===== 费用与优先级 =====
    pub estimated_cost: EstimatedCost, // 预估费用
    pub priority: Priority,            // 优先级 (创建工单时复制)

    // ===== 审批裁决字段 (仅审批协调器写入) =====
    pub approval_status: ApprovalStatus,          // 审批状态
    pub approval_notes: Option<String>,           // 批准备注
    pub decline_reason: Option<String>,           // 拒绝原因
    pub assigned_follow_up_to: Option<String>,    // 跟进人 (拒绝时指定则进入 REQUIRES_FOLLOWUP)

    // ===== 工单回链 =====
    pub work_order_id: Option<String>, // 已生成工单ID (NULL=未生成)

    // ===== 计费覆写 =====
    pub labor_rate_override: Option<f64>, // 预约级协商工时费率 (参与费率解析链)

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,         // 创建时间 (外部预约服务写入)
    pub decided_at: Option<DateTime<Utc>>, // 裁决时间

    // ===== 并发控制 =====
    pub version: i32, // 乐观锁版本号 (每次写入 +1)
}

impl Appointment {
    /// 预约积压时长 (小时)
    ///
    /// 用途: 告警引擎的超龄判定
    pub fn age_hours(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_hours()
    }
}

// ==========================================
// ApprovalDecision - 审批裁决载荷
// ==========================================
// 用途: 审批协调器 -> 仓储层 CAS 更新的输入
// 说明: target_status 由协调器根据裁决类型与跟进人推导
#[derive(Debug, Clone)]
pub struct ApprovalDecision {
    pub target_status: ApprovalStatus,         // 目标状态 (APPROVED/DECLINED/REQUIRES_FOLLOWUP)
    pub approval_notes: Option<String>,        // 批准备注 (批准时必填)
    pub decline_reason: Option<String>,        // 拒绝原因 (拒绝时必填)
    pub assigned_follow_up_to: Option<String>, // 跟进人
    pub decided_at: DateTime<Utc>,             // 裁决时间戳
}
