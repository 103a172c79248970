// ==========================================
// 汽车维修门店管理系统 - 工单领域模型
// ==========================================
// 职责: 工单实体 + 备件可用性快照定义
// 红线: 一个预约至多一张工单, 由 work_order.appointment_id
//       的唯一约束保证, 不依赖应用层先查后写
// 对齐: work_order 表
// ==========================================

use crate::domain::types::{Priority, WorkOrderStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// PartRequirement - 备件需求
// ==========================================
// 来源: 服务目录 required_parts 列表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartRequirement {
    pub sku: String,   // 备件编码
    pub quantity: i64, // 需求数量
}

// ==========================================
// MissingPart - 缺件明细
// ==========================================
// quantity 为缺口数量 (需求 - 库存), 不是需求总量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingPart {
    pub name: String,  // 备件名称 (库存服务提供; 未知备件回退为 SKU)
    pub quantity: i64, // 缺口数量
}

// ==========================================
// PartsAvailability - 备件可用性快照
// ==========================================
// 在工单创建时刻固化, 作为 JSON 快照列持久化
// availability_unknown: 库存服务不可达时的降级标记
//   (此时 all_available=false, missing_parts 为空)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartsAvailability {
    pub all_available: bool,             // 是否全部备件可用
    pub missing_parts: Vec<MissingPart>, // 缺件明细
    #[serde(default)]
    pub availability_unknown: bool,      // 库存状态未知 (降级路径)
}

impl PartsAvailability {
    /// 全部可用快照
    pub fn fully_available() -> Self {
        Self {
            all_available: true,
            missing_parts: Vec::new(),
            availability_unknown: false,
        }
    }

    /// 缺件快照
    pub fn with_missing(missing_parts: Vec<MissingPart>) -> Self {
        Self {
            all_available: false,
            missing_parts,
            availability_unknown: false,
        }
    }

    /// 库存状态未知快照 (库存服务不可达)
    pub fn unknown() -> Self {
        Self {
            all_available: false,
            missing_parts: Vec::new(),
            availability_unknown: true,
        }
    }
}

// ==========================================
// WorkOrder - 工单
// ==========================================
// 生命周期: 工单合成器创建后, 由工单执行域接管流转
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrder {
    // ===== 主键与关联 =====
    pub work_order_id: String,  // 工单唯一标识 (UUID)
    pub appointment_id: String, // 来源预约 (UNIQUE, 1:1)

    // ===== 单号 =====
    pub work_order_number: String, // 工单号 (全局单调唯一, 原子序列分配)

    // ===== 状态与优先级 =====
    pub status: WorkOrderStatus, // 工单状态 (创建时播种 ON_HOLD/READY_TO_START)
    pub priority: Priority,      // 优先级 (创建时从预约复制)

    // ===== 计费快照 (创建时从服务目录固化) =====
    pub service_name: String,            // 服务名称
    pub labor_rate: f64,                 // 工时费率 (费率解析链结果)
    pub estimated_duration_minutes: i64, // 预估工时 (分钟)

    // ===== 排期 =====
    pub estimated_start_date: Option<NaiveDate>, // 预计开工日期 (缺件/未知时为 NULL)

    // ===== 备件可用性快照 =====
    pub parts_availability: PartsAvailability, // 创建时刻的库存快照 (JSON 列)

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>, // 创建时间
}

// ==========================================
// WorkOrderCreation - 工单创建结果
// ==========================================
// 用途: 工单合成器返回值 (工单 + 本次查询到的可用性)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrderCreation {
    pub work_order: WorkOrder,                 // 新建工单
    pub parts_availability: PartsAvailability, // 备件可用性 (与工单快照一致)
}
