// ==========================================
// 汽车维修门店管理系统 - 引擎层
// ==========================================
// 职责: 业务规则 (审批状态机 / 工单合成 / 告警派生 / 排期策略)
// 说明: 外部协作方 (库存查询 / 客户通知) 的 trait 在本层定义,
//       实现注入, 遵循依赖倒置
// ==========================================

pub mod alerting;
pub mod approval;
pub mod availability;
pub mod notification;
pub mod scheduling;
pub mod work_order;

// 重导出核心引擎与接口
pub use alerting::{AlertEngine, AlertThresholds};
pub use approval::{ApprovalCoordinator, ApprovalError, ApprovalResult};
pub use availability::{AvailabilityError, InventoryPartsChecker, PartsAvailabilityChecker};
pub use notification::{CustomerNotifier, LoggingNotifier, NotifyError};
pub use scheduling::{LeadTimeSchedulingPolicy, SchedulingPolicy};
pub use work_order::{
    resolve_labor_rate, SynthesisError, SynthesisResult, WorkOrderSynthesizer,
};
