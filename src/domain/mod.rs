// ==========================================
// 汽车维修门店管理系统 - 领域层
// ==========================================
// 职责: 实体与类型定义, 不依赖任何其他层
// ==========================================

pub mod action_log;
pub mod alert;
pub mod appointment;
pub mod catalog;
pub mod types;
pub mod work_order;

// 重导出常用实体
pub use action_log::{ActionLog, ActionType};
pub use alert::Alert;
pub use appointment::{Appointment, ApprovalDecision, EstimatedCost};
pub use catalog::ServiceCatalogItem;
pub use work_order::{
    MissingPart, PartRequirement, PartsAvailability, WorkOrder, WorkOrderCreation,
};
