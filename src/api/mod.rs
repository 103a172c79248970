// ==========================================
// 汽车维修门店管理系统 - API 层
// ==========================================
// 职责: 业务接口, 前端外壳 (REST/桌面) 消费的边界
// ==========================================

pub mod appointment_api;
pub mod dashboard_api;
pub mod error;
pub mod work_order_api;

pub use appointment_api::{AppointmentApi, PendingApprovalPage};
pub use dashboard_api::{DashboardApi, StatsOverview};
pub use error::{ApiError, ApiResult};
pub use work_order_api::WorkOrderApi;
