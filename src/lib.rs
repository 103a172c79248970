// ==========================================
// 汽车维修门店管理系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 预约审批 -> 工单生成流水线 (人工最终控制权)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施 (连接初始化/PRAGMA/schema 统一)
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 外壳集成
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AlertType, ApprovalStatus, Priority, WorkOrderStatus};

// 领域实体
pub use domain::{
    ActionLog, ActionType, Alert, Appointment, ApprovalDecision, EstimatedCost, MissingPart,
    PartRequirement, PartsAvailability, ServiceCatalogItem, WorkOrder, WorkOrderCreation,
};

// 引擎
pub use engine::{
    AlertEngine, AlertThresholds, ApprovalCoordinator, CustomerNotifier, InventoryPartsChecker,
    LeadTimeSchedulingPolicy, LoggingNotifier, PartsAvailabilityChecker, SchedulingPolicy,
    WorkOrderSynthesizer,
};

// API
pub use api::{AppointmentApi, DashboardApi, WorkOrderApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "汽车维修门店管理系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

// ==========================================
// 预编译检查
// ==========================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
