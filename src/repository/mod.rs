// ==========================================
// 汽车维修门店管理系统 - 数据仓储层
// ==========================================
// 职责: 数据访问, 乐观锁与唯一约束的唯一落点
// 约定: 所有仓储共享 Arc<Mutex<Connection>>, 时间戳以 UTC
//       "%Y-%m-%d %H:%M:%S" 文本存储
// ==========================================

pub mod action_log_repo;
pub mod appointment_repo;
pub mod catalog_repo;
pub mod error;
pub mod parts_inventory_repo;
pub mod work_order_repo;

pub use action_log_repo::ActionLogRepository;
pub use appointment_repo::AppointmentRepository;
pub use catalog_repo::CatalogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use parts_inventory_repo::{PartStock, PartsInventoryRepository};
pub use work_order_repo::WorkOrderRepository;
