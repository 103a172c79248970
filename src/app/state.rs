// ==========================================
// 汽车维修门店管理系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 装配顺序: 数据库 -> Repository -> Engine -> API
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{AppointmentApi, DashboardApi, WorkOrderApi};
use crate::config::ConfigManager;
use crate::engine::{
    AlertEngine, ApprovalCoordinator, InventoryPartsChecker, LeadTimeSchedulingPolicy,
    LoggingNotifier, WorkOrderSynthesizer,
};
use crate::repository::{
    ActionLogRepository, AppointmentRepository, CatalogRepository, PartsInventoryRepository,
    WorkOrderRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源, 作为外壳层 (REST/桌面) 的全局状态
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 预约审批API
    pub appointment_api: Arc<AppointmentApi>,

    /// 工单API
    pub work_order_api: Arc<WorkOrderApi>,

    /// 驾驶舱API
    pub dashboard_api: Arc<DashboardApi>,

    /// 预约仓储 (外部预约服务写入路径)
    pub appointment_repo: Arc<AppointmentRepository>,

    /// 工单仓储 (工单执行域只读接入)
    pub work_order_repo: Arc<WorkOrderRepository>,

    /// 服务目录仓储 (目录初始化用)
    pub catalog_repo: Arc<CatalogRepository>,

    /// 备件库存仓储 (库存初始化用)
    pub parts_inventory_repo: Arc<PartsInventoryRepository>,

    /// 操作日志仓储 (审计追踪查询)
    pub action_log_repo: Arc<ActionLogRepository>,

    /// 配置管理器
    pub config: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 说明
    /// 该方法会:
    /// 1. 打开数据库连接并初始化 schema (幂等)
    /// 2. 初始化所有Repository
    /// 3. 初始化所有Engine
    /// 4. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState, 数据库路径: {}", db_path);

        // 创建数据库连接 (共享连接)
        let conn = crate::db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        crate::db::init_schema(&conn).map_err(|e| format!("schema 初始化失败: {}", e))?;

        // schema 版本提示 (不做自动迁移, 避免静默运行在旧库上)
        match crate::db::read_schema_version(&conn) {
            Ok(Some(v)) if v != crate::db::CURRENT_SCHEMA_VERSION => {
                tracing::warn!(
                    "数据库 schema_version={} 与当前代码期望的 {} 不一致",
                    v,
                    crate::db::CURRENT_SCHEMA_VERSION
                );
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("schema_version 读取失败: {}", e),
        }

        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let appointment_repo = Arc::new(AppointmentRepository::new(conn.clone()));
        let work_order_repo = Arc::new(WorkOrderRepository::new(conn.clone()));
        let catalog_repo = Arc::new(CatalogRepository::new(conn.clone()));
        let parts_inventory_repo = Arc::new(PartsInventoryRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));

        let config = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let notifier = Arc::new(LoggingNotifier);
        let checker = Arc::new(InventoryPartsChecker::new(parts_inventory_repo.clone()));
        let scheduling_policy = Arc::new(LeadTimeSchedulingPolicy::new(config.clone()));
        let alert_engine = Arc::new(AlertEngine::new());

        let coordinator = Arc::new(ApprovalCoordinator::new(
            appointment_repo.clone(),
            action_log_repo.clone(),
            notifier,
        ));

        let synthesizer = Arc::new(WorkOrderSynthesizer::new(
            appointment_repo.clone(),
            work_order_repo.clone(),
            catalog_repo.clone(),
            action_log_repo.clone(),
            checker,
            scheduling_policy,
            config.clone(),
        ));

        // ==========================================
        // 创建API实例
        // ==========================================
        let appointment_api = Arc::new(AppointmentApi::new(
            appointment_repo.clone(),
            coordinator,
        ));
        let work_order_api = Arc::new(WorkOrderApi::new(synthesizer, work_order_repo.clone()));
        let dashboard_api = Arc::new(DashboardApi::new(
            appointment_repo.clone(),
            work_order_repo.clone(),
            alert_engine,
            config.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            appointment_api,
            work_order_api,
            dashboard_api,
            appointment_repo,
            work_order_repo,
            catalog_repo,
            parts_inventory_repo,
            action_log_repo,
            config,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先使用系统应用数据目录, 不可用时回退当前目录
pub fn get_default_db_path() -> String {
    let base = dirs::data_local_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
    let dir = base.join("auto-service-wos");

    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!("无法创建数据目录 {:?}, 回退当前目录: {}", dir, e);
        return "auto_service_wos.db".to_string();
    }

    dir.join("auto_service_wos.db").to_string_lossy().to_string()
}
