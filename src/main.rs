// ==========================================
// 汽车维修门店管理系统 - 主入口
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 预约审批 -> 工单生成流水线
// 说明: 前端外壳 (REST/桌面) 作为展示层独立部署,
//       本入口负责核心装配与启动自检
// ==========================================

use auto_service_wos::app::{get_default_db_path, AppState};
use auto_service_wos::domain::types::ApprovalStatus;

fn main() {
    // 初始化日志系统
    auto_service_wos::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", auto_service_wos::APP_NAME);
    tracing::info!("系统版本: {}", auto_service_wos::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径
    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    // 创建AppState
    tracing::info!("正在初始化AppState...");
    let app_state = match AppState::new(db_path) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("无法初始化AppState: {}", e);
            std::process::exit(1);
        }
    };

    // 启动自检: 审批队列与告警概况
    match app_state
        .appointment_repo
        .count_by_status(ApprovalStatus::Pending)
    {
        Ok(pending) => tracing::info!("当前待审批预约: {} 个", pending),
        Err(e) => tracing::warn!("待审批队列查询失败: {}", e),
    }

    match app_state.dashboard_api.list_alerts() {
        Ok(alerts) => {
            tracing::info!("当前告警: {} 条", alerts.len());
            for alert in &alerts {
                tracing::info!(
                    alert_type = %alert.alert_type,
                    priority = %alert.priority,
                    "{}: {}",
                    alert.title,
                    alert.message
                );
            }
        }
        Err(e) => tracing::warn!("告警派生失败: {}", e),
    }

    match app_state.catalog_repo.list_all() {
        Ok(items) => tracing::info!("服务目录条目: {} 个", items.len()),
        Err(e) => tracing::warn!("服务目录查询失败: {}", e),
    }

    match app_state.config.get_config_snapshot() {
        Ok(snapshot) => tracing::info!("生效配置: {}", snapshot),
        Err(e) => tracing::warn!("配置快照读取失败: {}", e),
    }

    tracing::info!("核心就绪, 等待外壳层接入");
}
