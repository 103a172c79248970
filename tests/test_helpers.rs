// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================

use auto_service_wos::app::AppState;
use auto_service_wos::domain::appointment::{Appointment, EstimatedCost};
use auto_service_wos::domain::catalog::ServiceCatalogItem;
use auto_service_wos::domain::types::{ApprovalStatus, Priority};
use auto_service_wos::domain::work_order::PartRequirement;
use auto_service_wos::repository::parts_inventory_repo::PartStock;
use chrono::{Duration, Utc};
use rusqlite::Connection;
use std::error::Error;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件 (需要保持存活)
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = Connection::open(&db_path)?;
    auto_service_wos::db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 创建测试环境 (临时库 + 完整装配的 AppState)
pub fn setup_state() -> (NamedTempFile, AppState) {
    let (temp_file, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path).unwrap();
    (temp_file, state)
}

/// 构造待审批预约 (未落库)
///
/// # 参数
/// - id: 预约ID
/// - service_type_id: 服务类型
/// - total: 预估总价 (元)
/// - age_hours: 已积压时长 (小时)
pub fn build_pending_appointment(
    id: &str,
    service_type_id: &str,
    total: f64,
    age_hours: i64,
) -> Appointment {
    let now = Utc::now();
    Appointment {
        appointment_id: id.to_string(),
        customer_id: format!("cust-{}", id),
        vehicle_id: format!("veh-{}", id),
        service_type_id: service_type_id.to_string(),
        // 预约时段放在 3 天后, 避免无关的临近时段告警干扰断言
        scheduled_date: (now + Duration::days(3)).date_naive(),
        scheduled_time: Some("10:00".to_string()),
        estimated_cost: EstimatedCost {
            subtotal: total * 0.9,
            total,
        },
        priority: Priority::Medium,
        approval_status: ApprovalStatus::Pending,
        approval_notes: None,
        decline_reason: None,
        assigned_follow_up_to: None,
        work_order_id: None,
        labor_rate_override: None,
        created_at: now - Duration::hours(age_hours),
        decided_at: None,
        version: 0,
    }
}

/// 写入待审批预约
pub fn seed_pending_appointment(
    state: &AppState,
    id: &str,
    service_type_id: &str,
    total: f64,
    age_hours: i64,
) -> Appointment {
    let appointment = build_pending_appointment(id, service_type_id, total, age_hours);
    state.appointment_repo.create(&appointment).unwrap();
    appointment
}

/// 写入服务目录条目
///
/// # 参数
/// - parts: 备件需求 (sku, quantity)
pub fn seed_catalog_item(
    state: &AppState,
    service_type_id: &str,
    name: &str,
    labor_rate: Option<f64>,
    parts: &[(&str, i64)],
) {
    let item = ServiceCatalogItem {
        service_type_id: service_type_id.to_string(),
        name: name.to_string(),
        labor_rate,
        estimated_duration_minutes: 90,
        required_parts: parts
            .iter()
            .map(|(sku, quantity)| PartRequirement {
                sku: sku.to_string(),
                quantity: *quantity,
            })
            .collect(),
    };
    state.catalog_repo.upsert(&item).unwrap();
}

/// 写入备件库存
pub fn seed_inventory(state: &AppState, sku: &str, name: &str, quantity_in_stock: i64) {
    state
        .parts_inventory_repo
        .upsert(&PartStock {
            sku: sku.to_string(),
            name: name.to_string(),
            quantity_in_stock,
        })
        .unwrap();
}

/// 标准测试场景: 刹车保养服务 + 充足库存 + 一条已批准预约
///
/// # 返回
/// 已批准预约的ID
pub async fn seed_approved_brake_job(state: &AppState, id: &str) -> String {
    seed_catalog_item(
        state,
        "svc-brake",
        "刹车片更换",
        Some(120.0),
        &[("brake-pad", 2)],
    );
    seed_inventory(state, "brake-pad", "刹车片", 10);
    seed_pending_appointment(state, id, "svc-brake", 800.0, 2);

    state
        .appointment_api
        .approve(id, "车辆已到店, 可以施工", false, "admin-1")
        .await
        .unwrap();

    id.to_string()
}
