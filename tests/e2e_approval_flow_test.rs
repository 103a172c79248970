// ==========================================
// 预约审批 -> 工单生成 端到端测试
// ==========================================
// 职责: 验证完整业务流水线
// 流程: 外部预约创建 -> 告警/统计 -> 审批裁决 -> 工单合成 -> 回链与审计
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

use auto_service_wos::domain::action_log::ActionType;
use auto_service_wos::domain::types::{AlertType, ApprovalStatus, WorkOrderStatus};

use crate::test_helpers::{seed_catalog_item, seed_inventory, seed_pending_appointment, setup_state};

#[tokio::test]
async fn test_full_pipeline_approve_to_ready_work_order() {
    let (_temp_file, state) = setup_state();

    // 1. 门店基础数据: 服务目录 + 备件库存
    seed_catalog_item(
        &state,
        "svc-brake",
        "刹车片更换",
        Some(120.0),
        &[("brake-pad", 2), ("brake-fluid", 1)],
    );
    seed_inventory(&state, "brake-pad", "刹车片", 10);
    seed_inventory(&state, "brake-fluid", "刹车油", 5);

    // 2. 外部预约服务创建高价值预约 (PENDING)
    seed_pending_appointment(&state, "appt-1", "svc-brake", 1500.0, 2);

    // 3. 轮询: 费用阈值触发紧急告警, 统计口径一致
    let alerts = state.dashboard_api.list_alerts().unwrap();
    assert!(alerts.iter().any(|a| a.alert_type == AlertType::Urgent));
    let stats = state.dashboard_api.stats_overview().unwrap();
    assert_eq!(stats.pending_count, 1);
    assert_eq!(stats.urgent_approvals, 1);

    // 4. 管理员批准
    let approved = state
        .appointment_api
        .approve("appt-1", "客户已确认报价", true, "admin-1")
        .await
        .unwrap();
    assert_eq!(approved.approval_status, ApprovalStatus::Approved);

    // 5. 生成工单: 全件齐备 -> 可开工 + 已排期
    let creation = state
        .work_order_api
        .create_from_appointment("appt-1", "admin-1")
        .await
        .unwrap();
    assert_eq!(creation.work_order.status, WorkOrderStatus::ReadyToStart);
    assert_eq!(creation.work_order.work_order_number, "WO-000001");
    assert!(creation.work_order.estimated_start_date.is_some());

    // 6. 预约 <-> 工单 双向可达
    let appointment = state.appointment_api.get_appointment("appt-1").unwrap();
    assert_eq!(
        appointment.work_order_id.as_deref(),
        Some(creation.work_order.work_order_id.as_str())
    );
    let by_appointment = state
        .work_order_api
        .get_by_appointment("appt-1")
        .unwrap()
        .expect("应能按预约查到工单");
    assert_eq!(by_appointment.work_order_number, "WO-000001");

    // 7. 队列清空: 告警消失, 统计归位
    let alerts = state.dashboard_api.list_alerts().unwrap();
    assert!(alerts.is_empty());
    let stats = state.dashboard_api.stats_overview().unwrap();
    assert_eq!(stats.pending_count, 0);
    assert_eq!(stats.approved_count, 1);
    assert_eq!(stats.work_orders_ready, 1);

    // 8. 审计链完整: 批准 + 工单创建各一条
    let logs = state.action_log_repo.list_by_appointment("appt-1").unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].action_type, ActionType::Approve);
    assert_eq!(logs[1].action_type, ActionType::CreateWorkOrder);
}

#[tokio::test]
async fn test_full_pipeline_decline_to_followup() {
    let (_temp_file, state) = setup_state();
    seed_pending_appointment(&state, "appt-1", "svc-brake", 600.0, 2);

    // 拒绝并转跟进
    let declined = state
        .appointment_api
        .decline(
            "appt-1",
            "客户要求改期, 需电话确认新时段",
            Some("advisor-3".to_string()),
            true,
            "admin-1",
        )
        .await
        .unwrap();
    assert_eq!(declined.approval_status, ApprovalStatus::RequiresFollowup);
    assert_eq!(declined.assigned_follow_up_to.as_deref(), Some("advisor-3"));

    // 被拒预约不能生成工单
    let result = state
        .work_order_api
        .create_from_appointment("appt-1", "admin-1")
        .await;
    assert!(result.is_err());

    // 统计反映跟进队列
    let stats = state.dashboard_api.stats_overview().unwrap();
    assert_eq!(stats.pending_count, 0);
    assert_eq!(stats.requires_followup_count, 1);
    assert_eq!(stats.work_orders_total, 0);
}

#[tokio::test]
async fn test_on_hold_pipeline_missing_parts() {
    let (_temp_file, state) = setup_state();
    seed_catalog_item(
        &state,
        "svc-clutch",
        "离合器总成更换",
        Some(160.0),
        &[("clutch-kit", 1), ("gearbox-oil", 2)],
    );
    // 套件缺货, 齿轮油仅 1 桶
    seed_inventory(&state, "clutch-kit", "离合器套件", 0);
    seed_inventory(&state, "gearbox-oil", "齿轮油", 1);
    seed_pending_appointment(&state, "appt-1", "svc-clutch", 2400.0, 2);

    state
        .appointment_api
        .approve("appt-1", "客户同意等备件", false, "admin-1")
        .await
        .unwrap();

    let creation = state
        .work_order_api
        .create_from_appointment("appt-1", "admin-1")
        .await
        .unwrap();

    // 待备件: 缺口逐项精确
    assert_eq!(creation.work_order.status, WorkOrderStatus::OnHold);
    let missing = &creation.parts_availability.missing_parts;
    assert_eq!(missing.len(), 2);
    assert!(missing
        .iter()
        .any(|m| m.name == "离合器套件" && m.quantity == 1));
    assert!(missing.iter().any(|m| m.name == "齿轮油" && m.quantity == 1));

    let stats = state.dashboard_api.stats_overview().unwrap();
    assert_eq!(stats.work_orders_on_hold, 1);
    assert_eq!(stats.work_orders_ready, 0);
}
