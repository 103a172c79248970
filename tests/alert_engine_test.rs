// ==========================================
// 告警派生与驾驶舱统计测试
// ==========================================
// 职责: 验证告警阈值规则、配置覆写、统计口径一致性
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

use auto_service_wos::domain::types::AlertType;

use crate::test_helpers::{seed_pending_appointment, setup_state};

#[tokio::test]
async fn test_no_pending_no_alerts() {
    let (_temp_file, state) = setup_state();

    let alerts = state.dashboard_api.list_alerts().unwrap();
    assert!(alerts.is_empty());
}

#[tokio::test]
async fn test_high_value_pending_triggers_urgent_alert() {
    let (_temp_file, state) = setup_state();
    // 1500 元, 仅积压 2 小时: 费用阈值单独命中
    seed_pending_appointment(&state, "appt-1", "svc-brake", 1500.0, 2);

    let alerts = state.dashboard_api.list_alerts().unwrap();
    assert!(alerts.iter().any(|a| a.alert_type == AlertType::Urgent));
    // 严重度降序: 紧急告警排在积压提醒之前
    assert_eq!(alerts[0].alert_type, AlertType::Urgent);
}

#[tokio::test]
async fn test_overdue_pending_triggers_urgent_alert() {
    let (_temp_file, state) = setup_state();
    // 低价但积压 30 小时: 超龄条件命中
    seed_pending_appointment(&state, "appt-1", "svc-oil", 200.0, 30);

    let alerts = state.dashboard_api.list_alerts().unwrap();
    assert!(alerts.iter().any(|a| a.alert_type == AlertType::Urgent));
}

#[tokio::test]
async fn test_quiet_pending_only_backlog_reminder() {
    let (_temp_file, state) = setup_state();
    seed_pending_appointment(&state, "appt-1", "svc-oil", 200.0, 2);

    let alerts = state.dashboard_api.list_alerts().unwrap();
    assert!(!alerts.iter().any(|a| a.alert_type == AlertType::Urgent));
    let backlog = alerts
        .iter()
        .find(|a| a.alert_type == AlertType::Reminder)
        .expect("应有积压提醒");
    assert!(backlog.message.contains('1'));
}

#[tokio::test]
async fn test_threshold_override_via_config() {
    let (_temp_file, state) = setup_state();
    seed_pending_appointment(&state, "appt-1", "svc-brake", 1500.0, 2);

    // 默认阈值下触发紧急
    let alerts = state.dashboard_api.list_alerts().unwrap();
    assert!(alerts.iter().any(|a| a.alert_type == AlertType::Urgent));

    // 阈值上调到 2000 后, 同一预约不再紧急
    state
        .config
        .set_config_value("urgent_cost_threshold", "2000")
        .unwrap();
    let alerts = state.dashboard_api.list_alerts().unwrap();
    assert!(!alerts.iter().any(|a| a.alert_type == AlertType::Urgent));
}

#[tokio::test]
async fn test_alerts_recomputed_each_poll() {
    let (_temp_file, state) = setup_state();
    seed_pending_appointment(&state, "appt-1", "svc-brake", 1500.0, 2);

    assert!(!state.dashboard_api.list_alerts().unwrap().is_empty());

    // 裁决后积压清空, 下一次轮询告警随之消失 (无跨轮询残留)
    state
        .appointment_api
        .decline("appt-1", "报价未通过", None, false, "admin-1")
        .await
        .unwrap();

    assert!(state.dashboard_api.list_alerts().unwrap().is_empty());
}

// ==========================================
// 驾驶舱统计
// ==========================================

#[tokio::test]
async fn test_stats_overview_urgent_is_computed_not_hardcoded() {
    let (_temp_file, state) = setup_state();
    seed_pending_appointment(&state, "appt-1", "svc-brake", 1500.0, 2); // 高价值
    seed_pending_appointment(&state, "appt-2", "svc-oil", 200.0, 30); // 超龄
    seed_pending_appointment(&state, "appt-3", "svc-oil", 200.0, 1); // 均不满足

    let stats = state.dashboard_api.stats_overview().unwrap();
    assert_eq!(stats.pending_count, 3);
    // 与告警引擎同一套规则: 恰好 2 个紧急
    assert_eq!(stats.urgent_approvals, 2);
    assert!((stats.pending_total_value - 1900.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_stats_overview_tracks_decisions() {
    let (_temp_file, state) = setup_state();
    seed_pending_appointment(&state, "appt-1", "svc-oil", 200.0, 1);
    seed_pending_appointment(&state, "appt-2", "svc-oil", 200.0, 1);
    seed_pending_appointment(&state, "appt-3", "svc-oil", 200.0, 1);

    state
        .appointment_api
        .approve("appt-1", "同意", false, "admin-1")
        .await
        .unwrap();
    state
        .appointment_api
        .decline("appt-2", "无法安排", None, false, "admin-1")
        .await
        .unwrap();
    state
        .appointment_api
        .decline(
            "appt-3",
            "需再确认",
            Some("tech_7".to_string()),
            false,
            "admin-1",
        )
        .await
        .unwrap();

    let stats = state.dashboard_api.stats_overview().unwrap();
    assert_eq!(stats.pending_count, 0);
    assert_eq!(stats.approved_count, 1);
    assert_eq!(stats.declined_count, 1);
    assert_eq!(stats.requires_followup_count, 1);
    assert_eq!(stats.urgent_approvals, 0);
}
