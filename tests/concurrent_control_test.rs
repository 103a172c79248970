// ==========================================
// 并发控制测试
// ==========================================
// 职责: 验证审批 CAS 单胜者语义与工单号原子分配
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

use std::collections::HashSet;
use std::sync::Arc;

use auto_service_wos::api::ApiError;
use auto_service_wos::domain::appointment::ApprovalDecision;
use auto_service_wos::domain::types::ApprovalStatus;
use auto_service_wos::repository::error::RepositoryError;
use chrono::Utc;
use futures::future::join_all;

use crate::test_helpers::{seed_catalog_item, seed_inventory, seed_pending_appointment, setup_state};

// ==========================================
// 测试1: 乐观锁冲突 (仓储层)
// ==========================================

#[tokio::test]
async fn test_optimistic_lock_conflict() {
    let (_temp_file, state) = setup_state();
    seed_pending_appointment(&state, "appt-1", "svc-oil", 300.0, 2);

    // 模拟外部预约服务在裁决前更新了该预约 (版本号前移)
    let side_conn = rusqlite::Connection::open(&state.db_path).unwrap();
    side_conn
        .execute(
            "UPDATE appointment SET version = version + 1 WHERE appointment_id = 'appt-1'",
            [],
        )
        .unwrap();

    // 携带陈旧版本号的裁决必须失败
    let decision = ApprovalDecision {
        target_status: ApprovalStatus::Approved,
        approval_notes: Some("基于陈旧读的批准".to_string()),
        decline_reason: None,
        assigned_follow_up_to: None,
        decided_at: Utc::now(),
    };

    let result = state.appointment_repo.apply_decision("appt-1", 0, &decision);
    assert!(matches!(
        result,
        Err(RepositoryError::OptimisticLockFailure { expected: 0, actual: 1, .. })
    ));

    // 预约仍为待审批, 败者重读后可重试
    let appointment = state.appointment_api.get_appointment("appt-1").unwrap();
    assert_eq!(appointment.approval_status, ApprovalStatus::Pending);

    let retry = state
        .appointment_repo
        .apply_decision("appt-1", appointment.version, &decision);
    assert!(retry.is_ok());
}

// ==========================================
// 测试2: 并发裁决单胜者
// ==========================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_decisions_single_winner() {
    let (_temp_file, state) = setup_state();
    seed_pending_appointment(&state, "appt-1", "svc-oil", 300.0, 2);
    let state = Arc::new(state);

    // 10 个管理员同时裁决同一预约 (批准/拒绝混合)
    let task_count = 10;
    let mut handles = Vec::new();

    for i in 0..task_count {
        let state = state.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                state
                    .appointment_api
                    .approve("appt-1", &format!("管理员{}批准", i), false, &format!("admin-{}", i))
                    .await
                    .map(|_| ())
            } else {
                state
                    .appointment_api
                    .decline(
                        "appt-1",
                        &format!("管理员{}拒绝", i),
                        None,
                        false,
                        &format!("admin-{}", i),
                    )
                    .await
                    .map(|_| ())
            }
        }));
    }

    let mut success_count = 0;
    let mut conflict_count = 0;

    for result in join_all(handles).await {
        match result.unwrap() {
            Ok(()) => success_count += 1,
            Err(ApiError::Conflict(_)) => conflict_count += 1,
            Err(other) => panic!("并发裁决只应产生成功或冲突, 实际: {}", other),
        }
    }

    // 恰好一个胜者, 其余全部显式冲突
    assert_eq!(success_count, 1, "应该只有1个任务裁决成功");
    assert_eq!(conflict_count, task_count - 1, "其余任务应得到显式冲突");

    // 终态只记录一次裁决日志
    let logs = state.action_log_repo.list_by_appointment("appt-1").unwrap();
    assert_eq!(logs.len(), 1);
}

// ==========================================
// 测试3: 并发创建工单号唯一
// ==========================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_work_order_numbers_unique() {
    let (_temp_file, state) = setup_state();
    seed_catalog_item(
        &state,
        "svc-brake",
        "刹车片更换",
        Some(120.0),
        &[("brake-pad", 2)],
    );
    seed_inventory(&state, "brake-pad", "刹车片", 100);

    // 8 条互不相同的已批准预约
    let appointment_count = 8;
    for i in 0..appointment_count {
        let id = format!("appt-{}", i);
        seed_pending_appointment(&state, &id, "svc-brake", 500.0, 1);
        state
            .appointment_api
            .approve(&id, "同意施工", false, "admin-1")
            .await
            .unwrap();
    }

    let state = Arc::new(state);
    let mut handles = Vec::new();

    for i in 0..appointment_count {
        let state = state.clone();
        handles.push(tokio::spawn(async move {
            state
                .work_order_api
                .create_from_appointment(&format!("appt-{}", i), "admin-1")
                .await
        }));
    }

    let mut numbers = Vec::new();
    for result in join_all(handles).await {
        let creation = result.unwrap().expect("不同预约的并发创建应全部成功");
        numbers.push(creation.work_order.work_order_number);
    }

    // 工单号全部唯一, 且恰为连续序列 (原子自增, 无跳号无重号)
    let unique: HashSet<&String> = numbers.iter().collect();
    assert_eq!(unique.len(), appointment_count);

    let expected: HashSet<String> = (1..=appointment_count)
        .map(|n| format!("WO-{:06}", n))
        .collect();
    let actual: HashSet<String> = numbers.iter().cloned().collect();
    assert_eq!(actual, expected);
}

// ==========================================
// 测试4: 同一预约的并发创建恰得一单
// ==========================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_same_appointment_exactly_one() {
    let (_temp_file, state) = setup_state();
    seed_catalog_item(
        &state,
        "svc-brake",
        "刹车片更换",
        Some(120.0),
        &[("brake-pad", 2)],
    );
    seed_inventory(&state, "brake-pad", "刹车片", 100);
    seed_pending_appointment(&state, "appt-1", "svc-brake", 500.0, 1);
    state
        .appointment_api
        .approve("appt-1", "同意施工", false, "admin-1")
        .await
        .unwrap();

    let state = Arc::new(state);
    let mut handles = Vec::new();

    for _ in 0..6 {
        let state = state.clone();
        handles.push(tokio::spawn(async move {
            state
                .work_order_api
                .create_from_appointment("appt-1", "admin-1")
                .await
        }));
    }

    let mut success_count = 0;
    let mut duplicate_count = 0;

    for result in join_all(handles).await {
        match result.unwrap() {
            Ok(_) => success_count += 1,
            Err(ApiError::WorkOrderAlreadyExists { .. }) => duplicate_count += 1,
            Err(other) => panic!("同预约并发创建只应成功或已存在, 实际: {}", other),
        }
    }

    assert_eq!(success_count, 1, "唯一约束应只放行一次创建");
    assert_eq!(duplicate_count, 5);
    assert_eq!(state.work_order_repo.count_all().unwrap(), 1);
}
