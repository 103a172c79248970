// ==========================================
// 汽车维修门店管理系统 - 驾驶舱 API
// ==========================================
// 职责: 告警轮询与统计聚合查询
// 对应端点:
//   GET /appointments/alerts
//   GET /appointments/stats/overview
// 红线: 统计中的紧急审批计数与告警引擎共用同一套阈值规则,
//       禁止硬编码 0
// ==========================================

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::alert::Alert;
use crate::domain::types::{ApprovalStatus, WorkOrderStatus};
use crate::engine::alerting::{AlertEngine, AlertThresholds};
use crate::repository::appointment_repo::AppointmentRepository;
use crate::repository::work_order_repo::WorkOrderRepository;

// ==========================================
// StatsOverview - 审批/工单总览统计
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsOverview {
    // ===== 审批队列 =====
    pub pending_count: i64,           // 待审批
    pub approved_count: i64,          // 已批准
    pub declined_count: i64,          // 已拒绝
    pub requires_followup_count: i64, // 需跟进

    // ===== 紧急度 (与告警引擎同规则计算) =====
    pub urgent_approvals: i64, // 满足紧急条件的待审批数

    // ===== 价值 =====
    pub pending_total_value: f64, // 待审批预估总价值 (元)

    // ===== 工单 =====
    pub work_orders_total: i64,   // 工单总数
    pub work_orders_on_hold: i64, // 待备件
    pub work_orders_ready: i64,   // 可开工
}

// ==========================================
// DashboardApi - 驾驶舱 API
// ==========================================

/// 驾驶舱API
///
/// 职责:
/// 1. 告警轮询 (每次重算, 不落库)
/// 2. 审批/工单聚合统计
pub struct DashboardApi {
    appointment_repo: Arc<AppointmentRepository>,
    work_order_repo: Arc<WorkOrderRepository>,
    alert_engine: Arc<AlertEngine>,
    config: Arc<ConfigManager>,
}

impl DashboardApi {
    /// 创建新的DashboardApi实例
    pub fn new(
        appointment_repo: Arc<AppointmentRepository>,
        work_order_repo: Arc<WorkOrderRepository>,
        alert_engine: Arc<AlertEngine>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            appointment_repo,
            work_order_repo,
            alert_engine,
            config,
        }
    }

    // ==========================================
    // 告警接口
    // ==========================================

    /// 派生当前告警列表
    ///
    /// 每次调用基于当前待审批集合重算, 前端按轮询周期刷新;
    /// 一个轮询周期内的陈旧是可接受的, 不与写入方协调
    pub fn list_alerts(&self) -> ApiResult<Vec<Alert>> {
        let thresholds = self.load_thresholds()?;
        let pending = self.appointment_repo.list_pending_all()?;

        Ok(self
            .alert_engine
            .compute_alerts(&pending, Utc::now(), &thresholds))
    }

    // ==========================================
    // 统计接口
    // ==========================================

    /// 审批/工单总览统计
    ///
    /// 说明: urgent_approvals 由告警引擎按同一套阈值规则计算
    pub fn stats_overview(&self) -> ApiResult<StatsOverview> {
        let thresholds = self.load_thresholds()?;
        let pending = self.appointment_repo.list_pending_all()?;

        let urgent_approvals =
            self.alert_engine
                .count_urgent(&pending, Utc::now(), &thresholds) as i64;

        Ok(StatsOverview {
            pending_count: pending.len() as i64,
            approved_count: self
                .appointment_repo
                .count_by_status(ApprovalStatus::Approved)?,
            declined_count: self
                .appointment_repo
                .count_by_status(ApprovalStatus::Declined)?,
            requires_followup_count: self
                .appointment_repo
                .count_by_status(ApprovalStatus::RequiresFollowup)?,
            urgent_approvals,
            pending_total_value: self.appointment_repo.sum_pending_total()?,
            work_orders_total: self.work_order_repo.count_all()?,
            work_orders_on_hold: self.work_order_repo.count_by_status(WorkOrderStatus::OnHold)?,
            work_orders_ready: self
                .work_order_repo
                .count_by_status(WorkOrderStatus::ReadyToStart)?,
        })
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    /// 从配置读取告警阈值
    fn load_thresholds(&self) -> ApiResult<AlertThresholds> {
        Ok(AlertThresholds {
            urgent_cost_threshold: self
                .config
                .get_urgent_cost_threshold()
                .map_err(|e| ApiError::InternalError(e.to_string()))?,
            urgent_age_hours: self
                .config
                .get_urgent_age_hours()
                .map_err(|e| ApiError::InternalError(e.to_string()))?,
            backlog_high_threshold: self
                .config
                .get_backlog_high_threshold()
                .map_err(|e| ApiError::InternalError(e.to_string()))?,
        })
    }
}
