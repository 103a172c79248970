// ==========================================
// 汽车维修门店管理系统 - 工单合成器
// ==========================================
// 职责: 将已批准的预约合成为可排期、可计费的工单
// 输入: appointment (APPROVED) + 服务目录 + 备件可用性
// 输出: work_order (ON_HOLD / READY_TO_START) + 可用性快照
// 红线:
// - 前置失败各自成类: 未批准 / 服务类型无效 / 已有工单
// - 重复创建由唯一约束裁决, 不做应用层预检
// - 库存服务不可达走降级: 工单仍然生成 (ON_HOLD + 状态未知标记),
//   已批准的预约必须落下工单记录
// ==========================================

use crate::config::ConfigManager;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::types::{ApprovalStatus, WorkOrderStatus};
use crate::domain::work_order::{PartsAvailability, WorkOrder, WorkOrderCreation};
use crate::engine::availability::PartsAvailabilityChecker;
use crate::engine::scheduling::SchedulingPolicy;
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::appointment_repo::AppointmentRepository;
use crate::repository::catalog_repo::CatalogRepository;
use crate::repository::error::RepositoryError;
use crate::repository::work_order_repo::WorkOrderRepository;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

// ==========================================
// SynthesisError - 工单合成错误
// ==========================================
// 每个前置条件单独成类, 前端据此展示差异化提示
#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("预约未找到: {appointment_id}")]
    NotFound { appointment_id: String },

    #[error("预约尚未批准, 无法生成工单: appointment_id={appointment_id}, status={status}")]
    NotApproved {
        appointment_id: String,
        status: ApprovalStatus,
    },

    #[error("无效的服务类型: {service_type_id} 未在服务目录中注册")]
    InvalidServiceType { service_type_id: String },

    #[error("该预约已生成过工单: appointment_id={appointment_id}")]
    AlreadyExists { appointment_id: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type SynthesisResult<T> = Result<T, SynthesisError>;

// ==========================================
// 费率解析
// ==========================================

/// 工时费率解析链
///
/// 解析顺序 (先到先得):
/// 1. 服务目录费率
/// 2. 预约级协商费率
/// 3. 技师时薪
/// 4. 命名配置默认费率 (default_labor_rate)
pub fn resolve_labor_rate(
    catalog_rate: Option<f64>,
    appointment_override: Option<f64>,
    technician_rate: Option<f64>,
    default_rate: f64,
) -> f64 {
    catalog_rate
        .or(appointment_override)
        .or(technician_rate)
        .unwrap_or(default_rate)
}

// ==========================================
// WorkOrderSynthesizer - 工单合成器
// ==========================================
pub struct WorkOrderSynthesizer {
    appointment_repo: Arc<AppointmentRepository>,
    work_order_repo: Arc<WorkOrderRepository>,
    catalog_repo: Arc<CatalogRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    checker: Arc<dyn PartsAvailabilityChecker>,
    scheduling_policy: Arc<dyn SchedulingPolicy>,
    config: Arc<ConfigManager>,
}

impl WorkOrderSynthesizer {
    /// 创建新的工单合成器
    pub fn new(
        appointment_repo: Arc<AppointmentRepository>,
        work_order_repo: Arc<WorkOrderRepository>,
        catalog_repo: Arc<CatalogRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        checker: Arc<dyn PartsAvailabilityChecker>,
        scheduling_policy: Arc<dyn SchedulingPolicy>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            appointment_repo,
            work_order_repo,
            catalog_repo,
            action_log_repo,
            checker,
            scheduling_policy,
            config,
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 从已批准预约生成工单
    ///
    /// # 流程
    /// 1. 校验预约存在且已批准
    /// 2. 解析服务目录条目与备件需求
    /// 3. 查询备件可用性 (不可达则降级为状态未知)
    /// 4. 全部可用 -> READY_TO_START + 排期; 否则 ON_HOLD
    /// 5. 费率解析链固化计费快照
    /// 6. 原子分配工单号并落库 (唯一约束裁决重复创建)
    ///
    /// # 错误
    /// - `SynthesisError::NotFound` / `NotApproved` / `InvalidServiceType`
    /// - `SynthesisError::AlreadyExists`: 该预约已有工单 (幂等冲突)
    #[instrument(skip(self), fields(appointment_id = %appointment_id))]
    pub async fn create_from_appointment(
        &self,
        appointment_id: &str,
        actor: &str,
    ) -> SynthesisResult<WorkOrderCreation> {
        // 1. 前置校验: 预约存在且已批准
        let appointment = self
            .appointment_repo
            .find_by_id(appointment_id)?
            .ok_or_else(|| SynthesisError::NotFound {
                appointment_id: appointment_id.to_string(),
            })?;

        if appointment.approval_status != ApprovalStatus::Approved {
            return Err(SynthesisError::NotApproved {
                appointment_id: appointment_id.to_string(),
                status: appointment.approval_status,
            });
        }

        // 2. 解析服务目录
        let catalog_item = self
            .catalog_repo
            .find_by_id(&appointment.service_type_id)?
            .ok_or_else(|| SynthesisError::InvalidServiceType {
                service_type_id: appointment.service_type_id.clone(),
            })?;

        // 3. 备件可用性 (服务不可达走降级, 工单仍然生成)
        let availability = match self
            .checker
            .check_availability(&catalog_item.required_parts)
            .await
        {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(
                    appointment_id = %appointment_id,
                    "备件库存服务查询失败, 工单降级为库存状态未知: {}",
                    e
                );
                PartsAvailability::unknown()
            }
        };

        // 4. 播种工单状态与排期
        let (status, estimated_start_date) = if availability.all_available {
            let today = Utc::now().date_naive();
            (
                WorkOrderStatus::ReadyToStart,
                Some(
                    self.scheduling_policy
                        .earliest_start(today, appointment.priority),
                ),
            )
        } else {
            // 缺件或状态未知: 待备件, 不排期
            (WorkOrderStatus::OnHold, None)
        };

        // 5. 计费快照 (费率解析链)
        let default_rate = self
            .config
            .get_default_labor_rate()
            .map_err(|e| RepositoryError::InternalError(e.to_string()))?;

        let labor_rate = resolve_labor_rate(
            catalog_item.labor_rate,
            appointment.labor_rate_override,
            None, // 创建时刻尚未派工, 无技师时薪
            default_rate,
        );

        // 6. 落库 (工单号由仓储原子分配)
        let mut work_order = WorkOrder {
            work_order_id: Uuid::new_v4().to_string(),
            appointment_id: appointment_id.to_string(),
            work_order_number: String::new(), // 占位, 由仓储覆写
            status,
            priority: appointment.priority,
            service_name: catalog_item.name.clone(),
            labor_rate,
            estimated_duration_minutes: catalog_item.estimated_duration_minutes,
            estimated_start_date,
            parts_availability: availability.clone(),
            created_at: Utc::now(),
        };

        self.work_order_repo
            .create_with_next_number(&mut work_order)
            .map_err(|e| match e {
                // 唯一约束是"一预约一工单"的唯一事实来源
                RepositoryError::UniqueConstraintViolation(_) => SynthesisError::AlreadyExists {
                    appointment_id: appointment_id.to_string(),
                },
                other => SynthesisError::Repository(other),
            })?;

        self.record_action(appointment_id, actor, &work_order)?;

        info!(
            appointment_id = %appointment_id,
            work_order_number = %work_order.work_order_number,
            status = %work_order.status,
            "工单已生成"
        );

        Ok(WorkOrderCreation {
            work_order,
            parts_availability: availability,
        })
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    /// 记录工单创建日志
    fn record_action(
        &self,
        appointment_id: &str,
        actor: &str,
        work_order: &WorkOrder,
    ) -> SynthesisResult<()> {
        let log = ActionLog {
            action_id: Uuid::new_v4().to_string(),
            appointment_id: Some(appointment_id.to_string()),
            action_type: ActionType::CreateWorkOrder,
            action_ts: Utc::now().naive_utc(),
            actor: actor.to_string(),
            payload_json: Some(json!({
                "work_order_id": work_order.work_order_id,
                "work_order_number": work_order.work_order_number,
                "status": work_order.status.to_db_str(),
                "availability_unknown": work_order.parts_availability.availability_unknown,
            })),
            detail: None,
        };

        self.action_log_repo.insert(&log)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_labor_rate_order() {
        // 目录费率优先
        assert_eq!(
            resolve_labor_rate(Some(120.0), Some(90.0), Some(80.0), 100.0),
            120.0
        );
        // 目录缺失 -> 预约协商费率
        assert_eq!(resolve_labor_rate(None, Some(90.0), Some(80.0), 100.0), 90.0);
        // 目录/预约缺失 -> 技师时薪
        assert_eq!(resolve_labor_rate(None, None, Some(80.0), 100.0), 80.0);
        // 全部缺失 -> 命名配置默认值
        assert_eq!(resolve_labor_rate(None, None, None, 100.0), 100.0);
    }
}
