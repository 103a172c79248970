// ==========================================
// 汽车维修门店管理系统 - 审批协调器
// ==========================================
// 职责: 预约审批状态机的唯一写入口
// 状态机: PENDING -> APPROVED / DECLINED / REQUIRES_FOLLOWUP
// 红线:
// - 裁决必须经 (id, version, 'PENDING') 三条件 CAS 落库,
//   并发裁决只有一个胜者, 败者显式拿到冲突错误
// - 裁决失败不产生任何写入 (调用方输入可原样重试)
// - 客户通知失败只记日志, 不回滚裁决
// ==========================================

use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::appointment::{Appointment, ApprovalDecision};
use crate::domain::types::ApprovalStatus;
use crate::engine::notification::CustomerNotifier;
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::appointment_repo::AppointmentRepository;
use crate::repository::error::RepositoryError;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

// ==========================================
// ApprovalError - 审批错误
// ==========================================
#[derive(Error, Debug)]
pub enum ApprovalError {
    #[error("审批备注不能为空")]
    EmptyNotes,

    #[error("拒绝原因不能为空")]
    EmptyReason,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type ApprovalResult<T> = Result<T, ApprovalError>;

// ==========================================
// ApprovalCoordinator - 审批协调器
// ==========================================
pub struct ApprovalCoordinator {
    appointment_repo: Arc<AppointmentRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    notifier: Arc<dyn CustomerNotifier>,
}

impl ApprovalCoordinator {
    /// 创建新的审批协调器
    ///
    /// # 参数
    /// - appointment_repo: 预约仓储
    /// - action_log_repo: 操作日志仓储
    /// - notifier: 客户通知器 (fire-and-forget)
    pub fn new(
        appointment_repo: Arc<AppointmentRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        notifier: Arc<dyn CustomerNotifier>,
    ) -> Self {
        Self {
            appointment_repo,
            action_log_repo,
            notifier,
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 批准预约
    ///
    /// # 参数
    /// - appointment_id: 预约ID
    /// - notes: 批准备注 (必填)
    /// - notify_customer: 是否通知客户
    /// - actor: 操作人
    ///
    /// # 错误
    /// - `ApprovalError::EmptyNotes`: 备注为空
    /// - `RepositoryError::NotFound`: 预约不存在
    /// - `RepositoryError::InvalidStateTransition`: 预约已被裁决
    /// - `RepositoryError::OptimisticLockFailure`: 并发裁决败者, 需重读后重试
    #[instrument(skip(self, notes), fields(appointment_id = %appointment_id))]
    pub async fn approve(
        &self,
        appointment_id: &str,
        notes: &str,
        notify_customer: bool,
        actor: &str,
    ) -> ApprovalResult<Appointment> {
        let notes = notes.trim();
        if notes.is_empty() {
            return Err(ApprovalError::EmptyNotes);
        }

        let appointment = self.load(appointment_id)?;

        let decision = ApprovalDecision {
            target_status: ApprovalStatus::Approved,
            approval_notes: Some(notes.to_string()),
            decline_reason: None,
            assigned_follow_up_to: None,
            decided_at: Utc::now(),
        };

        let updated =
            self.appointment_repo
                .apply_decision(appointment_id, appointment.version, &decision)?;

        self.record_action(
            appointment_id,
            ActionType::Approve,
            actor,
            json!({ "notes": notes, "notify_customer": notify_customer }),
        )?;

        info!(
            appointment_id = %appointment_id,
            actor = %actor,
            "预约已批准"
        );

        if notify_customer {
            if let Err(e) = self.notifier.notify_approval(appointment_id, notes).await {
                // 通知失败不回滚裁决
                warn!(appointment_id = %appointment_id, "批准通知发送失败: {}", e);
            }
        }

        Ok(updated)
    }

    /// 拒绝预约
    ///
    /// # 参数
    /// - appointment_id: 预约ID
    /// - reason: 拒绝原因 (必填)
    /// - assigned_to: 跟进人 (非空则转 REQUIRES_FOLLOWUP, 否则 DECLINED)
    /// - notify_customer: 是否通知客户
    /// - actor: 操作人
    #[instrument(skip(self, reason), fields(appointment_id = %appointment_id))]
    pub async fn decline(
        &self,
        appointment_id: &str,
        reason: &str,
        assigned_to: Option<&str>,
        notify_customer: bool,
        actor: &str,
    ) -> ApprovalResult<Appointment> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ApprovalError::EmptyReason);
        }

        let appointment = self.load(appointment_id)?;

        // 指定跟进人时进入 REQUIRES_FOLLOWUP, 否则终态 DECLINED
        let assignee = assigned_to
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let target_status = if assignee.is_some() {
            ApprovalStatus::RequiresFollowup
        } else {
            ApprovalStatus::Declined
        };

        let decision = ApprovalDecision {
            target_status,
            approval_notes: None,
            decline_reason: Some(reason.to_string()),
            assigned_follow_up_to: assignee.clone(),
            decided_at: Utc::now(),
        };

        let updated =
            self.appointment_repo
                .apply_decision(appointment_id, appointment.version, &decision)?;

        self.record_action(
            appointment_id,
            ActionType::Decline,
            actor,
            json!({
                "reason": reason,
                "assigned_to": assignee,
                "target_status": target_status.to_db_str(),
                "notify_customer": notify_customer,
            }),
        )?;

        info!(
            appointment_id = %appointment_id,
            target_status = %target_status,
            actor = %actor,
            "预约已拒绝"
        );

        if notify_customer {
            if let Err(e) = self.notifier.notify_decline(appointment_id, reason).await {
                // 通知失败不回滚裁决
                warn!(appointment_id = %appointment_id, "拒绝通知发送失败: {}", e);
            }
        }

        Ok(updated)
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    /// 读取预约 (不存在则显式 NotFound)
    fn load(&self, appointment_id: &str) -> ApprovalResult<Appointment> {
        self.appointment_repo
            .find_by_id(appointment_id)?
            .ok_or_else(|| {
                ApprovalError::Repository(RepositoryError::NotFound {
                    entity: "Appointment".to_string(),
                    id: appointment_id.to_string(),
                })
            })
    }

    /// 记录裁决日志
    fn record_action(
        &self,
        appointment_id: &str,
        action_type: ActionType,
        actor: &str,
        payload: serde_json::Value,
    ) -> ApprovalResult<()> {
        let log = ActionLog {
            action_id: Uuid::new_v4().to_string(),
            appointment_id: Some(appointment_id.to_string()),
            action_type,
            action_ts: Utc::now().naive_utc(),
            actor: actor.to_string(),
            payload_json: Some(payload),
            detail: None,
        };

        self.action_log_repo.insert(&log)?;
        Ok(())
    }
}
