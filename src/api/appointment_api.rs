// ==========================================
// 汽车维修门店管理系统 - 预约审批 API
// ==========================================
// 职责: 待审批队列查询、审批裁决入口
// 对应端点:
//   GET  /appointments/pending-approval?page&limit
//   POST /appointments/:id/approve
//   POST /appointments/:id/decline
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::appointment::Appointment;
use crate::engine::approval::ApprovalCoordinator;
use crate::repository::appointment_repo::AppointmentRepository;

/// 单页返回记录数上限
const MAX_PAGE_LIMIT: i64 = 100;

// ==========================================
// PendingApprovalPage - 待审批分页结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingApprovalPage {
    pub items: Vec<Appointment>, // 本页记录 (按创建时间先入先出)
    pub total: i64,              // 待审批总数
    pub page: i64,               // 当前页码 (从 1 起)
    pub limit: i64,              // 每页记录数
}

// ==========================================
// AppointmentApi - 预约审批 API
// ==========================================

/// 预约审批API
///
/// 职责:
/// 1. 待审批队列分页查询
/// 2. 审批裁决 (批准/拒绝), 委托审批协调器
/// 3. 输入参数验证
pub struct AppointmentApi {
    appointment_repo: Arc<AppointmentRepository>,
    coordinator: Arc<ApprovalCoordinator>,
}

impl AppointmentApi {
    /// 创建新的AppointmentApi实例
    ///
    /// # 参数
    /// - appointment_repo: 预约仓储
    /// - coordinator: 审批协调器
    pub fn new(
        appointment_repo: Arc<AppointmentRepository>,
        coordinator: Arc<ApprovalCoordinator>,
    ) -> Self {
        Self {
            appointment_repo,
            coordinator,
        }
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 查询待审批预约 (分页)
    ///
    /// # 参数
    /// - page: 页码 (从 1 起)
    /// - limit: 每页记录数 (1..=100)
    ///
    /// # 返回
    /// - Ok(PendingApprovalPage): 分页结果
    /// - Err(ApiError): 参数无效或查询失败
    pub fn list_pending_approval(&self, page: i64, limit: i64) -> ApiResult<PendingApprovalPage> {
        // 参数验证
        if page < 1 {
            return Err(ApiError::InvalidInput("页码必须从 1 开始".to_string()));
        }
        if limit < 1 || limit > MAX_PAGE_LIMIT {
            return Err(ApiError::InvalidInput(format!(
                "每页记录数必须在 1..={} 之间",
                MAX_PAGE_LIMIT
            )));
        }

        let offset = (page - 1) * limit;
        let items = self.appointment_repo.list_pending(limit, offset)?;
        let total = self
            .appointment_repo
            .count_by_status(crate::domain::types::ApprovalStatus::Pending)?;

        debug!(page, limit, total, returned = items.len(), "待审批队列查询");

        Ok(PendingApprovalPage {
            items,
            total,
            page,
            limit,
        })
    }

    /// 查询预约详情
    pub fn get_appointment(&self, appointment_id: &str) -> ApiResult<Appointment> {
        self.appointment_repo
            .find_by_id(appointment_id)?
            .ok_or_else(|| ApiError::NotFound(format!("预约不存在: {}", appointment_id)))
    }

    // ==========================================
    // 裁决接口
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
    /// - `ApiError::InvalidInput`: 备注为空
    /// - `ApiError::NotFound`: 预约不存在
    /// - `ApiError::Conflict`: 预约已被裁决或并发冲突 (重读后重试)
    pub async fn approve(
        &self,
        appointment_id: &str,
        notes: &str,
        notify_customer: bool,
        actor: &str,
    ) -> ApiResult<Appointment> {
        let updated = self
            .coordinator
            .approve(appointment_id, notes, notify_customer, actor)
            .await?;
        Ok(updated)
    }

    /// 拒绝预约
    ///
    /// # 参数
    /// - appointment_id: 预约ID
    /// - reason: 拒绝原因 (必填)
    /// - assigned_to: 跟进人 (非空则转 REQUIRES_FOLLOWUP)
    /// - notify_customer: 是否通知客户
    /// - actor: 操作人
    pub async fn decline(
        &self,
        appointment_id: &str,
        reason: &str,
        assigned_to: Option<String>,
        notify_customer: bool,
        actor: &str,
    ) -> ApiResult<Appointment> {
        let updated = self
            .coordinator
            .decline(
                appointment_id,
                reason,
                assigned_to.as_deref(),
                notify_customer,
                actor,
            )
            .await?;
        Ok(updated)
    }
}
