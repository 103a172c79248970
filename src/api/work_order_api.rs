// ==========================================
// 汽车维修门店管理系统 - 工单 API
// ==========================================
// 职责: 工单生成入口与工单查询
// 对应端点:
//   POST /work-orders/from-appointment/:appointmentId
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::work_order::{WorkOrder, WorkOrderCreation};
use crate::engine::work_order::WorkOrderSynthesizer;
use crate::repository::work_order_repo::WorkOrderRepository;

// ==========================================
// WorkOrderApi - 工单 API
// ==========================================

/// 工单API
///
/// 职责:
/// 1. 从已批准预约生成工单 (委托工单合成器)
/// 2. 工单查询
pub struct WorkOrderApi {
    synthesizer: Arc<WorkOrderSynthesizer>,
    work_order_repo: Arc<WorkOrderRepository>,
}

impl WorkOrderApi {
    /// 创建新的WorkOrderApi实例
    pub fn new(
        synthesizer: Arc<WorkOrderSynthesizer>,
        work_order_repo: Arc<WorkOrderRepository>,
    ) -> Self {
        Self {
            synthesizer,
            work_order_repo,
        }
    }

    /// 从已批准预约生成工单
    ///
    /// # 参数
    /// - appointment_id: 来源预约ID
    /// - actor: 操作人
    ///
    /// # 错误 (各自成类, 前端差异化提示)
    /// - `ApiError::NotApproved`: 预约尚未批准
    /// - `ApiError::InvalidServiceType`: 服务类型未在目录注册
    /// - `ApiError::WorkOrderAlreadyExists`: 该预约已有工单
    pub async fn create_from_appointment(
        &self,
        appointment_id: &str,
        actor: &str,
    ) -> ApiResult<WorkOrderCreation> {
        if appointment_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("预约ID不能为空".to_string()));
        }

        let creation = self
            .synthesizer
            .create_from_appointment(appointment_id, actor)
            .await?;
        Ok(creation)
    }

    /// 查询工单详情
    pub fn get_work_order(&self, work_order_id: &str) -> ApiResult<WorkOrder> {
        self.work_order_repo
            .find_by_id(work_order_id)?
            .ok_or_else(|| ApiError::NotFound(format!("工单不存在: {}", work_order_id)))
    }

    /// 按来源预约查询工单 (1:1)
    pub fn get_by_appointment(&self, appointment_id: &str) -> ApiResult<Option<WorkOrder>> {
        Ok(self.work_order_repo.find_by_appointment_id(appointment_id)?)
    }
}
