// ==========================================
// 汽车维修门店管理系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型, 转换引擎/仓储错误为用户友好的错误消息
// 红线: 每类失败必须有可区分、可操作的提示
//       (未批准 / 服务类型无效 / 已有工单 三类前端分支各自成类)
// ==========================================

use crate::engine::approval::ApprovalError;
use crate::engine::work_order::SynthesisError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入与资源错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 并发与状态冲突
    // ==========================================
    /// 预约已被裁决或并发裁决冲突, 调用方应重读最新状态后再操作
    #[error("状态冲突: {0}")]
    Conflict(String),

    // ==========================================
    // 工单合成前置失败 (各自成类)
    // ==========================================
    #[error("预约尚未批准, 无法生成工单: {appointment_id} (当前状态: {status})")]
    NotApproved {
        appointment_id: String,
        status: String,
    },

    #[error("无效的服务类型: {service_type_id} 未在服务目录中注册")]
    InvalidServiceType { service_type_id: String },

    #[error("该预约已生成过工单: {appointment_id}")]
    WorkOrderAlreadyExists { appointment_id: String },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("内部错误: {0}")]
    InternalError(String),
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

// 审批错误 -> API错误
impl From<ApprovalError> for ApiError {
    fn from(err: ApprovalError) -> Self {
        match err {
            ApprovalError::EmptyNotes | ApprovalError::EmptyReason => {
                ApiError::InvalidInput(err.to_string())
            }
            ApprovalError::Repository(repo_err) => repo_err.into(),
        }
    }
}

// 工单合成错误 -> API错误
impl From<SynthesisError> for ApiError {
    fn from(err: SynthesisError) -> Self {
        match err {
            SynthesisError::NotFound { appointment_id } => {
                ApiError::NotFound(format!("预约不存在: {}", appointment_id))
            }
            SynthesisError::NotApproved {
                appointment_id,
                status,
            } => ApiError::NotApproved {
                appointment_id,
                status: status.to_string(),
            },
            SynthesisError::InvalidServiceType { service_type_id } => {
                ApiError::InvalidServiceType { service_type_id }
            }
            SynthesisError::AlreadyExists { appointment_id } => {
                ApiError::WorkOrderAlreadyExists { appointment_id }
            }
            SynthesisError::Repository(repo_err) => repo_err.into(),
        }
    }
}

// 仓储错误 -> API错误
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} 不存在: {}", entity, id))
            }
            RepositoryError::InvalidStateTransition { from, to } => ApiError::Conflict(format!(
                "预约已被裁决 (当前状态: {}), 无法再转换到 {}; 请刷新后查看最新状态",
                from, to
            )),
            RepositoryError::OptimisticLockFailure {
                appointment_id,
                expected,
                actual,
            } => ApiError::Conflict(format!(
                "并发修改冲突: 预约 {} 已被其他操作更新 (expected_version={}, actual_version={}); 请重读后重试",
                appointment_id, expected, actual
            )),
            RepositoryError::UniqueConstraintViolation(msg) => ApiError::Conflict(msg),
            RepositoryError::ValidationError(msg) => ApiError::InvalidInput(msg),
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}
