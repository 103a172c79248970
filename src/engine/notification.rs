// ==========================================
// 汽车维修门店管理系统 - 客户通知发布
// ==========================================
// 职责: 定义客户通知 trait, 实现依赖倒置
// 说明: Engine 层定义 trait, 传输通道 (短信/邮件) 由外部适配器实现
// 红线: 通知是 fire-and-forget, 发送失败只记日志, 绝不回滚审批裁决
// ==========================================

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

// ==========================================
// NotifyError - 通知发送错误
// ==========================================
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("客户通知发送失败: {0}")]
    SendFailed(String),
}

// ==========================================
// CustomerNotifier - 客户通知接口
// ==========================================
#[async_trait]
pub trait CustomerNotifier: Send + Sync {
    /// 通知客户预约已批准
    async fn notify_approval(&self, appointment_id: &str, notes: &str) -> Result<(), NotifyError>;

    /// 通知客户预约已拒绝
    async fn notify_decline(&self, appointment_id: &str, reason: &str) -> Result<(), NotifyError>;
}

// ==========================================
// LoggingNotifier - 日志通知实现
// ==========================================
// 用途: 默认实现与测试环境, 只记录不外发
pub struct LoggingNotifier;

#[async_trait]
impl CustomerNotifier for LoggingNotifier {
    async fn notify_approval(&self, appointment_id: &str, notes: &str) -> Result<(), NotifyError> {
        info!(
            appointment_id = %appointment_id,
            notes = %notes,
            "客户通知: 预约已批准"
        );
        Ok(())
    }

    async fn notify_decline(&self, appointment_id: &str, reason: &str) -> Result<(), NotifyError> {
        info!(
            appointment_id = %appointment_id,
            reason = %reason,
            "客户通知: 预约已拒绝"
        );
        Ok(())
    }
}
