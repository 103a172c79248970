// ==========================================
// 汽车维修门店管理系统 - 排期策略
// ==========================================
// 职责: 计算工单预计开工日期 (可插拔策略)
// 说明: 默认策略为"今天 + 优先级提前期", 提前期走命名配置;
//       更精细的车间空闲时段搜索由排期域自行实现后替换
// ==========================================

use crate::config::ConfigManager;
use crate::domain::types::Priority;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::warn;

// ==========================================
// SchedulingPolicy - 排期策略接口
// ==========================================
pub trait SchedulingPolicy: Send + Sync {
    /// 计算最早可开工日期
    ///
    /// # 参数
    /// - today: 当前日期
    /// - priority: 工单优先级
    fn earliest_start(&self, today: NaiveDate, priority: Priority) -> NaiveDate;
}

// ==========================================
// LeadTimeSchedulingPolicy - 提前期排期策略
// ==========================================
pub struct LeadTimeSchedulingPolicy {
    config: Arc<ConfigManager>,
}

impl LeadTimeSchedulingPolicy {
    /// 创建新的LeadTimeSchedulingPolicy实例
    pub fn new(config: Arc<ConfigManager>) -> Self {
        Self { config }
    }
}

impl SchedulingPolicy for LeadTimeSchedulingPolicy {
    fn earliest_start(&self, today: NaiveDate, priority: Priority) -> NaiveDate {
        // 配置读取失败时降级为紧急提前期, 不阻断工单创建
        let lead_days = match self.config.get_start_lead_days(priority) {
            Ok(days) => days,
            Err(e) => {
                warn!(priority = %priority, "开工提前期配置读取失败, 使用降级值 1: {}", e);
                1
            }
        };

        today + chrono::Duration::days(lead_days)
    }
}
