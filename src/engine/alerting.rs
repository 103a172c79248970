// ==========================================
// 汽车维修门店管理系统 - 告警派生引擎
// ==========================================
// 职责: 从待审批预约集合派生顾问性告警
// 输入: 待审批预约 + 当前时刻 + 告警阈值
// 输出: 按严重度排序的告警列表 (不落库, 每次轮询重算)
// 红线: 只读引擎, 绝不改写预约/工单状态;
//       驾驶舱的紧急审批计数必须与本引擎同一套规则, 禁止硬编码
// ==========================================

use crate::domain::alert::Alert;
use crate::domain::appointment::Appointment;
use crate::domain::types::{AlertType, ApprovalStatus, Priority};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use tracing::instrument;
use uuid::Uuid;

// ==========================================
// AlertThresholds - 告警阈值
// ==========================================
// 由调用方从 ConfigManager 读取后传入, 引擎保持纯函数
#[derive(Debug, Clone, Copy)]
pub struct AlertThresholds {
    pub urgent_cost_threshold: f64, // 紧急费用阈值 (元)
    pub urgent_age_hours: i64,      // 紧急积压阈值 (小时)
    pub backlog_high_threshold: i64, // 积压告警升高阈值 (单数)
}

// ==========================================
// AlertEngine - 告警派生引擎
// ==========================================
pub struct AlertEngine {
    // 无状态引擎, 不需要注入依赖
    // 阈值由调用方读取配置后传入
}

impl AlertEngine {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 派生告警列表
    ///
    /// # 规则
    /// - 紧急规则: 任一待审批预约满足 (预估总价 > 费用阈值) 或
    ///   (积压时长 > 小时阈值) 时, 发出一条聚合紧急告警
    /// - 时段规则: 预约时段在未来 24 小时内仍未审批的, 逐单发出
    ///   DEADLINE 告警
    /// - 积压规则: 待审批数 > 0 时发出一条积压告警,
    ///   数量超过升高阈值时优先级为 HIGH, 否则 MEDIUM
    ///
    /// # 返回
    /// 按严重度排序 (优先级降序) 的告警列表
    #[instrument(skip(self, pending), fields(pending_count = pending.len()))]
    pub fn compute_alerts(
        &self,
        pending: &[Appointment],
        now: DateTime<Utc>,
        thresholds: &AlertThresholds,
    ) -> Vec<Alert> {
        // 防御: 只统计真正待审批的记录
        let pending: Vec<&Appointment> = pending
            .iter()
            .filter(|a| a.approval_status == ApprovalStatus::Pending)
            .collect();

        let mut alerts = Vec::new();

        // 1. 紧急规则 (聚合)
        let urgent_count = pending
            .iter()
            .filter(|a| Self::is_urgent(a, now, thresholds))
            .count();

        if urgent_count > 0 {
            alerts.push(Alert {
                alert_id: Uuid::new_v4().to_string(),
                alert_type: AlertType::Urgent,
                title: "紧急审批提醒".to_string(),
                message: format!(
                    "{} 个待审批预约满足紧急条件 (预估总价 > {:.0} 元 或 等待超过 {} 小时)",
                    urgent_count, thresholds.urgent_cost_threshold, thresholds.urgent_age_hours
                ),
                priority: Priority::Urgent,
                timestamp: now,
                action_url: Some("/admin/appointments?filter=pending-approval".to_string()),
                dismissed: false,
            });
        }

        // 2. 时段规则 (逐单)
        for appointment in &pending {
            if Self::slot_within_24h(appointment, now) {
                alerts.push(Alert {
                    alert_id: Uuid::new_v4().to_string(),
                    alert_type: AlertType::Deadline,
                    title: "临近预约时段".to_string(),
                    message: format!(
                        "预约 {} 的服务时段 {} {} 即将到达, 仍未完成审批",
                        appointment.appointment_id,
                        appointment.scheduled_date.format("%Y-%m-%d"),
                        appointment.scheduled_time.as_deref().unwrap_or("00:00"),
                    ),
                    priority: Priority::High,
                    timestamp: now,
                    action_url: Some(format!(
                        "/admin/appointments/{}",
                        appointment.appointment_id
                    )),
                    dismissed: false,
                });
            }
        }

        // 3. 积压规则
        let pending_count = pending.len() as i64;
        if pending_count > 0 {
            let priority = if pending_count > thresholds.backlog_high_threshold {
                Priority::High
            } else {
                Priority::Medium
            };

            alerts.push(Alert {
                alert_id: Uuid::new_v4().to_string(),
                alert_type: AlertType::Reminder,
                title: "待审批积压".to_string(),
                message: format!("当前有 {} 个预约等待审批", pending_count),
                priority,
                timestamp: now,
                action_url: Some("/admin/appointments?filter=pending-approval".to_string()),
                dismissed: false,
            });
        }

        // 严重度降序 (同优先级保持派生顺序)
        alerts.sort_by(|a, b| b.priority.cmp(&a.priority));
        alerts
    }

    /// 统计满足紧急条件的待审批预约数
    ///
    /// 驾驶舱统计与紧急告警共用本方法, 保证同一套阈值规则
    pub fn count_urgent(
        &self,
        pending: &[Appointment],
        now: DateTime<Utc>,
        thresholds: &AlertThresholds,
    ) -> usize {
        pending
            .iter()
            .filter(|a| a.approval_status == ApprovalStatus::Pending)
            .filter(|a| Self::is_urgent(a, now, thresholds))
            .count()
    }

    // ==========================================
    // 规则判定
    // ==========================================

    /// 紧急条件: 高价值 或 超龄
    fn is_urgent(appointment: &Appointment, now: DateTime<Utc>, thresholds: &AlertThresholds) -> bool {
        let high_value = appointment.estimated_cost.total > thresholds.urgent_cost_threshold;
        let overdue = now - appointment.created_at > Duration::hours(thresholds.urgent_age_hours);
        high_value || overdue
    }

    /// 预约时段是否落在未来 24 小时内 (含已过时段)
    fn slot_within_24h(appointment: &Appointment, now: DateTime<Utc>) -> bool {
        let time = appointment
            .scheduled_time
            .as_deref()
            .and_then(|s| NaiveTime::parse_from_str(s, "%H:%M").ok())
            .unwrap_or(NaiveTime::MIN);

        let slot = DateTime::from_naive_utc_and_offset(appointment.scheduled_date.and_time(time), Utc);
        slot - now <= Duration::hours(24)
    }
}

impl Default for AlertEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::appointment::EstimatedCost;

    fn thresholds() -> AlertThresholds {
        AlertThresholds {
            urgent_cost_threshold: 1000.0,
            urgent_age_hours: 24,
            backlog_high_threshold: 5,
        }
    }

    fn pending_appointment(
        id: &str,
        total: f64,
        age_hours: i64,
        now: DateTime<Utc>,
    ) -> Appointment {
        Appointment {
            appointment_id: id.to_string(),
            customer_id: "cust-1".to_string(),
            vehicle_id: "veh-1".to_string(),
            service_type_id: "svc-brake".to_string(),
            scheduled_date: (now + Duration::days(7)).date_naive(),
            scheduled_time: Some("09:30".to_string()),
            estimated_cost: EstimatedCost {
                subtotal: total * 0.9,
                total,
            },
            priority: Priority::Medium,
            approval_status: ApprovalStatus::Pending,
            approval_notes: None,
            decline_reason: None,
            assigned_follow_up_to: None,
            work_order_id: None,
            labor_rate_override: None,
            created_at: now - Duration::hours(age_hours),
            decided_at: None,
            version: 0,
        }
    }

    #[test]
    fn test_high_value_triggers_urgent() {
        let engine = AlertEngine::new();
        let now = Utc::now();
        // 1500 元 / 积压 2 小时: 仅费用条件即触发
        let pending = vec![pending_appointment("a-1", 1500.0, 2, now)];

        let alerts = engine.compute_alerts(&pending, now, &thresholds());
        assert!(alerts.iter().any(|a| a.alert_type == AlertType::Urgent));
    }

    #[test]
    fn test_overdue_triggers_urgent() {
        let engine = AlertEngine::new();
        let now = Utc::now();
        // 低价但积压 30 小时: 超龄条件触发
        let pending = vec![pending_appointment("a-1", 200.0, 30, now)];

        let alerts = engine.compute_alerts(&pending, now, &thresholds());
        assert!(alerts.iter().any(|a| a.alert_type == AlertType::Urgent));
    }

    #[test]
    fn test_quiet_backlog_has_no_urgent() {
        let engine = AlertEngine::new();
        let now = Utc::now();
        let pending = vec![pending_appointment("a-1", 200.0, 2, now)];

        let alerts = engine.compute_alerts(&pending, now, &thresholds());
        assert!(!alerts.iter().any(|a| a.alert_type == AlertType::Urgent));
        // 仍有积压提醒
        assert!(alerts.iter().any(|a| a.alert_type == AlertType::Reminder));
    }

    #[test]
    fn test_backlog_priority_escalates() {
        let engine = AlertEngine::new();
        let now = Utc::now();

        let small: Vec<Appointment> = (0..3)
            .map(|i| pending_appointment(&format!("a-{}", i), 200.0, 1, now))
            .collect();
        let alerts = engine.compute_alerts(&small, now, &thresholds());
        let backlog = alerts
            .iter()
            .find(|a| a.alert_type == AlertType::Reminder)
            .expect("应有积压告警");
        assert_eq!(backlog.priority, Priority::Medium);

        let large: Vec<Appointment> = (0..6)
            .map(|i| pending_appointment(&format!("a-{}", i), 200.0, 1, now))
            .collect();
        let alerts = engine.compute_alerts(&large, now, &thresholds());
        let backlog = alerts
            .iter()
            .find(|a| a.alert_type == AlertType::Reminder)
            .expect("应有积压告警");
        assert_eq!(backlog.priority, Priority::High);
    }

    #[test]
    fn test_empty_backlog_no_alerts() {
        let engine = AlertEngine::new();
        let now = Utc::now();
        let alerts = engine.compute_alerts(&[], now, &thresholds());
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_deadline_alert_for_imminent_slot() {
        let engine = AlertEngine::new();
        let now = Utc::now();
        let mut appointment = pending_appointment("a-1", 200.0, 2, now);
        appointment.scheduled_date = now.date_naive();
        appointment.scheduled_time =
            Some((now + Duration::hours(3)).format("%H:%M").to_string());

        let alerts = engine.compute_alerts(&[appointment], now, &thresholds());
        assert!(alerts.iter().any(|a| a.alert_type == AlertType::Deadline));
    }

    #[test]
    fn test_alerts_sorted_by_severity() {
        let engine = AlertEngine::new();
        let now = Utc::now();
        // 同时触发紧急 + 积压: 紧急在前
        let pending = vec![pending_appointment("a-1", 1500.0, 2, now)];

        let alerts = engine.compute_alerts(&pending, now, &thresholds());
        assert!(alerts.len() >= 2);
        assert_eq!(alerts[0].alert_type, AlertType::Urgent);
    }

    #[test]
    fn test_count_urgent_matches_alert_rule() {
        let engine = AlertEngine::new();
        let now = Utc::now();
        let pending = vec![
            pending_appointment("a-1", 1500.0, 2, now), // 高价值
            pending_appointment("a-2", 200.0, 30, now), // 超龄
            pending_appointment("a-3", 200.0, 2, now),  // 均不满足
        ];

        assert_eq!(engine.count_urgent(&pending, now, &thresholds()), 2);
    }
}
