// ==========================================
// 汽车维修门店管理系统 - 服务目录领域模型
// ==========================================
// 职责: 服务目录只读参考数据 (服务类型 -> 工时/费率/备件需求)
// 红线: 本系统对服务目录只读, 维护权在目录管理域
// 对齐: service_catalog 表
// ==========================================

use crate::domain::work_order::PartRequirement;
use serde::{Deserialize, Serialize};

// ==========================================
// ServiceCatalogItem - 服务目录条目
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCatalogItem {
    pub service_type_id: String,             // 服务类型标识 (主键)
    pub name: String,                        // 服务名称
    pub labor_rate: Option<f64>,             // 目录工时费率 (可空, 参与费率解析链)
    pub estimated_duration_minutes: i64,     // 预估工时 (分钟)
    pub required_parts: Vec<PartRequirement>, // 所需备件清单 (JSON 列)
}
