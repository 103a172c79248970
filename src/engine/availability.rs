// ==========================================
// 汽车维修门店管理系统 - 备件可用性查询
// ==========================================
// 职责: 定义备件库存查询 trait, 实现依赖倒置
// 说明: Engine 层定义 trait, 默认实现读本地库存表;
//       真实部署可替换为远程库存服务适配器
// 红线: 查询服务不可达不是致命错误, 调用方走降级路径
// ==========================================

use crate::domain::work_order::{MissingPart, PartRequirement, PartsAvailability};
use crate::repository::parts_inventory_repo::PartsInventoryRepository;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

// ==========================================
// AvailabilityError - 库存查询错误
// ==========================================
#[derive(Error, Debug)]
pub enum AvailabilityError {
    #[error("备件库存服务不可达: {0}")]
    ServiceUnreachable(String),

    #[error("备件库存查询失败: {0}")]
    QueryFailed(String),
}

// ==========================================
// PartsAvailabilityChecker - 备件可用性查询接口
// ==========================================
/// 备件可用性查询服务
///
/// 对本系统只读; 输入为服务目录解析出的备件需求清单,
/// 输出为可用性快照 (缺件明细含缺口数量, 不是需求总量)
#[async_trait]
pub trait PartsAvailabilityChecker: Send + Sync {
    /// 查询备件可用性
    ///
    /// # 参数
    /// - parts: 备件需求清单 ({sku, quantity})
    ///
    /// # 返回
    /// - Ok(PartsAvailability): 可用性快照
    /// - Err(AvailabilityError): 查询服务异常 (调用方降级处理)
    async fn check_availability(
        &self,
        parts: &[PartRequirement],
    ) -> Result<PartsAvailability, AvailabilityError>;
}

// ==========================================
// InventoryPartsChecker - 本地库存表实现
// ==========================================
pub struct InventoryPartsChecker {
    inventory_repo: Arc<PartsInventoryRepository>,
}

impl InventoryPartsChecker {
    /// 创建新的InventoryPartsChecker实例
    pub fn new(inventory_repo: Arc<PartsInventoryRepository>) -> Self {
        Self { inventory_repo }
    }
}

#[async_trait]
impl PartsAvailabilityChecker for InventoryPartsChecker {
    async fn check_availability(
        &self,
        parts: &[PartRequirement],
    ) -> Result<PartsAvailability, AvailabilityError> {
        let mut missing = Vec::new();

        for requirement in parts {
            let stock = self
                .inventory_repo
                .find_by_sku(&requirement.sku)
                .map_err(|e| AvailabilityError::QueryFailed(e.to_string()))?;

            // 库存中无此 SKU 时按 0 库存计, 名称回退为 SKU
            let (name, in_stock) = match stock {
                Some(s) => (s.name, s.quantity_in_stock),
                None => (requirement.sku.clone(), 0),
            };

            let deficit = requirement.quantity - in_stock;
            if deficit > 0 {
                missing.push(MissingPart {
                    name,
                    quantity: deficit,
                });
            }
        }

        if missing.is_empty() {
            Ok(PartsAvailability::fully_available())
        } else {
            Ok(PartsAvailability::with_missing(missing))
        }
    }
}
