// ==========================================
// 车队维保工单系统 - 技师领域模型
// ==========================================
// 结构: 主数据 (Technician) 与派生快照 (TechnicianAvailability) 分离
// ==========================================

use serde::{Deserialize, Serialize};

use crate::domain::types::TechnicianStatus;

// ==========================================
// Technician - 技师主数据
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Technician {
    pub technician_id: String,        // 技师ID
    pub name: String,                 // 姓名
    pub location_id: String,          // 所属站点
    pub specializations: Vec<String>, // 专长 (车型/工种),当前不参与派单排序
    pub status: TechnicianStatus,     // 状态
    pub max_concurrent_orders: i32,   // 并发工单上限
}

impl Technician {
    /// 创建新技师 (默认可接单,上限取调用方给定值)
    pub fn new(
        technician_id: &str,
        name: &str,
        location_id: &str,
        max_concurrent_orders: i32,
    ) -> Self {
        Self {
            technician_id: technician_id.to_string(),
            name: name.to_string(),
            location_id: location_id.to_string(),
            specializations: vec![],
            status: TechnicianStatus::Available,
            max_concurrent_orders,
        }
    }

    /// 设置专长列表
    pub fn with_specializations(mut self, specializations: Vec<String>) -> Self {
        self.specializations = specializations;
        self
    }

    /// 设置状态
    pub fn with_status(mut self, status: TechnicianStatus) -> Self {
        self.status = status;
        self
    }
}

// ==========================================
// TechnicianAvailability - 可用性派生快照
// ==========================================
// 红线: 派生数据,不落库;每次派单前由仓储层现算
// 注意: 快照在读取瞬间即可能过期,并发正确性由落库侧事务保证
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicianAvailability {
    pub technician_id: String,        // 技师ID
    pub is_available: bool,           // 是否可接单 (状态 + 班次综合判定)
    pub active_work_orders_count: i32, // 当前在修工单数 (非终态)
    pub max_concurrent_orders: i32,   // 并发上限
    pub on_shift: bool,               // 是否在班
    pub completion_rate: f64,         // 历史完成率 (0-100,当前不参与排序)
}

impl TechnicianAvailability {
    /// 是否还有剩余容量 (严格小于,等于上限视为已满)
    pub fn has_capacity(&self) -> bool {
        self.active_work_orders_count < self.max_concurrent_orders
    }
}
