// ==========================================
// 车队维保工单系统 - 车辆领域模型
// ==========================================
// 用途: 时间线视图中的展示引用,按 vehicle_id 解析
// ==========================================

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub vehicle_id: String,          // 车辆ID
    pub plate_no: String,            // 车牌号
    pub model: Option<String>,       // 车型
    pub location_id: Option<String>, // 常驻站点
}

impl Vehicle {
    pub fn new(vehicle_id: &str, plate_no: &str) -> Self {
        Self {
            vehicle_id: vehicle_id.to_string(),
            plate_no: plate_no.to_string(),
            model: None,
            location_id: None,
        }
    }
}
