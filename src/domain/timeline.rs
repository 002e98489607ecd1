// ==========================================
// 车队维保工单系统 - 状态时间线领域模型
// ==========================================
// 职责: 状态时间段与完整时间线视图 (瞬态输出,不落库)
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::SlaState;
use crate::domain::vehicle::Vehicle;
use crate::domain::work_order::WorkOrder;

// ==========================================
// StatusSegment - 状态时间段
// ==========================================
// 不变量: duration_ms >= 0; 相邻段首尾相接 (无间隙无重叠)
// 注意: status 以字符串承载 (来自活动日志,日志即事实,不做枚举校验)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSegment {
    pub status: String,             // 该时间段内的状态
    pub start: DateTime<Utc>,       // 段起点
    pub end: DateTime<Utc>,         // 段终点
    pub duration_ms: i64,           // 持续时长 (毫秒)
}

impl StatusSegment {
    /// 构造时间段并计算时长
    ///
    /// end 早于 start 时钳制为零时长段,不产生负时长
    pub fn new(status: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let end = if end < start { start } else { end };
        Self {
            status: status.to_string(),
            start,
            end,
            duration_ms: (end - start).num_milliseconds(),
        }
    }
}

// ==========================================
// WorkOrderTimeline - 工单时间线视图
// ==========================================
// 用途: SLA 与报表可视化;每次调用现算,不缓存不落库
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrderTimeline {
    pub work_order: WorkOrder,            // 原始工单
    pub status_history: Vec<StatusSegment>, // 状态时间段序列
    pub total_duration_ms: i64,           // 各段时长之和
    pub current_status_duration_ms: i64,  // 最后一段 (当前状态) 时长
    pub sla_state: SlaState,              // SLA 状态
    pub sla_reason: String,               // SLA 判定原因
    pub vehicle: Option<Vehicle>,         // 关联车辆 (展示用)
}
