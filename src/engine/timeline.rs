// ==========================================
// 车队维保工单系统 - 时间线重建引擎
// ==========================================
// 职责: 回放活动日志,重建工单在各状态的停留时间段
// 红线: 确定性 — 相同 (工单, 车辆, current_time) 输入必得相同输出
// 红线: 不读环境时钟,current_time 由调用方显式传入
// ==========================================
// 容错策略: 日志即事实 — 乱序条目先排序,非状态条目忽略,
//           from/to 链条不一致不做校验,负时长钳制为零,不抛错
// ==========================================

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::domain::timeline::{StatusSegment, WorkOrderTimeline};
use crate::domain::types::WorkOrderStatus;
use crate::domain::vehicle::Vehicle;
use crate::domain::work_order::{ActivityEntry, WorkOrder};
use crate::engine::SlaEngine;

// ==========================================
// TimelineEngine - 时间线重建引擎
// ==========================================
pub struct TimelineEngine;

impl Default for TimelineEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelineEngine {
    /// 创建新的时间线重建引擎
    pub fn new() -> Self {
        Self
    }

    /// 重建工单的状态时间段序列
    ///
    /// # 算法
    /// 1. 时钟漂移钳制: created_at 晚于 current_time 时取 current_time
    /// 2. 日志按时间戳升序规整 (存储顺序不可信)
    /// 3. 起始状态 = 首条状态变更的 from;无状态变更时回退为当前 status
    /// 4. 逐条状态变更关段/开段;非状态条目不产生段边界
    /// 5. 末段收口: Completed 且有 completed_at 时用 completed_at,否则 current_time
    ///
    /// # 返回
    /// 非空时间段序列,相邻段首尾相接,时长均非负
    #[instrument(skip(self, work_order), fields(work_order_id = %work_order.work_order_id))]
    pub fn parse_status_history(
        &self,
        work_order: &WorkOrder,
        current_time: DateTime<Utc>,
    ) -> Vec<StatusSegment> {
        // === 步骤 1: 时钟漂移钳制 ===
        let effective_created_at = work_order.created_at.min(current_time);

        // === 步骤 2: 日志规整 ===
        let mut entries: Vec<&ActivityEntry> = work_order.activity_log.iter().collect();
        entries.sort_by_key(|e| e.timestamp);

        // === 步骤 3: 确定起始状态 ===
        // 首条状态变更的 from 即"创建时的状态";无变更历史时假定一直处于当前状态
        let mut current_status: String = entries
            .iter()
            .find_map(|e| e.kind.as_status_change())
            .map(|(from, _)| from.to_string())
            .unwrap_or_else(|| work_order.status.display_name().to_string());

        // === 步骤 4: 逐条状态变更分段 ===
        let mut segments: Vec<StatusSegment> = Vec::new();
        let mut boundary = effective_created_at;

        for entry in &entries {
            let (_, to) = match entry.kind.as_status_change() {
                Some(change) => change,
                None => continue, // 非状态条目不产生段边界
            };

            let segment = StatusSegment::new(&current_status, boundary, entry.timestamp);
            // 以钳制后的段终点作为下一段起点,保证首尾相接
            boundary = segment.end;
            segments.push(segment);
            current_status = to.to_string();
        }

        // === 步骤 5: 末段收口 ===
        let closing_time = match (work_order.status, work_order.completed_at) {
            (WorkOrderStatus::Completed, Some(completed_at)) => completed_at,
            // Cancelled 及所有未完结状态一律收口到 current_time
            _ => current_time,
        };
        segments.push(StatusSegment::new(&current_status, boundary, closing_time));

        segments
    }

    /// 构建单个工单的完整时间线视图
    ///
    /// # 参数
    /// - work_order: 工单 (含活动日志)
    /// - vehicles: 车辆索引 (vehicle_id → Vehicle),解析展示引用
    /// - sla_due_soon_hours: SLA 即将到期阈值 (小时)
    /// - current_time: 重建时刻
    pub fn build_timeline(
        &self,
        work_order: WorkOrder,
        vehicles: &HashMap<String, Vehicle>,
        sla_due_soon_hours: i64,
        current_time: DateTime<Utc>,
    ) -> WorkOrderTimeline {
        let status_history = self.parse_status_history(&work_order, current_time);

        let total_duration_ms = status_history.iter().map(|s| s.duration_ms).sum();
        let current_status_duration_ms = status_history
            .last()
            .map(|s| s.duration_ms)
            .unwrap_or(0);

        let (sla_state, sla_reason) =
            SlaEngine::new().evaluate(&work_order, current_time, sla_due_soon_hours);

        let vehicle = work_order
            .vehicle_id
            .as_ref()
            .and_then(|id| vehicles.get(id))
            .cloned();

        WorkOrderTimeline {
            work_order,
            status_history,
            total_duration_ms,
            current_status_duration_ms,
            sla_state,
            sla_reason,
            vehicle,
        }
    }

    /// 批量构建时间线视图 (页面渲染入口)
    pub fn build_timelines(
        &self,
        work_orders: Vec<WorkOrder>,
        vehicles: &HashMap<String, Vehicle>,
        sla_due_soon_hours: i64,
        current_time: DateTime<Utc>,
    ) -> Vec<WorkOrderTimeline> {
        work_orders
            .into_iter()
            .map(|wo| self.build_timeline(wo, vehicles, sla_due_soon_hours, current_time))
            .collect()
    }
}
