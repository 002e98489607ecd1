// ==========================================
// 车队维保工单系统 - SLA 判定引擎
// ==========================================
// 职责: 判定工单相对 SLA 截止时间的状态
// 红线: 纯函数,now 由调用方显式传入;所有判定必须输出 reason
// ==========================================

use chrono::{DateTime, Duration, Utc};

use crate::domain::types::{SlaState, WorkOrderStatus};
use crate::domain::work_order::WorkOrder;

// ==========================================
// SlaEngine - SLA 判定引擎
// ==========================================
pub struct SlaEngine;

impl Default for SlaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SlaEngine {
    /// 创建新的 SLA 判定引擎
    pub fn new() -> Self {
        Self
    }

    /// 判定工单 SLA 状态
    ///
    /// # 规则
    /// 1. 未设置 sla_due → NO_SLA
    /// 2. Completed 且有 completed_at → 按完成时间判定 MET / BREACHED
    /// 3. 其余 (含 Cancelled 与未完结状态,按未完结处理):
    ///    - now > sla_due → OVERDUE
    ///    - sla_due - now <= due_soon_hours → DUE_SOON
    ///    - 否则 → ON_TRACK
    ///
    /// # 参数
    /// - work_order: 工单
    /// - now: 判定时刻
    /// - due_soon_hours: 即将到期阈值 (小时)
    ///
    /// # 返回
    /// - (SlaState, String): 状态 + 判定原因
    pub fn evaluate(
        &self,
        work_order: &WorkOrder,
        now: DateTime<Utc>,
        due_soon_hours: i64,
    ) -> (SlaState, String) {
        // 规则 1: 无 SLA
        let sla_due = match work_order.sla_due {
            Some(due) => due,
            None => return (SlaState::NoSla, "NO_SLA: sla_due not set".to_string()),
        };

        // 规则 2: 已完成工单按完成时间判定
        if work_order.status == WorkOrderStatus::Completed {
            if let Some(completed_at) = work_order.completed_at {
                return if completed_at <= sla_due {
                    (
                        SlaState::Met,
                        format!("MET: completed_at={} <= sla_due={}", completed_at, sla_due),
                    )
                } else {
                    let late = completed_at - sla_due;
                    (
                        SlaState::Breached,
                        format!("BREACHED: completed {} minutes late", late.num_minutes()),
                    )
                };
            }
        }

        // 规则 3: 未完结工单按当前时刻判定
        if now > sla_due {
            let overdue = now - sla_due;
            return (
                SlaState::Overdue,
                format!("OVERDUE: {} minutes past sla_due", overdue.num_minutes()),
            );
        }

        let remaining = sla_due - now;
        if remaining <= Duration::hours(due_soon_hours) {
            return (
                SlaState::DueSoon,
                format!("DUE_SOON: {} minutes remaining", remaining.num_minutes()),
            );
        }

        (
            SlaState::OnTrack,
            format!("ON_TRACK: {} hours remaining", remaining.num_hours()),
        )
    }
}
