// ==========================================
// 车队维保工单系统 - Assignment Core 纯函数库
// ==========================================
// 职责: 提供负载率计算、容量得分、派单准入判定的纯逻辑
// 红线: 无状态、无副作用、无 I/O 操作
// ==========================================

use crate::domain::technician::{Technician, TechnicianAvailability};

// ==========================================
// AssignmentCore - 纯函数工具类
// ==========================================
pub struct AssignmentCore;

impl AssignmentCore {
    /// 计算技师负载率 (百分比)
    ///
    /// # 规则
    /// - utilization = active / max * 100
    /// - max <= 0 视为满负荷 (100),避免除零
    ///
    /// # 参数
    /// - active_count: 当前在修工单数
    /// - max_concurrent: 并发上限
    pub fn calculate_utilization(active_count: i32, max_concurrent: i32) -> f64 {
        if max_concurrent <= 0 {
            return 100.0;
        }
        f64::from(active_count) / f64::from(max_concurrent) * 100.0
    }

    /// 计算空闲容量得分
    ///
    /// # 规则
    /// - workload_score = max(0, 100 - utilization)
    /// - 得分越高,剩余容量越大
    pub fn calculate_workload_score(active_count: i32, max_concurrent: i32) -> f64 {
        (100.0 - Self::calculate_utilization(active_count, max_concurrent)).max(0.0)
    }

    /// 解析生效的并发上限
    ///
    /// # 规则
    /// - 技师自身上限 > 0 → 使用技师自身上限
    /// - 否则 → 使用准则兜底值
    pub fn effective_max_concurrent(technician_max: i32, fallback: i32) -> i32 {
        if technician_max > 0 {
            technician_max
        } else {
            fallback
        }
    }

    /// 派单准入判定
    ///
    /// # 规则 (全部满足才准入)
    /// 1. 存在可用性快照
    /// 2. is_available = true
    /// 3. active_count < max_concurrent (严格小于,等于即满)
    /// 4. 技师站点与工单站点精确一致 (无就近回退,无部分匹配)
    ///
    /// # 返回
    /// - (bool, Vec<String>): 是否准入 + 判定原因
    pub fn check_eligibility(
        technician: &Technician,
        work_order_location: &str,
        snapshot: Option<&TechnicianAvailability>,
        fallback_max_concurrent: i32,
    ) -> (bool, Vec<String>) {
        let mut reasons = Vec::new();

        // 规则 1: 快照缺失即不可派
        let snapshot = match snapshot {
            Some(s) => s,
            None => {
                reasons.push(format!(
                    "EXCLUDED: technician {} has no availability snapshot",
                    technician.technician_id
                ));
                return (false, reasons);
            }
        };

        // 规则 2: 可用性判定
        if !snapshot.is_available {
            reasons.push(format!(
                "EXCLUDED: technician {} not available",
                technician.technician_id
            ));
            return (false, reasons);
        }

        // 规则 3: 容量判定
        let max_concurrent = Self::effective_max_concurrent(
            snapshot.max_concurrent_orders,
            fallback_max_concurrent,
        );
        if snapshot.active_work_orders_count >= max_concurrent {
            reasons.push(format!(
                "EXCLUDED: technician {} at capacity ({}/{})",
                technician.technician_id, snapshot.active_work_orders_count, max_concurrent
            ));
            return (false, reasons);
        }

        // 规则 4: 站点精确匹配
        if technician.location_id != work_order_location {
            reasons.push(format!(
                "EXCLUDED: technician {} location mismatch ({} != {})",
                technician.technician_id, technician.location_id, work_order_location
            ));
            return (false, reasons);
        }

        reasons.push(format!(
            "ELIGIBLE: technician {} at {} with {}/{} active orders",
            technician.technician_id,
            technician.location_id,
            snapshot.active_work_orders_count,
            max_concurrent
        ));
        (true, reasons)
    }
}
