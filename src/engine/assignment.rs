// ==========================================
// 车队维保工单系统 - 派单引擎
// ==========================================
// 职责: 准入过滤 + 容量评分 + 稳定排序 + 决策输出
// 红线: 纯函数,不落库;落库 (含容量复核) 由仓储层事务完成
// ==========================================
// 算法: 单遍贪心,无回溯;排序键为在修工单数升序
// 平局策略: 稳定排序,在修数相同的技师保持输入相对顺序
// ==========================================

use std::collections::HashMap;

use tracing::instrument;

use crate::domain::assignment::{
    AssignmentCriteria, AssignmentDecision, CandidateScore, DecisionFactors,
};
use crate::domain::technician::{Technician, TechnicianAvailability};
use crate::domain::work_order::WorkOrder;
use crate::engine::AssignmentCore;

/// 无候选分支的固定 reason (前端/自动化依赖该文案,勿改)
pub const NO_CANDIDATE_REASON: &str = "No available technicians at this location";

// ==========================================
// CandidateScorer - 候选评分扩展点
// ==========================================
// 用途: 为未来的专长/历史表现加权预留接口
// 注意: 评分只影响 score 字段,排序键固定为在修工单数 (升序)
pub trait CandidateScorer: Send + Sync {
    /// 计算候选得分
    fn score(&self, candidate: &CandidateScore) -> f64;

    /// 评分器名称 (日志用)
    fn name(&self) -> &'static str;
}

/// 默认评分器: 空闲容量得分 (100 - 负载率)
pub struct WorkloadScorer;

impl CandidateScorer for WorkloadScorer {
    fn score(&self, candidate: &CandidateScore) -> f64 {
        candidate.workload_score
    }

    fn name(&self) -> &'static str {
        "workload"
    }
}

// ==========================================
// AssignmentContext - 派单上下文
// ==========================================
// 调用方负责把数据物化到内存后传入;引擎不做任何 I/O
pub struct AssignmentContext<'a> {
    pub work_order: &'a WorkOrder,
    pub available_technicians: &'a [Technician],
    pub technician_availability: &'a HashMap<String, TechnicianAvailability>,
    pub criteria: &'a AssignmentCriteria,
}

// ==========================================
// AssignmentEngine - 派单引擎
// ==========================================
pub struct AssignmentEngine {
    scorer: Box<dyn CandidateScorer>,
}

impl Default for AssignmentEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AssignmentEngine {
    /// 创建新的派单引擎 (默认空闲容量评分器)
    pub fn new() -> Self {
        Self {
            scorer: Box::new(WorkloadScorer),
        }
    }

    /// 使用自定义评分器创建派单引擎
    pub fn with_scorer(scorer: Box<dyn CandidateScorer>) -> Self {
        Self { scorer }
    }

    /// 为工单选择最优技师
    ///
    /// # 参数
    /// - ctx: 派单上下文 (工单 + 技师池 + 可用性快照 + 准则)
    ///
    /// # 返回
    /// 派单决策;无可派技师时 technician_id = None (正常返回,不是错误)
    #[instrument(skip(self, ctx), fields(work_order_id = %ctx.work_order.work_order_id, scorer = self.scorer.name()))]
    pub fn find_best_technician(&self, ctx: &AssignmentContext<'_>) -> AssignmentDecision {
        // ==========================================
        // 步骤1: 准入过滤
        // ==========================================
        let mut candidates: Vec<CandidateScore> = Vec::new();

        for technician in ctx.available_technicians {
            let snapshot = ctx
                .technician_availability
                .get(&technician.technician_id);

            let (eligible, reasons) = AssignmentCore::check_eligibility(
                technician,
                &ctx.work_order.location_id,
                snapshot,
                ctx.criteria.max_concurrent_orders,
            );

            if !eligible {
                tracing::debug!(
                    technician_id = %technician.technician_id,
                    reason = %reasons.join("; "),
                    "技师未通过准入过滤"
                );
                continue;
            }

            // 准入通过时快照必然存在
            let snapshot = match snapshot {
                Some(s) => s,
                None => continue,
            };

            let max_concurrent = AssignmentCore::effective_max_concurrent(
                snapshot.max_concurrent_orders,
                ctx.criteria.max_concurrent_orders,
            );

            candidates.push(CandidateScore {
                technician_id: technician.technician_id.clone(),
                technician_name: technician.name.clone(),
                location_match: true,
                current_workload: snapshot.active_work_orders_count,
                max_concurrent_orders: max_concurrent,
                utilization_pct: AssignmentCore::calculate_utilization(
                    snapshot.active_work_orders_count,
                    max_concurrent,
                ),
                workload_score: AssignmentCore::calculate_workload_score(
                    snapshot.active_work_orders_count,
                    max_concurrent,
                ),
                performance_score: snapshot.completion_rate,
            });
        }

        // ==========================================
        // 步骤2: 无候选分支 (终止性结果,引擎不重试)
        // ==========================================
        if candidates.is_empty() {
            tracing::info!(
                work_order_id = %ctx.work_order.work_order_id,
                location_id = %ctx.work_order.location_id,
                "无可派技师"
            );
            return AssignmentDecision {
                technician_id: None,
                technician_name: None,
                score: 0.0,
                decision_factors: DecisionFactors::no_candidates(NO_CANDIDATE_REASON),
                candidates: vec![],
            };
        }

        // ==========================================
        // 步骤3: 排序 — 在修工单数升序,稳定排序保持平局输入顺序
        // ==========================================
        candidates.sort_by_key(|c| c.current_workload);

        let alternatives_considered = candidates.len();
        let best = &candidates[0];
        let final_score = self.scorer.score(best);

        let reason = format!(
            "Selected {} at {}: lowest active workload ({} of {})",
            best.technician_name,
            ctx.work_order.location_id,
            best.current_workload,
            best.max_concurrent_orders
        );

        tracing::info!(
            work_order_id = %ctx.work_order.work_order_id,
            technician_id = %best.technician_id,
            score = final_score,
            alternatives = alternatives_considered,
            "派单决策完成"
        );

        // ==========================================
        // 步骤4: 决策输出 (含完整候选列表,供审计/展示)
        // ==========================================
        AssignmentDecision {
            technician_id: Some(best.technician_id.clone()),
            technician_name: Some(best.technician_name.clone()),
            score: final_score,
            decision_factors: DecisionFactors {
                location_match: true,
                current_workload: best.current_workload,
                availability_score: best.workload_score,
                final_score,
                reason,
                alternatives_considered,
            },
            candidates,
        }
    }
}
