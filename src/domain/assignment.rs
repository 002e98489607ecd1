// ==========================================
// 车队维保工单系统 - 派单决策领域模型
// ==========================================
// 红线: 决策对象为瞬态输出,不缓存不落库;所有决策必须输出 reason
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// AssignmentCriteria - 派单准则
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentCriteria {
    pub match_location: bool,       // 站点精确匹配
    pub match_specialization: bool, // 专长匹配 (类型保留,算法当前未使用)
    pub consider_workload: bool,    // 负载参与排序
    pub prefer_same_location: bool, // 同站点优先
    pub max_concurrent_orders: i32, // 并发上限兜底值 (技师自身上限优先)
}

impl Default for AssignmentCriteria {
    fn default() -> Self {
        Self {
            match_location: true,
            match_specialization: false,
            consider_workload: true,
            prefer_same_location: true,
            max_concurrent_orders: 5,
        }
    }
}

// ==========================================
// CandidateScore - 候选技师评分记录
// ==========================================
// 用途: 审计与前端展示,包含全部被考虑技师的逐项评分
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateScore {
    pub technician_id: String,      // 技师ID
    pub technician_name: String,    // 姓名
    pub location_match: bool,       // 站点是否匹配
    pub current_workload: i32,      // 当前在修工单数
    pub max_concurrent_orders: i32, // 并发上限
    pub utilization_pct: f64,       // 负载率 (0-100)
    pub workload_score: f64,        // 空闲容量得分 (100 - 负载率,下限0)
    pub performance_score: f64,     // 历史完成率 (随行携带,不参与排序)
}

// ==========================================
// DecisionFactors - 决策因子说明
// ==========================================
// 红线: 可解释性 — 无论选中与否都必须给出人类可读 reason
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionFactors {
    pub location_match: bool,         // 选中技师站点是否匹配 (空结果分支固定为 false)
    pub current_workload: i32,        // 选中技师当前在修工单数
    pub availability_score: f64,      // 空闲容量得分
    pub final_score: f64,             // 最终得分
    pub reason: String,               // 人类可读决策原因
    pub alternatives_considered: usize, // 通过准入过滤的候选总数
}

impl DecisionFactors {
    /// 创建空决策因子 (无候选分支)
    pub fn no_candidates(reason: &str) -> Self {
        Self {
            location_match: false,
            current_workload: 0,
            availability_score: 0.0,
            final_score: 0.0,
            reason: reason.to_string(),
            alternatives_considered: 0,
        }
    }
}

// ==========================================
// AssignmentDecision - 派单决策
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentDecision {
    pub technician_id: Option<String>,   // 选中技师 (None = 无可派技师)
    pub technician_name: Option<String>, // 选中技师姓名
    pub score: f64,                      // 选中技师得分
    pub decision_factors: DecisionFactors, // 决策因子说明
    pub candidates: Vec<CandidateScore>, // 排序后的完整候选列表
}

impl AssignmentDecision {
    /// 是否产生了有效派单
    pub fn is_assigned(&self) -> bool {
        self.technician_id.is_some()
    }

    /// 生成简短摘要文本 (日志/前端提示用)
    pub fn summary_text(&self) -> String {
        match (&self.technician_id, &self.technician_name) {
            (Some(id), Some(name)) => format!(
                "选中技师 {} ({}), 得分 {:.1}, 候选 {} 人",
                name, id, self.score, self.decision_factors.alternatives_considered
            ),
            _ => format!("无可派技师: {}", self.decision_factors.reason),
        }
    }
}
