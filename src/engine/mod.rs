// ==========================================
// 车队维保工单系统 - 引擎层
// ==========================================
// 职责: 实现派单/时间线/SLA 业务规则,不拼 SQL
// 红线: Engine 不拼 SQL, 所有规则必须输出 reason
// 红线: 引擎不读环境时钟,当前时刻一律由调用方显式传入
// ==========================================

pub mod assignment;
pub mod assignment_core;
pub mod sla;
pub mod timeline;

// 重导出核心引擎
pub use assignment::{AssignmentContext, AssignmentEngine, CandidateScorer, WorkloadScorer};
pub use assignment_core::AssignmentCore;
pub use sla::SlaEngine;
pub use timeline::TimelineEngine;
