// ==========================================
// 车队维保工单系统 - 领域层
// ==========================================
// 职责: 实体定义与领域类型,不含业务规则实现
// 红线: 领域层不依赖仓储层/引擎层
// ==========================================

pub mod assignment;
pub mod technician;
pub mod timeline;
pub mod types;
pub mod vehicle;
pub mod work_order;

// 重导出核心实体
pub use assignment::{
    AssignmentCriteria, AssignmentDecision, CandidateScore, DecisionFactors,
};
pub use technician::{Technician, TechnicianAvailability};
pub use timeline::{StatusSegment, WorkOrderTimeline};
pub use types::{Priority, SlaState, TechnicianStatus, WorkOrderStatus};
pub use vehicle::Vehicle;
pub use work_order::{ActivityEntry, ActivityKind, WorkOrder};
