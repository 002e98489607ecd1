// ==========================================
// 车队维保工单系统 - 数据仓储层
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
// 例外: assign_technician_checked 在事务内复核容量 (超派竞态只能在数据库层拦截)
// ==========================================

pub mod activity_log_repo;
pub mod error;
pub mod technician_repo;
pub mod vehicle_repo;
pub mod work_order_repo;

// 重导出核心类型
pub use activity_log_repo::ActivityLogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use technician_repo::TechnicianRepository;
pub use vehicle_repo::VehicleRepository;
pub use work_order_repo::WorkOrderRepository;
