// ==========================================
// 车队维保工单系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供前端/自动化调用
// 架构: API 层 → 引擎层 (纯函数) + 仓储层 (数据映射)
// ==========================================

pub mod dispatch_api;
pub mod error;
pub mod timeline_api;

// 重导出核心类型
pub use dispatch_api::DispatchApi;
pub use error::{ApiError, ApiResult};
pub use timeline_api::TimelineApi;
