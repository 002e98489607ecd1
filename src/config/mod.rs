// ==========================================
// 车队维保工单系统 - 配置层
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

pub mod config_manager;
pub mod dispatch_config_trait;

pub use config_manager::ConfigManager;
pub use dispatch_config_trait::DispatchConfigReader;
