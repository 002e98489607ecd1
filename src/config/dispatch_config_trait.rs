// ==========================================
// 车队维保工单系统 - 派单配置读取 Trait
// ==========================================
// 职责: 定义派单/SLA 模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

use crate::domain::assignment::AssignmentCriteria;

// ==========================================
// DispatchConfigReader Trait
// ==========================================
// 用途: 派单与 SLA 判定所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait DispatchConfigReader: Send + Sync {
    // ===== 派单准则 =====

    /// 获取默认派单准则
    ///
    /// # 返回
    /// - AssignmentCriteria: 站点匹配/负载排序等开关与并发上限兜底值
    ///
    /// # 默认值
    /// - match_location=true, match_specialization=false,
    ///   consider_workload=true, prefer_same_location=true,
    ///   max_concurrent_orders=5
    async fn get_default_assignment_criteria(
        &self,
    ) -> Result<AssignmentCriteria, Box<dyn Error>>;

    // ===== SLA 配置 =====

    /// 获取 SLA 即将到期阈值（小时）
    ///
    /// # 默认值
    /// - 4
    async fn get_sla_due_soon_hours(&self) -> Result<i64, Box<dyn Error>>;
}
