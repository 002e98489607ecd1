// ==========================================
// 车队维保工单系统 - 时间线 API
// ==========================================
// 职责: 编排"读数 → 时间线重建 → SLA 判定"的查询用例
// 架构: API 层 → TimelineEngine (纯函数) + 仓储层
// 红线: current_time 显式传递;只有本层允许在 None 时读取真实时钟
// ==========================================

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::config::DispatchConfigReader;
use crate::domain::timeline::WorkOrderTimeline;
use crate::engine::TimelineEngine;
use crate::repository::vehicle_repo::VehicleRepository;
use crate::repository::work_order_repo::WorkOrderRepository;

// ==========================================
// TimelineApi - 时间线 API
// ==========================================
pub struct TimelineApi<C>
where
    C: DispatchConfigReader,
{
    work_order_repo: Arc<WorkOrderRepository>,
    vehicle_repo: Arc<VehicleRepository>,
    config: Arc<C>,
    engine: TimelineEngine,
}

impl<C> TimelineApi<C>
where
    C: DispatchConfigReader,
{
    /// 创建新的 TimelineApi 实例
    pub fn new(
        work_order_repo: Arc<WorkOrderRepository>,
        vehicle_repo: Arc<VehicleRepository>,
        config: Arc<C>,
    ) -> Self {
        Self {
            work_order_repo,
            vehicle_repo,
            config,
            engine: TimelineEngine::new(),
        }
    }

    /// 查询单个工单的状态时间线
    ///
    /// # 参数
    /// - work_order_id: 工单ID
    /// - current_time: 重建时刻 (None 时取当前时间;测试/回放场景应显式传入)
    pub async fn get_work_order_timeline(
        &self,
        work_order_id: &str,
        current_time: Option<DateTime<Utc>>,
    ) -> ApiResult<WorkOrderTimeline> {
        if work_order_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("工单ID不能为空".to_string()));
        }

        let current_time = current_time.unwrap_or_else(Utc::now);
        let work_order = self.work_order_repo.find_by_id(work_order_id)?;
        let vehicles = self.vehicle_repo.load_index()?;

        let due_soon_hours = self
            .config
            .get_sla_due_soon_hours()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        debug!(
            work_order_id = %work_order_id,
            log_entries = work_order.activity_log.len(),
            "开始重建时间线"
        );

        Ok(self
            .engine
            .build_timeline(work_order, &vehicles, due_soon_hours, current_time))
    }

    /// 按站点批量查询时间线 (报表/看板入口)
    pub async fn list_timelines_by_location(
        &self,
        location_id: &str,
        current_time: Option<DateTime<Utc>>,
    ) -> ApiResult<Vec<WorkOrderTimeline>> {
        if location_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("站点ID不能为空".to_string()));
        }

        let current_time = current_time.unwrap_or_else(Utc::now);
        let work_orders = self.work_order_repo.list_by_location(location_id)?;
        let vehicles = self.vehicle_repo.load_index()?;

        let due_soon_hours = self
            .config
            .get_sla_due_soon_hours()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        Ok(self
            .engine
            .build_timelines(work_orders, &vehicles, due_soon_hours, current_time))
    }
}
