// ==========================================
// 车队维保工单系统 - 派单 API
// ==========================================
// 职责: 编排"读数 → 决策 → 落库"的派单用例
// 架构: API 层 → AssignmentEngine (纯函数) + WorkOrderRepository (事务落库)
// 红线: 引擎决策与落库分离;超派防线在落库事务内 (容量复核)
// ==========================================

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::api::error::{ApiError, ApiResult};
use crate::config::DispatchConfigReader;
use crate::domain::assignment::AssignmentDecision;
use crate::engine::{AssignmentContext, AssignmentEngine};
use crate::repository::technician_repo::TechnicianRepository;
use crate::repository::work_order_repo::WorkOrderRepository;

// ==========================================
// DispatchApi - 派单 API
// ==========================================
pub struct DispatchApi<C>
where
    C: DispatchConfigReader,
{
    work_order_repo: Arc<WorkOrderRepository>,
    technician_repo: Arc<TechnicianRepository>,
    config: Arc<C>,
    engine: AssignmentEngine,
}

impl<C> DispatchApi<C>
where
    C: DispatchConfigReader,
{
    /// 创建新的 DispatchApi 实例
    pub fn new(
        work_order_repo: Arc<WorkOrderRepository>,
        technician_repo: Arc<TechnicianRepository>,
        config: Arc<C>,
    ) -> Self {
        Self {
            work_order_repo,
            technician_repo,
            config,
            engine: AssignmentEngine::new(),
        }
    }

    /// 为工单推荐技师 (只读,不落库)
    ///
    /// # 参数
    /// - work_order_id: 工单ID
    ///
    /// # 返回
    /// - Ok(AssignmentDecision): 决策 (含完整候选列表);无可派技师时 technician_id=None
    /// - Err(ApiError): 工单不存在/已终态/数据访问失败
    pub async fn recommend_assignment(
        &self,
        work_order_id: &str,
    ) -> ApiResult<AssignmentDecision> {
        if work_order_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("工单ID不能为空".to_string()));
        }

        // ==========================================
        // 步骤1: 物化派单上下文
        // ==========================================
        let work_order = self.work_order_repo.find_by_id(work_order_id)?;

        if work_order.is_terminal() {
            return Err(ApiError::BusinessRuleViolation(format!(
                "终态工单不可派单: work_order_id={}, status={}",
                work_order_id, work_order.status
            )));
        }

        let technicians = self
            .technician_repo
            .list_by_location(&work_order.location_id)?;

        let availability = self
            .technician_repo
            .build_availability_snapshot(&technicians)?;

        let criteria = self
            .config
            .get_default_assignment_criteria()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        debug!(
            work_order_id = %work_order_id,
            location_id = %work_order.location_id,
            technicians_count = technicians.len(),
            "派单上下文物化完成"
        );

        // ==========================================
        // 步骤2: 引擎决策 (纯函数)
        // ==========================================
        let ctx = AssignmentContext {
            work_order: &work_order,
            available_technicians: &technicians,
            technician_availability: &availability,
            criteria: &criteria,
        };
        let decision = self.engine.find_best_technician(&ctx);

        info!(
            work_order_id = %work_order_id,
            summary = %decision.summary_text(),
            "派单推荐完成"
        );

        Ok(decision)
    }

    /// 派单并落库 (推荐 + 带容量复核的写入)
    ///
    /// # 参数
    /// - work_order_id: 工单ID
    /// - actor: 操作人 (自动化调用可为None)
    /// - at: 落库时刻 (None 时取当前时间 — 唯一允许读时钟的最外层入口)
    ///
    /// # 返回
    /// - Ok(decision): technician_id=None 表示无可派技师,未发生写入 (由调用方决定重试/升级)
    /// - Err(ApiError::CapacityConflict): 决策快照过期,落库时容量复核失败,未发生写入
    pub async fn assign_work_order(
        &self,
        work_order_id: &str,
        actor: Option<&str>,
        at: Option<DateTime<Utc>>,
    ) -> ApiResult<AssignmentDecision> {
        let decision = self.recommend_assignment(work_order_id).await?;

        // 无候选是终止性正常结果,不是错误
        let technician_id = match &decision.technician_id {
            Some(id) => id.clone(),
            None => return Ok(decision),
        };

        // 选中候选的生效上限 (候选列表首位即选中技师)
        let max_concurrent = decision
            .candidates
            .first()
            .map(|c| c.max_concurrent_orders)
            .unwrap_or_default();

        let at = at.unwrap_or_else(Utc::now);
        self.work_order_repo.assign_technician_checked(
            work_order_id,
            &technician_id,
            max_concurrent,
            actor,
            at,
        )?;

        info!(
            work_order_id = %work_order_id,
            technician_id = %technician_id,
            "派单落库完成"
        );

        Ok(decision)
    }
}
