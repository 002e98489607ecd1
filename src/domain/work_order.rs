// ==========================================
// 车队维保工单系统 - 工单领域模型
// ==========================================
// 职责: 工单实体与结构化活动日志模型
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::{Priority, WorkOrderStatus};

// ==========================================
// ActivityKind - 活动日志条目类型
// ==========================================
// 红线: 写入时即为结构化数据 (tagged JSON),时间线重建不做运行期文本匹配
// 兼容: 旧系统以自由文本记录状态变更,parse_legacy 负责迁移期解析
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityKind {
    /// 状态变更 (时间线重建的唯一分段依据)
    /// from/to 以字符串原样承载,不做枚举校验 (日志即事实)
    StatusChange { from: String, to: String },
    /// 派单记录
    Assignment { technician_id: String },
    /// 自由备注 (对时间线分段不产生影响)
    Note { text: String },
}

/// 旧系统状态变更文本的固定前缀
const LEGACY_STATUS_PREFIX: &str = "Status changed from '";
const LEGACY_STATUS_INFIX: &str = "' to '";

impl ActivityKind {
    /// 解析旧系统的自由文本日志条目
    ///
    /// # 规则
    /// - 匹配 `Status changed from '<Old>' to '<New>'...` → StatusChange
    /// - 其余文本一律视为 Note (不报错,不丢弃)
    ///
    /// # 参数
    /// - text: 旧系统 activity 自由文本
    pub fn parse_legacy(text: &str) -> Self {
        if let Some(rest) = text.strip_prefix(LEGACY_STATUS_PREFIX) {
            if let Some(infix_pos) = rest.find(LEGACY_STATUS_INFIX) {
                let from = &rest[..infix_pos];
                let tail = &rest[infix_pos + LEGACY_STATUS_INFIX.len()..];
                // 第二个捕获取到最后一个引号为止 (与旧系统贪婪匹配一致)
                if let Some(quote_pos) = tail.rfind('\'') {
                    let to = &tail[..quote_pos];
                    if !from.is_empty() && !to.is_empty() {
                        return ActivityKind::StatusChange {
                            from: from.to_string(),
                            to: to.to_string(),
                        };
                    }
                }
            }
        }

        ActivityKind::Note {
            text: text.to_string(),
        }
    }

    /// 若为状态变更条目则返回 (from, to)
    pub fn as_status_change(&self) -> Option<(&str, &str)> {
        match self {
            ActivityKind::StatusChange { from, to } => Some((from.as_str(), to.as_str())),
            _ => None,
        }
    }
}

// ==========================================
// ActivityEntry - 工单活动日志条目
// ==========================================
// 红线: 追加写入,不可修改
// 用途: 审计追踪,状态时间线重建
// 对齐: activity_log 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub entry_id: String,                // 条目ID (UUID)
    pub timestamp: DateTime<Utc>,        // 发生时间 (存储顺序不保证与时间顺序一致)
    pub actor: Option<String>,           // 操作人 (系统自动操作可为None)
    pub kind: ActivityKind,              // 结构化条目内容
}

impl ActivityEntry {
    /// 创建新的活动日志条目
    pub fn new(kind: ActivityKind, timestamp: DateTime<Utc>, actor: Option<String>) -> Self {
        Self {
            entry_id: uuid::Uuid::new_v4().to_string(),
            timestamp,
            actor,
            kind,
        }
    }

    /// 创建状态变更条目
    pub fn status_change(
        from: &str,
        to: &str,
        timestamp: DateTime<Utc>,
        actor: Option<String>,
    ) -> Self {
        Self::new(
            ActivityKind::StatusChange {
                from: from.to_string(),
                to: to.to_string(),
            },
            timestamp,
            actor,
        )
    }

    /// 创建派单条目
    pub fn assignment(technician_id: &str, timestamp: DateTime<Utc>, actor: Option<String>) -> Self {
        Self::new(
            ActivityKind::Assignment {
                technician_id: technician_id.to_string(),
            },
            timestamp,
            actor,
        )
    }
}

// ==========================================
// WorkOrder - 维保工单
// ==========================================
// 不变量: completed_at 有值 当且仅当 status == Completed
// 不变量: 任意时刻至多一个"当前"非终态状态
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrder {
    // ===== 标识 =====
    pub work_order_id: String,           // 工单ID
    pub title: String,                   // 工单标题

    // ===== 分类 =====
    pub status: WorkOrderStatus,         // 当前状态
    pub priority: Priority,              // 优先级

    // ===== 位置/派单 =====
    pub vehicle_id: Option<String>,      // 关联车辆
    pub location_id: String,             // 维修站点
    pub assigned_technician_id: Option<String>, // 已派技师 (未派单为合法状态)

    // ===== 时间 =====
    pub created_at: DateTime<Utc>,       // 创建时间
    pub sla_due: Option<DateTime<Utc>>,  // SLA 截止时间
    pub completed_at: Option<DateTime<Utc>>, // 完成时间 (仅 Completed 时有值)

    // ===== 历史 =====
    pub activity_log: Vec<ActivityEntry>, // 活动日志 (追加写入)
}

impl WorkOrder {
    /// 创建新工单 (初始状态 NEW,未派单)
    pub fn new(work_order_id: &str, title: &str, location_id: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            work_order_id: work_order_id.to_string(),
            title: title.to_string(),
            status: WorkOrderStatus::New,
            priority: Priority::Medium,
            vehicle_id: None,
            location_id: location_id.to_string(),
            assigned_technician_id: None,
            created_at,
            sla_due: None,
            completed_at: None,
            activity_log: vec![],
        }
    }

    /// 设置关联车辆
    pub fn with_vehicle(mut self, vehicle_id: &str) -> Self {
        self.vehicle_id = Some(vehicle_id.to_string());
        self
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// 设置 SLA 截止时间
    pub fn with_sla_due(mut self, sla_due: DateTime<Utc>) -> Self {
        self.sla_due = Some(sla_due);
        self
    }

    /// 是否终态工单
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// 本地更新状态并维护 completed_at 不变量
    ///
    /// 注意: 只改内存对象,不追加活动日志;落库与日志由仓储层在同一事务内完成
    pub fn apply_status(&mut self, new_status: WorkOrderStatus, at: DateTime<Utc>) {
        self.status = new_status;
        self.completed_at = if new_status == WorkOrderStatus::Completed {
            Some(at)
        } else {
            None
        };
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_legacy_status_change() {
        let kind = ActivityKind::parse_legacy("Status changed from 'New' to 'In Progress'.");
        assert_eq!(
            kind,
            ActivityKind::StatusChange {
                from: "New".to_string(),
                to: "In Progress".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_legacy_with_trailing_text() {
        let kind =
            ActivityKind::parse_legacy("Status changed from 'On Hold' to 'In Progress' by dispatcher");
        assert_eq!(
            kind,
            ActivityKind::StatusChange {
                from: "On Hold".to_string(),
                to: "In Progress".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_legacy_noise_becomes_note() {
        // 不匹配模式的文本按 Note 处理,不报错不丢弃
        let kind = ActivityKind::parse_legacy("Technician called the customer");
        assert_eq!(
            kind,
            ActivityKind::Note {
                text: "Technician called the customer".to_string(),
            }
        );

        // 残缺的状态变更文本同样按 Note 处理
        let kind = ActivityKind::parse_legacy("Status changed from 'New' to ");
        assert!(matches!(kind, ActivityKind::Note { .. }));
    }

    #[test]
    fn test_kind_json_roundtrip() {
        let kind = ActivityKind::StatusChange {
            from: "New".to_string(),
            to: "Assigned".to_string(),
        };
        let json = serde_json::to_string(&kind).unwrap();
        assert!(json.contains("\"type\":\"status_change\""));

        let back: ActivityKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, kind);
    }

    #[test]
    fn test_apply_status_completed_at_invariant() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let done = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let mut order = WorkOrder::new("wo1", "换机油", "L1", created);

        order.apply_status(WorkOrderStatus::Completed, done);
        assert_eq!(order.completed_at, Some(done));

        // 从终态改回非终态时清空 completed_at
        order.apply_status(WorkOrderStatus::InProgress, done);
        assert_eq!(order.completed_at, None);
    }
}
