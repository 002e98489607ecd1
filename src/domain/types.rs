// ==========================================
// 车队维保工单系统 - 领域类型定义
// ==========================================
// 职责: 状态/优先级/SLA 等共享枚举与转换
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 工单状态 (Work Order Status)
// ==========================================
// 生命周期: NEW → ASSIGNED → IN_PROGRESS → (ON_HOLD ↔ IN_PROGRESS) → COMPLETED/CANCELLED
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// 注意: 时间线段中的状态来自活动日志,以字符串原样承载,不强制映射到本枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkOrderStatus {
    New,        // 新建
    Assigned,   // 已派单
    InProgress, // 维修中
    OnHold,     // 挂起
    Completed,  // 已完成
    Cancelled,  // 已取消
}

impl fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl WorkOrderStatus {
    /// 是否终态 (终态工单不再计入技师在修数)
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkOrderStatus::Completed | WorkOrderStatus::Cancelled)
    }

    /// 人类可读名称 (历史活动日志中使用的形式,如 "In Progress")
    pub fn display_name(&self) -> &'static str {
        match self {
            WorkOrderStatus::New => "New",
            WorkOrderStatus::Assigned => "Assigned",
            WorkOrderStatus::InProgress => "In Progress",
            WorkOrderStatus::OnHold => "On Hold",
            WorkOrderStatus::Completed => "Completed",
            WorkOrderStatus::Cancelled => "Cancelled",
        }
    }

    /// 从字符串解析状态 (兼容数据库形式与人类可读形式)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().replace(' ', "_").as_str() {
            "NEW" => Some(WorkOrderStatus::New),
            "ASSIGNED" => Some(WorkOrderStatus::Assigned),
            "IN_PROGRESS" => Some(WorkOrderStatus::InProgress),
            "ON_HOLD" => Some(WorkOrderStatus::OnHold),
            "COMPLETED" => Some(WorkOrderStatus::Completed),
            "CANCELLED" => Some(WorkOrderStatus::Cancelled),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            WorkOrderStatus::New => "NEW",
            WorkOrderStatus::Assigned => "ASSIGNED",
            WorkOrderStatus::InProgress => "IN_PROGRESS",
            WorkOrderStatus::OnHold => "ON_HOLD",
            WorkOrderStatus::Completed => "COMPLETED",
            WorkOrderStatus::Cancelled => "CANCELLED",
        }
    }
}

// ==========================================
// 工单优先级 (Priority)
// ==========================================
// 顺序: Low < Medium < High < Critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,      // 低
    Medium,   // 中
    High,     // 高
    Critical, // 紧急
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl Priority {
    /// 从字符串解析优先级
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "LOW" => Priority::Low,
            "HIGH" => Priority::High,
            "CRITICAL" => Priority::Critical,
            _ => Priority::Medium, // 默认值
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Critical => "CRITICAL",
        }
    }
}

// ==========================================
// 技师状态 (Technician Status)
// ==========================================
// 注意: 派单准入看的是派生快照的 is_available,而不是直接看本枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TechnicianStatus {
    Available, // 可接单
    Busy,      // 忙碌
    Offline,   // 离线/下班
}

impl fmt::Display for TechnicianStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl TechnicianStatus {
    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "AVAILABLE" => TechnicianStatus::Available,
            "BUSY" => TechnicianStatus::Busy,
            "OFFLINE" => TechnicianStatus::Offline,
            _ => TechnicianStatus::Offline, // 未知状态按离线处理
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            TechnicianStatus::Available => "AVAILABLE",
            TechnicianStatus::Busy => "BUSY",
            TechnicianStatus::Offline => "OFFLINE",
        }
    }
}

// ==========================================
// SLA 状态 (SLA State)
// ==========================================
// 顺序: NoSla/OnTrack < DueSoon < Overdue; 终态工单为 Met/Breached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlaState {
    NoSla,   // 未设置 SLA
    OnTrack, // 正常
    DueSoon, // 即将到期
    Overdue, // 已超期 (未完结)
    Met,     // 按期完成
    Breached, // 超期完成
}

impl fmt::Display for SlaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlaState::NoSla => write!(f, "NO_SLA"),
            SlaState::OnTrack => write!(f, "ON_TRACK"),
            SlaState::DueSoon => write!(f, "DUE_SOON"),
            SlaState::Overdue => write!(f, "OVERDUE"),
            SlaState::Met => write!(f, "MET"),
            SlaState::Breached => write!(f, "BREACHED"),
        }
    }
}
