// ==========================================
// 车队维保工单系统 - 工单仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
// 例外: assign_technician_checked 在同一事务内复核技师容量
//       — 超派竞态 (两个并发派单把技师推过上限) 只能在数据库层拦截,
//         引擎侧快照读取瞬间即可能过期
// ==========================================

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::types::{Priority, WorkOrderStatus};
use crate::domain::work_order::{ActivityEntry, WorkOrder};
use crate::repository::activity_log_repo::ActivityLogRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};

// ==========================================
// WorkOrderRepository - 工单仓储
// ==========================================
pub struct WorkOrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WorkOrderRepository {
    /// 创建新的工单仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 行映射: work_order → WorkOrder (不含活动日志)
    ///
    /// 列顺序: work_order_id, title, vehicle_id, location_id, status, priority,
    ///         assigned_technician_id, created_at, sla_due, completed_at
    fn map_row(row: &Row<'_>) -> rusqlite::Result<WorkOrder> {
        let status_str: String = row.get(4)?;
        let priority_str: String = row.get(5)?;

        Ok(WorkOrder {
            work_order_id: row.get(0)?,
            title: row.get(1)?,
            vehicle_id: row.get(2)?,
            location_id: row.get(3)?,
            // 数据库中的未知状态按 NEW 兜底,避免读取崩溃
            status: WorkOrderStatus::from_str(&status_str).unwrap_or(WorkOrderStatus::New),
            priority: Priority::from_str(&priority_str),
            assigned_technician_id: row.get(6)?,
            created_at: row.get(7)?,
            sla_due: row.get(8)?,
            completed_at: row.get(9)?,
            activity_log: vec![],
        })
    }

    const SELECT_COLUMNS: &'static str = r#"
        work_order_id, title, vehicle_id, location_id, status, priority,
        assigned_technician_id, created_at, sla_due, completed_at
    "#;

    /// 在连接内加载工单活动日志
    fn load_activity_log(
        conn: &Connection,
        work_order_id: &str,
    ) -> RepositoryResult<Vec<ActivityEntry>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT entry_id, entry_ts, actor, kind_json
            FROM activity_log
            WHERE work_order_id = ?1
            ORDER BY entry_ts ASC, entry_id ASC
            "#,
        )?;

        let entries = stmt
            .query_map(params![work_order_id], ActivityLogRepository::map_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入工单 (含内嵌活动日志,单事务)
    pub fn insert(&self, order: &WorkOrder) -> RepositoryResult<String> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO work_order (
                work_order_id, title, vehicle_id, location_id, status, priority,
                assigned_technician_id, created_at, sla_due, completed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                order.work_order_id,
                order.title,
                order.vehicle_id,
                order.location_id,
                order.status.to_db_str(),
                order.priority.to_db_str(),
                order.assigned_technician_id,
                order.created_at,
                order.sla_due,
                order.completed_at,
            ],
        )?;

        for entry in &order.activity_log {
            ActivityLogRepository::insert_in_conn(&tx, &order.work_order_id, entry)?;
        }

        tx.commit()?;
        Ok(order.work_order_id.clone())
    }

    /// 更新工单状态
    ///
    /// 同一事务内:
    /// 1. 追加结构化 StatusChange 日志条目 (from/to 用人类可读形式)
    /// 2. 更新 status,并维护 completed_at 不变量 (仅 Completed 有值)
    pub fn update_status(
        &self,
        work_order_id: &str,
        new_status: WorkOrderStatus,
        actor: Option<&str>,
        at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let old_status: String = tx
            .query_row(
                "SELECT status FROM work_order WHERE work_order_id = ?1",
                params![work_order_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "WorkOrder".to_string(),
                id: work_order_id.to_string(),
            })?;

        let old_status =
            WorkOrderStatus::from_str(&old_status).unwrap_or(WorkOrderStatus::New);

        let entry = ActivityEntry::status_change(
            old_status.display_name(),
            new_status.display_name(),
            at,
            actor.map(|s| s.to_string()),
        );
        ActivityLogRepository::insert_in_conn(&tx, work_order_id, &entry)?;

        let completed_at = if new_status == WorkOrderStatus::Completed {
            Some(at)
        } else {
            None
        };

        tx.execute(
            "UPDATE work_order SET status = ?1, completed_at = ?2 WHERE work_order_id = ?3",
            params![new_status.to_db_str(), completed_at, work_order_id],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// 带容量复核的派单落库
    ///
    /// 同一事务内:
    /// 1. 复核技师当前在修工单数 (非终态)
    /// 2. 达到/超过上限 → CapacityExceeded,整个事务回滚
    /// 3. 写入 assigned_technician_id 并追加 Assignment 日志条目
    ///
    /// # 参数
    /// - max_concurrent: 生效的并发上限 (技师自身上限或准则兜底值)
    pub fn assign_technician_checked(
        &self,
        work_order_id: &str,
        technician_id: &str,
        max_concurrent: i32,
        actor: Option<&str>,
        at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let exists: bool = tx
            .query_row(
                "SELECT 1 FROM work_order WHERE work_order_id = ?1",
                params![work_order_id],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        if !exists {
            return Err(RepositoryError::NotFound {
                entity: "WorkOrder".to_string(),
                id: work_order_id.to_string(),
            });
        }

        // 容量复核 — 引擎决策所依据的快照可能已过期,以事务内计数为准
        let active: i32 = tx.query_row(
            r#"
            SELECT COUNT(*) FROM work_order
            WHERE assigned_technician_id = ?1
              AND status NOT IN ('COMPLETED', 'CANCELLED')
              AND work_order_id != ?2
            "#,
            params![technician_id, work_order_id],
            |row| row.get(0),
        )?;

        if active >= max_concurrent {
            return Err(RepositoryError::CapacityExceeded {
                technician_id: technician_id.to_string(),
                active,
                max: max_concurrent,
            });
        }

        tx.execute(
            "UPDATE work_order SET assigned_technician_id = ?1 WHERE work_order_id = ?2",
            params![technician_id, work_order_id],
        )?;

        let entry =
            ActivityEntry::assignment(technician_id, at, actor.map(|s| s.to_string()));
        ActivityLogRepository::insert_in_conn(&tx, work_order_id, &entry)?;

        tx.commit()?;
        Ok(())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按ID查询工单 (含活动日志)
    pub fn find_by_id(&self, work_order_id: &str) -> RepositoryResult<WorkOrder> {
        let conn = self.get_conn()?;

        let sql = format!(
            "SELECT {} FROM work_order WHERE work_order_id = ?1",
            Self::SELECT_COLUMNS
        );
        let mut order = conn
            .query_row(&sql, params![work_order_id], Self::map_row)
            .optional()?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "WorkOrder".to_string(),
                id: work_order_id.to_string(),
            })?;

        order.activity_log = Self::load_activity_log(&conn, work_order_id)?;
        Ok(order)
    }

    /// 按站点查询工单列表 (含活动日志,创建时间升序)
    pub fn list_by_location(&self, location_id: &str) -> RepositoryResult<Vec<WorkOrder>> {
        let conn = self.get_conn()?;

        let sql = format!(
            "SELECT {} FROM work_order WHERE location_id = ?1 ORDER BY created_at ASC",
            Self::SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut orders = stmt
            .query_map(params![location_id], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;

        for order in &mut orders {
            order.activity_log = Self::load_activity_log(&conn, &order.work_order_id)?;
        }
        Ok(orders)
    }

    /// 查询未派单工单 (非终态且无技师)
    pub fn list_unassigned(&self) -> RepositoryResult<Vec<WorkOrder>> {
        let conn = self.get_conn()?;

        let sql = format!(
            r#"
            SELECT {} FROM work_order
            WHERE assigned_technician_id IS NULL
              AND status NOT IN ('COMPLETED', 'CANCELLED')
            ORDER BY created_at ASC
            "#,
            Self::SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let orders = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(orders)
    }

    /// 统计技师当前在修工单数 (非终态)
    pub fn count_active_for_technician(&self, technician_id: &str) -> RepositoryResult<i32> {
        let conn = self.get_conn()?;

        let count: i32 = conn.query_row(
            r#"
            SELECT COUNT(*) FROM work_order
            WHERE assigned_technician_id = ?1
              AND status NOT IN ('COMPLETED', 'CANCELLED')
            "#,
            params![technician_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::work_order::ActivityKind;
    use chrono::TimeZone;

    fn setup_test_db() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();

        conn.execute(
            "INSERT INTO technician (technician_id, name, location_id, max_concurrent_orders)
             VALUES ('t1', '张伟', 'L1', 2)",
            [],
        )
        .unwrap();

        Arc::new(Mutex::new(conn))
    }

    fn create_test_order(work_order_id: &str) -> WorkOrder {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        WorkOrder::new(work_order_id, "测试工单", "L1", created)
    }

    #[test]
    fn test_insert_and_find_roundtrip() {
        let repo = WorkOrderRepository::new(setup_test_db());
        let order = create_test_order("wo1");

        repo.insert(&order).unwrap();
        let loaded = repo.find_by_id("wo1").unwrap();

        assert_eq!(loaded.work_order_id, "wo1");
        assert_eq!(loaded.status, WorkOrderStatus::New);
        assert!(loaded.activity_log.is_empty());
    }

    #[test]
    fn test_find_missing_returns_not_found() {
        let repo = WorkOrderRepository::new(setup_test_db());
        let err = repo.find_by_id("missing").unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[test]
    fn test_update_status_appends_log_and_keeps_invariant() {
        let repo = WorkOrderRepository::new(setup_test_db());
        repo.insert(&create_test_order("wo1")).unwrap();

        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap();
        repo.update_status("wo1", WorkOrderStatus::InProgress, Some("tech"), t1)
            .unwrap();

        let t2 = Utc.with_ymd_and_hms(2024, 1, 1, 5, 0, 0).unwrap();
        repo.update_status("wo1", WorkOrderStatus::Completed, Some("tech"), t2)
            .unwrap();

        let order = repo.find_by_id("wo1").unwrap();
        assert_eq!(order.status, WorkOrderStatus::Completed);
        assert_eq!(order.completed_at, Some(t2));
        assert_eq!(order.activity_log.len(), 2);
        assert_eq!(
            order.activity_log[0].kind,
            ActivityKind::StatusChange {
                from: "New".to_string(),
                to: "In Progress".to_string(),
            }
        );
    }

    #[test]
    fn test_assign_checked_rejects_over_capacity() {
        let repo = WorkOrderRepository::new(setup_test_db());
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap();

        // 上限 2: 前两单派入成功
        for id in ["wo1", "wo2", "wo3"] {
            repo.insert(&create_test_order(id)).unwrap();
        }
        repo.assign_technician_checked("wo1", "t1", 2, None, at).unwrap();
        repo.assign_technician_checked("wo2", "t1", 2, None, at).unwrap();

        // 第三单触发容量冲突,事务回滚
        let err = repo
            .assign_technician_checked("wo3", "t1", 2, None, at)
            .unwrap_err();
        assert!(matches!(err, RepositoryError::CapacityExceeded { active: 2, max: 2, .. }));

        let wo3 = repo.find_by_id("wo3").unwrap();
        assert_eq!(wo3.assigned_technician_id, None);
        assert!(wo3.activity_log.is_empty());

        assert_eq!(repo.count_active_for_technician("t1").unwrap(), 2);
    }

    #[test]
    fn test_assign_checked_frees_capacity_after_completion() {
        let repo = WorkOrderRepository::new(setup_test_db());
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap();

        for id in ["wo1", "wo2", "wo3"] {
            repo.insert(&create_test_order(id)).unwrap();
        }
        repo.assign_technician_checked("wo1", "t1", 2, None, at).unwrap();
        repo.assign_technician_checked("wo2", "t1", 2, None, at).unwrap();

        // 完成一单后容量释放
        repo.update_status("wo1", WorkOrderStatus::Completed, None, at)
            .unwrap();
        repo.assign_technician_checked("wo3", "t1", 2, None, at).unwrap();

        assert_eq!(repo.count_active_for_technician("t1").unwrap(), 2);
    }
}
