// ==========================================
// 车队维保工单系统 - 技师仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
// 职责: 技师主数据 CRUD + 可用性派生快照现算
// ==========================================

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::technician::{Technician, TechnicianAvailability};
use crate::domain::types::TechnicianStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};

// ==========================================
// TechnicianRepository - 技师仓储
// ==========================================
pub struct TechnicianRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TechnicianRepository {
    /// 创建新的技师仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 行映射: technician → Technician
    ///
    /// 列顺序: technician_id, name, location_id, specializations_json, status, max_concurrent_orders
    fn map_row(row: &Row<'_>) -> rusqlite::Result<Technician> {
        let specializations_json: String = row.get(3)?;
        let status_str: String = row.get(4)?;

        Ok(Technician {
            technician_id: row.get(0)?,
            name: row.get(1)?,
            location_id: row.get(2)?,
            // 坏数据降级为空列表,专长当前不参与派单
            specializations: serde_json::from_str(&specializations_json).unwrap_or_default(),
            status: TechnicianStatus::from_str(&status_str),
            max_concurrent_orders: row.get(5)?,
        })
    }

    const SELECT_COLUMNS: &'static str =
        "technician_id, name, location_id, specializations_json, status, max_concurrent_orders";

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入技师
    pub fn insert(&self, technician: &Technician) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO technician (
                technician_id, name, location_id, specializations_json, status, max_concurrent_orders
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                technician.technician_id,
                technician.name,
                technician.location_id,
                serde_json::to_string(&technician.specializations)?,
                technician.status.to_db_str(),
                technician.max_concurrent_orders,
            ],
        )?;

        Ok(technician.technician_id.clone())
    }

    /// 更新技师状态
    pub fn update_status(
        &self,
        technician_id: &str,
        status: TechnicianStatus,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let rows = conn.execute(
            "UPDATE technician SET status = ?1 WHERE technician_id = ?2",
            params![status.to_db_str(), technician_id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Technician".to_string(),
                id: technician_id.to_string(),
            });
        }
        Ok(())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按ID查询技师
    pub fn find_by_id(&self, technician_id: &str) -> RepositoryResult<Technician> {
        let conn = self.get_conn()?;

        let sql = format!(
            "SELECT {} FROM technician WHERE technician_id = ?1",
            Self::SELECT_COLUMNS
        );
        conn.query_row(&sql, params![technician_id], Self::map_row)
            .optional()?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Technician".to_string(),
                id: technician_id.to_string(),
            })
    }

    /// 按站点查询技师列表 (ID 升序,保证派单平局顺序可复现)
    pub fn list_by_location(&self, location_id: &str) -> RepositoryResult<Vec<Technician>> {
        let conn = self.get_conn()?;

        let sql = format!(
            "SELECT {} FROM technician WHERE location_id = ?1 ORDER BY technician_id ASC",
            Self::SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let technicians = stmt
            .query_map(params![location_id], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(technicians)
    }

    // ==========================================
    // 派生快照
    // ==========================================

    /// 现算技师可用性快照
    ///
    /// # 口径
    /// - active_work_orders_count: 非终态在修工单数
    /// - completion_rate: 已完成 / 全部承接 * 100;无历史记为 100
    /// - on_shift: 状态非 OFFLINE (当前无独立排班表)
    /// - is_available: 状态为 AVAILABLE 且在班
    ///
    /// # 注意
    /// 快照在读取瞬间即可能过期;并发正确性由 assign_technician_checked 保证
    pub fn build_availability_snapshot(
        &self,
        technicians: &[Technician],
    ) -> RepositoryResult<HashMap<String, TechnicianAvailability>> {
        let conn = self.get_conn()?;
        let mut snapshots = HashMap::new();

        for technician in technicians {
            let active: i32 = conn.query_row(
                r#"
                SELECT COUNT(*) FROM work_order
                WHERE assigned_technician_id = ?1
                  AND status NOT IN ('COMPLETED', 'CANCELLED')
                "#,
                params![technician.technician_id],
                |row| row.get(0),
            )?;

            let (total, completed): (i32, i32) = conn.query_row(
                r#"
                SELECT COUNT(*),
                       COALESCE(SUM(CASE WHEN status = 'COMPLETED' THEN 1 ELSE 0 END), 0)
                FROM work_order
                WHERE assigned_technician_id = ?1
                "#,
                params![technician.technician_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            let completion_rate = if total > 0 {
                f64::from(completed) / f64::from(total) * 100.0
            } else {
                100.0
            };

            let on_shift = technician.status != TechnicianStatus::Offline;
            let is_available = technician.status == TechnicianStatus::Available && on_shift;

            snapshots.insert(
                technician.technician_id.clone(),
                TechnicianAvailability {
                    technician_id: technician.technician_id.clone(),
                    is_available,
                    active_work_orders_count: active,
                    max_concurrent_orders: technician.max_concurrent_orders,
                    on_shift,
                    completion_rate,
                },
            );
        }

        Ok(snapshots)
    }
}
