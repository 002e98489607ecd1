// ==========================================
// 车队维保工单系统 - 车辆仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
// ==========================================

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::vehicle::Vehicle;
use crate::repository::error::{RepositoryError, RepositoryResult};

// ==========================================
// VehicleRepository - 车辆仓储
// ==========================================
pub struct VehicleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl VehicleRepository {
    /// 创建新的车辆仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 行映射: vehicle → Vehicle
    fn map_row(row: &Row<'_>) -> rusqlite::Result<Vehicle> {
        Ok(Vehicle {
            vehicle_id: row.get(0)?,
            plate_no: row.get(1)?,
            model: row.get(2)?,
            location_id: row.get(3)?,
        })
    }

    /// 插入车辆
    pub fn insert(&self, vehicle: &Vehicle) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            "INSERT INTO vehicle (vehicle_id, plate_no, model, location_id) VALUES (?1, ?2, ?3, ?4)",
            params![
                vehicle.vehicle_id,
                vehicle.plate_no,
                vehicle.model,
                vehicle.location_id,
            ],
        )?;

        Ok(vehicle.vehicle_id.clone())
    }

    /// 按ID查询车辆
    pub fn find_by_id(&self, vehicle_id: &str) -> RepositoryResult<Option<Vehicle>> {
        let conn = self.get_conn()?;

        let vehicle = conn
            .query_row(
                "SELECT vehicle_id, plate_no, model, location_id FROM vehicle WHERE vehicle_id = ?1",
                params![vehicle_id],
                Self::map_row,
            )
            .optional()?;
        Ok(vehicle)
    }

    /// 查询全部车辆并建立索引 (vehicle_id → Vehicle)
    ///
    /// 用途: 时间线批量构建时的展示引用解析
    pub fn load_index(&self) -> RepositoryResult<HashMap<String, Vehicle>> {
        let conn = self.get_conn()?;

        let mut stmt =
            conn.prepare("SELECT vehicle_id, plate_no, model, location_id FROM vehicle")?;
        let index = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|v| (v.vehicle_id.clone(), v))
            .collect();

        Ok(index)
    }
}
