// ==========================================
// 车队维保工单系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection};

use crate::config::dispatch_config_trait::DispatchConfigReader;
use crate::db::open_sqlite_connection;
use crate::domain::assignment::AssignmentCriteria;

// ===== 配置键 =====
const KEY_MATCH_LOCATION: &str = "assignment/match_location";
const KEY_MATCH_SPECIALIZATION: &str = "assignment/match_specialization";
const KEY_CONSIDER_WORKLOAD: &str = "assignment/consider_workload";
const KEY_PREFER_SAME_LOCATION: &str = "assignment/prefer_same_location";
const KEY_MAX_CONCURRENT_ORDERS: &str = "assignment/max_concurrent_orders";
const KEY_SLA_DUE_SOON_HOURS: &str = "sla/due_soon_hours";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 读取布尔配置 ("true"/"false",解析失败取默认值)
    fn get_bool_config(&self, key: &str, default: bool) -> Result<bool, Box<dyn Error>> {
        let raw = self.get_config_or_default(key, if default { "true" } else { "false" })?;
        Ok(raw.trim().eq_ignore_ascii_case("true"))
    }

    /// 写入 global scope 配置值 (INSERT OR REPLACE)
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT OR REPLACE INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有 global 配置的快照
    ///
    /// # 用途
    /// - 审计/问题定位时记录决策所依据的配置全集
    pub fn snapshot(&self) -> Result<HashMap<String, String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global'")?;
        let entries = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(entries)
    }
}

// ==========================================
// DispatchConfigReader 实现
// ==========================================
#[async_trait]
impl DispatchConfigReader for ConfigManager {
    async fn get_default_assignment_criteria(
        &self,
    ) -> Result<AssignmentCriteria, Box<dyn Error>> {
        let defaults = AssignmentCriteria::default();

        let max_concurrent_orders = self
            .get_config_or_default(
                KEY_MAX_CONCURRENT_ORDERS,
                &defaults.max_concurrent_orders.to_string(),
            )?
            .trim()
            .parse::<i32>()
            .unwrap_or(defaults.max_concurrent_orders);

        Ok(AssignmentCriteria {
            match_location: self.get_bool_config(KEY_MATCH_LOCATION, defaults.match_location)?,
            match_specialization: self
                .get_bool_config(KEY_MATCH_SPECIALIZATION, defaults.match_specialization)?,
            consider_workload: self
                .get_bool_config(KEY_CONSIDER_WORKLOAD, defaults.consider_workload)?,
            prefer_same_location: self
                .get_bool_config(KEY_PREFER_SAME_LOCATION, defaults.prefer_same_location)?,
            max_concurrent_orders,
        })
    }

    async fn get_sla_due_soon_hours(&self) -> Result<i64, Box<dyn Error>> {
        let raw = self.get_config_or_default(KEY_SLA_DUE_SOON_HOURS, "4")?;
        Ok(raw.trim().parse::<i64>().unwrap_or(4))
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    fn setup_manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_default_criteria_when_table_empty() {
        let manager = setup_manager();
        let criteria = manager.get_default_assignment_criteria().await.unwrap();

        assert!(criteria.match_location);
        assert!(!criteria.match_specialization);
        assert!(criteria.consider_workload);
        assert!(criteria.prefer_same_location);
        assert_eq!(criteria.max_concurrent_orders, 5);
    }

    #[tokio::test]
    async fn test_override_and_snapshot() {
        let manager = setup_manager();
        manager
            .set_global_config_value(KEY_MAX_CONCURRENT_ORDERS, "3")
            .unwrap();
        manager
            .set_global_config_value(KEY_SLA_DUE_SOON_HOURS, "8")
            .unwrap();

        let criteria = manager.get_default_assignment_criteria().await.unwrap();
        assert_eq!(criteria.max_concurrent_orders, 3);
        assert_eq!(manager.get_sla_due_soon_hours().await.unwrap(), 8);

        let snapshot = manager.snapshot().unwrap();
        assert_eq!(snapshot.len(), 2);
    }

    #[tokio::test]
    async fn test_garbage_value_falls_back_to_default() {
        let manager = setup_manager();
        manager
            .set_global_config_value(KEY_MAX_CONCURRENT_ORDERS, "not-a-number")
            .unwrap();

        let criteria = manager.get_default_assignment_criteria().await.unwrap();
        assert_eq!(criteria.max_concurrent_orders, 5);
    }
}
