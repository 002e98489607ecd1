// ==========================================
// 车队维保工单系统 - 活动日志仓储
// ==========================================
// 红线: 追加写入,不提供更新/删除
// 对齐: activity_log 表 (kind_json 为 tagged JSON)
// ==========================================

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::domain::work_order::{ActivityEntry, ActivityKind};
use crate::repository::error::{RepositoryError, RepositoryResult};

// ==========================================
// ActivityLogRepository - 活动日志仓储
// ==========================================
pub struct ActivityLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ActivityLogRepository {
    /// 创建新的活动日志仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 行映射: activity_log → ActivityEntry
    ///
    /// 列顺序: entry_id, entry_ts, actor, kind_json
    pub(crate) fn map_row(row: &Row<'_>) -> rusqlite::Result<ActivityEntry> {
        let entry_id: String = row.get(0)?;
        let timestamp: DateTime<Utc> = row.get(1)?;
        let actor: Option<String> = row.get(2)?;
        let kind_json: String = row.get(3)?;

        // 解析失败的条目降级为 Note,不让单条坏数据拖垮整个时间线
        let kind = serde_json::from_str::<ActivityKind>(&kind_json)
            .unwrap_or(ActivityKind::Note { text: kind_json });

        Ok(ActivityEntry {
            entry_id,
            timestamp,
            actor,
            kind,
        })
    }

    /// 追加单条活动日志
    ///
    /// # 参数
    /// - work_order_id: 所属工单
    /// - entry: 日志条目
    ///
    /// # 返回
    /// - Ok(entry_id): 成功追加
    pub fn append(&self, work_order_id: &str, entry: &ActivityEntry) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        Self::insert_in_conn(&conn, work_order_id, entry)?;
        Ok(entry.entry_id.clone())
    }

    /// 批量追加活动日志 (单事务)
    pub fn append_batch(
        &self,
        work_order_id: &str,
        entries: &[ActivityEntry],
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for entry in entries {
            Self::insert_in_conn(&tx, work_order_id, entry)?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }

    /// 查询工单全部活动日志 (按时间戳升序)
    pub fn list_for_order(&self, work_order_id: &str) -> RepositoryResult<Vec<ActivityEntry>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT entry_id, entry_ts, actor, kind_json
            FROM activity_log
            WHERE work_order_id = ?1
            ORDER BY entry_ts ASC, entry_id ASC
            "#,
        )?;

        let entries = stmt
            .query_map(params![work_order_id], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// 在既有连接/事务内插入条目 (供工单仓储的事务复用)
    pub(crate) fn insert_in_conn(
        conn: &Connection,
        work_order_id: &str,
        entry: &ActivityEntry,
    ) -> RepositoryResult<()> {
        let kind_json = serde_json::to_string(&entry.kind)?;

        conn.execute(
            r#"
            INSERT INTO activity_log (entry_id, work_order_id, entry_ts, actor, kind_json)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                entry.entry_id,
                work_order_id,
                entry.timestamp,
                entry.actor,
                kind_json,
            ],
        )?;

        Ok(())
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn setup_test_db() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();

        // 外键约束要求工单先存在
        conn.execute(
            "INSERT INTO work_order (work_order_id, title, location_id, status, priority, created_at)
             VALUES ('wo1', '测试工单', 'L1', 'NEW', 'MEDIUM', '2024-01-01T00:00:00Z')",
            [],
        )
        .unwrap();

        Arc::new(Mutex::new(conn))
    }

    #[test]
    fn test_append_and_list_sorted() {
        let repo = ActivityLogRepository::new(setup_test_db());

        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap();

        // 故意乱序写入
        repo.append("wo1", &ActivityEntry::status_change("Assigned", "In Progress", t1, None))
            .unwrap();
        repo.append("wo1", &ActivityEntry::status_change("New", "Assigned", t2, None))
            .unwrap();

        let entries = repo.list_for_order("wo1").unwrap();
        assert_eq!(entries.len(), 2);
        // 读取时已按时间戳升序
        assert!(entries[0].timestamp < entries[1].timestamp);
    }

    #[test]
    fn test_append_batch() {
        let repo = ActivityLogRepository::new(setup_test_db());
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap();

        let entries = vec![
            ActivityEntry::status_change("New", "Assigned", t, Some("dispatcher".to_string())),
            ActivityEntry::assignment("t1", t, Some("dispatcher".to_string())),
        ];
        let count = repo.append_batch("wo1", &entries).unwrap();
        assert_eq!(count, 2);
        assert_eq!(repo.list_for_order("wo1").unwrap().len(), 2);
    }

    #[test]
    fn test_malformed_kind_json_degrades_to_note() {
        let conn = setup_test_db();
        {
            let guard = conn.lock().unwrap();
            guard
                .execute(
                    "INSERT INTO activity_log (entry_id, work_order_id, entry_ts, actor, kind_json)
                     VALUES ('e1', 'wo1', '2024-01-01T01:00:00Z', NULL, 'not-json')",
                    [],
                )
                .unwrap();
        }

        let repo = ActivityLogRepository::new(conn);
        let entries = repo.list_for_order("wo1").unwrap();
        assert_eq!(entries.len(), 1);
        assert!(matches!(entries[0].kind, ActivityKind::Note { .. }));
    }
}
