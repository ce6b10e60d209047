// ==========================================
// BOM 包装管理系统 - 操作日志数据仓储
// ==========================================
// 对齐: packaging_action_log 表
// 红线: 所有写入必须记录
// ==========================================

use crate::domain::action_log::ActionLog;
use crate::domain::types::PackagingActionType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

// ==========================================
// ActionLogRepository - 操作日志仓储
// ==========================================
pub struct ActionLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ActionLogRepository {
    /// 从已有连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入操作日志
    ///
    /// # 返回
    /// - `Ok(action_id)`: 插入成功
    pub fn insert(&self, log: &ActionLog) -> RepositoryResult<String> {
        let payload = log
            .payload_json
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO packaging_action_log (
                action_id, project_id, action_type, action_ts, actor, payload_json, detail
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                log.action_id,
                log.project_id,
                log.action_type.to_db_str(),
                log.action_ts.format(DATETIME_FORMAT).to_string(),
                log.actor,
                payload,
                log.detail,
            ],
        )?;

        Ok(log.action_id.clone())
    }

    /// 查询项目的最近操作日志（按时间倒序）
    pub fn find_recent_by_project(
        &self,
        project_id: &str,
        limit: usize,
    ) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT action_id, project_id, action_type, action_ts, actor, payload_json, detail
            FROM packaging_action_log
            WHERE project_id = ?1
            ORDER BY action_ts DESC, rowid DESC
            LIMIT ?2
            "#,
        )?;

        let rows = stmt
            .query_map(params![project_id, limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, Option<String>>(6)?,
                ))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut logs = Vec::with_capacity(rows.len());
        for (action_id, project_id, action_type, action_ts, actor, payload, detail) in rows {
            let action_type = PackagingActionType::from_str(&action_type).ok_or_else(|| {
                RepositoryError::ValidationError(format!("未知操作类型: {}", action_type))
            })?;
            let action_ts = NaiveDateTime::parse_from_str(&action_ts, DATETIME_FORMAT)
                .map_err(|e| RepositoryError::InternalError(format!("时间戳解析失败: {}", e)))?;
            let payload_json = payload.map(|s| serde_json::from_str(&s)).transpose()?;

            logs.push(ActionLog {
                action_id,
                project_id,
                action_type,
                action_ts,
                actor,
                payload_json,
                detail,
            });
        }

        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_test_repo() -> ActionLogRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        ActionLogRepository::new(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_insert_and_find_recent() {
        let repo = setup_test_repo();

        let first = ActionLog::new(
            "PJ1",
            PackagingActionType::AllocateUnits,
            "user1",
            Some(serde_json::json!({ "inserted_count": 2 })),
            None,
        );
        let second = ActionLog::new(
            "PJ1",
            PackagingActionType::ComposeList,
            "user1",
            None,
            Some("KL-D1-P1".to_string()),
        );
        let other = ActionLog::new("PJ2", PackagingActionType::AllocateUnits, "user2", None, None);

        assert_eq!(repo.insert(&first).unwrap(), first.action_id);
        repo.insert(&second).unwrap();
        repo.insert(&other).unwrap();

        let logs = repo.find_recent_by_project("PJ1", 10).unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].action_type, PackagingActionType::ComposeList);
        assert_eq!(
            logs[1].payload_json.as_ref().unwrap()["inserted_count"],
            serde_json::json!(2)
        );

        assert_eq!(repo.find_recent_by_project("PJ1", 1).unwrap().len(), 1);
    }
}
