// ==========================================
// BOM 包装管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::domain::packaging::ShippingInfo;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// 全局 scope
const GLOBAL_SCOPE: &str = "global";

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    /// 组成清单时的默认发货地
    pub const DEFAULT_SHIP_FROM: &str = "packaging.default_ship_from";
    /// 组成清单时的默认收货地
    pub const DEFAULT_SHIP_TO: &str = "packaging.default_ship_to";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')
            "#,
            params![GLOBAL_SCOPE, key, value],
        )?;
        Ok(())
    }

    /// 获取所有 global 配置
    pub fn list_global(&self) -> RepositoryResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;

        let mut config_map = BTreeMap::new();
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(config_map)
    }

    // ===== 包装配置 =====

    /// 默认发货信息（空白值视为未配置）
    pub fn default_shipping_info(&self) -> RepositoryResult<ShippingInfo> {
        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Ok(ShippingInfo {
            ship_from: non_blank(self.get_global(config_keys::DEFAULT_SHIP_FROM)?),
            ship_to: non_blank(self.get_global(config_keys::DEFAULT_SHIP_TO)?),
            image_id: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        ConfigManager::new(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_get_set_global() {
        let manager = setup_manager();
        assert_eq!(manager.get_global("x").unwrap(), None);

        manager.set_global("x", "1").unwrap();
        manager.set_global("x", "2").unwrap();
        assert_eq!(manager.get_global("x").unwrap().as_deref(), Some("2"));
        manager.set_global("a", "0").unwrap();
        let all = manager.list_global().unwrap();
        assert_eq!(all.keys().collect::<Vec<_>>(), vec!["a", "x"]);
        assert_eq!(all["x"], "2");
    }

    #[test]
    fn test_default_shipping_info() {
        let manager = setup_manager();
        assert_eq!(manager.default_shipping_info().unwrap(), ShippingInfo::default());

        manager
            .set_global(config_keys::DEFAULT_SHIP_FROM, "本社工場")
            .unwrap();
        manager.set_global(config_keys::DEFAULT_SHIP_TO, " ").unwrap();

        let info = manager.default_shipping_info().unwrap();
        assert_eq!(info.ship_from.as_deref(), Some("本社工場"));
        assert_eq!(info.ship_to, None);
    }
}
