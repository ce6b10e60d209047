// ==========================================
// BOM 包装管理系统 - 进程级配置
// ==========================================
// 来源: 环境变量
// - BOM_PACKAGING_DB_PATH: 数据库文件路径
// - BOM_PACKAGING_BUSY_TIMEOUT_MS: SQLite busy_timeout（毫秒）
// - BOM_PACKAGING_ACTOR: 审计日志中的操作人
// ==========================================

use crate::api::packaging_api::DEFAULT_ACTOR;
use crate::db::DEFAULT_BUSY_TIMEOUT_MS;
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "BOM_PACKAGING_DB_PATH";
pub const ENV_BUSY_TIMEOUT_MS: &str = "BOM_PACKAGING_BUSY_TIMEOUT_MS";
pub const ENV_ACTOR: &str = "BOM_PACKAGING_ACTOR";

/// 进程级配置
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub db_path: String,
    pub busy_timeout_ms: u64,
    pub actor: String,
}

impl AppConfig {
    /// 从环境变量读取配置（缺失或非法值使用默认值）
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup(ENV_DB_PATH)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(get_default_db_path);

        let busy_timeout_ms = match lookup(ENV_BUSY_TIMEOUT_MS) {
            Some(raw) => raw.trim().parse::<u64>().unwrap_or_else(|_| {
                tracing::warn!("{} 非法，使用默认值: {}", ENV_BUSY_TIMEOUT_MS, raw);
                DEFAULT_BUSY_TIMEOUT_MS
            }),
            None => DEFAULT_BUSY_TIMEOUT_MS,
        };

        let actor = lookup(ENV_ACTOR)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_ACTOR.to_string());

        Self {
            db_path,
            busy_timeout_ms,
            actor,
        }
    }
}

/// 获取默认数据库路径
///
/// 优先使用用户数据目录；拿不到时回退到当前目录。
pub fn get_default_db_path() -> String {
    let mut path = PathBuf::from("./bom_packaging.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("bom-packaging");
        // 确保目录存在
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("bom_packaging.db");
        }
    }

    path.to_string_lossy().to_string()
}
