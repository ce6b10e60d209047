// ==========================================
// BOM 包装管理系统 - 配置层
// ==========================================
// 职责: 进程级配置（环境变量）与业务配置（config_kv 表）
// ==========================================

pub mod app_config;
pub mod config_manager;

// 重导出核心配置
pub use app_config::{get_default_db_path, AppConfig};
pub use config_manager::{config_keys, ConfigManager};
