// ==========================================
// BOM 包装管理系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::packaging_api::DEFAULT_ACTOR;
use crate::api::PackagingApi;
use crate::config::app_config::AppConfig;
use crate::config::config_manager::ConfigManager;
use crate::db::{
    configure_sqlite_connection_with_timeout, init_schema, read_schema_version,
    CURRENT_SCHEMA_VERSION, DEFAULT_BUSY_TIMEOUT_MS,
};
use crate::engine::{PackagingListComposer, PackagingUnitAllocator, ViewProjector};
use crate::repository::{
    ActionLogRepository, CatalogRepository, PackagingListRepository, PackagingUnitRepository,
    ViewRepository,
};
use rusqlite::Connection;

/// 应用状态
///
/// 包含API实例和共享资源；同一进程内所有仓储共用一个连接。
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 数据库中记录的 schema 版本
    pub schema_version: i64,

    /// 包装API
    pub packaging_api: Arc<PackagingApi>,

    /// 图纸/部品/部材目录仓储（用于数据装载）
    pub catalog_repo: Arc<CatalogRepository>,

    /// 业务配置
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例（默认 busy_timeout）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        Self::from_config(&AppConfig {
            db_path,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            actor: DEFAULT_ACTOR.to_string(),
        })
    }

    /// 按进程级配置创建AppState
    ///
    /// 该方法会：
    /// 1. 打开连接并初始化 schema（幂等），拒绝更新版本程序创建的数据库
    /// 2. 初始化所有Repository
    /// 3. 初始化所有Engine
    /// 4. 创建API实例
    pub fn from_config(config: &AppConfig) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", config.db_path);

        let conn = Connection::open(&config.db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        configure_sqlite_connection_with_timeout(&conn, config.busy_timeout_ms)
            .map_err(|e| format!("数据库连接配置失败: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库 schema 初始化失败: {}", e))?;

        let schema_version = read_schema_version(&conn)
            .map_err(|e| format!("读取 schema 版本失败: {}", e))?
            .unwrap_or(CURRENT_SCHEMA_VERSION);
        if schema_version > CURRENT_SCHEMA_VERSION {
            tracing::error!(
                schema_version,
                supported = CURRENT_SCHEMA_VERSION,
                "数据库 schema 版本高于程序支持的版本"
            );
            return Err(format!(
                "数据库 schema 版本 {} 高于程序支持的版本 {}",
                schema_version, CURRENT_SCHEMA_VERSION
            ));
        }
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let catalog_repo = Arc::new(CatalogRepository::new(conn.clone()));
        let unit_repo = Arc::new(PackagingUnitRepository::new(conn.clone()));
        let list_repo = Arc::new(PackagingListRepository::new(conn.clone()));
        let view_repo = Arc::new(ViewRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));
        let config_manager = Arc::new(ConfigManager::new(conn));

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let allocator = Arc::new(PackagingUnitAllocator::new(unit_repo.clone()));
        let composer = Arc::new(PackagingListComposer::new(
            unit_repo.clone(),
            list_repo.clone(),
        ));
        let projector = Arc::new(ViewProjector::new(catalog_repo.clone(), view_repo));

        // ==========================================
        // 创建API实例
        // ==========================================
        let packaging_api = Arc::new(PackagingApi::new(
            allocator,
            composer,
            projector,
            unit_repo,
            list_repo,
            action_log_repo,
            config_manager.clone(),
        )
        .with_actor(&config.actor));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path: config.db_path.clone(),
            schema_version,
            packaging_api,
            catalog_repo,
            config_manager,
        })
    }
}
