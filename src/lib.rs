// ==========================================
// BOM 包装管理系统 - 核心库
// ==========================================
// 范围: 图纸/部品/部材目录 → 包装单元 → 包装清单
// 技术栈: Rust + SQLite
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/schema）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 共享状态与 JSON 命令
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{DrawingKind, PackagingActionType};

// 领域实体
pub use domain::{
    ActionLog, Drawing, FlatViewRow, Material, NestedPackagingList, PackagingList, PackagingUnit,
    Part, ShippingInfo,
};

// 引擎
pub use engine::{PackagingListComposer, PackagingUnitAllocator, ViewProjector};

// API
pub use api::{ApiError, ApiResult, PackagingApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "BOM 包装管理系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
