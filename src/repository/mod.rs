// ==========================================
// BOM 包装管理系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约束: 多语句写入在仓储内以显式事务完成
// ==========================================

pub mod action_log_repo;
pub mod catalog_repo;
pub mod error;
pub mod packaging_list_repo;
pub mod packaging_unit_repo;
pub mod view_repo;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use catalog_repo::CatalogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use packaging_list_repo::PackagingListRepository;
pub use packaging_unit_repo::{PackagingUnitRepository, UnitWeight};
pub use view_repo::ViewRepository;
