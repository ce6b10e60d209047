// ==========================================
// BOM 包装管理系统 - 引擎层
// ==========================================
// 职责: 实现包装业务规则（分配 / 组成 / 投影）
// 红线: Engine 不拼 SQL，数据访问一律经由 Repository
// ==========================================

pub mod allocator;
pub mod composer;
pub mod projector;

// 重导出核心引擎
pub use allocator::PackagingUnitAllocator;
pub use composer::PackagingListComposer;
pub use projector::{nest_flat_rows, write_flat_rows_csv, ViewProjector};
