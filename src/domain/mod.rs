// ==========================================
// BOM 包装管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、标识派生规则
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod catalog;
pub mod packaging;
pub mod types;
pub mod view;

// 重导出核心类型
pub use action_log::ActionLog;
pub use catalog::{Drawing, Material, Part, UnpackagedPart};
pub use packaging::{
    derive_list_id, derive_unit_id, part_count_from_quantity, AllocationResult,
    CompositionResult, PackagingList, PackagingListSummary, PackagingUnit, ShippingInfo,
    LIST_ID_PREFIX, UNIT_ID_PREFIX,
};
pub use types::{DrawingKind, PackagingActionType};
pub use view::{FlatViewRow, MaterialRecord, NestedPackagingList, NestedPackagingUnit, NestedPart};
