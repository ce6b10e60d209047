// ==========================================
// BOM 包装管理系统 - 包装领域模型
// ==========================================
// 职责: 包装单元 / 包装清单 实体，以及标识派生规则
// 红线: 一个部品最多对应一个包装单元
// 红线: 包装单元的 list_id 一经设置不可更改
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 包装单元ID前缀
pub const UNIT_ID_PREFIX: &str = "KT-";

/// 包装清单ID前缀
pub const LIST_ID_PREFIX: &str = "KL-";

// ==========================================
// 标识派生
// ==========================================

/// 由部品派生包装单元ID: "KT-" + drawing_id + "-" + part_id
///
/// 同一部品重复派生总是得到同一ID。
pub fn derive_unit_id(drawing_id: &str, part_id: &str) -> String {
    format!("{}{}-{}", UNIT_ID_PREFIX, drawing_id, part_id)
}

/// 由成员单元派生包装清单ID
///
/// 取字典序最小的单元ID（普通字符串比较，不按数字比较），
/// 将其 "KT-" 前缀替换为 "KL-"。
///
/// # 返回
/// - None: 输入为空，或最小ID不带 "KT-" 前缀
pub fn derive_list_id<'a, I>(unit_ids: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let smallest = unit_ids.into_iter().min()?;
    let rest = smallest.strip_prefix(UNIT_ID_PREFIX)?;
    Some(format!("{}{}", LIST_ID_PREFIX, rest))
}

/// 部品数量 → 包装单元件数（截断取整，不四舍五入）
pub fn part_count_from_quantity(quantity: f64) -> i64 {
    quantity.trunc() as i64
}

// ==========================================
// PackagingUnit - 包装单元
// ==========================================
// 对齐: packaging_unit 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackagingUnit {
    pub unit_id: String,
    pub drawing_id: String,
    pub part_id: String,
    pub part_count: i64,         // 分配时的部品数量（截断）
    pub total_count: String,     // 全数（自由文本，初始为空）
    pub list_id: Option<String>, // 所属包装清单
}

impl PackagingUnit {
    /// 为尚未包装的部品创建新单元
    pub fn for_part(drawing_id: &str, part_id: &str, quantity: f64) -> Self {
        Self {
            unit_id: derive_unit_id(drawing_id, part_id),
            drawing_id: drawing_id.to_string(),
            part_id: part_id.to_string(),
            part_count: part_count_from_quantity(quantity),
            total_count: String::new(),
            list_id: None,
        }
    }

    /// 是否已归属某个包装清单（空白字符串视为未归属）
    pub fn is_assigned(&self) -> bool {
        is_assigned_list_id(self.list_id.as_deref())
    }
}

/// list_id 是否表示“已归属”
pub fn is_assigned_list_id(list_id: Option<&str>) -> bool {
    list_id.map(|s| !s.trim().is_empty()).unwrap_or(false)
}

// ==========================================
// PackagingList - 包装清单
// ==========================================
// 对齐: packaging_list 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackagingList {
    pub list_id: String,
    pub project_id: String,
    pub list_weight: f64,          // 清单总重量
    pub ship_from: Option<String>, // 发货地
    pub ship_to: Option<String>,   // 收货地
    pub image_id: Option<String>,  // 图片引用
    pub created_at: NaiveDateTime,
}

/// 包装清单摘要（含成员单元数）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackagingListSummary {
    #[serde(flatten)]
    pub list: PackagingList,
    pub unit_count: usize,
}

/// 发货信息（组成清单或后续更新时使用）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub ship_from: Option<String>,
    pub ship_to: Option<String>,
    pub image_id: Option<String>,
}

impl ShippingInfo {
    /// 用默认值补齐缺失字段
    pub fn or_defaults(self, defaults: &ShippingInfo) -> ShippingInfo {
        ShippingInfo {
            ship_from: self.ship_from.or_else(|| defaults.ship_from.clone()),
            ship_to: self.ship_to.or_else(|| defaults.ship_to.clone()),
            image_id: self.image_id.or_else(|| defaults.image_id.clone()),
        }
    }
}

// ==========================================
// 操作结果
// ==========================================

/// 分配结果
///
/// 并发分配时 inserted_count 可能小于 selected_count，调用方不得假设两者相等。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub selected_count: usize,
    pub inserted_count: usize,
}

/// 组成结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionResult {
    pub list_id: String,
    pub unit_ids: Vec<String>, // 规范化后（去空白、去重、排序）的成员单元
    pub updated_count: usize,
    pub list_weight: f64,
}
