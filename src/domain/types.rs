// ==========================================
// BOM 包装管理系统 - 领域类型定义
// ==========================================
// 职责: 枚举类型（图纸种类 / 操作类型）及其数据库字符串映射
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 图纸种类 (Drawing Kind)
// ==========================================
// 存储: bom_drawing.drawing_kind
// 兼容: 目录数据中的日文标签（組立図 / 詳細図 / 配置図）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DrawingKind {
    Assembly, // 组立图
    Detail,   // 详细图
    Layout,   // 配置图
    Other,    // 其他
}

impl DrawingKind {
    /// 从字符串解析图纸种类（未知值归为 Other）
    pub fn from_str(s: &str) -> Self {
        match s.trim() {
            "組立図" => return DrawingKind::Assembly,
            "詳細図" => return DrawingKind::Detail,
            "配置図" => return DrawingKind::Layout,
            _ => {}
        }

        match s.trim().to_uppercase().as_str() {
            "ASSEMBLY" => DrawingKind::Assembly,
            "DETAIL" => DrawingKind::Detail,
            "LAYOUT" => DrawingKind::Layout,
            _ => DrawingKind::Other,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            DrawingKind::Assembly => "ASSEMBLY",
            DrawingKind::Detail => "DETAIL",
            DrawingKind::Layout => "LAYOUT",
            DrawingKind::Other => "OTHER",
        }
    }
}

impl fmt::Display for DrawingKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 包装操作类型 (审计用)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PackagingActionType {
    AllocateUnits,  // 生成包装单元
    ComposeList,    // 组成包装清单
    UpdateShipping, // 更新发货信息
}

impl PackagingActionType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ALLOCATE_UNITS" => Some(PackagingActionType::AllocateUnits),
            "COMPOSE_LIST" => Some(PackagingActionType::ComposeList),
            "UPDATE_SHIPPING" => Some(PackagingActionType::UpdateShipping),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            PackagingActionType::AllocateUnits => "ALLOCATE_UNITS",
            PackagingActionType::ComposeList => "COMPOSE_LIST",
            PackagingActionType::UpdateShipping => "UPDATE_SHIPPING",
        }
    }
}

impl fmt::Display for PackagingActionType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}
