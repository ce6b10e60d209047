// ==========================================
// BOM 包装管理系统 - BOM 目录领域模型
// ==========================================
// 职责: 图纸 / 部品 / 部材 实体
// 红线: 目录由外部维护，包装核心只读
// ==========================================

use crate::domain::types::DrawingKind;
use serde::{Deserialize, Serialize};

// ==========================================
// Drawing - 图纸
// ==========================================
// 对齐: bom_drawing 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    pub drawing_id: String,                  // 图纸ID
    pub project_id: String,                  // 所属项目
    pub drawing_name: String,                // 图纸名称
    pub drawing_kind: DrawingKind,           // 图纸种类
    pub assembly_drawing_id: Option<String>, // 上级组立图（详细图 → 组立图）
}

// ==========================================
// Part - 部品
// ==========================================
// 主键: (drawing_id, part_id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub drawing_id: String,
    pub part_id: String,
    pub part_name: String,
    pub quantity: f64,       // 数量
    pub spare_quantity: f64, // 预备数量
    pub manufacturer: String,
}

// ==========================================
// Material - 部材
// ==========================================
// 主键: (drawing_id, part_id, material_id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub drawing_id: String,
    pub part_id: String,
    pub material_id: String,
    pub material_name: String,
    pub weight: f64,
    pub quantity: f64,
    pub material_type: String, // 材质名
}

/// 尚未包装的部品（分配器的输入）
#[derive(Debug, Clone, PartialEq)]
pub struct UnpackagedPart {
    pub drawing_id: String,
    pub part_id: String,
    pub quantity: f64,
}
