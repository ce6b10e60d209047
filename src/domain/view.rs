// ==========================================
// BOM 包装管理系统 - 视图模型
// ==========================================
// 职责: 扁平视图行（一行一部材）与嵌套视图（清单 → 单元 → 部品 → 部材）
// ==========================================

use crate::domain::types::DrawingKind;
use serde::{Deserialize, Serialize};

// ==========================================
// FlatViewRow - 扁平视图行
// ==========================================
// 来源: 图纸 ⟕ 部品 ⟕ 部材 ⟕ 包装单元 ⟕ 包装清单
// 外连接缺失的一侧字段为 None
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatViewRow {
    // ===== 图纸 =====
    pub project_id: String,
    pub drawing_id: String,
    pub drawing_name: String,
    pub drawing_kind: DrawingKind,
    pub assembly_drawing_id: Option<String>,

    // ===== 部品 =====
    pub part_id: Option<String>,
    pub part_name: Option<String>,
    pub quantity: Option<f64>,
    pub spare_quantity: Option<f64>,
    pub manufacturer: Option<String>,

    // ===== 部材 =====
    pub material_id: Option<String>,
    pub material_name: Option<String>,
    pub material_weight: Option<f64>,
    pub material_quantity: Option<f64>,
    pub material_type: Option<String>,

    // ===== 包装单元 =====
    pub unit_id: Option<String>,
    pub part_count: Option<i64>,
    pub total_count: Option<String>,

    // ===== 包装清单 =====
    pub list_id: Option<String>,
    pub list_project_id: Option<String>, // 清单自身记录的项目（与图纸项目一致）
    pub list_weight: Option<f64>,
    pub ship_from: Option<String>,
    pub ship_to: Option<String>,
    pub image_id: Option<String>,
}

// ==========================================
// 嵌套视图
// ==========================================

/// 部材记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRecord {
    pub material_id: String,
    pub material_name: String,
    pub weight: f64,
    pub quantity: f64,
    pub material_type: String,
}

/// 部品（含部材列表，保持扁平查询的顺序）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedPart {
    pub drawing_id: String,
    pub drawing_name: String,
    pub drawing_kind: DrawingKind,
    pub part_id: String,
    pub part_name: String,
    pub quantity: f64,
    pub spare_quantity: f64,
    pub manufacturer: String,
    pub materials: Vec<MaterialRecord>,
}

impl NestedPart {
    /// 部品单重（部材重量合计）
    pub fn part_weight(&self) -> f64 {
        self.materials.iter().map(|m| m.weight).sum()
    }
}

/// 包装单元（含部品）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedPackagingUnit {
    pub unit_id: String,
    pub part_count: i64,
    pub total_count: String,
    pub part: NestedPart,
}

/// 包装清单（含单元列表）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedPackagingList {
    pub list_id: String,
    pub project_id: String,
    pub list_weight: f64,
    pub ship_from: Option<String>,
    pub ship_to: Option<String>,
    pub image_id: Option<String>,
    pub units: Vec<NestedPackagingUnit>,
}
