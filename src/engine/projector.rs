// ==========================================
// BOM 包装管理系统 - 视图投影引擎
// ==========================================
// 职责: 扁平视图（一行一部材）与嵌套视图（清单 → 单元 → 部品 → 部材）
// 红线: 只读，无副作用
// ==========================================
// 嵌套重建直接基于未分组的扁平行进行，
// 不经过分隔符拼接/拆分，部材名称中的任意字符都不会破坏结构。
// ==========================================

use crate::domain::catalog::Drawing;
use crate::domain::view::{
    FlatViewRow, MaterialRecord, NestedPackagingList, NestedPackagingUnit, NestedPart,
};
use crate::repository::catalog_repo::CatalogRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::view_repo::ViewRepository;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use tracing::instrument;

// ==========================================
// ViewProjector - 视图投影引擎
// ==========================================
pub struct ViewProjector {
    catalog_repo: Arc<CatalogRepository>,
    view_repo: Arc<ViewRepository>,
}

impl ViewProjector {
    pub fn new(catalog_repo: Arc<CatalogRepository>, view_repo: Arc<ViewRepository>) -> Self {
        Self {
            catalog_repo,
            view_repo,
        }
    }

    /// 扁平视图
    ///
    /// # 错误
    /// - 项目下没有任何图纸 → NotFound
    #[instrument(skip(self))]
    pub fn flat_view(&self, project_id: &str) -> RepositoryResult<Vec<FlatViewRow>> {
        if project_id.trim().is_empty() {
            return Err(RepositoryError::ValidationError(
                "项目ID不能为空".to_string(),
            ));
        }

        if self.catalog_repo.count_drawings_by_project(project_id)? == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Project".to_string(),
                id: project_id.to_string(),
            });
        }

        let rows = self.view_repo.find_flat_rows(project_id)?;
        tracing::debug!(rows = rows.len(), "扁平视图查询完成");
        Ok(rows)
    }

    /// 项目下的图纸一览（按 drawing_id 排序）
    ///
    /// # 错误
    /// - 项目下没有任何图纸 → NotFound
    #[instrument(skip(self))]
    pub fn drawings(&self, project_id: &str) -> RepositoryResult<Vec<Drawing>> {
        let drawings = self.catalog_repo.find_drawings_by_project(project_id)?;
        if drawings.is_empty() {
            return Err(RepositoryError::NotFound {
                entity: "Project".to_string(),
                id: project_id.to_string(),
            });
        }
        Ok(drawings)
    }

    /// 嵌套视图（仅包含已归属清单的单元）
    #[instrument(skip(self))]
    pub fn nested_view(&self, project_id: &str) -> RepositoryResult<Vec<NestedPackagingList>> {
        let rows = self.flat_view(project_id)?;
        let lists = nest_flat_rows(&rows);
        tracing::debug!(lists = lists.len(), "嵌套视图重建完成");
        Ok(lists)
    }
}

/// 扁平行 → 嵌套清单
///
/// 规则:
/// - 清单、单元、部材均按其在扁平行中首次出现的顺序排列，不重新排序
/// - 部材按 (drawing_id, part_id) 归组到所属部品
/// - 无部品 / 无单元 / 单元未归属清单 的行不进入嵌套视图
/// - 部材字段为空（外连接缺失）的行只建立部品，不产生部材记录
pub fn nest_flat_rows(rows: &[FlatViewRow]) -> Vec<NestedPackagingList> {
    let mut lists: Vec<NestedPackagingList> = Vec::new();
    let mut list_index: HashMap<&str, usize> = HashMap::new();
    let mut unit_index: HashMap<(&str, &str), (usize, usize)> = HashMap::new();

    for row in rows {
        let (part_id, unit_id, list_id) = match (&row.part_id, &row.unit_id, &row.list_id) {
            (Some(p), Some(u), Some(l)) if !l.trim().is_empty() => (p, u, l),
            _ => continue,
        };

        let li = *list_index.entry(list_id.as_str()).or_insert_with(|| {
            lists.push(NestedPackagingList {
                list_id: list_id.clone(),
                project_id: row
                    .list_project_id
                    .clone()
                    .unwrap_or_else(|| row.project_id.clone()),
                list_weight: row.list_weight.unwrap_or(0.0),
                ship_from: row.ship_from.clone(),
                ship_to: row.ship_to.clone(),
                image_id: row.image_id.clone(),
                units: Vec::new(),
            });
            lists.len() - 1
        });

        let (li, ui) = *unit_index
            .entry((row.drawing_id.as_str(), part_id.as_str()))
            .or_insert_with(|| {
                let units = &mut lists[li].units;
                units.push(NestedPackagingUnit {
                    unit_id: unit_id.clone(),
                    part_count: row.part_count.unwrap_or(0),
                    total_count: row.total_count.clone().unwrap_or_default(),
                    part: NestedPart {
                        drawing_id: row.drawing_id.clone(),
                        drawing_name: row.drawing_name.clone(),
                        drawing_kind: row.drawing_kind,
                        part_id: part_id.clone(),
                        part_name: row.part_name.clone().unwrap_or_default(),
                        quantity: row.quantity.unwrap_or(0.0),
                        spare_quantity: row.spare_quantity.unwrap_or(0.0),
                        manufacturer: row.manufacturer.clone().unwrap_or_default(),
                        materials: Vec::new(),
                    },
                });
                (li, units.len() - 1)
            });

        if let Some(material_id) = &row.material_id {
            lists[li].units[ui].part.materials.push(MaterialRecord {
                material_id: material_id.clone(),
                material_name: row.material_name.clone().unwrap_or_default(),
                weight: row.material_weight.unwrap_or(0.0),
                quantity: row.material_quantity.unwrap_or(0.0),
                material_type: row.material_type.clone().unwrap_or_default(),
            });
        }
    }

    lists
}

/// 扁平视图导出为 CSV（含表头）
///
/// # 返回
/// - `Ok(count)`: 写出的数据行数
pub fn write_flat_rows_csv<W: Write>(rows: &[FlatViewRow], writer: W) -> anyhow::Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(rows.len())
}
