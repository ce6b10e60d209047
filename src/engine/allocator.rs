// ==========================================
// BOM 包装管理系统 - 包装单元分配引擎
// ==========================================
// 红线: 每个部品最多一个包装单元
// ==========================================
// 职责: 为项目中尚未包装的部品各生成一个包装单元
// 输入: project_id
// 输出: 选中数 / 实际插入数
// ==========================================

use crate::domain::catalog::UnpackagedPart;
use crate::domain::packaging::{AllocationResult, PackagingUnit};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::packaging_unit_repo::PackagingUnitRepository;
use std::sync::Arc;
use tracing::instrument;

// ==========================================
// PackagingUnitAllocator - 包装单元分配引擎
// ==========================================
pub struct PackagingUnitAllocator {
    unit_repo: Arc<PackagingUnitRepository>,
}

impl PackagingUnitAllocator {
    pub fn new(unit_repo: Arc<PackagingUnitRepository>) -> Self {
        Self { unit_repo }
    }

    /// 分配包装单元
    ///
    /// 规则:
    /// 1) 未包装 = 部品 ⟕ 包装单元 后单元侧为空
    /// 2) unit_id = "KT-" + drawing_id + "-" + part_id
    /// 3) part_count = 数量截断取整；total_count 为空；list_id 为空
    ///
    /// 同一项目重复调用是幂等的：第二次选中数与插入数均为 0。
    /// 并发调用时插入以“冲突忽略”完成，inserted_count 可能小于 selected_count。
    /// 两个不同部品派生出同一 unit_id 时返回 UnitIdCollision，本次不写入任何单元。
    #[instrument(skip(self))]
    pub fn allocate(&self, project_id: &str) -> RepositoryResult<AllocationResult> {
        if project_id.trim().is_empty() {
            return Err(RepositoryError::ValidationError(
                "项目ID不能为空".to_string(),
            ));
        }

        let parts = self.unit_repo.find_unpackaged_parts(project_id)?;
        let units = build_units(&parts);
        let inserted_count = self.unit_repo.insert_ignore_batch(&units)?;

        let result = AllocationResult {
            selected_count: parts.len(),
            inserted_count,
        };

        if inserted_count < parts.len() {
            tracing::warn!(
                selected = parts.len(),
                inserted = inserted_count,
                "部分部品已被并发分配，跳过重复单元"
            );
        }
        tracing::info!(
            selected = result.selected_count,
            inserted = result.inserted_count,
            "包装单元分配完成"
        );

        Ok(result)
    }
}

/// 未包装部品 → 新包装单元
pub fn build_units(parts: &[UnpackagedPart]) -> Vec<PackagingUnit> {
    parts
        .iter()
        .map(|p| {
            let unit = PackagingUnit::for_part(&p.drawing_id, &p.part_id, p.quantity);
            tracing::debug!(unit_id = %unit.unit_id, part_count = unit.part_count, "生成包装单元");
            unit
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_units() {
        let parts = vec![
            UnpackagedPart {
                drawing_id: "D1".to_string(),
                part_id: "P1".to_string(),
                quantity: 7.0,
            },
            UnpackagedPart {
                drawing_id: "D10".to_string(),
                part_id: "P2".to_string(),
                quantity: 2.75,
            },
        ];

        let units = build_units(&parts);
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].unit_id, "KT-D1-P1");
        assert_eq!(units[0].part_count, 7);
        assert_eq!(units[1].unit_id, "KT-D10-P2");
        assert_eq!(units[1].part_count, 2);
        assert!(units.iter().all(|u| u.list_id.is_none() && u.total_count.is_empty()));
    }
}
