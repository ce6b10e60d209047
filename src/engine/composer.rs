// ==========================================
// BOM 包装管理系统 - 包装清单组成引擎
// ==========================================
// 红线: 不允许部分成功（只归属未归属的子集）
// 红线: 单元 list_id 一经设置不可更改
// ==========================================
// 职责: 校验所选单元 → 派生清单ID → 原子地创建清单并归属单元
// 输入: project_id + unit_ids + 发货信息
// 输出: list_id / 更新单元数 / 清单重量
// ==========================================

use crate::domain::packaging::{
    derive_list_id, CompositionResult, PackagingList, ShippingInfo, UNIT_ID_PREFIX,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::packaging_list_repo::PackagingListRepository;
use crate::repository::packaging_unit_repo::{PackagingUnitRepository, UnitWeight};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::instrument;

// ==========================================
// PackagingListComposer - 包装清单组成引擎
// ==========================================
pub struct PackagingListComposer {
    unit_repo: Arc<PackagingUnitRepository>,
    list_repo: Arc<PackagingListRepository>,
}

impl PackagingListComposer {
    pub fn new(
        unit_repo: Arc<PackagingUnitRepository>,
        list_repo: Arc<PackagingListRepository>,
    ) -> Self {
        Self {
            unit_repo,
            list_repo,
        }
    }

    /// 组成包装清单
    ///
    /// 步骤:
    /// 1) 参数校验（空集合 / 空白ID / 前缀）
    /// 2) 预校验：所有单元存在、属于 project_id 且未归属（任一不满足则整体拒绝）
    /// 3) list_id = 字典序最小单元ID 的 "KT-" 替换为 "KL-"
    /// 4) 清单重量 = Σ 件数 × 部品单重
    /// 5) 事务内复核项目与归属 → 更新单元 → 插入清单
    ///
    /// 第 5 步的复核才是并发下的最终保证；第 2 步让校验错误在任何写入之前返回。
    #[instrument(skip(self, unit_ids, shipping), fields(unit_count = unit_ids.len()))]
    pub fn compose(
        &self,
        project_id: &str,
        unit_ids: &[String],
        shipping: ShippingInfo,
    ) -> RepositoryResult<CompositionResult> {
        if project_id.trim().is_empty() {
            return Err(RepositoryError::ValidationError(
                "项目ID不能为空".to_string(),
            ));
        }

        let unit_ids = normalize_unit_ids(unit_ids)?;

        // 预校验
        let units = self.unit_repo.find_by_ids(&unit_ids)?;
        if units.len() != unit_ids.len() {
            let found: BTreeSet<&str> = units.iter().map(|u| u.unit_id.as_str()).collect();
            let missing = unit_ids
                .iter()
                .find(|id| !found.contains(id.as_str()))
                .cloned()
                .unwrap_or_default();
            return Err(RepositoryError::NotFound {
                entity: "PackagingUnit".to_string(),
                id: missing,
            });
        }
        let foreign = self.unit_repo.find_ids_outside_project(project_id, &unit_ids)?;
        if let Some(unit_id) = foreign.first() {
            tracing::warn!(unit_id = %unit_id, project_id, "所选单元不属于目标项目，拒绝组成");
            return Err(RepositoryError::ValidationError(format!(
                "包装单元{}不属于项目{}",
                unit_id, project_id
            )));
        }
        if let Some(assigned) = units.iter().find(|u| u.is_assigned()) {
            tracing::warn!(
                unit_id = %assigned.unit_id,
                list_id = ?assigned.list_id,
                "所选单元已归属清单，拒绝组成"
            );
            return Err(RepositoryError::UnitAlreadyAssigned {
                unit_id: assigned.unit_id.clone(),
                list_id: assigned.list_id.clone().unwrap_or_default(),
            });
        }

        let list_id = derive_list_id(unit_ids.iter().map(|s| s.as_str())).ok_or_else(|| {
            RepositoryError::ValidationError("无法派生包装清单ID".to_string())
        })?;

        let weights = self.unit_repo.find_unit_weights(&unit_ids)?;
        let list_weight = total_list_weight(&weights);

        let list = PackagingList {
            list_id: list_id.clone(),
            project_id: project_id.to_string(),
            list_weight,
            ship_from: shipping.ship_from,
            ship_to: shipping.ship_to,
            image_id: shipping.image_id,
            created_at: chrono::Local::now().naive_local(),
        };

        let updated_count = self.list_repo.create_with_units(&list, &unit_ids)?;

        tracing::info!(
            list_id = %list_id,
            updated = updated_count,
            list_weight,
            "包装清单组成完成"
        );

        Ok(CompositionResult {
            list_id,
            unit_ids,
            updated_count,
            list_weight,
        })
    }
}

/// 规范化单元ID: 去空白、去重、按字典序排序
///
/// # 错误
/// - 集合为空
/// - 含空白ID
/// - 不带 "KT-" 前缀
pub fn normalize_unit_ids(unit_ids: &[String]) -> RepositoryResult<Vec<String>> {
    if unit_ids.is_empty() {
        return Err(RepositoryError::ValidationError(
            "未选择任何包装单元".to_string(),
        ));
    }

    let mut set = BTreeSet::new();
    for raw in unit_ids {
        let id = raw.trim();
        if id.is_empty() {
            return Err(RepositoryError::ValidationError(
                "包装单元ID不能为空".to_string(),
            ));
        }
        if !id.starts_with(UNIT_ID_PREFIX) {
            return Err(RepositoryError::ValidationError(format!(
                "包装单元ID必须以 {} 开头: {}",
                UNIT_ID_PREFIX, id
            )));
        }
        set.insert(id.to_string());
    }

    Ok(set.into_iter().collect())
}

/// 清单重量 = Σ 件数 × 部品单重
pub fn total_list_weight(weights: &[UnitWeight]) -> f64 {
    weights
        .iter()
        .map(|w| w.part_count as f64 * w.part_weight)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_sorts_and_dedupes() {
        let out = normalize_unit_ids(&ids(&["KT-D2-P1", " KT-D10-P1", "KT-D2-P1"])).unwrap();
        assert_eq!(out, ids(&["KT-D10-P1", "KT-D2-P1"]));
    }

    #[test]
    fn test_normalize_rejects_bad_input() {
        assert!(matches!(
            normalize_unit_ids(&[]),
            Err(RepositoryError::ValidationError(_))
        ));
        assert!(matches!(
            normalize_unit_ids(&ids(&["KT-D1-P1", "  "])),
            Err(RepositoryError::ValidationError(_))
        ));
        assert!(matches!(
            normalize_unit_ids(&ids(&["KL-D1-P1"])),
            Err(RepositoryError::ValidationError(_))
        ));
    }

    #[test]
    fn test_total_list_weight() {
        let weights = vec![
            UnitWeight {
                unit_id: "KT-D1-P1".to_string(),
                part_count: 3,
                part_weight: 2.5,
            },
            UnitWeight {
                unit_id: "KT-D1-P2".to_string(),
                part_count: 2,
                part_weight: 0.0,
            },
        ];
        assert_eq!(total_list_weight(&weights), 7.5);
        assert_eq!(total_list_weight(&[]), 0.0);
    }
}
