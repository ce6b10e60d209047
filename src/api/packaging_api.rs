// ==========================================
// BOM 包装管理系统 - 包装 API
// ==========================================
// 职责: 包装单元分配、包装清单组成、扁平/嵌套视图、审计记录
// 约束: 参数校验在任何写入之前完成
// ==========================================

use std::io::Write;
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::domain::action_log::ActionLog;
use crate::domain::catalog::Drawing;
use crate::domain::packaging::{
    AllocationResult, CompositionResult, PackagingList, PackagingListSummary, PackagingUnit,
    ShippingInfo,
};
use crate::domain::types::PackagingActionType;
use crate::domain::view::{FlatViewRow, NestedPackagingList};
use crate::engine::{
    write_flat_rows_csv, PackagingListComposer, PackagingUnitAllocator, ViewProjector,
};
use crate::repository::{ActionLogRepository, PackagingListRepository, PackagingUnitRepository};

/// 默认操作人
pub const DEFAULT_ACTOR: &str = "system";

/// 操作日志查询上限
const MAX_ACTION_LOG_LIMIT: usize = 1_000;

// ==========================================
// PackagingApi - 包装 API
// ==========================================

/// 包装API
///
/// 职责：
/// 1. 包装单元分配（幂等）
/// 2. 包装清单组成（原子）
/// 3. 扁平 / 嵌套视图与 CSV 导出
/// 4. 清单发货信息维护
/// 5. ActionLog记录
pub struct PackagingApi {
    allocator: Arc<PackagingUnitAllocator>,
    composer: Arc<PackagingListComposer>,
    projector: Arc<ViewProjector>,
    unit_repo: Arc<PackagingUnitRepository>,
    list_repo: Arc<PackagingListRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    config_manager: Arc<ConfigManager>,
    actor: String,
}

impl PackagingApi {
    /// 创建新的PackagingApi实例
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        allocator: Arc<PackagingUnitAllocator>,
        composer: Arc<PackagingListComposer>,
        projector: Arc<ViewProjector>,
        unit_repo: Arc<PackagingUnitRepository>,
        list_repo: Arc<PackagingListRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            allocator,
            composer,
            projector,
            unit_repo,
            list_repo,
            action_log_repo,
            config_manager,
            actor: DEFAULT_ACTOR.to_string(),
        }
    }

    /// 指定审计日志中的操作人
    pub fn with_actor(mut self, actor: &str) -> Self {
        if !actor.trim().is_empty() {
            self.actor = actor.trim().to_string();
        }
        self
    }

    /// 分配包装单元
    ///
    /// # 参数
    /// - project_id: 项目ID
    ///
    /// # 返回
    /// - Ok(AllocationResult): 选中数 / 插入数（无事可做时均为 0，不是错误）
    /// - Err(ApiError::InvalidArgument): 项目ID为空
    pub fn allocate_packaging_units(&self, project_id: &str) -> ApiResult<AllocationResult> {
        require_non_empty(project_id, "项目ID")?;

        let result = self.allocator.allocate(project_id)?;

        if result.inserted_count > 0 {
            self.record_action(ActionLog::new(
                project_id,
                PackagingActionType::AllocateUnits,
                &self.actor,
                Some(serde_json::json!({
                    "selected_count": result.selected_count,
                    "inserted_count": result.inserted_count,
                })),
                Some(format!("生成包装单元{}个", result.inserted_count)),
            ));
        }

        Ok(result)
    }

    /// 组成包装清单
    ///
    /// # 参数
    /// - unit_ids: 所选包装单元ID（非空）
    /// - project_id: 项目ID
    /// - shipping: 发货信息（缺省字段取 config_kv 默认值）
    ///
    /// # 返回
    /// - Ok(CompositionResult): 新清单ID与更新单元数
    /// - Err(ApiError::InvalidArgument): 未选择单元
    /// - Err(ApiError::InvalidArgument): 任一单元不属于 project_id
    /// - Err(ApiError::Conflict): 任一单元已归属清单
    /// - Err(ApiError::TransactionFailure): 事务提交失败（已回滚）
    pub fn compose_packaging_list(
        &self,
        unit_ids: &[String],
        project_id: &str,
        shipping: Option<ShippingInfo>,
    ) -> ApiResult<CompositionResult> {
        require_non_empty(project_id, "项目ID")?;
        if unit_ids.is_empty() {
            return Err(ApiError::InvalidArgument("未选择任何包装单元".to_string()));
        }

        let defaults = self.config_manager.default_shipping_info()?;
        let shipping = shipping.unwrap_or_default().or_defaults(&defaults);

        let result = self.composer.compose(project_id, unit_ids, shipping)?;

        self.record_action(ActionLog::new(
            project_id,
            PackagingActionType::ComposeList,
            &self.actor,
            Some(serde_json::json!({
                "list_id": result.list_id,
                "unit_ids": result.unit_ids,
                "updated_count": result.updated_count,
                "list_weight": result.list_weight,
            })),
            Some(format!(
                "组成包装清单{}（{}个单元）",
                result.list_id, result.updated_count
            )),
        ));

        Ok(result)
    }

    /// 扁平视图（一行一部材）
    pub fn get_flat_view(&self, project_id: &str) -> ApiResult<Vec<FlatViewRow>> {
        require_non_empty(project_id, "项目ID")?;
        Ok(self.projector.flat_view(project_id)?)
    }

    /// 嵌套视图（清单 → 单元 → 部品 → 部材）
    pub fn get_nested_view(&self, project_id: &str) -> ApiResult<Vec<NestedPackagingList>> {
        require_non_empty(project_id, "项目ID")?;
        Ok(self.projector.nested_view(project_id)?)
    }

    /// 扁平视图导出为 CSV
    ///
    /// # 返回
    /// - Ok(usize): 写出的数据行数
    pub fn export_flat_view_csv<W: Write>(&self, project_id: &str, writer: W) -> ApiResult<usize> {
        let rows = self.get_flat_view(project_id)?;
        write_flat_rows_csv(&rows, writer)
            .map_err(|e| ApiError::Internal(format!("CSV 导出失败: {}", e)))
    }

    /// 查询项目下的图纸（确认分配范围）
    ///
    /// # 返回
    /// - Err(ApiError::NotFound): 项目下没有图纸
    pub fn list_drawings(&self, project_id: &str) -> ApiResult<Vec<Drawing>> {
        require_non_empty(project_id, "项目ID")?;
        Ok(self.projector.drawings(project_id)?)
    }

    /// 查询尚未归属清单的包装单元（组成清单的候选）
    pub fn list_unassigned_units(&self, project_id: &str) -> ApiResult<Vec<PackagingUnit>> {
        require_non_empty(project_id, "项目ID")?;
        Ok(self.unit_repo.find_unassigned_by_project(project_id)?)
    }

    /// 查询项目的包装清单摘要
    pub fn list_packaging_lists(&self, project_id: &str) -> ApiResult<Vec<PackagingListSummary>> {
        require_non_empty(project_id, "项目ID")?;
        Ok(self.list_repo.find_summaries_by_project(project_id)?)
    }

    /// 更新清单发货信息
    ///
    /// # 返回
    /// - Ok(PackagingList): 更新后的清单
    /// - Err(ApiError::NotFound): 清单不存在
    pub fn update_list_shipping(
        &self,
        list_id: &str,
        info: ShippingInfo,
    ) -> ApiResult<PackagingList> {
        require_non_empty(list_id, "清单ID")?;

        let existing = self
            .list_repo
            .find_by_id(list_id)?
            .ok_or_else(|| ApiError::NotFound(format!("PackagingList(id={})不存在", list_id)))?;

        self.list_repo.update_shipping(list_id, &info)?;

        self.record_action(ActionLog::new(
            &existing.project_id,
            PackagingActionType::UpdateShipping,
            &self.actor,
            Some(serde_json::json!({
                "list_id": list_id,
                "before": {
                    "ship_from": existing.ship_from,
                    "ship_to": existing.ship_to,
                    "image_id": existing.image_id,
                },
                "after": info,
            })),
            Some(format!("更新包装清单{}发货信息", list_id)),
        ));

        Ok(PackagingList {
            ship_from: info.ship_from,
            ship_to: info.ship_to,
            image_id: info.image_id,
            ..existing
        })
    }

    /// 查询项目的最近操作日志
    pub fn list_action_logs(&self, project_id: &str, limit: usize) -> ApiResult<Vec<ActionLog>> {
        require_non_empty(project_id, "项目ID")?;
        if limit == 0 || limit > MAX_ACTION_LOG_LIMIT {
            return Err(ApiError::InvalidArgument(format!(
                "limit 必须在 1..={} 之间",
                MAX_ACTION_LOG_LIMIT
            )));
        }
        Ok(self.action_log_repo.find_recent_by_project(project_id, limit)?)
    }

    /// best-effort: 主操作已提交，审计写入失败只告警不影响调用方
    fn record_action(&self, log: ActionLog) {
        if let Err(e) = self.action_log_repo.insert(&log) {
            tracing::warn!(
                action_type = %log.action_type,
                project_id = %log.project_id,
                error = %e,
                "操作日志写入失败"
            );
        }
    }
}

fn require_non_empty(value: &str, name: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidArgument(format!("{}不能为空", name)));
    }
    Ok(())
}
