// ==========================================
// BOM 包装管理系统 - 命令层
// ==========================================
// 职责: 以 JSON 字符串为边界调用 PackagingApi
// 约定: 成功返回结果 JSON；失败返回 ErrorResponse JSON
// ==========================================

use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::app::state::AppState;
use crate::domain::packaging::ShippingInfo;

/// 错误响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,

    /// 错误消息
    pub message: String,

    /// 详细信息（可选）
    pub details: Option<serde_json::Value>,
}

/// 将ApiError转换为JSON字符串
pub fn map_api_error(err: ApiError) -> String {
    let error_response = ErrorResponse {
        code: err.code().to_string(),
        message: err.to_string(),
        details: None,
    };

    serde_json::to_string(&error_response).unwrap_or_else(|_| err.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value)
        .map_err(|e| map_api_error(ApiError::Internal(format!("序列化失败: {}", e))))
}

// ==========================================
// 包装相关命令
// ==========================================

/// 为项目中尚未包装的部品生成包装单元
pub fn allocate_packaging_units(state: &AppState, project_id: &str) -> Result<String, String> {
    let result = state
        .packaging_api
        .allocate_packaging_units(project_id)
        .map_err(map_api_error)?;

    to_json(&result)
}

/// 将所选包装单元组成包装清单
pub fn compose_packaging_list(
    state: &AppState,
    unit_ids: Vec<String>,
    project_id: &str,
    shipping: Option<ShippingInfo>,
) -> Result<String, String> {
    let result = state
        .packaging_api
        .compose_packaging_list(&unit_ids, project_id, shipping)
        .map_err(map_api_error)?;

    to_json(&result)
}

/// 扁平视图
pub fn get_flat_view(state: &AppState, project_id: &str) -> Result<String, String> {
    let rows = state
        .packaging_api
        .get_flat_view(project_id)
        .map_err(map_api_error)?;

    to_json(&rows)
}

/// 嵌套视图
pub fn get_nested_view(state: &AppState, project_id: &str) -> Result<String, String> {
    let lists = state
        .packaging_api
        .get_nested_view(project_id)
        .map_err(map_api_error)?;

    to_json(&lists)
}

/// 项目图纸一览
pub fn list_drawings(state: &AppState, project_id: &str) -> Result<String, String> {
    let drawings = state
        .packaging_api
        .list_drawings(project_id)
        .map_err(map_api_error)?;

    to_json(&drawings)
}

/// 未归属清单的包装单元
pub fn list_unassigned_units(state: &AppState, project_id: &str) -> Result<String, String> {
    let units = state
        .packaging_api
        .list_unassigned_units(project_id)
        .map_err(map_api_error)?;

    to_json(&units)
}

/// 包装清单摘要
pub fn list_packaging_lists(state: &AppState, project_id: &str) -> Result<String, String> {
    let lists = state
        .packaging_api
        .list_packaging_lists(project_id)
        .map_err(map_api_error)?;

    to_json(&lists)
}

/// 更新清单发货信息
pub fn update_list_shipping(
    state: &AppState,
    list_id: &str,
    shipping: ShippingInfo,
) -> Result<String, String> {
    let list = state
        .packaging_api
        .update_list_shipping(list_id, shipping)
        .map_err(map_api_error)?;

    to_json(&list)
}

/// 最近操作日志
pub fn list_action_logs(state: &AppState, project_id: &str, limit: usize) -> Result<String, String> {
    let logs = state
        .packaging_api
        .list_action_logs(project_id, limit)
        .map_err(map_api_error)?;

    to_json(&logs)
}

// ==========================================
// 配置相关命令
// ==========================================

/// 写入全局业务配置
pub fn set_config_value(state: &AppState, key: &str, value: &str) -> Result<String, String> {
    if key.trim().is_empty() {
        return Err(map_api_error(ApiError::InvalidArgument(
            "配置键不能为空".to_string(),
        )));
    }

    state
        .config_manager
        .set_global(key.trim(), value)
        .map_err(|e| map_api_error(e.into()))?;

    to_json(&serde_json::json!({ "key": key.trim(), "value": value }))
}

/// 全局业务配置一览（按键排序）
pub fn list_config_values(state: &AppState) -> Result<String, String> {
    let values = state
        .config_manager
        .list_global()
        .map_err(|e| map_api_error(e.into()))?;

    to_json(&values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_api_error_shape() {
        let json = map_api_error(ApiError::Conflict("包装单元KT-D1-P1已归属清单KL-X".to_string()));
        let parsed: ErrorResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.code, "CONFLICT");
        assert!(parsed.message.contains("KL-X"));
        assert!(parsed.details.is_none());
    }
}
