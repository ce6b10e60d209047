// ==========================================
// BOM 包装管理系统 - 操作日志领域模型
// ==========================================
// 用途: 审计追踪（分配 / 组成 / 发货信息更新）
// 对齐: packaging_action_log 表
// ==========================================

use crate::domain::types::PackagingActionType;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,               // 日志ID (uuid)
    pub project_id: String,              // 所属项目
    pub action_type: PackagingActionType, // 操作类型
    pub action_ts: NaiveDateTime,        // 操作时间戳
    pub actor: String,                   // 操作人
    pub payload_json: Option<JsonValue>, // 操作参数 / 结果
    pub detail: Option<String>,          // 详细描述
}

impl ActionLog {
    /// 以当前时间创建一条日志
    pub fn new(
        project_id: &str,
        action_type: PackagingActionType,
        actor: &str,
        payload_json: Option<JsonValue>,
        detail: Option<String>,
    ) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            action_type,
            action_ts: chrono::Local::now().naive_local(),
            actor: actor.to_string(),
            payload_json,
            detail,
        }
    }
}
