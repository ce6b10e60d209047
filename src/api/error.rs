// ==========================================
// BOM 包装管理系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository错误为调用方可处理的错误
// 约束: 底层驱动错误不直接外泄
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    /// 输入为空或格式错误
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 引用的项目/图纸/单元/清单不存在
    #[error("资源未找到: {0}")]
    NotFound(String),

    /// 单元已归属清单，或清单ID冲突
    #[error("冲突: {0}")]
    Conflict(String),

    /// 原子操作提交失败（已回滚）
    #[error("事务失败: {0}")]
    TransactionFailure(String),

    /// 存储不可用（连接/查询层面的失败）
    #[error("存储不可用: {0}")]
    StoreUnavailable(String),

    /// 内部错误（序列化 / 导出）
    #[error("内部错误: {0}")]
    Internal(String),
}

impl ApiError {
    /// 稳定的错误代码（供命令层序列化）
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidArgument(_) => "INVALID_ARGUMENT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::TransactionFailure(_) => "TRANSACTION_FAILURE",
            ApiError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            ApiError::Internal(_) => "INTERNAL",
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::UnitAlreadyAssigned { unit_id, list_id } => {
                if list_id.is_empty() {
                    ApiError::Conflict(format!("包装单元{}已被并发归属", unit_id))
                } else {
                    ApiError::Conflict(format!(
                        "包装单元{}已归属清单{}",
                        unit_id, list_id
                    ))
                }
            }
            RepositoryError::UnitIdCollision {
                unit_id,
                existing,
                incoming,
            } => ApiError::Conflict(format!(
                "包装单元ID{}已被部品{}占用, 无法分配给部品{}",
                unit_id, existing, incoming
            )),
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseTransactionError(msg) => ApiError::TransactionFailure(msg),
            RepositoryError::ValidationError(msg) => ApiError::InvalidArgument(msg),

            RepositoryError::DatabaseConnectionError(msg) => ApiError::StoreUnavailable(msg),
            RepositoryError::LockError(msg) => {
                ApiError::StoreUnavailable(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::StoreUnavailable(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::StoreUnavailable(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::StoreUnavailable(format!("外键约束违反: {}", msg))
            }
            RepositoryError::InternalError(msg) => ApiError::StoreUnavailable(msg),
            RepositoryError::Other(err) => ApiError::StoreUnavailable(err.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        let api_err: ApiError = RepositoryError::UnitAlreadyAssigned {
            unit_id: "KT-D1-P1".to_string(),
            list_id: "KL-X".to_string(),
        }
        .into();
        match api_err {
            ApiError::Conflict(msg) => {
                assert!(msg.contains("KT-D1-P1"));
                assert!(msg.contains("KL-X"));
            }
            _ => panic!("Expected Conflict"),
        }

        let api_err: ApiError = RepositoryError::NotFound {
            entity: "Project".to_string(),
            id: "PJ9".to_string(),
        }
        .into();
        assert_eq!(api_err.code(), "NOT_FOUND");

        let api_err: ApiError =
            RepositoryError::DatabaseTransactionError("commit".to_string()).into();
        assert_eq!(api_err.code(), "TRANSACTION_FAILURE");

        let api_err: ApiError = RepositoryError::ValidationError("empty".to_string()).into();
        assert_eq!(api_err.code(), "INVALID_ARGUMENT");

        let api_err: ApiError = RepositoryError::UnitIdCollision {
            unit_id: "KT-A-B-C".to_string(),
            existing: "A-B/C".to_string(),
            incoming: "A/B-C".to_string(),
        }
        .into();
        assert_eq!(api_err.code(), "CONFLICT");
        assert!(api_err.to_string().contains("A/B-C"));
    }

    #[test]
    fn test_driver_errors_become_store_unavailable() {
        let api_err: ApiError = RepositoryError::from(rusqlite::Error::InvalidQuery).into();
        assert_eq!(api_err.code(), "STORE_UNAVAILABLE");

        let api_err: ApiError = RepositoryError::LockError("poisoned".to_string()).into();
        assert!(matches!(api_err, ApiError::StoreUnavailable(_)));
    }
}
