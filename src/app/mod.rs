// ==========================================
// BOM 包装管理系统 - 应用层
// ==========================================
// 职责: 组装共享状态,向命令行/上层传输提供 JSON 命令
// ==========================================

pub mod commands;
pub mod state;

// 重导出
pub use commands::{map_api_error, ErrorResponse};
pub use state::AppState;
