//! API 类型定义

use serde::{Deserialize, Serialize};

use crate::services::{CreateLinkRequest, Entitlement, LinkView};
use crate::storage::Account;

/// 统一响应信封
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct GuestStartRequest {
    pub uuid: String,
}

/// 登录、注册、迁移、刷新共用的会话响应
#[derive(Serialize, Clone, Debug)]
pub struct SessionResponse {
    pub account: Account,
    pub entitlement: Entitlement,
    /// cookie 有效期（秒）
    pub expires_in: i64,
}

#[derive(Serialize, Clone, Debug)]
pub struct MeResponse {
    pub account: Account,
    pub entitlement: Entitlement,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MessageResponse {
    pub message: String,
}

/// 批量创建文件内容：`{ "urls": [...] }`
#[derive(Deserialize, Clone, Debug)]
pub struct BulkCreateFile {
    pub urls: Vec<CreateLinkRequest>,
}

#[derive(Serialize, Clone, Debug)]
pub struct BulkCreateResponse {
    pub created: usize,
    pub items: Vec<LinkView>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct ListParams {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    pub with_history: Option<bool>,
    pub export: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CleanupResponse {
    pub deleted: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub storage: String,
    pub uptime_secs: i64,
}
