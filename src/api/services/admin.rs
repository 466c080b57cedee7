//! 管理端点（`X-Admin-Key` 保护）

use actix_web::{Responder, Result as ActixResult, web};
use chrono::Utc;

use crate::services::LinkService;

use super::helpers::api_result;
use super::types::CleanupResponse;

/// 删除所有已过期链接，返回精确删除数
pub async fn cleanup_expired_urls(links: web::Data<LinkService>) -> ActixResult<impl Responder> {
    let result = links
        .sweep_expired(Utc::now())
        .await
        .map(|deleted| CleanupResponse { deleted });
    Ok(api_result(result))
}
