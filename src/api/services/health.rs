use actix_web::http::StatusCode;
use actix_web::{Responder, web};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, trace};

use crate::storage::SeaOrmStorage;

use super::error_code::ErrorCode;
use super::helpers::json_response;
use super::types::HealthResponse;

// 应用启动时间结构体
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

pub struct HealthService;

impl HealthService {
    /// 存储可达时返回 200，否则 503
    pub async fn health_check(
        storage: web::Data<Arc<SeaOrmStorage>>,
        app_start_time: web::Data<AppStartTime>,
    ) -> impl Responder {
        trace!("Received health check request");

        let uptime_secs = (chrono::Utc::now() - app_start_time.start_datetime).num_seconds();
        let storage_type = storage.get_backend_config().storage_type;

        let healthy = match tokio::time::timeout(Duration::from_secs(5), storage.ping()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                error!("Storage health check failed: {}", e);
                false
            }
            Err(_) => {
                error!("Storage health check timed out");
                false
            }
        };

        let (status, code, label) = if healthy {
            (StatusCode::OK, ErrorCode::Success, "healthy")
        } else {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorCode::InternalServerError,
                "unhealthy",
            )
        };

        json_response(
            status,
            code,
            label,
            Some(HealthResponse {
                status: label.to_string(),
                storage: storage_type,
                uptime_secs,
            }),
        )
    }
}

pub fn health_routes() -> actix_web::Scope {
    web::scope("/health")
        .route("", web::get().to(HealthService::health_check))
        .route("", web::head().to(HealthService::health_check))
}
