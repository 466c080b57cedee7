//! 路由配置

use actix_web::body::{BoxBody, EitherBody};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::error::InternalError;
use actix_web::web;

use crate::api::middleware::{AdminKeyGuard, SessionAuth};
use crate::errors::SnaplinkError;

use super::admin::cleanup_expired_urls;
use super::auth::{login, login_rate_limiter, logout, me, migrate, refresh, register, start_guest};
use super::helpers::error_from_snaplink;
use super::urls::{bulk_create, create_link, delete_link, list_my_links, update_link};

const JSON_BODY_LIMIT: usize = 64 * 1024;

/// 认证路由 `/auth`
///
/// - POST /auth/register
/// - POST /auth/login（带限流）
/// - POST /auth/guest
/// - POST /auth/logout
/// - POST /auth/migrate、POST /auth/refresh、GET /auth/me（需要会话）
pub fn auth_routes() -> actix_web::Scope {
    web::scope("/auth")
        .route("/register", web::post().to(register))
        .route("/login", web::post().to(login).wrap(login_rate_limiter()))
        .route("/guest", web::post().to(start_guest))
        .route("/logout", web::post().to(logout))
        .route(
            "/migrate",
            web::post().to(migrate).wrap(SessionAuth::required()),
        )
        .route(
            "/refresh",
            web::post().to(refresh).wrap(SessionAuth::required()),
        )
        .route("/me", web::get().to(me).wrap(SessionAuth::required()))
}

/// 链接路由 `/urls`，全部需要会话
pub fn urls_routes() -> actix_web::Scope<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<EitherBody<BoxBody>>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    web::scope("/urls")
        .wrap(SessionAuth::required())
        .route("", web::post().to(create_link))
        // 必须在 /{id} 之前
        .route("/bulk", web::post().to(bulk_create))
        .route("/me/all", web::get().to(list_my_links))
        .route("/{id}", web::put().to(update_link))
        .route("/{id}", web::delete().to(delete_link))
}

/// 管理路由 `/admin`
pub fn admin_routes(admin_key: &str) -> actix_web::Scope<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<EitherBody<BoxBody>>,
        Error = actix_web::Error,
        InitError = (),
    > + use<>,
> {
    web::scope("/admin")
        .wrap(AdminKeyGuard::new(admin_key))
        .route(
            "/cleanup-expired-urls",
            web::post().to(cleanup_expired_urls),
        )
}

/// JSON 请求体解析失败时返回统一信封
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_BODY_LIMIT)
        .error_handler(|err, _req| {
            let e = SnaplinkError::validation(format!("Invalid JSON body: {}", err));
            InternalError::from_response(err, error_from_snaplink(&e)).into()
        })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let e = SnaplinkError::validation(format!("Invalid query string: {}", err));
        InternalError::from_response(err, error_from_snaplink(&e)).into()
    })
}
