//! API 帮助函数

use actix_web::HttpResponse;
use actix_web::cookie::{Cookie, SameSite, time};
use actix_web::http::StatusCode;
use serde::Serialize;
use tracing::error;

use crate::api::constants;
use crate::api::jwt::IssuedToken;
use crate::config::{AuthConfig, SameSitePolicy};
use crate::errors::SnaplinkError;

use super::error_code::ErrorCode;
use super::types::ApiResponse;

/// 构建 JSON 响应
pub fn json_response<T: Serialize>(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
    data: Option<T>,
) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: code as i32,
            message: message.into(),
            data,
        })
}

/// 构建成功响应
pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::OK, ErrorCode::Success, "OK", Some(data))
}

/// 构建 201 Created 响应
pub fn created_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::CREATED, ErrorCode::Success, "Created", Some(data))
}

/// 构建错误响应
pub fn error_response(status: StatusCode, error_code: ErrorCode, message: &str) -> HttpResponse {
    json_response::<()>(status, error_code, message, None)
}

/// 从 SnaplinkError 构建错误响应（自动映射 HTTP 状态码和 ErrorCode）
///
/// 内部错误只记录日志，不把细节返回给客户端。
pub fn error_from_snaplink(err: &SnaplinkError) -> HttpResponse {
    let status = err.http_status();
    let error_code = ErrorCode::from(err);
    if err.is_internal() {
        error!("Request failed: {}", err);
        return error_response(status, error_code, "Internal server error");
    }
    error_response(status, error_code, err.message())
}

/// 统一 Result → HttpResponse 转换
///
/// 成功时返回 200 OK + JSON 数据，失败时自动映射 SnaplinkError。
pub fn api_result<T, E>(result: Result<T, E>) -> HttpResponse
where
    T: Serialize,
    E: Into<SnaplinkError>,
{
    match result {
        Ok(data) => success_response(data),
        Err(e) => {
            let err: SnaplinkError = e.into();
            error_from_snaplink(&err)
        }
    }
}

/// 会话 Cookie 构建器
#[derive(Debug, Clone)]
pub struct CookieBuilder {
    same_site: SameSite,
    secure: bool,
    domain: Option<String>,
}

impl CookieBuilder {
    pub fn new(same_site: SameSitePolicy, secure: bool, domain: Option<String>) -> Self {
        let same_site = match same_site {
            SameSitePolicy::Strict => SameSite::Strict,
            SameSitePolicy::None => SameSite::None,
            SameSitePolicy::Lax => SameSite::Lax,
        };
        Self {
            same_site,
            // SameSite=None 要求 Secure
            secure: secure || same_site == SameSite::None,
            domain: domain.filter(|d| !d.is_empty()),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config.cookie_same_site,
            config.cookie_secure,
            config.cookie_domain.clone(),
        )
    }

    fn build_cookie_base(&self, value: String, max_age: time::Duration) -> Cookie<'static> {
        let mut cookie = Cookie::new(constants::SESSION_COOKIE_NAME, value);
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_secure(self.secure);
        cookie.set_same_site(self.same_site);
        cookie.set_max_age(max_age);
        if let Some(ref domain) = self.domain {
            cookie.set_domain(domain.clone());
        }
        cookie
    }

    pub fn build_session_cookie(&self, issued: &IssuedToken) -> Cookie<'static> {
        self.build_cookie_base(
            issued.token.clone(),
            time::Duration::seconds(issued.lifetime.num_seconds()),
        )
    }

    pub fn build_expired_session_cookie(&self) -> Cookie<'static> {
        self.build_cookie_base(String::new(), time::Duration::ZERO)
    }
}
