//! 认证相关端点：注册、登录、访客会话、迁移、刷新、登出

use actix_governor::{Governor, GovernorConfigBuilder, KeyExtractor, SimpleKeyExtractionError};
use actix_web::dev::ServiceRequest;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, Result as ActixResult, web};
use governor::middleware::NoOpMiddleware;
use tracing::{debug, info, warn};

use crate::api::middleware::{AuthedAccount, SessionManager};
use crate::errors::{Result, SnaplinkError};
use crate::services::{AccountService, Credentials, LoginRequest};
use crate::storage::Account;

use super::error_code::ErrorCode;
use super::helpers::{error_from_snaplink, json_response, success_response};
use super::types::{GuestStartRequest, MeResponse, MessageResponse, SessionResponse};

/// 基于连接 IP 的限流 key 提取器
///
/// 只使用 TCP peer address，不信任 X-Forwarded-For。
#[derive(Clone, Copy)]
pub struct LoginKeyExtractor;

impl KeyExtractor for LoginKeyExtractor {
    type Key = String;
    type KeyExtractionError = SimpleKeyExtractionError<&'static str>;

    fn extract(&self, req: &ServiceRequest) -> std::result::Result<Self::Key, Self::KeyExtractionError> {
        let key = req
            .peer_addr()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Ok(key)
    }
}

/// 创建登录限流器
///
/// 配置：每秒补充 1 个令牌，突发最多 5 次请求，超限返回 429
pub fn login_rate_limiter() -> Governor<LoginKeyExtractor, NoOpMiddleware> {
    let config = GovernorConfigBuilder::default()
        .seconds_per_request(1)
        .burst_size(5)
        .key_extractor(LoginKeyExtractor)
        .finish()
        .expect("Invalid rate limit config");

    debug!("Login rate limiter created: 1 req/s, burst 5");
    Governor::new(&config)
}

/// 签发 cookie 并返回账户与配额快照
async fn session_response(
    accounts: &AccountService,
    sessions: &SessionManager,
    account: Account,
    status: StatusCode,
    message: &str,
) -> Result<HttpResponse> {
    let entitlement = accounts.entitlement(&account).await?;
    let (cookie, issued) = sessions.issue_cookie(&account)?;

    let mut response = json_response(
        status,
        ErrorCode::Success,
        message,
        Some(SessionResponse {
            account,
            entitlement,
            expires_in: issued.lifetime.num_seconds(),
        }),
    );
    response
        .add_cookie(&cookie)
        .map_err(|e| SnaplinkError::token_issue(format!("Failed to set cookie: {}", e)))?;
    Ok(response)
}

fn respond(result: Result<HttpResponse>) -> HttpResponse {
    result.unwrap_or_else(|e| error_from_snaplink(&e))
}

pub async fn register(
    body: web::Json<Credentials>,
    accounts: web::Data<AccountService>,
    sessions: web::Data<SessionManager>,
) -> ActixResult<impl Responder> {
    let result = async {
        let account = accounts.register(&body).await?;
        session_response(&accounts, &sessions, account, StatusCode::CREATED, "Registered").await
    }
    .await;
    Ok(respond(result))
}

pub async fn login(
    body: web::Json<LoginRequest>,
    accounts: web::Data<AccountService>,
    sessions: web::Data<SessionManager>,
) -> ActixResult<impl Responder> {
    let result = async {
        let account = accounts.login(&body).await?;
        info!("Account {} logged in", account.id);
        session_response(&accounts, &sessions, account, StatusCode::OK, "Login successful").await
    }
    .await;
    Ok(respond(result))
}

/// 开始（或恢复）访客会话
pub async fn start_guest(
    body: web::Json<GuestStartRequest>,
    accounts: web::Data<AccountService>,
    sessions: web::Data<SessionManager>,
) -> ActixResult<impl Responder> {
    let result = async {
        let account = accounts.start_guest(&body.uuid).await?;
        session_response(&accounts, &sessions, account, StatusCode::OK, "Guest session started")
            .await
    }
    .await;
    Ok(respond(result))
}

/// 访客升级为注册账户；新 cookie 立即使用注册账户的有效期
pub async fn migrate(
    AuthedAccount(account): AuthedAccount,
    body: web::Json<Credentials>,
    accounts: web::Data<AccountService>,
    sessions: web::Data<SessionManager>,
) -> ActixResult<impl Responder> {
    let result = async {
        let migrated = accounts.migrate(account.id, &body).await?;
        session_response(&accounts, &sessions, migrated, StatusCode::OK, "Account migrated").await
    }
    .await;
    if let Err(ref e) = result {
        warn!("Migration of account {} failed: {}", account.id, e);
    }
    Ok(respond(result))
}

pub async fn refresh(
    AuthedAccount(account): AuthedAccount,
    accounts: web::Data<AccountService>,
    sessions: web::Data<SessionManager>,
) -> ActixResult<impl Responder> {
    let result =
        session_response(&accounts, &sessions, account, StatusCode::OK, "Session refreshed").await;
    Ok(respond(result))
}

pub async fn me(
    AuthedAccount(account): AuthedAccount,
    accounts: web::Data<AccountService>,
) -> ActixResult<impl Responder> {
    let result = accounts
        .entitlement(&account)
        .await
        .map(|entitlement| MeResponse {
            account,
            entitlement,
        });
    Ok(match result {
        Ok(data) => success_response(data),
        Err(e) => error_from_snaplink(&e),
    })
}

/// 登出 - 清除 cookie
pub async fn logout(sessions: web::Data<SessionManager>) -> ActixResult<impl Responder> {
    debug!("Logout");
    Ok(HttpResponse::Ok()
        .cookie(sessions.clear_cookie())
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(super::types::ApiResponse {
            code: ErrorCode::Success as i32,
            message: "OK".to_string(),
            data: Some(MessageResponse {
                message: "Logout successful".to_string(),
            }),
        }))
}
