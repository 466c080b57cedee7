//! Sliding cookie sessions
//!
//! [`SessionAuth`] reads the session token (cookie, or `Authorization: Bearer`),
//! verifies it, re-resolves the account and stores it in request extensions.
//! Every response to a request with a valid session carries a freshly issued
//! cookie whose lifetime follows the account's current type, unless the handler
//! already set or cleared the cookie itself.

use actix_service::{Service, Transform};
use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest,
    body::EitherBody,
    cookie::Cookie,
    dev::{Payload, ServiceRequest, ServiceResponse},
    error::InternalError,
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::{debug, trace, warn};

use crate::api::constants::SESSION_COOKIE_NAME;
use crate::api::jwt::{IssuedToken, JwtService};
use crate::api::services::helpers::{CookieBuilder, error_from_snaplink};
use crate::errors::{Result, SnaplinkError};
use crate::services::AccountService;
use crate::storage::Account;

/// Token signing plus cookie shaping, shared as `web::Data`
pub struct SessionManager {
    jwt: JwtService,
    cookies: CookieBuilder,
}

impl SessionManager {
    pub fn new(jwt: JwtService, cookies: CookieBuilder) -> Self {
        Self { jwt, cookies }
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    /// Signs a token for `account` and wraps it in the session cookie
    pub fn issue_cookie(&self, account: &Account) -> Result<(Cookie<'static>, IssuedToken)> {
        let issued = self.jwt.issue(account)?;
        Ok((self.cookies.build_session_cookie(&issued), issued))
    }

    pub fn clear_cookie(&self) -> Cookie<'static> {
        self.cookies.build_expired_session_cookie()
    }

    /// Token → active account
    pub async fn resolve(&self, accounts: &AccountService, token: &str) -> Result<Account> {
        let claims = self.jwt.validate(token)?;
        accounts.get_active_account(claims.account_id()?).await
    }
}

/// Account attached to the request by [`SessionAuth`]
#[derive(Debug, Clone)]
pub struct SessionAccount(pub Account);

fn extract_token(req: &ServiceRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE_NAME)
        && !cookie.value().is_empty()
    {
        return Some(cookie.value().to_string());
    }
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Session middleware factory
#[derive(Clone, Copy, Debug)]
pub struct SessionAuth {
    required: bool,
}

impl SessionAuth {
    /// Rejects requests without a valid session
    pub fn required() -> Self {
        Self { required: true }
    }

    /// Attaches the account when present, otherwise lets the request through
    pub fn optional() -> Self {
        Self { required: false }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionAuthMiddleware<S>;
    type Future = Ready<std::result::Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionAuthMiddleware {
            service: Rc::new(service),
            required: self.required,
        }))
    }
}

pub struct SessionAuthMiddleware<S> {
    service: Rc<S>,
    required: bool,
}

impl<S, B> SessionAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    fn reject(
        req: ServiceRequest,
        err: &SnaplinkError,
        clear: Option<Cookie<'static>>,
    ) -> ServiceResponse<EitherBody<B>> {
        let mut response = error_from_snaplink(err);
        if let Some(cookie) = clear
            && let Err(e) = response.add_cookie(&cookie)
        {
            warn!("Failed to attach session cookie: {}", e);
        }
        req.into_response(response.map_into_right_body())
    }
}

impl<S, B> Service<ServiceRequest> for SessionAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::result::Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let required = self.required;

        Box::pin(async move {
            let sessions = req.app_data::<web::Data<SessionManager>>().cloned();
            let accounts = req.app_data::<web::Data<AccountService>>().cloned();
            let (Some(sessions), Some(accounts)) = (sessions, accounts) else {
                let err = SnaplinkError::token_issue("Session services are not configured");
                return Ok(Self::reject(req, &err, None));
            };

            let account = match extract_token(&req) {
                None if required => {
                    let err = SnaplinkError::unauthorized("Authentication required");
                    return Ok(Self::reject(req, &err, None));
                }
                None => None,
                Some(token) => match sessions.resolve(&accounts, &token).await {
                    Ok(account) => Some(account),
                    Err(e) if required => {
                        debug!("Session rejected: {}", e);
                        let clear = sessions.clear_cookie();
                        return Ok(Self::reject(req, &e, Some(clear)));
                    }
                    Err(e) => {
                        debug!("Ignoring stale session on optional route: {}", e);
                        None
                    }
                },
            };

            if let Some(ref account) = account {
                trace!("Session resolved to account {}", account.id);
                req.extensions_mut().insert(SessionAccount(account.clone()));
            }

            let mut res = srv.call(req).await?;

            if let Some(account) = account {
                let handler_set_cookie = res
                    .response()
                    .cookies()
                    .any(|c| c.name() == SESSION_COOKIE_NAME);
                if !handler_set_cookie {
                    match sessions.issue_cookie(&account) {
                        Ok((cookie, _)) => {
                            if let Err(e) = res.response_mut().add_cookie(&cookie) {
                                warn!("Failed to attach session cookie: {}", e);
                            }
                        }
                        Err(e) => warn!("Failed to refresh session: {}", e),
                    }
                }
            }

            Ok(res.map_into_left_body())
        })
    }
}

fn unauthorized_error() -> Error {
    let err = SnaplinkError::unauthorized("Authentication required");
    let response = error_from_snaplink(&err);
    InternalError::from_response(err, response).into()
}

/// Extractor for handlers behind [`SessionAuth::required`]
#[derive(Debug, Clone)]
pub struct AuthedAccount(pub Account);

impl FromRequest for AuthedAccount {
    type Error = Error;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<SessionAccount>()
                .map(|s| AuthedAccount(s.0.clone()))
                .ok_or_else(unauthorized_error),
        )
    }
}

/// Extractor for routes behind [`SessionAuth::optional`]
#[derive(Debug, Clone)]
pub struct OptionalAccount(pub Option<Account>);

impl FromRequest for OptionalAccount {
    type Error = Error;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(OptionalAccount(
            req.extensions().get::<SessionAccount>().map(|s| s.0.clone()),
        )))
    }
}
