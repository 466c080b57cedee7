use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::CONTENT_TYPE,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{debug, info};

use crate::api::constants::ADMIN_KEY_HEADER;
use crate::api::services::helpers::error_from_snaplink;
use crate::errors::SnaplinkError;

/// Guards admin endpoints with a shared key in `X-Admin-Key`
///
/// An empty configured key hides the endpoints entirely (404).
#[derive(Clone)]
pub struct AdminKeyGuard {
    key: Arc<str>,
}

impl AdminKeyGuard {
    pub fn new(key: impl AsRef<str>) -> Self {
        Self {
            key: Arc::from(key.as_ref()),
        }
    }
}

/// Constant-time comparison; differing lengths compare unequal
pub fn admin_key_matches(expected: &str, provided: &str) -> bool {
    bool::from(expected.as_bytes().ct_eq(provided.as_bytes()))
}

impl<S, B> Transform<S, ServiceRequest> for AdminKeyGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AdminKeyMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminKeyMiddleware {
            service: Rc::new(service),
            key: self.key.clone(),
        }))
    }
}

pub struct AdminKeyMiddleware<S> {
    service: Rc<S>,
    key: Arc<str>,
}

impl<S, B> Service<ServiceRequest> for AdminKeyMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if self.key.is_empty() {
            debug!("Admin key not configured - returning 404");
            let response = HttpResponse::NotFound()
                .insert_header((CONTENT_TYPE, "text/plain; charset=utf-8"))
                .body("Not Found");
            return Box::pin(async move { Ok(req.into_response(response.map_into_right_body())) });
        }

        let provided = req
            .headers()
            .get(ADMIN_KEY_HEADER)
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default();

        if !admin_key_matches(&self.key, provided) {
            info!("Admin key check failed for {}", req.path());
            let err = SnaplinkError::unauthorized("Invalid or missing admin key");
            let response = error_from_snaplink(&err);
            return Box::pin(async move { Ok(req.into_response(response.map_into_right_body())) });
        }

        let srv = self.service.clone();
        Box::pin(async move { srv.call(req).await.map(ServiceResponse::map_into_left_body) })
    }
}
