use actix_web::body::{BoxBody, EitherBody};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use tracing::{debug, trace};

use crate::api::middleware::{OptionalAccount, SessionAuth};
use crate::services::LinkService;

use super::helpers::error_from_snaplink;

pub struct RedirectService;

impl RedirectService {
    pub async fn handle_redirect(
        path: web::Path<String>,
        OptionalAccount(viewer): OptionalAccount,
        links: web::Data<LinkService>,
    ) -> HttpResponse {
        let code = path.into_inner();
        trace!("Redirect request for {}", code);

        match links.resolve(&code, viewer.as_ref()).await {
            Ok(link) => {
                debug!("Redirecting {} -> {}", link.code, link.target);
                HttpResponse::build(StatusCode::MOVED_PERMANENTLY)
                    .insert_header(("Location", link.target.as_str()))
                    // 每次访问都要经过服务端计数
                    .insert_header(("Cache-Control", "no-store"))
                    .finish()
            }
            Err(e) => {
                debug!("Redirect for {} refused: {}", code, e);
                error_from_snaplink(&e)
            }
        }
    }
}

/// Redirect 路由配置，必须最后注册
pub fn redirect_routes() -> actix_web::Scope<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<EitherBody<BoxBody>>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    web::scope("")
        .wrap(SessionAuth::optional())
        .route("/{code}", web::get().to(RedirectService::handle_redirect))
        .route("/{code}", web::head().to(RedirectService::handle_redirect))
}
