pub mod admin;
pub mod auth;
pub mod error_code;
pub mod health;
pub mod helpers;
pub mod redirect;
pub mod routes;
pub mod types;
pub mod urls;

pub use error_code::ErrorCode;
pub use health::{AppStartTime, HealthService, health_routes};
pub use helpers::{
    CookieBuilder, api_result, error_from_snaplink, error_response, json_response,
    success_response,
};
pub use redirect::{RedirectService, redirect_routes};
pub use routes::{admin_routes, auth_routes, json_config, query_config, urls_routes};
pub use types::ApiResponse;
