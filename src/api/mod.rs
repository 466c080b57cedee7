//! HTTP layer: handlers, middleware and session tokens

pub mod constants;
pub mod jwt;
pub mod middleware;
pub mod services;

use actix_web::web;
use std::sync::Arc;

use crate::config::StaticConfig;
use crate::services::{AccountService, LinkService, QuotaPolicy};
use crate::storage::SeaOrmStorage;

use jwt::JwtService;
use middleware::SessionManager;
use services::{
    AppStartTime, CookieBuilder, admin_routes, auth_routes, health_routes, json_config,
    query_config, redirect_routes, urls_routes,
};

/// Everything the HTTP layer shares across workers, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<SeaOrmStorage>,
    pub accounts: web::Data<AccountService>,
    pub links: web::Data<LinkService>,
    pub sessions: web::Data<SessionManager>,
    pub start_time: AppStartTime,
    pub admin_key: String,
}

impl AppState {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        accounts: AccountService,
        links: LinkService,
        sessions: SessionManager,
        admin_key: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            accounts: web::Data::new(accounts),
            links: web::Data::new(links),
            sessions: web::Data::new(sessions),
            start_time: AppStartTime {
                start_datetime: chrono::Utc::now(),
            },
            admin_key: admin_key.into(),
        }
    }

    pub fn from_config(storage: Arc<SeaOrmStorage>, config: &StaticConfig) -> Self {
        let accounts = AccountService::new(storage.clone(), QuotaPolicy::from_config(&config.links));
        let links = LinkService::from_config(storage.clone(), &config.links);
        let sessions = SessionManager::new(
            JwtService::from_config(&config.auth),
            CookieBuilder::from_config(&config.auth),
        );
        Self::new(storage, accounts, links, sessions, config.auth.admin_key.clone())
    }

    /// Registers shared data and every route; the redirect catch-all goes last
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.storage.clone()))
            .app_data(self.accounts.clone())
            .app_data(self.links.clone())
            .app_data(self.sessions.clone())
            .app_data(web::Data::new(self.start_time.clone()))
            .app_data(json_config())
            .app_data(query_config())
            .service(health_routes())
            .service(auth_routes())
            .service(urls_routes())
            .service(admin_routes(&self.admin_key))
            .service(redirect_routes());
    }
}
