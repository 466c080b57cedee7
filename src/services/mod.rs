//! Service layer for business logic
//!
//! Shared by the HTTP handlers and the CLI commands.

pub mod account_service;
pub mod code_generator;
pub mod entitlement;
pub mod link_service;

pub use account_service::{AccountService, Credentials, GUEST_USERNAME_PREFIX, LoginRequest};
pub use code_generator::CodeGenerator;
pub use entitlement::{Entitlement, QuotaPolicy};
pub use link_service::{
    CreateLinkRequest, LinkExport, LinkPage, LinkService, LinkView, ListQuery, UpdateLinkRequest,
};
