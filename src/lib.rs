//! Snaplink - URL shortener with guest and registered accounts
//!
//! # Architecture
//! - `storage`: SeaORM entities access, transactions and retry helpers
//! - `services`: code generation, entitlements, account lifecycle, link management
//! - `api`: HTTP handlers, session middleware and JWT cookies
//! - `config`: TOML + environment configuration
//! - `runtime`: server and one-shot CLI modes
//! - `system`: logging setup

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
