//! Account lifecycle
//!
//! Registration, login, guest session start and guest → registered migration.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::entitlement::{Entitlement, QuotaPolicy};
use crate::errors::{Result, SnaplinkError};
use crate::storage::backend::{self, retry, retry::is_unique_violation};
use crate::storage::{Account, SeaOrmStorage};
use crate::utils::password::{hash_password, verify_password};

/// Usernames with this prefix are reserved for guest accounts
pub const GUEST_USERNAME_PREFIX: &str = "guest_";

/// Credentials for a new registered account, also used by guest migration
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Credentials {
    #[validate(length(min = 3, max = 50, message = "username must be 3-50 characters"))]
    pub username: String,
    #[validate(email(message = "email is not a valid address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "password must be 8-128 characters"))]
    pub password: String,
}

impl Credentials {
    /// Validates and returns `(username, email)` in canonical form
    fn normalized(&self) -> Result<(String, String)> {
        self.validate()?;

        let username = self.username.trim().to_string();
        if username.len() < 3 {
            return Err(SnaplinkError::validation("username must be 3-50 characters"));
        }
        if username.to_ascii_lowercase().starts_with(GUEST_USERNAME_PREFIX) {
            return Err(SnaplinkError::validation(format!(
                "usernames starting with '{}' are reserved",
                GUEST_USERNAME_PREFIX
            )));
        }

        Ok((username, self.email.trim().to_lowercase()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub struct AccountService {
    storage: Arc<SeaOrmStorage>,
    policy: QuotaPolicy,
}

impl AccountService {
    pub fn new(storage: Arc<SeaOrmStorage>, policy: QuotaPolicy) -> Self {
        Self { storage, policy }
    }

    pub fn policy(&self) -> &QuotaPolicy {
        &self.policy
    }

    /// Creates a registered account
    pub async fn register(&self, credentials: &Credentials) -> Result<Account> {
        let (username, email) = credentials.normalized()?;
        let password_hash = hash_password(&credentials.password)?;

        let db = self.storage.get_db();
        let now = Utc::now();

        // Single autocommit insert; the unique indexes decide conflicts
        let inserted = retry::with_retry("register", self.storage.retry_config(), || {
            backend::insert_registered_account(db, &username, &email, &password_hash, now)
        })
        .await;

        let model = match inserted {
            Ok(model) => model,
            Err(e) if is_unique_violation(&e) => {
                return Err(if backend::email_taken(db, &email, None).await? {
                    SnaplinkError::conflict("Email is already registered")
                } else {
                    SnaplinkError::conflict("Username is already taken")
                });
            }
            Err(e) => return Err(e.into()),
        };

        info!("Registered account {} ({})", model.id, username);
        backend::converters::model_to_account(model)
    }

    /// Email + password login; every failure looks the same to the caller
    pub async fn login(&self, request: &LoginRequest) -> Result<Account> {
        let email = request.email.trim().to_lowercase();
        let denied = || SnaplinkError::unauthorized("Invalid email or password");

        let account = backend::find_account_by_email(self.storage.get_db(), &email)
            .await?
            .ok_or_else(denied)?;

        let Some(ref hash) = account.password_hash else {
            return Err(denied());
        };
        if !account.is_active || !verify_password(&request.password, hash)? {
            warn!("Failed login attempt for account {}", account.id);
            return Err(denied());
        }

        Ok(account)
    }

    /// Returns the guest account correlated with `guest_uuid`, creating it on first use
    pub async fn start_guest(&self, guest_uuid: &str) -> Result<Account> {
        let guest_uuid = Uuid::parse_str(guest_uuid.trim())
            .map_err(|_| SnaplinkError::validation("uuid must be a valid UUID"))?
            .hyphenated()
            .to_string();

        if let Some(existing) = self.find_guest(&guest_uuid).await? {
            return Ok(existing);
        }

        let db = self.storage.get_db();
        let short_name = format!("{}{}", GUEST_USERNAME_PREFIX, &guest_uuid[..8]);
        let full_name = format!("{}{}", GUEST_USERNAME_PREFIX, guest_uuid.replace('-', ""));

        let now = Utc::now();

        for username in [short_name, full_name] {
            let inserted = retry::with_retry("start_guest", self.storage.retry_config(), || {
                backend::insert_guest_account(db, &guest_uuid, &username, now)
            })
            .await;
            match inserted {
                Ok(model) => {
                    info!("Started guest account {} ({})", model.id, username);
                    return backend::converters::model_to_account(model);
                }
                Err(e) if is_unique_violation(&e) => {
                    // Concurrent start for the same uuid: the other insert won
                    if let Some(existing) = self.find_guest(&guest_uuid).await? {
                        return Ok(existing);
                    }
                    warn!(
                        "Guest username {} already taken, trying the long form",
                        username
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(SnaplinkError::conflict(
            "Could not allocate a username for this guest",
        ))
    }

    async fn find_guest(&self, guest_uuid: &str) -> Result<Option<Account>> {
        match backend::find_account_by_guest_uuid(self.storage.get_db(), guest_uuid).await? {
            Some(account) if !account.is_active => {
                Err(SnaplinkError::unauthorized("Account is disabled"))
            }
            other => Ok(other),
        }
    }

    /// Turns a guest into a registered account in one transaction
    ///
    /// Credentials are attached, the guest uuid is cleared and every link the
    /// account owns loses its expiry. Any failure leaves the account untouched.
    pub async fn migrate(&self, account_id: i64, credentials: &Credentials) -> Result<Account> {
        let (username, email) = credentials.normalized()?;
        let password_hash = hash_password(&credentials.password)?;

        let txn = self.storage.begin().await?;
        let now = Utc::now();

        // Write first so the transaction holds the write lock before any read
        if !backend::touch_account(&txn, account_id, now).await? {
            return Err(SnaplinkError::unauthorized("Account not found or disabled"));
        }

        let account = backend::find_account_by_id(&txn, account_id)
            .await?
            .filter(|a| a.is_active)
            .ok_or_else(|| SnaplinkError::unauthorized("Account not found or disabled"))?;

        if !account.is_guest() {
            return Err(SnaplinkError::not_guest("Only guest accounts can be migrated"));
        }
        if backend::email_taken(&txn, &email, Some(account_id)).await? {
            return Err(SnaplinkError::conflict("Email is already registered"));
        }
        if backend::username_taken(&txn, &username, Some(account_id)).await? {
            return Err(SnaplinkError::conflict("Username is already taken"));
        }

        let flipped =
            backend::promote_guest(&txn, account_id, &username, &email, &password_hash, now)
                .await
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        SnaplinkError::conflict("Username or email is already in use")
                    } else {
                        e.into()
                    }
                })?;
        if flipped == 0 {
            return Err(SnaplinkError::not_guest("Only guest accounts can be migrated"));
        }

        let made_permanent = backend::clear_link_expiry(&txn, account_id).await?;

        let migrated = backend::find_account_by_id(&txn, account_id)
            .await?
            .ok_or_else(|| SnaplinkError::not_found("Account disappeared during migration"))?;

        txn.commit().await?;

        info!(
            "Migrated guest account {} to registered ({} links made permanent)",
            account_id, made_permanent
        );
        Ok(migrated)
    }

    /// Loads an account for an authenticated request; missing or disabled → Unauthorized
    pub async fn get_active_account(&self, account_id: i64) -> Result<Account> {
        backend::find_account_by_id(self.storage.get_db(), account_id)
            .await?
            .filter(|a| a.is_active)
            .ok_or_else(|| SnaplinkError::unauthorized("Account not found or disabled"))
    }

    /// Current quota usage
    pub async fn entitlement(&self, account: &Account) -> Result<Entitlement> {
        let current =
            backend::count_active_links(self.storage.get_db(), account.id, Utc::now()).await?;
        Ok(self.policy.entitlement(account.account_type, current))
    }
}
