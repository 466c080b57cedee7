//! Link management
//!
//! Every mutation that can raise an account's active-link count runs inside
//! one transaction that first writes the owner's row. That write serializes
//! concurrent creators for the same account, so count → check → insert cannot
//! interleave and overshoot the quota.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{DatabaseTransaction, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::code_generator::CodeGenerator;
use super::entitlement::QuotaPolicy;
use crate::config::LinksConfig;
use crate::errors::{Result, SnaplinkError};
use crate::storage::backend::{self, retry, retry::is_unique_violation};
use crate::storage::{AccessRecord, Account, AccountType, LinkPatch, NewLink, SeaOrmStorage, ShortLink};
use crate::utils::is_valid_short_code;
use crate::utils::url_validator::validate_url;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLinkRequest {
    pub url: String,
    #[serde(default)]
    pub is_private: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLinkRequest {
    pub url: Option<String>,
    pub is_active: Option<bool>,
    pub is_private: Option<bool>,
}

#[derive(Debug, Clone, Copy)]
pub struct ListQuery {
    pub offset: u64,
    pub limit: u64,
    pub with_history: bool,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_SIZE,
            with_history: false,
        }
    }
}

/// Link as returned to its owner
#[derive(Debug, Clone, Serialize)]
pub struct LinkView {
    pub id: i64,
    pub short_code: String,
    pub short_url: String,
    pub target_url: String,
    pub click_count: i64,
    pub is_active: bool,
    pub is_private: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_history: Option<Vec<AccessRecord>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkPage {
    pub items: Vec<LinkView>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportOwner {
    pub id: i64,
    pub username: String,
    pub account_type: AccountType,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkExport {
    pub exported_at: DateTime<Utc>,
    pub account: ExportOwner,
    pub total: usize,
    pub links: Vec<LinkView>,
}

impl LinkExport {
    pub fn filename(&self) -> String {
        format!(
            "snaplink-export-{}.json",
            self.exported_at.format("%Y%m%d%H%M%S")
        )
    }
}

pub struct LinkService {
    storage: Arc<SeaOrmStorage>,
    generator: CodeGenerator,
    policy: QuotaPolicy,
    bulk_max_items: usize,
    base_url: String,
}

impl LinkService {
    pub fn new(storage: Arc<SeaOrmStorage>, generator: CodeGenerator, policy: QuotaPolicy) -> Self {
        let defaults = LinksConfig::default();
        Self {
            storage,
            generator,
            policy,
            bulk_max_items: defaults.bulk_max_items,
            base_url: defaults.base_url,
        }
    }

    pub fn from_config(storage: Arc<SeaOrmStorage>, config: &LinksConfig) -> Self {
        Self {
            storage,
            generator: CodeGenerator::from_config(config),
            policy: QuotaPolicy::from_config(config),
            bulk_max_items: config.bulk_max_items.max(1),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn with_bulk_max_items(mut self, bulk_max_items: usize) -> Self {
        self.bulk_max_items = bulk_max_items.max(1);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn policy(&self) -> &QuotaPolicy {
        &self.policy
    }

    pub fn bulk_max_items(&self) -> usize {
        self.bulk_max_items
    }

    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.base_url, code)
    }

    pub fn view(&self, link: ShortLink, history: Option<Vec<AccessRecord>>) -> LinkView {
        LinkView {
            short_url: self.short_url(&link.code),
            id: link.id,
            short_code: link.code,
            target_url: link.target,
            click_count: link.click_count,
            is_active: link.is_active,
            is_private: link.is_private,
            expires_at: link.expires_at,
            created_at: link.created_at,
            updated_at: link.updated_at,
            access_history: history,
        }
    }

    /// Writes the owner row and re-reads it on `txn`
    ///
    /// The account type seen here is authoritative for the rest of the
    /// transaction; a concurrent migration cannot slip in between.
    async fn lock_owner(
        &self,
        txn: &DatabaseTransaction,
        account_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Account> {
        if !backend::touch_account(txn, account_id, now).await? {
            return Err(SnaplinkError::unauthorized("Account not found or disabled"));
        }
        backend::find_account_by_id(txn, account_id)
            .await?
            .filter(|a| a.is_active)
            .ok_or_else(|| SnaplinkError::unauthorized("Account not found or disabled"))
    }

    /// Allocates a code and inserts the link inside a savepoint
    ///
    /// A unique violation means another writer took the code between the existence check and
    /// insert; the savepoint is rolled back and a fresh code is drawn.
    async fn insert_with_fresh_code(
        &self,
        txn: &DatabaseTransaction,
        owner: &Account,
        target: String,
        is_private: bool,
        now: DateTime<Utc>,
    ) -> Result<ShortLink> {
        let mut new_link = NewLink {
            code: String::new(),
            target,
            account_id: owner.id,
            is_private,
            expires_at: self.policy.link_expiry(owner.account_type, now),
        };

        for attempt in 1..=self.generator.max_attempts() {
            let conn = txn;
            new_link.code = self
                .generator
                .generate(move |code: String| async move { backend::code_exists(conn, &code).await })
                .await?;

            let savepoint = txn.begin().await?;
            match backend::insert_link(&savepoint, &new_link, now).await {
                Ok(link) => {
                    savepoint.commit().await?;
                    return Ok(link);
                }
                Err(e) if is_unique_violation(&e) => {
                    savepoint.rollback().await?;
                    warn!(
                        "Short code {} was taken concurrently (attempt {}), retrying",
                        new_link.code, attempt
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(SnaplinkError::code_space_exhausted(
            "Short code kept colliding with concurrent inserts",
        ))
    }

    pub async fn create(&self, account: &Account, request: &CreateLinkRequest) -> Result<ShortLink> {
        let target = validate_url(&request.url)?;
        self.policy
            .ensure_private_allowed(account.account_type, request.is_private)?;

        let now = Utc::now();
        let txn = self.storage.begin().await?;

        let owner = self.lock_owner(&txn, account.id, now).await?;
        self.policy
            .ensure_private_allowed(owner.account_type, request.is_private)?;

        let current = backend::count_active_links(&txn, owner.id, now).await?;
        self.policy
            .entitlement(owner.account_type, current)
            .ensure(1)?;

        let link = self
            .insert_with_fresh_code(&txn, &owner, target, request.is_private, now)
            .await?;

        txn.commit().await?;

        info!(
            "Account {} created link {} -> {}",
            owner.id, link.code, link.target
        );
        Ok(link)
    }

    /// All-or-nothing: either every item is created or none is
    pub async fn bulk_create(
        &self,
        account: &Account,
        requests: &[CreateLinkRequest],
    ) -> Result<Vec<ShortLink>> {
        if requests.is_empty() {
            return Err(SnaplinkError::validation("No URLs provided"));
        }
        if requests.len() > self.bulk_max_items {
            return Err(SnaplinkError::validation(format!(
                "At most {} URLs per bulk request ({} given)",
                self.bulk_max_items,
                requests.len()
            )));
        }

        let mut targets = Vec::with_capacity(requests.len());
        for (index, request) in requests.iter().enumerate() {
            let target = validate_url(&request.url).map_err(|e| {
                SnaplinkError::validation(format!("urls[{}]: {}", index, e.message()))
            })?;
            self.policy
                .ensure_private_allowed(account.account_type, request.is_private)?;
            targets.push((target, request.is_private));
        }

        let now = Utc::now();
        let txn = self.storage.begin().await?;

        let owner = self.lock_owner(&txn, account.id, now).await?;
        if targets.iter().any(|(_, is_private)| *is_private) {
            self.policy.ensure_private_allowed(owner.account_type, true)?;
        }

        let current = backend::count_active_links(&txn, owner.id, now).await?;
        self.policy
            .entitlement(owner.account_type, current)
            .ensure(targets.len() as u64)?;

        let mut created = Vec::with_capacity(targets.len());
        for (target, is_private) in targets {
            created.push(
                self.insert_with_fresh_code(&txn, &owner, target, is_private, now)
                    .await?,
            );
        }

        txn.commit().await?;

        info!("Account {} bulk-created {} links", owner.id, created.len());
        Ok(created)
    }

    pub async fn update(
        &self,
        account: &Account,
        link_id: i64,
        request: &UpdateLinkRequest,
    ) -> Result<ShortLink> {
        let patch = LinkPatch {
            target: request.url.as_deref().map(validate_url).transpose()?,
            is_active: request.is_active,
            is_private: request.is_private,
        };
        if patch.is_empty() {
            return Err(SnaplinkError::validation("Nothing to update"));
        }

        let now = Utc::now();
        let txn = self.storage.begin().await?;

        let owner = self.lock_owner(&txn, account.id, now).await?;
        let link = backend::find_link_by_id(&txn, link_id)
            .await?
            .ok_or_else(|| SnaplinkError::not_found(format!("Link {} not found", link_id)))?;
        if link.account_id != owner.id {
            return Err(SnaplinkError::forbidden("You do not own this link"));
        }

        if patch.is_private == Some(true) {
            self.policy.ensure_private_allowed(owner.account_type, true)?;
        }
        if patch.is_active == Some(true) && !link.is_active {
            let current = backend::count_active_links(&txn, owner.id, now).await?;
            self.policy
                .entitlement(owner.account_type, current)
                .ensure(1)?;
        }

        let updated = backend::update_link(&txn, link_id, &patch, now)
            .await?
            .ok_or_else(|| SnaplinkError::not_found(format!("Link {} not found", link_id)))?;

        txn.commit().await?;

        debug!("Account {} updated link {}", owner.id, link_id);
        Ok(updated)
    }

    pub async fn delete(&self, account: &Account, link_id: i64) -> Result<()> {
        let db = self.storage.get_db();

        let removed = retry::with_retry("delete_link", self.storage.retry_config(), || {
            backend::delete_owned_link(db, link_id, account.id)
        })
        .await?;

        if removed == 0 {
            return Err(match backend::find_link_by_id(db, link_id).await? {
                Some(_) => SnaplinkError::forbidden("You do not own this link"),
                None => SnaplinkError::not_found(format!("Link {} not found", link_id)),
            });
        }

        info!("Account {} deleted link {}", account.id, link_id);
        Ok(())
    }

    /// Looks up a code for redirection, counting the click
    ///
    /// Inactive, expired and unknown codes are indistinguishable. Private links
    /// need a registered viewer; each such visit is recorded.
    pub async fn resolve(&self, code: &str, viewer: Option<&Account>) -> Result<ShortLink> {
        let not_found = || SnaplinkError::not_found(format!("Short link not found: {}", code));
        if !is_valid_short_code(code) {
            return Err(not_found());
        }

        let now = Utc::now();
        let mut link = backend::find_link_by_code(self.storage.get_db(), code)
            .await?
            .filter(|l| l.is_active && !l.is_expired_at(now))
            .ok_or_else(not_found)?;

        let audited = if link.is_private {
            match viewer {
                None => {
                    return Err(SnaplinkError::unauthorized(
                        "Sign in to open this private link",
                    ));
                }
                Some(v) if !v.account_type.can_use_private() => {
                    return Err(SnaplinkError::forbidden(
                        "Private links require a registered account",
                    ));
                }
                Some(v) => Some(v),
            }
        } else {
            None
        };

        let txn = self.storage.begin().await?;
        backend::increment_click(&txn, link.id).await?;
        if let Some(v) = audited {
            backend::insert_access_record(&txn, link.id, v, now).await?;
        }
        txn.commit().await?;

        link.click_count += 1;
        Ok(link)
    }

    pub async fn list(&self, account: &Account, query: ListQuery) -> Result<LinkPage> {
        let limit = match query.limit {
            0 => DEFAULT_PAGE_SIZE,
            n => n.min(MAX_PAGE_SIZE),
        };
        let db = self.storage.get_db();

        let total = backend::count_links(db, account.id).await?;
        let links = backend::list_links(db, account.id, query.offset, limit).await?;
        let items = self.attach_history(links, query.with_history).await?;

        Ok(LinkPage {
            items,
            total,
            offset: query.offset,
            limit,
        })
    }

    /// Every link the account owns, suitable for a JSON download
    pub async fn export(&self, account: &Account, with_history: bool) -> Result<LinkExport> {
        let links = backend::list_all_links(self.storage.get_db(), account.id).await?;
        let links = self.attach_history(links, with_history).await?;

        Ok(LinkExport {
            exported_at: Utc::now(),
            account: ExportOwner {
                id: account.id,
                username: account.username.clone(),
                account_type: account.account_type,
            },
            total: links.len(),
            links,
        })
    }

    async fn attach_history(
        &self,
        links: Vec<ShortLink>,
        with_history: bool,
    ) -> Result<Vec<LinkView>> {
        if !with_history {
            return Ok(links.into_iter().map(|l| self.view(l, None)).collect());
        }

        let ids: Vec<i64> = links.iter().map(|l| l.id).collect();
        let mut history = backend::access_records_for_links(self.storage.get_db(), &ids).await?;

        Ok(links
            .into_iter()
            .map(|l| {
                let records = history.remove(&l.id).unwrap_or_default();
                self.view(l, Some(records))
            })
            .collect())
    }

    /// Deletes every link whose expiry is in the past; accounts are untouched
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let removed = backend::delete_expired_links(self.storage.get_db(), now).await?;
        if removed > 0 {
            info!("Expiry sweep removed {} links", removed);
        } else {
            debug!("Expiry sweep found nothing to remove");
        }
        Ok(removed)
    }
}
