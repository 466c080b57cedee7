//! Account-type entitlements
//!
//! Quota, link lifetime and private visibility all dispatch on
//! [`AccountType`] through [`QuotaPolicy`]; there is no other code path that
//! decides whether an account may create links.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::config::LinksConfig;
use crate::errors::{Result, SnaplinkError};
use crate::storage::AccountType;

impl AccountType {
    /// Only registered accounts may own private links
    pub fn can_use_private(self) -> bool {
        match self {
            AccountType::Guest => false,
            AccountType::Registered => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub guest_max_links: u64,
    /// `None` means unlimited
    pub registered_max_links: Option<u64>,
    pub guest_link_ttl_days: i64,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            guest_max_links: 5,
            registered_max_links: Some(100),
            guest_link_ttl_days: 7,
        }
    }
}

impl QuotaPolicy {
    pub fn from_config(config: &LinksConfig) -> Self {
        Self {
            guest_max_links: config.guest_max_links,
            registered_max_links: match config.registered_max_links {
                0 => None,
                n => Some(n),
            },
            guest_link_ttl_days: config.guest_link_ttl_days,
        }
    }

    pub fn max_links(&self, account_type: AccountType) -> Option<u64> {
        match account_type {
            AccountType::Guest => Some(self.guest_max_links),
            AccountType::Registered => self.registered_max_links,
        }
    }

    /// Expiry stamped on a link created now by an account of this type
    pub fn link_expiry(&self, account_type: AccountType, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match account_type {
            AccountType::Guest => Some(now + Duration::days(self.guest_link_ttl_days)),
            AccountType::Registered => None,
        }
    }

    /// Snapshot for an account that currently owns `current` active links
    pub fn entitlement(&self, account_type: AccountType, current: u64) -> Entitlement {
        Entitlement {
            account_type,
            max_links: self.max_links(account_type),
            current,
        }
    }

    /// Rejects private visibility for account types that cannot use it
    pub fn ensure_private_allowed(&self, account_type: AccountType, is_private: bool) -> Result<()> {
        if is_private && !account_type.can_use_private() {
            return Err(SnaplinkError::forbidden(
                "Guest accounts cannot create private links",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Entitlement {
    pub account_type: AccountType,
    pub max_links: Option<u64>,
    pub current: u64,
}

impl Entitlement {
    /// `current + proposed <= max`, always true when unlimited
    pub fn allows(&self, proposed: u64) -> bool {
        match self.max_links {
            None => true,
            Some(max) => self.current.saturating_add(proposed) <= max,
        }
    }

    /// Free slots, floored at zero; `None` when unlimited
    pub fn remaining(&self) -> Option<u64> {
        self.max_links.map(|max| max.saturating_sub(self.current))
    }

    pub fn ensure(&self, proposed: u64) -> Result<()> {
        if self.allows(proposed) {
            return Ok(());
        }
        Err(SnaplinkError::quota_exceeded(format!(
            "{} accounts may own at most {} active links ({} in use, {} requested)",
            self.account_type,
            self.max_links.unwrap_or_default(),
            self.current,
            proposed
        )))
    }
}
