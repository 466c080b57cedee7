use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Closed set of account kinds; every entitlement rule dispatches on it
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AccountType {
    Guest,
    Registered,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub account_type: AccountType,
    pub guest_uuid: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn is_guest(&self) -> bool {
        self.account_type == AccountType::Guest
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortLink {
    pub id: i64,
    pub code: String,
    pub target: String,
    pub account_id: i64,
    #[serde(default)]
    pub click_count: i64,
    pub is_active: bool,
    pub is_private: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShortLink {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|t| t < now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessRecord {
    pub id: i64,
    pub link_id: i64,
    pub account_email: String,
    pub account_type: AccountType,
    pub accessed_at: DateTime<Utc>,
}

/// 待插入的链接（code 由生成器分配）
#[derive(Debug, Clone)]
pub struct NewLink {
    pub code: String,
    pub target: String,
    pub account_id: i64,
    pub is_private: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

/// 部分更新，`None` 表示保持原值
#[derive(Debug, Clone, Default)]
pub struct LinkPatch {
    pub target: Option<String>,
    pub is_active: Option<bool>,
    pub is_private: Option<bool>,
}

impl LinkPatch {
    pub fn is_empty(&self) -> bool {
        self.target.is_none() && self.is_active.is_none() && self.is_private.is_none()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StorageConfig {
    pub storage_type: String,
}
