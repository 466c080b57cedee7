use std::str::FromStr;

use crate::errors::{Result, SnaplinkError};
use crate::storage::{AccessRecord, Account, AccountType, NewLink, ShortLink};
use migration::entities::{access_record, account, short_link};

fn parse_account_type(raw: &str) -> Result<AccountType> {
    AccountType::from_str(raw).map_err(|_| {
        SnaplinkError::database_operation(format!("Unknown account_type in database: {}", raw))
    })
}

/// 将 Sea-ORM Model 转换为 Account
pub fn model_to_account(model: account::Model) -> Result<Account> {
    Ok(Account {
        account_type: parse_account_type(&model.account_type)?,
        id: model.id,
        username: model.username,
        email: model.email,
        password_hash: model.password_hash,
        guest_uuid: model.guest_uuid,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

/// 将 Sea-ORM Model 转换为 ShortLink
pub fn model_to_link(model: short_link::Model) -> ShortLink {
    ShortLink {
        id: model.id,
        code: model.short_code,
        target: model.target_url,
        account_id: model.account_id,
        click_count: model.click_count.max(0),
        is_active: model.is_active,
        is_private: model.is_private,
        expires_at: model.expires_at,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

pub fn model_to_access_record(model: access_record::Model) -> Result<AccessRecord> {
    Ok(AccessRecord {
        account_type: parse_account_type(&model.account_type)?,
        id: model.id,
        link_id: model.link_id,
        account_email: model.account_email,
        accessed_at: model.accessed_at,
    })
}

/// 新链接 → ActiveModel（id 由数据库分配）
pub fn new_link_to_active_model(
    link: &NewLink,
    now: chrono::DateTime<chrono::Utc>,
) -> short_link::ActiveModel {
    use sea_orm::ActiveValue::*;

    short_link::ActiveModel {
        id: NotSet,
        short_code: Set(link.code.clone()),
        target_url: Set(link.target.clone()),
        account_id: Set(link.account_id),
        click_count: Set(0),
        is_active: Set(true),
        is_private: Set(link.is_private),
        expires_at: Set(link.expires_at),
        created_at: Set(now),
        updated_at: Set(now),
    }
}
