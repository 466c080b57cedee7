//! Account queries
//!
//! Every helper takes any [`ConnectionTrait`] so it works on the pool as
//! well as inside a transaction.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter,
};

use super::converters::model_to_account;
use crate::errors::Result;
use crate::storage::{Account, AccountType};

use migration::entities::account;

pub async fn find_account_by_id<C: ConnectionTrait>(conn: &C, id: i64) -> Result<Option<Account>> {
    account::Entity::find_by_id(id)
        .one(conn)
        .await?
        .map(model_to_account)
        .transpose()
}

pub async fn find_account_by_guest_uuid<C: ConnectionTrait>(
    conn: &C,
    guest_uuid: &str,
) -> Result<Option<Account>> {
    account::Entity::find()
        .filter(account::Column::GuestUuid.eq(guest_uuid))
        .one(conn)
        .await?
        .map(model_to_account)
        .transpose()
}

pub async fn find_account_by_email<C: ConnectionTrait>(
    conn: &C,
    email: &str,
) -> Result<Option<Account>> {
    account::Entity::find()
        .filter(account::Column::Email.eq(email))
        .one(conn)
        .await?
        .map(model_to_account)
        .transpose()
}

/// 用户名是否已被其他账户占用（`exclude_id` 为当前账户自身）
pub async fn username_taken<C: ConnectionTrait>(
    conn: &C,
    username: &str,
    exclude_id: Option<i64>,
) -> Result<bool> {
    let mut query = account::Entity::find().filter(account::Column::Username.eq(username));
    if let Some(id) = exclude_id {
        query = query.filter(account::Column::Id.ne(id));
    }
    Ok(query.count(conn).await? > 0)
}

pub async fn email_taken<C: ConnectionTrait>(
    conn: &C,
    email: &str,
    exclude_id: Option<i64>,
) -> Result<bool> {
    let mut query = account::Entity::find().filter(account::Column::Email.eq(email));
    if let Some(id) = exclude_id {
        query = query.filter(account::Column::Id.ne(id));
    }
    Ok(query.count(conn).await? > 0)
}

/// 插入访客账户；唯一约束冲突以原始 `DbErr` 返回，便于调用方识别并发创建
pub async fn insert_guest_account<C: ConnectionTrait>(
    conn: &C,
    guest_uuid: &str,
    username: &str,
    now: DateTime<Utc>,
) -> std::result::Result<account::Model, DbErr> {
    use sea_orm::ActiveValue::*;

    account::ActiveModel {
        id: NotSet,
        username: Set(username.to_string()),
        email: Set(None),
        password_hash: Set(None),
        account_type: Set(AccountType::Guest.to_string()),
        guest_uuid: Set(Some(guest_uuid.to_string())),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
}

pub async fn insert_registered_account<C: ConnectionTrait>(
    conn: &C,
    username: &str,
    email: &str,
    password_hash: &str,
    now: DateTime<Utc>,
) -> std::result::Result<account::Model, DbErr> {
    use sea_orm::ActiveValue::*;

    account::ActiveModel {
        id: NotSet,
        username: Set(username.to_string()),
        email: Set(Some(email.to_string())),
        password_hash: Set(Some(password_hash.to_string())),
        account_type: Set(AccountType::Registered.to_string()),
        guest_uuid: Set(None),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
}

/// 写入账户行以获取行锁（PostgreSQL/MySQL）或库写锁（SQLite）
///
/// 返回 false 表示账户不存在。
pub async fn touch_account<C: ConnectionTrait>(
    conn: &C,
    account_id: i64,
    now: DateTime<Utc>,
) -> Result<bool> {
    let result = account::Entity::update_many()
        .col_expr(account::Column::UpdatedAt, Expr::value(now))
        .filter(account::Column::Id.eq(account_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Guest → registered in one statement; only matches rows that are still guests
///
/// Returns the number of rows flipped (0 when the account is no longer a guest).
pub async fn promote_guest<C: ConnectionTrait>(
    conn: &C,
    account_id: i64,
    username: &str,
    email: &str,
    password_hash: &str,
    now: DateTime<Utc>,
) -> std::result::Result<u64, DbErr> {
    let result = account::Entity::update_many()
        .col_expr(
            account::Column::AccountType,
            Expr::value(AccountType::Registered.to_string()),
        )
        .col_expr(account::Column::Username, Expr::value(username))
        .col_expr(account::Column::Email, Expr::value(email))
        .col_expr(account::Column::PasswordHash, Expr::value(password_hash))
        .col_expr(account::Column::GuestUuid, Expr::value(Option::<String>::None))
        .col_expr(account::Column::UpdatedAt, Expr::value(now))
        .filter(account::Column::Id.eq(account_id))
        .filter(account::Column::AccountType.eq(AccountType::Guest.as_ref()))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}
