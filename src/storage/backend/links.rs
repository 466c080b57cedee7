//! Short link queries and mutations

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, ExprTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

use super::converters::{model_to_link, new_link_to_active_model};
use crate::errors::Result;
use crate::storage::{LinkPatch, NewLink, ShortLink};

use migration::entities::short_link;

/// Quota count: active links that have not expired as of `now`
pub async fn count_active_links<C: ConnectionTrait>(
    conn: &C,
    account_id: i64,
    now: DateTime<Utc>,
) -> Result<u64> {
    Ok(short_link::Entity::find()
        .filter(short_link::Column::AccountId.eq(account_id))
        .filter(short_link::Column::IsActive.eq(true))
        .filter(
            Condition::any()
                .add(short_link::Column::ExpiresAt.is_null())
                .add(short_link::Column::ExpiresAt.gte(now)),
        )
        .count(conn)
        .await?)
}

pub async fn count_links<C: ConnectionTrait>(conn: &C, account_id: i64) -> Result<u64> {
    Ok(short_link::Entity::find()
        .filter(short_link::Column::AccountId.eq(account_id))
        .count(conn)
        .await?)
}

pub async fn code_exists<C: ConnectionTrait>(conn: &C, code: &str) -> Result<bool> {
    Ok(short_link::Entity::find()
        .filter(short_link::Column::ShortCode.eq(code))
        .count(conn)
        .await?
        > 0)
}

/// 插入新链接；唯一约束冲突以原始 `DbErr` 返回
pub async fn insert_link<C: ConnectionTrait>(
    conn: &C,
    link: &NewLink,
    now: DateTime<Utc>,
) -> std::result::Result<ShortLink, DbErr> {
    let model = new_link_to_active_model(link, now).insert(conn).await?;
    Ok(model_to_link(model))
}

pub async fn find_link_by_id<C: ConnectionTrait>(conn: &C, id: i64) -> Result<Option<ShortLink>> {
    Ok(short_link::Entity::find_by_id(id)
        .one(conn)
        .await?
        .map(model_to_link))
}

pub async fn find_link_by_code<C: ConnectionTrait>(
    conn: &C,
    code: &str,
) -> Result<Option<ShortLink>> {
    Ok(short_link::Entity::find()
        .filter(short_link::Column::ShortCode.eq(code))
        .one(conn)
        .await?
        .map(model_to_link))
}

/// 按 patch 更新，返回更新后的链接
pub async fn update_link<C: ConnectionTrait>(
    conn: &C,
    id: i64,
    patch: &LinkPatch,
    now: DateTime<Utc>,
) -> Result<Option<ShortLink>> {
    let mut update = short_link::Entity::update_many()
        .col_expr(short_link::Column::UpdatedAt, Expr::value(now))
        .filter(short_link::Column::Id.eq(id));

    if let Some(ref target) = patch.target {
        update = update.col_expr(short_link::Column::TargetUrl, Expr::value(target.clone()));
    }
    if let Some(is_active) = patch.is_active {
        update = update.col_expr(short_link::Column::IsActive, Expr::value(is_active));
    }
    if let Some(is_private) = patch.is_private {
        update = update.col_expr(short_link::Column::IsPrivate, Expr::value(is_private));
    }

    update.exec(conn).await?;
    find_link_by_id(conn, id).await
}

/// Deletes the link only if `account_id` owns it; returns rows removed
pub async fn delete_owned_link<C: ConnectionTrait>(
    conn: &C,
    id: i64,
    account_id: i64,
) -> std::result::Result<u64, DbErr> {
    let result = short_link::Entity::delete_many()
        .filter(short_link::Column::Id.eq(id))
        .filter(short_link::Column::AccountId.eq(account_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// 原子自增点击数
pub async fn increment_click<C: ConnectionTrait>(conn: &C, id: i64) -> Result<()> {
    short_link::Entity::update_many()
        .col_expr(
            short_link::Column::ClickCount,
            Expr::col(short_link::Column::ClickCount).add(1i64),
        )
        .filter(short_link::Column::Id.eq(id))
        .exec(conn)
        .await?;
    Ok(())
}

/// 迁移为注册账户后，名下链接永久有效
pub async fn clear_link_expiry<C: ConnectionTrait>(conn: &C, account_id: i64) -> Result<u64> {
    let result = short_link::Entity::update_many()
        .col_expr(
            short_link::Column::ExpiresAt,
            Expr::value(Option::<DateTime<Utc>>::None),
        )
        .filter(short_link::Column::AccountId.eq(account_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// 删除 `expires_at < now` 的链接，返回删除行数；`expires_at IS NULL` 永不匹配
pub async fn delete_expired_links<C: ConnectionTrait>(conn: &C, now: DateTime<Utc>) -> Result<u64> {
    let result = short_link::Entity::delete_many()
        .filter(short_link::Column::ExpiresAt.is_not_null())
        .filter(short_link::Column::ExpiresAt.lt(now))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// 分页查询账户名下链接（最新在前）
pub async fn list_links<C: ConnectionTrait>(
    conn: &C,
    account_id: i64,
    offset: u64,
    limit: u64,
) -> Result<Vec<ShortLink>> {
    Ok(short_link::Entity::find()
        .filter(short_link::Column::AccountId.eq(account_id))
        .order_by_desc(short_link::Column::CreatedAt)
        .order_by_desc(short_link::Column::Id)
        .offset(offset)
        .limit(limit)
        .all(conn)
        .await?
        .into_iter()
        .map(model_to_link)
        .collect())
}

pub async fn list_all_links<C: ConnectionTrait>(
    conn: &C,
    account_id: i64,
) -> Result<Vec<ShortLink>> {
    Ok(short_link::Entity::find()
        .filter(short_link::Column::AccountId.eq(account_id))
        .order_by_desc(short_link::Column::CreatedAt)
        .order_by_desc(short_link::Column::Id)
        .all(conn)
        .await?
        .into_iter()
        .map(model_to_link)
        .collect())
}
