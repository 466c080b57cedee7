//! Access history for private links

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};

use super::converters::model_to_access_record;
use crate::errors::Result;
use crate::storage::{AccessRecord, Account};

use migration::entities::access_record;

pub async fn insert_access_record<C: ConnectionTrait>(
    conn: &C,
    link_id: i64,
    viewer: &Account,
    now: DateTime<Utc>,
) -> Result<()> {
    use sea_orm::ActiveValue::*;

    access_record::ActiveModel {
        id: NotSet,
        link_id: Set(link_id),
        account_email: Set(viewer.email.clone().unwrap_or_default()),
        account_type: Set(viewer.account_type.to_string()),
        accessed_at: Set(now),
    }
    .insert(conn)
    .await?;
    Ok(())
}

/// 批量加载多个链接的访问记录，按 link_id 分组，组内按时间倒序
pub async fn access_records_for_links<C: ConnectionTrait>(
    conn: &C,
    link_ids: &[i64],
) -> Result<HashMap<i64, Vec<AccessRecord>>> {
    let mut grouped: HashMap<i64, Vec<AccessRecord>> = HashMap::new();
    if link_ids.is_empty() {
        return Ok(grouped);
    }

    let models = access_record::Entity::find()
        .filter(access_record::Column::LinkId.is_in(link_ids.iter().copied()))
        .order_by_desc(access_record::Column::AccessedAt)
        .order_by_desc(access_record::Column::Id)
        .all(conn)
        .await?;

    for model in models {
        let record = model_to_access_record(model)?;
        grouped.entry(record.link_id).or_default().push(record);
    }

    Ok(grouped)
}
