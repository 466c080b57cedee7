use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique, nullable)]
    pub email: Option<String>,
    pub password_hash: Option<String>,
    /// "guest" or "registered"
    pub account_type: String,
    /// Client-supplied correlation id, only set while the account is a guest
    #[sea_orm(unique, nullable)]
    pub guest_uuid: Option<String>,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::short_link::Entity")]
    ShortLinks,
}

impl Related<super::short_link::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShortLinks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
