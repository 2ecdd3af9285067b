use sea_orm::entity::prelude::*;

/// Telegram user known to the bot, optionally linked to one media-server account.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub telegram_id: i64,
    pub telegram_name: Option<String>,
    /// Set once on account creation; never rebound.
    #[sea_orm(unique)]
    pub emby_id: Option<String>,
    pub emby_name: Option<String>,
    pub is_admin: bool,
    pub is_whitelist: bool,
    pub enable_register: bool,
    /// Epoch seconds; `NULL` or `0` means not banned.
    pub ban_time: Option<i64>,
    pub reason: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::invite_codes::Entity")]
    InviteCodes,
}

impl Related<super::invite_codes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InviteCodes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
