use sea_orm::entity::prelude::*;

/// Single-use invite code. `code_type` is `"register"` or `"whitelist"`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "invite_codes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    /// Issuer.
    pub telegram_id: i64,
    pub code_type: String,
    pub is_used: bool,
    pub used_time: Option<i64>,
    pub used_user_id: Option<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::TelegramId",
        to = "super::users::Column::TelegramId"
    )]
    Issuer,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Issuer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
