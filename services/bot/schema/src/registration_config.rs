use sea_orm::entity::prelude::*;

/// Primary key of the only row in `registration_config`.
pub const SINGLETON_ID: i32 = 1;

/// Global registration quota and deadline (singleton row).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "registration_config")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub total_register_user: i64,
    pub register_public_user: i64,
    /// Epoch seconds; `0` means no open window.
    pub register_public_time: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
