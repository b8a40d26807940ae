use sea_orm::entity::prelude::*;

/// Account record. `status` holds the lowercase lifecycle state
/// (`pending`, `active`, `inactive`, `suspended`).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub status: String,
    pub email_verified_at: Option<chrono::DateTime<chrono::Utc>>,
    pub two_factor_secret: Option<String>,
    pub two_factor_enabled: bool,
    /// Last accepted TOTP time step; codes at or before it are replays.
    pub two_factor_last_step: Option<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
