//! User entity for database

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User account model
///
/// Email uniqueness is collation-aware (NOCASE column), so the unique index
/// rejects duplicates that differ only in case.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::password_otp::Entity")]
    PasswordOtps,
}

impl Related<super::password_otp::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PasswordOtps.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
