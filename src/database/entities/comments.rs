use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comments")]
pub struct Model {
    /// Store-internal identity, surfaced to clients as `id`
    #[sea_orm(primary_key, auto_increment = false, column_name = "_id")]
    pub doc_id: String,
    pub name: String,
    pub email: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    /// Unicode-lowercased `body`, the column searches run against
    #[sea_orm(column_type = "Text")]
    pub body_folded: String,
    // No foreign key, may point at a deleted post
    pub post_id: String,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
