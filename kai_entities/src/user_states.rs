use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Dialogue state of one Telegram user.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_states")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    pub intent: String,
    /// JSON document with history, coach progress and flow data.
    #[sea_orm(column_type = "Text")]
    pub data: String,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
