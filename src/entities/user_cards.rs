use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 所持カード実体 (user_id, card_id で一意)
/// is_new 判定の根拠となる所持集合
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "user_cards")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub card_id: i64,
    pub obtained_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
