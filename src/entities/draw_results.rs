use crate::models::Rarity;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 抽選履歴実体 (追記専用、単発1回につき1行)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "draw_results")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub gacha_id: i64,
    pub card_id: i64,
    pub rarity: Rarity,
    pub points_used: i64,
    pub is_new: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
