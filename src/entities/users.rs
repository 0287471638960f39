use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// ユーザー実体
/// points はシステム内で唯一の共有可変カラム。
/// 減算は point_service の条件付き UPDATE (points >= cost) 経由のみ許可。
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub username: String,
    pub points: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
