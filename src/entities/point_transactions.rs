use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// ポイント台帳実体 (追記専用、更新・削除禁止)
/// - amount: 符号付き変動量 (ガチャ消費は負)
/// - request_id: デビット書き込みの冪等トークン (UNIQUE インデックス)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "point_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub balance_after: i64,
    pub transaction_type: String,
    pub description: Option<String>,
    pub request_id: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
