use crate::models::Rarity;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// ガチャ商品設定実体
/// 概念説明:
/// - *_rate: 各レアリティの排出率 (小数)。合計 1.0 ± 1e-9 必須、
///   検証はアプリ側 (RateTable::validate) で行い、補正 (再正規化) は行わない
/// - guarantee_floor: 10連で保証する最低レアリティ (NULL = 保証なし)
/// - ten_cost: 10連の消費ポイント (単発×10 と独立に設定可)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "gachas")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub unit_cost: i64,
    pub ten_cost: i64,
    pub guarantee_floor: Option<Rarity>,
    pub ssr_rate: f64,
    pub sr_rate: f64,
    pub r_rate: f64,
    pub n_rate: f64,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
