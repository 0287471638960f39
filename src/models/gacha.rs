use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{card_entity as cards, draw_result_entity as draw_results, gacha_entity as gachas};

/// レアリティ (昇順で宣言しているため Ord は N < R < SR < SSR)
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(8))")]
#[serde(rename_all = "UPPERCASE")]
pub enum Rarity {
    #[sea_orm(string_value = "N")]
    N,
    #[sea_orm(string_value = "R")]
    R,
    #[sea_orm(string_value = "SR")]
    Sr,
    #[sea_orm(string_value = "SSR")]
    Ssr,
}

impl Rarity {
    /// 抽選時の走査順 (高レアリティ優先)。
    /// 累積和の同値は必ず上位レアリティ側に倒れる。
    pub const DESC: [Rarity; 4] = [Rarity::Ssr, Rarity::Sr, Rarity::R, Rarity::N];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Ssr => "SSR",
            Rarity::Sr => "SR",
            Rarity::R => "R",
            Rarity::N => "N",
        }
    }
}

impl std::fmt::Display for Rarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// ガチャ商品情報 (排出率は景品表示のため常に公開)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GachaResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// 単発の消費ポイント
    pub unit_cost: i64,
    /// 10連の消費ポイント
    pub ten_cost: i64,
    /// 10連で保証される最低レアリティ (None = 保証なし)
    pub guarantee_floor: Option<Rarity>,
    pub ssr_rate: f64,
    pub sr_rate: f64,
    pub r_rate: f64,
    pub n_rate: f64,
}

impl From<gachas::Model> for GachaResponse {
    fn from(m: gachas::Model) -> Self {
        GachaResponse {
            id: m.id,
            name: m.name,
            description: m.description,
            unit_cost: m.unit_cost,
            ten_cost: m.ten_cost,
            guarantee_floor: m.guarantee_floor,
            ssr_rate: m.ssr_rate,
            sr_rate: m.sr_rate,
            r_rate: m.r_rate,
            n_rate: m.n_rate,
        }
    }
}

/// ガチャ詳細 (商品情報 + 排出カードカタログ)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GachaDetailResponse {
    #[serde(flatten)]
    pub gacha: GachaResponse,
    pub cards: Vec<CardResponse>,
}

/// ガチャ実行リクエスト
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct GachaDrawRequest {
    pub gacha_id: i64,
    /// 1 (単発) または 10 (10連)
    pub draw_count: u32,
    /// デビット書き込みの冪等トークン (省略可)
    pub request_id: Option<Uuid>,
}

/// 抽選1回分の結果
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DrawOutcomeResponse {
    pub card_id: i64,
    pub name: String,
    pub rarity: Rarity,
    pub image_url: Option<String>,
    /// 初入手フラグ (所持カード履歴との突合で算出)
    pub is_new: bool,
}

/// レアリティ別の集計
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub struct RarityTally {
    pub ssr: u32,
    pub sr: u32,
    pub r: u32,
    pub n: u32,
}

impl RarityTally {
    pub fn add(&mut self, rarity: Rarity) {
        match rarity {
            Rarity::Ssr => self.ssr += 1,
            Rarity::Sr => self.sr += 1,
            Rarity::R => self.r += 1,
            Rarity::N => self.n += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.ssr + self.sr + self.r + self.n
    }
}

/// ガチャ実行レスポンス
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GachaDrawResponse {
    pub results: Vec<DrawOutcomeResponse>,
    pub remaining_points: i64,
    pub statistics: RarityTally,
}

/// 抽選履歴クエリパラメータ
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct DrawHistoryQuery {
    /// ページ番号 (既定 1)
    pub page: Option<u32>,
    /// 1ページ件数 (既定 20)
    pub per_page: Option<u32>,
}

/// 抽選履歴レスポンス
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DrawResultResponse {
    pub id: i64,
    pub gacha_id: i64,
    pub card_id: i64,
    pub rarity: Rarity,
    pub points_used: i64,
    pub is_new: bool,
    pub created_at: DateTime<Utc>,
}

impl From<draw_results::Model> for DrawResultResponse {
    fn from(m: draw_results::Model) -> Self {
        DrawResultResponse {
            id: m.id,
            gacha_id: m.gacha_id,
            card_id: m.card_id,
            rarity: m.rarity,
            points_used: m.points_used,
            is_new: m.is_new,
            created_at: m.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// カード情報 (カタログ表示用)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CardResponse {
    pub id: i64,
    pub name: String,
    pub rarity: Rarity,
    pub image_url: Option<String>,
}

impl From<cards::Model> for CardResponse {
    fn from(m: cards::Model) -> Self {
        CardResponse {
            id: m.id,
            name: m.name,
            rarity: m.rarity,
            image_url: m.image_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rarity_ordering() {
        // 保証判定は Ord に依存する (N < R < SR < SSR)
        assert!(Rarity::Ssr > Rarity::Sr);
        assert!(Rarity::Sr > Rarity::R);
        assert!(Rarity::R > Rarity::N);
        assert_eq!(Rarity::DESC[0], Rarity::Ssr);
        assert_eq!(Rarity::DESC[3], Rarity::N);
    }

    #[test]
    fn test_rarity_tally() {
        let mut tally = RarityTally::default();
        tally.add(Rarity::Ssr);
        tally.add(Rarity::N);
        tally.add(Rarity::N);
        assert_eq!(tally.ssr, 1);
        assert_eq!(tally.n, 2);
        assert_eq!(tally.total(), 3);
    }
}
