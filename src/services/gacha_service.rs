use std::collections::HashSet;

use crate::entities::{
    card_entity as cards, draw_result_entity as draw_results, gacha_entity as gachas,
    user_card_entity as user_cards,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    DrawHistoryQuery, DrawOutcomeResponse, DrawResultResponse, GachaDetailResponse,
    GachaDrawRequest, GachaDrawResponse, GachaResponse, PaginatedResponse, PaginationParams,
    RarityTally,
};
use crate::services::draw_engine::{
    self, DrawError, DrawnCard, ItemsByRarity, RandomSource, RateTable, ThreadRandom,
};
use crate::services::point_service::{DrawRecord, PointService};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

#[derive(Clone)]
pub struct GachaService {
    pool: DatabaseConnection,
    point_service: PointService,
}

impl GachaService {
    pub fn new(pool: DatabaseConnection, point_service: PointService) -> Self {
        Self {
            pool,
            point_service,
        }
    }

    /// 販売中のガチャ一覧 (排出率込み)
    pub async fn list_gachas(&self) -> AppResult<Vec<GachaResponse>> {
        let list = gachas::Entity::find()
            .filter(gachas::Column::IsActive.eq(true))
            .order_by_asc(gachas::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    /// ガチャ詳細 (排出カードのカタログ込み)
    pub async fn get_gacha(&self, gacha_id: i64) -> AppResult<GachaDetailResponse> {
        let gacha = self.find_active_gacha(gacha_id).await?;
        let catalog = cards::Entity::find()
            .filter(cards::Column::GachaId.eq(gacha_id))
            .filter(cards::Column::IsActive.eq(true))
            .order_by_asc(cards::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(GachaDetailResponse {
            gacha: gacha.into(),
            cards: catalog.into_iter().map(Into::into).collect(),
        })
    }

    /// 抽選履歴 (ページング、新しい順)
    pub async fn list_draw_history(
        &self,
        user_id: i64,
        query: &DrawHistoryQuery,
    ) -> AppResult<PaginatedResponse<DrawResultResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let base_query =
            draw_results::Entity::find().filter(draw_results::Column::UserId.eq(user_id));

        let total = base_query.clone().count(&self.pool).await? as i64;

        let items_models = base_query
            .order_by(draw_results::Column::CreatedAt, Order::Desc)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(&self.pool)
            .await?;

        let items: Vec<DrawResultResponse> = items_models.into_iter().map(Into::into).collect();

        Ok(PaginatedResponse::new(items, &params, total))
    }

    /// ガチャ実行。
    ///
    /// 流れ:
    /// 1. draw_count の検証 (1 か 10 のみ)
    /// 2. ガチャ設定 + カタログ読込、排出率テーブルの検証
    /// 3. 抽選エンジンで draw_count 回抽選 (10連は保証枠適用)
    /// 4. 所持カード集合との突合で is_new を確定
    /// 5. ポイント減算 + 台帳 + 履歴を point_service で原子的に確定
    /// 6. 結果・残高・レアリティ集計を返す
    ///
    /// 抽選・台帳のどの失敗でも部分的な結果は返さない。
    pub async fn execute_draw(
        &self,
        user_id: i64,
        request: &GachaDrawRequest,
    ) -> AppResult<GachaDrawResponse> {
        self.execute_draw_with_rng(user_id, request, &mut ThreadRandom)
            .await
    }

    /// 乱数源注入版 (再現テスト用に分離)
    pub async fn execute_draw_with_rng(
        &self,
        user_id: i64,
        request: &GachaDrawRequest,
        rng: &mut dyn RandomSource,
    ) -> AppResult<GachaDrawResponse> {
        if request.draw_count != 1 && request.draw_count != 10 {
            return Err(AppError::ValidationError(
                "draw_count must be 1 or 10".to_string(),
            ));
        }

        let gacha = self.find_active_gacha(request.gacha_id).await?;

        let table = RateTable {
            ssr: gacha.ssr_rate,
            sr: gacha.sr_rate,
            r: gacha.r_rate,
            n: gacha.n_rate,
        };
        table
            .validate()
            .map_err(|e| AppError::ConfigError(format!("gacha {}: {e}", gacha.id)))?;

        let items = self.load_items_by_rarity(gacha.id).await?;

        let total_cost = if request.draw_count == 10 {
            gacha.ten_cost
        } else {
            gacha.unit_cost
        };
        let drawn = draw_engine::draw_many(
            &table,
            &items,
            request.draw_count as usize,
            gacha.guarantee_floor,
            rng,
        )
        .map_err(|e| match e {
            DrawError::CatalogExhausted => {
                AppError::CatalogExhausted(format!("gacha {}", gacha.id))
            }
            DrawError::InvalidRateTable(_) => {
                AppError::ConfigError(format!("gacha {}: {e}", gacha.id))
            }
        })?;

        // 縮退はデータ不整合 (排出率 > 0 なのにバケットが空) として警告
        for outcome in drawn.iter().filter(|o| o.fallback) {
            log::warn!(
                "Data integrity: empty rarity bucket for gacha {}, fell back to {} (card {})",
                gacha.id,
                outcome.rarity,
                outcome.card.id
            );
        }

        // is_new: 所持カード集合 + バッチ内の既出カードとの突合
        let owned: HashSet<i64> = user_cards::Entity::find()
            .filter(user_cards::Column::UserId.eq(user_id))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|m| m.card_id)
            .collect();

        let is_new = assign_is_new(owned, &drawn);
        let costs = split_costs(total_cost, drawn.len());
        let records: Vec<DrawRecord> = drawn
            .iter()
            .zip(is_new)
            .zip(costs)
            .map(|((outcome, is_new), points_used)| DrawRecord {
                gacha_id: gacha.id,
                card_id: outcome.card.id,
                rarity: outcome.rarity,
                points_used,
                is_new,
            })
            .collect();

        let description = format!("{} x{}", gacha.name, request.draw_count);
        let receipt = self
            .point_service
            .debit_and_record(
                user_id,
                total_cost,
                &description,
                request.request_id,
                &records,
            )
            .await?;

        let mut statistics = RarityTally::default();
        let results: Vec<DrawOutcomeResponse> = drawn
            .iter()
            .zip(records.iter())
            .map(|(outcome, record)| {
                statistics.add(outcome.rarity);
                DrawOutcomeResponse {
                    card_id: outcome.card.id,
                    name: outcome.card.name.clone(),
                    rarity: outcome.rarity,
                    image_url: outcome.card.image_url.clone(),
                    is_new: record.is_new,
                }
            })
            .collect();

        Ok(GachaDrawResponse {
            results,
            remaining_points: receipt.new_balance,
            statistics,
        })
    }

    async fn find_active_gacha(&self, gacha_id: i64) -> AppResult<gachas::Model> {
        gachas::Entity::find_by_id(gacha_id)
            .filter(gachas::Column::IsActive.eq(true))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Gacha not found".to_string()))
    }

    /// 販売中カードをレアリティ別バケットに読み込む
    async fn load_items_by_rarity(&self, gacha_id: i64) -> AppResult<ItemsByRarity> {
        let list = cards::Entity::find()
            .filter(cards::Column::GachaId.eq(gacha_id))
            .filter(cards::Column::IsActive.eq(true))
            .all(&self.pool)
            .await?;

        let mut items = ItemsByRarity::new();
        for card in list {
            items.entry(card.rarity).or_default().push(card);
        }
        Ok(items)
    }
}

/// 所持カード集合と突合して各抽選結果の is_new を確定する。
/// 同一バッチで同じカードを複数引いた場合は最初の1枚のみ新規
fn assign_is_new(owned: HashSet<i64>, drawn: &[DrawnCard]) -> Vec<bool> {
    let mut seen = owned;
    drawn.iter().map(|o| seen.insert(o.card.id)).collect()
}

/// total_cost を count 行の履歴に配分する。割り切れない端数は
/// 先頭行から1ポイントずつ乗せ、合計を必ず total_cost に一致させる
fn split_costs(total_cost: i64, count: usize) -> Vec<i64> {
    let base = total_cost / count as i64;
    let remainder = (total_cost % count as i64) as usize;
    (0..count)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rarity;

    fn drawn(card_id: i64, rarity: Rarity) -> DrawnCard {
        DrawnCard {
            card: cards::Model {
                id: card_id,
                gacha_id: 1,
                name: format!("card-{card_id}"),
                rarity,
                image_url: None,
                is_active: true,
                created_at: None,
            },
            rarity,
            fallback: false,
        }
    }

    #[test]
    fn test_assign_is_new_dedupes_within_batch() {
        // 同一バッチで同じカードを2枚引いたら新規は最初の1枚だけ
        let batch = [
            drawn(1, Rarity::N),
            drawn(1, Rarity::N),
            drawn(2, Rarity::R),
        ];
        assert_eq!(
            assign_is_new(HashSet::new(), &batch),
            vec![true, false, true]
        );
    }

    #[test]
    fn test_assign_is_new_respects_owned_cards() {
        let owned: HashSet<i64> = [2].into_iter().collect();
        let batch = [drawn(2, Rarity::R), drawn(3, Rarity::Sr)];
        assert_eq!(assign_is_new(owned, &batch), vec![false, true]);
    }

    #[test]
    fn test_split_costs_sums_to_total() {
        // 10 で割り切れない ten_cost でも履歴の合計は減算額に一致する
        let costs = split_costs(1005, 10);
        assert_eq!(costs.len(), 10);
        assert_eq!(costs.iter().sum::<i64>(), 1005);
        assert_eq!(&costs[..5], &[101, 101, 101, 101, 101]);
        assert_eq!(&costs[5..], &[100, 100, 100, 100, 100]);
    }

    #[test]
    fn test_split_costs_even_division() {
        assert_eq!(split_costs(1000, 10), vec![100; 10]);
        assert_eq!(split_costs(100, 1), vec![100]);
    }
}
