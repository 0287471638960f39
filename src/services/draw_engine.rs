use std::collections::HashMap;

use thiserror::Error;

use crate::entities::card_entity as cards;
use crate::models::Rarity;

/// 排出率合計の許容誤差
pub const RATE_SUM_EPSILON: f64 = 1e-9;

#[derive(Error, Debug)]
pub enum DrawError {
    /// 排出率の合計が 1.0 でない (設定エラー。再正規化はしない)
    #[error("rate table weights sum to {0}, expected 1.0")]
    InvalidRateTable(f64),

    /// 全レアリティのバケットが空 (リクエスト全体を中断、課金なし)
    #[error("no cards available in any rarity bucket")]
    CatalogExhausted,
}

/// レアリティ別排出率テーブル。ガチャ商品1バージョンごとに不変。
#[derive(Debug, Clone, Copy)]
pub struct RateTable {
    pub ssr: f64,
    pub sr: f64,
    pub r: f64,
    pub n: f64,
}

impl RateTable {
    pub fn weight(&self, rarity: Rarity) -> f64 {
        match rarity {
            Rarity::Ssr => self.ssr,
            Rarity::Sr => self.sr,
            Rarity::R => self.r,
            Rarity::N => self.n,
        }
    }

    /// 合計 1.0 ± 1e-9 を検証する。違反は設定エラーであり、
    /// 黙って補正せず必ず呼び出し元に返す。
    pub fn validate(&self) -> Result<(), DrawError> {
        let sum = self.ssr + self.sr + self.r + self.n;
        if (sum - 1.0).abs() > RATE_SUM_EPSILON {
            return Err(DrawError::InvalidRateTable(sum));
        }
        Ok(())
    }
}

/// 乱数源。テストでは決定的な数列を注入する。
pub trait RandomSource {
    /// [0, 1) の一様乱数を返す
    fn next(&mut self) -> f64;
}

/// 本番用 (スレッドローカル RNG)
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next(&mut self) -> f64 {
        rand::random::<f64>()
    }
}

/// レアリティ別カードバケット
pub type ItemsByRarity = HashMap<Rarity, Vec<cards::Model>>;

/// 抽選1回分の結果
#[derive(Debug, Clone)]
pub struct DrawnCard {
    pub card: cards::Model,
    pub rarity: Rarity,
    /// 抽選したレアリティのバケットが空で下位レアリティに縮退した場合 true。
    /// 呼び出し元はデータ不整合として警告ログを出すこと。
    pub fallback: bool,
}

/// 1回抽選する。
///
/// - floor 指定なし: SSR → SR → R → N の順に累積和を取り、
///   累積和 >= u となる最初のレアリティを選ぶ (同値は上位側に倒れる)
/// - floor 指定あり (10連保証枠): floor 以上のレアリティだけを対象に
///   相対重みで再スケールして抽選する
/// - 選ばれたレアリティのバケットが空なら最下位の非空バケットへ縮退
///   (fallback フラグで通知)。全バケットが空なら CatalogExhausted
pub fn draw_one(
    table: &RateTable,
    items: &ItemsByRarity,
    floor: Option<Rarity>,
    rng: &mut dyn RandomSource,
) -> Result<DrawnCard, DrawError> {
    table.validate()?;

    let sampled = sample_rarity(table, floor, rng.next());

    let (rarity, fallback) = match bucket_of(items, sampled) {
        Some(_) => (sampled, false),
        None => {
            let lowest = lowest_non_empty(items).ok_or(DrawError::CatalogExhausted)?;
            (lowest, true)
        }
    };

    // 縮退後は必ず非空
    let bucket = &items[&rarity];
    let idx = ((rng.next() * bucket.len() as f64) as usize).min(bucket.len() - 1);

    Ok(DrawnCard {
        card: bucket[idx].clone(),
        rarity,
        fallback,
    })
}

/// count 回抽選する。
///
/// count == 10 かつ guarantee_floor がある場合、1〜9回目の結果を検査し、
/// どれも floor に届いていなければ10回目だけ floor 制限付きで抽選する
/// (事後的な上書きであり、独立した確率チャネルではない)。
/// count == 1 では floor は適用しない。
pub fn draw_many(
    table: &RateTable,
    items: &ItemsByRarity,
    count: usize,
    guarantee_floor: Option<Rarity>,
    rng: &mut dyn RandomSource,
) -> Result<Vec<DrawnCard>, DrawError> {
    table.validate()?;

    let mut outcomes = Vec::with_capacity(count);
    for i in 0..count {
        let floor = if count == 10 && i == 9 {
            guarantee_floor.filter(|f| needs_guarantee(&outcomes, *f))
        } else {
            None
        };
        outcomes.push(draw_one(table, items, floor, rng)?);
    }
    Ok(outcomes)
}

/// 既出の結果に floor 以上が1枚も無ければ true (保証枠の発動条件)
pub fn needs_guarantee(outcomes: &[DrawnCard], floor: Rarity) -> bool {
    !outcomes.iter().any(|o| o.rarity >= floor)
}

/// u からレアリティを決める。floor があれば対象を floor 以上に絞り、
/// その部分集合の重み合計で再スケールする。
fn sample_rarity(table: &RateTable, floor: Option<Rarity>, u: f64) -> Rarity {
    let candidates: Vec<Rarity> = Rarity::DESC
        .iter()
        .copied()
        .filter(|r| floor.is_none_or(|f| *r >= f))
        .collect();

    // 候補は floor 自身を必ず含むため空にならない
    let lowest = candidates.last().copied().unwrap_or(Rarity::N);

    let total: f64 = candidates.iter().map(|r| table.weight(*r)).sum();
    if total <= f64::EPSILON {
        // floor 以上の重みが全て 0 の設定。最下位の候補 (= floor) に倒す
        return lowest;
    }

    let mut acc = 0.0;
    for r in &candidates {
        acc += table.weight(*r) / total;
        if acc >= u {
            return *r;
        }
    }
    // 丸め誤差で u に届かなかった場合は最下位
    lowest
}

fn bucket_of(items: &ItemsByRarity, rarity: Rarity) -> Option<&Vec<cards::Model>> {
    items.get(&rarity).filter(|b| !b.is_empty())
}

/// 最下位の非空レアリティ (N → R → SR → SSR の順で探す)
fn lowest_non_empty(items: &ItemsByRarity) -> Option<Rarity> {
    Rarity::DESC
        .iter()
        .rev()
        .copied()
        .find(|r| bucket_of(items, *r).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 決定的な乱数列 (使い切ったら末尾を繰り返す)
    struct SeqRandom {
        values: Vec<f64>,
        pos: usize,
    }

    impl SeqRandom {
        fn new(values: Vec<f64>) -> Self {
            Self { values, pos: 0 }
        }
    }

    impl RandomSource for SeqRandom {
        fn next(&mut self) -> f64 {
            let v = self.values[self.pos.min(self.values.len() - 1)];
            self.pos += 1;
            v
        }
    }

    fn standard_table() -> RateTable {
        RateTable {
            ssr: 0.03,
            sr: 0.12,
            r: 0.35,
            n: 0.50,
        }
    }

    fn card(id: i64, rarity: Rarity) -> cards::Model {
        cards::Model {
            id,
            gacha_id: 1,
            name: format!("card-{id}"),
            rarity,
            image_url: None,
            is_active: true,
            created_at: None,
        }
    }

    fn full_catalog() -> ItemsByRarity {
        let mut items = ItemsByRarity::new();
        items.insert(Rarity::Ssr, vec![card(1, Rarity::Ssr)]);
        items.insert(Rarity::Sr, vec![card(2, Rarity::Sr)]);
        items.insert(Rarity::R, vec![card(3, Rarity::R)]);
        items.insert(Rarity::N, vec![card(4, Rarity::N)]);
        items
    }

    #[test]
    fn test_rate_table_validation() {
        assert!(standard_table().validate().is_ok());

        let bad = RateTable {
            ssr: 0.03,
            sr: 0.12,
            r: 0.35,
            n: 0.49,
        };
        assert!(matches!(
            bad.validate(),
            Err(DrawError::InvalidRateTable(_))
        ));

        // 1e-9 以内のずれは許容
        let near = RateTable {
            ssr: 0.03,
            sr: 0.12,
            r: 0.35,
            n: 0.50 + 5e-10,
        };
        assert!(near.validate().is_ok());
    }

    #[test]
    fn test_draw_one_is_deterministic_over_cumulative_sums() {
        let table = standard_table();
        let items = full_catalog();

        // (レアリティ用 u, 期待レアリティ)。カード選択用 u は 0.0 固定
        let cases = [
            (0.01, Rarity::Ssr),
            (0.03, Rarity::Ssr), // 累積和と同値は上位側
            (0.10, Rarity::Sr),
            (0.15, Rarity::Sr),
            (0.40, Rarity::R),
            (0.50, Rarity::R),
            (0.51, Rarity::N),
            (0.999, Rarity::N),
        ];

        for (u, expected) in cases {
            let mut rng = SeqRandom::new(vec![u, 0.0]);
            let drawn = draw_one(&table, &items, None, &mut rng).unwrap();
            assert_eq!(drawn.rarity, expected, "u = {u}");
            assert!(!drawn.fallback);
        }
    }

    #[test]
    fn test_draw_one_rejects_invalid_table() {
        let bad = RateTable {
            ssr: 0.5,
            sr: 0.5,
            r: 0.5,
            n: 0.5,
        };
        let mut rng = SeqRandom::new(vec![0.5]);
        assert!(matches!(
            draw_one(&bad, &full_catalog(), None, &mut rng),
            Err(DrawError::InvalidRateTable(_))
        ));
    }

    #[test]
    fn test_floor_restricts_and_rescales() {
        let table = standard_table();
        let items = full_catalog();

        // SR 保証: 対象は SSR(0.03) と SR(0.12)、合計 0.15 で再スケール
        // SSR の再スケール後の区間は [0, 0.2]
        let mut rng = SeqRandom::new(vec![0.19, 0.0]);
        let drawn = draw_one(&table, &items, Some(Rarity::Sr), &mut rng).unwrap();
        assert_eq!(drawn.rarity, Rarity::Ssr);

        let mut rng = SeqRandom::new(vec![0.21, 0.0]);
        let drawn = draw_one(&table, &items, Some(Rarity::Sr), &mut rng).unwrap();
        assert_eq!(drawn.rarity, Rarity::Sr);

        // floor がある限り N/R には絶対に落ちない
        let mut rng = SeqRandom::new(vec![0.999999, 0.0]);
        let drawn = draw_one(&table, &items, Some(Rarity::Sr), &mut rng).unwrap();
        assert!(drawn.rarity >= Rarity::Sr);
    }

    #[test]
    fn test_ten_draw_guarantee_forces_tenth() {
        let table = standard_table();
        let items = full_catalog();

        // 1〜9回目は u=0.99 で全部 N、10回目は保証枠で u=0.5 → SR
        let mut values = Vec::new();
        for _ in 0..9 {
            values.extend([0.99, 0.0]);
        }
        values.extend([0.5, 0.0]);
        let mut rng = SeqRandom::new(values);

        let outcomes = draw_many(&table, &items, 10, Some(Rarity::Sr), &mut rng).unwrap();
        assert_eq!(outcomes.len(), 10);
        for o in &outcomes[..9] {
            assert_eq!(o.rarity, Rarity::N);
        }
        assert!(outcomes[9].rarity >= Rarity::Sr);
        // バッチ全体として保証が満たされている
        assert!(!needs_guarantee(&outcomes, Rarity::Sr));
    }

    #[test]
    fn test_guarantee_not_applied_when_already_met() {
        let table = standard_table();
        let items = full_catalog();

        // 1回目に SSR (u=0.01)、以降 u=0.99 なら10回目も素の抽選で N
        let mut values = vec![0.01, 0.0];
        for _ in 0..9 {
            values.extend([0.99, 0.0]);
        }
        let mut rng = SeqRandom::new(values);

        let outcomes = draw_many(&table, &items, 10, Some(Rarity::Sr), &mut rng).unwrap();
        assert_eq!(outcomes[0].rarity, Rarity::Ssr);
        assert_eq!(outcomes[9].rarity, Rarity::N);
    }

    #[test]
    fn test_single_draw_never_applies_floor() {
        let table = standard_table();
        let items = full_catalog();

        let mut rng = SeqRandom::new(vec![0.99, 0.0]);
        let outcomes = draw_many(&table, &items, 1, Some(Rarity::Sr), &mut rng).unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].rarity, Rarity::N);
    }

    #[test]
    fn test_empty_bucket_falls_back_to_lowest_non_empty() {
        let table = standard_table();
        let mut items = full_catalog();
        items.insert(Rarity::Ssr, vec![]); // SSR 在庫切れ

        // u=0.01 は SSR 区間だが、縮退して N (最下位の非空) になる
        let mut rng = SeqRandom::new(vec![0.01, 0.0]);
        let drawn = draw_one(&table, &items, None, &mut rng).unwrap();
        assert_eq!(drawn.rarity, Rarity::N);
        assert!(drawn.fallback);
    }

    #[test]
    fn test_all_buckets_empty_is_catalog_exhausted() {
        let table = standard_table();
        let items = ItemsByRarity::new();

        let mut rng = SeqRandom::new(vec![0.5, 0.0]);
        assert!(matches!(
            draw_one(&table, &items, None, &mut rng),
            Err(DrawError::CatalogExhausted)
        ));
    }

    #[test]
    fn test_card_choice_is_uniform_over_bucket() {
        let table = standard_table();
        let mut items = full_catalog();
        items.insert(
            Rarity::N,
            vec![card(10, Rarity::N), card(11, Rarity::N), card(12, Rarity::N)],
        );

        let mut rng = SeqRandom::new(vec![0.99, 0.0]);
        assert_eq!(draw_one(&table, &items, None, &mut rng).unwrap().card.id, 10);

        let mut rng = SeqRandom::new(vec![0.99, 0.5]);
        assert_eq!(draw_one(&table, &items, None, &mut rng).unwrap().card.id, 11);

        // u = 0.999… でも配列範囲内に丸める
        let mut rng = SeqRandom::new(vec![0.99, 0.9999999]);
        assert_eq!(draw_one(&table, &items, None, &mut rng).unwrap().card.id, 12);
    }

    #[test]
    fn test_needs_guarantee() {
        let n = DrawnCard {
            card: card(4, Rarity::N),
            rarity: Rarity::N,
            fallback: false,
        };
        let sr = DrawnCard {
            card: card(2, Rarity::Sr),
            rarity: Rarity::Sr,
            fallback: false,
        };
        let ssr = DrawnCard {
            card: card(1, Rarity::Ssr),
            rarity: Rarity::Ssr,
            fallback: false,
        };

        assert!(needs_guarantee(&[n.clone(), n.clone()], Rarity::Sr));
        // floor ちょうども floor 超えも保証済み扱い
        assert!(!needs_guarantee(&[n.clone(), sr], Rarity::Sr));
        assert!(!needs_guarantee(&[n, ssr], Rarity::Sr));
        assert!(needs_guarantee(&[], Rarity::Sr));
    }

    #[test]
    fn test_same_sequence_reproduces_same_outcomes() {
        let table = standard_table();
        let items = full_catalog();
        let seq = vec![
            0.02, 0.3, 0.44, 0.7, 0.9, 0.1, 0.13, 0.6, 0.77, 0.2, 0.05, 0.5,
        ];

        let mut rng_a = SeqRandom::new(seq.clone());
        let mut rng_b = SeqRandom::new(seq);
        let a = draw_many(&table, &items, 6, None, &mut rng_a).unwrap();
        let b = draw_many(&table, &items, 6, None, &mut rng_b).unwrap();

        let ids_a: Vec<i64> = a.iter().map(|o| o.card.id).collect();
        let ids_b: Vec<i64> = b.iter().map(|o| o.card.id).collect();
        assert_eq!(ids_a, ids_b);
    }
}
