use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Gachas {
    Table,
    Name,
    Description,
    UnitCost,
    TenCost,
    GuaranteeFloor,
    SsrRate,
    SrRate,
    RRate,
    NRate,
}

#[derive(DeriveIden)]
enum Cards {
    Table,
    GachaId,
    Name,
    Rarity,
    ImageUrl,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Username,
    Points,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 初期オリパ「スタンダードオリパ Vol.1」の投入。
/// 排出率は景品表示用に公開する値と同一 (合計 1.0):
/// - SSR 3%  / SR 12% / R 35% / N 50%
/// - 単発 100pt、10連 1000pt、10連は SR 以上確定
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .exec_stmt(
                Query::insert()
                    .into_table(Gachas::Table)
                    .columns([
                        Gachas::Name,
                        Gachas::Description,
                        Gachas::UnitCost,
                        Gachas::TenCost,
                        Gachas::GuaranteeFloor,
                        Gachas::SsrRate,
                        Gachas::SrRate,
                        Gachas::RRate,
                        Gachas::NRate,
                    ])
                    .values_panic([
                        "スタンダードオリパ Vol.1".into(),
                        "SR以上確定の10連ガチャ".into(),
                        100i64.into(),
                        1000i64.into(),
                        "SR".into(),
                        0.03f64.into(),
                        0.12f64.into(),
                        0.35f64.into(),
                        0.50f64.into(),
                    ])
                    .to_owned(),
            )
            .await?;

        // カード初期データ (gacha_id = 1 前提、初期投入専用)
        let cards: &[(&str, &str)] = &[
            ("リザードン SAR", "SSR"),
            ("ピカチュウ AR", "SSR"),
            ("ミュウツー SR", "SR"),
            ("ギャラドス SR", "SR"),
            ("イーブイ SR", "SR"),
            ("フシギバナ R", "R"),
            ("カメックス R", "R"),
            ("ゲンガー R", "R"),
            ("カイリュー R", "R"),
            ("コダック", "N"),
            ("ポッポ", "N"),
            ("コラッタ", "N"),
            ("キャタピー", "N"),
            ("ディグダ", "N"),
            ("コイキング", "N"),
        ];

        for (name, rarity) in cards {
            manager
                .exec_stmt(
                    Query::insert()
                        .into_table(Cards::Table)
                        .columns([Cards::GachaId, Cards::Name, Cards::Rarity, Cards::ImageUrl])
                        .values_panic([
                            1i64.into(),
                            (*name).into(),
                            (*rarity).into(),
                            Option::<String>::None.into(),
                        ])
                        .to_owned(),
                )
                .await?;
        }

        // 開発用ユーザー (ポイント購入フローは対象外のため初期残高を持たせる)
        manager
            .exec_stmt(
                Query::insert()
                    .into_table(Users::Table)
                    .columns([Users::Username, Users::Points])
                    .values_panic(["demo".into(), 10_000i64.into()])
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .exec_stmt(
                Query::delete()
                    .from_table(Users::Table)
                    .and_where(Expr::col(Users::Username).eq("demo"))
                    .to_owned(),
            )
            .await?;
        manager
            .exec_stmt(
                Query::delete()
                    .from_table(Cards::Table)
                    .and_where(Expr::col(Cards::GachaId).eq(1i64))
                    .to_owned(),
            )
            .await?;
        manager
            .exec_stmt(
                Query::delete()
                    .from_table(Gachas::Table)
                    .and_where(Expr::col(Gachas::Name).eq("スタンダードオリパ Vol.1"))
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
