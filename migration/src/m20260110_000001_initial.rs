use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

/// Users (ユーザーとポイント残高)
/// points はシステム内で唯一の共有可変カラム。
/// 更新は point_service の条件付き UPDATE (points >= cost) のみ。
#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Points,
    CreatedAt,
    UpdatedAt,
}

/// Gachas (オリパ商品設定)
/// 各レアリティの排出率は小数 (合計 1.0 必須、アプリ側で検証)。
#[derive(DeriveIden)]
enum Gachas {
    Table,
    Id,
    Name,
    Description,
    UnitCost,
    TenCost,
    GuaranteeFloor,
    SsrRate,
    SrRate,
    RRate,
    NRate,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

/// Cards (カードカタログ)
#[derive(DeriveIden)]
enum Cards {
    Table,
    Id,
    GachaId,
    Name,
    Rarity,
    ImageUrl,
    IsActive,
    CreatedAt,
}

/// PointTransactions (ポイント台帳、追記専用)
/// request_id はデビット書き込みの冪等トークン (UNIQUE)。
#[derive(DeriveIden)]
enum PointTransactions {
    Table,
    Id,
    UserId,
    Amount,
    BalanceAfter,
    TransactionType,
    Description,
    RequestId,
    CreatedAt,
}

/// DrawResults (抽選履歴、1回の単発抽選につき1行)
#[derive(DeriveIden)]
enum DrawResults {
    Table,
    Id,
    UserId,
    GachaId,
    CardId,
    Rarity,
    PointsUsed,
    IsNew,
    CreatedAt,
}

/// UserCards (所持カード集合、is_new 判定の根拠)
#[derive(DeriveIden)]
enum UserCards {
    Table,
    Id,
    UserId,
    CardId,
    ObtainedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ユーザー表
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Username).string().not_null())
                    .col(
                        ColumnDef::new(Users::Points)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 残高が負にならないことを DB レベルでも保証する
        manager
            .get_connection()
            .execute_unprepared(
                "ALTER TABLE users ADD CONSTRAINT chk_users_points_non_negative CHECK (points >= 0)",
            )
            .await?;

        // ガチャ商品表
        manager
            .create_table(
                Table::create()
                    .table(Gachas::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Gachas::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Gachas::Name).string().not_null())
                    .col(ColumnDef::new(Gachas::Description).string())
                    .col(ColumnDef::new(Gachas::UnitCost).big_integer().not_null())
                    .col(ColumnDef::new(Gachas::TenCost).big_integer().not_null())
                    .col(ColumnDef::new(Gachas::GuaranteeFloor).string_len(8))
                    .col(ColumnDef::new(Gachas::SsrRate).double().not_null())
                    .col(ColumnDef::new(Gachas::SrRate).double().not_null())
                    .col(ColumnDef::new(Gachas::RRate).double().not_null())
                    .col(ColumnDef::new(Gachas::NRate).double().not_null())
                    .col(
                        ColumnDef::new(Gachas::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Gachas::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Gachas::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // カード表
        manager
            .create_table(
                Table::create()
                    .table(Cards::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Cards::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Cards::GachaId).big_integer().not_null())
                    .col(ColumnDef::new(Cards::Name).string().not_null())
                    .col(ColumnDef::new(Cards::Rarity).string_len(8).not_null())
                    .col(ColumnDef::new(Cards::ImageUrl).string())
                    .col(
                        ColumnDef::new(Cards::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Cards::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_cards_gacha_rarity")
                    .table(Cards::Table)
                    .col(Cards::GachaId)
                    .col(Cards::Rarity)
                    .to_owned(),
            )
            .await?;

        // ポイント台帳
        manager
            .create_table(
                Table::create()
                    .table(PointTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PointTransactions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PointTransactions::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PointTransactions::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PointTransactions::BalanceAfter)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PointTransactions::TransactionType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PointTransactions::Description).string())
                    .col(ColumnDef::new(PointTransactions::RequestId).uuid())
                    .col(
                        ColumnDef::new(PointTransactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_point_transactions_user")
                    .table(PointTransactions::Table)
                    .col(PointTransactions::UserId)
                    .to_owned(),
            )
            .await?;

        // 冪等トークンの一意性 (NULL は重複可)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_point_transactions_request_unique")
                    .table(PointTransactions::Table)
                    .col(PointTransactions::RequestId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 抽選履歴
        manager
            .create_table(
                Table::create()
                    .table(DrawResults::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DrawResults::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DrawResults::UserId).big_integer().not_null())
                    .col(
                        ColumnDef::new(DrawResults::GachaId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DrawResults::CardId).big_integer().not_null())
                    .col(ColumnDef::new(DrawResults::Rarity).string_len(8).not_null())
                    .col(
                        ColumnDef::new(DrawResults::PointsUsed)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DrawResults::IsNew)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(DrawResults::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_draw_results_user")
                    .table(DrawResults::Table)
                    .col(DrawResults::UserId)
                    .to_owned(),
            )
            .await?;

        // 所持カード
        manager
            .create_table(
                Table::create()
                    .table(UserCards::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserCards::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserCards::UserId).big_integer().not_null())
                    .col(ColumnDef::new(UserCards::CardId).big_integer().not_null())
                    .col(
                        ColumnDef::new(UserCards::ObtainedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 1ユーザー1カード1行 (ON CONFLICT DO NOTHING の対象)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_cards_user_card_unique")
                    .table(UserCards::Table)
                    .col(UserCards::UserId)
                    .col(UserCards::CardId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserCards::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DrawResults::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PointTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cards::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Gachas::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
