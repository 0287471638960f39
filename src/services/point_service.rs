use crate::entities::{
    draw_result_entity as draw_results, point_transaction_entity as transactions,
    user_card_entity as user_cards, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    PaginatedResponse, PaginationParams, PointHistoryQuery, PointTransactionResponse, Rarity,
};
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

/// ガチャ実行の消費を表す台帳種別
const TX_TYPE_GACHA_DRAW: &str = "gacha_draw";

/// 台帳に書き込む抽選1回分の入力
#[derive(Debug, Clone)]
pub struct DrawRecord {
    pub gacha_id: i64,
    pub card_id: i64,
    pub rarity: Rarity,
    pub points_used: i64,
    pub is_new: bool,
}

/// デビット完了後の確定結果
#[derive(Debug, Clone)]
pub struct DebitReceipt {
    pub new_balance: i64,
}

#[derive(Clone)]
pub struct PointService {
    pool: DatabaseConnection,
}

impl PointService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 現在のポイント残高
    pub async fn get_balance(&self, user_id: i64) -> AppResult<i64> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        Ok(user.points)
    }

    /// 台帳履歴 (ページング、新しい順)
    pub async fn list_transactions(
        &self,
        user_id: i64,
        query: &PointHistoryQuery,
    ) -> AppResult<PaginatedResponse<PointTransactionResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let base_query =
            transactions::Entity::find().filter(transactions::Column::UserId.eq(user_id));

        let total = base_query.clone().count(&self.pool).await? as i64;

        let items_models = base_query
            .order_by(transactions::Column::CreatedAt, Order::Desc)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(&self.pool)
            .await?;

        let items: Vec<PointTransactionResponse> =
            items_models.into_iter().map(Into::into).collect();

        Ok(PaginatedResponse::new(items, &params, total))
    }

    /// ポイント減算 + 台帳 + 抽選履歴を1トランザクションで確定する。
    ///
    /// 手順:
    /// 1. request_id があれば重複リクエストを拒否 (冪等トークン)
    /// 2. 条件付き UPDATE (points >= total_cost) で残高を原子的に減算。
    ///    同一ユーザーの並行リクエストは行レベルの比較減算で直列化され、
    ///    残高を超える二重成功は起こらない
    /// 3. 台帳 1 行 + 履歴 N 行 + 所持カードを追記
    /// 4. コミット。3〜4 の失敗は全体をロールバックし (減算も戻る)、
    ///    LedgerInconsistency として突合用 context 付きでログする
    pub async fn debit_and_record(
        &self,
        user_id: i64,
        total_cost: i64,
        description: &str,
        request_id: Option<Uuid>,
        records: &[DrawRecord],
    ) -> AppResult<DebitReceipt> {
        if total_cost <= 0 {
            return Err(AppError::ValidationError(
                "Debit amount must be positive".to_string(),
            ));
        }

        let txn = self.pool.begin().await?;

        // 冪等トークン: 既に処理済みのリクエストは変更なしで拒否
        if let Some(rid) = request_id {
            let duplicate = transactions::Entity::find()
                .filter(transactions::Column::RequestId.eq(rid))
                .one(&txn)
                .await?;
            if duplicate.is_some() {
                return Err(AppError::ValidationError(
                    "Duplicate request token".to_string(),
                ));
            }
        }

        // 残高の原子的減算 (compare-and-set)。
        // read-then-write ではなく WHERE 句で十分残高を要求する
        let update_result = users::Entity::update_many()
            .col_expr(
                users::Column::Points,
                Expr::col(users::Column::Points).sub(total_cost),
            )
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(user_id))
            .filter(users::Column::Points.gte(total_cost))
            .exec(&txn)
            .await?;

        if update_result.rows_affected == 0 {
            // 減算は行われていない。残高不足かユーザー不在かを区別する
            return match users::Entity::find_by_id(user_id).one(&txn).await? {
                Some(_) => Err(AppError::InsufficientPoints),
                None => Err(AppError::NotFound("User not found".to_string())),
            };
        }

        let user = users::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                self.ledger_inconsistency(
                    user_id,
                    total_cost,
                    records.len(),
                    "user row disappeared after debit",
                )
            })?;
        let new_balance = user.points;

        // ここから先の失敗は「減算済み・記録なし」になり得るため、
        // すべてロールバックした上で LedgerInconsistency として扱う
        self.write_ledger_and_history(
            &txn,
            user_id,
            total_cost,
            new_balance,
            description,
            request_id,
            records,
        )
        .await?;

        txn.commit().await.map_err(|e| {
            self.ledger_inconsistency(user_id, total_cost, records.len(), &e.to_string())
        })?;

        Ok(DebitReceipt { new_balance })
    }

    async fn write_ledger_and_history(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        total_cost: i64,
        new_balance: i64,
        description: &str,
        request_id: Option<Uuid>,
        records: &[DrawRecord],
    ) -> AppResult<()> {
        // 台帳は1リクエスト1行 (カード毎ではない)
        transactions::ActiveModel {
            user_id: Set(user_id),
            amount: Set(-total_cost),
            balance_after: Set(new_balance),
            transaction_type: Set(TX_TYPE_GACHA_DRAW.to_string()),
            description: Set(Some(description.to_string())),
            request_id: Set(request_id),
            ..Default::default()
        }
        .insert(txn)
        .await
        .map_err(|e| {
            self.classify_ledger_insert_err(user_id, total_cost, records.len(), request_id, e)
        })?;

        // 抽選履歴は単発1回につき1行
        for record in records {
            draw_results::ActiveModel {
                user_id: Set(user_id),
                gacha_id: Set(record.gacha_id),
                card_id: Set(record.card_id),
                rarity: Set(record.rarity),
                points_used: Set(record.points_used),
                is_new: Set(record.is_new),
                ..Default::default()
            }
            .insert(txn)
            .await
            .map_err(|e| {
                self.ledger_inconsistency(user_id, total_cost, records.len(), &e.to_string())
            })?;
        }

        // 所持カード集合の更新。並行リクエストと競合しても
        // 一意インデックス + DO NOTHING で安全に吸収する
        for record in records.iter().filter(|r| r.is_new) {
            let insert = user_cards::Entity::insert(user_cards::ActiveModel {
                user_id: Set(user_id),
                card_id: Set(record.card_id),
                ..Default::default()
            })
            .on_conflict(
                OnConflict::columns([user_cards::Column::UserId, user_cards::Column::CardId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec(txn)
            .await;

            match insert {
                Ok(_) => {}
                // 競合 = 既に所持済み。is_new の判定自体は抽選時点の読みで確定済み
                Err(DbErr::RecordNotInserted) => {}
                Err(e) => {
                    return Err(self.ledger_inconsistency(
                        user_id,
                        total_cost,
                        records.len(),
                        &e.to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// 台帳 insert の失敗を分類する。冪等トークンの一意制約違反は
    /// 事前チェックをすり抜けた並行の同一リクエストなので、
    /// 不整合ではなく重複リクエストとして拒否する
    fn classify_ledger_insert_err(
        &self,
        user_id: i64,
        total_cost: i64,
        entries: usize,
        request_id: Option<Uuid>,
        e: DbErr,
    ) -> AppError {
        if request_id.is_some()
            && matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
        {
            return AppError::ValidationError("Duplicate request token".to_string());
        }
        self.ledger_inconsistency(user_id, total_cost, entries, &e.to_string())
    }

    /// 減算成功後の記録失敗。ロールバックするが、通常の検証エラーとは
    /// 区別して全 context 付きでログし、外部突合を可能にする。
    fn ledger_inconsistency(
        &self,
        user_id: i64,
        amount: i64,
        entries: usize,
        cause: &str,
    ) -> AppError {
        log::error!(
            "Ledger inconsistency: debit succeeded but records failed, rolling back \
             (user_id={user_id}, amount={amount}, history_entries={entries}): {cause}"
        );
        AppError::LedgerInconsistency(format!(
            "user_id={user_id}, amount={amount}, history_entries={entries}"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> PointService {
        PointService::new(DatabaseConnection::Disconnected)
    }

    #[test]
    fn test_plain_ledger_failure_with_token_is_inconsistency() {
        // 一意制約違反でない insert 失敗は、トークン付きでも重複扱いにしない
        let err = service().classify_ledger_insert_err(
            1,
            1000,
            10,
            Some(Uuid::new_v4()),
            DbErr::Custom("connection reset".to_string()),
        );
        assert!(matches!(err, AppError::LedgerInconsistency(_)));
    }

    #[test]
    fn test_ledger_failure_without_token_is_inconsistency() {
        // トークンなしのリクエストに重複判定の経路はない
        let err = service().classify_ledger_insert_err(
            1,
            100,
            1,
            None,
            DbErr::RecordNotInserted,
        );
        assert!(matches!(err, AppError::LedgerInconsistency(_)));
    }
}
