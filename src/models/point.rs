use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::point_transaction_entity as transactions;

/// ポイント残高レスポンス
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PointBalanceResponse {
    pub points: i64,
}

/// 台帳履歴クエリパラメータ
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct PointHistoryQuery {
    /// ページ番号 (既定 1)
    pub page: Option<u32>,
    /// 1ページ件数 (既定 20)
    pub per_page: Option<u32>,
}

/// ポイント台帳エントリ (追記専用レコードの読み取りビュー)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PointTransactionResponse {
    pub id: i64,
    /// 符号付き変動量 (減算は負)
    pub amount: i64,
    /// 変動後残高
    pub balance_after: i64,
    pub transaction_type: String,
    pub description: Option<String>,
    pub request_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<transactions::Model> for PointTransactionResponse {
    fn from(m: transactions::Model) -> Self {
        PointTransactionResponse {
            id: m.id,
            amount: m.amount,
            balance_after: m.balance_after,
            transaction_type: m.transaction_type,
            description: m.description,
            request_id: m.request_id,
            created_at: m.created_at.unwrap_or_else(Utc::now),
        }
    }
}
