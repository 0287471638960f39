use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::entities::user_entity as users;

/// プロフィール (残高とコレクション統計付き)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserProfileResponse {
    pub id: i64,
    pub username: String,
    pub points: i64,
    /// 累計抽選回数
    pub total_draws: i64,
    /// 所持カード種類数
    pub unique_cards: i64,
    pub created_at: DateTime<Utc>,
}

impl UserProfileResponse {
    pub fn from_parts(user: users::Model, total_draws: i64, unique_cards: i64) -> Self {
        UserProfileResponse {
            id: user.id,
            username: user.username,
            points: user.points,
            total_draws,
            unique_cards,
            created_at: user.created_at.unwrap_or_else(Utc::now),
        }
    }
}
