use crate::entities::{
    draw_result_entity as draw_results, user_card_entity as user_cards, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::UserProfileResponse;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

#[derive(Clone)]
pub struct UserService {
    pool: DatabaseConnection,
}

impl UserService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// プロフィール (残高 + 抽選/コレクション統計)
    pub async fn get_profile(&self, user_id: i64) -> AppResult<UserProfileResponse> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let total_draws = draw_results::Entity::find()
            .filter(draw_results::Column::UserId.eq(user_id))
            .count(&self.pool)
            .await? as i64;

        let unique_cards = user_cards::Entity::find()
            .filter(user_cards::Column::UserId.eq(user_id))
            .count(&self.pool)
            .await? as i64;

        Ok(UserProfileResponse::from_parts(
            user,
            total_draws,
            unique_cards,
        ))
    }
}
