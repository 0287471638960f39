use crate::models::*;
use crate::services::UserService;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};

fn get_user_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<i64>().copied()
}

#[utoipa::path(
    get,
    path = "/users/profile",
    tag = "users",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "プロフィールの取得成功", body = UserProfileResponse),
        (status = 401, description = "未認証"),
        (status = 404, description = "ユーザーが存在しない")
    )
)]
/// プロフィール (残高・累計抽選回数・所持カード種類数) を返す
pub async fn get_profile(
    service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    match service.get_profile(user_id).await {
        Ok(profile) => Ok(HttpResponse::Ok().json(ApiResponse::success(profile))),
        Err(e) => Ok(e.error_response()),
    }
}

/// ルーティング設定
pub fn user_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/users").route("/profile", web::get().to(get_profile)));
}
