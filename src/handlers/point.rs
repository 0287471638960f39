use crate::models::*;
use crate::services::PointService;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};

fn get_user_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<i64>().copied()
}

#[utoipa::path(
    get,
    path = "/points/balance",
    tag = "points",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "残高の取得成功", body = PointBalanceResponse),
        (status = 401, description = "未認証")
    )
)]
/// 現在のポイント残高を返す
pub async fn get_balance(
    service: web::Data<PointService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    match service.get_balance(user_id).await {
        Ok(points) => Ok(HttpResponse::Ok().json(ApiResponse::success(PointBalanceResponse {
            points,
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/points/history",
    tag = "points",
    params(
        ("page" = Option<u32>, Query, description = "ページ番号 (既定1)"),
        ("per_page" = Option<u32>, Query, description = "1ページ件数 (既定20)")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "台帳履歴の取得成功", body = PointTransactionPageResponse),
        (status = 401, description = "未認証")
    )
)]
/// ポイント台帳の履歴をページングで返す (新しい順)
pub async fn get_history(
    service: web::Data<PointService>,
    req: HttpRequest,
    query: web::Query<PointHistoryQuery>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    match service.list_transactions(user_id, &query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

/// ルーティング設定
pub fn point_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/points")
            .route("/balance", web::get().to(get_balance))
            .route("/history", web::get().to(get_history)),
    );
}
