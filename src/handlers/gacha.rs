use crate::models::*;
use crate::services::GachaService;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};

/// 認証ミドルウェアが注入したユーザーIDを取り出す
fn get_user_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<i64>().copied()
}

#[utoipa::path(
    get,
    path = "/gacha",
    tag = "gacha",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "販売中ガチャ一覧の取得成功", body = [GachaResponse]),
        (status = 401, description = "未認証")
    )
)]
/// 販売中のガチャ一覧を返す (排出率は常に公開)
pub async fn get_gachas(service: web::Data<GachaService>) -> Result<HttpResponse> {
    match service.list_gachas().await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/gacha/{id}",
    tag = "gacha",
    params(
        ("id" = i64, Path, description = "ガチャID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "ガチャ詳細の取得成功", body = GachaDetailResponse),
        (status = 401, description = "未認証"),
        (status = 404, description = "ガチャが存在しないか販売停止")
    )
)]
/// ガチャ詳細を返す (排出カードのカタログ込み)
pub async fn get_gacha(
    service: web::Data<GachaService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match service.get_gacha(path.into_inner()).await {
        Ok(gacha) => Ok(HttpResponse::Ok().json(ApiResponse::success(gacha))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/gacha/history",
    tag = "gacha",
    params(
        ("page" = Option<u32>, Query, description = "ページ番号 (既定1)"),
        ("per_page" = Option<u32>, Query, description = "1ページ件数 (既定20)")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "抽選履歴の取得成功", body = DrawResultPageResponse),
        (status = 401, description = "未認証")
    )
)]
/// 自分の抽選履歴をページングで返す (新しい順)
pub async fn get_draw_history(
    service: web::Data<GachaService>,
    req: HttpRequest,
    query: web::Query<DrawHistoryQuery>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    match service.list_draw_history(user_id, &query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/gacha/execute",
    tag = "gacha",
    request_body = GachaDrawRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "ガチャ実行成功", body = GachaDrawResponse),
        (status = 400, description = "draw_count 不正または重複リクエスト"),
        (status = 401, description = "未認証"),
        (status = 402, description = "ポイント残高不足"),
        (status = 404, description = "ガチャが存在しないか販売停止"),
        (status = 500, description = "カタログ欠損・排出率設定・台帳の障害")
    )
)]
/// ガチャを実行する:
/// 1. draw_count (1 か 10) と販売状態を検証
/// 2. 排出率テーブルで抽選、10連は最低レアリティ保証を適用
/// 3. ポイント減算 + 台帳 + 履歴を1トランザクションで確定
/// 4. 結果・残高・レアリティ集計を返す (失敗時に部分結果は返さない)
pub async fn execute(
    service: web::Data<GachaService>,
    req: HttpRequest,
    body: web::Json<GachaDrawRequest>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    match service.execute_draw(user_id, &body.into_inner()).await {
        Ok(result) => Ok(HttpResponse::Ok().json(ApiResponse::success(result))),
        Err(e) => Ok(e.error_response()),
    }
}

/// ルーティング設定
/// `/history` と `/execute` は `/{id}` より先に登録する
pub fn gacha_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/gacha")
            .route("/history", web::get().to(get_draw_history))
            .route("/execute", web::post().to(execute))
            .route("/{id}", web::get().to(get_gacha))
            .route("", web::get().to(get_gachas)),
    );
}
