use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::gacha::get_gachas,
        handlers::gacha::get_gacha,
        handlers::gacha::get_draw_history,
        handlers::gacha::execute,
        handlers::point::get_balance,
        handlers::point::get_history,
        handlers::user::get_profile,
    ),
    components(
        schemas(
            Rarity,
            GachaResponse,
            GachaDetailResponse,
            GachaDrawRequest,
            GachaDrawResponse,
            DrawOutcomeResponse,
            DrawResultResponse,
            DrawHistoryQuery,
            RarityTally,
            CardResponse,
            PointBalanceResponse,
            PointTransactionResponse,
            PointHistoryQuery,
            UserProfileResponse,
            ApiError,
            PaginationInfo,
            DrawResultPageResponse,
            PointTransactionPageResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "gacha", description = "オリパ抽選 API"),
        (name = "points", description = "ポイント残高・台帳 API"),
        (name = "users", description = "ユーザー API")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );
}
