use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local;
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use oripa_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::{GachaService, PointService, UserService},
    swagger::swagger_config,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 設定読み込み
    let config = Config::from_toml().expect("Failed to load configuration file");

    // DB 接続プール
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // マイグレーション
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // JWT 検証サービス
    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.access_token_expires_in);

    // ドメインサービス
    let user_service = UserService::new(pool.clone());
    let point_service = PointService::new(pool.clone());
    let gacha_service = GachaService::new(pool.clone(), point_service.clone());

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(point_service.clone()))
            .app_data(web::Data::new(gacha_service.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::gacha_config)
                    .configure(handlers::point_config)
                    .configure(handlers::user_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
