use actix_cors::Cors;

pub fn create_cors() -> Cors {
    Cors::default()
        .allowed_origin_fn(|_, _req_head| {
            // 本番では配信ドメインに限定すること
            true
        })
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        // フロントの独自ヘッダでプリフライトが落ちないよう緩める
        .allow_any_header()
        .supports_credentials()
        .max_age(3600)
}
