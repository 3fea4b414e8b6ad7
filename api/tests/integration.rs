use std::{collections::HashMap, net::SocketAddr, sync::Arc, time::Duration};

use api::{
    app::build_router,
    config::AppConfig,
    rate_limiter::AuthLimiter,
    repositories::{PostgresHoldingRepository, PostgresUserRepository},
    state::AppState,
};
use auth::{AuthConfig, PasswordAuthService};
use axum::{
    Router,
    body::{Body, to_bytes},
    extract::connect_info::ConnectInfo,
    http::{HeaderValue, Request, StatusCode},
};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;
use valuation::StaticPriceOracle;
use yield_engine::{
    FixtureYieldSource, InMemoryYieldCache, RiskCeilings, YieldAggregator, YieldSource, PROTOCOLS,
};

fn test_config(database_url: String) -> AppConfig {
    AppConfig {
        database_url,
        coingecko_api_base: "https://api.coingecko.com/api/v3".to_string(),
        yield_api_base: "https://yields.llama.fi".to_string(),
        jwt_secret: "dev-secret".to_string(),
        jwt_audience: "coinfolio".to_string(),
        jwt_issuer: "coinfolio-api".to_string(),
        access_token_ttl: Duration::from_secs(3600),
        free_tier_holding_limit: 5,
        price_http_timeout: Duration::from_secs(10),
        yield_http_timeout: Duration::from_secs(15),
        yield_cache_ttl: Duration::from_secs(900),
        risk_ceilings: RiskCeilings::default(),
        auth_throttle_window: Duration::ZERO,
        frontend_origins: vec!["http://localhost:3000".to_string()],
        redis_url: None,
        port: 0,
    }
}

async fn test_state(pool: PgPool, prices: Vec<(&str, f64)>) -> AppState {
    let config = test_config(std::env::var("DATABASE_URL").unwrap_or_default());
    let auth_service = PasswordAuthService::new(
        AuthConfig {
            jwt_secret: config.jwt_secret.clone(),
            jwt_audience: config.jwt_audience.clone(),
            jwt_issuer: config.jwt_issuer.clone(),
            access_token_ttl: chrono::Duration::hours(1),
        },
        pool.clone(),
    );

    let oracle = StaticPriceOracle::new(
        prices
            .into_iter()
            .map(|(id, price)| (id.to_string(), price))
            .collect::<HashMap<_, _>>(),
    );

    let sources: Vec<Arc<dyn YieldSource>> = PROTOCOLS
        .iter()
        .map(|(slug, _)| Arc::new(FixtureYieldSource::new(*slug)) as Arc<dyn YieldSource>)
        .collect();
    let yields = YieldAggregator::new(
        sources,
        Arc::new(InMemoryYieldCache::new()),
        config.yield_cache_ttl,
        config.risk_ceilings,
    );

    AppState {
        config,
        db: pool.clone(),
        auth: Arc::new(auth_service),
        oracle: Arc::new(oracle),
        yields: Arc::new(yields),
        user_repo: Arc::new(PostgresUserRepository::new(pool.clone())),
        holding_repo: Arc::new(PostgresHoldingRepository::new(pool)),
        auth_limiter: Arc::new(
            AuthLimiter::new(Duration::ZERO, None)
                .await
                .expect("auth limiter"),
        ),
    }
}

fn test_router(state: AppState) -> Router {
    build_router(
        state,
        vec![HeaderValue::from_static("http://localhost:3000")],
    )
}

fn json_request(uri: &str, method: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .method(method)
        .header("content-type", "application/json")
        .extension(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .extension(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn response_json(response: axum::response::Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body");
    serde_json::from_slice(&body).expect("json body")
}

async fn register_and_login(router: &Router, username: &str) -> String {
    let register = router
        .clone()
        .oneshot(json_request(
            "/api/auth/register",
            "POST",
            None,
            json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": "testpassword123"
            }),
        ))
        .await
        .expect("register response");
    assert_eq!(register.status(), StatusCode::CREATED);

    let login = router
        .clone()
        .oneshot(json_request(
            "/api/auth/login",
            "POST",
            None,
            json!({"username": username, "password": "testpassword123"}),
        ))
        .await
        .expect("login response");
    assert_eq!(login.status(), StatusCode::OK);
    let body = response_json(login).await;
    body["access_token"]
        .as_str()
        .expect("access token")
        .to_string()
}

#[sqlx::test(migrations = "../migrations")]
async fn register_login_me_and_consent(pool: PgPool) {
    let state = test_state(pool, vec![]).await;
    let router = test_router(state);

    let token = register_and_login(&router, "apitestuser").await;

    // Duplicate registration conflicts.
    let duplicate = router
        .clone()
        .oneshot(json_request(
            "/api/auth/register",
            "POST",
            None,
            json!({
                "username": "apitestuser",
                "email": "other@example.com",
                "password": "testpassword123"
            }),
        ))
        .await
        .expect("duplicate register response");
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    // Wrong password is rejected.
    let bad_login = router
        .clone()
        .oneshot(json_request(
            "/api/auth/login",
            "POST",
            None,
            json!({"username": "apitestuser", "password": "wrong"}),
        ))
        .await
        .expect("bad login response");
    assert_eq!(bad_login.status(), StatusCode::UNAUTHORIZED);

    let me = router
        .clone()
        .oneshot(get_request("/api/auth/me", Some(&token)))
        .await
        .expect("me response");
    assert_eq!(me.status(), StatusCode::OK);
    let profile = response_json(me).await;
    assert_eq!(profile["username"], "apitestuser");
    assert_eq!(profile["is_premium"], false);
    assert_eq!(profile["data_consent"], false);

    let consent = router
        .clone()
        .oneshot(json_request(
            "/api/user/preferences/data_consent",
            "POST",
            Some(&token),
            json!({"consent": true}),
        ))
        .await
        .expect("consent response");
    assert_eq!(consent.status(), StatusCode::OK);
    assert_eq!(response_json(consent).await["consent_status"], true);

    let me_again = router
        .clone()
        .oneshot(get_request("/api/auth/me", Some(&token)))
        .await
        .expect("me response");
    assert_eq!(response_json(me_again).await["data_consent"], true);

    // No token, no profile.
    let anonymous = router
        .oneshot(get_request("/api/auth/me", None))
        .await
        .expect("anonymous response");
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../migrations")]
async fn portfolio_valuation_tolerates_missing_prices(pool: PgPool) {
    // Only bitcoin has a quote; ethereum must value as null, not zero.
    let state = test_state(pool, vec![("bitcoin", 60_000.0)]).await;
    let router = test_router(state);
    let token = register_and_login(&router, "valuationuser").await;

    let empty = router
        .clone()
        .oneshot(get_request("/api/portfolio", Some(&token)))
        .await
        .expect("portfolio response");
    assert_eq!(empty.status(), StatusCode::OK);
    let body = response_json(empty).await;
    assert_eq!(body["holdings"].as_array().unwrap().len(), 0);
    assert_eq!(body["total_portfolio_value_usd"], 0.0);

    let created = router
        .clone()
        .oneshot(json_request(
            "/api/portfolio/holdings",
            "POST",
            Some(&token),
            json!({"asset_id": "Bitcoin", "symbol": "btc", "quantity": 2.0}),
        ))
        .await
        .expect("create response");
    assert_eq!(created.status(), StatusCode::CREATED);
    let created_body = response_json(created).await;
    // Identifiers are normalized on the way in.
    assert_eq!(created_body["asset_id"], "bitcoin");
    assert_eq!(created_body["symbol"], "BTC");
    assert_eq!(created_body["current_value_usd"], 120_000.0);

    let eth = router
        .clone()
        .oneshot(json_request(
            "/api/portfolio/holdings",
            "POST",
            Some(&token),
            json!({"asset_id": "ethereum", "symbol": "ETH", "quantity": 1.0}),
        ))
        .await
        .expect("create response");
    assert_eq!(eth.status(), StatusCode::CREATED);

    let portfolio = router
        .clone()
        .oneshot(get_request("/api/portfolio", Some(&token)))
        .await
        .expect("portfolio response");
    let body = response_json(portfolio).await;
    assert_eq!(body["total_portfolio_value_usd"], 120_000.0);
    let holdings = body["holdings"].as_array().unwrap();
    assert_eq!(holdings.len(), 2);
    let eth_item = holdings
        .iter()
        .find(|item| item["symbol"] == "ETH")
        .expect("eth item");
    assert!(eth_item["current_price_usd"].is_null());
    assert!(eth_item["current_value_usd"].is_null());
    assert_eq!(body["is_premium_user"], false);
    assert!(body["premium_analytics"].is_null());
}

#[sqlx::test(migrations = "../migrations")]
async fn holding_update_and_delete(pool: PgPool) {
    let state = test_state(pool, vec![("bitcoin", 60_000.0)]).await;
    let router = test_router(state);
    let token = register_and_login(&router, "cruduser").await;

    let created = router
        .clone()
        .oneshot(json_request(
            "/api/portfolio/holdings",
            "POST",
            Some(&token),
            json!({
                "asset_id": "bitcoin",
                "symbol": "BTC",
                "quantity": 2.0,
                "average_buy_price": 40000.0,
                "notes": "first buy"
            }),
        ))
        .await
        .expect("create response");
    assert_eq!(created.status(), StatusCode::CREATED);
    let holding_id = response_json(created).await["id"]
        .as_str()
        .expect("holding id")
        .to_string();

    // Non-positive quantity rejected up front.
    let invalid = router
        .clone()
        .oneshot(json_request(
            &format!("/api/portfolio/holdings/{holding_id}"),
            "PUT",
            Some(&token),
            json!({"quantity": 0.0}),
        ))
        .await
        .expect("invalid update response");
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

    let negative = router
        .clone()
        .oneshot(json_request(
            "/api/portfolio/holdings",
            "POST",
            Some(&token),
            json!({"asset_id": "bitcoin", "symbol": "BTC", "quantity": 1.0, "average_buy_price": -5.0}),
        ))
        .await
        .expect("negative basis response");
    assert_eq!(negative.status(), StatusCode::BAD_REQUEST);

    // Supplied fields replace values; an explicit null clears the basis.
    let updated = router
        .clone()
        .oneshot(json_request(
            &format!("/api/portfolio/holdings/{holding_id}"),
            "PUT",
            Some(&token),
            json!({"quantity": 3.0, "average_buy_price": null}),
        ))
        .await
        .expect("update response");
    assert_eq!(updated.status(), StatusCode::OK);
    let updated_body = response_json(updated).await;
    assert_eq!(updated_body["quantity"], 3.0);
    assert!(updated_body["average_buy_price"].is_null());
    assert_eq!(updated_body["notes"], "first buy");
    assert_eq!(updated_body["current_value_usd"], 180_000.0);

    let deleted = router
        .clone()
        .oneshot(json_request(
            &format!("/api/portfolio/holdings/{holding_id}"),
            "DELETE",
            Some(&token),
            json!({}),
        ))
        .await
        .expect("delete response");
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let missing = router
        .oneshot(json_request(
            &format!("/api/portfolio/holdings/{holding_id}"),
            "DELETE",
            Some(&token),
            json!({}),
        ))
        .await
        .expect("second delete response");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../migrations")]
async fn free_tier_limit_blocks_sixth_holding(pool: PgPool) {
    let state = test_state(pool, vec![]).await;
    let router = test_router(state);
    let token = register_and_login(&router, "freeuser").await;

    for index in 0..5 {
        let created = router
            .clone()
            .oneshot(json_request(
                "/api/portfolio/holdings",
                "POST",
                Some(&token),
                json!({
                    "asset_id": format!("asset-{index}"),
                    "symbol": format!("AST{index}"),
                    "quantity": 1.0
                }),
            ))
            .await
            .expect("create response");
        assert_eq!(created.status(), StatusCode::CREATED);
    }

    let sixth = router
        .oneshot(json_request(
            "/api/portfolio/holdings",
            "POST",
            Some(&token),
            json!({"asset_id": "asset-5", "symbol": "AST5", "quantity": 1.0}),
        ))
        .await
        .expect("sixth response");
    assert_eq!(sixth.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../migrations")]
async fn premium_gates_yield_recommendations(pool: PgPool) {
    let state = test_state(pool.clone(), vec![]).await;
    let router = test_router(state);
    let token = register_and_login(&router, "premiumuser").await;

    let usdc = router
        .clone()
        .oneshot(json_request(
            "/api/portfolio/holdings",
            "POST",
            Some(&token),
            json!({"asset_id": "usd-coin", "symbol": "USDC", "quantity": 10000.0}),
        ))
        .await
        .expect("create response");
    assert_eq!(usdc.status(), StatusCode::CREATED);

    let gated = router
        .clone()
        .oneshot(get_request("/api/yields/recommendations", Some(&token)))
        .await
        .expect("gated response");
    assert_eq!(gated.status(), StatusCode::FORBIDDEN);

    sqlx::query("UPDATE users SET is_premium_user = TRUE WHERE username = $1")
        .bind("premiumuser")
        .execute(&pool)
        .await
        .expect("premium upgrade");

    let invalid = router
        .clone()
        .oneshot(get_request(
            "/api/yields/recommendations?risk_tolerance=aggressive",
            Some(&token),
        ))
        .await
        .expect("invalid tolerance response");
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

    let recommendations = router
        .clone()
        .oneshot(get_request(
            "/api/yields/recommendations?risk_tolerance=low",
            Some(&token),
        ))
        .await
        .expect("recommendations response");
    assert_eq!(recommendations.status(), StatusCode::OK);
    let body = response_json(recommendations).await;
    let items = body.as_array().expect("recommendation array");
    assert!(!items.is_empty());
    for item in items {
        assert!(item["risk_score"].as_u64().unwrap() <= 40);
        assert_eq!(item["asset"], "USDC");
    }

    let opportunities = router
        .oneshot(get_request("/api/yields/opportunities", Some(&token)))
        .await
        .expect("opportunities response");
    assert_eq!(opportunities.status(), StatusCode::OK);
    let body = response_json(opportunities).await;
    let items = body.as_array().expect("opportunity array");
    assert!(!items.is_empty());
    for (index, item) in items.iter().enumerate() {
        assert_eq!(item["rank"].as_u64().unwrap(), index as u64 + 1);
        if index > 0 {
            assert!(items[index - 1]["apy"].as_f64() >= item["apy"].as_f64());
        }
    }
}

#[sqlx::test(migrations = "../migrations")]
async fn health_reports_database_state(pool: PgPool) {
    let state = test_state(pool, vec![]).await;
    let router = test_router(state);

    let healthz = router
        .clone()
        .oneshot(get_request("/healthz", None))
        .await
        .expect("healthz response");
    assert_eq!(healthz.status(), StatusCode::OK);

    let health = router
        .oneshot(get_request("/api/health", None))
        .await
        .expect("health response");
    assert_eq!(health.status(), StatusCode::OK);
    let body = response_json(health).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}
