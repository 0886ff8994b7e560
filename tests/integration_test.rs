use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use slidesmith::admission::concurrency::ConcurrencyLimiter;
use slidesmith::cache::DeckCache;
use slidesmith::config::AppConfig;
use slidesmith::generator::deck::DeckBuilder;
use slidesmith::generator::placeholder::PlaceholderGenerator;
use slidesmith::generator::SharedGenerator;
use slidesmith::routes::{self, AppState, SharedState};
use slidesmith::storage;
use slidesmith::storage::store::PresentationStore;

/// Spin up a real server on an ephemeral port with a throwaway database.
/// The TempDir must stay alive for the duration of the test.
async fn spawn_server(config: AppConfig) -> (String, tempfile::TempDir) {
    let (base, dir, _state) = spawn_server_with_state(config).await;
    (base, dir)
}

/// Like `spawn_server`, but also hands back the app state so a test can
/// poke at the limiters directly.
async fn spawn_server_with_state(
    mut config: AppConfig,
) -> (String, tempfile::TempDir, SharedState) {
    let dir = tempfile::tempdir().unwrap();
    config.database.path = dir.path().join("test.db");
    config.generation.output_dir = dir.path().join("output");

    let pool = storage::sqlite::create_pool(&config.database).unwrap();
    storage::sqlite::init_pool(&pool).await.unwrap();

    let cache = Arc::new(DeckCache::new(config.cache.clone()));
    let state = Arc::new(AppState {
        cache: cache.clone(),
        store: PresentationStore::new(pool.clone(), cache.clone()),
        deck: DeckBuilder::new(
            SharedGenerator::new(Arc::new(PlaceholderGenerator)),
            cache,
        ),
        concurrency: Arc::new(ConcurrencyLimiter::new(config.concurrency.clone())),
        config,
    });

    let app = routes::router(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    (format!("http://{addr}"), dir, state)
}

async fn create_deck(client: &reqwest::Client, base: &str, topic: &str, n: usize) -> serde_json::Value {
    let resp = client
        .post(format!("{base}/api/v1/presentations"))
        .json(&serde_json::json!({ "topic": topic, "num_slides": n }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    resp.json().await.unwrap()
}

#[tokio::test]
async fn test_health() {
    let (base, _dir) = spawn_server(AppConfig::default()).await;
    let resp = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_create_presentation_title_slide_first() {
    let (base, _dir) = spawn_server(AppConfig::default()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/api/v1/presentations"))
        .json(&serde_json::json!({ "topic": "Machine Learning", "num_slides": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.headers().contains_key("x-ratelimit-minute-remaining"));
    assert!(resp.headers().contains_key("x-concurrency-global-available"));

    let body: serde_json::Value = resp.json().await.unwrap();
    let slides = body["slides"].as_array().unwrap();
    assert_eq!(slides.len(), 3);
    assert_eq!(slides[0]["slide_type"], "title");
    assert_eq!(body["theme"], "modern");
    assert_eq!(body["font"], "Segoe UI");
    assert_eq!(body["aspect_ratio"], "16:9");
}

#[tokio::test]
async fn test_create_validation_errors() {
    let (base, _dir) = spawn_server(AppConfig::default()).await;
    let client = reqwest::Client::new();

    for payload in [
        serde_json::json!({ "topic": "", "num_slides": 3 }),
        serde_json::json!({ "topic": "ok", "num_slides": 0 }),
        serde_json::json!({ "topic": "ok", "num_slides": 21 }),
        serde_json::json!({ "topic": "ok", "num_slides": 3, "aspect_ratio": "custom" }),
        serde_json::json!({
            "topic": "ok", "num_slides": 3, "aspect_ratio": "custom",
            "custom_width": 30.0, "custom_height": 7.5
        }),
    ] {
        let resp = client
            .post(format!("{base}/api/v1/presentations"))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "payload: {payload}");
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "validation_error");
    }
}

#[tokio::test]
async fn test_get_delete_lifecycle() {
    let (base, _dir) = spawn_server(AppConfig::default()).await;
    let client = reqwest::Client::new();

    let created = create_deck(&client, &base, "Rust", 2).await;
    let id = created["id"].as_str().unwrap();

    let resp = client
        .get(format!("{base}/api/v1/presentations/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let fetched: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(fetched["topic"], "Rust");
    assert_eq!(fetched["slides"].as_array().unwrap().len(), 2);

    let resp = client
        .delete(format!("{base}/api/v1/presentations/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("deleted"));

    // gone now, and a second delete reports not found
    let resp = client
        .get(format!("{base}/api/v1/presentations/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let resp = client
        .delete(format!("{base}/api/v1/presentations/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_list_and_search() {
    let (base, _dir) = spawn_server(AppConfig::default()).await;
    let client = reqwest::Client::new();

    create_deck(&client, &base, "Rust Basics", 2).await;
    create_deck(&client, &base, "Gardening", 2).await;

    let resp = client
        .get(format!("{base}/api/v1/presentations"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["count"], 2);

    let resp = client
        .get(format!("{base}/api/v1/presentations/search/Rust"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["presentations"][0]["topic"], "Rust Basics");

    // no match is an empty result, not an error
    let resp = client
        .get(format!("{base}/api/v1/presentations/search/zzz"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_configure_rederives_theme_styling() {
    let (base, _dir) = spawn_server(AppConfig::default()).await;
    let client = reqwest::Client::new();

    let created = create_deck(&client, &base, "Topic", 3).await;
    let id = created["id"].as_str().unwrap();

    let resp = client
        .post(format!("{base}/api/v1/presentations/{id}/configure"))
        .json(&serde_json::json!({ "theme": "minimal", "aspect_ratio": "4:3" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["theme"], "minimal");
    assert_eq!(body["font"], "Arial");
    assert_eq!(body["colors"]["background"], "#000000");
    assert_eq!(body["aspect_ratio"], "4:3");
    // slide content untouched
    assert_eq!(body["slides"].as_array().unwrap().len(), 3);

    // explicit font survives a theme change
    let resp = client
        .post(format!("{base}/api/v1/presentations/{id}/configure"))
        .json(&serde_json::json!({ "theme": "classic", "font": "Courier New" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["font"], "Courier New");
    assert_eq!(body["colors"]["secondary"], "#D4AF37");
}

#[tokio::test]
async fn test_created_at_preserved_and_updated_at_monotonic() {
    let (base, _dir) = spawn_server(AppConfig::default()).await;
    let client = reqwest::Client::new();

    let created = create_deck(&client, &base, "Timestamps", 2).await;
    let id = created["id"].as_str().unwrap();
    let first: serde_json::Value = client
        .get(format!("{base}/api/v1/presentations/{id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let created_at = first["created_at"].as_i64().unwrap();
    let updated_at = first["updated_at"].as_i64().unwrap();
    assert!(updated_at >= created_at);

    // Timestamps have second resolution; cross a boundary before resaving.
    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
    let resp = client
        .post(format!("{base}/api/v1/presentations/{id}/configure"))
        .json(&serde_json::json!({ "font": "Georgia" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let second: serde_json::Value = client
        .get(format!("{base}/api/v1/presentations/{id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second["created_at"].as_i64().unwrap(), created_at);
    assert!(second["updated_at"].as_i64().unwrap() > updated_at);
}

#[tokio::test]
async fn test_responses_carry_persisted_timestamps() {
    let (base, _dir) = spawn_server(AppConfig::default()).await;
    let client = reqwest::Client::new();

    let created = create_deck(&client, &base, "Canonical", 2).await;
    let id = created["id"].as_str().unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
    let reconfigured: serde_json::Value = client
        .post(format!("{base}/api/v1/presentations/{id}/configure"))
        .json(&serde_json::json!({ "theme": "corporate" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // The configure response must report the stamp the store persisted,
    // not the stamp the record carried before the save.
    let fetched: serde_json::Value = client
        .get(format!("{base}/api/v1/presentations/{id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reconfigured["updated_at"], fetched["updated_at"]);
    assert_eq!(reconfigured["created_at"], fetched["created_at"]);
    assert_eq!(created["created_at"], fetched["created_at"]);
}

#[tokio::test]
async fn test_configure_rejects_bad_custom_dimensions() {
    let (base, _dir) = spawn_server(AppConfig::default()).await;
    let client = reqwest::Client::new();

    let created = create_deck(&client, &base, "Topic", 2).await;
    let id = created["id"].as_str().unwrap();

    let resp = client
        .post(format!("{base}/api/v1/presentations/{id}/configure"))
        .json(&serde_json::json!({ "aspect_ratio": "custom", "custom_width": 3.0, "custom_height": 7.5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_download_pptx() {
    let (base, _dir) = spawn_server(AppConfig::default()).await;
    let client = reqwest::Client::new();

    let created = create_deck(&client, &base, "Download Me", 3).await;
    let id = created["id"].as_str().unwrap();

    let resp = client
        .get(format!("{base}/api/v1/presentations/{id}/download"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "application/vnd.openxmlformats-officedocument.presentationml.presentation"
    );
    let bytes = resp.bytes().await.unwrap();
    assert!(bytes.starts_with(b"PK"));
    assert!(bytes.len() > 1000);
}

#[tokio::test]
async fn test_download_unknown_id_is_404() {
    let (base, _dir) = spawn_server(AppConfig::default()).await;
    let resp = reqwest::get(format!("{base}/api/v1/presentations/nope/download"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_auth_locked_down() {
    let mut config = AppConfig::default();
    config.auth.api_keys = vec!["sk-secret-abcdef".to_string()];
    let (base, _dir) = spawn_server(config).await;
    let client = reqwest::Client::new();

    // no key
    let resp = client
        .get(format!("{base}/api/v1/presentations"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    assert_eq!(resp.headers().get("www-authenticate").unwrap(), "Bearer");
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");

    // wrong key
    let resp = client
        .get(format!("{base}/api/v1/presentations"))
        .header("x-api-key", "wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // bearer token accepted, caller identity echoed back
    let resp = client
        .get(format!("{base}/api/v1/presentations"))
        .bearer_auth("sk-secret-abcdef")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers().get("x-user-id").unwrap(), "user_sk-secre");

    // X-API-Key works too
    let resp = client
        .get(format!("{base}/api/v1/presentations"))
        .header("x-api-key", "sk-secret-abcdef")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // health stays open
    let resp = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let resp = client
        .get(format!("{base}/api/v1/generator/status"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_rate_limit_enforced() {
    let mut config = AppConfig::default();
    config.rate_limit.requests_per_minute = 3;
    let (base, _dir) = spawn_server(config).await;
    let client = reqwest::Client::new();

    let mut last_status = 0;
    for _ in 0..4 {
        let resp = client.get(format!("{base}/health")).send().await.unwrap();
        last_status = resp.status().as_u16();
    }
    assert_eq!(last_status, 429);

    let resp = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(resp.status(), 429);
    assert!(resp.headers().contains_key("retry-after"));
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "rate_limit_exceeded");
}

#[tokio::test]
async fn test_rate_limit_headers_on_success() {
    let mut config = AppConfig::default();
    config.rate_limit.requests_per_minute = 10;
    let (base, _dir) = spawn_server(config).await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(resp.headers().get("x-ratelimit-minute-limit").unwrap(), "10");
    assert_eq!(
        resp.headers().get("x-ratelimit-minute-remaining").unwrap(),
        "9"
    );
    assert!(resp.headers().contains_key("x-ratelimit-hour-remaining"));
}

#[tokio::test]
async fn test_generator_status_and_switch() {
    let (base, _dir) = spawn_server(AppConfig::default()).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{base}/api/v1/generator/status"))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["active"], "placeholder");
    assert_eq!(body["openai_configured"], false);

    // no key configured, switching to openai is a validation error
    let resp = client
        .post(format!("{base}/api/v1/generator/switch"))
        .json(&serde_json::json!({ "generator": "openai" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .post(format!("{base}/api/v1/generator/switch"))
        .json(&serde_json::json!({ "generator": "placeholder" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_cache_stats_and_clear() {
    let (base, _dir) = spawn_server(AppConfig::default()).await;
    let client = reqwest::Client::new();

    create_deck(&client, &base, "Cached", 2).await;

    let resp = client
        .get(format!("{base}/api/v1/cache/stats"))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["partitions"]["entity"]["size"].as_u64().unwrap() >= 1);
    assert_eq!(body["partitions"]["entity"]["capacity"], 100);

    let resp = client
        .post(format!("{base}/api/v1/cache/clear"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client
        .get(format!("{base}/api/v1/cache/stats"))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["partitions"]["entity"]["size"], 0);
    assert_eq!(body["partitions"]["generation"]["size"], 0);
}

#[tokio::test]
async fn test_concurrency_stats_endpoint() {
    let mut config = AppConfig::default();
    config.concurrency.max_concurrent_requests = 7;
    config.concurrency.max_concurrent_per_user = 2;
    let (base, _dir) = spawn_server(config).await;

    let resp = reqwest::get(format!("{base}/api/v1/concurrency/stats"))
        .await
        .unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["concurrency"]["global_limit"], 7);
    assert_eq!(body["concurrency"]["global_available"], 7);
    assert_eq!(body["concurrency"]["per_user_limit"], 2);
}

#[tokio::test]
async fn test_saturated_limiter_sheds_gated_requests_with_503() {
    let mut config = AppConfig::default();
    config.concurrency.max_concurrent_requests = 1;
    config.concurrency.acquire_timeout_secs = 0;
    let (base, _dir, state) = spawn_server_with_state(config).await;
    let client = reqwest::Client::new();

    // Exhaust the global ceiling out of band, then hit a gated route.
    let held = state.concurrency.acquire("holder").await.unwrap();
    let resp = client
        .post(format!("{base}/api/v1/presentations"))
        .json(&serde_json::json!({ "topic": "Saturated", "num_slides": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 503);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "service_unavailable");

    // Ungated routes are unaffected by saturation.
    let resp = client
        .get(format!("{base}/api/v1/presentations"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Releasing the permit readmits gated traffic.
    drop(held);
    create_deck(&client, &base, "Saturated", 2).await;
}

#[tokio::test]
async fn test_aspect_ratio_catalog() {
    let (base, _dir) = spawn_server(AppConfig::default()).await;
    let resp = reqwest::get(format!("{base}/api/v1/aspect-ratios"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    let presets = body["presets"].as_array().unwrap();
    assert_eq!(presets.len(), 5);
    let ids: Vec<&str> = presets.iter().map(|p| p["id"].as_str().unwrap()).collect();
    assert!(ids.contains(&"16:9"));
    assert!(ids.contains(&"A4"));
    assert_eq!(body["custom"]["min_inches"], 5.0);
}

#[tokio::test]
async fn test_malformed_json_is_validation_error() {
    let (base, _dir) = spawn_server(AppConfig::default()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/api/v1/presentations"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
}
