//! Integration tests for the search → normalize → store → serve flow.
//!
//! The provider is replaced by a wiremock server speaking the Gemini
//! generateContent format, and each test gets its own SQLite file.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hackathon_finder::api;
use hackathon_finder::config::{Config, LlmConfig};
use hackathon_finder::db::{create_pool, HackathonStore};
use hackathon_finder::state::AppState;

const GENERATE_PATH: &str = "/v1beta/models/test-model:generateContent";

struct TestApp {
    router: Router,
    state: AppState,
    provider: MockServer,
    _dir: tempfile::TempDir,
}

async fn setup() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let provider = MockServer::start().await;

    let config = Config {
        database_url: format!("sqlite:{}?mode=rwc", dir.path().join("test.db").display()),
        llm: LlmConfig {
            provider: "gemini".to_string(),
            base_url: provider.uri(),
            model: "test-model".to_string(),
            api_key: Some("test-key".to_string()),
            temperature: 0.2,
        },
        ..Config::default()
    };

    let store = HackathonStore::connect(&config.database_url).await.unwrap();
    let state = AppState::with_store(config, store).unwrap();
    TestApp {
        router: api::router(state.clone()),
        state,
        provider,
        _dir: dir,
    }
}

/// Wrap `text` the way Gemini returns a single-candidate answer.
fn gemini_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    }))
}

async fn mount_reply(app: &TestApp, text: &str) {
    app.provider.reset().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(gemini_reply(text))
        .mount(&app.provider)
        .await;
}

async fn send(app: &TestApp, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, String) {
    let resp = app.router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn post_scrape(app: &TestApp, query: &str) -> (StatusCode, Value) {
    let req = Request::post("/scrape")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "query": query }).to_string()))
        .unwrap();
    let (status, _, body) = send(app, req).await;
    (status, serde_json::from_str(&body).unwrap())
}

async fn list_api(app: &TestApp, query: &str) -> Vec<Value> {
    let req = Request::get(format!("/api/hackathons{query}"))
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(app, req).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_str(&body).unwrap()
}

fn three_good_two_bad() -> String {
    json!([
        {
            "title": "HackMIT",
            "organizer": "MIT",
            "registration_deadline": "2099-09-01",
            "event_date": "2099-09-14",
            "platform": "mlh",
            "tags": ["ai", "hardware"],
            "website_url": "https://hackmit.org",
            "prize_pool": "$50,000"
        },
        { "organizer": "No Title Org", "platform": "devfolio" },
        {
            "title": "ETHIndia",
            "organizer": "Devfolio",
            "end_date": "2099-11-20",
            "platform": "Devfolio"
        },
        "not an object",
        { "title": "Smart India Hackathon", "organizer": "AICTE", "status": "upcoming" }
    ])
    .to_string()
}

#[tokio::test]
async fn test_list_is_empty_before_any_search() {
    let app = setup().await;
    assert!(list_api(&app, "").await.is_empty());
}

#[tokio::test]
async fn test_scrape_persists_only_well_formed_records() {
    let app = setup().await;
    mount_reply(&app, &format!("```json\n{}\n```", three_good_two_bad())).await;

    let (status, body) = post_scrape(&app, "hackathons 2099").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 3);
    assert_eq!(body["created"], 3);
    assert_eq!(body["dropped"], 2);

    let stored = list_api(&app, "").await;
    assert_eq!(stored.len(), 3);
    assert!(stored.iter().all(|h| h["title"] != "" && h["source"] == "gemini_search"));

    let hackmit = stored.iter().find(|h| h["title"] == "HackMIT").unwrap();
    assert_eq!(hackmit["platform"], "mlh");
    assert_eq!(hackmit["status"], "open");
    assert_eq!(hackmit["tags"], json!(["ai", "hardware"]));
    assert_eq!(hackmit["prize_pool"], "$50,000");
    assert_eq!(hackmit["registration_deadline"], "2099-09-01");

    let eth = stored.iter().find(|h| h["title"] == "ETHIndia").unwrap();
    assert_eq!(eth["registration_deadline"], "2099-11-20");
    assert_eq!(eth["platform"], "devfolio");
}

#[tokio::test]
async fn test_repeated_search_updates_instead_of_duplicating() {
    let app = setup().await;
    mount_reply(&app, &three_good_two_bad()).await;
    post_scrape(&app, "first").await;
    let before = list_api(&app, "").await;

    let changed = json!([
        { "title": "hackmit", "organizer": "mit", "prize_pool": "$75,000" },
        { "title": "New Jam", "organizer": "Acme" }
    ])
    .to_string();
    mount_reply(&app, &changed).await;

    let (_, body) = post_scrape(&app, "second").await;
    assert_eq!(body["success"], true);
    assert_eq!(body["created"], 1);
    assert_eq!(body["updated"], 1);

    let after = list_api(&app, "").await;
    assert_eq!(after.len(), 4);

    let old_id = before.iter().find(|h| h["title"] == "HackMIT").unwrap()["id"].clone();
    let updated = after.iter().find(|h| h["id"] == old_id).unwrap();
    assert_eq!(updated["prize_pool"], "$75,000");
    assert_eq!(updated["title"], "hackmit");
}

#[tokio::test]
async fn test_provider_failure_leaves_store_unchanged() {
    let app = setup().await;
    mount_reply(&app, &three_good_two_bad()).await;
    post_scrape(&app, "seed").await;
    let before = list_api(&app, "").await;

    app.provider.reset().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(1)
        .mount(&app.provider)
        .await;

    let (status, body) = post_scrape(&app, "anything").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);
    assert_eq!(body["count"], 0);

    assert_eq!(list_api(&app, "").await, before);
}

#[tokio::test]
async fn test_unparseable_reply_is_a_failed_search() {
    let app = setup().await;
    mount_reply(&app, "I could not find any hackathons right now.").await;

    let (status, body) = post_scrape(&app, "anything").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);
    assert!(list_api(&app, "").await.is_empty());

    let summary = app.state.last_scrape().unwrap();
    assert!(summary.error.is_some());
}

#[tokio::test]
async fn test_reply_without_valid_records_reports_no_results() {
    let app = setup().await;
    mount_reply(&app, r#"[{"organizer": "only"}]"#).await;

    let (status, body) = post_scrape(&app, "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(list_api(&app, "").await.is_empty());
    // Blank query falls back to the configured default
    assert_eq!(app.state.last_scrape().unwrap().query, app.state.config.default_query);
}

#[tokio::test]
async fn test_scrape_without_body_uses_default_query() {
    let app = setup().await;
    mount_reply(&app, &three_good_two_bad()).await;

    let (status, _, body) = send(&app, Request::post("/scrape").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 3);
    assert_eq!(app.state.last_scrape().unwrap().query, app.state.config.default_query);
}

#[tokio::test]
async fn test_scrape_with_invalid_json_reports_failure() {
    let app = setup().await;
    mount_reply(&app, &three_good_two_bad()).await;

    let req = Request::post("/scrape")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"query\": "))
        .unwrap();
    let (status, headers, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["success"], false);
    assert!(!body["error"].as_str().unwrap().is_empty());
    assert!(list_api(&app, "").await.is_empty());
}

#[tokio::test]
async fn test_storage_failure_mid_batch_keeps_earlier_records() {
    let app = setup().await;
    mount_reply(&app, &three_good_two_bad()).await;

    // Second writer on the same file: refuse every insert after the first.
    let pool = create_pool(&app.state.config.database_url).await.unwrap();
    sqlx::query(
        "CREATE TRIGGER refuse_after_first BEFORE INSERT ON hackathons \
         WHEN (SELECT COUNT(*) FROM hackathons) >= 1 \
         BEGIN SELECT RAISE(ABORT, 'disk full'); END",
    )
    .execute(&pool)
    .await
    .unwrap();

    let (status, body) = post_scrape(&app, "hackathons").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["count"], 0);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("failed to store hackathons"));

    assert_eq!(list_api(&app, "").await.len(), 1);
    assert!(app.state.last_scrape().unwrap().error.is_some());
}

#[tokio::test]
async fn test_unknown_filter_values_are_ignored() {
    let app = setup().await;
    mount_reply(&app, &three_good_two_bad()).await;
    post_scrape(&app, "seed").await;

    assert_eq!(list_api(&app, "?platform=kaggle").await.len(), 3);
    assert_eq!(list_api(&app, "?platform=kaggle&status=open").await.len(), 2);

    let (status, _, body) = send(
        &app,
        Request::get("/?status=whenever").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("HackMIT"));
}

#[tokio::test]
async fn test_delete_removes_from_listing() {
    let app = setup().await;
    mount_reply(&app, &three_good_two_bad()).await;
    post_scrape(&app, "seed").await;

    let stored = list_api(&app, "").await;
    let id = stored[0]["id"].as_str().unwrap().to_string();

    let (status, _, body) = send(
        &app,
        Request::post(format!("/delete/{id}")).body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"success": true}));

    let remaining = list_api(&app, "").await;
    assert_eq!(remaining.len(), stored.len() - 1);
    assert!(remaining.iter().all(|h| h["id"] != id.as_str()));

    let (status, _, body) = send(
        &app,
        Request::post(format!("/delete/{id}")).body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap()["success"], false);
}

#[tokio::test]
async fn test_api_filters_by_platform_and_status() {
    let app = setup().await;
    mount_reply(&app, &three_good_two_bad()).await;
    post_scrape(&app, "seed").await;

    let mlh = list_api(&app, "?platform=mlh").await;
    assert_eq!(mlh.len(), 1);
    assert_eq!(mlh[0]["title"], "HackMIT");

    let upcoming = list_api(&app, "?status=upcoming&platform=").await;
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0]["title"], "Smart India Hackathon");

    let text = list_api(&app, "?q=eth").await;
    assert_eq!(text.len(), 1);
}

#[tokio::test]
async fn test_pages_render_and_redirect() {
    let app = setup().await;
    mount_reply(&app, &three_good_two_bad()).await;
    post_scrape(&app, "seed").await;
    let stored = list_api(&app, "").await;
    let id = stored[0]["id"].as_str().unwrap().to_string();

    let (status, _, body) = send(&app, Request::get("/").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("HackMIT"));
    assert!(body.contains("Last search"));

    let (status, _, body) = send(
        &app,
        Request::get(format!("/hackathon/{id}")).body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(stored[0]["title"].as_str().unwrap()));

    let (status, headers, _) = send(
        &app,
        Request::get("/hackathon/not-a-uuid").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers[header::LOCATION], "/");
}

#[tokio::test]
async fn test_update_form_edits_record() {
    let app = setup().await;
    mount_reply(&app, &three_good_two_bad()).await;
    post_scrape(&app, "seed").await;
    let hackmit = list_api(&app, "")
        .await
        .into_iter()
        .find(|h| h["title"] == "HackMIT")
        .unwrap();
    let id = hackmit["id"].as_str().unwrap().to_string();

    let form = "title=HackMIT+2099&organizer=MIT&platform=mlh&status=closed\
                &tags=ai%2C+robotics&registration_deadline=2099-09-01&description=Edited";
    let (status, headers, _) = send(
        &app,
        Request::post(format!("/update/{id}"))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers[header::LOCATION], format!("/hackathon/{id}").as_str());

    let (_, _, body) = send(
        &app,
        Request::get(format!("/api/hackathons/{id}")).body(Body::empty()).unwrap(),
    )
    .await;
    let edited: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(edited["id"], id.as_str());
    assert_eq!(edited["title"], "HackMIT 2099");
    assert_eq!(edited["status"], "closed");
    assert_eq!(edited["tags"], json!(["ai", "robotics"]));
    assert_eq!(edited["description"], "Edited");

    let (status, _, body) = send(
        &app,
        Request::post(format!("/update/{id}"))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("title=&organizer=MIT"))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Title is required"));
}

#[tokio::test]
async fn test_health() {
    let app = setup().await;
    let (status, _, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"status": "ok"}));
}
