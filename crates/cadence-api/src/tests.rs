use std::sync::Arc;

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use cadence_core::{
  action::ActionKind,
  language::LanguagesRepository,
  store::{ActionStore, MostRecentStore},
};
use cadence_store::{Database, SqlActionStore, SqlMostRecentStore};
use chrono::{TimeZone, Utc};
use rand_core::OsRng;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{ApiState, AuthConfig, api_router};

struct Fixture {
  router:      Router,
  actions:     Arc<SqlActionStore>,
  most_recent: Arc<SqlMostRecentStore>,
}

async fn fixture() -> Fixture {
  let db = Database::open_sqlite_in_memory().await.unwrap();
  let actions = Arc::new(SqlActionStore::new(db.clone(), LanguagesRepository::new()));
  let most_recent = Arc::new(SqlMostRecentStore::new(db));

  let salt = SaltString::generate(&mut OsRng);
  let hash = Argon2::default()
    .hash_password(b"secret", &salt)
    .unwrap()
    .to_string();
  let auth = Arc::new(AuthConfig { username: "admin".into(), password_hash: hash });

  let state = ApiState {
    actions:     actions.clone(),
    most_recent: most_recent.clone(),
    languages:   LanguagesRepository::new(),
  };
  Fixture { router: api_router(state, auth), actions, most_recent }
}

fn basic(user: &str, pass: &str) -> String { format!("Basic {}", B64.encode(format!("{user}:{pass}"))) }

async fn send(f: &Fixture, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let mut builder = Request::builder()
    .method(method)
    .uri(uri)
    .header(header::AUTHORIZATION, basic("admin", "secret"));
  let body = match body {
    Some(json) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(json.to_string())
    }
    None => Body::empty(),
  };
  let resp = f.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, json)
}

// ─── Auth ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn requests_without_credentials_are_rejected() {
  let f = fixture().await;
  let req = Request::builder().uri("/languages").body(Body::empty()).unwrap();
  let resp = f.router.clone().oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
}

#[tokio::test]
async fn wrong_password_is_rejected() {
  let f = fixture().await;
  let req = Request::builder()
    .uri("/languages")
    .header(header::AUTHORIZATION, basic("admin", "wrong"))
    .body(Body::empty())
    .unwrap();
  let resp = f.router.clone().oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// ─── Actions ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn put_then_get_round_trips() {
  let f = fixture().await;
  let (status, put) = send(
    &f,
    "PUT",
    "/channels/Streamer/actions/weather",
    Some(json!({"minutesBetween": 30, "alertsOnly": true})),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(put["channel"], "streamer");

  let (status, got) = send(&f, "GET", "/channels/streamer/actions/WEATHER", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(got["kind"], "weather");
  assert_eq!(got["enabled"], true);
  assert_eq!(got["minutesBetween"], 30);
  assert_eq!(got["alertsOnly"], true);
}

#[tokio::test]
async fn put_replaces_rather_than_merges() {
  let f = fixture().await;
  send(&f, "PUT", "/channels/a/actions/weather", Some(json!({"minutesBetween": 30}))).await;
  let (_, replaced) = send(&f, "PUT", "/channels/a/actions/weather", Some(json!({}))).await;
  assert_eq!(replaced["minutesBetween"], Value::Null);
}

#[tokio::test]
async fn missing_action_is_not_found() {
  let f = fixture().await;
  let (status, body) = send(&f, "GET", "/channels/a/actions/super_trivia", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].as_str().unwrap().contains("super_trivia"));
}

#[tokio::test]
async fn unknown_kind_is_a_bad_request() {
  let f = fixture().await;
  let (status, body) = send(&f, "GET", "/channels/a/actions/karaoke", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());
}

#[tokio::test]
async fn patch_creates_from_defaults_and_keeps_other_fields() {
  let f = fixture().await;
  let (status, created) = send(
    &f,
    "PATCH",
    "/channels/a/actions/word_of_the_day",
    Some(json!({"languageCode": "ja", "minutesBetween": 45})),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(created["language"]["name"], "Japanese");

  let (_, updated) = send(
    &f,
    "PATCH",
    "/channels/a/actions/word_of_the_day",
    Some(json!({"enabled": false})),
  )
  .await;
  assert_eq!(updated["enabled"], false);
  assert_eq!(updated["minutesBetween"], 45);
  assert_eq!(updated["language"]["wotdCode"], "ja");
}

#[tokio::test]
async fn patch_after_enabling_without_language_keeps_it_enabled() {
  let f = fixture().await;
  let (status, _) = send(&f, "PATCH", "/channels/a/actions/word_of_the_day", Some(json!({}))).await;
  assert_eq!(status, StatusCode::OK);

  let (status, body) = send(
    &f,
    "PATCH",
    "/channels/a/actions/word_of_the_day",
    Some(json!({"languageCode": "es"})),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["enabled"], true);

  let stored = f.actions.get_action("a", ActionKind::WordOfTheDay).await.unwrap().unwrap();
  assert!(stored.enabled);
}

#[tokio::test]
async fn invalid_patches_leave_the_store_untouched() {
  let f = fixture().await;
  send(&f, "PUT", "/channels/a/actions/super_trivia", Some(json!({"minutesBetween": 15}))).await;

  let (status, _) = send(
    &f,
    "PATCH",
    "/channels/a/actions/super_trivia",
    Some(json!({"minutesBetween": 0})),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = send(
    &f,
    "PATCH",
    "/channels/a/actions/word_of_the_day",
    Some(json!({"languageCode": "klingon"})),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let stored = f.actions.get_action("a", ActionKind::SuperTrivia).await.unwrap().unwrap();
  assert_eq!(stored.minutes_between, Some(15));
  assert!(f.actions.get_action("a", ActionKind::WordOfTheDay).await.unwrap().is_none());
}

#[tokio::test]
async fn null_interval_resets_to_default() {
  let f = fixture().await;
  send(&f, "PUT", "/channels/a/actions/weather", Some(json!({"minutesBetween": 30}))).await;
  let (_, body) = send(
    &f,
    "PATCH",
    "/channels/a/actions/weather",
    Some(json!({"minutesBetween": null})),
  )
  .await;
  assert_eq!(body["minutesBetween"], Value::Null);
}

#[tokio::test]
async fn list_returns_every_kind_for_the_channel() {
  let f = fixture().await;
  send(&f, "PUT", "/channels/a/actions/weather", Some(json!({}))).await;
  send(&f, "PUT", "/channels/a/actions/super_trivia", Some(json!({}))).await;
  send(&f, "PUT", "/channels/b/actions/weather", Some(json!({}))).await;

  let (status, body) = send(&f, "GET", "/channels/a/actions", None).await;
  assert_eq!(status, StatusCode::OK);
  let kinds: Vec<&str> = body.as_array().unwrap().iter().map(|a| a["kind"].as_str().unwrap()).collect();
  assert_eq!(kinds, ["super_trivia", "weather"]);
}

// ─── Most recent ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn most_recent_reflects_the_store() {
  let f = fixture().await;
  let (status, _) = send(&f, "GET", "/channels/a/most-recent", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let fired_at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
  f.most_recent.set("a", ActionKind::Weather, fired_at).await.unwrap();

  let (status, body) = send(&f, "GET", "/channels/A/most-recent", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["kind"], "weather");
  assert_eq!(body["channel"], "a");
}

// ─── Languages ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn languages_lists_only_word_sources() {
  let f = fixture().await;
  let (status, body) = send(&f, "GET", "/languages", None).await;
  assert_eq!(status, StatusCode::OK);
  let entries = body.as_array().unwrap();
  assert!(entries.iter().all(|e| e["wotdCode"].is_string()));
  assert!(entries.iter().any(|e| e["wotdCode"] == "ja"));
}
