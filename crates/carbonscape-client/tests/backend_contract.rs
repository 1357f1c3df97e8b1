//! Contract tests against an in-process fake of the projection backend.
//!
//! Each test starts an Axum router on an ephemeral port and drives the
//! real `reqwest` client at it, so status mapping, JSON shapes, and the
//! fallback chain are exercised over actual HTTP.

#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use carbonscape_client::{
    BackendClient, ClientError, DatasetResolver, LocalState, MemoryStore, Session,
};
use carbonscape_core::config::BackendConfig;
use carbonscape_core::dataset::DataSource;
use carbonscape_types::{ProjectionDataset, Suggestion, UserId, YearLabel};
use serde_json::{Value, json};

const KNOWN_USER: &str = "u-1";
const KNOWN_EMAIL: &str = "ada@example.com";

/// Mutable state of the fake backend.
#[derive(Default)]
struct FakeBackend {
    items: HashMap<String, f64>,
    actions: Vec<Value>,
}

type Shared = Arc<Mutex<FakeBackend>>;

fn projection_body(loss_2025: f64) -> Value {
    json!({
        "projection": {
            "2025": {
                "carbonScore": 65.0,
                "trees": loss_2025,
                "lake": { "color": "#1E90FF", "clarity": 0.8 },
                "animals": { "deer": 0.9, "fox": 0.9, "fish": 0.9, "bird": 0.9 },
                "sky": { "fog": 0.02 },
                "suggestions": ["ignored by the client"]
            },
            "2030": { "carbonScore": 40.0, "trees": loss_2025 + 10.0 }
        }
    })
}

fn not_found(detail: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": detail }))).into_response()
}

async fn stored_projection(Path(user): Path<String>) -> Response {
    match user.as_str() {
        KNOWN_USER => Json(projection_body(30.0)).into_response(),
        "garbled" => (StatusCode::OK, "definitely not json").into_response(),
        "empty" => Json(json!({ "projection": {} })).into_response(),
        "broken" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        _ => not_found("No projection found for user"),
    }
}

async fn computed_projection(Path(user): Path<String>) -> Response {
    if user == KNOWN_USER {
        Json(projection_body(20.0)).into_response()
    } else {
        not_found("No items found for user")
    }
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["email"] == KNOWN_EMAIL {
        Json(json!({ "status": "ok", "mode": "login", "user_id": KNOWN_USER })).into_response()
    } else {
        not_found("No user found")
    }
}

async fn signup(Json(body): Json<Value>) -> Response {
    if body["email"] == KNOWN_EMAIL {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "User already exists" })),
        )
            .into_response()
    } else {
        Json(json!({ "status": "ok", "mode": "signup", "user_id": "u-2" })).into_response()
    }
}

async fn get_items(State(state): State<Shared>, Path(user): Path<String>) -> Response {
    if user != KNOWN_USER {
        return not_found("No items found for user");
    }
    let items = state.lock().unwrap().items.clone();
    Json(json!({ "items": items })).into_response()
}

async fn patch_items(
    State(state): State<Shared>,
    Path(_user): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let deltas: HashMap<String, f64> = serde_json::from_value(body["items"].clone()).unwrap();
    if deltas.contains_key("boom") {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let mut backend = state.lock().unwrap();
    for (name, delta) in deltas {
        *backend.items.entry(name).or_insert(0.0) += delta;
    }
    let mut body = projection_body(45.0);
    body["status"] = json!("ok");
    body["items"] = json!(backend.items);
    Json(body).into_response()
}

async fn suggestions(Query(query): Query<HashMap<String, String>>) -> Response {
    let year: i64 = query.get("year").and_then(|y| y.parse().ok()).unwrap_or(0);
    if year >= 2040 {
        return Json(json!({ "year": year, "suggestions": [] })).into_response();
    }
    Json(json!({
        "year": year,
        "suggestions": [
            { "suggestion": "Switch to public transport", "impact": { "car": -1.0 } },
            { "suggestion": "Raise the thermostat", "impact": { "ac": -0.2 } }
        ]
    }))
    .into_response()
}

async fn take_action(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    state.lock().unwrap().actions.push(body);
    let mut response = projection_body(10.0);
    response["status"] = json!("ok");
    response["tx_sig"] = json!("sig-123");
    Json(response).into_response()
}

async fn spawn_backend() -> (SocketAddr, Shared) {
    let state: Shared = Arc::new(Mutex::new(FakeBackend::default()));
    state.lock().unwrap().items.insert("car".to_owned(), 1.0);

    let app = Router::new()
        .route("/projections/{id}", get(stored_projection))
        .route("/projection/{id}", get(computed_projection))
        .route("/login", post(login))
        .route("/signup", post(signup))
        .route("/items/{id}", get(get_items).patch(patch_items))
        .route("/ai_suggestions/{id}", get(suggestions))
        .route("/take_action/{id}", post(take_action))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    (addr, state)
}

fn client_for(addr: SocketAddr) -> BackendClient {
    BackendClient::new(&BackendConfig {
        base_url: format!("http://{addr}/"),
        request_timeout_ms: 2_000,
    })
    .unwrap()
}

fn memory_state() -> LocalState<MemoryStore> {
    LocalState::new(Arc::new(MemoryStore::new()), "carbonscape")
}

// =========================================================================
// Raw client
// =========================================================================

#[tokio::test]
async fn fetch_returns_raw_convention() {
    let (addr, _) = spawn_backend().await;
    let client = client_for(addr);
    assert_eq!(client.base_url(), format!("http://{addr}"));

    let raw = client.fetch_projection(&UserId::from(KNOWN_USER)).await.unwrap();
    let year = raw.0.get(&YearLabel::from("2025")).unwrap();
    assert_eq!(year.trees, Some(30.0));
}

#[tokio::test]
async fn statuses_are_classified() {
    let (addr, _) = spawn_backend().await;
    let client = client_for(addr);

    let missing = client.fetch_projection(&UserId::from("nobody")).await;
    assert!(matches!(
        missing,
        Err(ClientError::NoDataAvailable { detail: Some(ref d) }) if d == "No projection found for user"
    ));

    let garbled = client.fetch_projection(&UserId::from("garbled")).await;
    assert!(matches!(garbled, Err(ClientError::MalformedResponse { .. })));

    let broken = client.fetch_projection(&UserId::from("broken")).await;
    assert!(matches!(broken, Err(ClientError::NetworkUnavailable { .. })));
}

#[tokio::test]
async fn unreachable_backend_is_network_unavailable() {
    // Bind and immediately release a port so nothing is listening on it.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(addr);
    let result = client.fetch_projection(&UserId::from(KNOWN_USER)).await;
    let err = result.unwrap_err();
    assert!(matches!(err, ClientError::NetworkUnavailable { .. }));
    assert_eq!(err.user_message(), "Server not reachable.");
}

// =========================================================================
// Resolution over HTTP
// =========================================================================

#[tokio::test]
async fn live_resolution_normalizes_and_caches() {
    let (addr, _) = spawn_backend().await;
    let state = memory_state();
    let resolver = DatasetResolver::new(client_for(addr), state.clone());
    let user = UserId::from(KNOWN_USER);

    let resolved = resolver.resolve(Some(&user)).await;
    assert_eq!(resolved.source, DataSource::Live);
    let year = resolved.dataset.get(&YearLabel::from("2025")).unwrap();
    assert!((year.tree_coverage - 70.0).abs() < f64::EPSILON);
    assert!((year.sky.fog - 0.02).abs() < f64::EPSILON);
    let later = resolved.dataset.get(&YearLabel::from("2030")).unwrap();
    assert!((later.tree_coverage - 60.0).abs() < f64::EPSILON);
    assert!((later.lake.clarity - 1.0).abs() < f64::EPSILON);

    let cached = state.cached_projection(&user).await.unwrap().unwrap();
    assert_eq!(cached.projection, *resolved.dataset);
}

#[tokio::test]
async fn missing_projection_uses_cache_then_sample() {
    let (addr, _) = spawn_backend().await;
    let state = memory_state();
    let resolver = DatasetResolver::new(client_for(addr), state.clone());
    let user = UserId::from("nobody");

    let resolved = resolver.resolve(Some(&user)).await;
    assert_eq!(resolved.source, DataSource::Sample);

    let stored = ProjectionDataset::sample();
    state.save_projection(&user, &stored).await.unwrap();
    let resolved = resolver.resolve(Some(&user)).await;
    assert_eq!(resolved.source, DataSource::Cache);
    assert_eq!(*resolved.dataset, stored);
}

#[tokio::test]
async fn empty_and_garbled_projections_fall_back() {
    let (addr, _) = spawn_backend().await;
    let resolver = DatasetResolver::new(client_for(addr), memory_state());
    for user in ["empty", "garbled", "broken"] {
        let resolved = resolver.resolve(Some(&UserId::from(user))).await;
        assert_eq!(resolved.source, DataSource::Sample, "user {user}");
    }
}

// =========================================================================
// Session
// =========================================================================

#[tokio::test]
async fn login_persists_identity_and_loads_items() {
    let (addr, _) = spawn_backend().await;
    let state = memory_state();
    let mut session = Session::new(client_for(addr), state.clone());

    let user = session.login(KNOWN_EMAIL).await.unwrap();
    assert_eq!(user.as_str(), KNOWN_USER);
    assert_eq!(session.items().get("car").copied(), Some(1.0));
    assert!(session.notice().is_none());
    assert_eq!(state.identity().await.unwrap().unwrap().user_id, user);

    let restored = Session::restore(client_for(addr), state).await;
    assert_eq!(restored.user(), Some(&user));
}

#[tokio::test]
async fn rejected_login_leaves_state_untouched() {
    let (addr, _) = spawn_backend().await;
    let state = memory_state();
    let mut session = Session::new(client_for(addr), state.clone());

    let err = session.login("stranger@example.com").await.unwrap_err();
    assert!(matches!(err, ClientError::AuthenticationRejected { .. }));
    assert_eq!(session.notice(), Some("No user found"));
    assert!(session.user().is_none());
    assert!(state.identity().await.unwrap().is_none());

    let err = session.signup("Ada", KNOWN_EMAIL).await.unwrap_err();
    assert!(matches!(err, ClientError::AuthenticationRejected { .. }));
    assert_eq!(session.notice(), Some("User already exists"));
}

#[tokio::test]
async fn signup_creates_identity() {
    let (addr, _) = spawn_backend().await;
    let mut session = Session::new(client_for(addr), memory_state());
    let user = session.signup("Grace", "grace@example.com").await.unwrap();
    assert_eq!(user.as_str(), "u-2");
    // Item load for a brand-new user 404s and is swallowed.
    assert!(session.items().is_empty());
}

#[tokio::test]
async fn failed_item_add_keeps_previous_items() {
    let (addr, _) = spawn_backend().await;
    let mut session = Session::new(client_for(addr), memory_state());
    session.login(KNOWN_EMAIL).await.unwrap();
    let before = session.items().clone();

    let err = session.add_item("boom", 1.0).await.unwrap_err();
    assert!(matches!(err, ClientError::NetworkUnavailable { .. }));
    assert_eq!(session.items(), &before);
    assert!(session.notice().is_some());

    // Blank input is a no-op, not a request.
    assert!(session.add_item("  ", 3.0).await.unwrap().is_none());
    assert_eq!(session.items(), &before);
}

#[tokio::test]
async fn item_add_merges_and_refreshes_dataset() {
    let (addr, _) = spawn_backend().await;
    let state = memory_state();
    let mut session = Session::new(client_for(addr), state.clone());
    let user = session.login(KNOWN_EMAIL).await.unwrap();

    let dataset = session.add_item("car", 2.0).await.unwrap().unwrap();
    assert_eq!(session.items().get("car").copied(), Some(3.0));
    assert_eq!(dataset.source, DataSource::Live);
    let year = dataset.dataset.get(&YearLabel::from("2025")).unwrap();
    assert!((year.tree_coverage - 55.0).abs() < f64::EPSILON);
    assert_eq!(
        state.cached_projection(&user).await.unwrap().unwrap().projection,
        *dataset.dataset
    );

    let refreshed = session.refresh_items().await.unwrap();
    assert_eq!(refreshed.get("car").copied(), Some(3.0));
}

#[tokio::test]
async fn projection_request_normalizes_fresh_computation() {
    let (addr, _) = spawn_backend().await;
    let mut session = Session::new(client_for(addr), memory_state());

    let err = session.request_projection().await.unwrap_err();
    assert!(matches!(err, ClientError::AuthenticationRejected { .. }));

    session.login(KNOWN_EMAIL).await.unwrap();
    let resolved = session.request_projection().await.unwrap();
    let year = resolved.dataset.get(&YearLabel::from("2025")).unwrap();
    assert!((year.tree_coverage - 80.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn suggestions_and_actions_round_trip() {
    let (addr, backend) = spawn_backend().await;
    let mut session = Session::new(client_for(addr), memory_state());
    session.login(KNOWN_EMAIL).await.unwrap();

    let year = YearLabel::from("2030");
    let suggestions = session.suggestions(&year).await.unwrap();
    assert_eq!(suggestions.len(), 2);

    let chosen: &Suggestion = suggestions.first().unwrap();
    let outcome = session.take_action(&year, chosen).await.unwrap();
    assert_eq!(outcome.tx_sig.as_deref(), Some("sig-123"));
    assert!(outcome.dataset.is_some());
    assert_eq!(session.notice(), Some("Action successfully applied!"));

    let recorded = backend.lock().unwrap().actions.clone();
    let action = recorded.first().unwrap();
    assert_eq!(action["year"], 2030);
    assert_eq!(action["action_type"], "ai_suggestion");
    assert_eq!(action["impact"]["car"], -1.0);

    let none = session.suggestions(&YearLabel::from("2040")).await.unwrap();
    assert!(none.is_empty());
    assert_eq!(
        session.notice(),
        Some("No AI suggestions returned. Try again later.")
    );
}

#[tokio::test]
async fn logout_clears_identity_and_cache() {
    let (addr, _) = spawn_backend().await;
    let state = memory_state();
    let mut session = Session::new(client_for(addr), state.clone());
    let user = session.login(KNOWN_EMAIL).await.unwrap();
    session.request_projection().await.unwrap();
    assert!(state.cached_projection(&user).await.unwrap().is_some());

    session.logout().await;
    assert!(session.user().is_none());
    assert!(session.items().is_empty());
    assert!(state.identity().await.unwrap().is_none());
    assert!(state.cached_projection(&user).await.unwrap().is_none());
}
