//! Team API key retrieval and provisioning endpoints
//!
//! Both endpoints take the same signed payload and run the same checks in a
//! fixed order: body read, signature header decoding, payload decoding,
//! field validation, then the HMAC comparison over the bytes read in the
//! first step. The key store is only consulted once all of them pass.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use tracing::{debug, error, info, instrument, Span};

use crate::api::state::AppState;
use crate::api::types::{ApiError, ProvisionResponse, RawBody};
use crate::domain::provision::{ProvisionRequest, ValidatedRequest};
use crate::infrastructure::api_key::{ProvisionError, Provisioned};
use crate::infrastructure::signature::{FAILED_AUTHENTICATION_MSG, SIGNATURE_HEADER};

type ProvisionResult = Result<(StatusCode, Json<ProvisionResponse>), ApiError>;

/// POST /internal/api/v1/apikey
#[instrument(name = "api_key", skip_all, fields(team = tracing::field::Empty))]
pub async fn api_key(State(state): State<AppState>, headers: HeaderMap, body: RawBody) -> ProvisionResult {
    debug!("Incoming internal api key request");

    let request = authenticate(&state, &headers, body.as_bytes())?;

    let keys = state
        .api_key_service
        .retrieve(&request.team)
        .await
        .map_err(reject)?;

    Ok((StatusCode::OK, Json(ProvisionResponse::keys(keys))))
}

/// POST /internal/api/v1/provision
#[instrument(name = "provision", skip_all, fields(team = tracing::field::Empty))]
pub async fn provision(State(state): State<AppState>, headers: HeaderMap, body: RawBody) -> ProvisionResult {
    debug!("Incoming provision request");

    let request = authenticate(&state, &headers, body.as_bytes())?;

    let provisioned = state
        .api_key_service
        .provision(&request.team, request.rotate)
        .await
        .map_err(reject)?;

    match provisioned {
        Provisioned::Existing(keys) => Ok((
            StatusCode::OK,
            Json(
                ProvisionResponse::keys(keys).with_message("team exists, returning existing keys"),
            ),
        )),
        Provisioned::Issued(key) => {
            let message = "API key provisioned successfully";
            info!("{}", message);

            Ok((
                StatusCode::CREATED,
                Json(ProvisionResponse::keys(vec![key]).with_message(message)),
            ))
        }
    }
}

/// Decode, validate and authenticate a request body
fn authenticate(state: &AppState, headers: &HeaderMap, data: &[u8]) -> Result<ValidatedRequest, ApiError> {
    let signature = decode_signature(headers)?;
    debug!("Request has hex encoded data in signature header");

    let request: ProvisionRequest = serde_json::from_slice(data).map_err(|e| {
        let err = ApiError::bad_request(format!("unable to unmarshal request body: {}", e));
        error!("{}", err.message);
        err
    })?;

    if !request.team.is_empty() {
        Span::current().record("team", request.team.as_str());
    }
    debug!("Request has valid JSON");

    let validated = request.validate(&state.timestamps).map_err(|e| {
        let err = ApiError::bad_request(format!("invalid request: {}", e));
        error!("{}", err.message);
        err
    })?;
    debug!("Request body validated successfully");

    if !state.verifier.verify(data, &signature) {
        error!("{}: HMAC signature error", FAILED_AUTHENTICATION_MSG);
        return Err(ApiError::failed_authentication());
    }
    debug!("HMAC signature validated successfully");

    Ok(validated)
}

fn decode_signature(headers: &HeaderMap) -> Result<Vec<u8>, ApiError> {
    let Some(value) = headers.get(SIGNATURE_HEADER) else {
        let err = ApiError::bad_request(format!("missing {} header", SIGNATURE_HEADER));
        error!("unable to validate team: {}", err.message);
        return Err(err);
    };

    value
        .to_str()
        .ok()
        .and_then(|encoded| hex::decode(encoded.trim()).ok())
        .ok_or_else(|| {
            let err = ApiError::bad_request("HMAC digest must be hex encoded");
            error!("unable to validate team: {}", err.message);
            err
        })
}

/// Log a lifecycle failure at the level its kind calls for, then map it
fn reject(err: ProvisionError) -> ApiError {
    match &err {
        ProvisionError::TeamNotFound => info!("api key requested for team with no keys"),
        ProvisionError::NoValidKeys => info!("no valid keys found for requested team"),
        ProvisionError::Backend(_)
        | ProvisionError::KeyGeneration(_)
        | ProvisionError::Persistence(_) => error!("{}", err),
    }

    ApiError::from(&err)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use axum::Router;
    use chrono::{DateTime, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::api::router::create_router;
    use crate::api::state::AppState;
    use crate::domain::api_key::{ApiKeyStore, MockApiKeyStore, MockKeySource};
    use crate::domain::provision::{FixedClock, TimestampValidator};
    use crate::domain::{DomainError, KeySet};
    use crate::infrastructure::api_key::{ApiKeyService, InMemoryApiKeyStore};
    use crate::infrastructure::signature::{generate_mac, SharedSecret};

    use super::*;

    const SECRET: &[u8] = b"provisioning-secret";
    const NOW: &str = "2024-01-01T00:00:00Z";

    fn state_with(store: Arc<dyn ApiKeyStore>) -> AppState {
        let now = DateTime::parse_from_rfc3339(NOW).unwrap().with_timezone(&Utc);
        AppState::new(store, SharedSecret::new(SECRET.to_vec()).unwrap())
            .with_timestamps(TimestampValidator::default().with_clock(Arc::new(FixedClock(now))))
    }

    fn app(store: Arc<dyn ApiKeyStore>) -> Router {
        create_router(state_with(store), 1024 * 1024)
    }

    fn payload(team: &str, rotate: bool) -> Vec<u8> {
        serde_json::to_vec(&json!({ "team": team, "rotate": rotate, "timestamp": NOW })).unwrap()
    }

    fn signed(path: &str, body: Vec<u8>) -> Request<Body> {
        let signature = hex::encode(generate_mac(&body, SECRET));
        Request::post(path)
            .header(SIGNATURE_HEADER, signature)
            .body(Body::from(body))
            .unwrap()
    }

    async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn provision_call(app: &Router, team: &str, rotate: bool) -> (StatusCode, Value) {
        call(app, signed("/internal/api/v1/provision", payload(team, rotate))).await
    }

    async fn retrieve_call(app: &Router, team: &str) -> (StatusCode, Value) {
        call(app, signed("/internal/api/v1/apikey", payload(team, false))).await
    }

    fn untouched_store() -> Arc<dyn ApiKeyStore> {
        let mut store = MockApiKeyStore::new();
        store.expect_api_keys().never();
        store.expect_rotate_api_key().never();
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_new_team_then_retrieve() {
        let app = app(Arc::new(InMemoryApiKeyStore::new()));

        let (status, body) = provision_call(&app, "payments", false).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "API key provisioned successfully");
        let keys = body["apiKeys"].as_array().unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0]["team"], "payments");
        assert_eq!(keys[0]["key"].as_str().unwrap().len(), 64);

        let (status, retrieved) = retrieve_call(&app, "payments").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(retrieved["apiKeys"], body["apiKeys"]);
        assert!(retrieved.get("message").is_none());
    }

    #[tokio::test]
    async fn test_provision_without_rotate_returns_existing_key() {
        let app = app(Arc::new(InMemoryApiKeyStore::new()));
        provision_call(&app, "payments", false).await;

        let (_, retrieved) = retrieve_call(&app, "payments").await;
        let (status, first) = provision_call(&app, "payments", false).await;
        let (_, second) = provision_call(&app, "payments", false).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["message"], "team exists, returning existing keys");
        assert_eq!(first["apiKeys"], retrieved["apiKeys"]);
        assert_eq!(first["apiKeys"], second["apiKeys"]);
    }

    #[tokio::test]
    async fn test_rotate_issues_new_key() {
        let app = app(Arc::new(InMemoryApiKeyStore::new()));
        let (_, first) = provision_call(&app, "payments", false).await;

        let (status, rotated) = provision_call(&app, "payments", true).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_ne!(rotated["apiKeys"][0]["key"], first["apiKeys"][0]["key"]);

        let (_, retrieved) = retrieve_call(&app, "payments").await;
        assert_eq!(retrieved["apiKeys"], rotated["apiKeys"]);
    }

    #[tokio::test]
    async fn test_retrieve_unknown_team() {
        let app = app(Arc::new(InMemoryApiKeyStore::new()));

        let (status, body) = retrieve_call(&app, "payments").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "no api key found for team" }));
    }

    #[tokio::test]
    async fn test_retrieve_team_with_only_expired_keys() {
        let mut store = MockApiKeyStore::new();
        store.expect_api_keys().returning(|team| {
            let past = Utc::now() - chrono::Duration::days(1);
            Ok(KeySet::new(vec![crate::domain::ApiKey::new(
                crate::domain::KeyMaterial::new(vec![1u8; 32]),
                team.clone(),
                past - chrono::Duration::days(1),
                past,
            )]))
        });
        store.expect_rotate_api_key().never();

        let (status, body) = retrieve_call(&app(Arc::new(store)), "payments").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "no valid keys for team found" }));
    }

    #[tokio::test]
    async fn test_empty_team_rejected_before_store() {
        let app = app(untouched_store());

        let (status, body) = provision_call(&app, "", false).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "invalid request: no team specified");

        let (status, _) = retrieve_call(&app, "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_tampered_body_rejected() {
        let app = app(untouched_store());
        let body = payload("payments", false);
        let signature = hex::encode(generate_mac(&body, SECRET));

        for i in 0..body.len() {
            let mut tampered = body.clone();
            tampered[i] = if tampered[i] == b'a' { b'b' } else { b'a' };

            let request = Request::post("/internal/api/v1/provision")
                .header(SIGNATURE_HEADER, &signature)
                .body(Body::from(tampered))
                .unwrap();

            let (status, response) = call(&app, request).await;
            assert_ne!(status, StatusCode::CREATED, "byte {} not covered", i);
            assert!(status.is_client_error());
            assert!(response["message"].is_string());
        }
    }

    #[tokio::test]
    async fn test_edited_body_that_still_validates_is_forbidden() {
        let app = app(untouched_store());
        let body = String::from_utf8(payload("payments", false)).unwrap();
        let signature = hex::encode(generate_mac(body.as_bytes(), SECRET));

        let edits = [
            body.replace("payments", "paymenta"),
            body.replace("false", "true"),
            body.replace("00:00:00Z", "00:00:01Z"),
            format!("{} ", body),
        ];

        for edited in edits {
            assert_ne!(edited, body);
            let request = Request::post("/internal/api/v1/provision")
                .header(SIGNATURE_HEADER, &signature)
                .body(Body::from(edited.clone()))
                .unwrap();

            let (status, response) = call(&app, request).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{}", edited);
            assert_eq!(response, json!({ "message": "failed authentication" }));
        }
    }

    #[tokio::test]
    async fn test_signature_mismatch_is_forbidden() {
        let app = app(untouched_store());
        let request = Request::post("/internal/api/v1/provision")
            .header(SIGNATURE_HEADER, hex::encode(generate_mac(b"other body", SECRET)))
            .body(Body::from(payload("payments", true)))
            .unwrap();

        let (status, body) = call(&app, request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({ "message": "failed authentication" }));
    }

    #[tokio::test]
    async fn test_signature_covers_raw_bytes() {
        let app = app(Arc::new(InMemoryApiKeyStore::new()));
        let body = format!(
            "{{\n  \"timestamp\": \"{}\",\n  \"rotate\": false,\n  \"team\": \"payments\"\n}}",
            NOW
        );

        let (status, _) = call(&app, signed("/internal/api/v1/provision", body.into_bytes())).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_missing_signature_header() {
        let app = app(untouched_store());
        let request = Request::post("/internal/api/v1/apikey")
            .body(Body::from(payload("payments", false)))
            .unwrap();

        let (status, body) = call(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "missing x-signature header");
    }

    #[tokio::test]
    async fn test_signature_not_hex() {
        let app = app(untouched_store());
        let request = Request::post("/internal/api/v1/apikey")
            .header(SIGNATURE_HEADER, "not-hex")
            .body(Body::from(payload("payments", false)))
            .unwrap();

        let (status, body) = call(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "HMAC digest must be hex encoded");
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let app = app(untouched_store());

        let (status, body) = call(&app, signed("/internal/api/v1/provision", b"{not json".to_vec())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"]
            .as_str()
            .unwrap()
            .starts_with("unable to unmarshal request body"));
    }

    #[tokio::test]
    async fn test_stale_timestamp() {
        let app = app(untouched_store());
        let body = serde_json::to_vec(&json!({
            "team": "payments",
            "rotate": false,
            "timestamp": "2023-12-31T23:00:00Z"
        }))
        .unwrap();

        let (status, response) = call(&app, signed("/internal/api/v1/provision", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            response["message"],
            "invalid request: request is not within allowed timeframe"
        );
    }

    #[tokio::test]
    async fn test_unix_timestamp_accepted() {
        let app = app(Arc::new(InMemoryApiKeyStore::new()));
        let body = serde_json::to_vec(&json!({
            "team": "payments",
            "timestamp": 1_704_067_200
        }))
        .unwrap();

        let (status, _) = call(&app, signed("/internal/api/v1/provision", body)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_backend_failure_is_bad_gateway() {
        let mut store = MockApiKeyStore::new();
        store
            .expect_api_keys()
            .returning(|_| Err(DomainError::storage("connection refused")));
        store.expect_rotate_api_key().never();
        let app = app(Arc::new(store));

        let (status, body) = provision_call(&app, "payments", false).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["message"], "unable to communicate with team API key backend");

        let (status, _) = retrieve_call(&app, "payments").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_persist_failure_is_bad_gateway() {
        let mut store = MockApiKeyStore::new();
        store
            .expect_api_keys()
            .returning(|t| Err(DomainError::not_found(format!("no api keys for team '{}'", t))));
        store
            .expect_rotate_api_key()
            .returning(|_, _| Err(DomainError::storage("read-only transaction")));

        let (status, body) = provision_call(&app(Arc::new(store)), "payments", false).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["message"], "unable to persist API key");
    }

    #[tokio::test]
    async fn test_key_generation_failure_is_internal_error() {
        let store: Arc<dyn ApiKeyStore> = Arc::new(InMemoryApiKeyStore::new());
        let mut generator = MockKeySource::new();
        generator
            .expect_generate()
            .returning(|_| Err(DomainError::internal("entropy source failed")));

        let state = state_with(Arc::clone(&store)).with_api_key_service(
            ApiKeyService::new(Arc::clone(&store)).with_generator(Arc::new(generator)),
        );
        let app = create_router(state, 1024 * 1024);

        let (status, body) = provision_call(&app, "payments", false).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "unable to generate API key");

        assert!(store.api_keys(&crate::domain::TeamId::new("payments").unwrap()).await.is_err());
    }

    #[tokio::test]
    async fn test_oversized_body_rejected_as_json() {
        let app = create_router(state_with(untouched_store()), 16);

        let (status, body) = call(&app, signed("/internal/api/v1/provision", payload("payments", false))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"]
            .as_str()
            .unwrap()
            .starts_with("unable to read request body"));
    }
}
