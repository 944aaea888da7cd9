// ============================================================================
// Estate API - Router
// File: crates/estate-api/src/router.rs
// ============================================================================

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::warn;

use crate::handlers::{accounts, auth, chats, health, properties, transactions, verification};
use crate::middleware::{session_middleware, SESSION_TOKEN_HEADER};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/auth/anonymous", post(auth::sign_in_anonymously));

    let protected_routes = Router::new()
        .route("/api/v1/me", get(auth::me))
        // Properties
        .route(
            "/api/v1/properties",
            get(properties::list_listed).post(properties::create),
        )
        .route("/api/v1/properties/mine", get(properties::list_mine))
        .route("/api/v1/properties/stream", get(properties::stream_listed))
        .route(
            "/api/v1/properties/{id}",
            get(properties::get)
                .patch(properties::update)
                .delete(properties::delete),
        )
        // Verification
        .route(
            "/api/v1/properties/{id}/verification/{action}",
            post(verification::apply),
        )
        .route("/api/v1/verification/admin-queue", get(verification::admin_queue))
        .route("/api/v1/verification/council-queue", get(verification::council_queue))
        .route("/api/v1/verification/{queue}/stream", get(verification::stream_queue))
        // Chats
        .route("/api/v1/chats", get(chats::list).post(chats::open))
        .route("/api/v1/chats/stream", get(chats::stream_list))
        .route(
            "/api/v1/chats/{id}/messages",
            get(chats::messages).post(chats::send),
        )
        .route("/api/v1/chats/{id}/messages/stream", get(chats::stream_messages))
        // Ledger
        .route("/api/v1/transactions", get(transactions::list))
        .route("/api/v1/transactions/inquiries", post(transactions::inquiry))
        .route("/api/v1/transactions/payments", post(transactions::payment))
        .route("/api/v1/transactions/{id}/status", patch(transactions::update_status))
        // Accounts
        .route("/api/v1/accounts", get(accounts::list))
        .route("/api/v1/accounts/me", put(accounts::update_me))
        .route(
            "/api/v1/accounts/{id}",
            patch(accounts::admin_update).delete(accounts::delete),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), session_middleware));

    let cors = cors_layer(&state.config.app.cors_origin);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(false)),
        )
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([header::HeaderName::from_static(SESSION_TOKEN_HEADER)]);

    if origin == "*" {
        return layer.allow_origin(Any);
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            warn!(origin, "Invalid CORS origin, cross-origin requests will be refused");
            layer
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{HeaderMap, Request, StatusCode},
    };
    use estate_infrastructure::{AnonymousIdentityProvider, RealtimeStore};
    use estate_shared::config::{AppConfig, AppSettings, AuthSettings, LedgerSettings, StoreSettings};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;

    fn test_config() -> AppConfig {
        AppConfig {
            app: AppSettings {
                env: "test".into(),
                host: "127.0.0.1".into(),
                port: 0,
                name: "estate-server".into(),
                cors_origin: "*".into(),
            },
            store: StoreSettings {
                pubsub_capacity: 16,
                op_timeout_ms: 1000,
                max_inline_image_bytes: 64 * 1024,
            },
            auth: AuthSettings {
                token_secret: "router-test-secret-value".into(),
                token_expiry_secs: 3600,
                identity_cache_capacity: 64,
            },
            ledger: LedgerSettings {
                platform_fee: 1000,
                currency: "XAF".into(),
            },
        }
    }

    fn app() -> (Router, Arc<RealtimeStore>) {
        let config = test_config();
        let store = Arc::new(RealtimeStore::from_settings(&config.store));
        let provider = Arc::new(AnonymousIdentityProvider::new(
            config.auth.token_secret.clone(),
            config.auth.token_expiry_secs,
        ));
        let state = AppState::new(config, store.clone(), provider);
        (build_router(state), store)
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, value)
    }

    async fn signed_in(app: &Router) -> String {
        let (status, _, body) = call(app, "POST", "/api/v1/auth/anonymous", None, None).await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_reports_store_metrics() {
        let (app, _) = app();
        let (status, _, body) = call(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["data"]["status"], json!("healthy"));
        assert!(body["data"]["store"].is_object());
    }

    #[tokio::test]
    async fn tokenless_caller_is_issued_a_session() {
        let (app, _) = app();
        let (status, headers, body) = call(&app, "GET", "/api/v1/properties", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([]));
        assert!(headers.contains_key(SESSION_TOKEN_HEADER));
    }

    #[tokio::test]
    async fn invalid_token_is_forbidden() {
        let (app, _) = app();
        let (status, _, body) = call(&app, "GET", "/api/v1/me", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], json!("PERMISSION_DENIED"));
    }

    #[tokio::test]
    async fn tenant_cannot_list_properties() {
        let (app, _) = app();
        let token = signed_in(&app).await;
        let listing = json!({"name": "Villa", "city": "Douala", "price": 5000});
        let (status, _, body) =
            call(&app, "POST", "/api/v1/properties", Some(token.as_str()), Some(listing)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn landlord_lists_and_submits() {
        let (app, _) = app();
        let token = signed_in(&app).await;
        let profile = json!({"username": "lan", "accountType": "landlord"});
        let (status, _, _) = call(&app, "PUT", "/api/v1/accounts/me", Some(token.as_str()), Some(profile)).await;
        assert_eq!(status, StatusCode::OK);

        let listing = json!({
            "name": "Villa",
            "city": "Douala",
            "price": 5000,
            "payment": {"method": "orange", "phoneNumber": "699123456"}
        });
        let (status, _, body) =
            call(&app, "POST", "/api/v1/properties", Some(token.as_str()), Some(listing)).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let uri = format!("/api/v1/properties/{}/verification/submit", id);
        let (status, _, body) = call(&app, "POST", &uri, Some(token.as_str()), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["verificationRequested"], json!(true));

        let (status, _, body) = call(&app, "POST", &uri, Some(token.as_str()), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], json!("INVALID_TRANSITION"));

        for action in ["approve", "verify", "unverify"] {
            let uri = format!("/api/v1/properties/{}/verification/{}", id, action);
            let (status, _, _) = call(&app, "POST", &uri, Some(token.as_str()), None).await;
            assert_eq!(status, StatusCode::FORBIDDEN);
        }

        let (_, _, body) = call(&app, "GET", "/api/v1/properties/mine", Some(token.as_str()), None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_verification_action_is_rejected() {
        let (app, _) = app();
        let token = signed_in(&app).await;
        let (status, _, body) = call(
            &app,
            "POST",
            "/api/v1/properties/p1/verification/teleport",
            Some(token.as_str()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
    }

    #[tokio::test]
    async fn offline_store_is_service_unavailable() {
        let (app, store) = app();
        let token = signed_in(&app).await;
        store.set_online(false);
        let (status, _, body) = call(&app, "GET", "/api/v1/properties", Some(token.as_str()), None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], json!("STORE_UNAVAILABLE"));
    }
}
