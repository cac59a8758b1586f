pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health::health_handler))
        .route("/skill-analysis", post(handlers::handle_create))
        .route("/skill-analysis/history", get(handlers::handle_history))
        .route(
            "/skill-analysis/:id",
            get(handlers::handle_get).delete(handlers::handle_delete),
        );

    Router::new()
        .route("/", get(health::root_handler))
        .merge(api.clone())
        // The web client calls everything under /api.
        .nest("/api", api)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::analysis::service::AnalysisService;
    use crate::analysis::store::memory::{FailingStore, MemoryAnalysisStore};
    use crate::analysis::store::AnalysisStore;
    use crate::auth::testing::StaticVerifier;
    use crate::config::{Config, HistoryLimits};

    fn test_config() -> Config {
        Config {
            database_url: "postgres://unused".to_string(),
            database_max_connections: 1,
            session_verify_url: "http://127.0.0.1:9/v1/sessions".to_string(),
            session_verify_secret: "unused".to_string(),
            auth_timeout: Duration::from_secs(1),
            history: HistoryLimits {
                default_limit: 2,
                max_limit: 3,
            },
            cors_allowed_origins: vec![],
            port: 0,
            rust_log: "info".to_string(),
        }
    }

    fn app_with(store: Arc<dyn AnalysisStore>) -> Router {
        build_router(AppState {
            service: AnalysisService::new(store),
            verifier: Arc::new(StaticVerifier),
            config: test_config(),
        })
    }

    fn sample_body() -> Value {
        json!({
            "resume_text": "Five years building Go services",
            "job_description": "Platform engineer, Rust and Kubernetes",
            "matched_skills": ["Go"],
            "missing_skills": ["Rust"],
            "extra_skills": [],
            "match_percentage": 62.5
        })
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("authorization", format!("Bearer token-{user}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_create_then_get_as_owner_and_stranger() {
        let app = app_with(Arc::new(MemoryAnalysisStore::default()));

        let (status, created) =
            send(&app, "POST", "/skill-analysis", Some("user_1"), Some(sample_body())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["success"], true);
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["analysis_id"], id.as_str());
        assert_eq!(created["analysis"]["user_id"], "user_1");

        let (status, fetched) =
            send(&app, "GET", &format!("/skill-analysis/{id}"), Some("user_1"), None).await;
        assert_eq!(status, StatusCode::OK);
        let analysis = &fetched["analysis"];
        assert_eq!(analysis["id"], id.as_str());
        assert_eq!(analysis["resume_text"], "Five years building Go services");
        assert_eq!(analysis["matched_skills"], json!(["Go"]));
        assert_eq!(analysis["missing_skills"], json!(["Rust"]));
        assert_eq!(analysis["extra_skills"], json!([]));
        assert_eq!(analysis["match_percentage"], 62.5);

        let (status, body) =
            send(&app, "GET", &format!("/skill-analysis/{id}"), Some("user_2"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_unauthenticated_requests_never_touch_store() {
        let store = Arc::new(MemoryAnalysisStore::default());
        let app = app_with(store.clone());
        let id = uuid::Uuid::new_v4();

        let cases: [(&str, String, Option<Value>); 4] = [
            ("POST", "/skill-analysis".to_string(), Some(sample_body())),
            ("GET", "/skill-analysis/history".to_string(), None),
            ("GET", format!("/skill-analysis/{id}"), None),
            ("DELETE", format!("/skill-analysis/{id}"), None),
        ];
        for (method, uri, body) in cases {
            let (status, json) = send(&app, method, &uri, None, body).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
            assert_eq!(json["error"]["message"], "Invalid or unverifiable credential");
        }

        // Rejected by the verifier rather than missing.
        let request = Request::builder()
            .uri("/skill-analysis/history")
            .header("authorization", "Bearer forged")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_spoofed_owner_is_forbidden() {
        let store = Arc::new(MemoryAnalysisStore::default());
        let app = app_with(store.clone());
        let mut body = sample_body();
        body["user_id"] = json!("user_2");

        let (status, json) = send(&app, "POST", "/skill-analysis", Some("user_1"), Some(body)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["error"]["code"], "FORBIDDEN");
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_invalid_payloads() {
        let app = app_with(Arc::new(MemoryAnalysisStore::default()));

        let mut out_of_range = sample_body();
        out_of_range["match_percentage"] = json!(150);
        let (status, _) =
            send(&app, "POST", "/skill-analysis", Some("user_1"), Some(out_of_range)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, json) = send(
            &app,
            "POST",
            "/skill-analysis",
            Some("user_1"),
            Some(json!({"resume_text": "only this"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"]["code"], "UNPROCESSABLE_ENTITY");

        let request = Request::builder()
            .method("POST")
            .uri("/skill-analysis")
            .header("authorization", "Bearer token-user_1")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_history_limits_and_order() {
        let app = app_with(Arc::new(MemoryAnalysisStore::default()));
        let mut ids = Vec::new();
        for _ in 0..4 {
            let (_, created) =
                send(&app, "POST", "/skill-analysis", Some("user_1"), Some(sample_body())).await;
            ids.push(created["id"].as_str().unwrap().to_string());
        }

        // Configured default is 2.
        let (status, json) = send(&app, "GET", "/skill-analysis/history", Some("user_1"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["count"], 2);
        assert_eq!(json["analyses"][0]["id"], ids[3].as_str());

        // Max is 3, whether asked for more or for all.
        for uri in ["/skill-analysis/history?limit=50", "/skill-analysis/history?limit=all"] {
            let (_, json) = send(&app, "GET", uri, Some("user_1"), None).await;
            assert_eq!(json["count"], 3, "{uri}");
        }

        let (_, json) = send(&app, "GET", "/skill-analysis/history?limit=1", Some("user_1"), None).await;
        assert_eq!(json["count"], 1);

        let (status, _) =
            send(&app, "GET", "/skill-analysis/history?limit=0", Some("user_1"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) = send(
            &app,
            "GET",
            "/skill-analysis/history?limit=1&limit=2",
            Some("user_1"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");

        let (_, json) = send(&app, "GET", "/skill-analysis/history", Some("user_2"), None).await;
        assert_eq!(json["count"], 0);
    }

    #[tokio::test]
    async fn test_delete_twice_and_cross_owner() {
        let app = app_with(Arc::new(MemoryAnalysisStore::default()));
        let (_, created) =
            send(&app, "POST", "/skill-analysis", Some("user_1"), Some(sample_body())).await;
        let uri = format!("/skill-analysis/{}", created["id"].as_str().unwrap());

        let (status, _) = send(&app, "DELETE", &uri, Some("user_2"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, json) = send(&app, "DELETE", &uri, Some("user_1"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);

        let (status, _) = send(&app, "DELETE", &uri, Some("user_1"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_id_is_not_found() {
        let app = app_with(Arc::new(MemoryAnalysisStore::default()));
        let (status, _) = send(&app, "GET", "/skill-analysis/not-a-uuid", Some("user_1"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_api_prefix_serves_same_routes() {
        let app = app_with(Arc::new(MemoryAnalysisStore::default()));
        let (status, created) = send(
            &app,
            "POST",
            "/api/skill-analysis",
            Some("user_1"),
            Some(sample_body()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, json) = send(&app, "GET", "/skill-analysis/history", Some("user_1"), None).await;
        assert_eq!(json["analyses"][0]["id"], created["id"]);
    }

    #[tokio::test]
    async fn test_health_and_root() {
        let app = app_with(Arc::new(MemoryAnalysisStore::default()));
        let (status, json) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["database"], "connected");

        let (status, json) = send(&app, "GET", "/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "running");
    }

    #[tokio::test]
    async fn test_store_failure_is_generic_500() {
        let app = app_with(Arc::new(FailingStore));

        let (status, json) = send(&app, "GET", "/api/health", None, None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"]["message"], "A database error occurred");

        let (status, json) =
            send(&app, "POST", "/skill-analysis", Some("user_1"), Some(sample_body())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"]["code"], "DATABASE_ERROR");
    }
}
