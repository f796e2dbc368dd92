//! Request dispatcher.
//!
//! Maps method + path to the patient handlers and pins down the full
//! error surface of the API: unknown paths answer 404 with the
//! available-endpoint hint, unsupported methods answer 405, and
//! id-shape mismatches (POST with an id, PUT/PATCH/DELETE without one)
//! answer the specific 400 messages. A permissive CORS layer wraps the
//! whole router and trailing slashes are trimmed before matching.

use axum::http::{header, Method, StatusCode};
use axum::routing::get;
use axum::Router;
use tower::Layer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

use crate::api::endpoints;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;

/// Build the API router.
pub fn api_router(ctx: ApiContext) -> Router {
    let collection = get(endpoints::patients::list)
        .post(endpoints::patients::create)
        .put(update_requires_id)
        .patch(partial_update_requires_id)
        .delete(delete_requires_id)
        .options(preflight)
        .fallback(method_not_allowed);

    let item = get(endpoints::patients::show)
        .post(post_with_id_rejected)
        .put(endpoints::patients::update)
        .patch(endpoints::patients::patch)
        .delete(endpoints::patients::destroy)
        .options(preflight)
        .fallback(method_not_allowed);

    Router::new()
        .route("/api/patients", collection)
        .route("/api/patients/:id", item)
        .fallback(endpoint_not_found)
        .layer(cors_layer())
        .with_state(ctx)
}

/// The router wrapped with trailing-slash normalization, ready to serve.
pub fn api_service(ctx: ApiContext) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(api_router(ctx))
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// CORS preflight short-circuit: 200, empty body, no handler logic.
async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn endpoint_not_found() -> ApiError {
    ApiError::EndpointNotFound
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn post_with_id_rejected() -> ApiError {
    ApiError::BadRequest("Cannot POST to specific patient ID".into())
}

async fn update_requires_id() -> ApiError {
    ApiError::BadRequest("Patient ID required for update".into())
}

async fn partial_update_requires_id() -> ApiError {
    ApiError::BadRequest("Patient ID required for partial update".into())
}

async fn delete_requires_id() -> ApiError {
    ApiError::BadRequest("Patient ID required for delete".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::db;

    /// Tempdir-backed database so per-request connections see the same
    /// data. The guard must be kept alive for the duration of the test.
    fn test_ctx() -> (ApiContext, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("patients.db");
        db::open_database(&db_path).unwrap();
        (ApiContext::new(db_path), tmp)
    }

    fn make_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json");
        match body {
            Some(value) => builder.body(Body::from(value.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(
        app: &NormalizePath<Router>,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(make_request(method, uri, body))
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn ann() -> Value {
        json!({"name": "Ann", "age": 30, "gender": "Female", "phone": "555"})
    }

    async fn create_patient(app: &NormalizePath<Router>, body: Value) -> i64 {
        let (status, envelope) = send(app, "POST", "/api/patients", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        envelope["data"]["id"].as_i64().unwrap()
    }

    // ── routing surface ──

    #[tokio::test]
    async fn unknown_endpoint_returns_404_with_hint() {
        let (ctx, _tmp) = test_ctx();
        let app = api_service(ctx);

        for uri in ["/", "/api", "/api/doctors", "/api/patients/1/visits"] {
            let (status, body) = send(&app, "GET", uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "uri {uri}");
            assert_eq!(body["message"], "Endpoint not found. Available: /api/patients");
        }
    }

    #[tokio::test]
    async fn unsupported_method_returns_405() {
        let (ctx, _tmp) = test_ctx();
        let app = api_service(ctx);

        let (status, body) = send(&app, "TRACE", "/api/patients", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["message"], "Method not allowed");

        let (status, _) = send(&app, "TRACE", "/api/patients/1", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn options_preflight_returns_200_empty() {
        let (ctx, _tmp) = test_ctx();
        let app = api_service(ctx);

        let (status, body) = send(&app, "OPTIONS", "/api/patients", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);

        let (status, _) = send(&app, "OPTIONS", "/api/patients/1", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn trailing_slash_is_normalized() {
        let (ctx, _tmp) = test_ctx();
        let app = api_service(ctx);

        let (status, body) = send(&app, "GET", "/api/patients/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Patients retrieved successfully");
    }

    #[tokio::test]
    async fn post_with_id_is_rejected() {
        let (ctx, _tmp) = test_ctx();
        let app = api_service(ctx);

        let (status, body) = send(&app, "POST", "/api/patients/5", Some(ann())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Cannot POST to specific patient ID");
    }

    #[tokio::test]
    async fn mutations_without_id_are_rejected() {
        let (ctx, _tmp) = test_ctx();
        let app = api_service(ctx);

        let cases = [
            ("PUT", "Patient ID required for update"),
            ("PATCH", "Patient ID required for partial update"),
            ("DELETE", "Patient ID required for delete"),
        ];
        for (method, message) in cases {
            let (status, body) = send(&app, method, "/api/patients", Some(ann())).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "method {method}");
            assert_eq!(body["message"], message);
        }
    }

    #[tokio::test]
    async fn invalid_id_segment_returns_400() {
        let (ctx, _tmp) = test_ctx();
        let app = api_service(ctx);

        for uri in ["/api/patients/abc", "/api/patients/0", "/api/patients/-1"] {
            let (status, body) = send(&app, "GET", uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "uri {uri}");
            assert_eq!(body["message"], "Invalid patient ID");
        }
    }

    #[tokio::test]
    async fn cors_headers_present_for_cross_origin_request() {
        let (ctx, _tmp) = test_ctx();
        let app = api_service(ctx);

        let request = Request::builder()
            .method("GET")
            .uri("/api/patients")
            .header("Origin", "http://localhost:5173")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(
            response
                .headers()
                .get("Access-Control-Allow-Origin")
                .unwrap(),
            "*"
        );
    }

    // ── CRUD flows ──

    #[tokio::test]
    async fn create_returns_record_with_generated_fields() {
        let (ctx, _tmp) = test_ctx();
        let app = api_service(ctx);

        let (status, body) = send(&app, "POST", "/api/patients", Some(ann())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], true);
        assert_eq!(body["message"], "Patient created successfully");
        assert_eq!(body["data"]["name"], "Ann");
        assert_eq!(body["data"]["age"], 30);
        assert_eq!(body["data"]["gender"], "Female");
        assert_eq!(body["data"]["phone"], "555");
        assert!(body["data"]["id"].as_i64().unwrap() > 0);
        assert!(body["data"]["created_at"].is_string());
    }

    #[tokio::test]
    async fn create_then_fetch_round_trips() {
        let (ctx, _tmp) = test_ctx();
        let app = api_service(ctx);

        let id = create_patient(&app, ann()).await;
        let (status, body) = send(&app, "GET", &format!("/api/patients/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Patient retrieved successfully");
        assert_eq!(body["data"]["id"], id);
        assert_eq!(body["data"]["name"], "Ann");
        assert_eq!(body["data"]["phone"], "555");
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let (ctx, _tmp) = test_ctx();
        let app = api_service(ctx);

        let a = create_patient(
            &app,
            json!({"name": "A", "age": 20, "gender": "Male", "phone": "1"}),
        )
        .await;
        let b = create_patient(
            &app,
            json!({"name": "B", "age": 21, "gender": "Female", "phone": "2"}),
        )
        .await;
        let c = create_patient(
            &app,
            json!({"name": "C", "age": 22, "gender": "Other", "phone": "3"}),
        )
        .await;

        let (status, body) = send(&app, "GET", "/api/patients", None).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<i64> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![c, b, a]);
    }

    #[tokio::test]
    async fn list_empty_registry_returns_empty_data() {
        let (ctx, _tmp) = test_ctx();
        let app = api_service(ctx);

        let (status, body) = send(&app, "GET", "/api/patients", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], true);
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn full_update_replaces_record() {
        let (ctx, _tmp) = test_ctx();
        let app = api_service(ctx);

        let id = create_patient(&app, ann()).await;
        let replacement = json!({"name": "Beth", "age": 41, "gender": "Other", "phone": "999"});
        let (status, body) = send(
            &app,
            "PUT",
            &format!("/api/patients/{id}"),
            Some(replacement),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Patient updated successfully");
        assert_eq!(body["data"]["name"], "Beth");
        assert_eq!(body["data"]["age"], 41);
        assert_eq!(body["data"]["id"], id);
    }

    #[tokio::test]
    async fn full_update_requires_every_field() {
        let (ctx, _tmp) = test_ctx();
        let app = api_service(ctx);

        let id = create_patient(&app, ann()).await;
        let (status, body) = send(
            &app,
            "PUT",
            &format!("/api/patients/{id}"),
            Some(json!({"name": "Beth"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Validation failed");
        let errors = body["data"].as_array().unwrap();
        assert_eq!(errors.len(), 3);
    }

    #[tokio::test]
    async fn partial_update_changes_only_given_field() {
        let (ctx, _tmp) = test_ctx();
        let app = api_service(ctx);

        let id = create_patient(&app, ann()).await;
        let (status, body) = send(
            &app,
            "PATCH",
            &format!("/api/patients/{id}"),
            Some(json!({"age": 31})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["age"], 31);
        assert_eq!(body["data"]["name"], "Ann");
    }

    #[tokio::test]
    async fn patch_unknown_field_is_rejected_and_does_not_mutate() {
        let (ctx, _tmp) = test_ctx();
        let app = api_service(ctx);

        let id = create_patient(&app, ann()).await;
        let (status, body) = send(
            &app,
            "PATCH",
            &format!("/api/patients/{id}"),
            Some(json!({"age": 99, "nickname": "Annie"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Validation failed");
        assert!(body["data"]
            .as_array()
            .unwrap()
            .contains(&json!("Invalid field: nickname")));

        let (_, body) = send(&app, "GET", &format!("/api/patients/{id}"), None).await;
        assert_eq!(body["data"]["age"], 30);
    }

    #[tokio::test]
    async fn patch_out_of_range_age_is_rejected_and_does_not_mutate() {
        let (ctx, _tmp) = test_ctx();
        let app = api_service(ctx);

        let id = create_patient(&app, ann()).await;
        let (status, body) = send(
            &app,
            "PATCH",
            &format!("/api/patients/{id}"),
            Some(json!({"age": 200})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid age value");

        let (_, body) = send(&app, "GET", &format!("/api/patients/{id}"), None).await;
        assert_eq!(body["data"]["age"], 30);
    }

    #[tokio::test]
    async fn patch_non_numeric_age_on_existing_record() {
        let (ctx, _tmp) = test_ctx();
        let app = api_service(ctx);

        let id = create_patient(&app, ann()).await;
        let (status, body) = send(
            &app,
            "PATCH",
            &format!("/api/patients/{id}"),
            Some(json!({"age": "oops"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid age value");
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let (ctx, _tmp) = test_ctx();
        let app = api_service(ctx);

        let id = create_patient(&app, ann()).await;
        let (status, body) = send(&app, "DELETE", &format!("/api/patients/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Patient deleted successfully");
        assert!(body.get("data").is_none());

        let (status, body) = send(&app, "GET", &format!("/api/patients/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Patient not found");
    }

    #[tokio::test]
    async fn missing_record_is_404_not_500() {
        let (ctx, _tmp) = test_ctx();
        let app = api_service(ctx);

        let replacement = ann();
        let cases = [
            ("GET", None),
            ("PUT", Some(replacement.clone())),
            ("PATCH", Some(json!({"age": 31}))),
            ("DELETE", None),
        ];
        for (method, body) in cases {
            let (status, envelope) = send(&app, method, "/api/patients/9999", body).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "method {method}");
            assert_eq!(envelope["message"], "Patient not found");
        }
    }

    #[tokio::test]
    async fn malformed_body_returns_invalid_json() {
        let (ctx, _tmp) = test_ctx();
        let app = api_service(ctx);

        let request = Request::builder()
            .method("POST")
            .uri("/api/patients")
            .header("Content-Type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Invalid JSON input");
    }

    #[tokio::test]
    async fn empty_body_returns_invalid_json() {
        let (ctx, _tmp) = test_ctx();
        let app = api_service(ctx);

        let (status, body) = send(&app, "POST", "/api/patients", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid JSON input");
    }

    #[tokio::test]
    async fn create_validation_collects_missing_fields() {
        let (ctx, _tmp) = test_ctx();
        let app = api_service(ctx);

        let (status, body) = send(
            &app,
            "POST",
            "/api/patients",
            Some(json!({"name": "Ann", "age": 30})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Validation failed");
        let errors = body["data"].as_array().unwrap();
        assert!(errors.contains(&json!("gender is required")));
        assert!(errors.contains(&json!("phone is required")));
        assert_eq!(errors.len(), 2);
    }

    #[tokio::test]
    async fn create_invalid_gender_rejected() {
        let (ctx, _tmp) = test_ctx();
        let app = api_service(ctx);

        let (status, body) = send(
            &app,
            "POST",
            "/api/patients",
            Some(json!({"name": "Ann", "age": 30, "gender": "F", "phone": "555"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Gender must be Male, Female, or Other");
    }
}
