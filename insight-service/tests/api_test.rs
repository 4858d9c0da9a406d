//! HTTP-level tests for the relay endpoints.
//!
//! The model is replaced by `MockTextProvider`, so no credentials or network
//! access are needed. Run with: cargo test -p insight-service --test api_test

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::ConnectInfo,
    http::{Request, StatusCode},
    Router,
};
use insight_service::services::prompts::FALLBACK_SENTENCE;
use insight_service::services::providers::{mock::MockTextProvider, ProviderError};
use insight_service::services::AnalysisService;
use insight_service::{build_router, AppState};
use serde_json::{json, Map, Value};
use service_core::middleware::create_ip_rate_limiter;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

fn app_with(mock: &MockTextProvider) -> Router {
    app_with_limit(mock, 1_000)
}

fn app_with_limit(mock: &MockTextProvider, requests: u32) -> Router {
    let analysis = AnalysisService::new(Arc::new(mock.clone()), Duration::from_secs(5));
    let limiter = create_ip_rate_limiter(requests, 60).expect("valid rate limit");
    build_router(AppState::new(analysis, limiter))
}

fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(body.into())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Bytes) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body)
}

/// `POST /generate-data` as seen from `peer`, optionally carrying `X-Forwarded-For`.
fn generate_from(peer: [u8; 4], forwarded_for: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri("/generate-data");
    if let Some(value) = forwarded_for {
        builder = builder.header("x-forwarded-for", value);
    }
    let mut request = builder.body(Body::empty()).unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((peer, 51000))));
    request
}

fn json_of(body: &Bytes) -> Value {
    serde_json::from_slice(body).expect("response body is JSON")
}

#[tokio::test]
async fn analyze_rejects_non_object_bodies_without_calling_model() {
    let mock = MockTextProvider::replying("unused");
    let app = app_with(&mock);

    for body in ["[1, 2, 3]", "\"apenas texto\"", "42", "null", "{quebrado", ""] {
        let (status, bytes) = send(&app, post("/analyze-data", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {:?}", body);

        let json = json_of(&bytes);
        assert_eq!(json["error"], "Payload inválido");
        assert!(json["details"].is_string(), "body {:?}", body);
    }

    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn analyze_rejection_for_scalar_explains_object_requirement() {
    let app = app_with(&MockTextProvider::replying("unused"));

    let (_, bytes) = send(&app, post("/analyze-data", "[]")).await;
    assert_eq!(json_of(&bytes)["details"], "Precisa ser um JSON válido");
}

#[tokio::test]
async fn analyze_accepts_body_without_content_type() {
    let mock = MockTextProvider::replying("ok");
    let app = app_with(&mock);

    let request = Request::builder()
        .method("POST")
        .uri("/analyze-data")
        .body(Body::from(r#"{"a": 1}"#))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn analyze_echoes_payload_and_summary() {
    let mock = MockTextProvider::replying("Três pedidos pagos, nenhum alerta.");
    let app = app_with(&mock);
    let payload = json!({
        "loja": "centro",
        "pedidos": [{ "id": 1, "valor": 10.5 }, { "id": 2, "valor": 3 }],
        "ativo": true,
        "nota": null
    });

    let (status, bytes) = send(&app, post("/analyze-data", payload.to_string())).await;
    assert_eq!(status, StatusCode::OK);

    let json = json_of(&bytes);
    assert_eq!(json["entrada"], payload);
    assert_eq!(json["resumo_gerado"], "Três pedidos pagos, nenhum alerta.");
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn legacy_analyze_path_is_served() {
    let mock = MockTextProvider::replying("resumo");
    let app = app_with(&mock);

    let (status, bytes) = send(&app, post("/analize-data", r#"{"x": 1}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&bytes)["resumo_gerado"], "resumo");
}

#[tokio::test]
async fn analyze_truncates_long_payload_in_prompt() {
    let mock = MockTextProvider::replying("resumo");
    let app = app_with(&mock);

    // 80 keys pretty-print to 82 lines, above the 70 line trigger.
    let payload: Map<String, Value> = (0..80)
        .map(|i| (format!("sensor_{i:02}"), json!(i * 10)))
        .collect();
    let rendered = serde_json::to_string_pretty(&payload).unwrap();
    assert_eq!(rendered.lines().count(), 82);

    let (status, bytes) = send(&app, post("/analyze-data", Value::Object(payload.clone()).to_string())).await;
    assert_eq!(status, StatusCode::OK);

    let prompts = mock.prompts();
    assert_eq!(prompts.len(), 1);
    let prompt = &prompts[0];

    let first_fifty = rendered.lines().take(50).collect::<Vec<_>>().join("\n");
    assert!(prompt.contains(&first_fifty));
    assert!(prompt.contains("\"sensor_48\": 480"));
    assert!(!prompt.contains("\"sensor_49\""));
    assert!(!prompt.contains("\"sensor_79\""));

    // The reply still echoes the complete payload.
    assert_eq!(json_of(&bytes)["entrada"], Value::Object(payload));
}

#[tokio::test]
async fn analyze_passes_fallback_sentence_verbatim() {
    let mock = MockTextProvider::replying(FALLBACK_SENTENCE);
    let app = app_with(&mock);

    let (status, bytes) = send(&app, post("/analyze-data", r#"{"msg": "você é horrível"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json_of(&bytes)["resumo_gerado"],
        "Não foi possível analisar os dados recebidos, pois não são compatíveis com um conjunto analítico estruturado."
    );
}

#[tokio::test]
async fn analyze_reports_model_failure_as_500() {
    let mock = MockTextProvider::failing(ProviderError::NetworkError("connection reset".into()));
    let app = app_with(&mock);

    let (status, bytes) = send(&app, post("/analyze-data", r#"{"a": 1}"#)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let json = json_of(&bytes);
    assert_eq!(json["error"], "Erro ao processar com IA");
    assert_eq!(json["details"], "Network error: connection reset");
    assert!(json.get("entrada").is_none());
    assert!(json.get("resumo_gerado").is_none());
}

#[tokio::test]
async fn generate_returns_structured_json_when_parseable() {
    let mock = MockTextProvider::replying(r#"[{"a":1}]"#);
    let app = app_with(&mock);

    let (status, bytes) = send(&app, post("/generate-data", Body::empty())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&bytes), json!({ "json_para_envio": [{ "a": 1 }] }));
}

#[tokio::test]
async fn generate_returns_raw_text_when_not_json() {
    let mock = MockTextProvider::replying("not json");
    let app = app_with(&mock);

    let (status, bytes) = send(&app, post("/generate-data", Body::empty())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&bytes), json!({ "json_para_envio": "not json" }));
}

#[tokio::test]
async fn generate_ignores_request_body() {
    let mock = MockTextProvider::replying("[]");
    let app = app_with(&mock);

    let (status, _) = send(&app, post("/generate-data", "isto não é json")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, post("/generate-data", r#"{"tema": "dragões"}"#)).await;
    assert_eq!(status, StatusCode::OK);

    let prompts = mock.prompts();
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[0], prompts[1]);
    assert!(!prompts[0].contains("dragões\""));
}

#[tokio::test]
async fn generate_reports_model_failure_as_500() {
    let mock = MockTextProvider::failing(ProviderError::ApiError("quota exceeded".into()));
    let app = app_with(&mock);

    let (status, bytes) = send(&app, post("/generate-data", Body::empty())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let json = json_of(&bytes);
    assert_eq!(json["error"], "Erro ao processar com IA");
    assert!(json["details"].as_str().unwrap().contains("quota exceeded"));
    assert!(json.get("json_para_envio").is_none());
}

#[tokio::test]
async fn slow_model_is_cut_off_with_500() {
    let mock = MockTextProvider::replying("late").with_delay(Duration::from_secs(5));
    let analysis = AnalysisService::new(Arc::new(mock), Duration::from_millis(20));
    let app = build_router(AppState::new(
        analysis,
        create_ip_rate_limiter(10, 60).unwrap(),
    ));

    let (status, bytes) = send(&app, post("/generate-data", Body::empty())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_of(&bytes)["error"], "Erro ao processar com IA");
}

#[tokio::test]
async fn identical_requests_produce_identical_bytes() {
    let mock = MockTextProvider::replying(r#"{"z": 1, "a": [true, null]}"#);
    let app = app_with(&mock);
    let payload = r#"{"zeta": 1, "alpha": {"y": [1, 2], "b": "ç"}}"#;

    let (_, first) = send(&app, post("/analyze-data", payload)).await;
    let (_, second) = send(&app, post("/analyze-data", payload)).await;
    assert_eq!(first, second);

    let (_, first) = send(&app, post("/generate-data", Body::empty())).await;
    let (_, second) = send(&app, post("/generate-data", Body::empty())).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn entrada_preserves_key_order() {
    let app = app_with(&MockTextProvider::replying("ok"));

    let (_, bytes) = send(&app, post("/analyze-data", r#"{"zeta": 1, "alpha": 2}"#)).await;
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.starts_with(r#"{"entrada":{"zeta":1,"alpha":2},"resumo_gerado":"ok"}"#));
}

#[tokio::test]
async fn relay_endpoints_are_rate_limited_per_ip() {
    let mock = MockTextProvider::replying("ok");
    let app = app_with_limit(&mock, 5);

    for _ in 0..5 {
        let (status, _) = send(&app, generate_from([203, 0, 113, 9], None)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(generate_from([203, 0, 113, 9], None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("retry-after"));

    let (status, _) = send(&app, generate_from([203, 0, 113, 10], None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mock.call_count(), 6);

    // Probes are never limited.
    let mut health = Request::builder().uri("/health").body(Body::empty()).unwrap();
    health
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from(([203, 0, 113, 9], 51000))));
    let (status, _) = send(&app, health).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn spoofed_forwarded_for_does_not_bypass_limit() {
    let mock = MockTextProvider::replying("ok");
    let app = app_with_limit(&mock, 5);

    let mut accepted = 0;
    for i in 0..50 {
        let spoofed = format!("198.51.100.{}", i);
        let (status, _) = send(&app, generate_from([203, 0, 113, 20], Some(&spoofed))).await;
        if status == StatusCode::OK {
            accepted += 1;
        } else {
            assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        }
    }

    assert_eq!(accepted, 5);
    assert_eq!(mock.call_count(), 5);
}

#[tokio::test]
async fn trusted_proxy_limits_by_forwarded_client() {
    let mock = MockTextProvider::replying("ok");
    let analysis = AnalysisService::new(Arc::new(mock.clone()), Duration::from_secs(5));
    let limiter = create_ip_rate_limiter(1, 60)
        .unwrap()
        .trust_forwarded_for(true);
    let app = build_router(AppState::new(analysis, limiter));

    let proxy = [10, 0, 0, 2];
    let (status, _) = send(&app, generate_from(proxy, Some("198.51.100.1"))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, generate_from(proxy, Some("198.51.100.1"))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    let (status, _) = send(&app, generate_from(proxy, Some("198.51.100.2"))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn analyze_accepts_bodies_above_two_megabytes() {
    let mock = MockTextProvider::replying("resumo");
    let app = app_with(&mock);
    let blob = "x".repeat(3 * 1024 * 1024);
    let payload = json!({ "blob": blob });

    let (status, bytes) = send(&app, post("/analyze-data", payload.to_string())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&bytes)["entrada"]["blob"].as_str().map(str::len), Some(blob.len()));
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn analyze_echoes_integers_wider_than_64_bits() {
    let mock = MockTextProvider::replying("ok");
    let app = app_with(&mock);

    let (status, bytes) = send(
        &app,
        post("/analyze-data", r#"{"id":123456789012345678901234567890,"preco":0.1}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.starts_with(r#"{"entrada":{"id":123456789012345678901234567890,"preco":0.1}"#));
    assert!(mock.prompts()[0].contains("\"id\": 123456789012345678901234567890"));
}

#[tokio::test]
async fn probes_and_request_ids() {
    let app = app_with(&MockTextProvider::replying("ok"));

    let (status, bytes) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let json = json_of(&bytes);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "insight-service");

    let (status, _) = send(&app, Request::get("/ready").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Request::get("/metrics").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::get("/health")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers().get("x-request-id").unwrap(), "req-42");
}
