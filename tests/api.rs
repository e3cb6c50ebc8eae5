mod common;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use common::{ADA_TOKEN, router};

const PIECE_10_UUID: &str = "9a1f6c2e-0b7d-4d1c-9a3f-5c2e8b1d0a10";

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body should be json")
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build")
}

fn get_as_ada(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {ADA_TOKEN}"))
        .body(Body::empty())
        .expect("request should build")
}

fn with_body(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request should build")
}

fn error_code(body: &Value) -> Option<&str> {
    body.pointer("/error/code").and_then(Value::as_str)
}

fn ids(body: &Value) -> Vec<i64> {
    body["items"]
        .as_array()
        .expect("items array")
        .iter()
        .filter_map(|item| item["id"].as_i64())
        .collect()
}

#[tokio::test]
async fn health_reports_no_content_without_a_database() {
    let app = router();
    let (status, _) = send(&app, get("/_health")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn detail_defaults_to_full() {
    let app = router();
    let (status, body) = send(&app, get("/api/pieces/10")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], json!("Missa Pange lingua"));
    assert_eq!(body["url"], json!("https://elvis.example.org/api/pieces/10"));
    assert_eq!(body["composer"]["title"], json!("Josquin des Prez"));
    assert_eq!(body["movement_count"], json!(2));
    assert_eq!(body["creator"], json!("ada"));
    assert!(body["movements"].is_array());
}

#[tokio::test]
async fn detail_honours_the_tier_parameter() {
    let app = router();

    let (status, body) = send(&app, get("/api/pieces/10?tier=min")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "title": "Missa Pange lingua",
            "url": "https://elvis.example.org/api/pieces/10",
            "id": 10
        })
    );

    let (status, body) = send(&app, get("/api/movements/20?tier=emb")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["piece"]["id"], json!(10));
    assert_eq!(body["attachments"].as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn unknown_or_undeclared_tiers_are_bad_requests() {
    let app = router();

    let (status, body) = send(&app, get("/api/pieces/10?tier=detail")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), Some("invalid_tier"));

    let (status, body) = send(&app, get("/api/composers/1?tier=embed")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), Some("invalid_tier"));
}

#[tokio::test]
async fn missing_records_and_routes_are_not_found() {
    let app = router();

    let (status, body) = send(&app, get("/api/pieces/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), Some("not_found"));

    let (status, body) = send(&app, get("/api/nowhere")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), Some("not_found"));
}

#[tokio::test]
async fn malformed_requests_get_json_errors() {
    let app = router();

    let (status, body) = send(&app, get("/api/pieces/abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), Some("invalid_path"));

    let (status, body) = send(&app, get("/api/pieces?limit=abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), Some("invalid_query"));

    let (status, body) = send(
        &app,
        with_body(Method::DELETE, "/api/cache/not-a-uuid", Some(ADA_TOKEN), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), Some("invalid_path"));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/downloads/selection")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {ADA_TOKEN}"))
        .body(Body::from("{\"items\": ["))
        .expect("request should build");
    let (status, body) = send(&app, request).await;
    assert!(status.is_client_error());
    assert_eq!(error_code(&body), Some("invalid_body"));
}

#[tokio::test]
async fn attachment_links_are_only_resolved_for_authenticated_requests() {
    let app = router();

    let (status, body) = send(&app, get("/api/attachments/40")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attachment"], json!(""));
    assert_eq!(body["file_name"], json!("piece1.pdf"));

    let (status, body) = send(&app, get_as_ada("/api/attachments/40")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["attachment"],
        json!("https://elvis.example.org/static/media/scores/piece1.pdf")
    );
}

#[tokio::test]
async fn attachment_links_follow_the_request_origin() {
    let app = router();
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/attachments/40")
        .header(header::AUTHORIZATION, format!("Bearer {ADA_TOKEN}"))
        .header(header::HOST, "music.example.net:8080")
        .header("x-forwarded-proto", "http")
        .body(Body::empty())
        .expect("request should build");

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["attachment"],
        json!("http://music.example.net:8080/static/media/scores/piece1.pdf")
    );
}

#[tokio::test]
async fn untrusted_host_headers_fall_back_to_the_site_host() {
    let app = router();

    for host in ["example.org@evil.test", "evil.test/x?", "evil.test", "elvis.example.org.evil.test"] {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/attachments/40")
            .header(header::AUTHORIZATION, format!("Bearer {ADA_TOKEN}"))
            .header(header::HOST, host)
            .body(Body::empty())
            .expect("request should build");

        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK, "{host}");
        assert_eq!(
            body["attachment"],
            json!("https://elvis.example.org/static/media/scores/piece1.pdf"),
            "{host}"
        );
    }
}

#[tokio::test]
async fn unknown_or_malformed_tokens_are_rejected() {
    let app = router();

    let request = Request::builder()
        .uri("/api/pieces/10")
        .header(header::AUTHORIZATION, "Bearer not-a-token")
        .body(Body::empty())
        .expect("request should build");
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), Some("unauthorized"));

    let request = Request::builder()
        .uri("/api/pieces/10")
        .header(header::AUTHORIZATION, "Token abc")
        .body(Body::empty())
        .expect("request should build");
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn listings_page_by_id() {
    let app = router();

    let (status, first) = send(&app, get("/api/pieces?limit=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&first), [10, 11]);
    let cursor = first["next_cursor"].as_str().expect("next cursor");

    let (status, second) = send(&app, get(&format!("/api/pieces?limit=2&cursor={cursor}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&second), [12, 13]);
    assert_eq!(second["next_cursor"], Value::Null);
    assert_eq!(second["items"][1]["composer"], Value::Null);
}

#[tokio::test]
async fn listings_default_to_list_and_accept_min() {
    let app = router();

    let (_, body) = send(&app, get("/api/composers")).await;
    assert_eq!(ids(&body), [1, 2]);
    assert_eq!(body["items"][0]["piece_count"], json!(2));
    assert_eq!(body["items"][1]["movement_count"], json!(1));

    let (_, body) = send(&app, get("/api/collections?tier=min")).await;
    assert_eq!(
        body["items"],
        json!([{
            "title": "Renaissance masses",
            "url": "https://elvis.example.org/api/collections/30",
            "id": 30,
            "public": true
        }])
    );
}

#[tokio::test]
async fn bad_pagination_parameters_are_rejected() {
    let app = router();

    let (status, body) = send(&app, get("/api/pieces?cursor=@@@")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), Some("invalid_cursor"));

    let (status, _) = send(&app, get("/api/pieces?limit=0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn download_selection_filters_by_type() {
    let app = router();
    let payload = json!({ "items": [41, 42, 43, 42], "types": ["midi", "others"] });

    let (status, body) = send(
        &app,
        with_body(
            Method::POST,
            "/api/downloads/selection",
            Some(ADA_TOKEN),
            payload,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["items"],
        json!([
            {
                "id": 42,
                "file_name": "kyrie.mid",
                "extension": "mid",
                "url": "https://elvis.example.org/static/media/audio/kyrie.mid"
            },
            {
                "id": 43,
                "file_name": "kyrie.txt",
                "extension": "txt",
                "url": "https://elvis.example.org/static/media/notes/kyrie.txt"
            }
        ])
    );
}

#[tokio::test]
async fn download_selection_requires_a_token() {
    let app = router();
    let payload = json!({ "items": [40], "types": ["pdf"] });

    let (status, _) = send(
        &app,
        with_body(Method::POST, "/api/downloads/selection", None, payload),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn download_selection_reports_unknown_attachments() {
    let app = router();
    let payload = json!({ "items": [40, 404], "types": ["pdf"] });

    let (status, body) = send(
        &app,
        with_body(
            Method::POST,
            "/api/downloads/selection",
            Some(ADA_TOKEN),
            payload,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), Some("not_found"));
}

#[tokio::test]
async fn purging_drops_every_cached_tier_of_a_record() {
    let app = router();
    let uri = format!("/api/cache/{PIECE_10_UUID}");

    let (status, _) = send(&app, get("/api/pieces/10?tier=list")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, get("/api/pieces/10?tier=embed")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        with_body(Method::DELETE, &uri, None, json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        with_body(Method::DELETE, &uri, Some(ADA_TOKEN), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["uuid"], json!(PIECE_10_UUID));
    // LIST, EMB and the MIN written while embedding the movements.
    assert_eq!(body["removed"], json!(3));

    let (_, body) = send(
        &app,
        with_body(Method::DELETE, &uri, Some(ADA_TOKEN), json!({})),
    )
    .await;
    assert_eq!(body["removed"], json!(0));
}
