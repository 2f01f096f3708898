use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use cascaid_agent::{api, config::Config, pipeline::ReportService};
use httpmock::{Method::GET, Method::POST, MockServer};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use serde_json::{Value, json};
use tower::ServiceExt;

fn two_page_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in ["VO2 max 48 ml/kg/min", "Follow-up in six months"] {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => 2,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("save pdf");
    bytes
}

fn test_config(server: &MockServer) -> Config {
    Config {
        google_api_key: "test-key".into(),
        model_name: "gemini-1.5-flash".into(),
        gemini_base_url: server.base_url(),
        drive_base_url: server.base_url(),
        max_report_chars: 120_000,
        max_pages: None,
        server_port: 0,
        drive_access_token: Some("drive-token".into()),
        credentials_path: None,
        metadata_host: "metadata.invalid".into(),
    }
}

fn router(server: &MockServer) -> Router {
    let service = ReportService::from_config(&test_config(server)).expect("service");
    api::create_router(Arc::new(service))
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
        )
        .await
        .expect("router response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

#[tokio::test]
async fn review_runs_full_pipeline_against_google_endpoints() {
    let server = MockServer::start_async().await;
    let metadata = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/drive/v3/files/ABC123")
                .query_param("supportsAllDrives", "true")
                .query_param("fields", "id,name,mimeType")
                .header("authorization", "Bearer drive-token");
            then.status(200).json_body(json!({
                "id": "ABC123",
                "name": "Annual review.pdf",
                "mimeType": "application/pdf"
            }));
        })
        .await;
    let media = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/drive/v3/files/ABC123")
                .query_param("alt", "media");
            then.status(200)
                .header("content-type", "application/pdf")
                .body(two_page_pdf());
        })
        .await;
    let gemini = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1beta/models/gemini-1.5-flash:generateContent")
                .header("x-goog-api-key", "test-key")
                .body_contains("Jane Doe")
                .body_contains("C1")
                .body_contains("Annual")
                .body_contains("2024-01-01")
                .body_contains("VO2 max 48")
                .body_contains("Follow-up in six months");
            then.status(200).json_body(json!({
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [{ "text": "Overview: fitness improving.\n- VO2 max 48" }]
                    },
                    "finishReason": "STOP"
                }]
            }));
        })
        .await;

    let (status, body) = post_json(
        router(&server),
        "/review",
        json!({
            "file_url": "https://drive.google.com/file/d/ABC123/view",
            "cascaid_id": "C1",
            "full_name": "Jane Doe",
            "report_type": "Annual",
            "report_date": "2024-01-01"
        }),
    )
    .await;

    metadata.assert_async().await;
    media.assert_async().await;
    gemini.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["summary"], "Overview: fitness improving.\n- VO2 max 48");
}

#[tokio::test]
async fn drive_permission_error_skips_model_call() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/drive/v3/files/LOCKED");
            then.status(403).json_body(json!({
                "error": {
                    "code": 403,
                    "message": "The user does not have sufficient permissions for file LOCKED."
                }
            }));
        })
        .await;
    let gemini = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200).json_body(json!({ "candidates": [] }));
        })
        .await;

    let (status, body) = post_json(
        router(&server),
        "/process-report",
        json!({ "report_url": "https://drive.google.com/open?id=LOCKED" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(
        body["error"]
            .as_str()
            .expect("error string")
            .contains("sufficient permissions")
    );
    assert_eq!(gemini.hits_async().await, 0);
}

#[tokio::test]
async fn workspace_documents_are_exported_before_summarizing() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/drive/v3/files/DOC9")
                .query_param("fields", "id,name,mimeType");
            then.status(200).json_body(json!({
                "id": "DOC9",
                "name": "Clinic notes",
                "mimeType": "application/vnd.google-apps.document"
            }));
        })
        .await;
    let export = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/drive/v3/files/DOC9/export")
                .query_param("mimeType", "application/pdf");
            then.status(200).body(two_page_pdf());
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1beta/models/gemini-1.5-flash:generateContent");
            then.status(200).json_body(json!({
                "candidates": [{ "content": { "parts": [{ "text": "Exported summary" }] } }]
            }));
        })
        .await;

    let (status, body) = post_json(
        router(&server),
        "/process-report",
        json!({
            "report_url": "https://docs.google.com/document/d/DOC9/edit",
            "full_name": "John Roe"
        }),
    )
    .await;

    export.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "Exported summary");
    assert_eq!(body["metadata"]["full_name"], "John Roe");
    assert_eq!(body["metadata"]["cascaid_id"], "UNKNOWN");
}

#[tokio::test]
async fn unreachable_model_error_does_not_expose_api_key() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/drive/v3/files/ABC123")
                .query_param("fields", "id,name,mimeType");
            then.status(200).json_body(json!({
                "id": "ABC123",
                "name": "Annual review.pdf",
                "mimeType": "application/pdf"
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/drive/v3/files/ABC123")
                .query_param("alt", "media");
            then.status(200).body(two_page_pdf());
        })
        .await;

    let config = Config {
        google_api_key: "SUPER-SECRET-KEY".into(),
        gemini_base_url: "http://127.0.0.1:1".into(),
        ..test_config(&server)
    };
    let service = ReportService::from_config(&config).expect("service");
    let (status, body) = post_json(
        api::create_router(Arc::new(service)),
        "/review",
        json!({ "file_url": "https://drive.google.com/file/d/ABC123/view" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["ok"], false);
    assert!(!body.to_string().contains("SUPER-SECRET-KEY"));
}
