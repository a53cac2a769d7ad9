//! `status`, `session` and `generate` against a mock service.


use assert_cmd::cargo::cargo_bin_cmd;
use fixtures::{can_bind_localhost, detail_error, generate_response, temp_home};
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_status_reports_health_and_retrieval() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "running",
            "app": "SlideForge",
            "version": "1.0.0",
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/rag-status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rag_available": true,
            "embedding_method": "sentence-transformers",
        })))
        .mount(&server)
        .await;

    cargo_bin_cmd!("slideforge")
        .env("SLIDEFORGE_HOME", home.path())
        .env("SLIDEFORGE_BASE_URL", server.uri())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("running (SlideForge 1.0.0)"))
        .stdout(predicate::str::contains(
            "Retrieval: available (sentence-transformers)",
        ));
}

#[test]
fn test_status_fails_when_unreachable() {
    let home = temp_home();

    cargo_bin_cmd!("slideforge")
        .env("SLIDEFORGE_HOME", home.path())
        .env("SLIDEFORGE_BASE_URL", "http://127.0.0.1:9")
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("reach SlideForge at http://127.0.0.1:9"));
}

#[tokio::test]
async fn test_base_url_flag_beats_env() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "running",
            "app": "SlideForge",
            "version": "1.0.0",
        })))
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("slideforge")
        .env("SLIDEFORGE_HOME", home.path())
        .env("SLIDEFORGE_BASE_URL", "http://127.0.0.1:9")
        .args(["--base-url", &server.uri(), "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Retrieval: unknown"));
}

#[tokio::test]
async fn test_session_list_and_show() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sessions": [
                {"conversation_id": "abc123", "documents": ["q3.pdf"], "has_brand": true, "rag_chunks": 12},
            ],
            "total": 1,
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/session/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "abc123",
            "documents": ["q3.pdf"],
            "has_brand_info": true,
            "has_summary": true,
            "has_deck": false,
            "message_count": 4,
            "rag_chunks": 12,
            "rag_enabled": true,
        })))
        .mount(&server)
        .await;

    cargo_bin_cmd!("slideforge")
        .env("SLIDEFORGE_HOME", home.path())
        .env("SLIDEFORGE_BASE_URL", server.uri())
        .args(["session", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("abc123  q3.pdf  brand"));

    cargo_bin_cmd!("slideforge")
        .env("SLIDEFORGE_HOME", home.path())
        .env("SLIDEFORGE_BASE_URL", server.uri())
        .args(["session", "show", "abc123"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Conversation: abc123"))
        .stdout(predicate::str::contains("Messages:     4"))
        .stdout(predicate::str::contains("Chunks:       12"));
}

#[tokio::test]
async fn test_session_show_unknown_reports_detail() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/session/missing"))
        .respond_with(detail_error(404, "Session not found"))
        .mount(&server)
        .await;

    cargo_bin_cmd!("slideforge")
        .env("SLIDEFORGE_HOME", home.path())
        .env("SLIDEFORGE_BASE_URL", server.uri())
        .args(["session", "show", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Session not found"));
}

#[tokio::test]
async fn test_generate_resumes_existing_conversation() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/session/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "abc123",
            "has_summary": true,
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/generate-slides"))
        .and(query_param("conversation_id", "abc123"))
        .respond_with(generate_response("Q3 Review", 8, "/api/download/SlideForge_abc123.pptx"))
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("slideforge")
        .env("SLIDEFORGE_HOME", home.path())
        .env("SLIDEFORGE_BASE_URL", server.uri())
        .args(["generate", "abc123"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Q3 Review (8 slides)"))
        .stdout(predicate::str::contains(format!(
            "Download: {}/api/download/SlideForge_abc123.pptx",
            server.uri()
        )));
}

#[tokio::test]
async fn test_generate_without_summary_is_refused() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/session/fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "fresh" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/generate-slides"))
        .respond_with(generate_response("never", 1, "/api/download/x.pptx"))
        .expect(0)
        .mount(&server)
        .await;

    cargo_bin_cmd!("slideforge")
        .env("SLIDEFORGE_HOME", home.path())
        .env("SLIDEFORGE_BASE_URL", server.uri())
        .args(["generate", "fresh"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot generate: upload a document first"));
}
