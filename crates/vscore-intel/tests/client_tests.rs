//! HTTP contract tests for the video intelligence client.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vscore_intel::{
    IndexCapabilities, IntelClient, IntelConfig, IntelError, SearchScope, VideoIntelligence,
};
use vscore_models::{IndexId, TaskId, TaskStatus, VideoAsset, VideoIdentifier};

fn client_for(server: &MockServer) -> IntelClient {
    let mut config = IntelConfig::new(server.uri(), "test-key");
    config.timeout = Duration::from_secs(5);
    IntelClient::new(config).unwrap()
}

#[tokio::test]
async fn test_list_indexes_follows_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/indexes"))
        .and(query_param("page", "1"))
        .and(header("x-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"_id": "idx_1", "index_name": "alpha"}],
            "page_info": {"page": 1, "total_page": 2}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/indexes"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"_id": "idx_2", "index_name": "beta"}],
            "page_info": {"page": 2, "total_page": 2}
        })))
        .mount(&server)
        .await;

    let indexes = client_for(&server).list_indexes().await.unwrap();
    let names: Vec<_> = indexes.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta"]);
    assert_eq!(indexes[1].id, IndexId::from("idx_2"));
}

#[tokio::test]
async fn test_create_index_sends_models() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/indexes"))
        .and(body_string_contains("marengo2.7"))
        .and(body_string_contains("\"index_name\":\"scoring\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"_id": "idx_new"})))
        .expect(1)
        .mount(&server)
        .await;

    let index = client_for(&server)
        .create_index("scoring", &IndexCapabilities::default())
        .await
        .unwrap();
    assert_eq!(index.id, IndexId::from("idx_new"));
    assert_eq!(index.name, "scoring");
}

#[tokio::test]
async fn test_create_indexing_task_uploads_file() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("clip.mp4");
    std::fs::write(&file, b"fake video bytes").unwrap();

    Mock::given(method("POST"))
        .and(path("/tasks"))
        .and(body_string_contains("fake video bytes"))
        .and(body_string_contains("idx_1"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"_id": "task_1", "video_id": "vid_9"})),
        )
        .mount(&server)
        .await;

    let task = client_for(&server)
        .create_indexing_task(&IndexId::from("idx_1"), &VideoAsset::from_path(&file))
        .await
        .unwrap();
    assert_eq!(task.id, TaskId::from("task_1"));
    assert_eq!(task.video_id, Some(VideoIdentifier::from("vid_9")));
}

#[tokio::test]
async fn test_get_task_status_maps_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tasks/task_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "task_1", "status": "indexing"
        })))
        .mount(&server)
        .await;

    let snapshot = client_for(&server)
        .get_task_status(&TaskId::from("task_1"))
        .await
        .unwrap();
    assert_eq!(snapshot.status, TaskStatus::Processing);
    assert_eq!(snapshot.video_id, None);
}

#[tokio::test]
async fn test_search_filters_to_scoped_video() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_string_contains("camera shake"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"video_id": "vid_1", "start": 1.0, "end": 3.5, "score": 88.2},
                {"video_id": "vid_other", "start": 0.0, "end": 1.0, "score": 95.0}
            ]
        })))
        .mount(&server)
        .await;

    let matches = client_for(&server)
        .semantic_search(
            &IndexId::from("idx_1"),
            "camera shake",
            &SearchScope::video(VideoIdentifier::from("vid_1")),
        )
        .await
        .unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].start, 1.0);
    assert_eq!(matches[0].end, 3.5);
}

#[tokio::test]
async fn test_describe_video_normalizes_nested_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"text": "  A tidy kitchen  "}})),
        )
        .mount(&server)
        .await;

    let text = client_for(&server)
        .describe_video(&VideoIdentifier::from("vid_1"), "Describe the scene")
        .await
        .unwrap();
    assert_eq!(text, "A tidy kitchen");
}

#[tokio::test]
async fn test_transcript_and_gist() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/indexes/idx_1/videos/vid_1"))
        .and(query_param("transcription", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "system_metadata": {"duration": 12.5},
            "transcription": [{"start": 0.0, "end": 1.5, "value": "hi all"}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/gist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "Morning routine",
            "topics": ["fitness", "routine"],
            "hashtags": ["#morning"]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let transcript = client
        .get_transcript(&IndexId::from("idx_1"), &VideoIdentifier::from("vid_1"))
        .await
        .unwrap();
    assert_eq!(transcript.duration_secs, Some(12.5));
    assert_eq!(transcript.segments[0].text, "hi all");

    let gist = client.gist(&VideoIdentifier::from("vid_1")).await.unwrap();
    assert_eq!(gist.title.as_deref(), Some("Morning routine"));
    assert_eq!(gist.topics.len(), 2);
}

#[tokio::test]
async fn test_rate_limit_carries_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tasks/task_1"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "3"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_task_status(&TaskId::from("task_1"))
        .await
        .unwrap_err();
    assert!(matches!(err, IntelError::RateLimited(Some(3000))));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_bad_request_is_not_retryable() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/indexes/idx_1/videos/vid_1"))
        .respond_with(ResponseTemplate::new(400).set_body_string("malformed id"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .delete_video(&IndexId::from("idx_1"), &VideoIdentifier::from("vid_1"))
        .await
        .unwrap_err();
    assert!(matches!(err, IntelError::BadRequest(ref body) if body == "malformed id"));
    assert!(!err.is_retryable());
}

#[test]
#[serial_test::serial]
fn test_config_from_env() {
    std::env::remove_var("VIDEO_INTEL_API_KEY");
    assert!(matches!(IntelConfig::from_env(), Err(IntelError::Config(_))));

    std::env::set_var("VIDEO_INTEL_API_KEY", "env-key");
    std::env::set_var("VIDEO_INTEL_TIMEOUT_SECS", "42");
    let config = IntelConfig::from_env().unwrap();
    assert_eq!(config.api_key, "env-key");
    assert_eq!(config.timeout, Duration::from_secs(42));
    assert_eq!(config.base_url, "https://api.twelvelabs.io/v1.3");

    std::env::remove_var("VIDEO_INTEL_API_KEY");
    std::env::remove_var("VIDEO_INTEL_TIMEOUT_SECS");
}
