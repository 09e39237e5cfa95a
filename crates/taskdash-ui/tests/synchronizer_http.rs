//! The synchronizer driven through the real HTTP client against wiremock.

use std::sync::Arc;
use std::time::Duration;

use taskdash_services::{TaskClient, TaskId};
use taskdash_ui::{ChannelNotifier, NotificationLevel, Outcome, SyncOptions, TaskListSynchronizer};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn options() -> SyncOptions {
    SyncOptions {
        header_label: "To-Do".into(),
        delete_delay: Duration::ZERO,
        entrance: Duration::ZERO,
    }
}

fn synchronizer(
    server: &MockServer,
) -> (
    TaskListSynchronizer<TaskClient>,
    std::sync::mpsc::Receiver<taskdash_ui::Notification>,
) {
    let client = TaskClient::new(&server.uri(), Some("csrftoken=tok".to_string())).unwrap();
    let (notifier, rx) = ChannelNotifier::new();
    (
        TaskListSynchronizer::new(Arc::new(client), Arc::new(notifier), options()),
        rx,
    )
}

async fn mount_list(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/todos/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_add_then_toggle_over_http() {
    let server = MockServer::start().await;
    mount_list(&server, serde_json::json!([])).await;

    Mock::given(method("POST"))
        .and(path("/api/todos/add/"))
        .and(body_json(serde_json::json!({ "text": "Buy milk" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 1, "text": "Buy milk", "is_done": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/todos/toggle/1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "updated", "is_done": true
        })))
        .mount(&server)
        .await;

    let (sync, rx) = synchronizer(&server);
    assert_eq!(sync.load().await, Outcome::Applied);
    assert_eq!(sync.header(), "To-Do");

    assert_eq!(sync.add(" Buy milk ").await, Outcome::Applied);
    assert_eq!(sync.tasks().len(), 1);
    assert_eq!(sync.header(), "To-Do (0/1)");

    assert_eq!(sync.toggle(&TaskId::from(1)).await, Outcome::Applied);
    assert!(sync.tasks()[0].is_done);
    assert!(sync.row(&TaskId::from(1)).unwrap().done);
    assert_eq!(sync.header(), "To-Do (1/1)");

    let levels: Vec<_> = rx.try_iter().map(|n| n.level).collect();
    assert_eq!(
        levels,
        vec![NotificationLevel::Success, NotificationLevel::Success]
    );
}

#[tokio::test]
async fn test_failed_delete_over_http_keeps_task() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        serde_json::json!([
            { "id": 1, "text": "Lab report", "is_done": false },
            { "id": 2, "text": "Return books", "is_done": true }
        ]),
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/api/todos/delete/1/"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let (sync, rx) = synchronizer(&server);
    sync.load().await;

    assert_eq!(sync.delete(&TaskId::from(1)).await, Outcome::Failed);

    assert_eq!(sync.tasks().len(), 2);
    assert_eq!(sync.rows().len(), 2);
    assert!(!sync.row(&TaskId::from(1)).unwrap().is_busy());
    let notes: Vec<_> = rx.try_iter().collect();
    assert_eq!(notes.len(), 1);
    assert!(notes[0].message.contains("signed in"));
}

#[tokio::test]
async fn test_successful_delete_over_http() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        serde_json::json!([
            { "id": 1, "text": "Lab report", "is_done": false },
            { "id": 2, "text": "Return books", "is_done": true }
        ]),
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/api/todos/delete/1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "deleted"
        })))
        .mount(&server)
        .await;

    let (sync, _rx) = synchronizer(&server);
    sync.load().await;

    assert_eq!(sync.delete(&TaskId::from(1)).await, Outcome::Applied);
    let ids: Vec<_> = sync.tasks().into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![TaskId::from(2)]);
    assert_eq!(sync.header(), "To-Do (1/1)");
}
