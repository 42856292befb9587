//! Integration tests for the Candidate Search backend.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::db::{init_database, KeyValueStore, RosterStore, SqliteStore, StoredValue, ROSTER_KEY};
use crate::errors::AppError;
use crate::directory::stub::StubDirectory;
use crate::models::CandidateDetail;
use crate::queue::ReviewQueue;
use crate::search::RosterView;
use crate::{create_router, load_startup_roster, AppState};

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    directory: Arc<StubDirectory>,
    roster: Arc<RosterStore>,
    kv: Arc<SqliteStore>,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new(logins: &[&str]) -> Self {
        Self::with_psk(logins, Some("test-api-key".to_string())).await
    }

    async fn with_psk(logins: &[&str], psk: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let kv = Arc::new(SqliteStore::new(pool));
        let roster = Arc::new(RosterStore::new(kv.clone()));

        let directory = Arc::new(StubDirectory::with_candidates(logins));
        let queue = ReviewQueue::new(directory.clone(), roster.clone(), 10);

        // Create config
        let config = Config {
            api_psk: psk.clone(),
            db_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            directory_url: "http://directory.invalid".to_string(),
            batch_size: 10,
        };

        let state = AppState {
            queue,
            roster: roster.clone(),
            view: Arc::new(Mutex::new(RosterView::new())),
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut client_builder = Client::builder();
        if let Some(key) = psk {
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert("x-api-key", key.parse().unwrap());
            client_builder = client_builder.default_headers(headers);
        }

        TestFixture {
            client: client_builder.build().unwrap(),
            base_url,
            directory,
            roster,
            kv,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> (u16, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        (resp.status().as_u16(), resp.json().await.unwrap())
    }

    async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        (resp.status().as_u16(), resp.json().await.unwrap())
    }

    async fn put(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .put(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        (resp.status().as_u16(), resp.json().await.unwrap())
    }

    async fn delete(&self, path: &str) -> (u16, Value) {
        let resp = self.client.delete(self.url(path)).send().await.unwrap();
        (resp.status().as_u16(), resp.json().await.unwrap())
    }

    async fn seed_roster(&self, candidates: &[CandidateDetail]) {
        self.roster.save(candidates).await.unwrap();
    }
}

fn saved(login: &str, name: &str, company: &str) -> CandidateDetail {
    CandidateDetail {
        login: login.to_string(),
        id: login.len() as i64,
        name: Some(name.to_string()),
        company: Some(company.to_string()),
        ..Default::default()
    }
}

fn logins(body: &Value) -> Vec<String> {
    body["data"]["candidates"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["login"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new(&[]).await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_auth_missing_key() {
    let fixture = TestFixture::new(&[]).await;

    let resp = Client::new()
        .get(fixture.url("/api/queue"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_auth_invalid_key() {
    let fixture = TestFixture::new(&[]).await;

    let resp = Client::new()
        .get(fixture.url("/api/queue"))
        .header("x-api-key", "wrong-key")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_auth_bearer_key() {
    let fixture = TestFixture::new(&[]).await;

    let resp = Client::new()
        .get(fixture.url("/api/queue"))
        .header("authorization", "Bearer test-api-key")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_auth_disabled_without_key() {
    let fixture = TestFixture::with_psk(&[], None).await;

    let (status, body) = fixture.get("/api/queue").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["phase"], "idle");
}

#[tokio::test]
async fn test_queue_accept_flow() {
    let fixture = TestFixture::new(&["ada", "bob"]).await;

    let (status, body) = fixture.post("/api/queue/initialize", json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["phase"], "ready");
    assert_eq!(body["data"]["cursor"], 0);
    assert_eq!(body["data"]["batchLength"], 2);
    assert_eq!(body["data"]["candidate"]["login"], "ada");
    assert_eq!(body["revisionId"], 0);

    let (status, body) = fixture
        .post("/api/queue/accept", json!({"login": "ada"}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["cursor"], 1);
    assert_eq!(body["data"]["candidate"]["login"], "bob");
    assert_eq!(body["revisionId"], 1);

    let (status, body) = fixture.get("/api/roster").await;
    assert_eq!(status, 200);
    assert_eq!(logins(&body), vec!["ada"]);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["revisionId"], 1);
}

#[tokio::test]
async fn test_queue_reject_until_exhausted() {
    let fixture = TestFixture::new(&["ada", "bob"]).await;
    fixture.post("/api/queue/initialize", json!({})).await;

    let (_, body) = fixture.post("/api/queue/reject", json!({})).await;
    assert_eq!(body["data"]["cursor"], 1);

    let (status, body) = fixture.post("/api/queue/reject", json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["exhausted"], true);
    assert_eq!(body["data"]["phase"], "exhausted");
    assert!(body["data"].get("candidate").is_none());

    let (status, body) = fixture.post("/api/queue/reject", json!({})).await;
    assert_eq!(status, 409);
    assert_eq!(body["error"]["code"], "INVALID_STATE");

    // Roster untouched by rejections
    let (_, body) = fixture.get("/api/roster").await;
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn test_accept_requires_focused_candidate() {
    let fixture = TestFixture::new(&["ada", "bob"]).await;
    fixture.post("/api/queue/initialize", json!({})).await;

    let (status, body) = fixture
        .post("/api/queue/accept", json!({"login": "bob"}))
        .await;
    assert_eq!(status, 409);
    assert_eq!(body["error"]["code"], "INVALID_STATE");

    let (status, body) = fixture.post("/api/queue/accept", json!({"login": ""})).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (_, body) = fixture.get("/api/queue").await;
    assert_eq!(body["data"]["cursor"], 0);
}

#[tokio::test]
async fn test_batch_failure_is_reported_in_snapshot() {
    let fixture = TestFixture::new(&["ada"]).await;
    fixture.directory.fail_batch(true);

    let (status, body) = fixture.post("/api/queue/initialize", json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["phase"], "failed");
    assert_eq!(body["data"]["error"], "FETCH_FAILED");
    assert!(body["data"]["errorMessage"].is_string());
    assert_eq!(body["data"]["loading"], false);
}

#[tokio::test]
async fn test_empty_batch_is_reported_in_snapshot() {
    let fixture = TestFixture::new(&[]).await;

    let (_, body) = fixture.post("/api/queue/initialize", json!({})).await;
    assert_eq!(body["data"]["phase"], "empty");
    assert_eq!(body["data"]["error"], "EMPTY_RESULT");
}

#[tokio::test]
async fn test_roster_query_and_sort() {
    let fixture = TestFixture::new(&[]).await;
    fixture
        .seed_roster(&[
            saved("zed", "Zed", "Acme"),
            saved("amy", "Amy", "Initech"),
            saved("kim", "Kim", "acme labs"),
        ])
        .await;

    let (_, body) = fixture.get("/api/roster").await;
    assert_eq!(logins(&body), vec!["zed", "amy", "kim"]);
    assert_eq!(body["data"]["ascending"], true);
    assert!(body["data"].get("sortField").is_none());

    let (status, body) = fixture
        .put("/api/roster/query", json!({"query": "ACME"}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(logins(&body), vec!["zed", "kim"]);
    assert_eq!(body["data"]["matched"], 2);
    assert_eq!(body["data"]["total"], 3);

    let (_, body) = fixture
        .post("/api/roster/sort", json!({"field": "name"}))
        .await;
    assert_eq!(logins(&body), vec!["kim", "zed"]);
    assert_eq!(body["data"]["sortField"], "name");

    let (_, body) = fixture
        .post("/api/roster/sort", json!({"field": "name"}))
        .await;
    assert_eq!(logins(&body), vec!["zed", "kim"]);
    assert_eq!(body["data"]["ascending"], false);

    let (_, body) = fixture.put("/api/roster/query", json!({"query": ""})).await;
    assert_eq!(logins(&body), vec!["zed", "kim", "amy"]);

    let (_, body) = fixture.delete("/api/roster/sort").await;
    assert_eq!(logins(&body), vec!["zed", "amy", "kim"]);
}

#[tokio::test]
async fn test_roster_sort_rejects_unknown_field() {
    let fixture = TestFixture::new(&[]).await;

    let resp = fixture
        .client
        .post(fixture.url("/api/roster/sort"))
        .json(&json!({"field": "bio"}))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_client_error());
}

#[tokio::test]
async fn test_roster_remove() {
    let fixture = TestFixture::new(&[]).await;
    fixture
        .seed_roster(&[
            saved("ada", "Ada", "X"),
            saved("bob", "Bob", "Y"),
            saved("cy", "Cy", "Z"),
        ])
        .await;

    let (status, body) = fixture.delete("/api/roster/candidates/bob").await;
    assert_eq!(status, 200);
    assert_eq!(logins(&body), vec!["ada", "cy"]);
    let revision_after_remove = body["revisionId"].as_i64().unwrap();
    assert_eq!(revision_after_remove, 2);

    // Missing login is a no-op
    let (status, body) = fixture.delete("/api/roster/candidates/nobody").await;
    assert_eq!(status, 200);
    assert_eq!(logins(&body), vec!["ada", "cy"]);
    assert_eq!(body["revisionId"], revision_after_remove);
}

#[tokio::test]
async fn test_corrupt_roster_notice_is_shown_once() {
    let fixture = TestFixture::new(&[]).await;
    fixture.kv.put(ROSTER_KEY, "not-json").await.unwrap();

    let (status, body) = fixture.get("/api/roster").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["notice"], "CORRUPT_DATA");
    assert_eq!(
        body["data"]["noticeMessage"],
        "Saved candidates were corrupt and have been cleared."
    );
    assert_eq!(body["data"]["total"], 0);

    let (_, body) = fixture.get("/api/roster").await;
    assert!(body["data"].get("notice").is_none());
}

#[tokio::test]
async fn test_accept_after_reject_keeps_roster_unique() {
    let fixture = TestFixture::new(&["ada", "bob", "cy"]).await;
    fixture.post("/api/queue/initialize", json!({})).await;

    fixture
        .post("/api/queue/accept", json!({"login": "ada"}))
        .await;
    fixture.post("/api/queue/reject", json!({})).await;
    let (_, body) = fixture.post("/api/queue/accept", json!({"login": "cy"})).await;
    assert_eq!(body["data"]["exhausted"], true);

    let (_, body) = fixture.get("/api/roster").await;
    assert_eq!(logins(&body), vec!["ada", "cy"]);
}

/// Store whose reads succeed with corrupt data but whose writes fail.
struct ReadOnlyCorruptStore;

#[async_trait]
impl KeyValueStore for ReadOnlyCorruptStore {
    async fn get(&self, _key: &str) -> Result<Option<StoredValue>, AppError> {
        Ok(Some(StoredValue {
            value: "{broken".to_string(),
            revision: 3,
        }))
    }

    async fn put(&self, _key: &str, _value: &str) -> Result<i64, AppError> {
        Err(AppError::Database("attempt to write a readonly database".to_string()))
    }
}

#[tokio::test]
async fn test_startup_survives_roster_storage_failure() {
    let roster = RosterStore::new(Arc::new(ReadOnlyCorruptStore));
    assert_eq!(load_startup_roster(&roster).await, 0);
}

#[tokio::test]
async fn test_startup_loads_saved_roster() {
    let fixture = TestFixture::new(&[]).await;
    fixture
        .seed_roster(&[saved("ada", "Ada", "X"), saved("bob", "Bob", "Y")])
        .await;
    assert_eq!(load_startup_roster(&fixture.roster).await, 2);

    fixture.kv.put(ROSTER_KEY, "not-json").await.unwrap();
    assert_eq!(load_startup_roster(&fixture.roster).await, 0);
    let (_, body) = fixture.get("/api/roster").await;
    assert_eq!(body["data"]["notice"], "CORRUPT_DATA");
}
