use chrono::{Duration as ChronoDuration, Utc};
use familib_auth::{SessionClaims, SessionUserId};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(session_secret: &str) -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        let app = familib_api::app::build_app(session_secret.to_string()).await;
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_session(session_secret: &str) -> String {
    let now = Utc::now();
    let claims = SessionClaims {
        sub: SessionUserId::new(),
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(session_secret.as_bytes()),
    )
    .expect("failed to encode session token")
}

async fn add_book(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    title: &str,
    owner_name: &str,
) -> serde_json::Value {
    let res = client
        .post(format!("{}/books", base_url))
        .bearer_auth(token)
        .json(&json!({ "title": title, "owner_name": owner_name }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

async fn add_member(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    name: &str,
) -> serde_json::Value {
    let res = client
        .post(format!("{}/members", base_url))
        .bearer_auth(token)
        .json(&json!({ "name": name }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

async fn lend(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    book_id: &str,
    borrower_id: &str,
) -> reqwest::Response {
    client
        .post(format!("{}/loans", base_url))
        .bearer_auth(token)
        .json(&json!({ "book_id": book_id, "borrower_id": borrower_id }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn health_is_open_but_api_requires_a_session() {
    let secret = "test-secret";
    let srv = TestServer::spawn(secret).await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/books", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // A token signed with the wrong secret is rejected too.
    let bad_token = mint_session("other-secret");
    let res = client
        .get(format!("{}/books", srv.base_url))
        .bearer_auth(bad_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn whoami_reflects_the_session_subject() {
    let secret = "test-secret";
    let srv = TestServer::spawn(secret).await;
    let token = mint_session(secret);

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/whoami", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["user_id"].as_str().is_some());
}

#[tokio::test]
async fn adding_a_book_creates_its_owner_once() {
    let secret = "test-secret";
    let srv = TestServer::spawn(secret).await;
    let token = mint_session(secret);
    let client = reqwest::Client::new();

    add_book(&client, &srv.base_url, &token, "The Hobbit", "Ana").await;
    add_book(&client, &srv.base_url, &token, "Dune", "Ana").await;

    // One owner, two books, sorted by title.
    let res = client
        .get(format!("{}/books", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    let titles: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Dune", "The Hobbit"]);

    let res = client
        .get(format!("{}/members", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    let members = body["items"].as_array().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["name"], "Ana");
    assert_eq!(members[0]["book_count"], 2);
    assert_eq!(members[0]["active_loans"], 0);
}

#[tokio::test]
async fn blank_title_is_rejected_before_any_write() {
    let secret = "test-secret";
    let srv = TestServer::spawn(secret).await;
    let token = mint_session(secret);
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/books", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "title": "   ", "owner_name": "Ana" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn lend_and_return_lifecycle() {
    let secret = "test-secret";
    let srv = TestServer::spawn(secret).await;
    let token = mint_session(secret);
    let client = reqwest::Client::new();

    let book = add_book(&client, &srv.base_url, &token, "The Hobbit", "Ana").await;
    let borrower = add_member(&client, &srv.base_url, &token, "Bruno").await;
    let book_id = book["id"].as_str().unwrap();
    let borrower_id = borrower["id"].as_str().unwrap();

    // Lend: the book leaves the available list, the loan shows up enriched.
    let res = lend(&client, &srv.base_url, &token, book_id, borrower_id).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .get(format!("{}/loans/available-books", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["items"].as_array().unwrap().is_empty());

    let res = client
        .get(format!("{}/loans", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    let loans = body["items"].as_array().unwrap();
    assert_eq!(loans.len(), 1);
    assert_eq!(loans[0]["book"]["title"], "The Hobbit");
    assert_eq!(loans[0]["borrower"]["name"], "Bruno");

    // Return: the book is available again and the loan is history.
    let res = client
        .post(format!("{}/loans/return", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "book_id": book_id, "borrower_id": borrower_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["outcome"], "returned");

    let res = client
        .get(format!("{}/loans/available-books", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let res = client
        .get(format!("{}/loans", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["items"].as_array().unwrap().is_empty());

    let res = client
        .get(format!("{}/books/{}/history", srv.base_url, book_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    let history = body["items"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0]["returned_date"].as_str().is_some());
}

#[tokio::test]
async fn a_lent_book_cannot_be_lent_again() {
    let secret = "test-secret";
    let srv = TestServer::spawn(secret).await;
    let token = mint_session(secret);
    let client = reqwest::Client::new();

    let book = add_book(&client, &srv.base_url, &token, "Dune", "Ana").await;
    let first = add_member(&client, &srv.base_url, &token, "Bruno").await;
    let second = add_member(&client, &srv.base_url, &token, "Clara").await;
    let book_id = book["id"].as_str().unwrap();

    let res = lend(
        &client,
        &srv.base_url,
        &token,
        book_id,
        first["id"].as_str().unwrap(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = lend(
        &client,
        &srv.base_url,
        &token,
        book_id,
        second["id"].as_str().unwrap(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "book_unavailable");
}

#[tokio::test]
async fn returning_twice_is_a_noop() {
    let secret = "test-secret";
    let srv = TestServer::spawn(secret).await;
    let token = mint_session(secret);
    let client = reqwest::Client::new();

    let book = add_book(&client, &srv.base_url, &token, "Dune", "Ana").await;
    let borrower = add_member(&client, &srv.base_url, &token, "Bruno").await;
    let book_id = book["id"].as_str().unwrap();
    let borrower_id = borrower["id"].as_str().unwrap();

    lend(&client, &srv.base_url, &token, book_id, borrower_id).await;

    for expected in ["returned", "already_returned"] {
        let res = client
            .post(format!("{}/loans/return", srv.base_url))
            .bearer_auth(&token)
            .json(&json!({ "book_id": book_id, "borrower_id": borrower_id }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["outcome"], expected);
    }
}

#[tokio::test]
async fn deactivating_a_member_preserves_loan_history() {
    let secret = "test-secret";
    let srv = TestServer::spawn(secret).await;
    let token = mint_session(secret);
    let client = reqwest::Client::new();

    let book = add_book(&client, &srv.base_url, &token, "Dune", "Ana").await;
    let borrower = add_member(&client, &srv.base_url, &token, "Bruno").await;
    let book_id = book["id"].as_str().unwrap();
    let borrower_id = borrower["id"].as_str().unwrap();

    lend(&client, &srv.base_url, &token, book_id, borrower_id).await;

    let res = client
        .post(format!("{}/members/{}/deactivate", srv.base_url, borrower_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Gone from the directory listing...
    let res = client
        .get(format!("{}/members", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(
        body["items"]
            .as_array()
            .unwrap()
            .iter()
            .all(|m| m["name"] != "Bruno")
    );

    // ...but the open loan still resolves the borrower's name.
    let res = client
        .get(format!("{}/loans", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    let loans = body["items"].as_array().unwrap();
    assert_eq!(loans.len(), 1);
    assert_eq!(loans[0]["borrower"]["name"], "Bruno");
    assert_eq!(loans[0]["borrower"]["is_active"], false);
}

#[tokio::test]
async fn removing_a_book_soft_deletes_it() {
    let secret = "test-secret";
    let srv = TestServer::spawn(secret).await;
    let token = mint_session(secret);
    let client = reqwest::Client::new();

    let book = add_book(&client, &srv.base_url, &token, "Dune", "Ana").await;
    let book_id = book["id"].as_str().unwrap();

    let res = client
        .delete(format!("{}/books/{}", srv.base_url, book_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/books", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["items"].as_array().unwrap().is_empty());

    // Soft-deleted: the record (and its history endpoint) still resolves.
    let res = client
        .get(format!("{}/books/{}/history", srv.base_url, book_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}
