//! API integration tests
//!
//! These run against a live server and database. Start the server with
//! `BOOKSHELF__RATE_LIMIT__ENABLED=false` so repeated listings are not
//! throttled, then run `cargo test -- --ignored`.

use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::{
    multipart::{Form, Part},
    Client,
};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

fn unique(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    format!("{}-{}", prefix, nanos)
}

/// Register a fresh account and return its bearer token
async fn get_auth_token(client: &Client) -> String {
    let email = format!("{}@example.com", unique("reader"));
    let password = "integration-pass";

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(response.status(), 201);

    let response = client
        .post(format!("{}/auth/jwt/login", BASE_URL))
        .json(&json!({ "username": email, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse login response");
    assert_eq!(body["token_type"], "bearer");
    body["access_token"].as_str().expect("No token in response").to_string()
}

async fn create_author(client: &Client, token: &str) -> i64 {
    let response = client
        .post(format!("{}/authors", BASE_URL))
        .bearer_auth(token)
        .json(&json!({ "name": unique("Author") }))
        .send()
        .await
        .expect("Failed to create author");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse author");
    body["id"].as_i64().expect("No author id")
}

async fn create_book(client: &Client, token: &str, author_id: i64, title: &str, year: i32, genre: &str) -> Value {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "title": title,
            "published_year": year,
            "genre": genre,
            "author_id": author_id
        }))
        .send()
        .await
        .expect("Failed to create book");
    assert_eq!(response.status(), 201);
    response.json().await.expect("Failed to parse book")
}

async fn get_json(client: &Client, url: String) -> Value {
    let response = client.get(url).send().await.expect("Failed to send request");
    assert!(response.status().is_success(), "status {}", response.status());
    response.json().await.expect("Failed to parse response")
}

async fn upload(client: &Client, token: &str, filename: &str, content: &str) -> reqwest::Response {
    let form = Form::new().part(
        "file",
        Part::bytes(content.as_bytes().to_vec()).file_name(filename.to_string()),
    );
    client
        .post(format!("{}/books/import", BASE_URL))
        .bearer_auth(token)
        .multipart(form)
        .send()
        .await
        .expect("Failed to send import request")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let body = get_json(&client, format!("{}/health", BASE_URL)).await;
    assert_eq!(body["status"], "healthy");

    let body = get_json(&client, format!("{}/ready", BASE_URL)).await;
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/jwt/login", BASE_URL))
        .json(&json!({
            "username": "nobody@example.com",
            "password": "wrong-password"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_me_returns_current_user() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["is_active"], true);
    assert!(body.get("hashed_password").is_none());
}

#[tokio::test]
#[ignore]
async fn test_make_me_superuser() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .patch(format!("{}/users/make-me-superuser", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body, json!({ "detail": "You are now a superuser" }));

    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["is_superuser"], true);
}

#[tokio::test]
#[ignore]
async fn test_import_keeps_good_records() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let author_id = create_author(&client, &token).await;

    let payload = json!([
        {"title": "A", "genre": "Fiction", "published_year": 2000, "author_id": author_id},
        {"title": "", "genre": "Bogus", "published_year": 1500, "author_id": author_id}
    ]);
    let response = upload(&client, &token, "books.json", &payload.to_string()).await;
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["imported"], 1);

    let csv = format!(
        "title,genre,published_year,author_id\nDune,Fiction,1965,{id}\nBad,Poetry,1965,{id}\n",
        id = author_id
    );
    let response = upload(&client, &token, "books.CSV", &csv).await;
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["imported"], 1);

    let books = get_json(&client, format!("{}/books?author_id={}&limit=100", BASE_URL, author_id)).await;
    assert_eq!(books.as_array().unwrap().len(), 2);
}

#[tokio::test]
#[ignore]
async fn test_import_drops_records_for_unknown_authors() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let author_id = create_author(&client, &token).await;
    let missing_author = i32::MAX;

    let payload = json!([
        {"title": "Kept", "genre": "Science", "published_year": 1990, "author_id": author_id},
        {"title": "Orphan", "genre": "Science", "published_year": 1990, "author_id": missing_author}
    ]);
    let response = upload(&client, &token, "books.json", &payload.to_string()).await;
    assert!(response.status().is_success(), "status {}", response.status());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["imported"], 1);

    let books = get_json(&client, format!("{}/books?author_id={}", BASE_URL, author_id)).await;
    let books = books.as_array().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["title"], "Kept");

    let orphans = get_json(&client, format!("{}/books?author_id={}", BASE_URL, missing_author)).await;
    assert!(orphans.as_array().unwrap().is_empty());
}

#[tokio::test]
#[ignore]
async fn test_import_rejects_unsupported_format() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = upload(&client, &token, "books.xml", "<books/>").await;
    assert_eq!(response.status(), 400);

    let response = upload(&client, &token, "books.json", "{not json").await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_author_delete_cascades_to_books() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let author_id = create_author(&client, &token).await;

    for (title, year) in [("One", 1990), ("Two", 1991), ("Three", 1992)] {
        create_book(&client, &token, author_id, title, year, "History").await;
    }

    let response = client
        .delete(format!("{}/authors/{}", BASE_URL, author_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to delete author");
    assert!(response.status().is_success());

    let books = get_json(&client, format!("{}/books?author_id={}", BASE_URL, author_id)).await;
    assert_eq!(books, json!([]));
}

#[tokio::test]
#[ignore]
async fn test_listing_sorts_and_paginates() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let author_id = create_author(&client, &token).await;

    for (title, year) in [("E", 2005), ("B", 1950), ("D", 2001), ("A", 1900), ("C", 1999)] {
        create_book(&client, &token, author_id, title, year, "Science").await;
    }

    let all = get_json(
        &client,
        format!("{}/books?author_id={}&sort_by=published_year&limit=100", BASE_URL, author_id),
    )
    .await;
    let all = all.as_array().unwrap().clone();
    let years: Vec<i64> = all.iter().map(|b| b["published_year"].as_i64().unwrap()).collect();
    assert_eq!(years, vec![1900, 1950, 1999, 2001, 2005]);

    let page = get_json(
        &client,
        format!("{}/books?author_id={}&sort_by=published_year&skip=1&limit=2", BASE_URL, author_id),
    )
    .await;
    assert_eq!(page.as_array().unwrap(), &all[1..3]);

    let filtered = get_json(
        &client,
        format!("{}/books?author_id={}&year_from=1950&year_to=2001&title=d", BASE_URL, author_id),
    )
    .await;
    let titles: Vec<&str> = filtered.as_array().unwrap().iter().map(|b| b["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["D"]);

    let response = client
        .get(format!("{}/books?sort_by=isbn", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);
}

#[tokio::test]
#[ignore]
async fn test_recommendations_respect_filters() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let author_id = create_author(&client, &token).await;

    let mut ids = Vec::new();
    for i in 0..8 {
        let book = create_book(&client, &token, author_id, &format!("Novel {}", i), 1980 + i, "Fiction").await;
        ids.push(book["id"].as_i64().unwrap());
    }
    let excluded = ids[0];

    let picks = get_json(
        &client,
        format!(
            "{}/books/recommend?genre=fiction&author_id={}&exclude_id={}",
            BASE_URL, author_id, excluded
        ),
    )
    .await;
    let picks = picks.as_array().unwrap();
    assert_eq!(picks.len(), 5);

    let mut seen = std::collections::HashSet::new();
    for book in picks {
        let id = book["id"].as_i64().unwrap();
        assert!(seen.insert(id));
        assert_ne!(id, excluded);
        assert_eq!(book["author_id"].as_i64(), Some(author_id));
        assert_eq!(book["genre"], "Fiction");
    }
}

#[tokio::test]
#[ignore]
async fn test_book_update_and_delete() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let author_id = create_author(&client, &token).await;
    let book = create_book(&client, &token, author_id, "Draft", 2010, "Non-Fiction").await;
    let id = book["id"].as_i64().unwrap();

    let response = client
        .put(format!("{}/books/{}", BASE_URL, id))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);

    let response = client
        .put(format!("{}/books/{}", BASE_URL, id))
        .bearer_auth(&token)
        .json(&json!({ "title": "Final" }))
        .send()
        .await
        .expect("Failed to send request");
    let updated: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(updated["title"], "Final");
    assert_eq!(updated["published_year"], 2010);

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["detail"], format!("Book {} deleted successfully", id));

    let response = client
        .get(format!("{}/books/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_csv_export() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books/export?format=csv", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/csv"));

    let body = response.text().await.expect("Failed to read body");
    assert_eq!(
        body.lines().next(),
        Some("id,title,genre,published_year,author_id,author_name")
    );
}
