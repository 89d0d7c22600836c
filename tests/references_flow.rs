mod common;

use anyhow::{ensure, Result};
use axum::http::StatusCode;
use common::{acquire_db_lock, body_to_vec, TestApp};
use serde_json::{json, Value};

async fn admin_token(app: &TestApp) -> Result<String> {
    app.insert_user("admin", "s3cret-enough", "admin").await?;
    app.login_token("admin", "s3cret-enough").await
}

async fn json_body(response: hyper::Response<axum::body::Body>) -> Result<Value> {
    let body = body_to_vec(response.into_body()).await?;
    Ok(serde_json::from_slice(&body)?)
}

struct Fixtures {
    client_id: String,
    country_id: String,
    technology_id: String,
}

async fn seed_fixtures(app: &TestApp, token: &str) -> Result<Fixtures> {
    let response = app
        .post_json(
            "/api/countries",
            &json!({ "name": "Germany", "code": "DE" }),
            Some(token),
        )
        .await?;
    ensure!(response.status() == StatusCode::CREATED, "country seed");
    let country = json_body(response).await?;

    let response = app
        .post_json(
            "/api/clients",
            &json!({ "name": "Acme", "email": "acme@example.com" }),
            Some(token),
        )
        .await?;
    ensure!(response.status() == StatusCode::CREATED, "client seed");
    let client = json_body(response).await?;

    let response = app
        .post_json(
            "/api/technologies",
            &json!({ "name": "Rust", "category": "backend" }),
            Some(token),
        )
        .await?;
    ensure!(response.status() == StatusCode::CREATED, "technology seed");
    let technology = json_body(response).await?;

    Ok(Fixtures {
        client_id: client["id"].as_str().unwrap().to_string(),
        country_id: country["id"].as_str().unwrap().to_string(),
        technology_id: technology["id"].as_str().unwrap().to_string(),
    })
}

#[tokio::test]
async fn create_expands_relations() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let token = admin_token(&app).await?;
    let fixtures = seed_fixtures(&app, &token).await?;

    let response = app
        .post_json(
            "/api/references",
            &json!({
                "title": "Inventory rewrite",
                "description": "Replaced the legacy stock system",
                "client_id": fixtures.client_id,
                "country_id": fixtures.country_id,
                "start_date": "2024-02-01",
                "end_date": "2024-09-30",
                "keywords": ["inventory", " logistics ", "inventory"],
                "technologies": [fixtures.technology_id],
                "testimonial": {
                    "content": "Delivered on time.",
                    "author": "Jane Doe",
                    "position": "CTO",
                },
            }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await?;

    assert_eq!(created["status"], "active");
    assert_eq!(created["priority"], "medium");
    assert_eq!(created["client"]["name"], "Acme");
    assert_eq!(created["country"]["code"], "DE");
    assert_eq!(created["technologies"][0]["name"], "Rust");
    assert_eq!(created["testimonial"]["author"], "Jane Doe");
    assert_eq!(created["created_by"]["username"], "admin");
    // Keywords are trimmed and deduplicated.
    assert_eq!(created["keywords"], json!(["inventory", "logistics"]));

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn rejects_invalid_status_and_dates() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let token = admin_token(&app).await?;
    let fixtures = seed_fixtures(&app, &token).await?;

    let base = json!({
        "title": "Bad input",
        "description": "Should never persist",
        "client_id": fixtures.client_id,
        "country_id": fixtures.country_id,
        "start_date": "2024-02-01",
    });

    let mut payload = base.clone();
    payload["status"] = json!("archived");
    let response = app
        .post_json("/api/references", &payload, Some(&token))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut payload = base.clone();
    payload["end_date"] = json!("2023-12-31");
    let response = app
        .post_json("/api/references", &payload, Some(&token))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn filters_by_status_and_technology() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let token = admin_token(&app).await?;
    let fixtures = seed_fixtures(&app, &token).await?;

    for (title, status, techs) in [
        ("Done deal", "completed", vec![fixtures.technology_id.clone()]),
        ("In flight", "in_progress", vec![]),
        ("Fresh start", "active", vec![]),
    ] {
        let response = app
            .post_json(
                "/api/references",
                &json!({
                    "title": title,
                    "description": "Filter fixture",
                    "client_id": fixtures.client_id,
                    "country_id": fixtures.country_id,
                    "status": status,
                    "start_date": "2024-01-01",
                    "technologies": techs,
                }),
                Some(&token),
            )
            .await?;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let body = json_body(
        app.get("/api/references?status=completed", Some(&token))
            .await?,
    )
    .await?;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["references"][0]["title"], "Done deal");

    let body = json_body(
        app.get(
            &format!("/api/references?technology_id={}", fixtures.technology_id),
            Some(&token),
        )
        .await?,
    )
    .await?;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["references"][0]["title"], "Done deal");

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn update_replaces_technology_set() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let token = admin_token(&app).await?;
    let fixtures = seed_fixtures(&app, &token).await?;

    let response = app
        .post_json(
            "/api/technologies",
            &json!({ "name": "PostgreSQL", "category": "database" }),
            Some(&token),
        )
        .await?;
    let other_technology = json_body(response).await?;

    let response = app
        .post_json(
            "/api/references",
            &json!({
                "title": "Swappable stack",
                "description": "Starts with one technology",
                "client_id": fixtures.client_id,
                "country_id": fixtures.country_id,
                "start_date": "2024-01-01",
                "technologies": [fixtures.technology_id],
            }),
            Some(&token),
        )
        .await?;
    let created = json_body(response).await?;
    let id = created["id"].as_str().unwrap().to_string();

    let response = app
        .put_json(
            &format!("/api/references/{id}"),
            &json!({ "technologies": [other_technology["id"]], "priority": "high" }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await?;

    let names: Vec<&str> = updated["technologies"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["PostgreSQL"]);
    assert_eq!(updated["priority"], "high");
    assert_eq!(updated["title"], "Swappable stack");

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn soft_delete_hides_but_keeps_the_row() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let token = admin_token(&app).await?;
    let fixtures = seed_fixtures(&app, &token).await?;

    let response = app
        .post_json(
            "/api/references",
            &json!({
                "title": "Short lived",
                "description": "Removed soon after creation",
                "client_id": fixtures.client_id,
                "country_id": fixtures.country_id,
                "start_date": "2024-01-01",
            }),
            Some(&token),
        )
        .await?;
    let created = json_body(response).await?;
    let id = created["id"].as_str().unwrap().to_string();

    let response = app
        .delete(&format!("/api/references/{id}"), Some(&token))
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Gone from lookups and the default listing.
    let response = app
        .get(&format!("/api/references/{id}"), Some(&token))
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = json_body(app.get("/api/references", Some(&token)).await?).await?;
    assert_eq!(body["pagination"]["total"], 0);

    // Still visible when deleted rows are requested explicitly.
    let body = json_body(
        app.get("/api/references?include_deleted=true", Some(&token))
            .await?,
    )
    .await?;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["references"][0]["is_deleted"], true);

    // A second delete is a 404, not a double-delete.
    let response = app
        .delete(&format!("/api/references/{id}"), Some(&token))
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.cleanup().await?;
    Ok(())
}
