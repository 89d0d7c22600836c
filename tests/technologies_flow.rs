mod common;

use anyhow::Result;
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

#[tokio::test]
async fn create_update_and_clear_nullable_fields() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let token = admin_token(&app).await?;

    let response = app
        .post_json(
            "/api/technologies",
            &json!({
                "name": "TypeScript",
                "category": "backend",
                "color": "#3178c6",
            }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await?;
    assert_eq!(created["category"], "backend");

    let id = created["id"].as_str().unwrap().to_string();

    // Omitted keys stay untouched, an explicit null clears.
    let response = app
        .put_json(
            &format!("/api/technologies/{id}"),
            &json!({ "category": null, "description": "Typed JavaScript" }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await?;
    assert!(updated["category"].is_null());
    assert_eq!(updated["description"], "Typed JavaScript");
    assert_eq!(updated["name"], "TypeScript");
    assert_eq!(updated["color"], "#3178c6");

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn rejects_invalid_color() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let token = admin_token(&app).await?;

    let response = app
        .post_json(
            "/api/technologies",
            &json!({ "name": "Rust", "color": "orange" }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn filters_by_category() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let token = admin_token(&app).await?;

    for (name, category) in [
        ("PostgreSQL", "database"),
        ("Redis", "database"),
        ("Rust", "backend"),
    ] {
        let response = app
            .post_json(
                "/api/technologies",
                &json!({ "name": name, "category": category }),
                Some(&token),
            )
            .await?;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .get("/api/technologies?category=database", Some(&token))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await?;
    let names: Vec<&str> = body["technologies"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["PostgreSQL", "Redis"]);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn delete_missing_technology_is_not_found() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let token = admin_token(&app).await?;

    let response = app
        .delete(
            "/api/technologies/8b2ae1de-54d8-4a43-8a54-2b7a3f8a2f10",
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn delete_is_blocked_while_assigned() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let token = admin_token(&app).await?;

    let response = app
        .post_json(
            "/api/countries",
            &json!({ "name": "Austria", "code": "AT" }),
            Some(&token),
        )
        .await?;
    let country = json_body(response).await?;
    let response = app
        .post_json(
            "/api/clients",
            &json!({ "name": "Client", "email": "c@example.com" }),
            Some(&token),
        )
        .await?;
    let client = json_body(response).await?;
    let response = app
        .post_json(
            "/api/technologies",
            &json!({ "name": "Kafka", "category": "devops" }),
            Some(&token),
        )
        .await?;
    let technology = json_body(response).await?;

    let response = app
        .post_json(
            "/api/references",
            &json!({
                "title": "Streaming platform",
                "description": "Event pipeline build-out",
                "client_id": client["id"],
                "country_id": country["id"],
                "start_date": "2023-05-01",
                "technologies": [technology["id"]],
            }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let technology_id = technology["id"].as_str().unwrap();
    let response = app
        .delete(&format!("/api/technologies/{technology_id}"), Some(&token))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await?;
    Ok(())
}
