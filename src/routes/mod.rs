use axum::http::HeaderValue;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use chrono::NaiveDateTime;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;

use crate::{auth::AuthenticatedUser, state::AppState};

pub mod auth;
pub mod clients;
pub mod countries;
pub mod health;
pub mod references;
pub mod stats;
pub mod technologies;
pub mod uploads;
pub mod users;

const BODY_LIMIT_SLACK: usize = 1024 * 1024;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = if let Some(origins) = state.config.cors_allowed_origin.as_ref() {
        let headers: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| {
                    trimmed
                        .parse::<HeaderValue>()
                        .expect("invalid CORS allowed origin")
                })
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(headers))
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    };

    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me));

    let clients_routes = Router::new()
        .route("/", get(clients::list_clients).post(clients::create_client))
        .route(
            "/:id",
            get(clients::get_client)
                .put(clients::update_client)
                .delete(clients::delete_client),
        );

    let countries_routes = Router::new()
        .route(
            "/",
            get(countries::list_countries).post(countries::create_country),
        )
        .route(
            "/:id",
            get(countries::get_country)
                .put(countries::update_country)
                .delete(countries::delete_country),
        );

    let technologies_routes = Router::new()
        .route(
            "/",
            get(technologies::list_technologies).post(technologies::create_technology),
        )
        .route(
            "/:id",
            get(technologies::get_technology)
                .put(technologies::update_technology)
                .delete(technologies::delete_technology),
        );

    let references_routes = Router::new()
        .route(
            "/",
            get(references::list_references).post(references::create_reference),
        )
        .route(
            "/:id",
            get(references::get_reference)
                .put(references::update_reference)
                .delete(references::delete_reference),
        );

    let users_routes = Router::new()
        .route("/", get(users::list_users).post(users::create_user))
        .route(
            "/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        );

    let body_limit = state.config.max_file_size as usize + BODY_LIMIT_SLACK;

    let protected_state = state.clone();
    let protected_routes = Router::new()
        .nest("/api/clients", clients_routes)
        .nest("/api/countries", countries_routes)
        .nest("/api/technologies", technologies_routes)
        .nest("/api/references", references_routes)
        .nest("/api/users", users_routes)
        .route("/api/uploads", post(uploads::upload_files))
        .route("/api/stats", get(stats::get_stats))
        .layer(middleware::from_extractor_with_state::<AuthenticatedUser, _>(protected_state));

    Router::new()
        .merge(protected_routes)
        .nest("/api/auth", auth_routes)
        .route("/api/health", get(health::health_check))
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .with_state(state)
        .layer(cors)
        .layer(DefaultBodyLimit::max(body_limit))
}

pub(crate) fn to_iso(dt: NaiveDateTime) -> String {
    dt.and_utc().to_rfc3339()
}
