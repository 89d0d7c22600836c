use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use diesel::{dsl::count_star, pg::Pg, prelude::*, result::DatabaseErrorKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    error::{AppError, AppResult},
    models::{NewTechnology, Technology},
    pagination::{like_pattern, ListParams, Pagination},
    schema::{reference_technologies, technologies},
    state::AppState,
    utils::json::{classify_string, NullableValue},
    utils::validate::is_valid_hex_color,
};

use super::{clients::trimmed_opt, to_iso};

pub const TECHNOLOGY_CATEGORIES: &[&str] = &[
    "frontend", "backend", "database", "devops", "mobile", "cloud", "framework", "library",
    "tool", "other",
];

fn ensure_valid_category(category: &str) -> AppResult<()> {
    if !TECHNOLOGY_CATEGORIES.contains(&category) {
        return Err(AppError::bad_request(format!(
            "category must be one of: {}",
            TECHNOLOGY_CATEGORIES.join(", ")
        )));
    }
    Ok(())
}

#[derive(Deserialize)]
pub struct TechnologyListQuery {
    #[serde(flatten)]
    pub params: ListParams,
    pub category: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateTechnologyRequest {
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Serialize)]
pub struct TechnologyResponse {
    pub id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize)]
pub struct TechnologyListResponse {
    pub technologies: Vec<TechnologyResponse>,
    pub pagination: Pagination,
}

fn filtered_technologies(
    search: Option<&str>,
    category: Option<&str>,
) -> technologies::BoxedQuery<'static, Pg> {
    let mut query = technologies::table.into_boxed();

    if let Some(term) = search {
        let pattern = like_pattern(term);
        query = query.filter(
            technologies::name
                .ilike(pattern.clone())
                .or(technologies::description.ilike(pattern)),
        );
    }

    if let Some(category) = category {
        query = query.filter(technologies::category.eq(category.to_string()));
    }

    query
}

pub async fn list_technologies(
    State(state): State<AppState>,
    Query(query): Query<TechnologyListQuery>,
) -> AppResult<Json<TechnologyListResponse>> {
    let mut conn = state.db()?;

    let (page, limit) = query.params.clamp();
    let search = query.params.search_term();
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let total: i64 = filtered_technologies(search, category)
        .count()
        .get_result(&mut conn)?;

    let rows: Vec<Technology> = filtered_technologies(search, category)
        .order(technologies::name.asc())
        .offset(query.params.offset())
        .limit(limit)
        .load(&mut conn)?;

    Ok(Json(TechnologyListResponse {
        technologies: rows.into_iter().map(to_technology_response).collect(),
        pagination: Pagination::new(page, limit, total),
    }))
}

pub async fn get_technology(
    State(state): State<AppState>,
    Path(technology_id): Path<Uuid>,
) -> AppResult<Json<TechnologyResponse>> {
    let mut conn = state.db()?;
    let technology: Technology = technologies::table.find(technology_id).first(&mut conn)?;
    Ok(Json(to_technology_response(technology)))
}

pub async fn create_technology(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateTechnologyRequest>,
) -> AppResult<(StatusCode, Json<TechnologyResponse>)> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }
    if name.len() > 100 {
        return Err(AppError::bad_request("name must be at most 100 characters"));
    }

    let color = trimmed_opt(payload.color);
    if let Some(ref color) = color {
        if !is_valid_hex_color(color) {
            return Err(AppError::bad_request(
                "color must be a hex color such as #3178c6",
            ));
        }
    }

    let category = trimmed_opt(payload.category);
    if let Some(ref category) = category {
        ensure_valid_category(category)?;
    }

    let mut conn = state.db()?;
    let new_technology = NewTechnology {
        id: Uuid::new_v4(),
        name: name.to_string(),
        category,
        description: trimmed_opt(payload.description),
        color,
        is_active: payload.is_active,
        created_by: Some(user.user_id),
        updated_by: Some(user.user_id),
    };

    match diesel::insert_into(technologies::table)
        .values(&new_technology)
        .execute(&mut conn)
    {
        Ok(_) => {}
        Err(diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            return Err(AppError::bad_request(
                "a technology with this name already exists",
            ));
        }
        Err(err) => return Err(AppError::from(err)),
    }

    let technology: Technology = technologies::table
        .find(new_technology.id)
        .first(&mut conn)?;
    Ok((
        StatusCode::CREATED,
        Json(to_technology_response(technology)),
    ))
}

/// PUT body is raw JSON so that an explicit `"category": null` clears the
/// field while an omitted key leaves it unchanged.
pub async fn update_technology(
    State(state): State<AppState>,
    Path(technology_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(payload): Json<Value>,
) -> AppResult<Json<TechnologyResponse>> {
    let body = payload
        .as_object()
        .ok_or_else(|| AppError::bad_request("expected a JSON object"))?;

    let mut conn = state.db()?;
    let existing: Technology = technologies::table.find(technology_id).first(&mut conn)?;

    let name = match classify_string(body.get("name")).map_err(AppError::bad_request)? {
        NullableValue::Omitted => existing.name.clone(),
        NullableValue::Null => return Err(AppError::bad_request("name must not be null")),
        NullableValue::Value(raw) => {
            let name = raw.trim().to_string();
            if name.is_empty() {
                return Err(AppError::bad_request("name must not be empty"));
            }
            if name.len() > 100 {
                return Err(AppError::bad_request("name must be at most 100 characters"));
            }
            name
        }
    };

    if name != existing.name {
        let duplicate = technologies::table
            .filter(technologies::name.eq(&name))
            .filter(technologies::id.ne(technology_id))
            .first::<Technology>(&mut conn)
            .optional()?;
        if duplicate.is_some() {
            return Err(AppError::bad_request(
                "a technology with this name already exists",
            ));
        }
    }

    let category = match classify_string(body.get("category")).map_err(AppError::bad_request)? {
        NullableValue::Omitted => existing.category.clone(),
        NullableValue::Null => None,
        NullableValue::Value(raw) => {
            let category = trimmed_opt(Some(raw));
            if let Some(ref category) = category {
                ensure_valid_category(category)?;
            }
            category
        }
    };

    let description =
        match classify_string(body.get("description")).map_err(AppError::bad_request)? {
            NullableValue::Omitted => existing.description.clone(),
            NullableValue::Null => None,
            NullableValue::Value(raw) => trimmed_opt(Some(raw)),
        };

    let color = match classify_string(body.get("color")).map_err(AppError::bad_request)? {
        NullableValue::Omitted => existing.color.clone(),
        NullableValue::Null => None,
        NullableValue::Value(raw) => {
            let color = raw.trim().to_string();
            if !is_valid_hex_color(&color) {
                return Err(AppError::bad_request(
                    "color must be a hex color such as #3178c6",
                ));
            }
            Some(color)
        }
    };

    let is_active = match body.get("is_active") {
        None => existing.is_active,
        Some(Value::Bool(b)) => *b,
        Some(other) => {
            return Err(AppError::bad_request(format!(
                "expected boolean for is_active, got {other}"
            )))
        }
    };

    let now = Utc::now().naive_utc();
    diesel::update(technologies::table.find(technology_id))
        .set((
            technologies::name.eq(&name),
            technologies::category.eq(category.clone()),
            technologies::description.eq(description.clone()),
            technologies::color.eq(color.clone()),
            technologies::is_active.eq(is_active),
            technologies::updated_by.eq(Some(user.user_id)),
            technologies::updated_at.eq(now),
        ))
        .execute(&mut conn)?;

    let updated: Technology = technologies::table.find(technology_id).first(&mut conn)?;
    Ok(Json(to_technology_response(updated)))
}

pub async fn delete_technology(
    State(state): State<AppState>,
    Path(technology_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db()?;

    let usage: i64 = reference_technologies::table
        .filter(reference_technologies::technology_id.eq(technology_id))
        .select(count_star())
        .first(&mut conn)?;

    if usage > 0 {
        return Err(AppError::bad_request(
            "cannot delete a technology that is still used by references",
        ));
    }

    let deleted = diesel::delete(technologies::table.find(technology_id)).execute(&mut conn)?;
    if deleted == 0 {
        return Err(AppError::not_found("technology"));
    }

    Ok(StatusCode::NO_CONTENT)
}

fn to_technology_response(technology: Technology) -> TechnologyResponse {
    TechnologyResponse {
        id: technology.id,
        name: technology.name,
        category: technology.category,
        description: technology.description,
        color: technology.color,
        is_active: technology.is_active,
        created_at: to_iso(technology.created_at),
        updated_at: to_iso(technology.updated_at),
    }
}
