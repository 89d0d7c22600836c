use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use diesel::{pg::Pg, prelude::*, result::DatabaseErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::{is_valid_role, password, AuthenticatedUser, ROLE_USER, USER_ROLES},
    error::{AppError, AppResult},
    models::{NewUser, User},
    pagination::{like_pattern, ListParams, Pagination},
    schema::users,
    state::AppState,
    utils::validate::{is_valid_email, is_valid_username},
};

use super::to_iso;

const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Deserialize)]
pub struct UserListQuery {
    #[serde(flatten)]
    pub params: ListParams,
    pub role: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

fn default_true() -> bool {
    true
}

/// Never carries the password hash.
#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub pagination: Pagination,
}

fn filtered_users(search: Option<&str>, role: Option<&str>) -> users::BoxedQuery<'static, Pg> {
    let mut query = users::table.into_boxed();

    if let Some(term) = search {
        let pattern = like_pattern(term);
        query = query.filter(
            users::username
                .ilike(pattern.clone())
                .or(users::email.ilike(pattern.clone()))
                .or(users::first_name.ilike(pattern.clone()))
                .or(users::last_name.ilike(pattern)),
        );
    }

    if let Some(role) = role {
        query = query.filter(users::role.eq(role.to_string()));
    }

    query
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> AppResult<Json<UserListResponse>> {
    let mut conn = state.db()?;

    let (page, limit) = query.params.clamp();
    let search = query.params.search_term();
    let role = query
        .role
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());

    let total: i64 = filtered_users(search, role).count().get_result(&mut conn)?;

    let rows: Vec<User> = filtered_users(search, role)
        .order(users::created_at.desc())
        .offset(query.params.offset())
        .limit(limit)
        .load(&mut conn)?;

    Ok(Json(UserListResponse {
        users: rows.into_iter().map(to_user_response).collect(),
        pagination: Pagination::new(page, limit, total),
    }))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    let mut conn = state.db()?;
    let user: User = users::table.find(user_id).first(&mut conn)?;
    Ok(Json(to_user_response(user)))
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let username = payload.username.trim().to_string();
    if !is_valid_username(&username) {
        return Err(AppError::bad_request(
            "username must be 3-50 characters of letters, digits, or underscores",
        ));
    }
    let email = payload.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::bad_request("email must be a valid address"));
    }
    if payload.password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::bad_request(
            "password must be at least 8 characters",
        ));
    }

    let role = payload
        .role
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(ROLE_USER);
    if !is_valid_role(role) {
        return Err(AppError::bad_request(format!(
            "role must be one of: {}",
            USER_ROLES.join(", ")
        )));
    }

    let first_name = payload.first_name.trim();
    let last_name = payload.last_name.trim();
    if first_name.is_empty() || last_name.is_empty() {
        return Err(AppError::bad_request(
            "first_name and last_name must not be empty",
        ));
    }

    let password_hash = password::hash_password(&payload.password).map_err(AppError::internal)?;

    let mut conn = state.db()?;

    let duplicate = users::table
        .filter(users::username.eq(&username).or(users::email.eq(&email)))
        .first::<User>(&mut conn)
        .optional()?;
    if duplicate.is_some() {
        return Err(AppError::bad_request(
            "a user with this username or email already exists",
        ));
    }

    let new_user = NewUser {
        id: Uuid::new_v4(),
        username,
        email,
        password_hash,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        role: role.to_string(),
        is_active: payload.is_active,
    };

    match diesel::insert_into(users::table)
        .values(&new_user)
        .execute(&mut conn)
    {
        Ok(_) => {}
        Err(diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            return Err(AppError::bad_request(
                "a user with this username or email already exists",
            ));
        }
        Err(err) => return Err(AppError::from(err)),
    }

    let user: User = users::table.find(new_user.id).first(&mut conn)?;
    tracing::info!(user_id = %user.id, username = %user.username, "user created");
    Ok((StatusCode::CREATED, Json(to_user_response(user))))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    let mut conn = state.db()?;
    let existing: User = users::table.find(user_id).first(&mut conn)?;

    let username = match payload.username.as_deref().map(str::trim) {
        Some(raw) => {
            let username = raw.to_string();
            if !is_valid_username(&username) {
                return Err(AppError::bad_request(
                    "username must be 3-50 characters of letters, digits, or underscores",
                ));
            }
            if username != existing.username {
                let duplicate = users::table
                    .filter(users::username.eq(&username))
                    .filter(users::id.ne(user_id))
                    .first::<User>(&mut conn)
                    .optional()?;
                if duplicate.is_some() {
                    return Err(AppError::bad_request(
                        "a user with this username already exists",
                    ));
                }
            }
            username
        }
        None => existing.username.clone(),
    };

    let email = match payload.email.as_deref().map(str::trim) {
        Some(raw) => {
            let email = raw.to_lowercase();
            if !is_valid_email(&email) {
                return Err(AppError::bad_request("email must be a valid address"));
            }
            if email != existing.email {
                let duplicate = users::table
                    .filter(users::email.eq(&email))
                    .filter(users::id.ne(user_id))
                    .first::<User>(&mut conn)
                    .optional()?;
                if duplicate.is_some() {
                    return Err(AppError::bad_request(
                        "a user with this email already exists",
                    ));
                }
            }
            email
        }
        None => existing.email.clone(),
    };

    let password_hash = match payload.password.as_deref() {
        Some(password) => {
            if password.len() < MIN_PASSWORD_LENGTH {
                return Err(AppError::bad_request(
                    "password must be at least 8 characters",
                ));
            }
            password::hash_password(password).map_err(AppError::internal)?
        }
        None => existing.password_hash.clone(),
    };

    let role = match payload.role.as_deref().map(str::trim) {
        Some(role) => {
            if !is_valid_role(role) {
                return Err(AppError::bad_request(format!(
                    "role must be one of: {}",
                    USER_ROLES.join(", ")
                )));
            }
            role.to_string()
        }
        None => existing.role.clone(),
    };

    let first_name = match payload.first_name.as_deref().map(str::trim) {
        Some("") => {
            return Err(AppError::bad_request(
                "first_name and last_name must not be empty",
            ))
        }
        Some(name) => name.to_string(),
        None => existing.first_name.clone(),
    };
    let last_name = match payload.last_name.as_deref().map(str::trim) {
        Some("") => {
            return Err(AppError::bad_request(
                "first_name and last_name must not be empty",
            ))
        }
        Some(name) => name.to_string(),
        None => existing.last_name.clone(),
    };

    let is_active = payload.is_active.unwrap_or(existing.is_active);

    let now = Utc::now().naive_utc();
    diesel::update(users::table.find(user_id))
        .set((
            users::username.eq(&username),
            users::email.eq(&email),
            users::password_hash.eq(&password_hash),
            users::first_name.eq(&first_name),
            users::last_name.eq(&last_name),
            users::role.eq(&role),
            users::is_active.eq(is_active),
            users::updated_at.eq(now),
        ))
        .execute(&mut conn)?;

    let updated: User = users::table.find(user_id).first(&mut conn)?;
    Ok(Json(to_user_response(updated)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    current: AuthenticatedUser,
) -> AppResult<impl IntoResponse> {
    if user_id == current.user_id {
        return Err(AppError::bad_request("cannot delete your own account"));
    }

    let mut conn = state.db()?;
    let deleted = diesel::delete(users::table.find(user_id)).execute(&mut conn)?;
    if deleted == 0 {
        return Err(AppError::not_found("user"));
    }

    Ok(StatusCode::NO_CONTENT)
}

fn to_user_response(user: User) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        role: user.role,
        is_active: user.is_active,
        created_at: to_iso(user.created_at),
        updated_at: to_iso(user.updated_at),
    }
}
