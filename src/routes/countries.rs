use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use diesel::{dsl::count_star, pg::Pg, prelude::*, result::DatabaseErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    error::{AppError, AppResult},
    models::{Country, NewCountry},
    pagination::{like_pattern, ListParams, Pagination},
    schema::{clients, countries, project_references},
    state::AppState,
    utils::validate::is_valid_country_code,
};

use super::{clients::trimmed_opt, to_iso};

#[derive(Deserialize)]
pub struct CountryListQuery {
    #[serde(flatten)]
    pub params: ListParams,
}

#[derive(Deserialize)]
pub struct CreateCountryRequest {
    pub name: String,
    pub code: String,
    pub continent: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Deserialize)]
pub struct UpdateCountryRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub continent: Option<String>,
    pub is_active: Option<bool>,
}

fn default_true() -> bool {
    true
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = countries)]
struct CountryChangeset<'a> {
    name: Option<&'a str>,
    code: Option<&'a str>,
    continent: Option<&'a str>,
    is_active: Option<bool>,
    updated_by: Option<Uuid>,
}

#[derive(Serialize)]
pub struct CountryResponse {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub continent: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize)]
pub struct CountryListResponse {
    pub countries: Vec<CountryResponse>,
    pub pagination: Pagination,
}

fn filtered_countries(search: Option<&str>) -> countries::BoxedQuery<'static, Pg> {
    let mut query = countries::table.into_boxed();

    if let Some(term) = search {
        let pattern = like_pattern(term);
        query = query.filter(
            countries::name
                .ilike(pattern.clone())
                .or(countries::code.ilike(pattern)),
        );
    }

    query
}

pub async fn list_countries(
    State(state): State<AppState>,
    Query(query): Query<CountryListQuery>,
) -> AppResult<Json<CountryListResponse>> {
    let mut conn = state.db()?;

    let (page, limit) = query.params.clamp();
    let search = query.params.search_term();

    let total: i64 = filtered_countries(search).count().get_result(&mut conn)?;

    let rows: Vec<Country> = filtered_countries(search)
        .order(countries::name.asc())
        .offset(query.params.offset())
        .limit(limit)
        .load(&mut conn)?;

    Ok(Json(CountryListResponse {
        countries: rows.into_iter().map(to_country_response).collect(),
        pagination: Pagination::new(page, limit, total),
    }))
}

pub async fn get_country(
    State(state): State<AppState>,
    Path(country_id): Path<Uuid>,
) -> AppResult<Json<CountryResponse>> {
    let mut conn = state.db()?;
    let country: Country = countries::table.find(country_id).first(&mut conn)?;
    Ok(Json(to_country_response(country)))
}

pub async fn create_country(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateCountryRequest>,
) -> AppResult<(StatusCode, Json<CountryResponse>)> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }
    if name.len() > 100 {
        return Err(AppError::bad_request("name must be at most 100 characters"));
    }
    let code = payload.code.trim().to_uppercase();
    if !is_valid_country_code(&code) {
        return Err(AppError::bad_request(
            "code must be a 2 or 3 letter country code",
        ));
    }

    let mut conn = state.db()?;
    let new_country = NewCountry {
        id: Uuid::new_v4(),
        name: name.to_string(),
        code,
        continent: trimmed_opt(payload.continent),
        is_active: payload.is_active,
        created_by: Some(user.user_id),
        updated_by: Some(user.user_id),
    };

    match diesel::insert_into(countries::table)
        .values(&new_country)
        .execute(&mut conn)
    {
        Ok(_) => {}
        Err(diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            return Err(AppError::bad_request(
                "a country with this name or code already exists",
            ));
        }
        Err(err) => return Err(AppError::from(err)),
    }

    let country: Country = countries::table.find(new_country.id).first(&mut conn)?;
    Ok((StatusCode::CREATED, Json(to_country_response(country))))
}

pub async fn update_country(
    State(state): State<AppState>,
    Path(country_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(payload): Json<UpdateCountryRequest>,
) -> AppResult<Json<CountryResponse>> {
    let mut conn = state.db()?;
    let existing: Country = countries::table.find(country_id).first(&mut conn)?;

    let new_name = match payload.name.as_deref().map(str::trim) {
        Some("") => return Err(AppError::bad_request("name must not be empty")),
        Some(name) if name.len() > 100 => {
            return Err(AppError::bad_request("name must be at most 100 characters"))
        }
        other => other.map(str::to_string),
    };

    if let Some(ref name) = new_name {
        if *name != existing.name {
            let duplicate = countries::table
                .filter(countries::name.eq(name))
                .filter(countries::id.ne(country_id))
                .first::<Country>(&mut conn)
                .optional()?;
            if duplicate.is_some() {
                return Err(AppError::bad_request(
                    "a country with this name already exists",
                ));
            }
        }
    }

    let new_code = match payload.code.as_deref().map(str::trim) {
        Some(raw) => {
            let code = raw.to_uppercase();
            if !is_valid_country_code(&code) {
                return Err(AppError::bad_request(
                    "code must be a 2 or 3 letter country code",
                ));
            }
            if code != existing.code {
                let duplicate = countries::table
                    .filter(countries::code.eq(&code))
                    .filter(countries::id.ne(country_id))
                    .first::<Country>(&mut conn)
                    .optional()?;
                if duplicate.is_some() {
                    return Err(AppError::bad_request(
                        "a country with this code already exists",
                    ));
                }
            }
            Some(code)
        }
        None => None,
    };

    let continent = trimmed_opt(payload.continent);
    let changeset = CountryChangeset {
        name: new_name.as_deref(),
        code: new_code.as_deref(),
        continent: continent.as_deref(),
        is_active: payload.is_active,
        updated_by: Some(user.user_id),
    };

    let now = Utc::now().naive_utc();
    diesel::update(countries::table.find(country_id))
        .set((&changeset, countries::updated_at.eq(now)))
        .execute(&mut conn)?;

    let updated: Country = countries::table.find(country_id).first(&mut conn)?;
    Ok(Json(to_country_response(updated)))
}

pub async fn delete_country(
    State(state): State<AppState>,
    Path(country_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db()?;

    let used_by_references: i64 = project_references::table
        .filter(project_references::country_id.eq(country_id))
        .select(count_star())
        .first(&mut conn)?;
    let used_by_clients: i64 = clients::table
        .filter(clients::country_id.eq(country_id))
        .select(count_star())
        .first(&mut conn)?;

    if used_by_references > 0 || used_by_clients > 0 {
        return Err(AppError::bad_request(
            "cannot delete a country that is still in use",
        ));
    }

    let deleted = diesel::delete(countries::table.find(country_id)).execute(&mut conn)?;
    if deleted == 0 {
        return Err(AppError::not_found("country"));
    }

    Ok(StatusCode::NO_CONTENT)
}

fn to_country_response(country: Country) -> CountryResponse {
    CountryResponse {
        id: country.id,
        name: country.name,
        code: country.code,
        continent: country.continent,
        is_active: country.is_active,
        created_at: to_iso(country.created_at),
        updated_at: to_iso(country.updated_at),
    }
}
