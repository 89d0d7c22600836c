use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use diesel::{dsl::count_star, pg::Pg, prelude::*, result::DatabaseErrorKind, PgConnection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    error::{AppError, AppResult},
    models::{Client, Country, NewClient},
    pagination::{like_pattern, ListParams, Pagination},
    schema::{clients, countries, project_references},
    state::AppState,
    utils::validate::is_valid_email,
};

use super::to_iso;

#[derive(Deserialize)]
pub struct ClientListQuery {
    #[serde(flatten)]
    pub params: ListParams,
    pub country_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct CreateClientRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub country_id: Option<Uuid>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Deserialize)]
pub struct UpdateClientRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub country_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

fn default_true() -> bool {
    true
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = clients)]
struct ClientChangeset<'a> {
    name: Option<&'a str>,
    email: Option<&'a str>,
    phone: Option<&'a str>,
    industry: Option<&'a str>,
    website: Option<&'a str>,
    address: Option<&'a str>,
    description: Option<&'a str>,
    country_id: Option<Uuid>,
    is_active: Option<bool>,
    updated_by: Option<Uuid>,
}

#[derive(Serialize, Clone)]
pub struct CountryBrief {
    pub id: Uuid,
    pub name: String,
    pub code: String,
}

impl From<Country> for CountryBrief {
    fn from(country: Country) -> Self {
        Self {
            id: country.id,
            name: country.name,
            code: country.code,
        }
    }
}

#[derive(Serialize)]
pub struct ClientResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<CountryBrief>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize)]
pub struct ClientListResponse {
    pub clients: Vec<ClientResponse>,
    pub pagination: Pagination,
}

fn filtered_clients(
    search: Option<&str>,
    country_id: Option<Uuid>,
) -> clients::BoxedQuery<'static, Pg> {
    let mut query = clients::table.into_boxed();

    if let Some(term) = search {
        let pattern = like_pattern(term);
        query = query.filter(
            clients::name
                .ilike(pattern.clone())
                .or(clients::email.ilike(pattern.clone()))
                .or(clients::industry.ilike(pattern)),
        );
    }

    if let Some(country_id) = country_id {
        query = query.filter(clients::country_id.eq(country_id));
    }

    query
}

pub async fn list_clients(
    State(state): State<AppState>,
    Query(query): Query<ClientListQuery>,
) -> AppResult<Json<ClientListResponse>> {
    let mut conn = state.db()?;

    let (page, limit) = query.params.clamp();
    let search = query.params.search_term();

    let total: i64 = filtered_clients(search, query.country_id)
        .count()
        .get_result(&mut conn)?;

    let rows: Vec<Client> = filtered_clients(search, query.country_id)
        .order(clients::created_at.desc())
        .offset(query.params.offset())
        .limit(limit)
        .load(&mut conn)?;

    let country_map = load_countries_for_clients(&mut conn, &rows)?;

    let clients_out = rows
        .into_iter()
        .map(|client| to_client_response(client, &country_map))
        .collect();

    Ok(Json(ClientListResponse {
        clients: clients_out,
        pagination: Pagination::new(page, limit, total),
    }))
}

pub async fn get_client(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
) -> AppResult<Json<ClientResponse>> {
    let mut conn = state.db()?;

    let client: Client = clients::table.find(client_id).first(&mut conn)?;
    let country_map = load_countries_for_clients(&mut conn, std::slice::from_ref(&client))?;

    Ok(Json(to_client_response(client, &country_map)))
}

pub async fn create_client(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateClientRequest>,
) -> AppResult<(StatusCode, Json<ClientResponse>)> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }
    if name.len() > 100 {
        return Err(AppError::bad_request("name must be at most 100 characters"));
    }
    let email = payload.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::bad_request("email must be a valid address"));
    }

    let mut conn = state.db()?;

    let duplicate = clients::table
        .filter(clients::email.eq(&email))
        .first::<Client>(&mut conn)
        .optional()?;
    if duplicate.is_some() {
        return Err(AppError::bad_request(
            "a client with this email already exists",
        ));
    }

    if let Some(country_id) = payload.country_id {
        ensure_country_exists(&mut conn, country_id)?;
    }

    let new_client = NewClient {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email,
        phone: trimmed_opt(payload.phone),
        industry: trimmed_opt(payload.industry),
        website: trimmed_opt(payload.website),
        address: trimmed_opt(payload.address),
        description: trimmed_opt(payload.description),
        country_id: payload.country_id,
        is_active: payload.is_active,
        created_by: Some(user.user_id),
        updated_by: Some(user.user_id),
    };

    match diesel::insert_into(clients::table)
        .values(&new_client)
        .execute(&mut conn)
    {
        Ok(_) => {}
        Err(diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            return Err(AppError::bad_request(
                "a client with this email already exists",
            ));
        }
        Err(err) => return Err(AppError::from(err)),
    }

    let client: Client = clients::table.find(new_client.id).first(&mut conn)?;
    let country_map = load_countries_for_clients(&mut conn, std::slice::from_ref(&client))?;

    Ok((
        StatusCode::CREATED,
        Json(to_client_response(client, &country_map)),
    ))
}

pub async fn update_client(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(payload): Json<UpdateClientRequest>,
) -> AppResult<Json<ClientResponse>> {
    let mut conn = state.db()?;
    let existing: Client = clients::table.find(client_id).first(&mut conn)?;

    let new_name = match payload.name.as_deref().map(str::trim) {
        Some("") => return Err(AppError::bad_request("name must not be empty")),
        Some(name) if name.len() > 100 => {
            return Err(AppError::bad_request("name must be at most 100 characters"))
        }
        other => other.map(str::to_string),
    };

    let new_email = match payload.email.as_deref().map(str::trim) {
        Some(raw) => {
            let email = raw.to_lowercase();
            if !is_valid_email(&email) {
                return Err(AppError::bad_request("email must be a valid address"));
            }
            if email != existing.email {
                let duplicate = clients::table
                    .filter(clients::email.eq(&email))
                    .filter(clients::id.ne(client_id))
                    .first::<Client>(&mut conn)
                    .optional()?;
                if duplicate.is_some() {
                    return Err(AppError::bad_request(
                        "a client with this email already exists",
                    ));
                }
            }
            Some(email)
        }
        None => None,
    };

    if let Some(country_id) = payload.country_id {
        ensure_country_exists(&mut conn, country_id)?;
    }

    let phone = trimmed_opt(payload.phone);
    let industry = trimmed_opt(payload.industry);
    let website = trimmed_opt(payload.website);
    let address = trimmed_opt(payload.address);
    let description = trimmed_opt(payload.description);

    let changeset = ClientChangeset {
        name: new_name.as_deref(),
        email: new_email.as_deref(),
        phone: phone.as_deref(),
        industry: industry.as_deref(),
        website: website.as_deref(),
        address: address.as_deref(),
        description: description.as_deref(),
        country_id: payload.country_id,
        is_active: payload.is_active,
        updated_by: Some(user.user_id),
    };

    let now = Utc::now().naive_utc();
    diesel::update(clients::table.find(client_id))
        .set((&changeset, clients::updated_at.eq(now)))
        .execute(&mut conn)?;

    let updated: Client = clients::table.find(client_id).first(&mut conn)?;
    let country_map = load_countries_for_clients(&mut conn, std::slice::from_ref(&updated))?;

    Ok(Json(to_client_response(updated, &country_map)))
}

pub async fn delete_client(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db()?;

    let usage: i64 = project_references::table
        .filter(project_references::client_id.eq(client_id))
        .select(count_star())
        .first(&mut conn)?;

    if usage > 0 {
        return Err(AppError::bad_request(
            "cannot delete a client that is still used by references",
        ));
    }

    let deleted = diesel::delete(clients::table.find(client_id)).execute(&mut conn)?;
    if deleted == 0 {
        return Err(AppError::not_found("client"));
    }

    Ok(StatusCode::NO_CONTENT)
}

fn ensure_country_exists(conn: &mut PgConnection, country_id: Uuid) -> AppResult<()> {
    let found = countries::table
        .find(country_id)
        .first::<Country>(conn)
        .optional()?;
    if found.is_none() {
        return Err(AppError::bad_request("country_id does not exist"));
    }
    Ok(())
}

fn load_countries_for_clients(
    conn: &mut PgConnection,
    rows: &[Client],
) -> AppResult<HashMap<Uuid, CountryBrief>> {
    let country_ids: Vec<Uuid> = rows.iter().filter_map(|client| client.country_id).collect();
    if country_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let loaded: Vec<Country> = countries::table
        .filter(countries::id.eq_any(country_ids))
        .load(conn)?;

    Ok(loaded
        .into_iter()
        .map(|country| (country.id, CountryBrief::from(country)))
        .collect())
}

fn to_client_response(client: Client, country_map: &HashMap<Uuid, CountryBrief>) -> ClientResponse {
    let country = client
        .country_id
        .and_then(|id| country_map.get(&id).cloned());
    ClientResponse {
        id: client.id,
        name: client.name,
        email: client.email,
        phone: client.phone,
        industry: client.industry,
        website: client.website,
        address: client.address,
        description: client.description,
        country,
        is_active: client.is_active,
        created_at: to_iso(client.created_at),
        updated_at: to_iso(client.updated_at),
    }
}

pub(crate) fn trimmed_opt(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
