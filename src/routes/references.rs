use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, Utc};
use diesel::{pg::Pg, prelude::*, PgConnection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    error::{AppError, AppResult},
    models::{
        Client, Country, NewReference, NewReferenceFile, NewReferenceTechnology, Reference,
        ReferenceFile, Technology, User,
    },
    pagination::{flag_param, like_pattern, ListParams, Pagination},
    schema::{
        clients, countries, project_references, reference_files, reference_technologies,
        technologies, users,
    },
    state::AppState,
    storage::is_valid_category,
};

use super::{
    clients::{trimmed_opt, CountryBrief},
    to_iso,
};

pub const REFERENCE_STATUSES: &[&str] = &["active", "in_progress", "completed"];
pub const REFERENCE_PRIORITIES: &[&str] = &["high", "medium", "low"];

const DEFAULT_STATUS: &str = "active";
const DEFAULT_PRIORITY: &str = "medium";

#[derive(Deserialize)]
pub struct ReferenceListQuery {
    #[serde(flatten)]
    pub params: ListParams,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub client_id: Option<Uuid>,
    pub country_id: Option<Uuid>,
    pub technology_id: Option<Uuid>,
    pub include_deleted: Option<String>,
}

#[derive(Deserialize)]
pub struct TestimonialInput {
    pub content: String,
    pub author: Option<String>,
    pub position: Option<String>,
}

#[derive(Deserialize)]
pub struct FileInput {
    pub category: String,
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub path: String,
}

#[derive(Deserialize)]
pub struct CreateReferenceRequest {
    pub title: String,
    pub description: String,
    pub client_id: Uuid,
    pub country_id: Uuid,
    pub location: Option<String>,
    pub budget: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub technologies: Vec<Uuid>,
    pub testimonial: Option<TestimonialInput>,
    #[serde(default)]
    pub files: Vec<FileInput>,
}

#[derive(Deserialize)]
pub struct UpdateReferenceRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub client_id: Option<Uuid>,
    pub country_id: Option<Uuid>,
    pub location: Option<String>,
    pub budget: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub keywords: Option<Vec<String>>,
    pub technologies: Option<Vec<Uuid>>,
    pub testimonial: Option<TestimonialInput>,
    pub files: Option<Vec<FileInput>>,
}

#[derive(Serialize, Clone)]
pub struct ClientBrief {
    pub id: Uuid,
    pub name: String,
}

#[derive(Serialize, Clone)]
pub struct TechnologyBrief {
    pub id: Uuid,
    pub name: String,
    pub color: Option<String>,
}

#[derive(Serialize, Clone)]
pub struct UserBrief {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Serialize)]
pub struct TestimonialResponse {
    pub content: String,
    pub author: Option<String>,
    pub position: Option<String>,
}

#[derive(Serialize)]
pub struct FileResponse {
    pub id: Uuid,
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub path: String,
    pub uploaded_at: String,
}

#[derive(Serialize, Default)]
pub struct FilesByCategory {
    pub screenshots: Vec<FileResponse>,
    pub certificates: Vec<FileResponse>,
    pub documents: Vec<FileResponse>,
}

#[derive(Serialize)]
pub struct ReferenceResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub client: Option<ClientBrief>,
    pub country: Option<CountryBrief>,
    pub location: Option<String>,
    pub budget: Option<String>,
    pub status: String,
    pub priority: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub keywords: Vec<String>,
    pub technologies: Vec<TechnologyBrief>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub testimonial: Option<TestimonialResponse>,
    pub files: FilesByCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserBrief>,
    pub is_deleted: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize)]
pub struct ReferenceListResponse {
    pub references: Vec<ReferenceResponse>,
    pub pagination: Pagination,
}

fn filtered_references(
    search: Option<&str>,
    query: &ReferenceListQuery,
) -> project_references::BoxedQuery<'static, Pg> {
    let mut filtered = project_references::table.into_boxed();

    if !flag_param(&query.include_deleted) {
        filtered = filtered.filter(project_references::is_deleted.eq(false));
    }

    if let Some(term) = search {
        let pattern = like_pattern(term);
        filtered = filtered.filter(
            project_references::title
                .ilike(pattern.clone())
                .or(project_references::description.ilike(pattern.clone()))
                .or(project_references::location.ilike(pattern)),
        );
    }

    if let Some(status) = query
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        filtered = filtered.filter(project_references::status.eq(status.to_string()));
    }

    if let Some(priority) = query
        .priority
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
    {
        filtered = filtered.filter(project_references::priority.eq(priority.to_string()));
    }

    if let Some(client_id) = query.client_id {
        filtered = filtered.filter(project_references::client_id.eq(client_id));
    }

    if let Some(country_id) = query.country_id {
        filtered = filtered.filter(project_references::country_id.eq(country_id));
    }

    if let Some(technology_id) = query.technology_id {
        let tagged = reference_technologies::table
            .filter(reference_technologies::technology_id.eq(technology_id))
            .select(reference_technologies::reference_id);
        filtered = filtered.filter(project_references::id.eq_any(tagged));
    }

    filtered
}

pub async fn list_references(
    State(state): State<AppState>,
    Query(query): Query<ReferenceListQuery>,
) -> AppResult<Json<ReferenceListResponse>> {
    let mut conn = state.db()?;

    let (page, limit) = query.params.clamp();
    let search = query.params.search_term();

    let total: i64 = filtered_references(search, &query)
        .count()
        .get_result(&mut conn)?;

    let rows: Vec<Reference> = filtered_references(search, &query)
        .order(project_references::created_at.desc())
        .offset(query.params.offset())
        .limit(limit)
        .load(&mut conn)?;

    let references = build_reference_responses(&mut conn, rows)?;

    Ok(Json(ReferenceListResponse {
        references,
        pagination: Pagination::new(page, limit, total),
    }))
}

pub async fn get_reference(
    State(state): State<AppState>,
    Path(reference_id): Path<Uuid>,
) -> AppResult<Json<ReferenceResponse>> {
    let mut conn = state.db()?;
    let reference = find_active_reference(&mut conn, reference_id)?;

    let mut responses = build_reference_responses(&mut conn, vec![reference])?;
    let response = responses.pop().ok_or_else(|| AppError::not_found("reference"))?;
    Ok(Json(response))
}

pub async fn create_reference(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateReferenceRequest>,
) -> AppResult<(StatusCode, Json<ReferenceResponse>)> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::bad_request("title must not be empty"));
    }
    if title.len() > 200 {
        return Err(AppError::bad_request(
            "title must be at most 200 characters",
        ));
    }
    let description = payload.description.trim();
    if description.is_empty() {
        return Err(AppError::bad_request("description must not be empty"));
    }

    let status = payload
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_STATUS);
    ensure_valid_status(status)?;

    let priority = payload
        .priority
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_PRIORITY);
    ensure_valid_priority(priority)?;

    if let Some(end_date) = payload.end_date {
        if end_date < payload.start_date {
            return Err(AppError::bad_request(
                "end_date must not be before start_date",
            ));
        }
    }

    let keywords = normalize_keywords(payload.keywords);
    let file_inputs = validate_file_inputs(payload.files)?;

    let mut conn = state.db()?;
    ensure_client_exists(&mut conn, payload.client_id)?;
    ensure_country_exists(&mut conn, payload.country_id)?;
    let technology_ids = ensure_technologies_exist(&mut conn, payload.technologies)?;

    let (testimonial_content, testimonial_author, testimonial_position) =
        split_testimonial(payload.testimonial);

    let new_reference = NewReference {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: description.to_string(),
        client_id: payload.client_id,
        country_id: payload.country_id,
        location: trimmed_opt(payload.location),
        budget: trimmed_opt(payload.budget),
        status: status.to_string(),
        priority: priority.to_string(),
        start_date: payload.start_date,
        end_date: payload.end_date,
        keywords,
        testimonial_content,
        testimonial_author,
        testimonial_position,
        created_by: Some(user.user_id),
        updated_by: Some(user.user_id),
    };

    let reference_id = new_reference.id;
    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        diesel::insert_into(project_references::table)
            .values(&new_reference)
            .execute(conn)?;

        insert_technology_links(conn, reference_id, &technology_ids)?;
        insert_file_rows(conn, reference_id, &file_inputs)?;
        Ok(())
    })?;

    let reference: Reference = project_references::table
        .find(reference_id)
        .first(&mut conn)?;
    let mut responses = build_reference_responses(&mut conn, vec![reference])?;
    let response = responses.pop().ok_or_else(|| AppError::not_found("reference"))?;

    tracing::info!(reference_id = %reference_id, title = %title, "reference created");

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn update_reference(
    State(state): State<AppState>,
    Path(reference_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(payload): Json<UpdateReferenceRequest>,
) -> AppResult<Json<ReferenceResponse>> {
    let mut conn = state.db()?;
    let existing = find_active_reference(&mut conn, reference_id)?;

    let title = match payload.title.as_deref().map(str::trim) {
        Some("") => return Err(AppError::bad_request("title must not be empty")),
        Some(title) if title.len() > 200 => {
            return Err(AppError::bad_request(
                "title must be at most 200 characters",
            ))
        }
        Some(title) => title.to_string(),
        None => existing.title.clone(),
    };

    let description = match payload.description.as_deref().map(str::trim) {
        Some("") => return Err(AppError::bad_request("description must not be empty")),
        Some(description) => description.to_string(),
        None => existing.description.clone(),
    };

    let client_id = payload.client_id.unwrap_or(existing.client_id);
    if client_id != existing.client_id {
        ensure_client_exists(&mut conn, client_id)?;
    }

    let country_id = payload.country_id.unwrap_or(existing.country_id);
    if country_id != existing.country_id {
        ensure_country_exists(&mut conn, country_id)?;
    }

    let status = match payload.status.as_deref().map(str::trim) {
        Some(status) => {
            ensure_valid_status(status)?;
            status.to_string()
        }
        None => existing.status.clone(),
    };

    let priority = match payload.priority.as_deref().map(str::trim) {
        Some(priority) => {
            ensure_valid_priority(priority)?;
            priority.to_string()
        }
        None => existing.priority.clone(),
    };

    let start_date = payload.start_date.unwrap_or(existing.start_date);
    let end_date = payload.end_date.or(existing.end_date);
    if let Some(end_date) = end_date {
        if end_date < start_date {
            return Err(AppError::bad_request(
                "end_date must not be before start_date",
            ));
        }
    }

    let keywords = match payload.keywords {
        Some(raw) => normalize_keywords(raw),
        None => existing.keywords.clone(),
    };

    let technology_ids = match payload.technologies {
        Some(ids) => Some(ensure_technologies_exist(&mut conn, ids)?),
        None => None,
    };

    let file_inputs = match payload.files {
        Some(files) => Some(validate_file_inputs(files)?),
        None => None,
    };

    let (testimonial_content, testimonial_author, testimonial_position) =
        match payload.testimonial {
            Some(testimonial) => split_testimonial(Some(testimonial)),
            None => (
                existing.testimonial_content.clone(),
                existing.testimonial_author.clone(),
                existing.testimonial_position.clone(),
            ),
        };

    // Files replaced in this update are removed from disk afterwards; a failed
    // removal only leaves an orphan on disk, never a dangling database row.
    let mut replaced_paths: Vec<String> = Vec::new();
    if file_inputs.is_some() {
        let current: Vec<ReferenceFile> = reference_files::table
            .filter(reference_files::reference_id.eq(reference_id))
            .load(&mut conn)?;
        let kept: Vec<&str> = file_inputs
            .as_ref()
            .map(|files| files.iter().map(|f| f.path.as_str()).collect())
            .unwrap_or_default();
        replaced_paths = current
            .into_iter()
            .filter(|file| !kept.contains(&file.path.as_str()))
            .map(|file| file.path)
            .collect();
    }

    let now = Utc::now().naive_utc();
    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        diesel::update(project_references::table.find(reference_id))
            .set((
                project_references::title.eq(&title),
                project_references::description.eq(&description),
                project_references::client_id.eq(client_id),
                project_references::country_id.eq(country_id),
                project_references::location
                    .eq(trimmed_opt(payload.location).or(existing.location.clone())),
                project_references::budget
                    .eq(trimmed_opt(payload.budget).or(existing.budget.clone())),
                project_references::status.eq(&status),
                project_references::priority.eq(&priority),
                project_references::start_date.eq(start_date),
                project_references::end_date.eq(end_date),
                project_references::keywords.eq(keywords.clone()),
                project_references::testimonial_content.eq(testimonial_content.clone()),
                project_references::testimonial_author.eq(testimonial_author.clone()),
                project_references::testimonial_position.eq(testimonial_position.clone()),
                project_references::updated_by.eq(Some(user.user_id)),
                project_references::updated_at.eq(now),
            ))
            .execute(conn)?;

        if let Some(ids) = &technology_ids {
            diesel::delete(
                reference_technologies::table
                    .filter(reference_technologies::reference_id.eq(reference_id)),
            )
            .execute(conn)?;
            insert_technology_links(conn, reference_id, ids)?;
        }

        if let Some(files) = &file_inputs {
            diesel::delete(
                reference_files::table.filter(reference_files::reference_id.eq(reference_id)),
            )
            .execute(conn)?;
            insert_file_rows(conn, reference_id, files)?;
        }

        Ok(())
    })?;

    for path in replaced_paths {
        if let Err(err) = state.files.remove(&path).await {
            tracing::warn!(path = %path, error = %err, "failed to remove replaced file");
        }
    }

    let updated: Reference = project_references::table
        .find(reference_id)
        .first(&mut conn)?;
    let mut responses = build_reference_responses(&mut conn, vec![updated])?;
    let response = responses.pop().ok_or_else(|| AppError::not_found("reference"))?;
    Ok(Json(response))
}

/// Soft delete: the row stays so the reference can be audited or restored,
/// but it disappears from every default listing and lookup.
pub async fn delete_reference(
    State(state): State<AppState>,
    Path(reference_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db()?;

    let now = Utc::now().naive_utc();
    let updated = diesel::update(
        project_references::table
            .find(reference_id)
            .filter(project_references::is_deleted.eq(false)),
    )
    .set((
        project_references::is_deleted.eq(true),
        project_references::deleted_at.eq(Some(now)),
        project_references::deleted_by.eq(Some(user.user_id)),
        project_references::updated_at.eq(now),
    ))
    .execute(&mut conn)?;

    if updated == 0 {
        return Err(AppError::not_found("reference"));
    }

    tracing::info!(reference_id = %reference_id, "reference soft-deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn find_active_reference(conn: &mut PgConnection, reference_id: Uuid) -> AppResult<Reference> {
    let reference: Reference = project_references::table.find(reference_id).first(conn)?;
    if reference.is_deleted {
        return Err(AppError::not_found("reference"));
    }
    Ok(reference)
}

fn ensure_valid_status(status: &str) -> AppResult<()> {
    if !REFERENCE_STATUSES.contains(&status) {
        return Err(AppError::bad_request(format!(
            "status must be one of: {}",
            REFERENCE_STATUSES.join(", ")
        )));
    }
    Ok(())
}

fn ensure_valid_priority(priority: &str) -> AppResult<()> {
    if !REFERENCE_PRIORITIES.contains(&priority) {
        return Err(AppError::bad_request(format!(
            "priority must be one of: {}",
            REFERENCE_PRIORITIES.join(", ")
        )));
    }
    Ok(())
}

fn normalize_keywords(raw: Vec<String>) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for keyword in raw {
        let trimmed = keyword.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !keywords.iter().any(|existing| existing == trimmed) {
            keywords.push(trimmed.to_string());
        }
    }
    keywords
}

fn validate_file_inputs(files: Vec<FileInput>) -> AppResult<Vec<FileInput>> {
    for file in &files {
        if !is_valid_category(&file.category) {
            return Err(AppError::bad_request(format!(
                "unknown file category {:?}",
                file.category
            )));
        }
        if file.filename.trim().is_empty() || file.path.trim().is_empty() {
            return Err(AppError::bad_request(
                "file entries need a filename and a path",
            ));
        }
    }
    Ok(files)
}

fn split_testimonial(
    testimonial: Option<TestimonialInput>,
) -> (Option<String>, Option<String>, Option<String>) {
    match testimonial {
        Some(t) => {
            let content = trimmed_opt(Some(t.content));
            match content {
                Some(content) => (
                    Some(content),
                    trimmed_opt(t.author),
                    trimmed_opt(t.position),
                ),
                None => (None, None, None),
            }
        }
        None => (None, None, None),
    }
}

fn ensure_client_exists(conn: &mut PgConnection, client_id: Uuid) -> AppResult<()> {
    let found = clients::table
        .find(client_id)
        .first::<Client>(conn)
        .optional()?;
    if found.is_none() {
        return Err(AppError::bad_request("client_id does not exist"));
    }
    Ok(())
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

fn ensure_technologies_exist(conn: &mut PgConnection, ids: Vec<Uuid>) -> AppResult<Vec<Uuid>> {
    let mut unique: Vec<Uuid> = Vec::new();
    for id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    if unique.is_empty() {
        return Ok(unique);
    }

    let found: Vec<Uuid> = technologies::table
        .filter(technologies::id.eq_any(&unique))
        .select(technologies::id)
        .load(conn)?;

    if found.len() != unique.len() {
        return Err(AppError::bad_request(
            "one or more technology ids do not exist",
        ));
    }
    Ok(unique)
}

fn insert_technology_links(
    conn: &mut PgConnection,
    reference_id: Uuid,
    technology_ids: &[Uuid],
) -> Result<(), diesel::result::Error> {
    if technology_ids.is_empty() {
        return Ok(());
    }
    let rows: Vec<NewReferenceTechnology> = technology_ids
        .iter()
        .map(|technology_id| NewReferenceTechnology {
            reference_id,
            technology_id: *technology_id,
        })
        .collect();
    diesel::insert_into(reference_technologies::table)
        .values(&rows)
        .execute(conn)?;
    Ok(())
}

fn insert_file_rows(
    conn: &mut PgConnection,
    reference_id: Uuid,
    files: &[FileInput],
) -> Result<(), diesel::result::Error> {
    if files.is_empty() {
        return Ok(());
    }
    let rows: Vec<NewReferenceFile> = files
        .iter()
        .map(|file| NewReferenceFile {
            id: Uuid::new_v4(),
            reference_id,
            category: file.category.clone(),
            filename: file.filename.clone(),
            original_name: file.original_name.clone(),
            mime_type: file.mime_type.clone(),
            size_bytes: file.size_bytes,
            path: file.path.clone(),
        })
        .collect();
    diesel::insert_into(reference_files::table)
        .values(&rows)
        .execute(conn)?;
    Ok(())
}

fn build_reference_responses(
    conn: &mut PgConnection,
    rows: Vec<Reference>,
) -> AppResult<Vec<ReferenceResponse>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let reference_ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

    let client_ids: Vec<Uuid> = rows.iter().map(|r| r.client_id).collect();
    let client_map: HashMap<Uuid, ClientBrief> = clients::table
        .filter(clients::id.eq_any(client_ids))
        .load::<Client>(conn)?
        .into_iter()
        .map(|client| {
            (
                client.id,
                ClientBrief {
                    id: client.id,
                    name: client.name,
                },
            )
        })
        .collect();

    let country_ids: Vec<Uuid> = rows.iter().map(|r| r.country_id).collect();
    let country_map: HashMap<Uuid, CountryBrief> = countries::table
        .filter(countries::id.eq_any(country_ids))
        .load::<Country>(conn)?
        .into_iter()
        .map(|country| (country.id, CountryBrief::from(country)))
        .collect();

    let links: Vec<(Uuid, Technology)> = reference_technologies::table
        .inner_join(technologies::table)
        .filter(reference_technologies::reference_id.eq_any(&reference_ids))
        .select((
            reference_technologies::reference_id,
            technologies::all_columns,
        ))
        .load(conn)?;
    let mut technology_map: HashMap<Uuid, Vec<TechnologyBrief>> = HashMap::new();
    for (reference_id, technology) in links {
        technology_map
            .entry(reference_id)
            .or_default()
            .push(TechnologyBrief {
                id: technology.id,
                name: technology.name,
                color: technology.color,
            });
    }

    let files: Vec<ReferenceFile> = reference_files::table
        .filter(reference_files::reference_id.eq_any(&reference_ids))
        .order(reference_files::uploaded_at.asc())
        .load(conn)?;
    let mut file_map: HashMap<Uuid, FilesByCategory> = HashMap::new();
    for file in files {
        let grouped = file_map.entry(file.reference_id).or_default();
        let entry = FileResponse {
            id: file.id,
            filename: file.filename,
            original_name: file.original_name,
            mime_type: file.mime_type,
            size_bytes: file.size_bytes,
            path: file.path,
            uploaded_at: to_iso(file.uploaded_at),
        };
        match file.category.as_str() {
            "screenshots" => grouped.screenshots.push(entry),
            "certificates" => grouped.certificates.push(entry),
            _ => grouped.documents.push(entry),
        }
    }

    let creator_ids: Vec<Uuid> = rows.iter().filter_map(|r| r.created_by).collect();
    let creator_map: HashMap<Uuid, UserBrief> = if creator_ids.is_empty() {
        HashMap::new()
    } else {
        users::table
            .filter(users::id.eq_any(creator_ids))
            .load::<User>(conn)?
            .into_iter()
            .map(|user| {
                (
                    user.id,
                    UserBrief {
                        id: user.id,
                        username: user.username,
                        first_name: user.first_name,
                        last_name: user.last_name,
                    },
                )
            })
            .collect()
    };

    Ok(rows
        .into_iter()
        .map(|reference| {
            let testimonial = reference
                .testimonial_content
                .clone()
                .map(|content| TestimonialResponse {
                    content,
                    author: reference.testimonial_author.clone(),
                    position: reference.testimonial_position.clone(),
                });
            ReferenceResponse {
                id: reference.id,
                title: reference.title,
                description: reference.description,
                client: client_map.get(&reference.client_id).cloned(),
                country: country_map.get(&reference.country_id).cloned(),
                location: reference.location,
                budget: reference.budget,
                status: reference.status,
                priority: reference.priority,
                start_date: reference.start_date,
                end_date: reference.end_date,
                keywords: reference.keywords,
                technologies: technology_map.remove(&reference.id).unwrap_or_default(),
                testimonial,
                files: file_map.remove(&reference.id).unwrap_or_default(),
                created_by: reference
                    .created_by
                    .and_then(|id| creator_map.get(&id).cloned()),
                is_deleted: reference.is_deleted,
                created_at: to_iso(reference.created_at),
                updated_at: to_iso(reference.updated_at),
            }
        })
        .collect())
}
