use axum::{extract::State, Json};
use diesel::{dsl::count_star, prelude::*};
use serde::Serialize;

use crate::{
    error::AppResult,
    schema::{clients, countries, project_references, technologies},
    state::AppState,
};

#[derive(Serialize)]
pub struct StatsResponse {
    pub references: i64,
    pub clients: i64,
    pub technologies: i64,
    pub countries: i64,
}

/// Soft-deleted references do not count.
pub async fn get_stats(State(state): State<AppState>) -> AppResult<Json<StatsResponse>> {
    let mut conn = state.db()?;

    let references: i64 = project_references::table
        .filter(project_references::is_deleted.eq(false))
        .select(count_star())
        .first(&mut conn)?;
    let clients: i64 = clients::table.select(count_star()).first(&mut conn)?;
    let technologies: i64 = technologies::table.select(count_star()).first(&mut conn)?;
    let countries: i64 = countries::table.select(count_star()).first(&mut conn)?;

    Ok(Json(StatsResponse {
        references,
        clients,
        technologies,
        countries,
    }))
}
