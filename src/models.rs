use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::*;

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = countries)]
pub struct Country {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub continent: Option<String>,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = countries)]
pub struct NewCountry {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub continent: Option<String>,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = technologies)]
pub struct Technology {
    pub id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = technologies)]
pub struct NewTechnology {
    pub id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = clients)]
#[diesel(belongs_to(Country, foreign_key = country_id))]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub country_id: Option<Uuid>,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = clients)]
pub struct NewClient {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub country_id: Option<Uuid>,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = project_references)]
#[diesel(belongs_to(Client, foreign_key = client_id))]
#[diesel(belongs_to(Country, foreign_key = country_id))]
pub struct Reference {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub client_id: Uuid,
    pub country_id: Uuid,
    pub location: Option<String>,
    pub budget: Option<String>,
    pub status: String,
    pub priority: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub keywords: Vec<String>,
    pub testimonial_content: Option<String>,
    pub testimonial_author: Option<String>,
    pub testimonial_position: Option<String>,
    pub is_deleted: bool,
    pub deleted_at: Option<NaiveDateTime>,
    pub deleted_by: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = project_references)]
pub struct NewReference {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub client_id: Uuid,
    pub country_id: Uuid,
    pub location: Option<String>,
    pub budget: Option<String>,
    pub status: String,
    pub priority: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub keywords: Vec<String>,
    pub testimonial_content: Option<String>,
    pub testimonial_author: Option<String>,
    pub testimonial_position: Option<String>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = reference_technologies)]
pub struct NewReferenceTechnology {
    pub reference_id: Uuid,
    pub technology_id: Uuid,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = reference_files)]
#[diesel(belongs_to(Reference, foreign_key = reference_id))]
pub struct ReferenceFile {
    pub id: Uuid,
    pub reference_id: Uuid,
    pub category: String,
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub path: String,
    pub uploaded_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = reference_files)]
pub struct NewReferenceFile {
    pub id: Uuid,
    pub reference_id: Uuid,
    pub category: String,
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub path: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = refresh_tokens)]
#[diesel(belongs_to(User))]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
    pub revoked_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = refresh_tokens)]
pub struct NewRefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}
