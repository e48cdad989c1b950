use std::sync::Arc;

use actix_web::{get, web, HttpResponse};

use crate::{app_state::AppState, models::domain::Question};

/// Subjects available for practice, with question counts for the picker.
#[get("/api/subjects")]
pub async fn list_subjects(state: web::Data<Arc<AppState>>) -> HttpResponse {
    HttpResponse::Ok().json(state.catalog.summaries())
}

/// JSON Schema accepted by the question importer.
#[get("/api/questions/schema")]
pub async fn question_schema() -> HttpResponse {
    HttpResponse::Ok().json(schemars::schema_for!(Question))
}
