use std::sync::Arc;

use actix_web::{delete, get, post, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::MaybeUser,
    errors::AppError,
    models::dto::request::{StartSessionRequest, SubmitAnswerRequest},
};

#[post("/api/sessions")]
pub async fn start_session(
    state: web::Data<Arc<AppState>>,
    user: MaybeUser,
    request: web::Json<StartSessionRequest>,
) -> Result<HttpResponse, AppError> {
    let owner = user.user_id().map(str::to_string);
    let view = state.sessions.start(owner, request.into_inner()).await?;
    Ok(HttpResponse::Created().json(view))
}

#[get("/api/sessions/{id}")]
pub async fn get_session(
    state: web::Data<Arc<AppState>>,
    user: MaybeUser,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let view = state.sessions.get(&id, user.user_id()).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[post("/api/sessions/{id}/answers")]
pub async fn submit_answer(
    state: web::Data<Arc<AppState>>,
    user: MaybeUser,
    id: web::Path<String>,
    request: web::Json<SubmitAnswerRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let view = state
        .sessions
        .answer(&id, user.user_id(), request.option_index)
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

#[post("/api/sessions/{id}/advance")]
pub async fn advance_session(
    state: web::Data<Arc<AppState>>,
    user: MaybeUser,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let view = state.sessions.advance(&id, user.user_id()).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[post("/api/sessions/{id}/reset")]
pub async fn reset_session(
    state: web::Data<Arc<AppState>>,
    user: MaybeUser,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let view = state.sessions.reset(&id, user.user_id()).await?;
    Ok(HttpResponse::Created().json(view))
}

#[delete("/api/sessions/{id}")]
pub async fn abandon_session(
    state: web::Data<Arc<AppState>>,
    user: MaybeUser,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    state.sessions.abandon(&id, user.user_id()).await?;
    Ok(HttpResponse::NoContent().finish())
}
