use std::sync::Arc;

use actix_web::{get, post, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::{AuthenticatedUser, MaybeUser},
    errors::AppError,
    models::dto::{request::SaveQuizResultRequest, response::SaveResultResponse},
};

/// Stores a result computed by a client that ran the quiz itself.
#[post("/api/results")]
pub async fn save_result(
    state: web::Data<Arc<AppState>>,
    user: MaybeUser,
    request: web::Json<SaveQuizResultRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let id = state
        .result_service
        .save_result(user.user_id(), request.into_result())
        .await?;

    Ok(HttpResponse::Created().json(SaveResultResponse {
        id,
        message: "Quiz result saved".to_string(),
    }))
}

#[get("/api/results")]
pub async fn list_results(
    state: web::Data<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let results = state.result_service.list_results(auth.0.user_id()).await?;
    Ok(HttpResponse::Ok().json(results))
}

#[get("/api/results/{id}")]
pub async fn get_result(
    state: web::Data<Arc<AppState>>,
    auth: AuthenticatedUser,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let result = state.result_service.get_result(auth.0.user_id(), &id).await?;
    Ok(HttpResponse::Ok().json(result))
}

#[get("/api/dashboard")]
pub async fn dashboard(
    state: web::Data<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let summary = state.result_service.dashboard(auth.0.user_id()).await?;
    Ok(HttpResponse::Ok().json(summary))
}
