use std::sync::Arc;

use actix_web::{post, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    constants::prompts::GENERAL_SUBJECT,
    errors::AppError,
    models::dto::{request::ChatRequest, response::ChatResponse},
};

#[post("/api/chat")]
pub async fn chat(
    state: web::Data<Arc<AppState>>,
    request: web::Json<ChatRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let subject = request.subject.as_deref().unwrap_or(GENERAL_SUBJECT);
    let reply = state.chat_service.reply(subject, request.messages).await?;

    Ok(HttpResponse::Ok().json(ChatResponse { reply }))
}
