pub mod auth_handler;
pub mod catalog_handler;
pub mod chat_handler;
pub mod health_handler;
pub mod result_handler;
pub mod session_handler;

use std::sync::Arc;

use actix_web::{error::JsonPayloadError, web, HttpRequest};

use crate::{app_state::AppState, errors::AppError, graphql};

/// Malformed JSON bodies surface as `INVALID_INPUT` like any other validation failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(256 * 1024)
        .error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
            AppError::ValidationError(err.to_string()).into()
        })
}

/// Registers shared state and every route of the service.
pub fn configure_app(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        let schema = graphql::create_schema(state.clone());

        cfg.app_data(web::Data::from(state.jwt_service.clone()))
            .app_data(web::Data::new(Arc::new(state)))
            .app_data(web::Data::new(schema))
            .app_data(json_config())
            .service(health_handler::health_check)
            .service(health_handler::health_check_ready)
            .service(catalog_handler::list_subjects)
            .service(catalog_handler::question_schema)
            .service(session_handler::start_session)
            .service(session_handler::get_session)
            .service(session_handler::submit_answer)
            .service(session_handler::advance_session)
            .service(session_handler::reset_session)
            .service(session_handler::abandon_session)
            .service(result_handler::save_result)
            .service(result_handler::list_results)
            .service(result_handler::get_result)
            .service(result_handler::dashboard)
            .service(chat_handler::chat)
            .service(auth_handler::auth_github_callback)
            .service(auth_handler::refresh_tokens)
            .service(graphql::graphql_handler)
            .service(graphql::graphiql);
    }
}
