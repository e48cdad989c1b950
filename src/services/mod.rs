pub mod chat_service;
pub mod gemini_client;
pub mod quiz_engine;
pub mod quiz_result_service;
pub mod result_aggregator;
pub mod sampling;
pub mod session_manager;
pub mod user_service;
