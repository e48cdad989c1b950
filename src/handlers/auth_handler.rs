use std::sync::Arc;

use actix_web::{get, post, web, HttpResponse};
use octocrab::Octocrab;
use secrecy::ExposeSecret as _;
use serde::Deserialize;
use validator::Validate;

use crate::{
    app_state::AppState,
    config::Config,
    errors::AppError,
    models::{
        domain::User,
        dto::{
            request::RefreshTokenRequest,
            response::{TokenResponse, UserDto},
        },
    },
    services::user_service::OAuthProfile,
};

const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: String,
    #[serde(default)]
    redirect_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    id: u64,
    login: String,
    email: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubTokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

async fn exchange_code(config: &Config, code: &str, redirect_uri: &str) -> Result<String, AppError> {
    let response = reqwest::Client::new()
        .post(GITHUB_TOKEN_URL)
        .header("accept", "application/json")
        .form(&[
            ("code", code),
            ("client_id", config.gh_client_id.as_str()),
            ("client_secret", config.gh_client_secret.expose_secret()),
            ("redirect_uri", redirect_uri),
        ])
        .send()
        .await?;

    let status = response.status();
    let token = response.json::<GithubTokenResponse>().await.map_err(|e| {
        log::error!("Unreadable GitHub token response ({}): {}", status, e);
        AppError::UpstreamError(format!("Failed to parse GitHub token response: {}", e))
    })?;

    if let Some(error) = token.error {
        let description = token.error_description.unwrap_or_default();
        log::warn!("GitHub OAuth error: {} - {}", error, description);
        return Err(AppError::Unauthorized(format!(
            "GitHub OAuth error: {} - {}",
            error, description
        )));
    }

    token
        .access_token
        .ok_or_else(|| AppError::UpstreamError("No access_token in GitHub response".to_string()))
}

async fn fetch_profile(access_token: String) -> Result<OAuthProfile, AppError> {
    let gh_client = Octocrab::builder()
        .user_access_token(access_token)
        .build()
        .map_err(|e| AppError::InternalError(format!("Failed to build GitHub client: {}", e)))?;

    let gh_user: GithubUser = gh_client
        .get("/user", None::<&()>)
        .await
        .map_err(|e| AppError::UpstreamError(format!("Failed to fetch GitHub user: {}", e)))?;

    Ok(OAuthProfile {
        provider_id: gh_user.id.to_string(),
        login: gh_user.login,
        email: gh_user.email,
        name: gh_user.name,
    })
}

fn issue_tokens(state: &AppState, user: User) -> Result<TokenResponse, AppError> {
    let access_token = state.jwt_service.create_token(&user)?;
    let refresh_token = state.jwt_service.create_refresh_token(&user.id)?;

    Ok(TokenResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service.expires_in(),
        user: UserDto::from(user),
    })
}

#[get("/auth/github/callback")]
pub async fn auth_github_callback(
    state: web::Data<Arc<AppState>>,
    web::Query(params): web::Query<CallbackParams>,
) -> Result<HttpResponse, AppError> {
    let redirect_uri = params
        .redirect_uri
        .as_deref()
        .unwrap_or(state.config.gh_redirect_uri.as_str());

    let access_token = exchange_code(&state.config, &params.code, redirect_uri).await?;
    let profile = fetch_profile(access_token).await?;
    let user = state.user_service.upsert_oauth_user(profile).await?;

    Ok(HttpResponse::Ok().json(issue_tokens(&state, user)?))
}

#[post("/auth/refresh")]
pub async fn refresh_tokens(
    state: web::Data<Arc<AppState>>,
    request: web::Json<RefreshTokenRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let refresh_claims = state
        .jwt_service
        .validate_refresh_token(&request.refresh_token)?;

    let user = state
        .user_service
        .get_user(&refresh_claims.sub)
        .await
        .map_err(|_| {
            AppError::Unauthorized("User associated with refresh token not found".to_string())
        })?;

    log::info!("Token refreshed for user {}", user.id);
    Ok(HttpResponse::Ok().json(issue_tokens(&state, user)?))
}
