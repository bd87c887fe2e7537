use axum::{
    extract::{ConnectInfo, Path, State},
    http::{header, HeaderMap},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::{
    auth::middleware::AuthIdentity,
    dto::auth::{
        AuthResponse, LoginRequest, MessageResponse, RefreshRequest, RefreshResponse,
        RegisterRequest,
    },
    errors::AppError,
    services::auth_service::{self, Credentials},
    state::AppState,
};

pub const REFRESH_COOKIE: &str = "refreshToken";

fn refresh_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, token))
        .http_only(true)
        .secure(state.cfg.production)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(time::Duration::seconds(state.cfg.refresh_token_ttl_seconds))
        .build()
}

fn client_ip(headers: &HeaderMap, addr: &SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| addr.ip().to_string())
}

fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("Unknown")
        .to_string()
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let out = auth_service::register(
        &state,
        Credentials {
            email: req.email,
            password: req.password,
            device_id: req.device_id,
            ip: client_ip(&headers, &addr),
            user_agent: user_agent(&headers),
            language: req.language,
        },
    )
    .await?;

    let jar = jar.add(refresh_cookie(&state, out.tokens.refresh_token));
    Ok((
        jar,
        Json(AuthResponse {
            token: out.tokens.access_token,
            token_type: "Bearer".to_string(),
            user: out.user,
        }),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let out = auth_service::login(
        &state,
        Credentials {
            email: req.email,
            password: req.password,
            device_id: req.device_id,
            ip: client_ip(&headers, &addr),
            user_agent: user_agent(&headers),
            language: None,
        },
    )
    .await?;

    let jar = jar.add(refresh_cookie(&state, out.tokens.refresh_token));
    Ok((
        jar,
        Json(AuthResponse {
            token: out.tokens.access_token,
            token_type: "Bearer".to_string(),
            user: out.user,
        }),
    ))
}

pub async fn activate(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    Path(token): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    auth_service::activate(&state, &identity.subject_id, &token).await?;
    Ok(Json(MessageResponse::ok()))
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<RefreshRequest>,
) -> Result<(CookieJar, Json<RefreshResponse>), AppError> {
    let presented = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(AppError::Unauthorized)?;

    let pair = state.sessions.rotate(&presented, &req.device_id).await?;

    let jar = jar.add(refresh_cookie(&state, pair.refresh_token));
    Ok((
        jar,
        Json(RefreshResponse {
            token: pair.access_token,
            token_type: "Bearer".to_string(),
        }),
    ))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), AppError> {
    auth_service::logout(&state, &identity).await?;
    // Removal must match the path the cookie was set with.
    let jar = jar.remove(Cookie::build((REFRESH_COOKIE, "")).path("/").build());
    Ok((jar, Json(MessageResponse::ok())))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthIdentity(identity): AuthIdentity,
) -> Result<Json<crate::models::account::AccountPublic>, AppError> {
    Ok(Json(auth_service::me(&state, &identity).await?))
}
