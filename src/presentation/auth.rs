use crate::domain::user::{CreateUser, LoginRequest, UserProfile};
use crate::presentation::handlers::{ApiError, AppState};
use crate::presentation::middleware::{AuthenticatedUser, SESSION_COOKIE};
use crate::presentation::validation::ValidatedJson;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::{HttpResponse, web};
use serde::Serialize;
use tracing::{error, info, instrument};

#[derive(Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserProfile,
    pub token: String,
}

#[instrument(skip(state, req))]
pub async fn register(
    state: web::Data<AppState>,
    req: ValidatedJson<CreateUser>,
) -> Result<HttpResponse, ApiError> {
    let req = req.into_inner();
    info!(name = %req.username, is_lecturer = req.is_lecturer, "Registration request received");

    let user = state.auth_service.register_user(req).await.map_err(|e| {
        error!(error = %e, "Failed to register user");
        ApiError::from(e)
    })?;

    info!(user_id = %user.id, "User registered successfully");
    Ok(HttpResponse::Created().json(user.profile()))
}

/// Answers 204 when the caller already holds a valid session.
#[instrument(skip(state, current, req))]
pub async fn login(
    state: web::Data<AppState>,
    current: Option<AuthenticatedUser>,
    req: ValidatedJson<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    if let Some(user) = current {
        info!(user_id = %user.id, "Already logged in");
        return Ok(HttpResponse::NoContent().finish());
    }

    let req = req.into_inner();
    info!(name = %req.username, "Login request received");
    let (user, token) = state.auth_service.login(req).await.map_err(|e| {
        error!(error = %e, "Failed to login");
        ApiError::from(e)
    })?;

    let cookie = Cookie::build(SESSION_COOKIE, token.clone())
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/")
        .finish();

    info!(user_id = %user.id, "Login successful");
    Ok(HttpResponse::Ok().cookie(cookie).json(LoginResponse {
        user: user.profile(),
        token,
    }))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn me(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let stored = state
        .auth_service
        .find_user_by_id(&user.id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized(format!("User {} does not exist", user.id)))?;
    Ok(HttpResponse::Ok().json(stored.profile()))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn user_bookings(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let bookings = state.booking_service.user_bookings(&user.id).await?;
    info!(count = bookings.len(), "User bookings retrieved");
    Ok(HttpResponse::Ok().json(bookings))
}
