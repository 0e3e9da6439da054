use crate::application::auth_service::AuthService;
use crate::application::booking_service::BookingService;
use crate::application::course_service::{CourseService, capacity_lock};
use crate::application::schema_service::SchemaService;
use crate::data::booking_repository::InMemoryBookingRepository;
use crate::data::course_repository::InMemoryCourseRepository;
use crate::data::user_repository::InMemoryUserRepository;
use crate::domain::error::DomainError;
use crate::presentation::middleware::{AuthenticatedUser, RejectedToken};
use actix_web::http::StatusCode;
use actix_web::{FromRequest, HttpMessage, HttpRequest, HttpResponse, ResponseError};
use chrono::Utc;
use serde::Serialize;
use std::future::{Ready, ready};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

pub type Users = InMemoryUserRepository;
pub type Courses = InMemoryCourseRepository;
pub type Bookings = InMemoryBookingRepository;

// AppState holding the services
pub struct AppState {
    pub auth_service: Arc<AuthService<Users>>,
    pub course_service: Arc<CourseService<Courses, Users, Bookings>>,
    pub booking_service: Arc<BookingService<Bookings, Courses>>,
    pub schema_service: Arc<SchemaService>,
}

impl AppState {
    /// Wires all services onto one set of in-memory repositories.
    pub fn in_memory(jwt_secret: String, schema_service: Arc<SchemaService>) -> Self {
        let users = Arc::new(Users::new());
        let courses = Arc::new(Courses::new());
        let bookings = Arc::new(Bookings::new());
        let capacity = capacity_lock();

        Self {
            auth_service: Arc::new(AuthService::new(users.clone(), jwt_secret)),
            course_service: Arc::new(CourseService::new(
                courses.clone(),
                users,
                bookings.clone(),
                capacity.clone(),
            )),
            booking_service: Arc::new(BookingService::new(bookings, courses, capacity)),
            schema_service,
        }
    }
}

// Course API Error Types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("{0}")]
    NoOpenSpots(String),
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NoOpenSpots(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidToken(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Errors are logged but never echoed to the client.
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_msg = self.to_string();

        match self {
            ApiError::Internal(_) => {
                error!(error = %error_msg, status = %status, "Internal error")
            }
            ApiError::NotFound(_) => {
                warn!(error = %error_msg, status = %status, "Resource not found")
            }
            ApiError::Forbidden(_) | ApiError::Unauthorized(_) | ApiError::InvalidToken(_) => {
                warn!(error = %error_msg, status = %status, "Access denied")
            }
            ApiError::Validation(_) | ApiError::NoOpenSpots(_) => {
                warn!(error = %error_msg, status = %status, "Request rejected")
            }
        }

        HttpResponse::build(status).finish()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<DomainError>() {
            Some(e @ DomainError::NoOpenSpots { .. }) => ApiError::NoOpenSpots(e.to_string()),
            Some(DomainError::Validation(msg)) => ApiError::Validation(msg.clone()),
            Some(DomainError::NotFound(msg)) => ApiError::NotFound(msg.clone()),
            Some(DomainError::Unauthorized(msg)) => ApiError::Unauthorized(msg.clone()),
            Some(DomainError::Forbidden(msg)) => ApiError::Forbidden(msg.clone()),
            Some(DomainError::InvalidToken(msg)) => ApiError::InvalidToken(msg.clone()),
            Some(DomainError::Internal(msg)) => ApiError::Internal(msg.clone()),
            None => ApiError::Internal(format!("{:#}", err)),
        }
    }
}

fn current_user(req: &HttpRequest) -> Result<AuthenticatedUser, ApiError> {
    let extensions = req.extensions();
    if let Some(user) = extensions.get::<AuthenticatedUser>() {
        return Ok(user.clone());
    }
    match extensions.get::<RejectedToken>() {
        Some(RejectedToken(reason)) => Err(ApiError::InvalidToken(reason.clone())),
        None => Err(ApiError::Forbidden("No session token".to_string())),
    }
}

// AuthenticatedUser extractor
impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        ready(current_user(req))
    }
}

/// A logged-in user holding the lecturer role.
#[derive(Debug, Clone)]
pub struct Lecturer(pub AuthenticatedUser);

impl FromRequest for Lecturer {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        ready(current_user(req).and_then(|user| {
            if user.is_lecturer {
                Ok(Lecturer(user))
            } else {
                Err(ApiError::InvalidToken(
                    "token does not match required parameters".to_string(),
                ))
            }
        }))
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
}

#[instrument]
pub async fn health_check() -> HttpResponse {
    info!("Health check requested");
    let response = HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    };
    HttpResponse::Ok().json(response)
}

pub async fn not_found(req: HttpRequest) -> HttpResponse {
    warn!(method = %req.method(), path = %req.path(), "No route matched");
    HttpResponse::NotFound().finish()
}
