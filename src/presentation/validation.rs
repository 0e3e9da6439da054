use crate::application::schema_service::{
    BOOKING_SCHEMA, COURSE_CHANGE_SCHEMA, COURSE_DATE_CHANGE_SCHEMA, COURSE_DATE_SCHEMA,
    COURSE_SCHEMA, LOGIN_SCHEMA, SIGNUP_SCHEMA,
};
use crate::domain::booking::BookingRequest;
use crate::domain::models::{CourseChange, CourseDateChange, NewCourse, NewCourseDate};
use crate::domain::user::{CreateUser, LoginRequest};
use crate::presentation::handlers::{ApiError, AppState};
use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, web};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use tracing::debug;

/// A request body type with a JSON schema it must satisfy.
pub trait RequestSchema: DeserializeOwned {
    const SCHEMA: &'static str;
}

impl RequestSchema for CreateUser {
    const SCHEMA: &'static str = SIGNUP_SCHEMA;
}

impl RequestSchema for LoginRequest {
    const SCHEMA: &'static str = LOGIN_SCHEMA;
}

impl RequestSchema for NewCourse {
    const SCHEMA: &'static str = COURSE_SCHEMA;
}

impl RequestSchema for CourseChange {
    const SCHEMA: &'static str = COURSE_CHANGE_SCHEMA;
}

impl RequestSchema for NewCourseDate {
    const SCHEMA: &'static str = COURSE_DATE_SCHEMA;
}

impl RequestSchema for CourseDateChange {
    const SCHEMA: &'static str = COURSE_DATE_CHANGE_SCHEMA;
}

impl RequestSchema for BookingRequest {
    const SCHEMA: &'static str = BOOKING_SCHEMA;
}

/// JSON body extractor that checks the raw document against the schema of
/// `T` before deserializing it. Any failure is a 400.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T> ValidatedJson<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: RequestSchema + 'static> FromRequest for ValidatedJson<T> {
    type Error = ApiError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let body = web::Json::<Value>::from_request(req, payload);

        Box::pin(async move {
            let state =
                state.ok_or_else(|| ApiError::Internal("application state missing".to_string()))?;
            let web::Json(value) = body
                .await
                .map_err(|e| ApiError::Validation(format!("Malformed JSON body: {}", e)))?;

            state.schema_service.validate(T::SCHEMA, &value)?;
            debug!(schema = T::SCHEMA, "Request body matches schema");

            serde_json::from_value(value)
                .map(ValidatedJson)
                .map_err(|e| ApiError::Validation(e.to_string()))
        })
    }
}
