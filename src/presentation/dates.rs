use crate::domain::models::{CourseDateChange, NewCourseDate};
use crate::presentation::handlers::{ApiError, AppState, Lecturer};
use crate::presentation::validation::ValidatedJson;
use actix_web::{HttpResponse, web};
use tracing::{info, instrument};

#[instrument(skip(state), fields(course_id = %*path))]
pub async fn list_dates(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let dates = state.course_service.list_dates(&path).await?;
    Ok(HttpResponse::Ok().json(dates))
}

#[instrument(skip(state, lecturer, req), fields(course_id = %*path))]
pub async fn create_date(
    state: web::Data<AppState>,
    lecturer: Lecturer,
    path: web::Path<String>,
    req: ValidatedJson<NewCourseDate>,
) -> Result<HttpResponse, ApiError> {
    let date = state
        .course_service
        .add_course_date(&path, req.into_inner(), &lecturer.0.id)
        .await?;
    info!(date_id = %date.id, "Course date created");
    Ok(HttpResponse::Created().json(date))
}

#[instrument(skip(state))]
pub async fn get_date(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (course_id, date_id) = path.into_inner();
    let date = state.course_service.get_date(&course_id, &date_id).await?;
    Ok(HttpResponse::Ok().json(date))
}

#[instrument(skip(state, lecturer, req))]
pub async fn update_date(
    state: web::Data<AppState>,
    lecturer: Lecturer,
    path: web::Path<(String, String)>,
    req: ValidatedJson<CourseDateChange>,
) -> Result<HttpResponse, ApiError> {
    let (course_id, date_id) = path.into_inner();
    let date = state
        .course_service
        .update_course_date(&course_id, &date_id, req.into_inner(), &lecturer.0.id)
        .await?;
    info!(date_id = %date.id, "Course date updated");
    Ok(HttpResponse::Ok().json(date))
}

#[instrument(skip(state, lecturer))]
pub async fn delete_date(
    state: web::Data<AppState>,
    lecturer: Lecturer,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (course_id, date_id) = path.into_inner();
    let date = state
        .course_service
        .delete_course_date(&course_id, &date_id, &lecturer.0.id)
        .await?;
    info!(date_id = %date.id, "Course date deleted");
    Ok(HttpResponse::Ok().json(date))
}
