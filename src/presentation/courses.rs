use crate::domain::models::{CourseChange, CourseFilter, NewCourse};
use crate::presentation::handlers::{ApiError, AppState, Lecturer};
use crate::presentation::validation::ValidatedJson;
use actix_web::{HttpResponse, web};
use tracing::{error, info, instrument};

#[instrument(skip(state, query))]
pub async fn list_courses(
    state: web::Data<AppState>,
    query: web::Query<CourseFilter>,
) -> Result<HttpResponse, ApiError> {
    let filter = query.into_inner();
    let courses = state.course_service.list_courses(&filter).await?;
    info!(count = courses.len(), filtered = !filter.is_empty(), "Courses listed");
    Ok(HttpResponse::Ok().json(courses))
}

#[instrument(skip(state, lecturer, req), fields(lecturer_id = %lecturer.0.id))]
pub async fn create_course(
    state: web::Data<AppState>,
    lecturer: Lecturer,
    req: ValidatedJson<NewCourse>,
) -> Result<HttpResponse, ApiError> {
    let course = state
        .course_service
        .add_course(req.into_inner(), &lecturer.0.id)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create course");
            ApiError::from(e)
        })?;
    info!(course_id = %course.id, "Course created");
    Ok(HttpResponse::Created().json(course))
}

#[instrument(skip(state), fields(course_id = %*path))]
pub async fn get_course(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let course = state.course_service.get_course_view(&path).await?;
    Ok(HttpResponse::Ok().json(course))
}

#[instrument(skip(state, lecturer, req), fields(course_id = %*path))]
pub async fn update_course(
    state: web::Data<AppState>,
    lecturer: Lecturer,
    path: web::Path<String>,
    req: ValidatedJson<CourseChange>,
) -> Result<HttpResponse, ApiError> {
    let course = state
        .course_service
        .update_course(&path, req.into_inner(), &lecturer.0.id)
        .await?;
    info!("Course updated");
    Ok(HttpResponse::Ok().json(course))
}

#[instrument(skip(state, lecturer), fields(course_id = %*path))]
pub async fn delete_course(
    state: web::Data<AppState>,
    lecturer: Lecturer,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let course = state
        .course_service
        .delete_course(&path, &lecturer.0.id)
        .await?;
    info!("Course deleted");
    Ok(HttpResponse::Ok().json(course))
}
