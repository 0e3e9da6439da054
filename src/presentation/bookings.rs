use crate::domain::booking::BookingRequest;
use crate::presentation::handlers::{ApiError, AppState};
use crate::presentation::middleware::AuthenticatedUser;
use crate::presentation::validation::ValidatedJson;
use actix_web::{HttpResponse, web};
use tracing::{error, info, instrument};

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_bookings(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (course_id, date_id) = path.into_inner();
    let bookings = state
        .booking_service
        .list_bookings(&course_id, &date_id, &user.id)
        .await?;
    Ok(HttpResponse::Ok().json(bookings))
}

#[instrument(skip(state, user, req), fields(user_id = %user.id, spots = req.0.spots))]
pub async fn create_booking(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<(String, String)>,
    req: ValidatedJson<BookingRequest>,
) -> Result<HttpResponse, ApiError> {
    let (course_id, date_id) = path.into_inner();
    let spots = req.into_inner().spots;
    let booking = state
        .booking_service
        .book_spots(&course_id, &date_id, &user.id, spots)
        .await
        .map_err(|e| {
            error!(course_id = %course_id, date_id = %date_id, error = %e, "Failed to book spots");
            ApiError::from(e)
        })?;
    info!(booking_id = %booking.id, "Booking created");
    Ok(HttpResponse::Created().json(booking))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get_booking(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<(String, String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (course_id, date_id, booking_id) = path.into_inner();
    let booking = state
        .booking_service
        .get_booking(&course_id, &date_id, &booking_id, &user.id)
        .await?;
    Ok(HttpResponse::Ok().json(booking))
}

#[instrument(skip(state, user, req), fields(user_id = %user.id, spots = req.0.spots))]
pub async fn update_booking(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<(String, String, String)>,
    req: ValidatedJson<BookingRequest>,
) -> Result<HttpResponse, ApiError> {
    let (course_id, date_id, booking_id) = path.into_inner();
    let booking = state
        .booking_service
        .update_booking(&course_id, &date_id, &booking_id, &user.id, req.into_inner().spots)
        .await?;
    info!(booking_id = %booking.id, "Booking updated");
    Ok(HttpResponse::Ok().json(booking))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_booking(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<(String, String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (course_id, date_id, booking_id) = path.into_inner();
    let booking = state
        .booking_service
        .delete_booking(&course_id, &date_id, &booking_id, &user.id)
        .await?;
    info!(booking_id = %booking.id, "Booking deleted");
    Ok(HttpResponse::Ok().json(booking))
}
