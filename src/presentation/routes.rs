use crate::presentation::auth::{login, me, register, user_bookings};
use crate::presentation::bookings::{
    create_booking, delete_booking, get_booking, list_bookings, update_booking,
};
use crate::presentation::courses::{
    create_course, delete_course, get_course, list_courses, update_course,
};
use crate::presentation::dates::{create_date, delete_date, get_date, list_dates, update_date};
use crate::presentation::handlers::{ApiError, health_check};
use actix_web::web;

/// Registers every route relative to the scope it is mounted in
/// (`/api/v1` in the server).
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::Validation(err.to_string()).into()),
    )
    .route("/health", web::get().to(health_check))
    .service(
        web::scope("/users")
            .route("", web::post().to(register))
            .route("/login", web::post().to(login))
            .route("/me", web::get().to(me))
            .route("/bookings", web::get().to(user_bookings)),
    )
    .service(
        web::scope("/courses")
            .service(
                web::resource("")
                    .route(web::get().to(list_courses))
                    .route(web::post().to(create_course)),
            )
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_course))
                    .route(web::put().to(update_course))
                    .route(web::delete().to(delete_course)),
            )
            .service(
                web::resource("/{id}/dates")
                    .route(web::get().to(list_dates))
                    .route(web::post().to(create_date)),
            )
            .service(
                web::resource("/{id}/dates/{date_id}")
                    .route(web::get().to(get_date))
                    .route(web::put().to(update_date))
                    .route(web::delete().to(delete_date)),
            )
            .service(
                web::resource("/{id}/dates/{date_id}/bookings")
                    .route(web::get().to(list_bookings))
                    .route(web::post().to(create_booking)),
            )
            .service(
                web::resource("/{id}/dates/{date_id}/bookings/{booking_id}")
                    .route(web::get().to(get_booking))
                    .route(web::put().to(update_booking))
                    .route(web::delete().to(delete_booking)),
            ),
    );
}
