pub mod auth;
pub mod bookings;
pub mod courses;
pub mod dates;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod validation;
