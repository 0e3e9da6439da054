pub mod auth_service;
pub mod booking_service;
pub mod course_service;
pub mod schema_service;
