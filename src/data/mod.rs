pub mod booking_repository;
pub mod course_repository;
pub mod user_repository;
