use crate::domain::booking::{Booking, BookingFilter};
use crate::domain::models::Course;
use crate::domain::user::User;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with a validation error when the name is already taken.
    async fn insert_user(&self, user: User) -> Result<()>;
    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>>;
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>>;
}

#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn save_course(&self, course: Course) -> Result<()>;
    async fn find_course_by_id(&self, id: &str) -> Result<Option<Course>>;
    async fn list_courses(&self) -> Result<Vec<Course>>;
    async fn delete_course(&self, id: &str) -> Result<Option<Course>>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn save_booking(&self, booking: Booking) -> Result<()>;
    async fn find_booking_by_id(&self, id: &str) -> Result<Option<Booking>>;
    async fn find_bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>>;
    async fn delete_booking(&self, id: &str) -> Result<Option<Booking>>;
    /// Sum of booked spots for one date of a course.
    async fn booked_spots(&self, course: &str, date: &str) -> Result<u32>;
}
