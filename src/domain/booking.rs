use serde::{Deserialize, Serialize};

/// A booking of spots at one date of a course. Course, date and user are
/// referenced by id only.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Booking {
    pub id: String,
    pub course: String,
    pub date: String,
    pub user: String,
    pub spots: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct BookingRequest {
    pub spots: u32,
}

/// Selects bookings by any combination of course, date and user.
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub course: Option<String>,
    pub date: Option<String>,
    pub user: Option<String>,
}

impl BookingFilter {
    pub fn for_date(course: &str, date: &str) -> Self {
        Self {
            course: Some(course.to_string()),
            date: Some(date.to_string()),
            user: None,
        }
    }

    pub fn for_user(user: &str) -> Self {
        Self {
            user: Some(user.to_string()),
            ..Self::default()
        }
    }

    pub fn with_user(mut self, user: &str) -> Self {
        self.user = Some(user.to_string());
        self
    }

    pub fn matches(&self, booking: &Booking) -> bool {
        self.course.as_ref().is_none_or(|c| *c == booking.course)
            && self.date.as_ref().is_none_or(|d| *d == booking.date)
            && self.user.as_ref().is_none_or(|u| *u == booking.user)
    }
}
