use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::user::UserProfile;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum CourseCategory {
    Konferenz,
    Sprachkurs,
    Meeting,
    Weiterbildung,
}

/// A course as it is kept in the document store. `lecturer` is the owning
/// user's id.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub organiser: Option<String>,
    pub lecturer: String,
    pub category: CourseCategory,
    pub dates: Vec<CourseDate>,
}

impl Course {
    pub fn date(&self, date_id: &str) -> Option<&CourseDate> {
        self.dates.iter().find(|d| d.id == date_id)
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.lecturer == user_id
    }

    /// The date the course is first held at.
    pub fn first_date(&self) -> Option<&CourseDate> {
        self.dates.iter().min_by_key(|d| d.start_date)
    }
}

/// A course as it is returned to clients, with the lecturer resolved.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CourseView {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organiser: Option<String>,
    pub lecturer: UserProfile,
    pub category: CourseCategory,
    pub dates: Vec<CourseDate>,
}

impl CourseView {
    pub fn new(course: Course, lecturer: UserProfile) -> Self {
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            price: course.price,
            organiser: course.organiser,
            lecturer,
            category: course.category,
            dates: course.dates,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CourseDate {
    pub id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_spots: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Date input. An `id` is only kept when a whole date list is replaced
/// through a course change; otherwise a fresh one is assigned.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewCourseDate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_spots: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CourseDateChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_spots: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewCourse {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Username of the lecturer; defaults to the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lecturer: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub dates: Vec<NewCourseDate>,
    pub category: CourseCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organiser: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CourseChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lecturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dates: Option<Vec<NewCourseDate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CourseCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organiser: Option<String>,
}

/// Query of `GET /courses`. Both bounds are inclusive.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CourseFilter {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl CourseFilter {
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn matches(&self, course: &Course) -> bool {
        if self.is_empty() {
            return true;
        }
        let Some(first) = course.first_date() else {
            return false;
        };
        self.start.is_none_or(|start| first.start_date >= start)
            && self.end.is_none_or(|end| first.end_date <= end)
    }
}
