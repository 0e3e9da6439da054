use crate::domain::error::DomainError;
use crate::domain::models::{
    Course, CourseChange, CourseDate, CourseDateChange, CourseFilter, CourseView, NewCourse,
    NewCourseDate,
};
use crate::domain::repository::{BookingRepository, CourseRepository, UserRepository};
use crate::domain::user::UserProfile;
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Serializes every write that can change how many spots a date has or how
/// many of them are booked. Shared between the course and booking services.
pub type CapacityLock = Arc<Mutex<()>>;

pub fn capacity_lock() -> CapacityLock {
    Arc::new(Mutex::new(()))
}

pub struct CourseService<C: CourseRepository, U: UserRepository, B: BookingRepository> {
    course_repository: Arc<C>,
    user_repository: Arc<U>,
    booking_repository: Arc<B>,
    capacity: CapacityLock,
}

fn check_date_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
    if end < start {
        return Err(DomainError::Validation(format!(
            "endDate {} is before startDate {}",
            end.to_rfc3339(),
            start.to_rfc3339()
        ))
        .into());
    }
    Ok(())
}

fn build_date(input: NewCourseDate) -> Result<CourseDate> {
    check_date_range(input.start_date, input.end_date)?;
    if input.total_spots == 0 {
        return Err(DomainError::Validation("totalSpots must be at least 1".to_string()).into());
    }
    Ok(CourseDate {
        id: input.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        start_date: input.start_date,
        end_date: input.end_date,
        total_spots: input.total_spots,
        location: input.location,
    })
}

/// Date ids must stay unique within a course, so a replacement list may not
/// name the same id twice.
fn check_unique_ids(dates: &[CourseDate]) -> Result<()> {
    let mut seen = HashSet::with_capacity(dates.len());
    for date in dates {
        if !seen.insert(date.id.as_str()) {
            return Err(DomainError::Validation(format!(
                "Date id {} appears more than once",
                date.id
            ))
            .into());
        }
    }
    Ok(())
}

fn not_found(course_id: &str) -> DomainError {
    DomainError::NotFound(format!("Course {} not found", course_id))
}

fn date_not_found(course_id: &str, date_id: &str) -> DomainError {
    DomainError::NotFound(format!("Date {} of course {} not found", date_id, course_id))
}

impl<C: CourseRepository, U: UserRepository, B: BookingRepository> CourseService<C, U, B> {
    pub fn new(
        course_repository: Arc<C>,
        user_repository: Arc<U>,
        booking_repository: Arc<B>,
        capacity: CapacityLock,
    ) -> Self {
        Self {
            course_repository,
            user_repository,
            booking_repository,
            capacity,
        }
    }

    #[instrument(skip(self))]
    pub async fn list_courses(&self, filter: &CourseFilter) -> Result<Vec<CourseView>> {
        if let (Some(start), Some(end)) = (filter.start, filter.end) {
            check_date_range(start, end)?;
        }
        let courses = self.course_repository.list_courses().await?;
        let total = courses.len();

        let mut views = Vec::new();
        for course in courses.into_iter().filter(|c| filter.matches(c)) {
            views.push(self.to_view(course).await?);
        }
        debug!(total = total, matched = views.len(), "Listed courses");
        Ok(views)
    }

    #[instrument(skip(self))]
    pub async fn find_course(&self, course_id: &str) -> Result<Course> {
        self.course_repository
            .find_course_by_id(course_id)
            .await?
            .ok_or_else(|| not_found(course_id).into())
    }

    pub async fn get_course_view(&self, course_id: &str) -> Result<CourseView> {
        let course = self.find_course(course_id).await?;
        self.to_view(course).await
    }

    /// Resolves the lecturer id of a stored course to the lecturer's profile.
    pub async fn to_view(&self, course: Course) -> Result<CourseView> {
        let lecturer = match self.user_repository.find_user_by_id(&course.lecturer).await? {
            Some(user) => user.profile(),
            None => {
                // Account is gone; keep the id so clients still see who owned the course.
                warn!(course_id = %course.id, lecturer = %course.lecturer, "Lecturer of course no longer exists");
                UserProfile {
                    id: course.lecturer.clone(),
                    name: String::new(),
                    is_lecturer: true,
                }
            }
        };
        Ok(CourseView::new(course, lecturer))
    }

    /// Looks up a lecturer by username, falling back to the caller.
    async fn resolve_lecturer(&self, username: Option<&str>, caller_id: &str) -> Result<String> {
        let Some(username) = username else {
            return Ok(caller_id.to_string());
        };
        match self.user_repository.find_user_by_name(username).await? {
            Some(user) if user.is_lecturer => Ok(user.id),
            Some(_) => Err(DomainError::Validation(format!("{} is not a lecturer", username)).into()),
            None => Err(DomainError::Validation(format!("Unknown lecturer {}", username)).into()),
        }
    }

    async fn owned_course(&self, course_id: &str, caller_id: &str) -> Result<Course> {
        let course = self.find_course(course_id).await?;
        if !course.is_owned_by(caller_id) {
            warn!(course_id = course_id, caller = caller_id, "Caller does not own course");
            return Err(DomainError::Forbidden(format!(
                "Course {} belongs to another lecturer",
                course_id
            ))
            .into());
        }
        Ok(course)
    }

    async fn ensure_capacity(&self, course_id: &str, date: &CourseDate) -> Result<()> {
        let booked = self
            .booking_repository
            .booked_spots(course_id, &date.id)
            .await?;
        if date.total_spots < booked {
            return Err(DomainError::Validation(format!(
                "totalSpots {} is below the {} spots already booked",
                date.total_spots, booked
            ))
            .into());
        }
        Ok(())
    }

    #[instrument(skip(self, new_course), fields(title = %new_course.title))]
    pub async fn add_course(&self, new_course: NewCourse, caller_id: &str) -> Result<CourseView> {
        if new_course.title.trim().is_empty() {
            return Err(DomainError::Validation("title must not be empty".to_string()).into());
        }
        if new_course.price < 0.0 {
            return Err(DomainError::Validation("price must not be negative".to_string()).into());
        }
        let lecturer = self
            .resolve_lecturer(new_course.lecturer.as_deref(), caller_id)
            .await?;
        let dates = new_course
            .dates
            .into_iter()
            .map(|d| build_date(NewCourseDate { id: None, ..d }))
            .collect::<Result<Vec<_>>>()?;

        let course = Course {
            id: Uuid::new_v4().to_string(),
            title: new_course.title,
            description: new_course.description,
            price: new_course.price,
            organiser: new_course.organiser,
            lecturer,
            category: new_course.category,
            dates,
        };
        self.course_repository.save_course(course.clone()).await?;

        info!(course_id = %course.id, lecturer = %course.lecturer, dates = course.dates.len(), "Course created");
        self.to_view(course).await
    }

    #[instrument(skip(self, change))]
    pub async fn update_course(
        &self,
        course_id: &str,
        change: CourseChange,
        caller_id: &str,
    ) -> Result<CourseView> {
        let _guard = self.capacity.lock().await;
        let mut course = self.owned_course(course_id, caller_id).await?;

        if let Some(title) = change.title {
            if title.trim().is_empty() {
                return Err(DomainError::Validation("title must not be empty".to_string()).into());
            }
            course.title = title;
        }
        if let Some(price) = change.price {
            if price < 0.0 {
                return Err(DomainError::Validation("price must not be negative".to_string()).into());
            }
            course.price = price;
        }
        if let Some(lecturer) = change.lecturer {
            course.lecturer = self.resolve_lecturer(Some(&lecturer), caller_id).await?;
        }
        if let Some(category) = change.category {
            course.category = category;
        }
        if change.description.is_some() {
            course.description = change.description;
        }
        if change.organiser.is_some() {
            course.organiser = change.organiser;
        }
        if let Some(dates) = change.dates {
            let dates = dates
                .into_iter()
                .map(build_date)
                .collect::<Result<Vec<_>>>()?;
            check_unique_ids(&dates)?;
            for date in &dates {
                self.ensure_capacity(course_id, date).await?;
            }
            course.dates = dates;
        }

        self.course_repository.save_course(course.clone()).await?;
        info!(course_id = course_id, "Course updated");
        self.to_view(course).await
    }

    /// Removes the course. Bookings that reference it are left in place.
    #[instrument(skip(self))]
    pub async fn delete_course(&self, course_id: &str, caller_id: &str) -> Result<CourseView> {
        let _guard = self.capacity.lock().await;
        self.owned_course(course_id, caller_id).await?;
        let removed = self
            .course_repository
            .delete_course(course_id)
            .await?
            .ok_or_else(|| not_found(course_id))?;
        info!(course_id = course_id, "Course deleted");
        self.to_view(removed).await
    }

    pub async fn list_dates(&self, course_id: &str) -> Result<Vec<CourseDate>> {
        let mut dates = self.find_course(course_id).await?.dates;
        dates.sort_by_key(|d| d.start_date);
        Ok(dates)
    }

    pub async fn get_date(&self, course_id: &str, date_id: &str) -> Result<CourseDate> {
        let course = self.find_course(course_id).await?;
        course
            .date(date_id)
            .cloned()
            .ok_or_else(|| date_not_found(course_id, date_id).into())
    }

    #[instrument(skip(self, new_date))]
    pub async fn add_course_date(
        &self,
        course_id: &str,
        new_date: NewCourseDate,
        caller_id: &str,
    ) -> Result<CourseDate> {
        let _guard = self.capacity.lock().await;
        let mut course = self.owned_course(course_id, caller_id).await?;
        let date = build_date(NewCourseDate { id: None, ..new_date })?;

        course.dates.push(date.clone());
        self.course_repository.save_course(course).await?;
        info!(course_id = course_id, date_id = %date.id, "Course date added");
        Ok(date)
    }

    #[instrument(skip(self, change))]
    pub async fn update_course_date(
        &self,
        course_id: &str,
        date_id: &str,
        change: CourseDateChange,
        caller_id: &str,
    ) -> Result<CourseDate> {
        let _guard = self.capacity.lock().await;
        let mut course = self.owned_course(course_id, caller_id).await?;
        let date = course
            .dates
            .iter_mut()
            .find(|d| d.id == date_id)
            .ok_or_else(|| date_not_found(course_id, date_id))?;

        let mut updated = date.clone();
        if let Some(start) = change.start_date {
            updated.start_date = start;
        }
        if let Some(end) = change.end_date {
            updated.end_date = end;
        }
        if let Some(total) = change.total_spots {
            if total == 0 {
                return Err(
                    DomainError::Validation("totalSpots must be at least 1".to_string()).into(),
                );
            }
            updated.total_spots = total;
        }
        if change.location.is_some() {
            updated.location = change.location;
        }
        check_date_range(updated.start_date, updated.end_date)?;
        self.ensure_capacity(course_id, &updated).await?;

        *date = updated.clone();
        self.course_repository.save_course(course).await?;
        info!(course_id = course_id, date_id = date_id, "Course date updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_course_date(
        &self,
        course_id: &str,
        date_id: &str,
        caller_id: &str,
    ) -> Result<CourseDate> {
        let _guard = self.capacity.lock().await;
        let mut course = self.owned_course(course_id, caller_id).await?;
        let index = course
            .dates
            .iter()
            .position(|d| d.id == date_id)
            .ok_or_else(|| date_not_found(course_id, date_id))?;

        let removed = course.dates.remove(index);
        self.course_repository.save_course(course).await?;
        info!(course_id = course_id, date_id = date_id, "Course date deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::booking_repository::InMemoryBookingRepository;
    use crate::data::course_repository::InMemoryCourseRepository;
    use crate::data::user_repository::InMemoryUserRepository;
    use crate::domain::booking::Booking;
    use crate::domain::models::CourseCategory;
    use crate::domain::user::User;
    use chrono::TimeZone;

    type Service =
        CourseService<InMemoryCourseRepository, InMemoryUserRepository, InMemoryBookingRepository>;

    struct Fixture {
        service: Service,
        bookings: Arc<InMemoryBookingRepository>,
    }

    async fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUserRepository::new());
        for (id, name, is_lecturer) in [
            ("lect-1", "002", true),
            ("lect-2", "003", true),
            ("user-1", "001", false),
        ] {
            users
                .insert_user(User {
                    id: id.to_string(),
                    name: name.to_string(),
                    is_lecturer,
                    password_hash: String::new(),
                })
                .await
                .unwrap();
        }
        let bookings = Arc::new(InMemoryBookingRepository::new());
        let service = CourseService::new(
            Arc::new(InMemoryCourseRepository::new()),
            users,
            bookings.clone(),
            capacity_lock(),
        );
        Fixture { service, bookings }
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, d, 9, 0, 0).unwrap()
    }

    fn new_date(start: u32, end: u32, spots: u32) -> NewCourseDate {
        NewCourseDate {
            id: None,
            start_date: day(start),
            end_date: day(end),
            total_spots: spots,
            location: None,
        }
    }

    fn new_course(dates: Vec<NewCourseDate>) -> NewCourse {
        NewCourse {
            title: "TEST".to_string(),
            description: None,
            lecturer: None,
            price: 1887.0,
            dates,
            category: CourseCategory::Konferenz,
            organiser: None,
        }
    }

    fn domain_error(err: anyhow::Error) -> DomainError {
        err.downcast::<DomainError>().unwrap()
    }

    #[tokio::test]
    async fn test_add_course_defaults_lecturer_to_caller() {
        let f = fixture().await;
        let view = f
            .service
            .add_course(new_course(vec![new_date(1, 2, 5)]), "lect-1")
            .await
            .unwrap();

        assert_eq!(view.lecturer.id, "lect-1");
        assert_eq!(view.lecturer.name, "002");
        assert_eq!(view.dates.len(), 1);
        assert!(!view.dates[0].id.is_empty());
    }

    #[tokio::test]
    async fn test_add_course_with_named_lecturer() {
        let f = fixture().await;
        let mut input = new_course(vec![]);
        input.lecturer = Some("003".to_string());
        let view = f.service.add_course(input, "lect-1").await.unwrap();
        assert_eq!(view.lecturer.id, "lect-2");

        let mut input = new_course(vec![]);
        input.lecturer = Some("001".to_string());
        let err = f.service.add_course(input, "lect-1").await.unwrap_err();
        assert!(matches!(domain_error(err), DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_add_course_rejects_reversed_dates() {
        let f = fixture().await;
        let err = f
            .service
            .add_course(new_course(vec![new_date(5, 2, 5)]), "lect-1")
            .await
            .unwrap_err();
        assert!(matches!(domain_error(err), DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_only_owner_may_change_course() {
        let f = fixture().await;
        let view = f.service.add_course(new_course(vec![]), "lect-1").await.unwrap();

        let change = CourseChange {
            title: Some("Changed".to_string()),
            ..CourseChange::default()
        };
        let err = f
            .service
            .update_course(&view.id, change.clone(), "lect-2")
            .await
            .unwrap_err();
        assert!(matches!(domain_error(err), DomainError::Forbidden(_)));

        let err = f.service.delete_course(&view.id, "lect-2").await.unwrap_err();
        assert!(matches!(domain_error(err), DomainError::Forbidden(_)));

        let updated = f.service.update_course(&view.id, change, "lect-1").await.unwrap();
        assert_eq!(updated.title, "Changed");
    }

    #[tokio::test]
    async fn test_delete_course_returns_removed_course() {
        let f = fixture().await;
        let view = f.service.add_course(new_course(vec![]), "lect-1").await.unwrap();

        let removed = f.service.delete_course(&view.id, "lect-1").await.unwrap();
        assert_eq!(removed.id, view.id);
        let err = f.service.find_course(&view.id).await.unwrap_err();
        assert!(matches!(domain_error(err), DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_courses_filters_by_first_date() {
        let f = fixture().await;
        f.service
            .add_course(new_course(vec![new_date(10, 11, 5)]), "lect-1")
            .await
            .unwrap();
        f.service
            .add_course(new_course(vec![new_date(2, 3, 5), new_date(20, 21, 5)]), "lect-1")
            .await
            .unwrap();
        f.service.add_course(new_course(vec![]), "lect-1").await.unwrap();

        let all = f.service.list_courses(&CourseFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let from_fifth = CourseFilter {
            start: Some(day(5)),
            end: None,
        };
        let matched = f.service.list_courses(&from_fifth).await.unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].dates[0].start_date, day(10));

        let reversed = CourseFilter {
            start: Some(day(9)),
            end: Some(day(1)),
        };
        assert!(f.service.list_courses(&reversed).await.is_err());
    }

    #[tokio::test]
    async fn test_date_lifecycle() {
        let f = fixture().await;
        let view = f.service.add_course(new_course(vec![]), "lect-1").await.unwrap();

        let date = f
            .service
            .add_course_date(&view.id, new_date(4, 5, 10), "lect-1")
            .await
            .unwrap();
        assert_eq!(f.service.list_dates(&view.id).await.unwrap().len(), 1);

        let change = CourseDateChange {
            total_spots: Some(20),
            location: Some("Room 1".to_string()),
            ..CourseDateChange::default()
        };
        let updated = f
            .service
            .update_course_date(&view.id, &date.id, change, "lect-1")
            .await
            .unwrap();
        assert_eq!(updated.total_spots, 20);
        assert_eq!(updated.location.as_deref(), Some("Room 1"));
        assert_eq!(f.service.get_date(&view.id, &date.id).await.unwrap(), updated);

        let removed = f
            .service
            .delete_course_date(&view.id, &date.id, "lect-1")
            .await
            .unwrap();
        assert_eq!(removed.id, date.id);
        let err = f.service.get_date(&view.id, &date.id).await.unwrap_err();
        assert!(matches!(domain_error(err), DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_date_changes_require_ownership() {
        let f = fixture().await;
        let view = f
            .service
            .add_course(new_course(vec![new_date(1, 2, 5)]), "lect-1")
            .await
            .unwrap();
        let date_id = view.dates[0].id.clone();

        let err = f
            .service
            .add_course_date(&view.id, new_date(3, 4, 5), "lect-2")
            .await
            .unwrap_err();
        assert!(matches!(domain_error(err), DomainError::Forbidden(_)));

        let err = f
            .service
            .delete_course_date(&view.id, &date_id, "lect-2")
            .await
            .unwrap_err();
        assert!(matches!(domain_error(err), DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_total_spots_cannot_drop_below_booked() {
        let f = fixture().await;
        let view = f
            .service
            .add_course(new_course(vec![new_date(1, 2, 10)]), "lect-1")
            .await
            .unwrap();
        let date_id = view.dates[0].id.clone();
        f.bookings
            .save_booking(Booking {
                id: "b1".to_string(),
                course: view.id.clone(),
                date: date_id.clone(),
                user: "user-1".to_string(),
                spots: 6,
            })
            .await
            .unwrap();

        let shrink = |spots| CourseDateChange {
            total_spots: Some(spots),
            ..CourseDateChange::default()
        };
        let err = f
            .service
            .update_course_date(&view.id, &date_id, shrink(5), "lect-1")
            .await
            .unwrap_err();
        assert!(matches!(domain_error(err), DomainError::Validation(_)));

        let updated = f
            .service
            .update_course_date(&view.id, &date_id, shrink(6), "lect-1")
            .await
            .unwrap();
        assert_eq!(updated.total_spots, 6);
    }

    #[tokio::test]
    async fn test_replacing_dates_cannot_drop_below_booked() {
        let f = fixture().await;
        let view = f
            .service
            .add_course(new_course(vec![new_date(1, 2, 6)]), "lect-1")
            .await
            .unwrap();
        let date_id = view.dates[0].id.clone();
        f.bookings
            .save_booking(Booking {
                id: "b1".to_string(),
                course: view.id.clone(),
                date: date_id.clone(),
                user: "user-1".to_string(),
                spots: 4,
            })
            .await
            .unwrap();

        let replace = |spots| CourseChange {
            dates: Some(vec![NewCourseDate {
                id: Some(date_id.clone()),
                ..new_date(1, 2, spots)
            }]),
            ..CourseChange::default()
        };
        let err = f
            .service
            .update_course(&view.id, replace(3), "lect-1")
            .await
            .unwrap_err();
        assert!(matches!(domain_error(err), DomainError::Validation(_)));
        assert_eq!(f.service.get_date(&view.id, &date_id).await.unwrap().total_spots, 6);

        let updated = f
            .service
            .update_course(&view.id, replace(4), "lect-1")
            .await
            .unwrap();
        assert_eq!(updated.dates.len(), 1);
        assert_eq!(updated.dates[0].total_spots, 4);
    }

    #[tokio::test]
    async fn test_replacing_dates_rejects_repeated_ids() {
        let f = fixture().await;
        let view = f
            .service
            .add_course(new_course(vec![new_date(1, 2, 10)]), "lect-1")
            .await
            .unwrap();
        let date_id = view.dates[0].id.clone();
        f.bookings
            .save_booking(Booking {
                id: "b1".to_string(),
                course: view.id.clone(),
                date: date_id.clone(),
                user: "user-1".to_string(),
                spots: 8,
            })
            .await
            .unwrap();

        let change = CourseChange {
            dates: Some(vec![
                NewCourseDate {
                    id: Some(date_id.clone()),
                    ..new_date(1, 2, 100)
                },
                NewCourseDate {
                    id: Some(date_id.clone()),
                    ..new_date(3, 4, 5)
                },
            ]),
            ..CourseChange::default()
        };
        let err = f
            .service
            .update_course(&view.id, change, "lect-1")
            .await
            .unwrap_err();
        assert!(matches!(domain_error(err), DomainError::Validation(_)));

        let dates = f.service.list_dates(&view.id).await.unwrap();
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].total_spots, 10);
    }
}
