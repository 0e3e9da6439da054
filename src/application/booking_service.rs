use crate::application::course_service::CapacityLock;
use crate::domain::booking::{Booking, BookingFilter};
use crate::domain::error::DomainError;
use crate::domain::models::Course;
use crate::domain::repository::{BookingRepository, CourseRepository};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

pub struct BookingService<B: BookingRepository, C: CourseRepository> {
    booking_repository: Arc<B>,
    course_repository: Arc<C>,
    capacity: CapacityLock,
}

impl<B: BookingRepository, C: CourseRepository> BookingService<B, C> {
    pub fn new(booking_repository: Arc<B>, course_repository: Arc<C>, capacity: CapacityLock) -> Self {
        Self {
            booking_repository,
            course_repository,
            capacity,
        }
    }

    async fn course(&self, course_id: &str) -> Result<Course> {
        self.course_repository
            .find_course_by_id(course_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Course {} not found", course_id)).into())
    }

    fn total_spots(&self, course: &Course, date_id: &str) -> Result<u32> {
        course
            .date(date_id)
            .map(|d| d.total_spots)
            .ok_or_else(|| {
                DomainError::NotFound(format!("Date {} of course {} not found", date_id, course.id))
                    .into()
            })
    }

    /// Spots still open at a date, i.e. `totalSpots` minus everything booked.
    async fn available_spots(&self, course: &Course, date_id: &str) -> Result<u32> {
        let total = self.total_spots(course, date_id)?;
        let booked = self.booking_repository.booked_spots(&course.id, date_id).await?;
        Ok(total.saturating_sub(booked))
    }

    /// Loads a booking addressed through its course and date and checks that
    /// the caller owns it or lectures the course.
    async fn accessible_booking(
        &self,
        course_id: &str,
        date_id: &str,
        booking_id: &str,
        caller_id: &str,
    ) -> Result<Booking> {
        let booking = self
            .booking_repository
            .find_booking_by_id(booking_id)
            .await?
            .filter(|b| b.course == course_id && b.date == date_id)
            .ok_or_else(|| DomainError::NotFound(format!("Booking {} not found", booking_id)))?;

        if booking.user == caller_id {
            return Ok(booking);
        }
        let lectures_course = self
            .course_repository
            .find_course_by_id(course_id)
            .await?
            .is_some_and(|c| c.is_owned_by(caller_id));
        if !lectures_course {
            warn!(booking_id = booking_id, caller = caller_id, "Caller may not access booking");
            return Err(DomainError::Forbidden(format!(
                "Booking {} belongs to another user",
                booking_id
            ))
            .into());
        }
        Ok(booking)
    }

    #[instrument(skip(self))]
    pub async fn book_spots(
        &self,
        course_id: &str,
        date_id: &str,
        user_id: &str,
        spots: u32,
    ) -> Result<Booking> {
        if spots == 0 {
            return Err(DomainError::Validation("spots must be at least 1".to_string()).into());
        }

        let _guard = self.capacity.lock().await;
        let course = self.course(course_id).await?;
        let available = self.available_spots(&course, date_id).await?;
        if spots > available {
            warn!(requested = spots, available = available, "Not enough open spots");
            return Err(DomainError::NoOpenSpots {
                requested: spots,
                available,
            }
            .into());
        }

        let booking = Booking {
            id: Uuid::new_v4().to_string(),
            course: course_id.to_string(),
            date: date_id.to_string(),
            user: user_id.to_string(),
            spots,
        };
        self.booking_repository.save_booking(booking.clone()).await?;

        info!(booking_id = %booking.id, spots = spots, remaining = available - spots, "Spots booked");
        Ok(booking)
    }

    /// Bookings of one date. The course's lecturer sees all of them, anyone
    /// else only their own.
    #[instrument(skip(self))]
    pub async fn list_bookings(
        &self,
        course_id: &str,
        date_id: &str,
        caller_id: &str,
    ) -> Result<Vec<Booking>> {
        let course = self.course(course_id).await?;
        self.total_spots(&course, date_id)?;

        let filter = BookingFilter::for_date(course_id, date_id);
        let filter = if course.is_owned_by(caller_id) {
            filter
        } else {
            filter.with_user(caller_id)
        };
        let bookings = self.booking_repository.find_bookings(&filter).await?;
        debug!(count = bookings.len(), "Listed bookings");
        Ok(bookings)
    }

    #[instrument(skip(self))]
    pub async fn get_booking(
        &self,
        course_id: &str,
        date_id: &str,
        booking_id: &str,
        caller_id: &str,
    ) -> Result<Booking> {
        self.accessible_booking(course_id, date_id, booking_id, caller_id)
            .await
    }

    /// Changes the spot count. Growing a booking needs the extra spots to be
    /// open; shrinking always succeeds.
    #[instrument(skip(self))]
    pub async fn update_booking(
        &self,
        course_id: &str,
        date_id: &str,
        booking_id: &str,
        caller_id: &str,
        spots: u32,
    ) -> Result<Booking> {
        if spots == 0 {
            return Err(DomainError::Validation("spots must be at least 1".to_string()).into());
        }

        let _guard = self.capacity.lock().await;
        let mut booking = self
            .accessible_booking(course_id, date_id, booking_id, caller_id)
            .await?;

        if spots > booking.spots {
            let delta = spots - booking.spots;
            let course = self.course(course_id).await?;
            let available = self.available_spots(&course, date_id).await?;
            if delta > available {
                warn!(requested = delta, available = available, "Not enough open spots");
                return Err(DomainError::NoOpenSpots {
                    requested: delta,
                    available,
                }
                .into());
            }
        }

        let previous = booking.spots;
        booking.spots = spots;
        self.booking_repository.save_booking(booking.clone()).await?;
        info!(booking_id = booking_id, from = previous, to = spots, "Booking updated");
        Ok(booking)
    }

    #[instrument(skip(self))]
    pub async fn delete_booking(
        &self,
        course_id: &str,
        date_id: &str,
        booking_id: &str,
        caller_id: &str,
    ) -> Result<Booking> {
        let _guard = self.capacity.lock().await;
        self.accessible_booking(course_id, date_id, booking_id, caller_id)
            .await?;
        let removed = self
            .booking_repository
            .delete_booking(booking_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Booking {} not found", booking_id)))?;
        info!(booking_id = booking_id, spots = removed.spots, "Booking deleted");
        Ok(removed)
    }

    #[instrument(skip(self))]
    pub async fn user_bookings(&self, user_id: &str) -> Result<Vec<Booking>> {
        self.booking_repository
            .find_bookings(&BookingFilter::for_user(user_id))
            .await
    }

    pub async fn booked_spots(&self, course_id: &str, date_id: &str) -> Result<u32> {
        self.booking_repository.booked_spots(course_id, date_id).await
    }
}
