use crate::domain::booking::{Booking, BookingFilter};
use crate::domain::repository::BookingRepository;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, trace};

#[derive(Clone)]
pub struct InMemoryBookingRepository {
    storage: Arc<RwLock<HashMap<String, Booking>>>,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryBookingRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    #[instrument(skip(self), fields(booking_id = %booking.id, spots = booking.spots))]
    async fn save_booking(&self, booking: Booking) -> Result<()> {
        let mut storage = self.storage.write().await;
        debug!(
            booking_id = %booking.id,
            course_id = %booking.course,
            date_id = %booking.date,
            user_id = %booking.user,
            "Booking saved to memory storage"
        );
        storage.insert(booking.id.clone(), booking);
        Ok(())
    }

    #[instrument(skip(self), fields(booking_id = id))]
    async fn find_booking_by_id(&self, id: &str) -> Result<Option<Booking>> {
        let storage = self.storage.read().await;
        let booking = storage.get(id).cloned();
        if booking.is_none() {
            trace!(booking_id = id, "Booking not found in storage");
        }
        Ok(booking)
    }

    #[instrument(skip(self))]
    async fn find_bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>> {
        let storage = self.storage.read().await;
        let mut bookings: Vec<Booking> = storage
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(bookings)
    }

    #[instrument(skip(self), fields(booking_id = id))]
    async fn delete_booking(&self, id: &str) -> Result<Option<Booking>> {
        let mut storage = self.storage.write().await;
        Ok(storage.remove(id))
    }

    #[instrument(skip(self), fields(course_id = course, date_id = date))]
    async fn booked_spots(&self, course: &str, date: &str) -> Result<u32> {
        let storage = self.storage.read().await;
        let booked: u32 = storage
            .values()
            .filter(|b| b.course == course && b.date == date)
            .map(|b| b.spots)
            .sum();
        trace!(booked = booked, "Summed booked spots");
        Ok(booked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(id: &str, course: &str, date: &str, user: &str, spots: u32) -> Booking {
        Booking {
            id: id.to_string(),
            course: course.to_string(),
            date: date.to_string(),
            user: user.to_string(),
            spots,
        }
    }

    #[tokio::test]
    async fn test_booked_spots_sums_per_course_date() {
        let repo = InMemoryBookingRepository::new();
        repo.save_booking(booking("b1", "c1", "d1", "u1", 3)).await.unwrap();
        repo.save_booking(booking("b2", "c1", "d1", "u2", 2)).await.unwrap();
        repo.save_booking(booking("b3", "c1", "d2", "u1", 4)).await.unwrap();
        repo.save_booking(booking("b4", "c2", "d1", "u1", 7)).await.unwrap();

        assert_eq!(repo.booked_spots("c1", "d1").await.unwrap(), 5);
        assert_eq!(repo.booked_spots("c1", "d2").await.unwrap(), 4);
        assert_eq!(repo.booked_spots("c3", "d1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_find_bookings_by_filter() {
        let repo = InMemoryBookingRepository::new();
        repo.save_booking(booking("b1", "c1", "d1", "u1", 1)).await.unwrap();
        repo.save_booking(booking("b2", "c1", "d1", "u2", 1)).await.unwrap();
        repo.save_booking(booking("b3", "c2", "d9", "u1", 1)).await.unwrap();

        let for_date = repo
            .find_bookings(&BookingFilter::for_date("c1", "d1"))
            .await
            .unwrap();
        assert_eq!(for_date.len(), 2);

        let mine = repo
            .find_bookings(&BookingFilter::for_date("c1", "d1").with_user("u1"))
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, "b1");

        let all_of_user = repo.find_bookings(&BookingFilter::for_user("u1")).await.unwrap();
        let ids: Vec<&str> = all_of_user.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b1", "b3"]);
    }

    #[tokio::test]
    async fn test_delete_booking() {
        let repo = InMemoryBookingRepository::new();
        repo.save_booking(booking("b1", "c1", "d1", "u1", 2)).await.unwrap();

        let removed = repo.delete_booking("b1").await.unwrap().unwrap();
        assert_eq!(removed.spots, 2);
        assert!(repo.find_booking_by_id("b1").await.unwrap().is_none());
        assert_eq!(repo.booked_spots("c1", "d1").await.unwrap(), 0);
    }
}
