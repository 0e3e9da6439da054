pub mod booking;
pub mod error;
pub mod models;
pub mod repository;
pub mod user;
