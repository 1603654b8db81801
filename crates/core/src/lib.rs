//! Core business logic for evote-rs.
//!
//! The interesting part lives in [`services::vote`] and [`services::payment`]:
//! recording a vote together with its tally update, and turning a verified
//! mobile-money charge into exactly one vote and one payment.

pub mod services;

pub use services::*;
