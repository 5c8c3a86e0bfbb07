//! Domain error types.
//!
//! These errors represent validation failures in the domain layer. They are
//! distinct from corpus, HTTP and geometry errors.

use super::ClockTime;

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Itinerary has no steps
    #[error("itinerary must have at least one step")]
    EmptyItinerary,

    /// Arrival clock earlier than departure clock
    #[error("itinerary arrives at {arrival} before it departs at {departure}")]
    ArrivalBeforeDeparture {
        departure: ClockTime,
        arrival: ClockTime,
    },
}
