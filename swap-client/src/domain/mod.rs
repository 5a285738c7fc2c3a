//! Domain types for the swap-station client.
//!
//! Types here enforce their invariants at construction time, so code that
//! receives them can trust their validity. Server records are tolerant on
//! the wire; validation happens when they are turned into these types.

mod booking;
mod coords;
mod error;
mod role;
mod station;

pub use booking::{Booking, BookingId, BookingState};
pub use coords::Coordinates;
pub use error::DomainError;
pub use role::Role;
pub use station::{
    Capacity, Radius, StationId, StationStatus, StationSummary, filter_stations,
};

#[cfg(test)]
pub(crate) use booking::sample_booking;
#[cfg(test)]
pub(crate) use station::sample_station;
