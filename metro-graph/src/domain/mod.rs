//! Domain types for the metro graph builder.
//!
//! These types enforce their invariants at construction time, so code that
//! receives a `StationName` or `Coordinates` can trust its validity.

mod coordinates;
mod error;
mod station;

pub use coordinates::{Coordinates, InvalidCoordinates};
pub use error::GraphError;
pub use station::{InvalidStationName, StationName, canonicalize};
