//! Dialogue engine for the Presensi attendance bot.
//!
//! Routes inbound messages to workflow handlers based on each participant's
//! dialogue stage. Handlers read and write through the query gateway, mutate
//! the session stage and return the outbound replies. Events for the same
//! participant are processed strictly one at a time.
//!
//! # Main types
//!
//! - [`Engine`] — The dialogue router; one instance serves all participants.
//! - [`FlowError`] — Handler failures, each carrying its user-facing reply.
//! - [`Clock`] — Time source seam, swapped for a fixed clock in tests.
//! - [`Geocoder`] — Reverse-geocoding seam used by the check-in flow.

pub mod clock;
pub mod error;
pub mod geo;
pub mod router;

mod attendance;
mod checkin;
mod coverage;
mod menu;
mod schedule;
mod summary;

pub use clock::{Clock, SystemClock};
pub use error::{FlowError, FlowResult};
pub use geo::{haversine_distance_m, CheckInConfig, Geocoder, NominatimGeocoder};
pub use router::Engine;
