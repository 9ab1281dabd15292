//! Per-participant conversation state for the Presensi dialogue engine.
//!
//! # Main types
//!
//! - [`Stage`] — Tagged union of dialogue stages; each variant carries only
//!   the fields that stage owns, so stale fields from a previous stage are
//!   unrepresentable.
//! - [`SessionStore`] — In-memory map keyed by participant id with per-id
//!   atomic updates and whole-event exclusivity.

pub mod state;
pub mod store;

pub use state::{
    BackTarget, ClassOption, SlotHour, Stage, SummaryOption, UnmarkedGroup, UnmarkedTeacher,
};
pub use store::SessionStore;
