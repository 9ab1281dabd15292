//! Core types and error definitions for the Presensi attendance bot.
//!
//! This crate provides the foundational types shared across all Presensi
//! crates: error handling, the inbound/outbound event shapes exchanged with
//! the messaging transport, and the school domain entities.
//!
//! # Main types
//!
//! - [`PresensiError`] — Unified error enum for all Presensi subsystems.
//! - [`PresensiResult`] — Convenience alias for `Result<T, PresensiError>`.
//! - [`InboundMessage`] / [`OutboundMessage`] — Transport-facing events.
//! - [`Teacher`], [`Student`], [`ScheduleSlot`], [`AttendanceRecord`],
//!   [`CheckIn`] — Domain entities backed by the school database.

/// School domain entities and vocabularies.
pub mod domain;
/// Inbound and outbound transport events.
pub mod event;

pub use domain::{
    day_code, day_name, AttendanceRecord, AttendanceStatus, CheckIn, CheckInEvent, ScheduleSlot,
    Student, Teacher,
};
pub use event::{GeoPoint, InboundMessage, OutboundBody, OutboundMessage};

/// Top-level error type for the Presensi workspace.
///
/// Each variant corresponds to a subsystem that can produce errors.
#[derive(Debug, thiserror::Error)]
pub enum PresensiError {
    /// An error from the persistent store (query or write).
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// An error related to conversation session state.
    #[error("Session error: {0}")]
    Session(String),

    /// An error from the messaging channel (send or receive).
    #[error("Channel error: {0}")]
    Channel(String),

    /// An error while rendering an attendance report document.
    #[error("Report error: {0}")]
    Report(String),

    /// An error from the reverse-geocoding service.
    #[error("Geocode error: {0}")]
    Geocode(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`PresensiError`].
pub type PresensiResult<T> = Result<T, PresensiError>;
