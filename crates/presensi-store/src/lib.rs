//! Persistent-store access for the Presensi attendance bot.
//!
//! # Main types
//!
//! - [`QueryGateway`] — Async trait over the school database: schedule,
//!   teacher and roster lookups plus attendance upserts and check-ins.
//!   Multi-row writes are never partially applied.
//! - [`SqliteGateway`] — `rusqlite`-backed implementation against the school
//!   schema (`guru`, `siswa`, `jadwal`, `setting_jadwal`, `absensi_siswa`,
//!   `absensi`).

pub mod gateway;
pub mod sqlite;

pub use gateway::{AttendanceFilter, QueryGateway, SlotFilter};
pub use sqlite::SqliteGateway;
