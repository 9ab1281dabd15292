use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// A teacher, identified by the school code (`kode_guru`) and reachable at a
/// phone number. `homeroom_class` is set for homeroom teachers (walikelas).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
    pub code: String,
    pub name: String,
    pub phone: String,
    pub homeroom_class: Option<String>,
}

impl Teacher {
    /// Whether this teacher holds the homeroom (walikelas) role.
    pub fn is_homeroom(&self) -> bool {
        self.homeroom_class.is_some()
    }
}

/// A student, identified by the national student number (`nisn`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub class_id: String,
}

/// One scheduled teaching unit: (teacher, class, subject, day, hour) under a
/// schedule configuration. Read-only reference data; never mutated here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSlot {
    pub id: i64,
    pub teacher_code: String,
    pub class_id: String,
    pub subject_id: String,
    pub day_code: char,
    pub hour: u8,
    pub config_id: String,
}

/// Per-hour attendance status, stored as a single character in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    /// hadir
    Present,
    /// alpha/bolos
    Absent,
    /// sakit
    Sick,
    /// izin
    Excused,
    /// terlambat
    Late,
}

impl AttendanceStatus {
    /// The single-character database code (`h`, `a`, `s`, `i`, `t`).
    pub fn code(self) -> char {
        match self {
            Self::Present => 'h',
            Self::Absent => 'a',
            Self::Sick => 's',
            Self::Excused => 'i',
            Self::Late => 't',
        }
    }

    /// Parses a status character; `None` for anything outside the vocabulary.
    pub fn from_code(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'h' => Some(Self::Present),
            'a' => Some(Self::Absent),
            's' => Some(Self::Sick),
            'i' => Some(Self::Excused),
            't' => Some(Self::Late),
            _ => None,
        }
    }
}

/// One attendance row, keyed by (student, schedule slot, date).
///
/// Created with status `h` for every (student × scheduled hour) pair when a
/// class attendance flow is confirmed, then corrected in place. Rows are
/// upserted, never duplicated and never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub student_id: String,
    pub slot_id: i64,
    pub date: NaiveDate,
    pub hour: u8,
    pub status: AttendanceStatus,
    pub teacher_code: String,
    pub class_id: String,
}

/// The kind of teacher check-in event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckInEvent {
    Arrival,
    Departure,
}

impl CheckInEvent {
    /// The label stored in the database and echoed to the user.
    pub fn label(self) -> &'static str {
        match self {
            Self::Arrival => "Absen Datang",
            Self::Departure => "Absen Pulang",
        }
    }
}

/// A teacher location check-in. At most one per (teacher, date, event type);
/// immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckIn {
    pub teacher_phone: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub event: CheckInEvent,
    pub latitude: f64,
    pub longitude: f64,
}

/// Maps a weekday to the single-letter day code used by the schedule table
/// (Sunday = `H`, Monday = `A` .. Saturday = `F`).
pub fn day_code(weekday: Weekday) -> char {
    match weekday {
        Weekday::Sun => 'H',
        Weekday::Mon => 'A',
        Weekday::Tue => 'B',
        Weekday::Wed => 'C',
        Weekday::Thu => 'D',
        Weekday::Fri => 'E',
        Weekday::Sat => 'F',
    }
}

/// The Indonesian day name used in user-facing messages.
pub fn day_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sun => "Minggu",
        Weekday::Mon => "Senin",
        Weekday::Tue => "Selasa",
        Weekday::Wed => "Rabu",
        Weekday::Thu => "Kamis",
        Weekday::Fri => "Jumat",
        Weekday::Sat => "Sabtu",
    }
}
