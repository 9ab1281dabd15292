use async_trait::async_trait;
use chrono::NaiveDate;
use presensi_core::{AttendanceRecord, CheckIn, PresensiResult, ScheduleSlot, Student, Teacher};

/// Filter for schedule-slot lookups. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct SlotFilter {
    pub teacher_code: Option<String>,
    pub class_id: Option<String>,
    pub subject_id: Option<String>,
    pub day_code: Option<char>,
    pub config_id: Option<String>,
    pub hours: Option<Vec<u8>>,
}

/// Filter for attendance-record lookups. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct AttendanceFilter {
    pub teacher_code: Option<String>,
    pub class_id: Option<String>,
    pub slot_ids: Option<Vec<i64>>,
    pub date: Option<NaiveDate>,
}

/// Abstracts the relational store behind the dialogue engine.
///
/// Every operation may fail; the engine never assumes a write landed without
/// a confirming `Ok`. A multi-row `upsert_attendance` is applied atomically:
/// either every record lands or none does.
#[async_trait]
pub trait QueryGateway: Send + Sync {
    /// Looks up a teacher by phone number.
    async fn find_teacher_by_phone(&self, phone: &str) -> PresensiResult<Option<Teacher>>;

    /// Looks up a teacher by school code.
    async fn find_teacher_by_code(&self, code: &str) -> PresensiResult<Option<Teacher>>;

    /// The active schedule-configuration code, if one is set.
    async fn find_schedule_config(&self) -> PresensiResult<Option<String>>;

    /// Schedule slots matching the filter, ordered by hour.
    async fn find_schedule_slots(&self, filter: &SlotFilter) -> PresensiResult<Vec<ScheduleSlot>>;

    /// The roster of a class, sorted alphabetically by student name.
    async fn find_students_by_class(&self, class_id: &str) -> PresensiResult<Vec<Student>>;

    /// Students for the given ids, in no particular order.
    async fn find_students_by_ids(&self, ids: &[String]) -> PresensiResult<Vec<Student>>;

    /// Inserts or updates attendance records, keyed by
    /// (student, slot, date). Idempotent per key; atomic across the batch.
    async fn upsert_attendance(&self, records: &[AttendanceRecord]) -> PresensiResult<()>;

    /// Attendance records matching the filter.
    async fn find_attendance(
        &self,
        filter: &AttendanceFilter,
    ) -> PresensiResult<Vec<AttendanceRecord>>;

    /// A teacher's check-in events for one day.
    async fn find_check_ins(
        &self,
        teacher_phone: &str,
        date: NaiveDate,
    ) -> PresensiResult<Vec<CheckIn>>;

    /// Records a check-in event. At most one per (teacher, date, event
    /// type); a repeat insert leaves the existing row untouched.
    async fn insert_check_in(&self, record: &CheckIn) -> PresensiResult<()>;
}
