use crate::gateway::{AttendanceFilter, QueryGateway, SlotFilter};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use presensi_core::{
    AttendanceRecord, AttendanceStatus, CheckIn, CheckInEvent, PresensiError, PresensiResult,
    ScheduleSlot, Student, Teacher,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use tokio::sync::Mutex;

const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M:%S";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS guru (
    kode_guru TEXT PRIMARY KEY,
    nama_guru TEXT NOT NULL,
    nomor_hp  TEXT NOT NULL UNIQUE,
    jabatan   TEXT,
    kelas     TEXT
);
CREATE TABLE IF NOT EXISTS siswa (
    nisn       TEXT PRIMARY KEY,
    nama_siswa TEXT NOT NULL,
    kelas      TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS jadwal (
    idjadwal    INTEGER PRIMARY KEY AUTOINCREMENT,
    kode_guru   TEXT NOT NULL,
    kode_kelas  TEXT NOT NULL,
    kode_mapel  TEXT NOT NULL,
    hari        TEXT NOT NULL,
    jam         INTEGER NOT NULL,
    kode_jadwal TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS setting_jadwal (
    kode_jadwal TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS absensi_siswa (
    nisn      TEXT NOT NULL,
    kelas     TEXT NOT NULL,
    tanggal   TEXT NOT NULL,
    idjadwal  INTEGER NOT NULL,
    jam       INTEGER NOT NULL,
    status    TEXT NOT NULL CHECK (status IN ('h','a','s','i','t')),
    kode_guru TEXT NOT NULL,
    PRIMARY KEY (nisn, idjadwal, tanggal)
);
CREATE TABLE IF NOT EXISTS absensi (
    nomor_hp TEXT NOT NULL,
    tanggal  TEXT NOT NULL,
    waktu    TEXT NOT NULL,
    status   TEXT NOT NULL,
    lat      REAL NOT NULL,
    lon      REAL NOT NULL,
    PRIMARY KEY (nomor_hp, tanggal, status)
);
";

fn gw(e: rusqlite::Error) -> PresensiError {
    PresensiError::Gateway(e.to_string())
}

fn parse_date(text: &str) -> Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(text, DATE_FMT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_status(text: &str) -> Result<AttendanceStatus, rusqlite::Error> {
    text.chars()
        .next()
        .and_then(AttendanceStatus::from_code)
        .ok_or(rusqlite::Error::InvalidQuery)
}

/// [`QueryGateway`] implementation over a SQLite copy of the school schema.
///
/// Table and column names mirror the school's existing database (`guru`,
/// `siswa`, `jadwal`, `setting_jadwal`, `absensi_siswa`, `absensi`).
pub struct SqliteGateway {
    conn: Mutex<Connection>,
}

impl SqliteGateway {
    /// Opens (and initialises, if needed) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> PresensiResult<Self> {
        Self::from_connection(Connection::open(path).map_err(gw)?)
    }

    /// Opens a fresh in-memory database.
    pub fn open_in_memory() -> PresensiResult<Self> {
        Self::from_connection(Connection::open_in_memory().map_err(gw)?)
    }

    fn from_connection(conn: Connection) -> PresensiResult<Self> {
        conn.execute_batch(SCHEMA).map_err(gw)?;
        tracing::debug!("database schema ensured");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    // --- Provisioning helpers (CLI seed command and tests) ---

    pub async fn insert_teacher(&self, teacher: &Teacher) -> PresensiResult<()> {
        let conn = self.conn.lock().await;
        let jabatan = teacher.homeroom_class.as_ref().map(|_| "walikelas");
        conn.execute(
            "INSERT INTO guru (kode_guru, nama_guru, nomor_hp, jabatan, kelas)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                teacher.code,
                teacher.name,
                teacher.phone,
                jabatan,
                teacher.homeroom_class
            ],
        )
        .map_err(gw)?;
        Ok(())
    }

    pub async fn insert_student(&self, student: &Student) -> PresensiResult<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO siswa (nisn, nama_siswa, kelas) VALUES (?1, ?2, ?3)",
            params![student.id, student.name, student.class_id],
        )
        .map_err(gw)?;
        Ok(())
    }

    /// Inserts a schedule slot and returns its generated id.
    pub async fn insert_slot(
        &self,
        teacher_code: &str,
        class_id: &str,
        subject_id: &str,
        day_code: char,
        hour: u8,
        config_id: &str,
    ) -> PresensiResult<i64> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO jadwal (kode_guru, kode_kelas, kode_mapel, hari, jam, kode_jadwal)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                teacher_code,
                class_id,
                subject_id,
                day_code.to_string(),
                hour,
                config_id
            ],
        )
        .map_err(gw)?;
        Ok(conn.last_insert_rowid())
    }

    /// Replaces the active schedule-configuration code.
    pub async fn set_schedule_config(&self, config_id: &str) -> PresensiResult<()> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM setting_jadwal", []).map_err(gw)?;
        conn.execute(
            "INSERT INTO setting_jadwal (kode_jadwal) VALUES (?1)",
            params![config_id],
        )
        .map_err(gw)?;
        Ok(())
    }
}

#[async_trait]
impl QueryGateway for SqliteGateway {
    async fn find_teacher_by_phone(&self, phone: &str) -> PresensiResult<Option<Teacher>> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT kode_guru, nama_guru, nomor_hp, jabatan, kelas
             FROM guru WHERE nomor_hp = ?1",
            params![phone],
            |row| {
                let jabatan: Option<String> = row.get(3)?;
                let kelas: Option<String> = row.get(4)?;
                Ok(Teacher {
                    code: row.get(0)?,
                    name: row.get(1)?,
                    phone: row.get(2)?,
                    homeroom_class: match jabatan.as_deref() {
                        Some("walikelas") => kelas,
                        _ => None,
                    },
                })
            },
        )
        .optional()
        .map_err(gw)
    }

    async fn find_teacher_by_code(&self, code: &str) -> PresensiResult<Option<Teacher>> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT kode_guru, nama_guru, nomor_hp, jabatan, kelas
             FROM guru WHERE kode_guru = ?1",
            params![code],
            |row| {
                let jabatan: Option<String> = row.get(3)?;
                let kelas: Option<String> = row.get(4)?;
                Ok(Teacher {
                    code: row.get(0)?,
                    name: row.get(1)?,
                    phone: row.get(2)?,
                    homeroom_class: match jabatan.as_deref() {
                        Some("walikelas") => kelas,
                        _ => None,
                    },
                })
            },
        )
        .optional()
        .map_err(gw)
    }

    async fn find_schedule_config(&self) -> PresensiResult<Option<String>> {
        let conn = self.conn.lock().await;
        conn.query_row("SELECT kode_jadwal FROM setting_jadwal LIMIT 1", [], |row| {
            row.get(0)
        })
        .optional()
        .map_err(gw)
    }

    async fn find_schedule_slots(&self, filter: &SlotFilter) -> PresensiResult<Vec<ScheduleSlot>> {
        let conn = self.conn.lock().await;

        let mut sql = String::from(
            "SELECT idjadwal, kode_guru, kode_kelas, kode_mapel, hari, jam, kode_jadwal
             FROM jadwal WHERE 1=1",
        );
        let mut values: Vec<Value> = Vec::new();
        if let Some(teacher) = &filter.teacher_code {
            sql.push_str(" AND kode_guru = ?");
            values.push(Value::Text(teacher.clone()));
        }
        if let Some(class) = &filter.class_id {
            sql.push_str(" AND kode_kelas = ?");
            values.push(Value::Text(class.clone()));
        }
        if let Some(subject) = &filter.subject_id {
            sql.push_str(" AND kode_mapel = ?");
            values.push(Value::Text(subject.clone()));
        }
        if let Some(day) = filter.day_code {
            sql.push_str(" AND hari = ?");
            values.push(Value::Text(day.to_string()));
        }
        if let Some(config) = &filter.config_id {
            sql.push_str(" AND kode_jadwal = ?");
            values.push(Value::Text(config.clone()));
        }
        if let Some(hours) = &filter.hours {
            if hours.is_empty() {
                return Ok(Vec::new());
            }
            let marks = vec!["?"; hours.len()].join(",");
            sql.push_str(&format!(" AND jam IN ({marks})"));
            values.extend(hours.iter().map(|h| Value::Integer(i64::from(*h))));
        }
        sql.push_str(" ORDER BY jam, idjadwal");

        let mut stmt = conn.prepare(&sql).map_err(gw)?;
        let rows = stmt
            .query_map(params_from_iter(values), |row| {
                let hari: String = row.get(4)?;
                let jam: i64 = row.get(5)?;
                Ok(ScheduleSlot {
                    id: row.get(0)?,
                    teacher_code: row.get(1)?,
                    class_id: row.get(2)?,
                    subject_id: row.get(3)?,
                    day_code: hari.chars().next().unwrap_or(' '),
                    hour: jam as u8,
                    config_id: row.get(6)?,
                })
            })
            .map_err(gw)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(gw)
    }

    async fn find_students_by_class(&self, class_id: &str) -> PresensiResult<Vec<Student>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(
                "SELECT nisn, nama_siswa, kelas FROM siswa
                 WHERE kelas = ?1 ORDER BY nama_siswa COLLATE NOCASE ASC",
            )
            .map_err(gw)?;
        let rows = stmt
            .query_map(params![class_id], |row| {
                Ok(Student {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    class_id: row.get(2)?,
                })
            })
            .map_err(gw)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(gw)
    }

    async fn find_students_by_ids(&self, ids: &[String]) -> PresensiResult<Vec<Student>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn.lock().await;
        let marks = vec!["?"; ids.len()].join(",");
        let sql =
            format!("SELECT nisn, nama_siswa, kelas FROM siswa WHERE nisn IN ({marks})");
        let mut stmt = conn.prepare(&sql).map_err(gw)?;
        let rows = stmt
            .query_map(
                params_from_iter(ids.iter().map(|id| Value::Text(id.clone()))),
                |row| {
                    Ok(Student {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        class_id: row.get(2)?,
                    })
                },
            )
            .map_err(gw)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(gw)
    }

    async fn upsert_attendance(&self, records: &[AttendanceRecord]) -> PresensiResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction().map_err(gw)?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO absensi_siswa
                         (nisn, kelas, tanggal, idjadwal, jam, status, kode_guru)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT(nisn, idjadwal, tanggal) DO UPDATE SET
                         status = excluded.status,
                         jam = excluded.jam,
                         kode_guru = excluded.kode_guru",
                )
                .map_err(gw)?;
            for record in records {
                stmt.execute(params![
                    record.student_id,
                    record.class_id,
                    record.date.format(DATE_FMT).to_string(),
                    record.slot_id,
                    record.hour,
                    record.status.code().to_string(),
                    record.teacher_code,
                ])
                .map_err(gw)?;
            }
        }
        tx.commit().map_err(gw)
    }

    async fn find_attendance(
        &self,
        filter: &AttendanceFilter,
    ) -> PresensiResult<Vec<AttendanceRecord>> {
        let conn = self.conn.lock().await;

        let mut sql = String::from(
            "SELECT nisn, kelas, tanggal, idjadwal, jam, status, kode_guru
             FROM absensi_siswa WHERE 1=1",
        );
        let mut values: Vec<Value> = Vec::new();
        if let Some(teacher) = &filter.teacher_code {
            sql.push_str(" AND kode_guru = ?");
            values.push(Value::Text(teacher.clone()));
        }
        if let Some(class) = &filter.class_id {
            sql.push_str(" AND kelas = ?");
            values.push(Value::Text(class.clone()));
        }
        if let Some(slot_ids) = &filter.slot_ids {
            if slot_ids.is_empty() {
                return Ok(Vec::new());
            }
            let marks = vec!["?"; slot_ids.len()].join(",");
            sql.push_str(&format!(" AND idjadwal IN ({marks})"));
            values.extend(slot_ids.iter().map(|id| Value::Integer(*id)));
        }
        if let Some(date) = filter.date {
            sql.push_str(" AND tanggal = ?");
            values.push(Value::Text(date.format(DATE_FMT).to_string()));
        }
        sql.push_str(" ORDER BY jam, nisn");

        let mut stmt = conn.prepare(&sql).map_err(gw)?;
        let rows = stmt
            .query_map(params_from_iter(values), |row| {
                let tanggal: String = row.get(2)?;
                let jam: i64 = row.get(4)?;
                let status: String = row.get(5)?;
                Ok(AttendanceRecord {
                    student_id: row.get(0)?,
                    class_id: row.get(1)?,
                    date: parse_date(&tanggal)?,
                    slot_id: row.get(3)?,
                    hour: jam as u8,
                    status: parse_status(&status)?,
                    teacher_code: row.get(6)?,
                })
            })
            .map_err(gw)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(gw)
    }

    async fn find_check_ins(
        &self,
        teacher_phone: &str,
        date: NaiveDate,
    ) -> PresensiResult<Vec<CheckIn>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(
                "SELECT nomor_hp, tanggal, waktu, status, lat, lon
                 FROM absensi WHERE nomor_hp = ?1 AND tanggal = ?2",
            )
            .map_err(gw)?;
        let rows = stmt
            .query_map(
                params![teacher_phone, date.format(DATE_FMT).to_string()],
                |row| {
                    let tanggal: String = row.get(1)?;
                    let waktu: String = row.get(2)?;
                    let status: String = row.get(3)?;
                    let event = match status.as_str() {
                        "Absen Datang" => CheckInEvent::Arrival,
                        "Absen Pulang" => CheckInEvent::Departure,
                        _ => return Err(rusqlite::Error::InvalidQuery),
                    };
                    Ok(CheckIn {
                        teacher_phone: row.get(0)?,
                        date: parse_date(&tanggal)?,
                        time: NaiveTime::parse_from_str(&waktu, TIME_FMT).map_err(|e| {
                            rusqlite::Error::FromSqlConversionFailure(
                                2,
                                rusqlite::types::Type::Text,
                                Box::new(e),
                            )
                        })?,
                        event,
                        latitude: row.get(4)?,
                        longitude: row.get(5)?,
                    })
                },
            )
            .map_err(gw)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(gw)
    }

    async fn insert_check_in(&self, record: &CheckIn) -> PresensiResult<()> {
        let conn = self.conn.lock().await;
        // Check-ins are immutable: a repeat insert for the same (teacher,
        // date, event) keeps the first row.
        conn.execute(
            "INSERT INTO absensi (nomor_hp, tanggal, waktu, status, lat, lon)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(nomor_hp, tanggal, status) DO NOTHING",
            params![
                record.teacher_phone,
                record.date.format(DATE_FMT).to_string(),
                record.time.format(TIME_FMT).to_string(),
                record.event.label(),
                record.latitude,
                record.longitude,
            ],
        )
        .map_err(gw)?;
        Ok(())
    }
}
