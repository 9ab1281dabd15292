//! Menu #3: class attendance with default-present marking and corrections.

use crate::error::{FlowError, FlowResult};
use crate::menu::{join_hours, parse_index, MSG_INVALID_CHOICE};
use crate::router::Engine;
use chrono::NaiveDate;
use presensi_core::{AttendanceRecord, AttendanceStatus, OutboundMessage, Student};
use presensi_session::{ClassOption, SlotHour, Stage};
use presensi_store::SlotFilter;

const MSG_NO_STUDENTS: &str = "Tidak ada siswa yang ditemukan di kelas ini.";

const MSG_CORRECTION_FORMAT: &str = "Format tidak valid. Silakan coba lagi dengan format: \
nomor urut#status sesuai jam.\nContoh: 1#sss (a:alpha, s:sakit, i:izin, t:terlambat)";

impl Engine {
    /// Lists today's (class, subject) options for the requesting teacher
    /// and moves to class selection.
    pub(crate) async fn prompt_class_selection(
        &self,
        participant: &str,
        stage: &mut Option<Stage>,
    ) -> FlowResult<Vec<OutboundMessage>> {
        let teacher = self.require_teacher(participant).await?;
        let config = self.require_config().await?;
        let (_, code, name) = self.today_context();

        let slots = self
            .gateway
            .find_schedule_slots(&SlotFilter {
                teacher_code: Some(teacher.code.clone()),
                day_code: Some(code),
                config_id: Some(config.clone()),
                ..SlotFilter::default()
            })
            .await?;

        if slots.is_empty() {
            return Ok(vec![OutboundMessage::text(
                participant,
                format!("Tidak ada kelas yang diampu pada hari {name}."),
            )]);
        }

        // Hour order from the gateway makes first-seen grouping stable.
        let mut options: Vec<ClassOption> = Vec::new();
        for slot in &slots {
            match options
                .iter_mut()
                .find(|o| o.class_id == slot.class_id && o.subject_id == slot.subject_id)
            {
                Some(option) => option.hours.push(slot.hour),
                None => options.push(ClassOption {
                    class_id: slot.class_id.clone(),
                    subject_id: slot.subject_id.clone(),
                    hours: vec![slot.hour],
                }),
            }
        }

        let mut text = format!("Jadwal Anda hari ini ({name}) dengan kode jadwal {config}:\n\n");
        for (index, option) in options.iter().enumerate() {
            text.push_str(&format!(
                "{}. Mapel: {}, Kelas: {}, Jam: {}\n",
                index + 1,
                option.subject_id,
                option.class_id,
                join_hours(&option.hours)
            ));
        }
        text.push_str(
            "\nSilakan kirim nomor kelas yang akan diabsen:\n\
Atau kirim nomor#jam untuk mengabsen jam tertentu saja. Contoh: 1#jam",
        );

        *stage = Some(Stage::AwaitingClassSelection { options });
        Ok(vec![OutboundMessage::text(participant, text)])
    }

    /// Confirms a class option: marks every (student, hour) pair present
    /// and opens the correction intake.
    pub(crate) async fn handle_class_selection(
        &self,
        participant: &str,
        input: &str,
        options: &[ClassOption],
        stage: &mut Option<Stage>,
    ) -> FlowResult<Vec<OutboundMessage>> {
        // `<index>#jam` narrows the attendance to an hour range instead of
        // the whole teaching day.
        if let Some((index_str, rest)) = input.split_once('#') {
            if rest.trim() == "jam" {
                let index = parse_index(index_str, options.len())
                    .ok_or_else(|| FlowError::InvalidSelection(MSG_INVALID_CHOICE.to_string()))?;
                let class_id = options[index].class_id.clone();
                let reply = format!(
                    "Silakan kirim rentang jam yang akan diabsen untuk kelas {class_id}. Contoh: 3-4"
                );
                *stage = Some(Stage::AwaitingHourSelection { class_id });
                return Ok(vec![OutboundMessage::text(participant, reply)]);
            }
        }

        let index = parse_index(input, options.len())
            .ok_or_else(|| FlowError::InvalidSelection(MSG_INVALID_CHOICE.to_string()))?;
        let selected = &options[index];

        let teacher = self.require_teacher(participant).await?;
        let config = self.require_config().await?;
        let (today, code, name) = self.today_context();

        let slots = self
            .gateway
            .find_schedule_slots(&SlotFilter {
                teacher_code: Some(teacher.code.clone()),
                class_id: Some(selected.class_id.clone()),
                subject_id: Some(selected.subject_id.clone()),
                day_code: Some(code),
                config_id: Some(config),
                ..SlotFilter::default()
            })
            .await?;
        if slots.is_empty() {
            return Err(FlowError::EntityNotFound(format!(
                "Tidak ada jadwal yang ditemukan untuk kelas {} pada hari {name}.",
                selected.class_id
            )));
        }
        let hours: Vec<SlotHour> = slots
            .iter()
            .map(|s| SlotHour {
                slot_id: s.id,
                hour: s.hour,
            })
            .collect();

        let roster = self
            .gateway
            .find_students_by_class(&selected.class_id)
            .await?;
        if roster.is_empty() {
            return Err(FlowError::EntityNotFound(MSG_NO_STUDENTS.to_string()));
        }

        let records =
            default_present_records(&roster, &hours, today, &teacher.code, &selected.class_id);
        self.gateway.upsert_attendance(&records).await?;

        let replies = vec![
            OutboundMessage::text(
                participant,
                format!(
                    "Absensi kelas {} telah disimpan. Semua siswa diabsen dengan status hadir (h).",
                    selected.class_id
                ),
            ),
            OutboundMessage::text(participant, correction_prompt(&roster)),
        ];

        *stage = Some(Stage::AwaitingAttendanceInput {
            class_id: selected.class_id.clone(),
            teacher_code: teacher.code,
            hours,
            roster,
        });
        Ok(replies)
    }

    /// Applies `<index>#<statuschars>` correction lines, one reply per line,
    /// in the order they were received. Malformed lines are reported and
    /// skipped without blocking the rest of the batch. The stage persists
    /// until an explicit command leaves it.
    pub(crate) async fn handle_corrections(
        &self,
        participant: &str,
        input: &str,
        class_id: &str,
        teacher_code: &str,
        hours: &[SlotHour],
        roster: &[Student],
    ) -> FlowResult<Vec<OutboundMessage>> {
        let today = self.clock.today();
        let mut replies = Vec::new();

        for line in input.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let Some((index_str, status_str)) = line.split_once('#') else {
                replies.push(OutboundMessage::text(participant, MSG_CORRECTION_FORMAT));
                continue;
            };

            let Some(index) = parse_index(index_str, roster.len()) else {
                replies.push(OutboundMessage::text(
                    participant,
                    format!(
                        "Nomor urut siswa {} tidak valid. Silakan coba lagi.",
                        index_str.trim()
                    ),
                ));
                continue;
            };
            let student = &roster[index];

            let statuses: Vec<AttendanceStatus> = match parse_statuses(status_str) {
                Some(statuses) => statuses,
                None => {
                    replies.push(OutboundMessage::text(participant, MSG_CORRECTION_FORMAT));
                    continue;
                }
            };
            if statuses.len() != hours.len() {
                replies.push(OutboundMessage::text(
                    participant,
                    format!(
                        "Jumlah status untuk siswa {} tidak sesuai dengan jumlah jam pelajaran ({}). Silakan coba lagi.",
                        student.name,
                        hours.len()
                    ),
                ));
                continue;
            }

            let records: Vec<AttendanceRecord> = hours
                .iter()
                .zip(&statuses)
                .map(|(slot_hour, status)| AttendanceRecord {
                    student_id: student.id.clone(),
                    slot_id: slot_hour.slot_id,
                    date: today,
                    hour: slot_hour.hour,
                    status: *status,
                    teacher_code: teacher_code.to_string(),
                    class_id: class_id.to_string(),
                })
                .collect();

            if let Err(err) = self.gateway.upsert_attendance(&records).await {
                tracing::error!(participant = %participant, error = %err, "correction upsert failed");
                replies.push(OutboundMessage::text(
                    participant,
                    format!(
                        "Terjadi kesalahan saat memperbarui data absensi untuk siswa {}.",
                        student.name
                    ),
                ));
                continue;
            }

            replies.push(OutboundMessage::text(
                participant,
                format!("Status absensi untuk {} telah diperbarui.", student.name),
            ));
        }

        replies.push(OutboundMessage::text(
            participant,
            "Semua status absensi yang dimasukkan telah diperbarui. Ketik #back atau #home \
untuk kembali. Atau anda bisa melanjutkan absensi kembali",
        ));

        Ok(replies)
    }

    /// Resolves a `lo-hi` hour range for the stored class and opens the
    /// correction intake restricted to those hours.
    pub(crate) async fn handle_hour_selection(
        &self,
        participant: &str,
        input: &str,
        class_id: &str,
        stage: &mut Option<Stage>,
    ) -> FlowResult<Vec<OutboundMessage>> {
        let range = parse_hour_range(input).ok_or_else(|| {
            FlowError::InvalidSelection("Pilihan jam tidak valid. Silakan coba lagi.".to_string())
        })?;

        let teacher = self.require_teacher(participant).await?;
        let config = self.require_config().await?;
        let (today, code, _) = self.today_context();

        let slots = self
            .gateway
            .find_schedule_slots(&SlotFilter {
                teacher_code: Some(teacher.code.clone()),
                class_id: Some(class_id.to_string()),
                day_code: Some(code),
                config_id: Some(config),
                hours: Some(range),
                ..SlotFilter::default()
            })
            .await?;
        if slots.is_empty() {
            return Err(FlowError::EntityNotFound(
                "Tidak ada jadwal yang ditemukan untuk hari ini.".to_string(),
            ));
        }
        let hours: Vec<SlotHour> = slots
            .iter()
            .map(|s| SlotHour {
                slot_id: s.id,
                hour: s.hour,
            })
            .collect();

        let roster = self.gateway.find_students_by_class(class_id).await?;
        if roster.is_empty() {
            return Err(FlowError::EntityNotFound(MSG_NO_STUDENTS.to_string()));
        }

        let records = default_present_records(&roster, &hours, today, &teacher.code, class_id);
        self.gateway.upsert_attendance(&records).await?;

        let replies = vec![
            OutboundMessage::text(
                participant,
                format!(
                    "Absensi kelas {class_id} telah disimpan. Semua siswa diabsen dengan status hadir (h)."
                ),
            ),
            OutboundMessage::text(participant, correction_prompt(&roster)),
        ];

        *stage = Some(Stage::AwaitingAttendanceInput {
            class_id: class_id.to_string(),
            teacher_code: teacher.code,
            hours,
            roster,
        });
        Ok(replies)
    }
}

/// One present record per (student, slot hour) pair.
pub(crate) fn default_present_records(
    roster: &[Student],
    hours: &[SlotHour],
    date: NaiveDate,
    teacher_code: &str,
    class_id: &str,
) -> Vec<AttendanceRecord> {
    roster
        .iter()
        .flat_map(|student| {
            hours.iter().map(move |slot_hour| AttendanceRecord {
                student_id: student.id.clone(),
                slot_id: slot_hour.slot_id,
                date,
                hour: slot_hour.hour,
                status: AttendanceStatus::Present,
                teacher_code: teacher_code.to_string(),
                class_id: class_id.to_string(),
            })
        })
        .collect()
}

pub(crate) fn correction_prompt(roster: &[Student]) -> String {
    let mut text = String::from(
        "Silakan kirim nomor urut siswa yang tidak hadir dengan format: nomor urut#status \
sesuai jam.\nContoh: 1#sss (a:alpha, s:sakit, i:izin, t:terlambat)\n\nDaftar siswa:\n",
    );
    for (index, student) in roster.iter().enumerate() {
        text.push_str(&format!("{}. {}\n", index + 1, student.name));
    }
    text
}

fn parse_statuses(status_str: &str) -> Option<Vec<AttendanceStatus>> {
    let statuses: Vec<AttendanceStatus> = status_str
        .trim()
        .chars()
        .map(AttendanceStatus::from_code)
        .collect::<Option<Vec<_>>>()?;
    if statuses.is_empty() {
        None
    } else {
        Some(statuses)
    }
}

/// Parses `lo-hi` into the inclusive list of hours.
fn parse_hour_range(input: &str) -> Option<Vec<u8>> {
    let (lo, hi) = input.split_once('-')?;
    let lo: u8 = lo.trim().parse().ok()?;
    let hi: u8 = hi.trim().parse().ok()?;
    if lo > hi {
        return None;
    }
    Some((lo..=hi).collect())
}
