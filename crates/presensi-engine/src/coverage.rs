//! Menu #5: homeroom coverage check over today's class schedule.

use crate::attendance::default_present_records;
use crate::error::{FlowError, FlowResult};
use crate::menu::{join_hours, parse_index};
use crate::router::Engine;
use chrono::NaiveDate;
use presensi_core::{AttendanceRecord, AttendanceStatus, OutboundMessage, Student};
use presensi_report::ReportRow;
use presensi_session::{SlotHour, Stage, UnmarkedGroup, UnmarkedTeacher};
use presensi_store::{AttendanceFilter, SlotFilter};
use std::collections::HashSet;

const REPORT_HOUR_COUNT: usize = 9;

const MSG_NO_STUDENTS: &str = "Tidak ada siswa yang ditemukan di kelas ini.";

impl Engine {
    /// Checks which teachers have not marked attendance in the homeroom
    /// class today. When everyone has, the full-day report is attached.
    pub(crate) async fn start_coverage_check(
        &self,
        participant: &str,
        stage: &mut Option<Stage>,
    ) -> FlowResult<Vec<OutboundMessage>> {
        let teacher = self.require_teacher(participant).await?;
        let Some(class_id) = teacher.homeroom_class.clone() else {
            return Err(FlowError::RoleViolation(
                "Menu ini hanya tersedia untuk wali kelas.".to_string(),
            ));
        };

        let config = self.require_config().await?;
        let (today, code, _) = self.today_context();

        let slots = self
            .gateway
            .find_schedule_slots(&SlotFilter {
                class_id: Some(class_id.clone()),
                day_code: Some(code),
                config_id: Some(config),
                ..SlotFilter::default()
            })
            .await?;
        if slots.is_empty() {
            return Ok(vec![OutboundMessage::text(
                participant,
                "Tidak ada jadwal yang ditemukan untuk hari ini.",
            )]);
        }

        let records = self
            .gateway
            .find_attendance(&AttendanceFilter {
                slot_ids: Some(slots.iter().map(|s| s.id).collect()),
                date: Some(today),
                ..AttendanceFilter::default()
            })
            .await?;
        let marked: HashSet<i64> = records.iter().map(|r| r.slot_id).collect();

        let unmarked_slots: Vec<_> = slots.iter().filter(|s| !marked.contains(&s.id)).collect();
        if unmarked_slots.is_empty() {
            let mut replies = vec![OutboundMessage::text(
                participant,
                format!(
                    "Semua guru telah mengisi absensi di kelas {class_id} pada tanggal {today}."
                ),
            )];
            replies.push(self.build_report(participant, &class_id, today).await?);
            *stage = None;
            return Ok(replies);
        }

        // Group unmarked slots per teacher, then per subject, in hour order.
        let mut unmarked: Vec<(String, UnmarkedTeacher)> = Vec::new();
        for slot in &unmarked_slots {
            let position = match unmarked
                .iter()
                .position(|(code, _)| *code == slot.teacher_code)
            {
                Some(position) => position,
                None => {
                    let name = self
                        .gateway
                        .find_teacher_by_code(&slot.teacher_code)
                        .await?
                        .map_or_else(|| slot.teacher_code.clone(), |t| t.name);
                    unmarked.push((
                        slot.teacher_code.clone(),
                        UnmarkedTeacher {
                            name,
                            groups: Vec::new(),
                        },
                    ));
                    unmarked.len() - 1
                }
            };
            let entry = &mut unmarked[position].1;
            let slot_hour = SlotHour {
                slot_id: slot.id,
                hour: slot.hour,
            };
            match entry
                .groups
                .iter_mut()
                .find(|g| g.subject_id == slot.subject_id)
            {
                Some(group) => group.hours.push(slot_hour),
                None => entry.groups.push(UnmarkedGroup {
                    subject_id: slot.subject_id.clone(),
                    hours: vec![slot_hour],
                }),
            }
        }
        let unmarked: Vec<UnmarkedTeacher> = unmarked.into_iter().map(|(_, t)| t).collect();

        let mut listing = String::new();
        for (index, entry) in unmarked.iter().enumerate() {
            let details = entry
                .groups
                .iter()
                .map(|g| {
                    let hours: Vec<u8> = g.hours.iter().map(|h| h.hour).collect();
                    format!("Mapel: {}, Jam: ({})", g.subject_id, join_hours(&hours))
                })
                .collect::<Vec<_>>()
                .join(" - ");
            listing.push_str(&format!("{}. {} - {details}\n", index + 1, entry.name));
        }

        let text = format!(
            "Guru yang belum absen di kelas {class_id} pada tanggal {today}:\n{listing}\n\n\
Silakan pilih nomor guru untuk melihat detail absensi siswa."
        );

        *stage = Some(Stage::AwaitingTeacherSelection {
            class_id,
            teacher_code: teacher.code,
            unmarked,
        });
        Ok(vec![OutboundMessage::text(participant, text)])
    }

    /// Marks every student present for a selected teacher's unmarked slots
    /// and opens the per-student correction intake.
    pub(crate) async fn handle_teacher_selection(
        &self,
        participant: &str,
        input: &str,
        class_id: &str,
        teacher_code: &str,
        unmarked: &[UnmarkedTeacher],
        stage: &mut Option<Stage>,
    ) -> FlowResult<Vec<OutboundMessage>> {
        let index = parse_index(input, unmarked.len()).ok_or_else(|| {
            FlowError::InvalidSelection("Nomor guru tidak valid. Silakan coba lagi.".to_string())
        })?;
        let selected = &unmarked[index];

        let roster = self.gateway.find_students_by_class(class_id).await?;
        if roster.is_empty() {
            return Err(FlowError::EntityNotFound(MSG_NO_STUDENTS.to_string()));
        }

        let hours = selected.slot_hours();
        let today = self.clock.today();
        let records = default_present_records(&roster, &hours, today, teacher_code, class_id);
        self.gateway.upsert_attendance(&records).await?;

        let mut text = format!("Absensi siswa yang diajar oleh {}:\n", selected.name);
        for (i, student) in roster.iter().enumerate() {
            text.push_str(&format!("{}. {}\n", i + 1, student.name));
        }
        text.push_str(
            "\nSilakan kirim nomor urut siswa yang tidak hadir dengan format: nomor urut#status \
sesuai jam.\nContoh: 1#ss (a:alpha, s:sakit, i:izin, t:terlambat)",
        );

        *stage = Some(Stage::AwaitingStudentAttendance {
            class_id: class_id.to_string(),
            teacher_code: teacher_code.to_string(),
            teacher_name: selected.name.clone(),
            hours,
            pending: roster,
        });
        Ok(vec![OutboundMessage::text(participant, text)])
    }

    /// Applies one `<index>#<statuschars>` correction against the pending
    /// roster. The corrected student leaves the pending list; the stage
    /// clears once the list is empty.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn handle_student_attendance(
        &self,
        participant: &str,
        input: &str,
        class_id: &str,
        teacher_code: &str,
        teacher_name: &str,
        hours: &[SlotHour],
        pending: &[Student],
        stage: &mut Option<Stage>,
    ) -> FlowResult<Vec<OutboundMessage>> {
        let Some((index_str, status_str)) = input.split_once('#') else {
            return Err(FlowError::InvalidSelection(
                "Format tidak valid. Silakan coba lagi dengan format: nomor urut#status sesuai \
jam.\nContoh: 1#ss (a:alpha, s:sakit, i:izin, t:terlambat)"
                    .to_string(),
            ));
        };

        let index = parse_index(index_str, pending.len()).ok_or_else(|| {
            FlowError::InvalidSelection(
                "Nomor urut siswa tidak valid. Silakan coba lagi.".to_string(),
            )
        })?;
        let student = &pending[index];

        let statuses: Vec<AttendanceStatus> = status_str
            .trim()
            .chars()
            .map(AttendanceStatus::from_code)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| {
                FlowError::InvalidSelection(
                    "Format tidak valid. Silakan coba lagi dengan format: nomor urut#status \
sesuai jam.\nContoh: 1#ss (a:alpha, s:sakit, i:izin, t:terlambat)"
                        .to_string(),
                )
            })?;
        if statuses.len() != hours.len() {
            return Err(FlowError::InvalidSelection(
                "Jumlah status tidak sesuai dengan jumlah jam. Silakan coba lagi.".to_string(),
            ));
        }

        let today = self.clock.today();
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
        self.gateway.upsert_attendance(&records).await?;

        let mut replies = vec![OutboundMessage::text(
            participant,
            format!("Status absensi siswa {} telah diperbarui.", student.name),
        )];

        let remaining: Vec<Student> = pending
            .iter()
            .filter(|s| s.id != student.id)
            .cloned()
            .collect();
        if remaining.is_empty() {
            replies.push(OutboundMessage::text(
                participant,
                "Semua siswa telah diabsen.",
            ));
            *stage = None;
        } else {
            *stage = Some(Stage::AwaitingStudentAttendance {
                class_id: class_id.to_string(),
                teacher_code: teacher_code.to_string(),
                teacher_name: teacher_name.to_string(),
                hours: hours.to_vec(),
                pending: remaining,
            });
        }

        Ok(replies)
    }

    /// Renders the full-day attendance table for a class as a document.
    pub(crate) async fn build_report(
        &self,
        participant: &str,
        class_id: &str,
        date: NaiveDate,
    ) -> FlowResult<OutboundMessage> {
        let records = self
            .gateway
            .find_attendance(&AttendanceFilter {
                class_id: Some(class_id.to_string()),
                date: Some(date),
                ..AttendanceFilter::default()
            })
            .await?;
        if records.is_empty() {
            return Ok(OutboundMessage::text(
                participant,
                "Tidak ada data absensi siswa untuk kelas ini.",
            ));
        }

        let mut ids: Vec<String> = Vec::new();
        for record in &records {
            if !ids.contains(&record.student_id) {
                ids.push(record.student_id.clone());
            }
        }
        let students = self.gateway.find_students_by_ids(&ids).await?;

        let mut rows: Vec<ReportRow> = students
            .iter()
            .map(|student| {
                let mut cells = vec![String::new(); REPORT_HOUR_COUNT];
                for record in records.iter().filter(|r| r.student_id == student.id) {
                    let slot = record.hour as usize;
                    if (1..=REPORT_HOUR_COUNT).contains(&slot) {
                        cells[slot - 1] = record.status.code().to_string();
                    }
                }
                ReportRow {
                    name: student.name.clone(),
                    hour_cells: cells,
                }
            })
            .collect();
        rows.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

        let title = format!("Absensi Kelas {class_id}");
        let bytes = self
            .renderer
            .render(&title, &date.to_string(), REPORT_HOUR_COUNT, &rows)?;
        let file_name = format!(
            "Attendance_{class_id}_{date}.{}",
            self.renderer.file_extension()
        );

        Ok(OutboundMessage::document(participant, bytes, file_name))
    }
}
