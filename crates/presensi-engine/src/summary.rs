//! Menu #4: per-subject attendance summary.

use crate::error::{FlowError, FlowResult};
use crate::menu::{join_hours, parse_index, MSG_INVALID_CHOICE};
use crate::router::Engine;
use presensi_core::{AttendanceStatus, OutboundMessage};
use presensi_session::{Stage, SummaryOption};
use presensi_store::{AttendanceFilter, SlotFilter};
use std::collections::HashMap;

impl Engine {
    /// Lists today's (class, subject) options for the summary and moves to
    /// summary selection.
    pub(crate) async fn prompt_summary_selection(
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
                config_id: Some(config),
                ..SlotFilter::default()
            })
            .await?;

        if slots.is_empty() {
            return Ok(vec![OutboundMessage::text(
                participant,
                format!("Tidak ada kelas yang diampu pada hari {name}."),
            )]);
        }

        let mut options: Vec<SummaryOption> = Vec::new();
        for slot in &slots {
            match options
                .iter_mut()
                .find(|o| o.class_id == slot.class_id && o.subject_id == slot.subject_id)
            {
                Some(option) => option.hours.push(slot.hour),
                None => options.push(SummaryOption {
                    class_id: slot.class_id.clone(),
                    subject_id: slot.subject_id.clone(),
                    hours: vec![slot.hour],
                }),
            }
        }

        let mut text = String::from("Pilih kelas dan mata pelajaran untuk rekap absensi:\n\n");
        for (index, option) in options.iter().enumerate() {
            text.push_str(&format!(
                "{}. {} - {} (Jam: {})\n",
                index + 1,
                option.class_id,
                option.subject_id,
                join_hours(&option.hours)
            ));
        }
        text.push_str("\nSilakan kirim nomor pilihan Anda:");

        *stage = Some(Stage::AwaitingSummarySelection {
            teacher_code: teacher.code,
            options,
        });
        Ok(vec![OutboundMessage::text(participant, text)])
    }

    /// Renders the attendance summary for a selected (class, subject).
    pub(crate) async fn handle_summary_selection(
        &self,
        participant: &str,
        input: &str,
        teacher_code: &str,
        options: &[SummaryOption],
        stage: &mut Option<Stage>,
    ) -> FlowResult<Vec<OutboundMessage>> {
        let index = parse_index(input, options.len())
            .ok_or_else(|| FlowError::InvalidSelection(MSG_INVALID_CHOICE.to_string()))?;
        let selected = &options[index];

        let config = self.require_config().await?;
        let (today, code, _) = self.today_context();

        let slots = self
            .gateway
            .find_schedule_slots(&SlotFilter {
                teacher_code: Some(teacher_code.to_string()),
                class_id: Some(selected.class_id.clone()),
                subject_id: Some(selected.subject_id.clone()),
                day_code: Some(code),
                config_id: Some(config),
                hours: Some(selected.hours.clone()),
            })
            .await?;
        if slots.is_empty() {
            return Err(FlowError::EntityNotFound(format!(
                "Tidak ada jadwal yang ditemukan untuk kelas {} dan mapel {} pada hari ini.",
                selected.class_id, selected.subject_id
            )));
        }

        let records = self
            .gateway
            .find_attendance(&AttendanceFilter {
                teacher_code: Some(teacher_code.to_string()),
                slot_ids: Some(slots.iter().map(|s| s.id).collect()),
                date: Some(today),
                ..AttendanceFilter::default()
            })
            .await?;
        if records.is_empty() {
            return Ok(vec![OutboundMessage::text(
                participant,
                format!(
                    "Tidak ada data absensi untuk kelas {} dan mapel {} hari ini.",
                    selected.class_id, selected.subject_id
                ),
            )]);
        }

        let mut ids: Vec<String> = Vec::new();
        for record in &records {
            if !ids.contains(&record.student_id) {
                ids.push(record.student_id.clone());
            }
        }
        let names: HashMap<String, String> = self
            .gateway
            .find_students_by_ids(&ids)
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();

        // (id, name, statuses by hour) in first-record order, keyed by the
        // student id so same-named students stay distinct; missing names
        // fall back to the id.
        let mut students: Vec<(String, String, Vec<(u8, AttendanceStatus)>)> = Vec::new();
        for record in &records {
            match students.iter_mut().find(|(id, _, _)| *id == record.student_id) {
                Some((_, _, statuses)) => statuses.push((record.hour, record.status)),
                None => {
                    let name = names
                        .get(&record.student_id)
                        .cloned()
                        .unwrap_or_else(|| record.student_id.clone());
                    students.push((
                        record.student_id.clone(),
                        name,
                        vec![(record.hour, record.status)],
                    ));
                }
            }
        }

        let mut hour_range: Vec<u8> = records.iter().map(|r| r.hour).collect();
        hour_range.sort_unstable();
        hour_range.dedup();

        let text = render_summary(
            &selected.class_id,
            &selected.subject_id,
            teacher_code,
            today.format("%d-%m-%Y").to_string().as_str(),
            &students,
            &hour_range,
        );

        *stage = None;
        Ok(vec![OutboundMessage::text(participant, text)])
    }
}

/// Renders the summary message: one section per non-present status with
/// per-student hour counts, then the all-present total.
fn render_summary(
    class_id: &str,
    subject_id: &str,
    teacher_code: &str,
    date_label: &str,
    students: &[(String, String, Vec<(u8, AttendanceStatus)>)],
    hour_range: &[u8],
) -> String {
    let mut text = format!(
        "Rekap Absensi Kelas {class_id} Mapel: {subject_id} Guru: {teacher_code}\nTanggal: {date_label}\n\n"
    );

    for (title, status) in [
        ("Absen/Bolos", AttendanceStatus::Absent),
        ("Sakit", AttendanceStatus::Sick),
        ("Izin", AttendanceStatus::Excused),
    ] {
        text.push_str(title);
        text.push('\n');

        let mut index = 0;
        for (_, name, statuses) in students {
            let hours: Vec<u8> = statuses
                .iter()
                .filter(|(_, s)| *s == status)
                .map(|(hour, _)| *hour)
                .collect();
            if hours.is_empty() {
                continue;
            }
            index += 1;
            text.push_str(&format!(
                "{index}. {name} = {} jp (jam ke:{})\n",
                hours.len(),
                collapse_hour_ranges(&hours)
            ));
        }
        if index == 0 {
            text.push_str("-\n");
        }
        text.push('\n');
    }

    // A student counts as present only when every recorded hour is 'h'.
    let total_present = students
        .iter()
        .filter(|(_, _, statuses)| {
            statuses
                .iter()
                .all(|(_, s)| *s == AttendanceStatus::Present)
        })
        .count();

    let first = hour_range.first().copied().unwrap_or_default();
    let last = hour_range.last().copied().unwrap_or_default();
    text.push_str(&format!(
        "Total kehadiran (Jam ke {first}-{last}) = {total_present} Siswa\n"
    ));
    text
}

/// Collapses sorted hours into dash ranges, e.g. `[3,4,5,7]` -> `3-5, 7`.
pub(crate) fn collapse_hour_ranges(hours: &[u8]) -> String {
    let mut hours = hours.to_vec();
    hours.sort_unstable();

    let mut parts: Vec<String> = Vec::new();
    let mut iter = hours.into_iter();
    let Some(first) = iter.next() else {
        return String::new();
    };
    let (mut start, mut end) = (first, first);

    for hour in iter {
        if hour == end + 1 {
            end = hour;
        } else {
            parts.push(render_range(start, end));
            start = hour;
            end = hour;
        }
    }
    parts.push(render_range(start, end));
    parts.join(", ")
}

fn render_range(start: u8, end: u8) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{start}-{end}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_hour_ranges() {
        assert_eq!(collapse_hour_ranges(&[3, 4, 5]), "3-5");
        assert_eq!(collapse_hour_ranges(&[3, 4, 5, 7]), "3-5, 7");
        assert_eq!(collapse_hour_ranges(&[7]), "7");
        assert_eq!(collapse_hour_ranges(&[5, 3, 4]), "3-5");
        assert_eq!(collapse_hour_ranges(&[]), "");
    }

    #[test]
    fn test_render_summary_sections_and_total() {
        let students = vec![
            (
                "1001".to_string(),
                "Andi".to_string(),
                vec![
                    (3, AttendanceStatus::Present),
                    (4, AttendanceStatus::Present),
                ],
            ),
            (
                "1002".to_string(),
                "Citra".to_string(),
                vec![(3, AttendanceStatus::Sick), (4, AttendanceStatus::Sick)],
            ),
            (
                "1003".to_string(),
                "Dewi".to_string(),
                vec![
                    (3, AttendanceStatus::Present),
                    (4, AttendanceStatus::Late),
                ],
            ),
        ];
        let text = render_summary("7A", "Mtk", "G01", "17-08-2026", &students, &[3, 4]);

        assert!(text.contains("Rekap Absensi Kelas 7A Mapel: Mtk Guru: G01"));
        assert!(text.contains("Sakit\n1. Citra = 2 jp (jam ke:3-4)"));
        // Dewi is late at hour 4, so only Andi counts as fully present.
        assert!(text.contains("Total kehadiran (Jam ke 3-4) = 1 Siswa"));
        // Absent and excused sections are empty.
        assert!(text.contains("Absen/Bolos\n-\n"));
        assert!(text.contains("Izin\n-\n"));
    }

    #[test]
    fn test_render_summary_keeps_same_named_students_apart() {
        let students = vec![
            (
                "1001".to_string(),
                "Andi".to_string(),
                vec![
                    (3, AttendanceStatus::Present),
                    (4, AttendanceStatus::Present),
                ],
            ),
            (
                "1003".to_string(),
                "Andi".to_string(),
                vec![(3, AttendanceStatus::Sick), (4, AttendanceStatus::Sick)],
            ),
        ];
        let text = render_summary("7A", "Mtk", "G01", "17-08-2026", &students, &[3, 4]);

        assert!(text.contains("Sakit\n1. Andi = 2 jp (jam ke:3-4)"));
        // The other Andi is a different student and stays fully present.
        assert!(text.contains("Total kehadiran (Jam ke 3-4) = 1 Siswa"));
    }
}
