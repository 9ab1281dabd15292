use presensi_core::Student;

/// One selectable (class, subject) combination with its scheduled hours,
/// shown to the teacher as a numbered option.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassOption {
    pub class_id: String,
    pub subject_id: String,
    pub hours: Vec<u8>,
}

/// One selectable (class, subject, hours) combination for the summary flow.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryOption {
    pub class_id: String,
    pub subject_id: String,
    pub hours: Vec<u8>,
}

/// A schedule-slot id paired with its lesson hour. Correction status strings
/// map positionally onto an ordered `Vec<SlotHour>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotHour {
    pub slot_id: i64,
    pub hour: u8,
}

/// One subject taught by an unmarked teacher, with its slot/hour pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct UnmarkedGroup {
    pub subject_id: String,
    pub hours: Vec<SlotHour>,
}

/// A teacher who has not yet marked attendance today, with every unmarked
/// (subject, hours) group merged under their name.
#[derive(Debug, Clone, PartialEq)]
pub struct UnmarkedTeacher {
    pub name: String,
    pub groups: Vec<UnmarkedGroup>,
}

impl UnmarkedTeacher {
    /// All of this teacher's unmarked slot/hour pairs, in group order.
    pub fn slot_hours(&self) -> Vec<SlotHour> {
        self.groups
            .iter()
            .flat_map(|g| g.hours.iter().copied())
            .collect()
    }
}

/// Where a `#back` command should land from the current stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackTarget {
    /// Re-run the class selection prompt (menu #3 entry point).
    ClassSelection,
}

/// The position of a participant's conversation in the workflow state
/// machine. Exactly one stage is active per participant at any time.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Main menu was shown; waiting for a `#1`..`#5` choice.
    MenuShown,
    /// Waiting for a 1-based index into the class attendance options.
    AwaitingClassSelection { options: Vec<ClassOption> },
    /// Waiting for a `lo-hi` lesson-hour range for the stored class.
    AwaitingHourSelection { class_id: String },
    /// Waiting for `<index>#<statuschars>` correction lines. Left only by
    /// an explicit command (`#back`, `#home`, `#1`..`#5`).
    AwaitingAttendanceInput {
        class_id: String,
        teacher_code: String,
        hours: Vec<SlotHour>,
        roster: Vec<Student>,
    },
    /// Waiting for a shared location for the pending check-in event.
    AwaitingLocation { departure: bool },
    /// Waiting for a 1-based index into the summary options.
    AwaitingSummarySelection {
        teacher_code: String,
        options: Vec<SummaryOption>,
    },
    /// Waiting for a 1-based index into the unmarked-teacher list.
    AwaitingTeacherSelection {
        class_id: String,
        teacher_code: String,
        unmarked: Vec<UnmarkedTeacher>,
    },
    /// Waiting for per-student corrections for a covered teacher's slots.
    AwaitingStudentAttendance {
        class_id: String,
        teacher_code: String,
        teacher_name: String,
        hours: Vec<SlotHour>,
        pending: Vec<Student>,
    },
}

impl Stage {
    /// Short stage name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MenuShown => "menu_shown",
            Self::AwaitingClassSelection { .. } => "awaiting_class_selection",
            Self::AwaitingHourSelection { .. } => "awaiting_hour_selection",
            Self::AwaitingAttendanceInput { .. } => "awaiting_attendance_input",
            Self::AwaitingLocation { .. } => "awaiting_location",
            Self::AwaitingSummarySelection { .. } => "awaiting_summary_selection",
            Self::AwaitingTeacherSelection { .. } => "awaiting_teacher_selection",
            Self::AwaitingStudentAttendance { .. } => "awaiting_student_attendance",
        }
    }

    /// The `#back` destination recorded for this stage, if any.
    pub fn back_target(&self) -> Option<BackTarget> {
        match self {
            Self::AwaitingAttendanceInput { .. } | Self::MenuShown => {
                Some(BackTarget::ClassSelection)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_back_targets() {
        assert_eq!(
            Stage::MenuShown.back_target(),
            Some(BackTarget::ClassSelection)
        );
        assert_eq!(Stage::AwaitingLocation { departure: false }.back_target(), None);
    }

    #[test]
    fn test_unmarked_teacher_flattens_groups_in_order() {
        let teacher = UnmarkedTeacher {
            name: "Budi".to_string(),
            groups: vec![
                UnmarkedGroup {
                    subject_id: "Mtk".to_string(),
                    hours: vec![SlotHour { slot_id: 1, hour: 3 }],
                },
                UnmarkedGroup {
                    subject_id: "BJawa".to_string(),
                    hours: vec![
                        SlotHour { slot_id: 2, hour: 5 },
                        SlotHour { slot_id: 3, hour: 6 },
                    ],
                },
            ],
        };
        let hours: Vec<u8> = teacher.slot_hours().iter().map(|s| s.hour).collect();
        assert_eq!(hours, vec![3, 5, 6]);
    }
}
