use crate::clock::{Clock, SystemClock};
use crate::error::{FlowError, FlowResult};
use crate::geo::{CheckInConfig, Geocoder};
use crate::menu::{MAIN_MENU, MSG_CONFIG_NOT_FOUND, MSG_TEACHER_NOT_FOUND, MSG_UNKNOWN_COMMAND};
use chrono::{Datelike, NaiveDate};
use presensi_core::{day_code, day_name, InboundMessage, OutboundMessage, Teacher};
use presensi_report::ReportRenderer;
use presensi_session::{BackTarget, SessionStore, Stage};
use presensi_store::QueryGateway;
use std::sync::Arc;

/// The dialogue router.
///
/// One instance serves every participant; per-participant ordering is
/// enforced by holding the session lock for the whole event, so two events
/// from the same phone never interleave.
pub struct Engine {
    pub(crate) gateway: Arc<dyn QueryGateway>,
    pub(crate) geocoder: Arc<dyn Geocoder>,
    pub(crate) renderer: Arc<dyn ReportRenderer>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) checkin: CheckInConfig,
    sessions: SessionStore,
}

impl Engine {
    pub fn new(
        gateway: Arc<dyn QueryGateway>,
        geocoder: Arc<dyn Geocoder>,
        renderer: Arc<dyn ReportRenderer>,
        checkin: CheckInConfig,
    ) -> Self {
        Self {
            gateway,
            geocoder,
            renderer,
            clock: Arc::new(SystemClock),
            checkin,
            sessions: SessionStore::new(),
        }
    }

    /// Replace the time source. Used by tests to pin the weekday.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Process one inbound event and produce the replies.
    ///
    /// Never fails: handler errors are converted into their user-facing
    /// reply, and persistence failures are logged with their detail. An
    /// erroring handler leaves the stage untouched.
    pub async fn handle_event(&self, message: InboundMessage) -> Vec<OutboundMessage> {
        let participant = message.participant_id.clone();
        let mut stage = self.sessions.lock(&participant).await;

        tracing::debug!(
            participant = %participant,
            stage = stage.as_ref().map_or("idle", Stage::name),
            "handling inbound event"
        );

        match self.dispatch(&message, &mut stage).await {
            Ok(replies) => replies,
            Err(err) => {
                if let FlowError::Persistence(detail) = &err {
                    tracing::error!(participant = %participant, error = %detail, "workflow failed");
                }
                vec![OutboundMessage::text(&participant, err.user_reply())]
            }
        }
    }

    async fn dispatch(
        &self,
        message: &InboundMessage,
        stage: &mut Option<Stage>,
    ) -> FlowResult<Vec<OutboundMessage>> {
        let participant = &message.participant_id;

        // Stickers always recall the menu, whatever the stage.
        if message.sticker {
            return Ok(self.show_menu(participant, stage));
        }

        if let Some(point) = message.location {
            if let Some(Stage::AwaitingLocation { departure }) = stage {
                let departure = *departure;
                return self.handle_location(participant, point, departure, stage).await;
            }
            return Ok(vec![OutboundMessage::text(participant, MSG_UNKNOWN_COMMAND)]);
        }

        let Some(raw) = &message.text else {
            // Media without text; nothing to route.
            return Ok(Vec::new());
        };
        let input = raw.trim().to_lowercase();

        match input.as_str() {
            "#menu" | "#home" => return Ok(self.show_menu(participant, stage)),
            "#back" => {
                if let Some(target) = stage.as_ref().and_then(Stage::back_target) {
                    return match target {
                        BackTarget::ClassSelection => {
                            self.prompt_class_selection(participant, stage).await
                        }
                    };
                }
                // No back target here; fall through to the stage handler.
            }
            "#1" => return self.display_schedule(participant).await,
            "#2" => return self.prompt_check_in(participant, stage).await,
            "#3" => return self.prompt_class_selection(participant, stage).await,
            "#4" => return self.prompt_summary_selection(participant, stage).await,
            "#5" => return self.start_coverage_check(participant, stage).await,
            _ => {}
        }

        let current = stage.clone();
        match current {
            None => Ok(self.show_menu(participant, stage)),
            Some(Stage::MenuShown) => {
                Ok(vec![OutboundMessage::text(participant, MSG_UNKNOWN_COMMAND)])
            }
            Some(Stage::AwaitingClassSelection { options }) => {
                self.handle_class_selection(participant, &input, &options, stage)
                    .await
            }
            Some(Stage::AwaitingHourSelection { class_id }) => {
                self.handle_hour_selection(participant, &input, &class_id, stage)
                    .await
            }
            Some(Stage::AwaitingAttendanceInput {
                class_id,
                teacher_code,
                hours,
                roster,
            }) => {
                self.handle_corrections(participant, &input, &class_id, &teacher_code, &hours, &roster)
                    .await
            }
            Some(Stage::AwaitingLocation { .. }) => Ok(vec![OutboundMessage::text(
                participant,
                "Silakan kirim lokasi Anda dengan fitur berbagi lokasi WhatsApp.",
            )]),
            Some(Stage::AwaitingSummarySelection {
                teacher_code,
                options,
            }) => {
                self.handle_summary_selection(participant, &input, &teacher_code, &options, stage)
                    .await
            }
            Some(Stage::AwaitingTeacherSelection {
                class_id,
                teacher_code,
                unmarked,
            }) => {
                self.handle_teacher_selection(
                    participant,
                    &input,
                    &class_id,
                    &teacher_code,
                    &unmarked,
                    stage,
                )
                .await
            }
            Some(Stage::AwaitingStudentAttendance {
                class_id,
                teacher_code,
                teacher_name,
                hours,
                pending,
            }) => {
                self.handle_student_attendance(
                    participant,
                    &input,
                    &class_id,
                    &teacher_code,
                    &teacher_name,
                    &hours,
                    &pending,
                    stage,
                )
                .await
            }
        }
    }

    pub(crate) fn show_menu(
        &self,
        participant: &str,
        stage: &mut Option<Stage>,
    ) -> Vec<OutboundMessage> {
        *stage = Some(Stage::MenuShown);
        vec![OutboundMessage::text(participant, MAIN_MENU)]
    }

    /// The teacher bound to this participant's phone number.
    pub(crate) async fn require_teacher(&self, participant: &str) -> FlowResult<Teacher> {
        let phone = phone_from_jid(participant);
        self.gateway
            .find_teacher_by_phone(phone)
            .await?
            .ok_or_else(|| FlowError::EntityNotFound(MSG_TEACHER_NOT_FOUND.to_string()))
    }

    /// The active schedule-configuration code.
    pub(crate) async fn require_config(&self) -> FlowResult<String> {
        self.gateway
            .find_schedule_config()
            .await?
            .ok_or_else(|| FlowError::EntityNotFound(MSG_CONFIG_NOT_FOUND.to_string()))
    }

    /// Today's date with its schedule day code and Indonesian day name.
    pub(crate) fn today_context(&self) -> (NaiveDate, char, &'static str) {
        let today = self.clock.today();
        let weekday = today.weekday();
        (today, day_code(weekday), day_name(weekday))
    }
}

/// The phone number half of a WhatsApp JID like `628123@s.whatsapp.net`.
pub(crate) fn phone_from_jid(jid: &str) -> &str {
    jid.split('@').next().unwrap_or(jid)
}
