//! Menu #2: teacher arrival and departure check-in.

use crate::error::{FlowError, FlowResult};
use crate::geo::haversine_distance_m;
use crate::router::{phone_from_jid, Engine};
use presensi_core::{CheckIn, CheckInEvent, GeoPoint, OutboundMessage};
use presensi_session::Stage;

impl Engine {
    /// Reports today's check-in status and, if an event is still open,
    /// asks for a shared location.
    pub(crate) async fn prompt_check_in(
        &self,
        participant: &str,
        stage: &mut Option<Stage>,
    ) -> FlowResult<Vec<OutboundMessage>> {
        let phone = phone_from_jid(participant);
        let today = self.clock.today();
        let check_ins = self.gateway.find_check_ins(phone, today).await?;

        let arrival_done = check_ins
            .iter()
            .any(|c| c.event == CheckInEvent::Arrival);
        let departure_done = check_ins
            .iter()
            .any(|c| c.event == CheckInEvent::Departure);

        let label = |done: bool| if done { "sudah absen" } else { "belum absen" };
        let mut text = format!(
            "Status absensi Anda untuk hari ini:\nDatang: {}\nPulang: {}",
            label(arrival_done),
            label(departure_done)
        );

        if arrival_done && departure_done {
            text.push_str("\n\nAbsensi datang dan pulang sudah dilakukan hari ini.");
        } else if !arrival_done {
            text.push_str("\n\nSilakan kirim lokasi Anda untuk absensi kedatangan.");
            *stage = Some(Stage::AwaitingLocation { departure: false });
        } else {
            text.push_str("\n\nSilakan kirim lokasi Anda untuk absensi kepulangan.");
            *stage = Some(Stage::AwaitingLocation { departure: true });
        }

        Ok(vec![OutboundMessage::text(participant, text)])
    }

    /// Validates a shared location and records the check-in.
    ///
    /// A geocoder failure counts as an invalid location, so a flaky lookup
    /// never lets a check-in through unverified. Rejections keep the stage,
    /// letting the teacher share again.
    pub(crate) async fn handle_location(
        &self,
        participant: &str,
        point: GeoPoint,
        departure: bool,
        stage: &mut Option<Stage>,
    ) -> FlowResult<Vec<OutboundMessage>> {
        let resolvable = self
            .geocoder
            .resolves_to_address(point.latitude, point.longitude)
            .await
            .unwrap_or(false);
        if !resolvable {
            return Err(FlowError::LocationRejected(
                "Lokasi Anda tidak valid. Silakan coba lagi dari lokasi yang benar.".to_string(),
            ));
        }

        let distance = haversine_distance_m(
            self.checkin.latitude,
            self.checkin.longitude,
            point.latitude,
            point.longitude,
        );
        if distance > self.checkin.radius_m {
            return Err(FlowError::LocationRejected(
                "Lokasi Anda tidak sesuai. Silakan coba lagi dari lokasi yang benar.".to_string(),
            ));
        }

        let teacher = self.require_teacher(participant).await?;
        let event = if departure {
            CheckInEvent::Departure
        } else {
            CheckInEvent::Arrival
        };

        self.gateway
            .insert_check_in(&CheckIn {
                teacher_phone: phone_from_jid(participant).to_string(),
                date: self.clock.today(),
                time: self.clock.time_of_day(),
                event,
                latitude: point.latitude,
                longitude: point.longitude,
            })
            .await?;

        *stage = None;
        Ok(vec![OutboundMessage::text(
            participant,
            format!(
                "Terima kasih, {}. Anda telah {}. Data absensi Anda telah disimpan.",
                teacher.name,
                event.label().to_lowercase()
            ),
        )])
    }
}
