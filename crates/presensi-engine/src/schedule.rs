//! Menu #1: today's teaching schedule.

use crate::error::FlowResult;
use crate::router::Engine;
use presensi_core::OutboundMessage;
use presensi_store::SlotFilter;

impl Engine {
    /// Lists today's slots for the requesting teacher, grouped by subject
    /// and class. Read-only; the stage is left as it is.
    pub(crate) async fn display_schedule(
        &self,
        participant: &str,
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
                format!(
                    "Tidak ada jadwal yang ditemukan untuk hari {name} dengan kode jadwal {config}."
                ),
            )]);
        }

        // Group hours per (subject, class), preserving first appearance.
        let mut groups: Vec<((String, String), Vec<u8>)> = Vec::new();
        for slot in &slots {
            let key = (slot.subject_id.clone(), slot.class_id.clone());
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, hours)) => hours.push(slot.hour),
                None => groups.push((key, vec![slot.hour])),
            }
        }

        let mut text = format!("Jadwal Anda hari ini ({name}) dengan kode jadwal {config}:\n\n");
        for (index, ((subject, class), hours)) in groups.iter().enumerate() {
            let mut hours = hours.clone();
            hours.sort_unstable();
            let first = hours.first().copied().unwrap_or_default();
            let last = hours.last().copied().unwrap_or_default();
            text.push_str(&format!(
                "{}. Mapel: {subject}, {class} Jam({first}-{last})\n",
                index + 1
            ));
        }

        Ok(vec![OutboundMessage::text(participant, text)])
    }
}
