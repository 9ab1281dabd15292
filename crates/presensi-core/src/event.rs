use serde::{Deserialize, Serialize};

/// A latitude/longitude pair as shared by the messaging transport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// An inbound event from the messaging transport.
///
/// Exactly one of `text`, `location` or `sticker` is expected to be set;
/// the router treats anything else as unrecognised input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Stable chat address of the sender (phone-number JID).
    pub participant_id: String,
    pub text: Option<String>,
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub sticker: bool,
}

impl InboundMessage {
    /// Creates a text event.
    pub fn text(participant_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            participant_id: participant_id.into(),
            text: Some(text.into()),
            location: None,
            sticker: false,
        }
    }

    /// Creates a shared-location event.
    pub fn location(participant_id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            participant_id: participant_id.into(),
            text: None,
            location: Some(GeoPoint {
                latitude,
                longitude,
            }),
            sticker: false,
        }
    }

    /// Creates a sticker event.
    pub fn sticker(participant_id: impl Into<String>) -> Self {
        Self {
            participant_id: participant_id.into(),
            text: None,
            location: None,
            sticker: true,
        }
    }
}

/// The payload of an outbound reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutboundBody {
    /// A plain text reply.
    Text(String),
    /// A document attachment (e.g. an attendance report).
    Document { bytes: Vec<u8>, file_name: String },
}

/// An outbound reply to a participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub participant_id: String,
    pub body: OutboundBody,
}

impl OutboundMessage {
    /// Creates a text reply.
    pub fn text(participant_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            participant_id: participant_id.into(),
            body: OutboundBody::Text(text.into()),
        }
    }

    /// Creates a document reply.
    pub fn document(
        participant_id: impl Into<String>,
        bytes: Vec<u8>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            participant_id: participant_id.into(),
            body: OutboundBody::Document {
                bytes,
                file_name: file_name.into(),
            },
        }
    }

    /// The text content, if this is a text reply.
    pub fn as_text(&self) -> Option<&str> {
        match &self.body {
            OutboundBody::Text(t) => Some(t),
            OutboundBody::Document { .. } => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_text_event() {
        let msg = InboundMessage::text("0811@s.whatsapp.net", "#menu");
        assert_eq!(msg.text.as_deref(), Some("#menu"));
        assert!(msg.location.is_none());
        assert!(!msg.sticker);
    }

    #[test]
    fn test_location_event() {
        let msg = InboundMessage::location("0811", -8.3, 114.1);
        let loc = msg.location.unwrap();
        assert!((loc.latitude + 8.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_outbound_serialization() {
        let msg = OutboundMessage::text("0811", "halo");
        let json = serde_json::to_string(&msg).unwrap();
        let back: OutboundMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_text(), Some("halo"));
    }
}
