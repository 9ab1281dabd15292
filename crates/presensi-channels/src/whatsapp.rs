use crate::channel::{Channel, ChannelEvent};
use async_trait::async_trait;
use base64::Engine as _;
use presensi_core::{InboundMessage, OutboundBody, OutboundMessage, PresensiError, PresensiResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;

/// WhatsApp HTTP bridge adapter.
///
/// Talks to an external bridge process that owns the actual WhatsApp
/// connection (pairing, encryption, presence). Incoming messages are pulled
/// by long-polling the bridge's `/messages` endpoint and forwarded through a
/// `tokio::sync::mpsc` channel as [`ChannelEvent`]s. Outbound sends simulate
/// typing by toggling presence around a short delay, like a human replying.
pub struct WhatsAppBridgeChannel {
    base_url: String,
    token: String,
    typing_delay: Duration,
    client: reqwest::Client,
    event_tx: mpsc::Sender<ChannelEvent>,
    event_rx: Option<mpsc::Receiver<ChannelEvent>>,
}

// ── Bridge API payload types ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct BridgeMessages {
    messages: Vec<BridgeMessage>,
}

#[derive(Debug, Deserialize)]
struct BridgeMessage {
    id: i64,
    sender: String,
    text: Option<String>,
    location: Option<BridgeLocation>,
    #[serde(default)]
    sticker: bool,
}

#[derive(Debug, Deserialize)]
struct BridgeLocation {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Serialize)]
struct PresenceRequest<'a> {
    to: &'a str,
    state: &'a str,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    to: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    document_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_name: Option<&'a str>,
}

// ── Implementation ───────────────────────────────────────────────────────────

impl WhatsAppBridgeChannel {
    /// Create a new adapter.
    ///
    /// * `base_url` – Base URL of the bridge (e.g. `http://127.0.0.1:8471`).
    /// * `token` – Bearer token the bridge expects.
    /// * `typing_delay` – Simulated typing pause before each send.
    /// * `event_buffer` – Capacity of the internal mpsc event buffer.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        typing_delay: Duration,
        event_buffer: usize,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel(event_buffer);
        Self {
            base_url: base_url.into(),
            token: token.into(),
            typing_delay,
            client: reqwest::Client::new(),
            event_tx,
            event_rx: Some(event_rx),
        }
    }

    /// Take the receiving half of the event channel.
    ///
    /// This can only be called once; subsequent calls return `None`.
    pub fn take_event_receiver(&mut self) -> Option<mpsc::Receiver<ChannelEvent>> {
        self.event_rx.take()
    }

    /// Long-poll the bridge for inbound messages.
    ///
    /// Runs indefinitely, forwarding every message as a
    /// [`ChannelEvent::MessageReceived`]. Should be spawned onto a task.
    pub async fn poll_messages(&self) -> PresensiResult<()> {
        let mut offset: Option<i64> = None;

        loop {
            let url = format!("{}/messages", self.base_url);
            let mut params: Vec<(&str, String)> = vec![("timeout", "30".to_string())];
            if let Some(off) = offset {
                params.push(("offset", off.to_string()));
            }

            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .query(&params)
                .send()
                .await
                .map_err(|e| PresensiError::Channel(format!("Bridge poll error: {e}")))?;

            let body: BridgeMessages = response
                .json()
                .await
                .map_err(|e| PresensiError::Channel(format!("Bridge parse error: {e}")))?;

            if !body.messages.is_empty() {
                tracing::debug!(count = body.messages.len(), "bridge messages received");
            }

            for msg in body.messages {
                offset = Some(msg.id + 1);

                let inbound = InboundMessage {
                    participant_id: msg.sender,
                    text: msg.text,
                    location: msg.location.map(|l| presensi_core::GeoPoint {
                        latitude: l.latitude,
                        longitude: l.longitude,
                    }),
                    sticker: msg.sticker,
                };

                // Best-effort send; if the receiver is dropped we stop.
                if self
                    .event_tx
                    .send(ChannelEvent::MessageReceived(inbound))
                    .await
                    .is_err()
                {
                    return Ok(());
                }
            }
        }
    }

    async fn post_presence(&self, to: &str, state: &str) -> PresensiResult<()> {
        let url = format!("{}/presence", self.base_url);
        self.client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&PresenceRequest { to, state })
            .send()
            .await
            .map_err(|e| PresensiError::Channel(format!("Bridge presence error: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl Channel for WhatsAppBridgeChannel {
    fn name(&self) -> &str {
        "whatsapp"
    }

    async fn send(&self, message: OutboundMessage) -> PresensiResult<()> {
        // Simulated typing: composing, pause, paused, send.
        self.post_presence(&message.participant_id, "composing").await?;
        tokio::time::sleep(self.typing_delay).await;
        self.post_presence(&message.participant_id, "paused").await?;

        let payload = match &message.body {
            OutboundBody::Text(text) => SendRequest {
                to: &message.participant_id,
                text: Some(text),
                document_base64: None,
                file_name: None,
            },
            OutboundBody::Document { bytes, file_name } => SendRequest {
                to: &message.participant_id,
                text: None,
                document_base64: Some(base64::engine::general_purpose::STANDARD.encode(bytes)),
                file_name: Some(file_name),
            },
        };

        let url = format!("{}/send", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PresensiError::Channel(format!("Bridge send error: {e}")))?;

        if !response.status().is_success() {
            return Err(PresensiError::Channel(format!(
                "Bridge send failed: HTTP {}",
                response.status()
            )));
        }

        Ok(())
    }
}
