use async_trait::async_trait;
use presensi_core::{InboundMessage, OutboundMessage, PresensiResult};

/// Events forwarded from a transport to the dialogue engine.
#[derive(Debug)]
pub enum ChannelEvent {
    MessageReceived(InboundMessage),
    Connected(String),
    Disconnected(String),
}

/// A transport capable of delivering outbound replies.
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;
    async fn send(&self, message: OutboundMessage) -> PresensiResult<()>;
}
