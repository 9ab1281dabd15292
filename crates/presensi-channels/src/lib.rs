//! Messaging transport adapters for the Presensi bot.
//!
//! The dialogue engine only consumes "receive event" / "send reply"; this
//! crate provides that seam. Connection lifecycle, pairing and encryption
//! live in the external bridge process.
//!
//! # Main types
//!
//! - [`Channel`] — Trait for delivering outbound replies.
//! - [`ChannelEvent`] — Inbound events forwarded to the engine.
//! - [`WhatsAppBridgeChannel`] — Adapter for a WhatsApp HTTP bridge.

pub mod channel;
pub mod whatsapp;

pub use channel::{Channel, ChannelEvent};
pub use whatsapp::WhatsAppBridgeChannel;
