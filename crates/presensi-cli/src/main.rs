use clap::{Parser, Subcommand};
use presensi_channels::{Channel, ChannelEvent, WhatsAppBridgeChannel};
use presensi_core::{Student, Teacher};
use presensi_engine::{CheckInConfig, Engine, NominatimGeocoder};
use presensi_report::TextTableRenderer;
use presensi_store::SqliteGateway;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "presensi", about = "Presensi — WhatsApp attendance bot for schools")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "presensi.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to the WhatsApp bridge and serve conversations
    Serve,
    /// Load teachers, students and schedule slots from a TOML file
    Seed {
        /// Path to the seed file
        file: PathBuf,
    },
}

#[derive(Deserialize)]
struct PresensiConfig {
    #[serde(default)]
    database: DatabaseConfig,
    bridge: BridgeConfig,
    #[serde(default)]
    checkin: CheckInSection,
    #[serde(default)]
    geocoder: GeocoderConfig,
}

#[derive(Deserialize)]
struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Deserialize)]
struct BridgeConfig {
    base_url: String,
    token: String,
    #[serde(default = "default_typing_delay_ms")]
    typing_delay_ms: u64,
    #[serde(default = "default_event_buffer")]
    event_buffer: usize,
}

#[derive(Deserialize, Default)]
struct CheckInSection {
    latitude: Option<f64>,
    longitude: Option<f64>,
    radius_m: Option<f64>,
}

impl CheckInSection {
    fn resolve(&self) -> CheckInConfig {
        let defaults = CheckInConfig::default();
        CheckInConfig {
            latitude: self.latitude.unwrap_or(defaults.latitude),
            longitude: self.longitude.unwrap_or(defaults.longitude),
            radius_m: self.radius_m.unwrap_or(defaults.radius_m),
        }
    }
}

#[derive(Deserialize, Default)]
struct GeocoderConfig {
    base_url: Option<String>,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("presensi.db")
}
fn default_typing_delay_ms() -> u64 {
    2000
}
fn default_event_buffer() -> usize {
    64
}

#[derive(Deserialize)]
struct SeedFile {
    config: String,
    #[serde(default)]
    teachers: Vec<Teacher>,
    #[serde(default)]
    students: Vec<Student>,
    #[serde(default)]
    slots: Vec<SeedSlot>,
}

#[derive(Deserialize)]
struct SeedSlot {
    teacher_code: String,
    class_id: String,
    subject_id: String,
    /// Single-letter day code (Sunday = H, Monday = A .. Saturday = F).
    day: String,
    hour: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();

    let config_str = tokio::fs::read_to_string(&cli.config).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to read config file '{}': {}",
            cli.config.display(),
            e
        )
    })?;
    let config: PresensiConfig = toml::from_str(&config_str)?;

    match cli.command {
        Commands::Serve => serve(config).await,
        Commands::Seed { file } => seed(config, file).await,
    }
}

async fn serve(config: PresensiConfig) -> anyhow::Result<()> {
    let gateway = Arc::new(SqliteGateway::open(&config.database.path)?);
    info!(path = %config.database.path.display(), "Database opened");

    let geocoder = match &config.geocoder.base_url {
        Some(base_url) => NominatimGeocoder::with_base_url(base_url)?,
        None => NominatimGeocoder::new()?,
    };

    let engine = Arc::new(Engine::new(
        gateway,
        Arc::new(geocoder),
        Arc::new(TextTableRenderer),
        config.checkin.resolve(),
    ));

    let mut channel = WhatsAppBridgeChannel::new(
        config.bridge.base_url.clone(),
        config.bridge.token.clone(),
        Duration::from_millis(config.bridge.typing_delay_ms),
        config.bridge.event_buffer,
    );
    let mut events = channel
        .take_event_receiver()
        .ok_or_else(|| anyhow::anyhow!("event receiver already taken"))?;
    let channel = Arc::new(channel);

    let poller = channel.clone();
    tokio::spawn(async move {
        if let Err(e) = poller.poll_messages().await {
            tracing::error!(error = %e, "Bridge polling stopped");
        }
    });

    info!(bridge = %config.bridge.base_url, "Presensi bot serving");

    while let Some(event) = events.recv().await {
        match event {
            ChannelEvent::MessageReceived(message) => {
                // Events are handled in receipt order so two messages from
                // the same participant cannot race to the session lock; only
                // the sends, which carry the typing pause, leave this task.
                let replies = engine.handle_event(message).await;
                let channel = channel.clone();
                tokio::spawn(async move {
                    for reply in replies {
                        if let Err(e) = channel.send(reply).await {
                            tracing::error!(error = %e, "Failed to send reply");
                        }
                    }
                });
            }
            ChannelEvent::Connected(detail) => info!(detail = %detail, "Bridge connected"),
            ChannelEvent::Disconnected(detail) => {
                tracing::warn!(detail = %detail, "Bridge disconnected");
            }
        }
    }

    Ok(())
}

async fn seed(config: PresensiConfig, file: PathBuf) -> anyhow::Result<()> {
    let seed_str = tokio::fs::read_to_string(&file)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read seed file '{}': {}", file.display(), e))?;
    let seed: SeedFile = toml::from_str(&seed_str)?;

    let gateway = SqliteGateway::open(&config.database.path)?;
    gateway.set_schedule_config(&seed.config).await?;

    for teacher in &seed.teachers {
        gateway.insert_teacher(teacher).await?;
    }
    for student in &seed.students {
        gateway.insert_student(student).await?;
    }
    for slot in &seed.slots {
        let day = slot
            .day
            .chars()
            .next()
            .ok_or_else(|| anyhow::anyhow!("empty day code in seed slot"))?;
        gateway
            .insert_slot(
                &slot.teacher_code,
                &slot.class_id,
                &slot.subject_id,
                day,
                slot.hour,
                &seed.config,
            )
            .await?;
    }

    info!(
        teachers = seed.teachers.len(),
        students = seed.students.len(),
        slots = seed.slots.len(),
        config = %seed.config,
        "Seed data loaded"
    );
    Ok(())
}
