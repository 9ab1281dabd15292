use async_trait::async_trait;
use presensi_core::{PresensiError, PresensiResult};
use serde::Deserialize;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two coordinates, in meters.
pub fn haversine_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Reference point and acceptance radius for teacher check-ins.
#[derive(Debug, Clone, Copy)]
pub struct CheckInConfig {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: f64,
}

impl Default for CheckInConfig {
    fn default() -> Self {
        Self {
            latitude: -8.304_053_966_712_917,
            longitude: 114.137_758_479_312_68,
            radius_m: 100.0,
        }
    }
}

/// Checks whether coordinates resolve to a real address.
///
/// The check-in flow treats an unresolvable location as invalid before it
/// even measures the distance to the reference point.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolves_to_address(&self, latitude: f64, longitude: f64) -> PresensiResult<bool>;
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    address: Option<ReverseAddress>,
}

#[derive(Debug, Deserialize)]
struct ReverseAddress {}

/// Reverse geocoder backed by the Nominatim HTTP API.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    const DEFAULT_BASE_URL: &'static str = "https://nominatim.openstreetmap.org";

    pub fn new() -> PresensiResult<Self> {
        Self::with_base_url(Self::DEFAULT_BASE_URL)
    }

    /// Point the geocoder at a different endpoint, e.g. a local mirror.
    pub fn with_base_url(base_url: impl Into<String>) -> PresensiResult<Self> {
        // Nominatim rejects requests without an identifying User-Agent.
        let client = reqwest::Client::builder()
            .user_agent(concat!("presensi-bot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PresensiError::Geocode(format!("client build error: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn resolves_to_address(&self, latitude: f64, longitude: f64) -> PresensiResult<bool> {
        let url = format!("{}/reverse", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("format", "json".to_string()),
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
            ])
            .send()
            .await
            .map_err(|e| PresensiError::Geocode(format!("reverse lookup error: {e}")))?;

        let body: ReverseResponse = response
            .json()
            .await
            .map_err(|e| PresensiError::Geocode(format!("reverse parse error: {e}")))?;

        Ok(body.address.is_some())
    }
}
