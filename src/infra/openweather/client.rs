use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::fetch::auth::UrlParam;
use crate::fetch::{BasicClient, HttpClient, fetch_bytes};
use crate::metrics::MS_TO_KNOTS;
use crate::model::WeatherObservation;
use crate::services::weather_api::{Place, WeatherSource};

const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org";

#[derive(Deserialize)]
struct GeoEntry {
    lat: f64,
    lon: f64,
}

#[derive(Deserialize)]
struct TimeMachineResponse {
    #[serde(default)]
    data: Vec<HourlyData>,
}

#[derive(Deserialize)]
struct HourlyData {
    dt: i64,
    temp: Option<f64>,
    pressure: Option<f64>,
    humidity: Option<f64>,
    wind_speed: Option<f64>,
    wind_deg: Option<f64>,
    rain: Option<Rain>,
}

#[derive(Deserialize)]
struct Rain {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
}

/// OpenWeatherMap geocoding + One Call "timemachine" client.
///
/// Requests use metric units; wind speed is converted from m/s to knots.
pub struct OpenWeatherClient<C> {
    http: C,
    base_url: String,
}

impl OpenWeatherClient<UrlParam<BasicClient>> {
    /// Client against the public API, authenticated with `appid`.
    pub fn new(api_key: String) -> Self {
        Self::with_client(
            UrlParam::new(BasicClient::new(), "appid", api_key),
            OPENWEATHER_BASE_URL,
        )
    }
}

impl<C: HttpClient> OpenWeatherClient<C> {
    pub fn with_client(http: C, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> Result<String, FetchError> {
        let raw = format!("{}{}", self.base_url, path);
        reqwest::Url::parse_with_params(&raw, params)
            .map(String::from)
            .map_err(|e| FetchError::Url {
                url: raw,
                reason: e.to_string(),
            })
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[async_trait]
impl<C: HttpClient> WeatherSource for OpenWeatherClient<C> {
    async fn geocode(&self, name: &str) -> Result<Option<(f64, f64)>, FetchError> {
        let url = self.url(
            "/geo/1.0/direct",
            &[("q", name.to_string()), ("limit", "1".to_string())],
        )?;
        let bytes = fetch_bytes(&self.http, &url).await?;
        let entries: Vec<GeoEntry> = serde_json::from_slice(&bytes)?;

        match entries.first() {
            Some(entry) => {
                debug!(place = name, lat = entry.lat, lon = entry.lon, "Place geocoded");
                Ok(Some((entry.lat, entry.lon)))
            }
            None => {
                warn!(place = name, "No geocoding result");
                Ok(None)
            }
        }
    }

    async fn observation(
        &self,
        place: &Place,
        at: DateTime<Utc>,
    ) -> Result<Option<WeatherObservation>, FetchError> {
        let (lat, lon) = match place.coordinates {
            Some(coords) => coords,
            None => match self.geocode(&place.name).await? {
                Some(coords) => coords,
                None => return Ok(None),
            },
        };

        let url = self.url(
            "/data/3.0/onecall/timemachine",
            &[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("dt", at.timestamp().to_string()),
                ("units", "metric".to_string()),
            ],
        )?;
        let bytes = fetch_bytes(&self.http, &url).await?;
        let response: TimeMachineResponse = serde_json::from_slice(&bytes)?;

        let Some(hourly) = response.data.into_iter().next() else {
            return Ok(None);
        };
        let observed = DateTime::from_timestamp(hourly.dt, 0).unwrap_or(at);

        Ok(Some(WeatherObservation {
            location: place.name.clone(),
            date: observed.date_naive(),
            time: observed.time(),
            wind_speed_kts: hourly.wind_speed.map(|v| round2(v * MS_TO_KNOTS)),
            wind_direction_deg: hourly.wind_deg,
            temperature_c: hourly.temp.map(round2),
            pressure_hpa: hourly.pressure,
            humidity_pct: hourly.humidity,
            rain_mm: Some(hourly.rain.and_then(|r| r.one_hour).unwrap_or(0.0)),
            latitude: Some(lat),
            longitude: Some(lon),
        }))
    }
}
