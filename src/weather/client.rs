/// Wind/UV (weatherstack) and pollen (Open-Meteo) lookups
use log::{debug, warn};
use serde::Deserialize;
use tokio::time::Duration;
use url::Url;

use crate::config::StationConfig;
use crate::error::{MonitorError, Result};
use crate::models::{PollenReading, WindUv};

const POLLEN_FIELDS: &str =
    "alder_pollen,birch_pollen,grass_pollen,mugwort_pollen,olive_pollen,ragweed_pollen";

#[derive(Debug, Deserialize)]
struct WeatherstackResponse {
    current: Option<WeatherstackCurrent>,
    error: Option<WeatherstackError>,
}

#[derive(Debug, Deserialize)]
struct WeatherstackCurrent {
    wind_speed: f64,
    uv_index: f64,
}

#[derive(Debug, Deserialize)]
struct WeatherstackError {
    code: Option<i64>,
    info: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AirQualityResponse {
    current: PollenCurrent,
}

// Outside the season or domain the provider reports null
#[derive(Debug, Deserialize)]
struct PollenCurrent {
    alder_pollen: Option<f64>,
    birch_pollen: Option<f64>,
    grass_pollen: Option<f64>,
    mugwort_pollen: Option<f64>,
    olive_pollen: Option<f64>,
    ragweed_pollen: Option<f64>,
}

/// Decode a weatherstack `current` response body
pub fn parse_wind_uv(body: &str) -> Result<WindUv> {
    let response: WeatherstackResponse = serde_json::from_str(body)?;

    if let Some(err) = response.error {
        return Err(MonitorError::Api(format!(
            "weatherstack error {}: {}",
            err.code.unwrap_or_default(),
            err.info.unwrap_or_else(|| "no details".to_string())
        )));
    }

    let current = response
        .current
        .ok_or_else(|| MonitorError::Api("weatherstack response without `current`".into()))?;

    Ok(WindUv {
        wind_speed: current.wind_speed,
        uv_index: current.uv_index,
    })
}

/// Decode an Open-Meteo air quality response body
pub fn parse_pollen(body: &str) -> Result<PollenReading> {
    let response: AirQualityResponse = serde_json::from_str(body)?;
    let c = response.current;

    let value = |name: &str, v: Option<f64>| {
        v.unwrap_or_else(|| {
            debug!("No {} value reported, using 0", name);
            0.0
        })
    };

    Ok(PollenReading {
        alder: value("alder_pollen", c.alder_pollen),
        birch: value("birch_pollen", c.birch_pollen),
        grass: value("grass_pollen", c.grass_pollen),
        mugwort: value("mugwort_pollen", c.mugwort_pollen),
        olive: value("olive_pollen", c.olive_pollen),
        ragweed: value("ragweed_pollen", c.ragweed_pollen),
    })
}

pub struct WeatherClient {
    http: reqwest::Client,
    weatherstack_url: Url,
    access_key: String,
    query: String,
    air_quality_url: Url,
    latitude: f64,
    longitude: f64,
    pollen_domain: String,
}

impl WeatherClient {
    pub fn new(config: &StationConfig) -> Result<Self> {
        Ok(WeatherClient {
            http: build_http_client(config.http_timeout)?,
            weatherstack_url: config.weatherstack_url.clone(),
            access_key: config.weatherstack_access_key.clone(),
            query: config.weatherstack_query.clone(),
            air_quality_url: config.air_quality_url.clone(),
            latitude: config.latitude,
            longitude: config.longitude,
            pollen_domain: config.pollen_domain.clone(),
        })
    }

    pub async fn wind_uv(&self) -> Result<WindUv> {
        let body = self
            .http
            .get(self.weatherstack_url.clone())
            .query(&[
                ("access_key", self.access_key.as_str()),
                ("query", self.query.as_str()),
                ("units", "m"),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_wind_uv(&body)
    }

    pub async fn pollen(&self) -> Result<PollenReading> {
        let latitude = self.latitude.to_string();
        let longitude = self.longitude.to_string();

        let body = self
            .http
            .get(self.air_quality_url.clone())
            .query(&[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("current", POLLEN_FIELDS),
                ("domains", self.pollen_domain.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let reading = parse_pollen(&body);
        if let Err(e) = &reading {
            warn!("Unexpected pollen payload: {}", e);
        }
        reading
    }
}

fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wind_uv() {
        let body = r#"{
            "request": {"type": "IP", "query": "130.206.138.233", "unit": "m"},
            "current": {"temperature": 14, "wind_speed": 19, "uv_index": 3, "humidity": 77}
        }"#;
        let reading = parse_wind_uv(body).unwrap();
        assert_eq!(reading.wind_speed, 19.0);
        assert_eq!(reading.uv_index, 3.0);
    }

    #[test]
    fn test_parse_wind_uv_error_payload() {
        let body = r#"{"success": false, "error": {"code": 101, "type": "invalid_access_key",
            "info": "You have not supplied a valid API Access Key."}}"#;
        let err = parse_wind_uv(body).unwrap_err();
        assert!(matches!(err, MonitorError::Api(ref m) if m.contains("101")));
    }

    #[test]
    fn test_parse_pollen() {
        let body = r#"{
            "latitude": 43.25, "longitude": -2.9500003,
            "current_units": {"alder_pollen": "grains/m³"},
            "current": {
                "time": "2024-04-12T10:00", "interval": 3600,
                "alder_pollen": 1.2, "birch_pollen": 45.0, "grass_pollen": 3.4,
                "mugwort_pollen": 0.0, "olive_pollen": null, "ragweed_pollen": 0.0
            }
        }"#;
        let pollen = parse_pollen(body).unwrap();
        assert_eq!(pollen.birch, 45.0);
        assert_eq!(pollen.olive, 0.0);
        assert_eq!(pollen.grass, 3.4);
    }

    #[test]
    fn test_parse_pollen_malformed() {
        assert!(matches!(
            parse_pollen(r#"{"error": true, "reason": "bad domain"}"#),
            Err(MonitorError::Json(_))
        ));
    }
}
