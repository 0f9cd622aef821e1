use log::{debug, info};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tokio::time::Duration;
use url::Url;

use crate::error::{MonitorError, Result};

const DEFAULT_WEATHERSTACK_URL: &str = "http://api.weatherstack.com/current";
const DEFAULT_AIR_QUALITY_URL: &str = "https://air-quality-api.open-meteo.com/v1/air-quality";

#[derive(Debug, Clone)]
pub struct StationConfig {
    pub database_url: String,
    pub location: String,

    pub weatherstack_url: Url,
    pub weatherstack_access_key: String,
    pub weatherstack_query: String,
    pub air_quality_url: Url,
    pub latitude: f64,
    pub longitude: f64,
    pub pollen_domain: String,

    pub dust_gpio: u8,
    pub pigpio_dir: PathBuf,
    pub dht_device: PathBuf,
    pub pressure_command: Vec<String>,
    pub classifier_command: Option<Vec<String>>,

    /// `None` keeps retrying a not-ready climate sensor forever
    pub climate_read_timeout: Option<Duration>,
    pub http_timeout: Duration,
    pub command_timeout: Duration,
}

impl StationConfig {
    pub fn new() -> Result<Self> {
        // Load environment variables
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| MonitorError::Config(format!("{} environment variable not set", key)))
        };
        let optional = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let database_url = required("DATABASE_URL")?;
        let weatherstack_access_key = required("WEATHERSTACK_ACCESS_KEY")?;
        let latitude = parse_value("LATITUDE", &required("LATITUDE")?)?;
        let longitude = parse_value("LONGITUDE", &required("LONGITUDE")?)?;

        let weatherstack_url = parse_url(
            "WEATHERSTACK_URL",
            optional("WEATHERSTACK_URL").as_deref().unwrap_or(DEFAULT_WEATHERSTACK_URL),
        )?;
        let air_quality_url = parse_url(
            "AIR_QUALITY_URL",
            optional("AIR_QUALITY_URL").as_deref().unwrap_or(DEFAULT_AIR_QUALITY_URL),
        )?;

        let dust_gpio: u8 = match optional("DUST_SENSOR_GPIO") {
            Some(v) => parse_value("DUST_SENSOR_GPIO", &v)?,
            None => 24,
        };
        // pigpio notifications only cover bank 1
        if dust_gpio > 31 {
            return Err(MonitorError::Config(format!(
                "DUST_SENSOR_GPIO must be in 0..=31, got {}",
                dust_gpio
            )));
        }

        let pressure_command = split_command(
            optional("PRESSURE_COMMAND")
                .as_deref()
                .unwrap_or("read_bme280 --pressure"),
        );
        let classifier_command = optional("CLASSIFIER_COMMAND").map(|c| split_command(&c));

        let climate_read_timeout = match optional("CLIMATE_READ_TIMEOUT_SECS") {
            Some(v) => Some(Duration::from_secs(parse_value(
                "CLIMATE_READ_TIMEOUT_SECS",
                &v,
            )?)),
            None => None,
        };
        let http_timeout = Duration::from_secs(match optional("HTTP_TIMEOUT_SECS") {
            Some(v) => parse_value("HTTP_TIMEOUT_SECS", &v)?,
            None => 10,
        });
        let command_timeout = Duration::from_secs(match optional("COMMAND_TIMEOUT_SECS") {
            Some(v) => parse_value("COMMAND_TIMEOUT_SECS", &v)?,
            None => 10,
        });

        let config = StationConfig {
            database_url,
            location: optional("STATION_LOCATION").unwrap_or_else(|| "station".to_string()),
            weatherstack_url,
            weatherstack_access_key,
            weatherstack_query: optional("WEATHERSTACK_QUERY")
                .unwrap_or_else(|| "fetch:ip".to_string()),
            air_quality_url,
            latitude,
            longitude,
            pollen_domain: optional("POLLEN_DOMAIN").unwrap_or_else(|| "cams_europe".to_string()),
            dust_gpio,
            pigpio_dir: PathBuf::from(optional("PIGPIO_DIR").unwrap_or_else(|| "/dev".to_string())),
            dht_device: PathBuf::from(
                optional("DHT_DEVICE")
                    .unwrap_or_else(|| "/sys/bus/iio/devices/iio:device0".to_string()),
            ),
            pressure_command,
            classifier_command,
            climate_read_timeout,
            http_timeout,
            command_timeout,
        };

        info!(
            "Station '{}': dust sensor on GPIO {}, climate sensor at {}",
            config.location,
            config.dust_gpio,
            config.dht_device.display()
        );
        debug!("Pressure command: {:?}", config.pressure_command);
        if config.classifier_command.is_none() {
            info!("CLASSIFIER_COMMAND not set, day profiles will not be classified");
        }

        Ok(config)
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| MonitorError::Config(format!("invalid value for {}: '{}'", key, value)))
}

fn parse_url(key: &str, value: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| MonitorError::Config(format!("invalid URL for {}: {}", key, e)))
}

fn split_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}
