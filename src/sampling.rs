//! Minute-by-minute sampling and window aggregation.
//!
//! Every minute each source is read once, strictly in sequence. After
//! [`MINUTES_PER_WINDOW`] minutes the per-channel sums are averaged.

use log::{debug, error, info, warn};
use std::collections::HashMap;
use tokio::time::{sleep, Duration};

use crate::config::StationConfig;
use crate::error::Result;
use crate::models::{MinuteSample, PollenReading, WindowAverages};
use crate::sensors::{measure_air_quality, read_climate, read_pressure, wait_for_climate};
use crate::weather::WeatherClient;

pub const MINUTES_PER_WINDOW: u32 = 30;
/// Time the dust sensor needs for a calibrated reading
pub const DUST_CALIBRATION_SECS: u64 = 30;
/// Rest after the dust reading, completing the minute
pub const MINUTE_REST_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Temperature,
    Humidity,
    WindSpeed,
    UvIndex,
    AlderPollen,
    BirchPollen,
    GrassPollen,
    MugwortPollen,
    OlivePollen,
    RagweedPollen,
    Pressure,
    AirQuality,
}

impl Channel {
    pub fn name(&self) -> &'static str {
        match self {
            Channel::Temperature => "temperature",
            Channel::Humidity => "humidity",
            Channel::WindSpeed => "windspeed",
            Channel::UvIndex => "uv",
            Channel::AlderPollen => "alder_pollen",
            Channel::BirchPollen => "birch_pollen",
            Channel::GrassPollen => "grass_pollen",
            Channel::MugwortPollen => "mugwort_pollen",
            Channel::OlivePollen => "olive_pollen",
            Channel::RagweedPollen => "ragweed_pollen",
            Channel::Pressure => "pressure",
            Channel::AirQuality => "air_quality",
        }
    }
}

/// Running sums for one window
#[derive(Debug, Default)]
pub struct WindowAggregate {
    sums: HashMap<Channel, f64>,
    counts: HashMap<Channel, u32>,
    sample_count: u32,
}

impl WindowAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    fn add(&mut self, channel: Channel, value: Option<f64>) {
        match value {
            Some(v) => {
                *self.sums.entry(channel).or_insert(0.0) += v;
                *self.counts.entry(channel).or_insert(0) += 1;
            }
            None => debug!("No {} sample this minute", channel.name()),
        }
    }

    /// Add one minute's readings
    pub fn record(&mut self, sample: &MinuteSample) {
        self.add(Channel::Temperature, sample.temperature);
        self.add(Channel::Humidity, sample.humidity);
        self.add(Channel::WindSpeed, sample.wind_uv.map(|w| w.wind_speed));
        self.add(Channel::UvIndex, sample.wind_uv.map(|w| w.uv_index));
        self.add(Channel::AlderPollen, sample.pollen.map(|p| p.alder));
        self.add(Channel::BirchPollen, sample.pollen.map(|p| p.birch));
        self.add(Channel::GrassPollen, sample.pollen.map(|p| p.grass));
        self.add(Channel::MugwortPollen, sample.pollen.map(|p| p.mugwort));
        self.add(Channel::OlivePollen, sample.pollen.map(|p| p.olive));
        self.add(Channel::RagweedPollen, sample.pollen.map(|p| p.ragweed));
        self.add(Channel::Pressure, sample.pressure);
        self.add(Channel::AirQuality, sample.air_quality);
        self.sample_count += 1;
    }

    /// Average of one channel over the minutes it was sampled in
    pub fn average(&self, channel: Channel) -> Option<f64> {
        let count = *self.counts.get(&channel)?;
        if count == 0 {
            return None;
        }
        self.sums.get(&channel).map(|sum| sum / count as f64)
    }

    pub fn finish(self) -> WindowAverages {
        let pollen = match (
            self.average(Channel::AlderPollen),
            self.average(Channel::BirchPollen),
            self.average(Channel::GrassPollen),
            self.average(Channel::MugwortPollen),
            self.average(Channel::OlivePollen),
            self.average(Channel::RagweedPollen),
        ) {
            (Some(alder), Some(birch), Some(grass), Some(mugwort), Some(olive), Some(ragweed)) => {
                Some(PollenReading {
                    alder,
                    birch,
                    grass,
                    mugwort,
                    olive,
                    ragweed,
                })
            }
            _ => None,
        };

        for (channel, count) in &self.counts {
            if *count < self.sample_count {
                warn!(
                    "Channel {} has {} of {} samples",
                    channel.name(),
                    count,
                    self.sample_count
                );
            }
        }

        WindowAverages {
            temperature: self.average(Channel::Temperature),
            humidity: self.average(Channel::Humidity),
            wind_speed: self.average(Channel::WindSpeed),
            uv_index: self.average(Channel::UvIndex),
            pollen,
            pressure: self.average(Channel::Pressure),
            air_quality: self.average(Channel::AirQuality),
            samples: self.sample_count,
        }
    }
}

/// The station's sources, polled once per minute
pub struct Station {
    config: StationConfig,
    weather: WeatherClient,
}

impl Station {
    pub fn new(config: StationConfig) -> Result<Self> {
        let weather = WeatherClient::new(&config)?;
        Ok(Station { config, weather })
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    /// Read every source once
    pub async fn sample_minute(&self) -> MinuteSample {
        let mut sample = MinuteSample::default();

        let device = self.config.dht_device.as_path();
        match wait_for_climate(|| read_climate(device), self.config.climate_read_timeout).await {
            Ok(reading) => {
                sample.temperature = Some(reading.temperature);
                sample.humidity = Some(reading.humidity);
            }
            Err(e) => warn!("Climate sensor not ready: {}", e),
        }

        match self.weather.wind_uv().await {
            Ok(wind_uv) => sample.wind_uv = Some(wind_uv),
            Err(e) if e.is_retryable() => warn!("Wind/UV lookup skipped this minute: {}", e),
            Err(e) => error!("Wind/UV lookup failed: {}", e),
        }

        match self.weather.pollen().await {
            Ok(pollen) => sample.pollen = Some(pollen),
            Err(e) if e.is_retryable() => warn!("Pollen lookup skipped this minute: {}", e),
            Err(e) => error!("Pollen lookup failed: {}", e),
        }

        sample.pressure =
            read_pressure(&self.config.pressure_command, self.config.command_timeout).await;

        sample.air_quality = measure_air_quality(
            self.config.pigpio_dir.clone(),
            self.config.dust_gpio,
            Duration::from_secs(DUST_CALIBRATION_SECS),
            self.config.command_timeout,
        )
        .await;

        sample
    }

    /// Sample for a full window and return the averages
    pub async fn run_window(&self) -> WindowAverages {
        let mut aggregate = WindowAggregate::new();

        while aggregate.sample_count() < MINUTES_PER_WINDOW {
            let minute = aggregate.sample_count();
            let sample = self.sample_minute().await;

            debug!(
                "Minute {}: temp={:?} humidity={:?} wind/uv={:?} pressure={:?} aqi={:?}",
                minute,
                sample.temperature,
                sample.humidity,
                sample.wind_uv,
                sample.pressure,
                sample.air_quality
            );

            aggregate.record(&sample);
            sleep(Duration::from_secs(MINUTE_REST_SECS)).await;
        }

        info!("Collected {} minute samples", aggregate.sample_count());
        aggregate.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WindUv;

    fn constant_sample(v: f64) -> MinuteSample {
        MinuteSample {
            temperature: Some(v),
            humidity: Some(v),
            wind_uv: Some(WindUv {
                wind_speed: v,
                uv_index: v,
            }),
            pollen: Some(PollenReading {
                alder: v,
                birch: v,
                grass: v,
                mugwort: v,
                olive: v,
                ragweed: v,
            }),
            pressure: Some(v),
            air_quality: Some(v),
        }
    }

    #[test]
    fn test_constant_window_averages_to_value() {
        for v in [0.0, 17.25, 1013.5, 0.5] {
            let mut aggregate = WindowAggregate::new();
            for _ in 0..MINUTES_PER_WINDOW {
                aggregate.record(&constant_sample(v));
            }
            let averages = aggregate.finish();

            assert_eq!(averages.samples, MINUTES_PER_WINDOW);
            assert_eq!(averages.temperature, Some(v));
            assert_eq!(averages.wind_speed, Some(v));
            assert_eq!(averages.pressure, Some(v));
            assert_eq!(averages.air_quality, Some(v));
            assert_eq!(averages.pollen.unwrap().ragweed, v);
        }
    }

    #[test]
    fn test_varying_window_average() {
        let mut aggregate = WindowAggregate::new();
        for minute in 0..MINUTES_PER_WINDOW {
            aggregate.record(&constant_sample(minute as f64));
        }
        // 0 + 1 + ... + 29 = 435
        assert_eq!(aggregate.average(Channel::Humidity), Some(435.0 / 30.0));
    }

    #[test]
    fn test_missing_samples_are_excluded() {
        let mut aggregate = WindowAggregate::new();
        let mut sample = constant_sample(1000.0);
        aggregate.record(&sample);

        sample.pressure = None;
        sample.pollen = None;
        aggregate.record(&sample);

        let averages = aggregate.finish();
        assert_eq!(averages.samples, 2);
        assert_eq!(averages.pressure, Some(1000.0));
        assert!(averages.pollen.is_some());
    }

    #[test]
    fn test_channel_without_samples() {
        let mut aggregate = WindowAggregate::new();
        let mut sample = constant_sample(5.0);
        sample.air_quality = None;
        sample.wind_uv = None;
        aggregate.record(&sample);

        let averages = aggregate.finish();
        assert_eq!(averages.air_quality, None);
        assert_eq!(averages.uv_index, None);
        assert_eq!(averages.temperature, Some(5.0));
    }
}
