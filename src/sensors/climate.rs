/// Temperature and humidity from the kernel DHT11 IIO driver
use log::debug;
use std::future::Future;
use std::path::Path;
use tokio::time::{sleep, timeout, Duration};

use crate::error::{MonitorError, Result};

// The driver serves cached values for 2s, so retries need not hammer it
const RETRY_PAUSE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClimateReading {
    pub temperature: f64,
    pub humidity: f64,
}

impl ClimateReading {
    /// An all-zero reading means the sensor has no value yet
    pub fn is_ready(&self) -> bool {
        self.temperature != 0.0 || self.humidity != 0.0
    }
}

/// Read the sensor once; failed reads come back as the not-ready reading
pub async fn read_climate(device: &Path) -> ClimateReading {
    let temperature = read_milli(&device.join("in_temp_input")).await;
    let humidity = read_milli(&device.join("in_humidityrelative_input")).await;

    match (temperature, humidity) {
        (Some(temperature), Some(humidity)) => ClimateReading {
            temperature,
            humidity,
        },
        _ => ClimateReading::default(),
    }
}

async fn read_milli(path: &Path) -> Option<f64> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => parse_milli(&raw),
        Err(e) => {
            // EIO is routine for DHT checksum failures
            debug!("Climate sensor read {} failed: {}", path.display(), e);
            None
        }
    }
}

fn parse_milli(raw: &str) -> Option<f64> {
    raw.trim().parse::<i64>().ok().map(|v| v as f64 / 1000.0)
}

/// Poll `read` until it returns a ready reading.
///
/// Without a limit this retries forever, like the sensor loop always has.
pub async fn wait_for_climate<F, Fut>(
    mut read: F,
    limit: Option<Duration>,
) -> Result<ClimateReading>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ClimateReading>,
{
    let poll = async {
        loop {
            let reading = read().await;
            if reading.is_ready() {
                return reading;
            }
            sleep(RETRY_PAUSE).await;
        }
    };

    match limit {
        Some(limit) => timeout(limit, poll)
            .await
            .map_err(|_| MonitorError::Timeout {
                what: "climate sensor",
                secs: limit.as_secs(),
            }),
        None => Ok(poll.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_parse_milli() {
        assert_eq!(parse_milli("23000\n"), Some(23.0));
        assert_eq!(parse_milli("-1500"), Some(-1.5));
        assert_eq!(parse_milli(""), None);
    }

    #[test]
    fn test_is_ready() {
        assert!(!ClimateReading::default().is_ready());
        assert!(ClimateReading {
            temperature: 0.0,
            humidity: 40.0
        }
        .is_ready());
    }

    #[tokio::test]
    async fn test_retries_until_ready() {
        let attempts = Cell::new(0);
        let reading = wait_for_climate(
            || {
                attempts.set(attempts.get() + 1);
                let n = attempts.get();
                async move {
                    if n < 3 {
                        ClimateReading::default()
                    } else {
                        ClimateReading {
                            temperature: 21.0,
                            humidity: 55.0,
                        }
                    }
                }
            },
            None,
        )
        .await
        .unwrap();

        assert_eq!(attempts.get(), 3);
        assert_eq!(reading.temperature, 21.0);
        assert_eq!(reading.humidity, 55.0);
    }

    #[tokio::test]
    async fn test_timeout_is_retryable_error() {
        let err = wait_for_climate(
            || async { ClimateReading::default() },
            Some(Duration::from_millis(250)),
        )
        .await
        .unwrap_err();

        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_missing_device_is_not_ready() {
        let reading = read_climate(Path::new("/nonexistent/iio:device9")).await;
        assert!(!reading.is_ready());
    }
}
