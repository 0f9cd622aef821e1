/// Duty-cycle dust sensor calibration cycle
use log::{debug, error, warn};
use std::path::{Path, PathBuf};
use tokio::time::{sleep, timeout, Duration};

use crate::air_quality::{sample_aqi, PulseAccumulator, PulseReading};
use crate::error::{MonitorError, Result};
use crate::sensors::gpio::{EdgeNotifier, PigpioPipe};

/// Dust sensor attached for one calibration cycle.
///
/// Opening subscribes to the pin's edges; dropping releases the
/// notification handle. Both talk to pigpiod over blocking pipes.
pub struct DustSensor {
    gpio: u8,
    accumulator: PulseAccumulator,
    _notifier: EdgeNotifier,
}

impl DustSensor {
    pub fn open(pigpio_dir: &Path, gpio: u8) -> Result<Self> {
        let accumulator = PulseAccumulator::new();
        let driver_side = accumulator.clone();

        let notifier = EdgeNotifier::start(PigpioPipe::new(pigpio_dir), gpio, move |event| {
            driver_side.on_edge(event)
        })?;

        Ok(DustSensor {
            gpio,
            accumulator,
            _notifier: notifier,
        })
    }

    /// Read the pulses accumulated since opening (or the last read)
    pub fn read(&self) -> PulseReading {
        let (low_ticks, high_ticks) = self.accumulator.ticks();
        debug!(
            "GPIO {}: {} low ticks, {} high ticks",
            self.gpio, low_ticks, high_ticks
        );

        self.accumulator.read()
    }
}

/// Run pigpio pipe work off the async workers, bounded by `limit`.
///
/// On timeout the blocking task is left behind; it ends once the daemon
/// answers or its pipes go away.
async fn pigpio_blocking<T, F>(limit: Duration, work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match timeout(limit, tokio::task::spawn_blocking(work)).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(MonitorError::Gpio(format!("pigpio task failed: {}", e))),
        Err(_) => Err(MonitorError::Timeout {
            what: "pigpio",
            secs: limit.as_secs(),
        }),
    }
}

/// Open the sensor, giving up after `limit` if pigpiod does not answer
pub async fn open_dust_sensor(
    pigpio_dir: PathBuf,
    gpio: u8,
    limit: Duration,
) -> Result<DustSensor> {
    pigpio_blocking(limit, move || DustSensor::open(&pigpio_dir, gpio)).await
}

/// Run one full calibration cycle and convert it to an AQI sample.
///
/// Returns `None` when the sensor could not be opened in time or the
/// reading does not map onto the index.
pub async fn measure_air_quality(
    pigpio_dir: PathBuf,
    gpio: u8,
    period: Duration,
    limit: Duration,
) -> Option<f64> {
    let sensor = match open_dust_sensor(pigpio_dir, gpio, limit).await {
        Ok(sensor) => sensor,
        Err(e) if e.is_retryable() => {
            warn!("Dust sensor on GPIO {} skipped this minute: {}", gpio, e);
            return None;
        }
        Err(e) => {
            error!("Failed to open dust sensor on GPIO {}: {}", gpio, e);
            return None;
        }
    };

    sleep(period).await;
    let reading = sensor.read();

    // Dropping sends the close command, so it goes through the pipe too
    if let Err(e) = pigpio_blocking(limit, move || {
        drop(sensor);
        Ok(())
    })
    .await
    {
        warn!("Releasing dust sensor on GPIO {}: {}", gpio, e);
    }

    sample_aqi(&reading)
}
