pub mod aqi;
pub mod concentration;
pub mod pulse;

pub use aqi::{ugm3_to_aqi, AqiCategory};
pub use concentration::pcs_to_ugm3;
pub use pulse::{EdgeEvent, Level, PulseAccumulator, PulseReading};

use log::{debug, warn};

use crate::error::{MonitorError, Result};
use concentration::is_saturated;

/// Convert one dust sensor reading into an AQI value
pub fn reading_to_aqi(reading: &PulseReading) -> Result<f64> {
    if is_saturated(reading.concentration) {
        return Err(MonitorError::SaturatedReading(reading.concentration));
    }

    let ugm3 = pcs_to_ugm3(reading.concentration)?;
    let aqi = ugm3_to_aqi(ugm3)?;

    debug!(
        "Dust reading: ratio={:.2}%, {:.0} pcs/0.01ft³, {:.2} µg/m³, AQI {:.1}",
        reading.ratio, reading.concentration, ugm3, aqi
    );

    Ok(aqi)
}

/// AQI value to record for a minute.
///
/// A saturated sensor counts as `0.0`; any other conversion failure leaves
/// the minute without an air quality sample.
pub fn sample_aqi(reading: &PulseReading) -> Option<f64> {
    match reading_to_aqi(reading) {
        Ok(aqi) => Some(aqi),
        Err(MonitorError::SaturatedReading(conc)) => {
            warn!("Dust sensor saturated ({:.2}), recording AQI 0", conc);
            Some(0.0)
        }
        Err(e) => {
            warn!("Discarding dust reading: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::concentration::{estimate_concentration, SATURATED_CONCENTRATION};

    #[test]
    fn test_saturated_reading_records_zero() {
        let reading = PulseReading {
            ratio: 100.0,
            concentration: SATURATED_CONCENTRATION,
        };
        assert!(matches!(
            reading_to_aqi(&reading),
            Err(MonitorError::SaturatedReading(_))
        ));
        assert_eq!(sample_aqi(&reading), Some(0.0));
    }

    #[test]
    fn test_empty_reading_is_clean_air() {
        let reading = PulseAccumulator::new().read();
        assert_eq!(sample_aqi(&reading), Some(0.0));
    }

    #[test]
    fn test_gap_reading_is_dropped() {
        // 12.05 µg/m³ sits between the first two bands
        let per_pcs = pcs_to_ugm3(1.0).unwrap();
        let reading = PulseReading {
            ratio: 1.0,
            concentration: 12.05 / per_pcs,
        };
        assert_eq!(sample_aqi(&reading), None);
    }

    #[test]
    fn test_regular_reading() {
        let reading = PulseReading {
            ratio: 30.0,
            concentration: estimate_concentration(30.0),
        };
        let aqi = sample_aqi(&reading).unwrap();
        assert!(aqi > 151.0 && aqi < 200.0);
    }
}
