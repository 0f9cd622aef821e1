/// Particle concentration estimation and unit conversion
use std::f64::consts::PI;

use crate::error::{MonitorError, Result};

/// Calibration curve output at 100% occupancy, reported by a saturated sensor
pub const SATURATED_CONCENTRATION: f64 = 1114000.62;

/// Particle density in µg/m³, all particles assumed spherical
const PARTICLE_DENSITY: f64 = 1.65e12;
/// Radius of a particle in the PM2.5 channel in metres
const PARTICLE_RADIUS: f64 = 0.44e-6;
/// Converts particles per 0.01 ft³ to particles per m³
const PCS_TO_PER_M3: f64 = 3531.5;

/// Convert a low pulse occupancy ratio (percent) to particles per 0.01 ft³
///
/// A zero ratio means nothing was recorded and yields exactly `0.0`.
pub fn estimate_concentration(ratio: f64) -> f64 {
    if ratio == 0.0 {
        return 0.0;
    }
    1.1 * ratio.powi(3) - 3.8 * ratio.powi(2) + 520.0 * ratio + 0.62
}

/// Whether a concentration is the saturation sentinel
pub fn is_saturated(concentration: f64) -> bool {
    (concentration - SATURATED_CONCENTRATION).abs() < 1e-6
}

/// Convert particles per 0.01 ft³ to µg/m³.
///
/// Approximation for spherical PM2.5 particles of fixed density and radius,
/// without humidity or rain correction.
pub fn pcs_to_ugm3(concentration_pcf: f64) -> Result<f64> {
    if concentration_pcf < 0.0 {
        return Err(MonitorError::InvalidInput(format!(
            "concentration cannot be negative: {}",
            concentration_pcf
        )));
    }

    let volume = 4.0 / 3.0 * PI * PARTICLE_RADIUS.powi(3);
    let mass = PARTICLE_DENSITY * volume;

    Ok(concentration_pcf * PCS_TO_PER_M3 * mass)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_ratio_is_exactly_zero() {
        assert_eq!(estimate_concentration(0.0), 0.0);
    }

    #[test]
    fn test_calibration_curve() {
        assert!((estimate_concentration(30.0) - 41880.62).abs() < 1e-6);
        assert!((estimate_concentration(1.0) - 517.92).abs() < 1e-9);
        assert!(is_saturated(estimate_concentration(100.0)));
    }

    #[test]
    fn test_curve_is_non_decreasing() {
        let mut previous = estimate_concentration(0.0);
        for step in 1..=1000 {
            let ratio = step as f64 * 0.1;
            let current = estimate_concentration(ratio);
            assert!(current >= previous, "curve decreased at ratio {}", ratio);
            previous = current;
        }
    }

    #[test]
    fn test_pcs_to_ugm3_zero_and_negative() {
        assert_eq!(pcs_to_ugm3(0.0).unwrap(), 0.0);
        assert!(matches!(
            pcs_to_ugm3(-1.0),
            Err(MonitorError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_pcs_to_ugm3_is_linear() {
        let one = pcs_to_ugm3(1.0).unwrap();
        assert!((one - 2.0792e-3).abs() < 1e-6);

        for x in [10.0, 517.92, 41880.62] {
            let value = pcs_to_ugm3(x).unwrap();
            assert!((value - one * x).abs() < 1e-9 * x.max(1.0));
        }
    }
}
